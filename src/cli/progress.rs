//! Progress display for batch commands.
//!
//! Lines printed while a bar is active go through the bar so they do not
//! tear it.

use indicatif::{ProgressBar, ProgressStyle};

/// Progress over a batch of spreadsheet rows.
pub struct BatchProgress {
    bar: Option<ProgressBar>,
}

impl BatchProgress {
    /// A visible bar, or a silent one when `show` is false.
    pub fn new(total: usize, message: &str, show: bool) -> Self {
        if !show {
            return Self { bar: None };
        }

        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {wide_msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        bar.set_message(message.to_string());
        Self { bar: Some(bar) }
    }

    pub fn set_message(&self, message: String) {
        if let Some(ref bar) = self.bar {
            bar.set_message(message);
        }
    }

    pub fn inc(&self) {
        if let Some(ref bar) = self.bar {
            bar.inc(1);
        }
    }

    /// Print a line above the bar.
    pub fn println(&self, line: impl AsRef<str>) {
        match self.bar {
            Some(ref bar) => bar.println(line.as_ref()),
            None => println!("{}", line.as_ref()),
        }
    }

    pub fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}
