//! Configuration management using the prefer crate.
//!
//! `Settings` holds the resolved values every command runs with. `Config` is
//! the optional on-disk file (`eethal-stories.{toml,yaml,json}`), discovered
//! by prefer or passed with `--config`, whose set fields override defaults.
//! Secrets and a few tunables come from the environment (and `.env`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ocr::OcrBackendType;

/// Name prefer uses to discover the config file.
pub const CONFIG_NAME: &str = "eethal-stories";

/// Spreadsheet that serves as the system of record for stories.
pub const DEFAULT_SHEET_URL: &str =
    "https://docs.google.com/spreadsheets/d/1zNhXLL_De8qCsk8OlORGQ_0tIk9Bw3aKi72HlSTEAOU/edit?usp=sharing";

/// Story bundles live under this path relative to the site root.
const STORIES_SUBDIR: &str = "content/stories";

/// Errors from loading a config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {format} config {path}: {message}")]
    Parse {
        path: PathBuf,
        format: &'static str,
        message: String,
    },
}

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Root of the Hugo site.
    pub site_root: PathBuf,
    /// Directory holding one bundle directory per story.
    pub stories_dir: PathBuf,
    /// Scratch directory for downloads, removed after each batch.
    pub temp_dir: PathBuf,
    /// Spreadsheet used when no CSV file is given.
    pub sheet_url: String,
    /// User agent for HTTP requests.
    pub user_agent: String,
    /// Request timeout in seconds.
    pub request_timeout: u64,
    /// Attempts per PDF download.
    pub download_attempts: u32,
    /// Pause after a successful PDF download, in milliseconds.
    pub download_pause_ms: u64,
    /// OCR backend used when a text layer is garbled.
    pub ocr_backend: OcrBackendType,
    /// Tesseract language pack.
    pub tesseract_lang: String,
    /// Gemini model for vision OCR.
    pub gemini_model: String,
    /// Pause after each Gemini request, in milliseconds.
    pub gemini_delay_ms: u64,
    /// Gemini API key (GEMINI_API_KEY).
    pub gemini_api_key: Option<String>,
    /// Cloud Translation API key (GOOGLE_TRANSLATE_API_KEY).
    pub translate_api_key: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        let site_root = PathBuf::from(".");
        let temp_dir = dirs::home_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(".eethal_temp");

        Self {
            stories_dir: site_root.join(STORIES_SUBDIR),
            site_root,
            temp_dir,
            sheet_url: DEFAULT_SHEET_URL.to_string(),
            user_agent: format!("eethal-stories/{}", env!("CARGO_PKG_VERSION")),
            request_timeout: 60,
            download_attempts: 3,
            download_pause_ms: 2000,
            ocr_backend: OcrBackendType::Gemini,
            tesseract_lang: "tam".to_string(),
            gemini_model: "gemini-2.5-pro".to_string(),
            gemini_delay_ms: 13_000,
            gemini_api_key: None,
            translate_api_key: None,
        }
    }
}

impl Settings {
    /// Point the settings at a different site root.
    pub fn with_site_root(mut self, root: PathBuf) -> Self {
        self.stories_dir = root.join(STORIES_SUBDIR);
        self.site_root = root;
        self
    }

    /// Request timeout as a duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Apply environment variable overrides.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(key) = env_non_empty("GEMINI_API_KEY") {
            self.gemini_api_key = Some(key);
        }
        if let Some(model) = env_non_empty("GEMINI_MODEL") {
            self.gemini_model = model;
        }
        if let Some(delay) = env_non_empty("GEMINI_DELAY_MS").and_then(|s| s.parse().ok()) {
            self.gemini_delay_ms = delay;
        }
        if let Some(key) = env_non_empty("GOOGLE_TRANSLATE_API_KEY") {
            self.translate_api_key = Some(key);
        }
        if let Some(url) = env_non_empty("STORIES_SHEET_URL") {
            self.sheet_url = url;
        }
        self
    }
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Site root, relative to the config file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_root: Option<String>,
    /// Scratch directory for downloads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_dir: Option<String>,
    /// Spreadsheet URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_attempts: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_pause_ms: Option<u64>,
    /// OCR settings.
    #[serde(default)]
    pub ocr: OcrSection,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

/// `[ocr]` section of the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrSection {
    /// "gemini" or "tesseract".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tesseract_lang: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini_delay_ms: Option<u64>,
}

impl Config {
    /// Discover the config file with prefer, falling back to defaults.
    pub async fn load() -> Self {
        match prefer::load(CONFIG_NAME).await {
            Ok(pref_config) => match pref_config.source_path() {
                Some(path) => Self::load_from_path(path).await.unwrap_or_else(|e| {
                    tracing::warn!("{}", e);
                    Self::default()
                }),
                None => Self::default(),
            },
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// The format is chosen from the extension (toml, yaml/yml, otherwise JSON).
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;

        let mut config = Self::parse(path, &contents)?;
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    fn parse(path: &Path, contents: &str) -> Result<Self, ConfigError> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let parse_err = |format: &'static str, message: String| ConfigError::Parse {
            path: path.to_path_buf(),
            format,
            message,
        };

        match ext {
            "toml" => toml::from_str(contents).map_err(|e| parse_err("TOML", e.to_string())),
            "yaml" | "yml" => {
                serde_yaml::from_str(contents).map_err(|e| parse_err("YAML", e.to_string()))
            }
            _ => serde_json::from_str(contents).map_err(|e| parse_err("JSON", e.to_string())),
        }
    }

    /// Directory relative paths in the file are resolved against.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file or start with `~`.
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply set fields on top of `settings`.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref root) = self.site_root {
            let root = self.resolve_path(root, base_dir);
            *settings = settings.clone().with_site_root(root);
        }
        if let Some(ref temp) = self.temp_dir {
            settings.temp_dir = self.resolve_path(temp, base_dir);
        }
        if let Some(ref url) = self.sheet_url {
            settings.sheet_url = url.clone();
        }
        if let Some(ref ua) = self.user_agent {
            settings.user_agent = ua.clone();
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout = timeout;
        }
        if let Some(attempts) = self.download_attempts {
            settings.download_attempts = attempts.max(1);
        }
        if let Some(pause) = self.download_pause_ms {
            settings.download_pause_ms = pause;
        }
        if let Some(ref backend) = self.ocr.backend {
            match OcrBackendType::from_str(backend) {
                Some(backend) => settings.ocr_backend = backend,
                None => tracing::warn!("Unknown OCR backend in config: {}", backend),
            }
        }
        if let Some(ref lang) = self.ocr.tesseract_lang {
            settings.tesseract_lang = lang.clone();
        }
        if let Some(ref model) = self.ocr.gemini_model {
            settings.gemini_model = model.clone();
        }
        if let Some(delay) = self.ocr.gemini_delay_ms {
            settings.gemini_delay_ms = delay;
        }
    }
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
    /// Site root from the command line (overrides the config file).
    pub site_root: Option<PathBuf>,
}

/// Load settings: defaults, then config file, then environment, then CLI.
pub async fn load_settings(options: LoadOptions) -> anyhow::Result<Settings> {
    let config = match options.config_path {
        Some(ref path) => Config::load_from_path(path).await?,
        None => Config::load().await,
    };

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let base_dir = config.base_dir().unwrap_or_else(|| cwd.clone());

    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings, &base_dir);
    let mut settings = settings.with_env_overrides();

    if let Some(root) = options.site_root {
        let root = config.resolve_path(&root.to_string_lossy(), &cwd);
        settings = settings.with_site_root(root);
    }

    if let Some(ref path) = config.source_path {
        tracing::debug!("Loaded config from {}", path.display());
    }

    Ok(settings)
}
