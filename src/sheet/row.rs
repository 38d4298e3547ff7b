//! Spreadsheet rows and columns.

use super::SheetError;

/// Logical spreadsheet columns, in sheet order (A..L).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    EnglishTitle,
    TamilTitle,
    EnglishPdf,
    TamilPdf,
    Image,
    SwLinkEnglish,
    SwLinkTamil,
    Translators,
    EnglishDescription,
    TamilDescription,
    Status,
    Tags,
}

impl Column {
    /// All columns in sheet order.
    pub const ALL: [Column; 12] = [
        Column::EnglishTitle,
        Column::TamilTitle,
        Column::EnglishPdf,
        Column::TamilPdf,
        Column::Image,
        Column::SwLinkEnglish,
        Column::SwLinkTamil,
        Column::Translators,
        Column::EnglishDescription,
        Column::TamilDescription,
        Column::Status,
        Column::Tags,
    ];

    /// Columns a row needs before a bundle can be built from it.
    pub const REQUIRED: [Column; 8] = [
        Column::EnglishTitle,
        Column::TamilTitle,
        Column::EnglishPdf,
        Column::TamilPdf,
        Column::Image,
        Column::Translators,
        Column::EnglishDescription,
        Column::TamilDescription,
    ];

    /// Header label as it appears in the spreadsheet.
    pub fn label(&self) -> &'static str {
        match self {
            Column::EnglishTitle => "English Title",
            Column::TamilTitle => "Tamil Title",
            Column::EnglishPdf => "English PDF",
            Column::TamilPdf => "Tamil PDF",
            Column::Image => "Image",
            Column::SwLinkEnglish => "SW link-Eng",
            Column::SwLinkTamil => "SW link Tamil",
            Column::Translators => "Translators",
            Column::EnglishDescription => "English Description",
            Column::TamilDescription => "Tamil Description",
            Column::Status => "Status",
            Column::Tags => "Tags",
        }
    }

    /// Zero-based fixed position, used when the header lacks the label.
    pub fn position(&self) -> usize {
        match self {
            Column::EnglishTitle => 0,
            Column::TamilTitle => 1,
            Column::EnglishPdf => 2,
            Column::TamilPdf => 3,
            Column::Image => 4,
            Column::SwLinkEnglish => 5,
            Column::SwLinkTamil => 6,
            Column::Translators => 7,
            Column::EnglishDescription => 8,
            Column::TamilDescription => 9,
            Column::Status => 10,
            Column::Tags => 11,
        }
    }
}

impl std::fmt::Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One data row of the story spreadsheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoryRow {
    /// Spreadsheet row number (the header is row 1).
    pub row_num: u32,
    pub english_title: String,
    pub tamil_title: String,
    pub english_pdf: String,
    pub tamil_pdf: String,
    pub image: String,
    pub sw_link_english: String,
    pub sw_link_tamil: String,
    pub translators: String,
    pub english_description: String,
    pub tamil_description: String,
    pub status: String,
    pub tags: String,
}

impl StoryRow {
    /// Value of a column.
    pub fn get(&self, column: Column) -> &str {
        match column {
            Column::EnglishTitle => &self.english_title,
            Column::TamilTitle => &self.tamil_title,
            Column::EnglishPdf => &self.english_pdf,
            Column::TamilPdf => &self.tamil_pdf,
            Column::Image => &self.image,
            Column::SwLinkEnglish => &self.sw_link_english,
            Column::SwLinkTamil => &self.sw_link_tamil,
            Column::Translators => &self.translators,
            Column::EnglishDescription => &self.english_description,
            Column::TamilDescription => &self.tamil_description,
            Column::Status => &self.status,
            Column::Tags => &self.tags,
        }
    }

    fn slot(&mut self, column: Column) -> &mut String {
        match column {
            Column::EnglishTitle => &mut self.english_title,
            Column::TamilTitle => &mut self.tamil_title,
            Column::EnglishPdf => &mut self.english_pdf,
            Column::TamilPdf => &mut self.tamil_pdf,
            Column::Image => &mut self.image,
            Column::SwLinkEnglish => &mut self.sw_link_english,
            Column::SwLinkTamil => &mut self.sw_link_tamil,
            Column::Translators => &mut self.translators,
            Column::EnglishDescription => &mut self.english_description,
            Column::TamilDescription => &mut self.tamil_description,
            Column::Status => &mut self.status,
            Column::Tags => &mut self.tags,
        }
    }

    /// Whether the row has been marked done.
    pub fn is_done(&self) -> bool {
        self.status.trim().eq_ignore_ascii_case("done")
    }

    /// First required column that is empty, if any.
    pub fn missing_field(&self) -> Option<Column> {
        Column::REQUIRED
            .into_iter()
            .find(|c| self.get(*c).trim().is_empty())
    }

    /// Whether either StoryWeaver link is filled in.
    pub fn has_storyweaver_link(&self) -> bool {
        !self.sw_link_english.is_empty() || !self.sw_link_tamil.is_empty()
    }

    /// Title for progress and error messages.
    pub fn display_title(&self) -> &str {
        if self.english_title.is_empty() {
            "Unknown"
        } else {
            &self.english_title
        }
    }

    /// Cell values in column order, for CSV output.
    pub fn to_record(&self) -> Vec<&str> {
        Column::ALL.iter().map(|c| self.get(*c)).collect()
    }
}

/// Column index lookup built from the header row.
struct ColumnMap {
    positions: [usize; 12],
}

impl ColumnMap {
    fn from_header(header: &csv::StringRecord) -> Self {
        let labels: Vec<String> = header
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_lowercase())
            .collect();

        let mut positions = [0usize; 12];
        for (slot, column) in positions.iter_mut().zip(Column::ALL) {
            let wanted = column.label().to_lowercase();
            *slot = labels
                .iter()
                .position(|l| *l == wanted)
                .unwrap_or_else(|| column.position());
        }
        Self { positions }
    }

    fn index(&self, column: Column) -> usize {
        self.positions[column.position()]
    }
}

/// Parse the spreadsheet CSV export into rows.
///
/// The first record is the header. Completely empty records are skipped but
/// still advance the row number.
pub fn parse_rows(csv_text: &str) -> Result<Vec<StoryRow>, SheetError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(csv_text.as_bytes());

    let mut records = reader.records();
    let header = match records.next() {
        Some(header) => header?,
        None => return Ok(Vec::new()),
    };
    let columns = ColumnMap::from_header(&header);

    let mut rows = Vec::new();
    let mut row_num = 1u32;
    for record in records {
        let record = record?;
        row_num += 1;

        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        let mut row = StoryRow {
            row_num,
            ..Default::default()
        };
        for column in Column::ALL {
            let value = record.get(columns.index(column)).unwrap_or("").trim();
            *row.slot(column) = value.to_string();
        }
        rows.push(row);
    }

    tracing::debug!("Parsed {} data rows (last row {})", rows.len(), row_num);
    Ok(rows)
}
