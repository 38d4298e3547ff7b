//! Spreadsheet row ranges (`--rows 5-10`, `--rows 7`).

use std::str::FromStr;

use super::{SheetError, StoryRow};

/// Inclusive range of spreadsheet row numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRange {
    pub start: u32,
    pub end: u32,
}

impl RowRange {
    /// Parse `"N"` or `"N-M"`.
    pub fn parse(s: &str) -> Result<Self, SheetError> {
        let invalid = || SheetError::InvalidRange(s.to_string());
        let s_trimmed = s.trim();

        let (start, end) = match s_trimmed.split_once('-') {
            Some((a, b)) => (parse_row(a).ok_or_else(invalid)?, parse_row(b).ok_or_else(invalid)?),
            None => {
                let n = parse_row(s_trimmed).ok_or_else(invalid)?;
                (n, n)
            }
        };

        if start < 2 {
            return Err(SheetError::HeaderRow);
        }
        if end < start {
            return Err(SheetError::ReversedRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Error when the range starts after the last data row.
    pub fn check_within(&self, max_row: u32) -> Result<(), SheetError> {
        if self.start > max_row {
            return Err(SheetError::StartBeyondEnd {
                start: self.start,
                max_row,
            });
        }
        Ok(())
    }

    pub fn contains(&self, row_num: u32) -> bool {
        (self.start..=self.end).contains(&row_num)
    }
}

impl FromStr for RowRange {
    type Err = SheetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for RowRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

fn parse_row(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn in_range(row: &StoryRow, range: Option<RowRange>) -> bool {
    range.map_or(true, |r| r.contains(row.row_num))
}

/// Rows ready for bundle creation: inside the range, not done (unless
/// `force`), and with every required field present.
pub fn select_pending(rows: &[StoryRow], range: Option<RowRange>, force: bool) -> Vec<&StoryRow> {
    rows.iter()
        .filter(|row| in_range(row, range))
        .filter(|row| force || !row.is_done())
        .filter(|row| row.missing_field().is_none())
        .collect()
}

/// Rows eligible for metadata extraction: inside the range and carrying a
/// StoryWeaver link. `limit` keeps the first N and only applies without a range.
pub fn select_extractable(
    rows: &[StoryRow],
    range: Option<RowRange>,
    limit: Option<usize>,
) -> Vec<&StoryRow> {
    let selected = rows
        .iter()
        .filter(|row| in_range(row, range))
        .filter(|row| row.has_storyweaver_link());

    match (range, limit) {
        (None, Some(n)) if n > 0 => selected.take(n).collect(),
        _ => selected.collect(),
    }
}

/// Spreadsheet number of the last data row (1 when there are none).
pub fn last_row(rows: &[StoryRow]) -> u32 {
    rows.last().map_or(1, |r| r.row_num)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_row(row_num: u32, status: &str) -> StoryRow {
        StoryRow {
            row_num,
            english_title: format!("Story {}", row_num),
            tamil_title: "கதை".into(),
            english_pdf: "e".into(),
            tamil_pdf: "t".into(),
            image: "i".into(),
            translators: "T".into(),
            english_description: "E".into(),
            tamil_description: "த".into(),
            status: status.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_range() {
        assert_eq!(RowRange::parse("5-10").unwrap(), RowRange { start: 5, end: 10 });
        assert_eq!(RowRange::parse("7").unwrap(), RowRange { start: 7, end: 7 });
        assert_eq!("3-3".parse::<RowRange>().unwrap().to_string(), "3-3");
    }

    #[test]
    fn test_parse_range_errors() {
        assert!(matches!(RowRange::parse("abc"), Err(SheetError::InvalidRange(_))));
        assert!(matches!(RowRange::parse("5-"), Err(SheetError::InvalidRange(_))));
        assert!(matches!(RowRange::parse("-5"), Err(SheetError::InvalidRange(_))));
        assert!(matches!(RowRange::parse("1-4"), Err(SheetError::HeaderRow)));
        assert!(matches!(
            RowRange::parse("10-5"),
            Err(SheetError::ReversedRange { start: 10, end: 5 })
        ));
        let err = RowRange::parse("1").unwrap_err();
        assert!(err.to_string().contains("row 1 is the header"));
    }

    #[test]
    fn test_check_within() {
        let range = RowRange::parse("8-20").unwrap();
        assert!(range.check_within(8).is_ok());
        assert!(matches!(
            range.check_within(7),
            Err(SheetError::StartBeyondEnd { start: 8, max_row: 7 })
        ));
    }

    #[test]
    fn test_select_pending() {
        let mut incomplete = complete_row(4, "");
        incomplete.image.clear();
        let rows = vec![
            complete_row(2, ""),
            complete_row(3, "Done"),
            incomplete,
            complete_row(5, "in progress"),
        ];

        let picked: Vec<u32> = select_pending(&rows, None, false).iter().map(|r| r.row_num).collect();
        assert_eq!(picked, vec![2, 5]);

        let picked: Vec<u32> = select_pending(&rows, None, true).iter().map(|r| r.row_num).collect();
        assert_eq!(picked, vec![2, 3, 5]);

        let range = RowRange::parse("3-4").ok();
        assert!(select_pending(&rows, range, false).is_empty());
    }

    #[test]
    fn test_select_extractable() {
        let mut rows: Vec<StoryRow> = (2..=6).map(|n| complete_row(n, "")).collect();
        rows[0].sw_link_english = "sw".into();
        rows[2].sw_link_tamil = "sw".into();
        rows[3].sw_link_english = "sw".into();

        let all: Vec<u32> = select_extractable(&rows, None, None).iter().map(|r| r.row_num).collect();
        assert_eq!(all, vec![2, 4, 5]);

        let limited: Vec<u32> = select_extractable(&rows, None, Some(2)).iter().map(|r| r.row_num).collect();
        assert_eq!(limited, vec![2, 4]);

        // the limit is ignored when a range is given
        let range = RowRange::parse("3-6").ok();
        let ranged: Vec<u32> = select_extractable(&rows, range, Some(1)).iter().map(|r| r.row_num).collect();
        assert_eq!(ranged, vec![4, 5]);
    }

    #[test]
    fn test_last_row() {
        assert_eq!(last_row(&[]), 1);
        assert_eq!(last_row(&[complete_row(2, ""), complete_row(9, "")]), 9);
    }
}
