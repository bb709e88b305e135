//! In-browser CSV viewer for the selected ECG file
//!
//! Rows are split on line breaks and fields on commas with no quoting rules,
//! so the table shows the file exactly as the raw text splits.

use serde::Serialize;
use thiserror::Error;

/// Rows kept for display; the total is still reported
pub const PREVIEW_ROW_LIMIT: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreviewError {
    #[error("The file is empty")]
    Empty,

    #[error("The file is not valid UTF-8 text")]
    NotText,

    #[error("Could not read CSV: {0}")]
    Malformed(String),
}

/// Parsed table for the preview modal
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CsvPreview {
    pub file_name: String,
    /// At most [`PREVIEW_ROW_LIMIT`] rows
    pub rows: Vec<Vec<String>>,
    pub total_rows: usize,
    /// Widest displayed row
    pub column_count: usize,
}

impl CsvPreview {
    pub fn parse(file_name: impl Into<String>, text: &str) -> Result<Self, PreviewError> {
        let text = text.trim_start_matches('\u{feff}');
        if text.trim().is_empty() {
            return Err(PreviewError::Empty);
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .from_reader(text.as_bytes());

        let mut rows = Vec::new();
        let mut total_rows = 0usize;
        for record in reader.records() {
            let record = record.map_err(|e| PreviewError::Malformed(e.to_string()))?;
            total_rows += 1;
            if rows.len() < PREVIEW_ROW_LIMIT {
                rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
            }
        }

        if total_rows == 0 {
            return Err(PreviewError::Empty);
        }

        let column_count = rows.iter().map(Vec::len).max().unwrap_or(0);

        Ok(Self {
            file_name: file_name.into(),
            rows,
            total_rows,
            column_count,
        })
    }

    /// Parse raw upload bytes
    pub fn from_bytes(file_name: impl Into<String>, bytes: &[u8]) -> Result<Self, PreviewError> {
        let text = std::str::from_utf8(bytes).map_err(|_| PreviewError::NotText)?;
        Self::parse(file_name, text)
    }

    pub fn is_truncated(&self) -> bool {
        self.total_rows > self.rows.len()
    }

    /// "Showing 200 of 5000 rows"
    pub fn row_note(&self) -> String {
        if self.is_truncated() {
            format!("Showing {} of {} rows", self.rows.len(), self.total_rows)
        } else {
            format!("{} rows", self.total_rows)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_by_two() {
        let preview = CsvPreview::parse("ecg.csv", "1,2\n3,4\n5,6").unwrap();
        assert_eq!(
            preview.rows,
            vec![
                vec!["1".to_string(), "2".to_string()],
                vec!["3".to_string(), "4".to_string()],
                vec!["5".to_string(), "6".to_string()],
            ]
        );
        assert_eq!(preview.total_rows, 3);
        assert_eq!(preview.column_count, 2);
        assert!(!preview.is_truncated());
    }

    #[test]
    fn test_quotes_are_not_special() {
        let preview = CsvPreview::parse("ecg.csv", "\"a,b\",c").unwrap();
        assert_eq!(preview.rows[0], vec!["\"a", "b\"", "c"]);
    }

    #[test]
    fn test_crlf_and_trailing_newline() {
        let preview = CsvPreview::parse("ecg.csv", "t,v\r\n0,1\r\n").unwrap();
        assert_eq!(preview.total_rows, 2);
        assert_eq!(preview.rows[1], vec!["0", "1"]);
    }

    #[test]
    fn test_ragged_rows_allowed() {
        let preview = CsvPreview::parse("ecg.csv", "a\nb,c,d\ne,f").unwrap();
        assert_eq!(preview.column_count, 3);
        assert_eq!(preview.rows[0].len(), 1);
    }

    #[test]
    fn test_caps_displayed_rows() {
        let text: String = (0..500).map(|i| format!("{},{}\n", i, i * 2)).collect();
        let preview = CsvPreview::parse("ecg.csv", &text).unwrap();
        assert_eq!(preview.rows.len(), PREVIEW_ROW_LIMIT);
        assert_eq!(preview.total_rows, 500);
        assert_eq!(preview.row_note(), "Showing 200 of 500 rows");
        assert_eq!(preview.rows[199], vec!["199", "398"]);
    }

    #[test]
    fn test_empty_and_binary_input() {
        assert_eq!(CsvPreview::parse("e.csv", "  \n"), Err(PreviewError::Empty));
        assert_eq!(
            CsvPreview::from_bytes("e.csv", &[0xff, 0xfe, 0x00]),
            Err(PreviewError::NotText)
        );
    }
}
