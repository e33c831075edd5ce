//! CSV loader with structural validation

use crate::charset::{check_charset, check_utf8};
use crate::error::{Error, Result};
use crate::value::{CellValue, Record};
use std::fmt;
use std::fs;
use std::path::Path;

/// A problem found in a CSV header row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderViolation {
    /// Header cell is empty or whitespace-only
    Blank { column: usize },
    /// The same name appears in more than one column
    Duplicate { name: String, columns: Vec<usize> },
}

impl fmt::Display for HeaderViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderViolation::Blank { column } => {
                write!(f, "Column {} exists but is empty", column_letter(*column))
            }
            HeaderViolation::Duplicate { name, columns } => {
                let letters: Vec<String> = columns.iter().map(|c| column_letter(*c)).collect();
                write!(
                    f,
                    "Duplicate: \"{}\" appears in columns {}",
                    name,
                    letters.join(", ")
                )
            }
        }
    }
}

/// A data row whose field count does not match the header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowShapeMismatch {
    /// 1-based row number; the header is row 1
    pub row: usize,
    pub found: usize,
    pub expected: usize,
}

impl fmt::Display for RowShapeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Row {} has {} columns, expected {}",
            self.row, self.found, self.expected
        )
    }
}

/// Load a CSV file into records.
///
/// Returns `Ok(None)` when the file does not exist.
pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<Option<Vec<Record>>> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(None);
    }

    let bytes = fs::read(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let records = parse_records(path, &bytes)?;
    tracing::debug!(path = %path.display(), records = records.len(), "Loaded CSV");
    Ok(Some(records))
}

/// Parse CSV content from memory (useful for testing)
pub fn parse_csv_bytes(content: &[u8], source_name: &str) -> Result<Vec<Record>> {
    parse_records(Path::new(source_name), content)
}

/// Parse CSV from a string (useful for testing)
pub fn parse_csv_str(content: &str, source_name: &str) -> Result<Vec<Record>> {
    parse_csv_bytes(content.as_bytes(), source_name)
}

fn parse_records(path: &Path, bytes: &[u8]) -> Result<Vec<Record>> {
    let text = check_utf8(path, bytes)?;
    check_charset(path, text)?;

    let mut rows = read_rows(path, text)?.into_iter();
    let Some(header) = rows.next() else {
        return Err(Error::EmptyFile {
            path: path.to_path_buf(),
        });
    };
    let header: Vec<String> = header.iter().map(str::to_string).collect();

    let violations = check_header(&header);
    if !violations.is_empty() {
        return Err(Error::Header {
            path: path.to_path_buf(),
            violations,
            header,
        });
    }

    let mut records = Vec::new();
    let mut mismatches = Vec::new();

    for (row_idx, row) in rows.enumerate() {
        if row.len() != header.len() {
            mismatches.push(RowShapeMismatch {
                row: row_idx + 2,
                found: row.len(),
                expected: header.len(),
            });
            continue;
        }

        records.push(Record::from_fields(
            header
                .iter()
                .zip(row.iter())
                .map(|(name, cell)| (name.clone(), CellValue::Raw(cell.to_string()))),
        ));
    }

    if !mismatches.is_empty() {
        return Err(Error::RowShape {
            path: path.to_path_buf(),
            mismatches,
        });
    }

    Ok(records)
}

/// Read every CSV row, header included.
///
/// The csv reader skips empty lines; each one is put back as a row with
/// no fields so it is shape-checked and keeps the row numbering aligned
/// with the file.
fn read_rows(path: &Path, text: &str) -> Result<Vec<csv::StringRecord>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true) // row widths are checked by the caller
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    let mut record = csv::StringRecord::new();
    loop {
        let more = csv_reader.read_record(&mut record).map_err(|e| Error::Csv {
            path: path.to_path_buf(),
            source: e,
        })?;

        // the position is taken before the reader skips blank lines
        let start = record.position().map_or(0, |pos| pos.byte() as usize);
        let blanks = blank_lines_at(text, start);
        rows.extend(std::iter::repeat_with(csv::StringRecord::new).take(blanks));

        if !more {
            break;
        }
        rows.push(record.clone());
    }

    Ok(rows)
}

/// Count empty lines starting at `start`
fn blank_lines_at(text: &str, start: usize) -> usize {
    let bytes = text.as_bytes();
    let mut idx = start;

    // a record ended by `\r\n` stops after the `\r`
    if idx > 0 && bytes.get(idx - 1) == Some(&b'\r') && bytes.get(idx) == Some(&b'\n') {
        idx += 1;
    }

    let mut count = 0;
    loop {
        match bytes.get(idx) {
            Some(b'\n') => idx += 1,
            Some(b'\r') if bytes.get(idx + 1) == Some(&b'\n') => idx += 2,
            Some(b'\r') => idx += 1,
            _ => break,
        }
        count += 1;
    }
    count
}

/// Find blank and duplicate header cells in a single pass
pub fn check_header(header: &[String]) -> Vec<HeaderViolation> {
    let mut blanks = Vec::new();
    let mut groups: Vec<(&str, Vec<usize>)> = Vec::new();

    for (idx, name) in header.iter().enumerate() {
        if name.trim().is_empty() {
            blanks.push(HeaderViolation::Blank { column: idx });
        }
        match groups.iter_mut().find(|(n, _)| *n == name.as_str()) {
            Some((_, columns)) => columns.push(idx),
            None => groups.push((name.as_str(), vec![idx])),
        }
    }

    let duplicates = groups
        .into_iter()
        .filter(|(_, columns)| columns.len() > 1)
        .map(|(name, columns)| HeaderViolation::Duplicate {
            name: name.to_string(),
            columns,
        });

    blanks.into_iter().chain(duplicates).collect()
}

/// Convert a 0-based column index to spreadsheet letters (A, B, ..., Z, AA, ...)
pub fn column_letter(idx: usize) -> String {
    let mut letters = Vec::new();
    let mut n = idx + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_csv() {
        let csv = "slug,name,website\nacme,Acme,https://acme.io\nbeta,Beta,\n";
        let records = parse_csv_str(csv, "test.csv").unwrap();

        assert_eq!(records.len(), 2);
        let keys: Vec<&str> = records[0].keys().collect();
        assert_eq!(keys, vec!["slug", "name", "website"]);
        assert_eq!(records[0].slug(), Some("acme"));
        assert_eq!(records[1].get("website"), Some(&CellValue::Raw(String::new())));
    }

    #[test]
    fn test_parse_quoted_cells() {
        let csv = "slug,tags\nacme,\"[\"\"a\"\", \"\"b\"\"]\"\n";
        let records = parse_csv_str(csv, "test.csv").unwrap();

        assert_eq!(
            records[0].get("tags").and_then(CellValue::as_str),
            Some(r#"["a", "b"]"#)
        );
    }

    #[test]
    fn test_empty_file() {
        let err = parse_csv_str("", "empty.csv").unwrap_err();
        assert!(matches!(err, Error::EmptyFile { .. }));
    }

    #[test]
    fn test_duplicate_header_columns() {
        let err = parse_csv_str("slug,name,slug\na,b,c\n", "dup.csv").unwrap_err();

        match &err {
            Error::Header { violations, .. } => {
                assert_eq!(
                    violations,
                    &vec![HeaderViolation::Duplicate {
                        name: "slug".to_string(),
                        columns: vec![0, 2],
                    }]
                );
            }
            other => panic!("expected header error, got {:?}", other),
        }

        let message = err.to_string();
        assert!(message.contains("\"slug\" appears in columns A, C"));
        assert!(message.contains("Full header: A:slug, B:name, C:slug"));
    }

    #[test]
    fn test_blank_and_duplicate_headers_reported_together() {
        let err = parse_csv_str("slug, ,name,name\n1,2,3,4\n", "bad.csv").unwrap_err();

        match err {
            Error::Header { violations, .. } => {
                assert_eq!(violations.len(), 2);
                assert_eq!(violations[0], HeaderViolation::Blank { column: 1 });
                assert!(matches!(&violations[1], HeaderViolation::Duplicate { name, .. } if name == "name"));
            }
            other => panic!("expected header error, got {:?}", other),
        }
    }

    #[test]
    fn test_all_row_shape_mismatches_reported() {
        let csv = "slug,name\na,A\nb\nc,C,extra\nd,D\n";
        let err = parse_csv_str(csv, "rows.csv").unwrap_err();

        match &err {
            Error::RowShape { mismatches, .. } => {
                assert_eq!(
                    mismatches,
                    &vec![
                        RowShapeMismatch { row: 3, found: 1, expected: 2 },
                        RowShapeMismatch { row: 4, found: 3, expected: 2 },
                    ]
                );
            }
            other => panic!("expected row shape error, got {:?}", other),
        }
        assert!(err.to_string().contains("Row 4 has 3 columns, expected 2"));
    }

    #[test]
    fn test_blank_line_is_a_row() {
        let err = parse_csv_str("slug,name\na,A\n\nb,B\n", "blank.csv").unwrap_err();

        match err {
            Error::RowShape { mismatches, .. } => {
                assert_eq!(mismatches, vec![RowShapeMismatch { row: 3, found: 0, expected: 2 }]);
            }
            other => panic!("expected row shape error, got {:?}", other),
        }
    }

    #[test]
    fn test_rows_after_blank_line_keep_file_numbering() {
        let err = parse_csv_str("slug,name\na,A\n\nb\n", "blank.csv").unwrap_err();

        match &err {
            Error::RowShape { mismatches, .. } => {
                assert_eq!(
                    mismatches,
                    &vec![
                        RowShapeMismatch { row: 3, found: 0, expected: 2 },
                        RowShapeMismatch { row: 4, found: 1, expected: 2 },
                    ]
                );
            }
            other => panic!("expected row shape error, got {:?}", other),
        }
        assert!(err.to_string().contains("Row 4 has 1 columns, expected 2"));
    }

    #[test]
    fn test_crlf_rows_with_blank_line() {
        let records = parse_csv_str("slug,name\r\na,A\r\nb,B\r\n", "crlf.csv").unwrap();
        assert_eq!(records.len(), 2);

        let err = parse_csv_str("slug,name\r\na,A\r\n\r\nb\r\n", "crlf.csv").unwrap_err();
        match err {
            Error::RowShape { mismatches, .. } => {
                let rows: Vec<usize> = mismatches.iter().map(|m| m.row).collect();
                assert_eq!(rows, vec![3, 4]);
            }
            other => panic!("expected row shape error, got {:?}", other),
        }
    }

    #[test]
    fn test_quoted_newline_counts_as_one_row() {
        let csv = "slug,notes\na,\"line one\n\nline three\"\nb\n";
        let err = parse_csv_str(csv, "multi.csv").unwrap_err();

        match err {
            Error::RowShape { mismatches, .. } => {
                assert_eq!(mismatches, vec![RowShapeMismatch { row: 3, found: 1, expected: 2 }]);
            }
            other => panic!("expected row shape error, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_utf8_rejected_before_parsing() {
        let err = parse_csv_bytes(b"slug\n\xc3\x28\n", "bin.csv").unwrap_err();
        assert!(matches!(err, Error::Encoding { line: 2, column: 1, .. }));
    }

    #[test]
    fn test_column_letter() {
        assert_eq!(column_letter(0), "A");
        assert_eq!(column_letter(2), "C");
        assert_eq!(column_letter(25), "Z");
        assert_eq!(column_letter(26), "AA");
        assert_eq!(column_letter(27), "AB");
        assert_eq!(column_letter(51), "AZ");
        assert_eq!(column_letter(52), "BA");
        assert_eq!(column_letter(701), "ZZ");
        assert_eq!(column_letter(702), "AAA");
    }

    #[test]
    fn test_load_missing_file_is_none() {
        let result = load_csv("definitely/not/here.csv").unwrap();
        assert!(result.is_none());
    }
}
