use csv::ReaderBuilder;
use std::collections::HashMap;
use std::io;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{PartitionError, PartitionResult};

/// One usable row of the label table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelRecord {
    pub filename: String,
    pub label: String,
}

impl LabelRecord {
    /// Build a record from raw fields, trimming both.
    /// Returns `None` if either field is empty after trimming.
    pub fn from_fields(filename: &str, label: &str) -> Option<Self> {
        let filename = filename.trim();
        let label = label.trim();
        if filename.is_empty() || label.is_empty() {
            return None;
        }
        Some(Self {
            filename: filename.to_string(),
            label: label.to_string(),
        })
    }
}

/// Filename → label, folded in table order with last-write-wins.
///
/// Iteration follows the position at which a filename was first seen; the
/// label is always the one from the last row for that filename. Labels are
/// stored verbatim, so multi-label status is decided by whoever consumes the
/// index, based on the final label only.
#[derive(Debug, Clone, Default)]
pub struct LabelIndex {
    entries: Vec<LabelRecord>,
    positions: HashMap<String, usize>,
}

impl LabelIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, replacing any earlier label for the same filename.
    /// Returns the replaced label.
    pub fn insert(&mut self, record: LabelRecord) -> Option<String> {
        match self.positions.get(&record.filename) {
            Some(&pos) => {
                let previous = std::mem::replace(&mut self.entries[pos].label, record.label);
                Some(previous)
            }
            None => {
                self.positions.insert(record.filename.clone(), self.entries.len());
                self.entries.push(record);
                None
            }
        }
    }

    pub fn get(&self, filename: &str) -> Option<&str> {
        self.positions
            .get(filename)
            .map(|&pos| self.entries[pos].label.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &LabelRecord> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<LabelRecord> for LabelIndex {
    fn from_iter<I: IntoIterator<Item = LabelRecord>>(iter: I) -> Self {
        let mut index = LabelIndex::new();
        for record in iter {
            index.insert(record);
        }
        index
    }
}

/// A parsed label table
#[derive(Debug, Clone, Default)]
pub struct LabelTable {
    /// Lower-cased column names, when the table was read with a header row
    pub columns: Option<Vec<String>>,
    pub index: LabelIndex,
    /// Rows dropped for having fewer than two usable fields
    pub skipped_rows: usize,
    /// Rows that replaced an earlier label for the same filename
    pub overwritten: usize,
}

/// Read a label table from disk. The first column is the filename, the
/// second the label; any further columns are ignored.
pub fn read_label_table(path: &Path, has_header: bool) -> PartitionResult<LabelTable> {
    let unreadable = |source: csv::Error| PartitionError::LabelTableUnreadable {
        path: path.to_path_buf(),
        source,
    };

    let file = std::fs::File::open(path).map_err(|e| unreadable(csv::Error::from(e)))?;
    let table = parse_label_table(file, has_header).map_err(unreadable)?;

    info!(
        "Read {} labelled files from {:?} ({} rows skipped, {} overwritten)",
        table.index.len(),
        path,
        table.skipped_rows,
        table.overwritten
    );
    Ok(table)
}

/// Parse label table rows from any reader
pub fn parse_label_table<R: io::Read>(reader: R, has_header: bool) -> Result<LabelTable, csv::Error> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut table = LabelTable::default();
    let mut header_pending = has_header;

    for result in reader.records() {
        let row = match result {
            Ok(row) => row,
            // Invalid UTF-8 in a single row is a malformed row, not an unreadable table
            Err(e) if matches!(e.kind(), csv::ErrorKind::Utf8 { .. }) => {
                header_pending = false;
                table.skipped_rows += 1;
                continue;
            }
            Err(e) => return Err(e),
        };

        if header_pending {
            header_pending = false;
            let columns: Vec<String> = row.iter().map(|c| c.trim().to_lowercase()).collect();
            debug!("Label table columns: {:?}", columns);
            table.columns = Some(columns);
            continue;
        }

        let record = match (row.get(0), row.get(1)) {
            (Some(filename), Some(label)) => LabelRecord::from_fields(filename, label),
            _ => None,
        };

        match record {
            Some(record) => {
                if table.index.insert(record).is_some() {
                    table.overwritten += 1;
                }
            }
            None => table.skipped_rows += 1,
        }
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(filename: &str, label: &str) -> LabelRecord {
        LabelRecord::from_fields(filename, label).unwrap()
    }

    #[test]
    fn test_from_fields_trims() {
        let r = LabelRecord::from_fields("  a.png ", " cat\t").unwrap();
        assert_eq!(r.filename, "a.png");
        assert_eq!(r.label, "cat");
    }

    #[test]
    fn test_from_fields_rejects_empty() {
        assert!(LabelRecord::from_fields("", "cat").is_none());
        assert!(LabelRecord::from_fields("a.png", "   ").is_none());
    }

    #[test]
    fn test_last_write_wins() {
        let index: LabelIndex = vec![
            record("a.png", "cat"),
            record("b.png", "dog"),
            record("a.png", "bird"),
        ]
        .into_iter()
        .collect();

        assert_eq!(index.len(), 2);
        assert_eq!(index.get("a.png"), Some("bird"));
        assert_eq!(index.get("b.png"), Some("dog"));
    }

    #[test]
    fn test_iteration_keeps_first_seen_order() {
        let index: LabelIndex = vec![
            record("a.png", "cat"),
            record("b.png", "dog"),
            record("a.png", "bird"),
        ]
        .into_iter()
        .collect();

        let order: Vec<&str> = index.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(order, vec!["a.png", "b.png"]);
    }

    #[test]
    fn test_insert_returns_replaced_label() {
        let mut index = LabelIndex::new();
        assert_eq!(index.insert(record("a.png", "cat")), None);
        assert_eq!(index.insert(record("a.png", "dog")), Some("cat".to_string()));
    }

    #[test]
    fn test_parse_skips_malformed_rows() {
        let data = "a.png,cat\nonly_one_field\n,dog\nc.png,\n\nd.png,fish,extra\n";
        let table = parse_label_table(data.as_bytes(), false).unwrap();

        assert_eq!(table.index.len(), 2);
        assert_eq!(table.index.get("a.png"), Some("cat"));
        assert_eq!(table.index.get("d.png"), Some("fish"));
        assert_eq!(table.skipped_rows, 3);
    }

    #[test]
    fn test_parse_header_is_lowercased_and_consumed() {
        let data = "Image Index,Finding Labels\n00001.png,No Finding\n";
        let table = parse_label_table(data.as_bytes(), true).unwrap();

        assert_eq!(
            table.columns,
            Some(vec!["image index".to_string(), "finding labels".to_string()])
        );
        assert_eq!(table.index.len(), 1);
        assert_eq!(table.index.get("00001.png"), Some("No Finding"));
    }

    #[test]
    fn test_parse_without_header_keeps_first_row() {
        let data = "filename,label\na.png,cat\n";
        let table = parse_label_table(data.as_bytes(), false).unwrap();
        assert_eq!(table.index.get("filename"), Some("label"));
        assert!(table.columns.is_none());
    }

    #[test]
    fn test_multi_label_kept_verbatim_in_index() {
        let data = "a.png,cat|dog\n";
        let table = parse_label_table(data.as_bytes(), false).unwrap();
        let rec = table.index.iter().next().unwrap();
        assert_eq!(rec.label, "cat|dog");
        assert!(rec.label.contains('|'));
    }

    #[test]
    fn test_later_clean_row_replaces_multi_label() {
        // Only the final label decides multi-label status
        let data = "a.png,cat|dog\na.png,cat\n";
        let table = parse_label_table(data.as_bytes(), false).unwrap();
        let rec = table.index.iter().next().unwrap();
        assert!(!rec.label.contains('|'));
        assert_eq!(table.overwritten, 1);
    }

    #[test]
    fn test_invalid_utf8_row_is_skipped() {
        let data = b"a.png,cat\nb\xff.png,dog\nc.png,fish\n";
        let table = parse_label_table(&data[..], false).unwrap();

        assert_eq!(table.skipped_rows, 1);
        assert_eq!(table.index.len(), 2);
        assert_eq!(table.index.get("a.png"), Some("cat"));
        assert_eq!(table.index.get("c.png"), Some("fish"));
    }

    #[test]
    fn test_invalid_utf8_header_does_not_swallow_first_row() {
        let data = b"Image\xff,Label\na.png,cat\nb.png,dog\n";
        let table = parse_label_table(&data[..], true).unwrap();

        assert!(table.columns.is_none());
        assert_eq!(table.skipped_rows, 1);
        assert_eq!(table.index.get("a.png"), Some("cat"));
        assert_eq!(table.index.get("b.png"), Some("dog"));
    }

    #[test]
    fn test_read_missing_table_is_unreadable() {
        let err = read_label_table(Path::new("/definitely/not/here.csv"), false).unwrap_err();
        assert!(matches!(err, PartitionError::LabelTableUnreadable { .. }));
    }
}
