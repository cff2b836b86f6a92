// file: src/parser/row.rs
// description: raw tab-separated row with lossy field access
// reference: https://docs.rs/csv

use csv::ByteRecord;
use std::borrow::Cow;

/// One data row as read from the source, fields in column order.
///
/// The reader recycles a single `RawRow` between reads; copy out anything
/// that must outlive the next call to `RecordReader::next_row`.
#[derive(Debug, Clone, Default)]
pub struct RawRow {
    pub(crate) record: ByteRecord,
    pub(crate) line: u64,
}

impl RawRow {
    pub fn from_fields<I, T>(line: u64, fields: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        let mut record = ByteRecord::new();
        for field in fields {
            record.push_field(field.as_ref());
        }
        Self { record, line }
    }

    /// 1-based line in the source where this row starts.
    pub fn line(&self) -> u64 {
        self.line
    }

    pub fn len(&self) -> usize {
        self.record.len()
    }

    pub fn is_empty(&self) -> bool {
        self.record.is_empty()
    }

    /// Invalid UTF-8 sequences are replaced with U+FFFD.
    pub fn field(&self, index: usize) -> Option<Cow<'_, str>> {
        self.record.get(index).map(String::from_utf8_lossy)
    }

    pub fn fields(&self) -> impl Iterator<Item = Cow<'_, str>> {
        self.record.iter().map(String::from_utf8_lossy)
    }
}
