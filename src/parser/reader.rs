// file: src/parser/reader.rs
// description: lenient tab-separated reader yielding recycled raw rows
// reference: https://docs.rs/csv

use crate::error::{Result, SyncError};
use crate::parser::row::RawRow;
use csv::{ByteRecord, ErrorKind, ReaderBuilder, Terminator};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

const DELIMITER: u8 = b'\t';

/// Streams data rows out of a tab-separated source, header excluded.
///
/// Rows end at `\n`; a trailing `\r` is dropped, so LF and CRLF exports read
/// the same and blank lines are skipped. Rows may have any number of fields.
///
/// Quoting is lenient. A `"` in the middle of a field is plain content. A `"`
/// at the start of a field opens a quoted field: the closing quote is
/// stripped and any text after it is kept (`"Sopra" il Colle` reads as
/// `Sopra il Colle`). An opening quote that is never closed runs to the end
/// of the source, taking the tabs and newlines of every later row with it.
pub struct RecordReader<R: Read> {
    inner: csv::Reader<R>,
    origin: PathBuf,
    headers: Vec<String>,
    row: RawRow,
    rows_read: u64,
    next_line: u64,
    scratch: Vec<u8>,
}

impl RecordReader<File> {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| SyncError::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        })?;

        Self::with_origin(file, path.to_path_buf())
    }
}

impl<R: Read> RecordReader<R> {
    pub fn from_reader(reader: R) -> Result<Self> {
        Self::with_origin(reader, PathBuf::from("<stream>"))
    }

    fn with_origin(reader: R, origin: PathBuf) -> Result<Self> {
        let inner = ReaderBuilder::new()
            .delimiter(DELIMITER)
            .has_headers(true)
            .flexible(true)
            .double_quote(true)
            .terminator(Terminator::Any(b'\n'))
            .from_reader(reader);

        let mut reader = Self {
            inner,
            origin,
            headers: Vec::new(),
            row: RawRow::default(),
            rows_read: 0,
            next_line: 1,
            scratch: Vec::new(),
        };

        let header = reader
            .inner
            .byte_headers()
            .map(|record| (decode_header(record), embedded_newlines(record)));
        let (headers, header_newlines) = match header {
            Ok(header) => header,
            Err(e) => return Err(reader.map_error(e)),
        };
        reader.locate(header_newlines);
        debug!(
            "Source {} header: {} columns {:?}",
            reader.origin.display(),
            headers.len(),
            headers
        );
        reader.headers = headers;

        Ok(reader)
    }

    /// Column names from the discarded header row.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }

    /// Lends the next data row, overwriting the previous one.
    pub fn next_row(&mut self) -> Result<Option<&RawRow>> {
        loop {
            match self.inner.read_byte_record(&mut self.row.record) {
                Ok(true) => {}
                Ok(false) => return Ok(None),
                Err(e) => return Err(self.map_error(e)),
            }

            trim_carriage_return(&mut self.row.record, &mut self.scratch);
            let line = self.locate(embedded_newlines(&self.row.record));
            if is_blank(&self.row.record) {
                continue;
            }

            self.row.line = line;
            self.rows_read += 1;
            return Ok(Some(&self.row));
        }
    }

    /// Start line of the record just read.
    ///
    /// The reader's line count covers every `\n` consumed so far, including
    /// skipped blank lines and the terminator of this record. A record cut
    /// off by end of input has no terminator, so the result never goes below
    /// the line after the previous record.
    fn locate(&mut self, newlines: u64) -> u64 {
        let consumed = self.inner.position().line();
        let start = consumed.saturating_sub(newlines + 1).max(self.next_line);
        self.next_line = start + newlines + 1;
        start
    }

    fn map_error(&self, error: csv::Error) -> SyncError {
        let line = error.position().map(|pos| pos.line()).unwrap_or(0);
        match error.into_kind() {
            ErrorKind::Io(source) => SyncError::SourceUnavailable {
                path: self.origin.clone(),
                source,
            },
            other => SyncError::MalformedInput {
                line,
                message: format!("{:?}", other),
            },
        }
    }
}

fn decode_header(record: &ByteRecord) -> Vec<String> {
    let mut headers: Vec<String> = record
        .iter()
        .map(|field| String::from_utf8_lossy(field).into_owned())
        .collect();
    if let Some(last) = headers.last_mut()
        && last.ends_with('\r')
    {
        last.pop();
    }
    headers
}

fn embedded_newlines(record: &ByteRecord) -> u64 {
    record
        .iter()
        .map(|field| field.iter().filter(|&&b| b == b'\n').count() as u64)
        .sum()
}

/// Drops the `\r` of a CRLF terminator from the last field.
fn trim_carriage_return(record: &mut ByteRecord, scratch: &mut Vec<u8>) {
    let last = record.len().saturating_sub(1);
    match record.get(last) {
        Some(field) if field.ends_with(b"\r") => {
            scratch.clear();
            scratch.extend_from_slice(&field[..field.len() - 1]);
        }
        _ => return,
    }
    record.truncate(last);
    record.push_field(&scratch[..]);
}

/// A line holding only a CRLF terminator.
fn is_blank(record: &ByteRecord) -> bool {
    record.len() == 1 && record.get(0).is_some_and(<[u8]>::is_empty)
}
