// file: src/pipeline/transformer.rs
// description: positional mapping from raw source rows to index documents
// reference: IndicePA pec.txt column layout

use crate::error::{Result, SyncError};
use crate::models::Document;
use crate::parser::RawRow;

pub const CODE_FIELD: usize = 0;
pub const DESCRIPTION_FIELD: usize = 1;
pub const CATEGORY_FIELD: usize = 3;
pub const CONTACT_ADDRESS_FIELD: usize = 7;

/// Shortest row the mapping can read from.
pub const REQUIRED_FIELDS: usize = CONTACT_ADDRESS_FIELD + 1;

/// Maps one data row to one [`Document`]. Field content is not checked.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordTransformer;

impl RecordTransformer {
    pub fn new() -> Self {
        Self
    }

    pub fn transform(&self, row: &RawRow) -> Result<Document> {
        if row.len() < REQUIRED_FIELDS {
            return Err(SyncError::FieldMissing {
                line: row.line(),
                found: row.len(),
                required: REQUIRED_FIELDS,
            });
        }

        let field = |index: usize| row.field(index).unwrap_or_default();

        Ok(Document::new(
            &field(CODE_FIELD),
            field(DESCRIPTION_FIELD),
            field(CATEGORY_FIELD),
            field(CONTACT_ADDRESS_FIELD),
        ))
    }
}
