// file: src/utils/validation.rs
// description: data validation utilities and helpers
// reference: input validation patterns

use crate::error::{Result, SyncError};
use lazy_static::lazy_static;
use regex::Regex;

/// Elasticsearch refuses index names longer than this many bytes.
const MAX_INDEX_NAME_BYTES: usize = 255;

lazy_static! {
    // lowercase, no `\ / * ? " < > | , #`, no whitespace, no leading `-`, `_` or `+`
    static ref INDEX_NAME_PATTERN: Regex =
        Regex::new(r#"^[a-z0-9.][^A-Z\\/*?"<>|,#\s]*$"#).unwrap();
}

pub struct Validator;

impl Validator {
    pub fn validate_url(url: &str) -> Result<()> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(SyncError::Validation(format!(
                "Invalid URL format: {}",
                url
            )));
        }
        Ok(())
    }

    pub fn validate_index_name(name: &str) -> Result<()> {
        if name.is_empty() || name == "." || name == ".." {
            return Err(SyncError::Validation(format!(
                "Invalid index name: '{}'",
                name
            )));
        }

        if name.len() > MAX_INDEX_NAME_BYTES {
            return Err(SyncError::Validation(format!(
                "Index name too long ({} bytes, max {})",
                name.len(),
                MAX_INDEX_NAME_BYTES
            )));
        }

        if !INDEX_NAME_PATTERN.is_match(name) {
            return Err(SyncError::Validation(format!(
                "Invalid index name: '{}' (lowercase, no spaces or \\/*?\"<>|,# and must not start with -, _ or +)",
                name
            )));
        }

        Ok(())
    }

    pub fn truncate_text(text: &str, max_chars: usize) -> String {
        match text.char_indices().nth(max_chars) {
            Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
            None => text.to_string(),
        }
    }
}
