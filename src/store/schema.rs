// file: src/store/schema.rs
// description: index mapping passed to the store when creating the index
// reference: https://www.elastic.co/guide/en/elasticsearch/reference/current/mapping.html

use crate::error::{Result, SyncError};
use serde_json::{Value, json};
use std::path::Path;
use tracing::info;

/// Document fields every mapping must declare.
pub const DOCUMENT_FIELDS: [&str; 4] = ["ipa", "description", "type", "pec"];

/// Opaque create-index body (`settings` and `mappings`).
#[derive(Debug, Clone, PartialEq)]
pub struct IndexMapping(Value);

impl IndexMapping {
    /// Full-text fields with an exact-match `keyword` sub-field each.
    pub fn pec_mapping() -> Self {
        let mut properties = serde_json::Map::new();
        for field in DOCUMENT_FIELDS {
            properties.insert(
                field.to_string(),
                json!({
                    "type": "text",
                    "fields": {
                        "keyword": { "type": "keyword", "ignore_above": 256 }
                    }
                }),
            );
        }

        Self(json!({
            "mappings": {
                "properties": properties
            }
        }))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            SyncError::Config(format!("Cannot read mapping {}: {}", path.display(), e))
        })?;
        let mapping = Self::from_json_str(&raw)?;
        info!("Loaded index mapping from {}", path.display());
        Ok(mapping)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| SyncError::Config(format!("Invalid mapping JSON: {}", e)))?;
        let mapping = Self(value);
        mapping.verify()?;
        Ok(mapping)
    }

    pub fn as_json(&self) -> &Value {
        &self.0
    }

    /// Checks that every document field is declared under
    /// `mappings.properties`.
    fn verify(&self) -> Result<()> {
        let properties = self
            .0
            .pointer("/mappings/properties")
            .and_then(Value::as_object)
            .ok_or_else(|| SyncError::Config("Mapping has no mappings.properties".to_string()))?;

        let missing: Vec<&str> = DOCUMENT_FIELDS
            .iter()
            .copied()
            .filter(|field| !properties.contains_key(*field))
            .collect();

        if !missing.is_empty() {
            return Err(SyncError::Config(format!(
                "Mapping is missing document fields: {}",
                missing.join(", ")
            )));
        }

        Ok(())
    }
}

impl Default for IndexMapping {
    fn default() -> Self {
        Self::pec_mapping()
    }
}
