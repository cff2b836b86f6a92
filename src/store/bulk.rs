// file: src/store/bulk.rs
// description: bulk request encoding and bulk response decoding
// reference: https://www.elastic.co/guide/en/elasticsearch/reference/current/docs-bulk.html

use crate::error::{Result, SyncError};
use crate::models::Document;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One `index` action: store `document` under `id`, replacing any previous
/// document with the same id.
#[derive(Debug, Clone, Copy)]
pub struct BulkOperation<'a> {
    pub id: &'a str,
    pub document: &'a Document,
}

#[derive(Serialize)]
struct ActionLine<'a> {
    index: ActionMeta<'a>,
}

#[derive(Serialize)]
struct ActionMeta<'a> {
    #[serde(rename = "_index")]
    index: &'a str,
    #[serde(rename = "_id")]
    id: &'a str,
}

/// Newline-delimited JSON body, one action line and one source line per
/// operation, terminated by a newline.
pub fn encode_body(index: &str, operations: &[BulkOperation<'_>]) -> Result<String> {
    let mut body = String::new();

    for op in operations {
        let action = ActionLine {
            index: ActionMeta { index, id: op.id },
        };
        body.push_str(&to_json_line(&action)?);
        body.push_str(&to_json_line(op.document)?);
    }

    Ok(body)
}

fn to_json_line<T: Serialize>(value: &T) -> Result<String> {
    let mut line = serde_json::to_string(value)
        .map_err(|e| SyncError::store("bulk", format!("Failed to encode bulk line: {}", e)))?;
    line.push('\n');
    Ok(line)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkItemOutcome {
    pub id: String,
    pub status: u16,
    pub error: Option<String>,
}

impl BulkItemOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none() && (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkResponse {
    pub took_ms: u64,
    pub items: Vec<BulkItemOutcome>,
}

impl BulkResponse {
    /// Items the store confirmed as written.
    pub fn indexed(&self) -> usize {
        self.items.iter().filter(|item| item.is_success()).count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &BulkItemOutcome> {
        self.items.iter().filter(|item| !item.is_success())
    }

    pub fn from_json(body: &str) -> Result<Self> {
        let raw: RawBulkResponse = serde_json::from_str(body).map_err(|e| {
            SyncError::store("bulk", format!("Failed to parse bulk response: {}", e))
        })?;

        let items = raw
            .items
            .into_iter()
            .flat_map(|entry| entry.into_values())
            .map(|item| BulkItemOutcome {
                id: item.id.unwrap_or_default(),
                status: item.status,
                error: item.error.map(describe_error),
            })
            .collect();

        Ok(Self {
            took_ms: raw.took,
            items,
        })
    }
}

#[derive(Deserialize)]
struct RawBulkResponse {
    #[serde(default)]
    took: u64,
    #[serde(default)]
    items: Vec<HashMap<String, RawBulkItem>>,
}

#[derive(Deserialize)]
struct RawBulkItem {
    #[serde(rename = "_id")]
    id: Option<String>,
    status: u16,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

fn describe_error(error: serde_json::Value) -> String {
    let kind = error.get("type").and_then(|v| v.as_str());
    let reason = error.get("reason").and_then(|v| v.as_str());
    match (kind, reason) {
        (Some(kind), Some(reason)) => format!("{}: {}", kind, reason),
        (Some(kind), None) => kind.to_string(),
        (None, Some(reason)) => reason.to_string(),
        (None, None) => error.to_string(),
    }
}
