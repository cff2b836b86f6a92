// file: src/models/document.rs
// description: index document model and the per-run snapshot of documents
// reference: internal data structures

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One public administration as stored in the index.
///
/// Serialized with the field names of the index mapping (`ipa`, `type`, `pec`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "ipa")]
    code: String,
    description: String,
    #[serde(rename = "type")]
    category: String,
    #[serde(rename = "pec")]
    contact_address: String,
}

impl Document {
    /// `code` is lower-cased; the other fields are kept verbatim.
    pub fn new(
        code: &str,
        description: impl Into<String>,
        category: impl Into<String>,
        contact_address: impl Into<String>,
    ) -> Self {
        Self {
            code: code.to_lowercase(),
            description: description.into(),
            category: category.into(),
            contact_address: contact_address.into(),
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn contact_address(&self) -> &str {
        &self.contact_address
    }
}

/// Every document produced by one run, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    documents: Vec<Document>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, document: Document) {
        self.documents.push(document);
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Pairs each document with its storage id: its zero-based position
    /// rendered as a decimal string. Never derived from `code`.
    pub fn with_storage_ids(&self) -> impl Iterator<Item = (String, &Document)> {
        self.documents
            .iter()
            .enumerate()
            .map(|(position, doc)| (position.to_string(), doc))
    }

    /// SHA-256 over the documents in order; equal snapshots share a digest.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        for doc in &self.documents {
            for field in [
                &doc.code,
                &doc.description,
                &doc.category,
                &doc.contact_address,
            ] {
                hasher.update((field.len() as u64).to_le_bytes());
                hasher.update(field.as_bytes());
            }
        }
        format!("{:x}", hasher.finalize())
    }
}

impl FromIterator<Document> for Snapshot {
    fn from_iter<I: IntoIterator<Item = Document>>(iter: I) -> Self {
        Self {
            documents: iter.into_iter().collect(),
        }
    }
}
