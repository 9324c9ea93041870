//! Read-only access to the documents context is drawn from.
//!
//! The [`DocumentCorpus`] trait is the seam between the engine and whatever
//! owns the row data (an editor's open tabs, files on disk, a test fixture).
//! [`InMemoryCorpus`] is the bundled implementation, and
//! [`load_json_document`] reads a document from a JSON file of row objects.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use anyhow::{bail, Context, Result};
use serde_json::Value;

use crate::error::{ContextError, ContextResult};
use crate::models::{Document, Row};

/// Resolves document handles and yields their rows.
///
/// Implementations must be `Send + Sync` so a corpus can be shared with the
/// background task running a translation job.
pub trait DocumentCorpus: Send + Sync {
    /// Look up a document by handle.
    fn resolve(&self, handle: &str) -> ContextResult<Arc<Document>>;

    /// Rows of `document` projected onto the given columns, in order.
    ///
    /// The default reads straight from the document. Override to serve rows
    /// from somewhere else or to observe access.
    fn rows<'a>(
        &'a self,
        document: &'a Document,
        source_column: &str,
        translation_column: &str,
    ) -> Box<dyn Iterator<Item = Row> + 'a> {
        Box::new(document.rows(source_column, translation_column))
    }
}

impl<C: DocumentCorpus + ?Sized> DocumentCorpus for Arc<C> {
    fn resolve(&self, handle: &str) -> ContextResult<Arc<Document>> {
        (**self).resolve(handle)
    }

    fn rows<'a>(
        &'a self,
        document: &'a Document,
        source_column: &str,
        translation_column: &str,
    ) -> Box<dyn Iterator<Item = Row> + 'a> {
        (**self).rows(document, source_column, translation_column)
    }
}

/// Corpus backed by a `HashMap` behind an `RwLock`.
pub struct InMemoryCorpus {
    docs: RwLock<HashMap<String, Arc<Document>>>,
}

impl InMemoryCorpus {
    pub fn new() -> Self {
        Self {
            docs: RwLock::new(HashMap::new()),
        }
    }

    /// Add or replace a document under its own handle.
    pub fn insert(&self, doc: Document) {
        let mut docs = self.docs.write().unwrap_or_else(PoisonError::into_inner);
        docs.insert(doc.handle.clone(), Arc::new(doc));
    }

    pub fn remove(&self, handle: &str) -> Option<Arc<Document>> {
        let mut docs = self.docs.write().unwrap_or_else(PoisonError::into_inner);
        docs.remove(handle)
    }

    pub fn clear(&self) {
        self.docs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// All handles, sorted.
    pub fn handles(&self) -> Vec<String> {
        let docs = self.docs.read().unwrap_or_else(PoisonError::into_inner);
        let mut handles: Vec<String> = docs.keys().cloned().collect();
        handles.sort();
        handles
    }
}

impl Default for InMemoryCorpus {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<Document> for InMemoryCorpus {
    fn from_iter<T: IntoIterator<Item = Document>>(iter: T) -> Self {
        let corpus = Self::new();
        for doc in iter {
            corpus.insert(doc);
        }
        corpus
    }
}

impl DocumentCorpus for InMemoryCorpus {
    fn resolve(&self, handle: &str) -> ContextResult<Arc<Document>> {
        let docs = self.docs.read().unwrap_or_else(PoisonError::into_inner);
        docs.get(handle)
            .cloned()
            .ok_or_else(|| ContextError::UnknownDocument(handle.to_string()))
    }
}

/// Load a document from a JSON file holding an array of row objects.
///
/// Columns are the union of object keys in first-seen order. Strings are
/// kept as-is, `null` and missing keys become absent cells, and numbers and
/// booleans are stringified. The handle is the path as given.
pub fn load_json_document(path: &Path) -> Result<Document> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read document: {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse document: {}", path.display()))?;
    parse_json_rows(&path.display().to_string(), &value)
}

fn parse_json_rows(handle: &str, value: &Value) -> Result<Document> {
    let items = match value {
        Value::Array(items) => items,
        _ => bail!("Document {} must be a JSON array of row objects", handle),
    };

    let mut columns: Vec<String> = Vec::new();
    for (i, item) in items.iter().enumerate() {
        let obj = match item {
            Value::Object(obj) => obj,
            _ => bail!("Row {} of {} is not a JSON object", i, handle),
        };
        for key in obj.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
    }

    let records = items
        .iter()
        .filter_map(Value::as_object)
        .map(|obj| {
            columns
                .iter()
                .map(|col| obj.get(col).and_then(cell_text))
                .collect()
        })
        .collect();

    Ok(Document::new(handle, columns, records))
}

fn cell_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}
