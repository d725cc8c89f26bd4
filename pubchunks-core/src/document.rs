//! Parsed documents
//!
//! A `Document` owns the XPath document store holding one parsed article.
//! Evaluating a query needs mutable access to that store, so a document is
//! worked on by one thread at a time. Documents handed in already parsed are
//! shared behind a `Mutex`.

use regex::Regex;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError};
use xee_xpath::{DocumentHandle, Documents};

static WHITESPACE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

static NEXT_DOCUMENT_ID: AtomicU64 = AtomicU64::new(1);

pub struct Document {
    id: u64,
    store: Documents,
    handle: DocumentHandle,
}

impl Document {
    /// Wrap a store holding exactly one parsed document
    pub(crate) fn from_store(store: Documents, handle: DocumentHandle) -> Self {
        Self {
            id: NEXT_DOCUMENT_ID.fetch_add(1, Ordering::Relaxed),
            store,
            handle,
        }
    }

    /// Process-unique id. Query results remember it so they can't be used
    /// as the context of a query on a different document.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn handle(&self) -> &DocumentHandle {
        &self.handle
    }

    pub(crate) fn store(&self) -> &Documents {
        &self.store
    }

    pub(crate) fn store_mut(&mut self) -> &mut Documents {
        &mut self.store
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document").field("id", &self.id).finish_non_exhaustive()
    }
}

/// Where a document comes from
#[derive(Debug, Clone)]
pub enum DocumentSource {
    Path(PathBuf),
    Text(String),
    Parsed(Arc<Mutex<Document>>),
}

impl DocumentSource {
    /// Label recorded on results: the path, or "inline"/"parsed"
    pub fn label(&self) -> String {
        match self {
            DocumentSource::Path(path) => path.display().to_string(),
            DocumentSource::Text(_) => "inline".to_string(),
            DocumentSource::Parsed(_) => "parsed".to_string(),
        }
    }
}

impl From<PathBuf> for DocumentSource {
    fn from(path: PathBuf) -> Self {
        DocumentSource::Path(path)
    }
}

impl From<Document> for DocumentSource {
    fn from(document: Document) -> Self {
        DocumentSource::Parsed(Arc::new(Mutex::new(document)))
    }
}

/// A document ready for querying: parsed for this run, or a shared one
/// locked for the duration of the borrow
#[derive(Debug)]
pub enum LoadedDocument<'a> {
    Owned(Document),
    Shared(MutexGuard<'a, Document>),
}

impl<'a> LoadedDocument<'a> {
    pub(crate) fn lock(shared: &'a Mutex<Document>) -> Self {
        // A panic in another holder leaves the tree intact; queries never mutate it
        LoadedDocument::Shared(shared.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Deref for LoadedDocument<'_> {
    type Target = Document;

    fn deref(&self) -> &Document {
        match self {
            LoadedDocument::Owned(document) => document,
            LoadedDocument::Shared(guard) => guard,
        }
    }
}

impl DerefMut for LoadedDocument<'_> {
    fn deref_mut(&mut self) -> &mut Document {
        match self {
            LoadedDocument::Owned(document) => document,
            LoadedDocument::Shared(guard) => guard,
        }
    }
}

/// Collapse runs of whitespace into single spaces and trim the ends
pub fn normalize_whitespace(text: &str) -> String {
    WHITESPACE_REGEX.replace_all(text.trim(), " ").into_owned()
}
