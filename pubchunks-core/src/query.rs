//! Structural queries
//!
//! Extraction rules are XPath 3.1 expressions. They are evaluated through the
//! `QueryEngine` trait, so the extractor and the rule registry never touch
//! the evaluator directly. The built-in `XPathEngine` runs them on
//! `xee-xpath`.
//!
//! Publisher profiles that read namespaced XML (Elsevier full text) match
//! elements with the `*:name` wildcard, since those documents put every
//! element in a default namespace.

use crate::document::{normalize_whitespace, Document};
use crate::error::QueryError;
use std::fmt;
use xee_xpath::{context::StaticContextBuilder, Item, Itemable, Queries, Query};

/// One item selected by a query: an element, attribute or text node, or an
/// atomic value such as the result of `count(...)`
#[derive(Clone)]
pub struct Match {
    document: u64,
    item: Item,
    text: String,
}

impl Match {
    /// Whitespace-normalized string value
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Id of the document the item was selected from
    pub fn document_id(&self) -> u64 {
        self.document
    }
}

impl fmt::Debug for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Match")
            .field("document", &self.document)
            .field("text", &self.text)
            .finish_non_exhaustive()
    }
}

/// Evaluates query strings against parsed documents
pub trait QueryEngine: Send + Sync {
    /// Dialect name for logging
    fn name(&self) -> &str;

    /// Validate a query without evaluating it
    fn check(&self, query: &str) -> Result<(), QueryError>;

    /// Evaluate `query` relative to `context`, or to the document node when
    /// `context` is `None`. A context selected from another document is an
    /// error.
    fn evaluate(
        &self,
        document: &mut Document,
        context: Option<&Match>,
        query: &str,
    ) -> Result<Vec<Match>, QueryError>;
}

/// Built-in engine: full XPath 3.1 via `xee-xpath`
#[derive(Debug, Default, Clone)]
pub struct XPathEngine;

impl XPathEngine {
    pub fn new() -> Self {
        Self
    }
}

impl QueryEngine for XPathEngine {
    fn name(&self) -> &str {
        "xpath"
    }

    fn check(&self, query: &str) -> Result<(), QueryError> {
        if query.trim().is_empty() {
            return Err(QueryError::Empty);
        }
        let queries = Queries::new(StaticContextBuilder::default());
        queries
            .sequence(query)
            .map(|_| ())
            .map_err(|e| compile_error(query, e))
    }

    fn evaluate(
        &self,
        document: &mut Document,
        context: Option<&Match>,
        query: &str,
    ) -> Result<Vec<Match>, QueryError> {
        if query.trim().is_empty() {
            return Err(QueryError::Empty);
        }
        let queries = Queries::new(StaticContextBuilder::default());
        let compiled = queries.sequence(query).map_err(|e| compile_error(query, e))?;

        let context_item = match context {
            Some(matched) if matched.document != document.id() => {
                return Err(QueryError::ForeignContext)
            }
            Some(matched) => matched.item.clone(),
            None => document
                .handle()
                .to_item(document.store())
                .map_err(|e| evaluate_error(query, e))?,
        };

        let mut dynamic_context_builder = compiled.dynamic_context_builder(document.store_mut());
        dynamic_context_builder.context_item(context_item);
        let dynamic_context = dynamic_context_builder.build();
        let sequence = compiled
            .execute_with_context(document.store_mut(), &dynamic_context)
            .map_err(|e| evaluate_error(query, e))?
            .flatten()
            .map_err(|e| evaluate_error(query, e))?;

        let document_id = document.id();
        let xot = document.store().xot();
        Ok(sequence
            .iter()
            .map(|item| Match {
                document: document_id,
                text: item
                    .string_value(xot)
                    .map(|value| normalize_whitespace(&value))
                    .unwrap_or_default(),
                item: item.clone(),
            })
            .collect())
    }
}

fn compile_error(query: &str, error: impl fmt::Display) -> QueryError {
    QueryError::Compile {
        query: query.to_string(),
        reason: error.to_string(),
    }
}

fn evaluate_error(query: &str, error: impl fmt::Display) -> QueryError {
    QueryError::Evaluate {
        query: query.to_string(),
        reason: error.to_string(),
    }
}
