use crate::ValueKind;
use thiserror::Error;

/// Failure while applying or reducing a [`Mapping`](crate::Mapping).
///
/// Missing data is never an error: a query without matches simply produces
/// an empty value which the reducer prunes. Errors are reserved for mapping
/// definitions that cannot work against the given document.
#[derive(Error, Debug)]
pub enum MapError {
    #[error("field '{name}' is a {kind} but its context is not a node sequence; give it a query that selects nodes")]
    UnexpandedCollection { name: String, kind: ValueKind },
    #[error("field '{name}' of kind {kind} was bound to per-element child groups")]
    KindMismatch { name: String, kind: ValueKind },
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error(transparent)]
    Document(#[from] XmlError),
}

/// A query string the adapter could not evaluate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("invalid query '{query}' at offset {position}: {message}")]
    Syntax { query: String, position: usize, message: String },
    #[error("query '{query}' is not supported: {reason}")]
    Unsupported { query: String, reason: String },
}

/// Markup that could not be turned into a document tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum XmlError {
    #[error("malformed document at byte {position}: {message}")]
    Malformed { position: u64, message: String },
    #[error("element <{name}> is never closed")]
    Unclosed { name: String },
    #[error("document has no root element")]
    Empty,
}
