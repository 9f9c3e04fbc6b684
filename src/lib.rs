//! # sameas - Equivalence store for interchangeable identifiers
//!
//! Symbols are grouped into disjoint bundles, each with one designated canon.
//!
//! sameas provides:
//! - An equivalence store with assert/query/remove/set-canon/dump operations
//! - A persistence adapter over a two-column `(canon, symbol)` relation
//! - SQLite-backed storage, file or in-memory
//! - Statistics and integrity/domain analysis over a whole store

pub mod symbol;
pub mod storage;
pub mod store;
pub mod tsv;
pub mod query;
pub mod config;
pub mod ui;


// Re-exports for convenient access
pub use symbol::{Pair, Slug, StoreName};
pub use storage::{Backend, SqliteBackend, SqliteConfig};
pub use store::{Store, StoreConfig};
pub use query::{Analysis, Statistics};

/// Result type alias for sameas operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for sameas operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Connection error ({target}): {message}")]
    Connection { target: String, message: String },

    #[error("Constraint violated in store '{store}': {message}")]
    Constraint { store: String, message: String },

    #[error("Storage error in store '{store}' during {operation}: {message}")]
    Storage {
        store: String,
        operation: &'static str,
        message: String,
    },

    #[error("Failed at item {index} ({item}): {source}")]
    Batch {
        index: usize,
        item: String,
        #[source]
        source: Box<Error>,
    },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The innermost error, looking through batch wrappers
    pub fn root(&self) -> &Error {
        match self {
            Error::Batch { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn is_constraint(&self) -> bool {
        matches!(self.root(), Error::Constraint { .. })
    }
}
