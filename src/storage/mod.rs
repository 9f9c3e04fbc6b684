//! Storage Layer - persistence adapter for equivalence stores
//!
//! One relation per store:
//! - <store>(canon, symbol) with `symbol` as primary key and `canon` indexed
//!
//! The [`Backend`] trait isolates the store from the engine; SQLite is the
//! bundled implementation (file-backed or in-memory).

pub mod backend;
pub mod schema;
pub mod sqlite;

pub use backend::Backend;
pub use sqlite::{SqliteBackend, SqliteConfig};
