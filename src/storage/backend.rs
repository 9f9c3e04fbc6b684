//! Backend capability interface
//!
//! The store never talks to a database engine directly. It renders statements
//! from [`schema`](super::schema) and hands them to a [`Backend`] together with
//! the symbol values to bind. Swapping the engine means implementing this trait.

use crate::Result;
use crate::symbol::StoreName;

/// Minimal set of primitives a storage engine must provide.
///
/// All symbol values travel through `params` and must be bound by the engine,
/// never spliced into the statement text.
pub trait Backend {
    /// Short engine name used in diagnostics
    fn engine(&self) -> &'static str;

    /// Open the connection. Calling this while connected is a no-op.
    fn connect(&mut self) -> Result<()>;

    /// Release the connection handle. Safe to call when not connected.
    fn disconnect(&mut self);

    fn is_connected(&self) -> bool;

    /// Execute a statement, returning the number of rows changed
    fn execute(&self, sql: &str, params: &[&str]) -> Result<usize>;

    /// Run a query and collect its first column
    fn query_column(&self, sql: &str, params: &[&str]) -> Result<Vec<String>>;

    /// Run a query and collect its first two columns
    fn query_pairs(&self, sql: &str, params: &[&str]) -> Result<Vec<(String, String)>>;

    /// Run a query expected to return zero or one text value
    fn query_optional(&self, sql: &str, params: &[&str]) -> Result<Option<String>>;

    /// Run a `COUNT(*)`-style query
    fn query_count(&self, sql: &str, params: &[&str]) -> Result<u64>;

    fn table_exists(&self, table: &StoreName) -> Result<bool>;

    /// Names of all relations in the backing database
    fn tables(&self) -> Result<Vec<String>>;

    /// Engine-specific DDL creating the relation for `table`
    fn schema(&self, table: &StoreName) -> Vec<String>;

    /// Start a write transaction that excludes other writers until commit
    fn begin(&self) -> Result<()>;

    fn commit(&self) -> Result<()>;

    fn rollback(&self) -> Result<()>;
}
