//! SQLite storage implementation

use std::path::{Path, PathBuf};
use std::time::Duration;
use rusqlite::{Connection, OptionalExtension, params_from_iter};
use serde::{Deserialize, Serialize};
use crate::{Result, Error};
use crate::symbol::StoreName;
use super::backend::Backend;
use super::schema;

/// Configuration for the SQLite backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqliteConfig {
    /// Database file. `None` opens a private in-memory database.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// How long a writer waits for a competing transaction before failing
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// Create missing parent directories of `path` on connect
    #[serde(default = "default_create_parent_dirs")]
    pub create_parent_dirs: bool,
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

fn default_create_parent_dirs() -> bool {
    true
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: None,
            busy_timeout_ms: default_busy_timeout_ms(),
            create_parent_dirs: default_create_parent_dirs(),
        }
    }
}

impl SqliteConfig {
    /// File-backed database at `path`
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn in_memory() -> Self {
        Self::default()
    }
}

/// SQLite-backed storage for equivalence stores
pub struct SqliteBackend {
    config: SqliteConfig,
    conn: Option<Connection>,
}

impl SqliteBackend {
    pub fn new(config: SqliteConfig) -> Self {
        Self { config, conn: None }
    }

    /// Backend for a database file (creates it on connect if missing)
    pub fn open(path: &Path) -> Self {
        Self::new(SqliteConfig::file(path))
    }

    /// In-memory backend (for testing)
    pub fn in_memory() -> Self {
        Self::new(SqliteConfig::in_memory())
    }

    pub fn config(&self) -> &SqliteConfig {
        &self.config
    }

    fn target(&self) -> String {
        match &self.config.path {
            Some(path) => path.display().to_string(),
            None => ":memory:".to_string(),
        }
    }

    fn conn(&self) -> Result<&Connection> {
        self.conn.as_ref().ok_or_else(|| Error::Connection {
            target: self.target(),
            message: "not connected".to_string(),
        })
    }

    /// Open and configure a connection. Every failure is a connection error.
    fn open_connection(&self) -> Result<Connection> {
        let connection_error = |message: String| Error::Connection {
            target: self.target(),
            message,
        };

        let conn = match &self.config.path {
            Some(path) => {
                if self.config.create_parent_dirs {
                    ensure_db_dir(path).map_err(|e| connection_error(e.to_string()))?;
                }
                Connection::open(path)
            }
            None => Connection::open_in_memory(),
        }
        .map_err(|e| connection_error(e.to_string()))?;

        conn.busy_timeout(Duration::from_millis(self.config.busy_timeout_ms))
            .map_err(|e| connection_error(e.to_string()))?;
        Ok(conn)
    }
}

impl Backend for SqliteBackend {
    fn engine(&self) -> &'static str {
        "sqlite"
    }

    fn connect(&mut self) -> Result<()> {
        if self.conn.is_some() {
            return Ok(());
        }
        let conn = self.open_connection()?;
        tracing::info!("Connected to sqlite database {}", self.target());
        self.conn = Some(conn);
        Ok(())
    }

    fn disconnect(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err((_, e)) = conn.close() {
                tracing::warn!("Error closing sqlite database {}: {}", self.target(), e);
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    fn execute(&self, sql: &str, params: &[&str]) -> Result<usize> {
        let changed = self.conn()?.execute(sql, params_from_iter(params.iter()))?;
        Ok(changed)
    }

    fn query_column(&self, sql: &str, params: &[&str]) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(sql)?;
        let values = stmt
            .query_map(params_from_iter(params.iter()), |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(values)
    }

    fn query_pairs(&self, sql: &str, params: &[&str]) -> Result<Vec<(String, String)>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(sql)?;
        let rows = stmt
            .query_map(params_from_iter(params.iter()), |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<(String, String)>>>()?;
        Ok(rows)
    }

    fn query_optional(&self, sql: &str, params: &[&str]) -> Result<Option<String>> {
        self.conn()?
            .query_row(sql, params_from_iter(params.iter()), |row| row.get(0))
            .optional()
            .map_err(Into::into)
    }

    fn query_count(&self, sql: &str, params: &[&str]) -> Result<u64> {
        let count: i64 = self
            .conn()?
            .query_row(sql, params_from_iter(params.iter()), |row| row.get(0))?;
        Ok(count as u64)
    }

    fn table_exists(&self, table: &StoreName) -> Result<bool> {
        let count = self.query_count(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            &[table.as_str()],
        )?;
        Ok(count > 0)
    }

    fn tables(&self) -> Result<Vec<String>> {
        self.query_column(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
            &[],
        )
    }

    fn schema(&self, table: &StoreName) -> Vec<String> {
        schema::all_schema_statements(table)
    }

    fn begin(&self) -> Result<()> {
        self.conn()?.execute_batch("BEGIN IMMEDIATE")?;
        Ok(())
    }

    fn commit(&self) -> Result<()> {
        self.conn()?.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback(&self) -> Result<()> {
        self.conn()?.execute_batch("ROLLBACK")?;
        Ok(())
    }
}

fn ensure_db_dir(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connected() -> SqliteBackend {
        let mut backend = SqliteBackend::in_memory();
        backend.connect().unwrap();
        backend
    }

    #[test]
    fn test_connect_is_idempotent() {
        let mut backend = SqliteBackend::in_memory();
        assert!(!backend.is_connected());
        backend.connect().unwrap();
        backend.execute("CREATE TABLE t (x TEXT)", &[]).unwrap();
        backend.connect().unwrap();
        // same handle, so the table is still there
        assert!(backend.table_exists(&StoreName::new("t").unwrap()).unwrap());
    }

    #[test]
    fn test_disconnect_forces_no_connection() {
        let mut backend = connected();
        backend.disconnect();
        assert!(!backend.is_connected());
        match backend.query_count("SELECT 1", &[]) {
            Err(Error::Connection { target, .. }) => assert_eq!(target, ":memory:"),
            other => panic!("expected connection error, got {:?}", other),
        }
        backend.disconnect();
    }

    #[test]
    fn test_parameters_are_bound() {
        let backend = connected();
        let name = StoreName::new("pairs").unwrap();
        for stmt in backend.schema(&name) {
            backend.execute(&stmt, &[]).unwrap();
        }
        let nasty = "x'); DROP TABLE \"pairs\"; --";
        backend
            .execute("INSERT INTO \"pairs\" (canon, symbol) VALUES (?1, ?2)", &[nasty, nasty])
            .unwrap();
        assert!(backend.table_exists(&name).unwrap());
        let got = backend
            .query_optional("SELECT canon FROM \"pairs\" WHERE symbol = ?1", &[nasty])
            .unwrap();
        assert_eq!(got.as_deref(), Some(nasty));
    }

    #[test]
    fn test_tables_lists_relations() {
        let backend = connected();
        backend.execute("CREATE TABLE b (x TEXT)", &[]).unwrap();
        backend.execute("CREATE TABLE a (x TEXT)", &[]).unwrap();
        assert_eq!(backend.tables().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_rollback_discards_writes() {
        let backend = connected();
        backend.execute("CREATE TABLE t (x TEXT)", &[]).unwrap();
        backend.begin().unwrap();
        backend.execute("INSERT INTO t VALUES (?1)", &["v"]).unwrap();
        backend.rollback().unwrap();
        assert_eq!(backend.query_count("SELECT COUNT(*) FROM t", &[]).unwrap(), 0);
    }

    #[test]
    fn test_file_backend_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("sameas.db");
        let mut backend = SqliteBackend::open(&path);
        backend.connect().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_unreachable_path_is_a_connection_error() {
        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("plain");
        std::fs::write(&plain, "not a directory").unwrap();

        // directory creation fails
        let nested = plain.join("nested").join("sameas.db");
        let mut backend = SqliteBackend::open(&nested);
        match backend.connect() {
            Err(Error::Connection { target, .. }) => assert_eq!(target, nested.display().to_string()),
            other => panic!("expected connection error, got {:?}", other),
        }
        assert!(!backend.is_connected());

        // opening the file fails
        let mut config = SqliteConfig::file(plain.join("sameas.db"));
        config.create_parent_dirs = false;
        let mut backend = SqliteBackend::new(config);
        assert!(matches!(backend.connect(), Err(Error::Connection { .. })));
    }
}
