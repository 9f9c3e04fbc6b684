//! Equivalence store
//!
//! Maintains a partition of symbols into bundles over a `(canon, symbol)`
//! relation owned by a [`Backend`]:
//! - every present symbol has exactly one row
//! - two symbols share a bundle iff their canons are equal
//! - an absent symbol is its own canon
//! - merging keeps the canon of the first-named bundle
//!
//! Read-then-write operations (`assert_pair`, `remove_symbol`, `set_canon`,
//! `restore_pairs`) run inside a write transaction, so concurrent writers on
//! other connections to the same database see either the whole change or none.
//! A `Store` itself is meant to be used from one thread; give each worker its own.

use std::path::Path;
use serde::{Deserialize, Serialize};
use crate::{Error, Result};
use crate::query::{analysis, Analysis, Statistics};
use crate::storage::{schema, Backend, SqliteBackend};
use crate::storage::schema::Statements;
use crate::symbol::{ensure_symbol, Pair, Slug, StoreName};
use crate::tsv;

/// Construction parameters for a [`Store`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store name, also the backing table name (`[A-Za-z0-9_]+`)
    pub name: String,
    /// URL-safe slug (`[A-Za-z0-9_-]+`); defaults to the name
    #[serde(default)]
    pub slug: Option<String>,
    /// Short display name; defaults to the name
    #[serde(default)]
    pub short_name: Option<String>,
    /// Long display name; defaults to the short name
    #[serde(default)]
    pub full_name: Option<String>,
}

impl StoreConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slug: None,
            short_name: None,
            full_name: None,
        }
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn with_names(mut self, short_name: impl Into<String>, full_name: impl Into<String>) -> Self {
        self.short_name = Some(short_name.into());
        self.full_name = Some(full_name.into());
        self
    }
}

/// An equivalence store over a storage backend
pub struct Store<B: Backend = SqliteBackend> {
    backend: B,
    name: StoreName,
    slug: Slug,
    short_name: String,
    full_name: String,
    sql: Statements,
}

impl<B: Backend> Store<B> {
    /// Validate the configuration and wrap `backend`. Does not connect.
    pub fn new(config: StoreConfig, backend: B) -> Result<Self> {
        let name = StoreName::new(config.name)?;
        let slug = match config.slug {
            Some(slug) => Slug::new(slug)?,
            None => Slug::from(name.clone()),
        };
        let short_name = config.short_name.unwrap_or_else(|| name.to_string());
        let full_name = config.full_name.unwrap_or_else(|| short_name.clone());
        let sql = Statements::new(&name);

        Ok(Self {
            backend,
            name,
            slug,
            short_name,
            full_name,
            sql,
        })
    }

    /// Validate, connect and make sure the relation exists
    pub fn open(config: StoreConfig, backend: B) -> Result<Self> {
        let mut store = Self::new(config, backend)?;
        store.connect()?;
        store.init()?;
        Ok(store)
    }

    pub fn name(&self) -> &StoreName {
        &self.name
    }

    pub fn slug(&self) -> &Slug {
        &self.slug
    }

    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    // ========== Lifecycle ==========

    /// Connect the backend. A no-op when already connected.
    pub fn connect(&mut self) -> Result<()> {
        self.backend.connect()
    }

    pub fn disconnect(&mut self) {
        self.backend.disconnect();
    }

    pub fn is_connected(&self) -> bool {
        self.backend.is_connected()
    }

    /// Create the backing relation if it does not exist
    pub fn init(&self) -> Result<()> {
        for stmt in self.backend.schema(&self.name) {
            self.backend
                .execute(&stmt, &[])
                .map_err(self.storage_error("init"))?;
        }
        tracing::info!("Initialized store '{}' ({})", self.name, self.backend.engine());
        Ok(())
    }

    pub fn is_init(&self) -> Result<bool> {
        self.backend
            .table_exists(&self.name)
            .map_err(self.storage_error("is_init"))
    }

    /// Delete every row, keeping the relation
    pub fn empty_store(&self) -> Result<()> {
        let removed = self
            .backend
            .execute(&self.sql.delete_all, &[])
            .map_err(self.storage_error("empty_store"))?;
        tracing::info!("Emptied store '{}' ({} rows removed)", self.name, removed);
        Ok(())
    }

    /// Drop the relation. Data operations fail until [`init`](Self::init) runs again.
    pub fn delete_store(&self) -> Result<()> {
        self.backend
            .execute(&schema::drop_table(&self.name), &[])
            .map_err(self.storage_error("delete_store"))?;
        tracing::info!("Deleted store '{}'", self.name);
        Ok(())
    }

    // ========== Queries ==========

    /// Canon of `symbol`'s bundle, or `symbol` itself when absent
    pub fn get_canon(&self, symbol: &str) -> Result<String> {
        let canon = self
            .lookup_canon(symbol)
            .map_err(self.storage_error("get_canon"))?;
        Ok(canon.unwrap_or_else(|| symbol.to_string()))
    }

    /// Every symbol in `symbol`'s bundle, canon first then ascending.
    ///
    /// An absent symbol yields just itself.
    pub fn query_symbol(&self, symbol: &str) -> Result<Vec<String>> {
        let canon = self
            .lookup_canon(symbol)
            .map_err(self.storage_error("query_symbol"))?;
        match canon {
            Some(canon) => self
                .backend
                .query_column(&self.sql.select_bundle, &[&canon])
                .map_err(self.storage_error("query_symbol")),
            None => Ok(vec![symbol.to_string()]),
        }
    }

    /// Symbols containing `pattern` (case-sensitive), canons first then ascending
    pub fn search(&self, pattern: &str) -> Result<Vec<String>> {
        self.backend
            .query_column(&self.sql.search, &[pattern])
            .map_err(self.storage_error("search"))
    }

    /// Distinct canons, ascending
    pub fn all_canons(&self) -> Result<Vec<String>> {
        self.backend
            .query_column(&self.sql.all_canons, &[])
            .map_err(self.storage_error("all_canons"))
    }

    /// Every row ordered by canon then symbol
    pub fn dump_pairs(&self) -> Result<Vec<Pair>> {
        let rows = self
            .backend
            .query_pairs(&self.sql.all_pairs, &[])
            .map_err(self.storage_error("dump_pairs"))?;
        Ok(rows
            .into_iter()
            .map(|(canon, symbol)| Pair { canon, symbol })
            .collect())
    }

    /// `dump_pairs` as tab-separated lines, no trailing newline.
    ///
    /// Fails with [`Error::Constraint`] if a row holds a tab or line break.
    pub fn dump_tsv(&self) -> Result<String> {
        self.render_tsv(&self.dump_pairs()?)
    }

    pub fn statistics(&self) -> Result<Statistics> {
        let symbols = self
            .backend
            .query_count(&self.sql.count_symbols, &[])
            .map_err(self.storage_error("statistics"))?;
        let bundles = self
            .backend
            .query_count(&self.sql.count_bundles, &[])
            .map_err(self.storage_error("statistics"))?;
        Ok(Statistics { symbols, bundles })
    }

    /// Full-scan analysis of bundle sizes, URL domains and integrity
    pub fn analyse(&self) -> Result<Analysis> {
        let pairs = self.dump_pairs()?;
        let report = analysis::analyse(&pairs);
        for canon in &report.missing_canons {
            tracing::warn!("Store '{}': bundle '{}' has no canon row", self.name, canon);
        }
        Ok(report)
    }

    // ========== Mutations ==========

    /// Assert that `a` and `b` are equivalent.
    ///
    /// When both are already present in different bundles, the bundles merge
    /// and `a`'s canon wins. Repeating an assertion is a no-op.
    pub fn assert_pair(&self, a: &str, b: &str) -> Result<()> {
        ensure_symbol(&self.name, a)?;
        ensure_symbol(&self.name, b)?;
        self.atomically(|| self.assert_pair_unchecked(a, b))
            .map_err(self.storage_error("assert_pair"))
    }

    fn assert_pair_unchecked(&self, a: &str, b: &str) -> Result<()> {
        let canon_a = self.lookup_canon(a)?;
        if a == b {
            if canon_a.is_none() {
                self.insert(a, a)?;
                tracing::debug!("{}: new singleton bundle '{}'", self.name, a);
            }
            return Ok(());
        }

        let canon_b = self.lookup_canon(b)?;
        match (canon_a, canon_b) {
            (None, None) => {
                self.insert(a, a)?;
                self.insert(a, b)?;
                tracing::debug!("{}: new bundle '{}' with '{}'", self.name, a, b);
            }
            (None, Some(canon_b)) => {
                self.insert(&canon_b, a)?;
                tracing::debug!("{}: added '{}' to bundle '{}'", self.name, a, canon_b);
            }
            (Some(canon_a), None) => {
                self.insert(&canon_a, b)?;
                tracing::debug!("{}: added '{}' to bundle '{}'", self.name, b, canon_a);
            }
            (Some(canon_a), Some(canon_b)) if canon_a == canon_b => {}
            (Some(canon_a), Some(canon_b)) => {
                let moved = self.backend.execute(&self.sql.merge, &[&canon_a, &canon_b])?;
                tracing::debug!(
                    "{}: merged bundle '{}' ({} symbols) into '{}'",
                    self.name, canon_b, moved, canon_a
                );
            }
        }
        Ok(())
    }

    /// Assert each pair in order, stopping at the first failure.
    ///
    /// Pairs applied before the failure stay applied.
    pub fn assert_pairs<I, A, S>(&self, pairs: I) -> Result<()>
    where
        I: IntoIterator<Item = (A, S)>,
        A: AsRef<str>,
        S: AsRef<str>,
    {
        for (index, (a, b)) in pairs.into_iter().enumerate() {
            self.assert_indexed(index, a.as_ref(), b.as_ref())?;
        }
        Ok(())
    }

    /// Assert the first two tab-separated fields of every line of `text`.
    ///
    /// A failure reports the 1-based line number.
    pub fn assert_tsv(&self, text: &str) -> Result<()> {
        for record in tsv::parse(text) {
            self.assert_indexed(record.line, record.first, record.second)?;
        }
        Ok(())
    }

    fn assert_indexed(&self, index: usize, a: &str, b: &str) -> Result<()> {
        self.assert_pair(a, b).map_err(|e| Error::Batch {
            index,
            item: format!("{}\t{}", a, b),
            source: Box::new(e),
        })
    }

    /// Remove a symbol.
    ///
    /// Fails with [`Error::Constraint`] when `symbol` is the canon of a bundle
    /// that still has other members. Absent symbols are ignored.
    pub fn remove_symbol(&self, symbol: &str) -> Result<()> {
        self.atomically(|| {
            let Some(canon) = self.lookup_canon(symbol)? else {
                return Ok(());
            };
            if canon == symbol {
                let size = self.backend.query_count(&self.sql.bundle_size, &[&canon])?;
                if size > 1 {
                    tracing::warn!(
                        "{}: refused to remove canon '{}' of a {}-symbol bundle",
                        self.name, symbol, size
                    );
                    return Err(Error::Constraint {
                        store: self.name.to_string(),
                        message: format!(
                            "'{}' is the canon of a bundle with {} symbols; set another canon first",
                            symbol, size
                        ),
                    });
                }
            }
            self.backend.execute(&self.sql.delete_symbol, &[symbol])?;
            tracing::debug!("{}: removed '{}'", self.name, symbol);
            Ok(())
        })
        .map_err(self.storage_error("remove_symbol"))
    }

    /// Remove each symbol in order, stopping at the first failure
    pub fn remove_symbols<I, S>(&self, symbols: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for (index, symbol) in symbols.into_iter().enumerate() {
            let symbol = symbol.as_ref();
            self.remove_symbol(symbol).map_err(|e| Error::Batch {
                index,
                item: symbol.to_string(),
                source: Box::new(e),
            })?;
        }
        Ok(())
    }

    /// Remove `symbol`'s whole bundle, canon included. Returns the number of rows removed.
    pub fn remove_bundle(&self, symbol: &str) -> Result<usize> {
        let canon = self
            .lookup_canon(symbol)
            .map_err(self.storage_error("remove_bundle"))?;
        let Some(canon) = canon else {
            return Ok(0);
        };
        let removed = self
            .backend
            .execute(&self.sql.delete_bundle, &[&canon])
            .map_err(self.storage_error("remove_bundle"))?;
        tracing::debug!("{}: removed bundle '{}' ({} symbols)", self.name, canon, removed);
        Ok(removed)
    }

    /// Make `symbol` the canon of its bundle.
    ///
    /// An absent symbol becomes a new singleton bundle. With `restrict`, a
    /// bundle that already has a different canon is left alone and the call
    /// fails with [`Error::Constraint`]. The old canon stays as a member.
    pub fn set_canon(&self, symbol: &str, restrict: bool) -> Result<()> {
        ensure_symbol(&self.name, symbol)?;
        self.atomically(|| {
            match self.lookup_canon(symbol)? {
                None => {
                    self.insert(symbol, symbol)?;
                    tracing::debug!("{}: new singleton bundle '{}'", self.name, symbol);
                }
                Some(canon) if canon == symbol => {}
                Some(canon) => {
                    if restrict
                        && self.backend.query_count(&self.sql.has_canon_row, &[&canon])? > 0
                    {
                        return Err(Error::Constraint {
                            store: self.name.to_string(),
                            message: format!(
                                "bundle of '{}' already has canon '{}'",
                                symbol, canon
                            ),
                        });
                    }
                    self.backend.execute(&self.sql.merge, &[symbol, &canon])?;
                    tracing::debug!("{}: canon of '{}' is now '{}'", self.name, canon, symbol);
                }
            }
            Ok(())
        })
        .map_err(self.storage_error("set_canon"))
    }

    // ========== Backup / Restore ==========

    /// Write `dump_tsv` to `path`. Returns the number of rows written.
    pub fn backup(&self, path: &Path) -> Result<usize> {
        let pairs = self.dump_pairs()?;
        let text = self.render_tsv(&pairs)?;
        std::fs::write(path, text).map_err(|e| Error::Storage {
            store: self.name.to_string(),
            operation: "backup",
            message: format!("{}: {}", path.display(), e),
        })?;
        tracing::info!("Backed up store '{}' to {} ({} rows)", self.name, path.display(), pairs.len());
        Ok(pairs.len())
    }

    /// Replace the store's contents with the `(canon, symbol)` rows in `path`.
    ///
    /// Rows are written verbatim, all or nothing.
    pub fn restore(&self, path: &Path) -> Result<usize> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::Storage {
            store: self.name.to_string(),
            operation: "restore",
            message: format!("{}: {}", path.display(), e),
        })?;
        let pairs: Vec<Pair> = tsv::parse(&text)
            .into_iter()
            .map(|record| Pair::new(record.first, record.second))
            .collect();
        self.restore_pairs(&pairs)?;
        tracing::info!("Restored store '{}' from {} ({} rows)", self.name, path.display(), pairs.len());
        Ok(pairs.len())
    }

    /// Replace the store's contents with `pairs`, bypassing the bundle rules.
    ///
    /// Every field must pass the same checks as a written symbol; nothing is
    /// touched otherwise.
    pub fn restore_pairs(&self, pairs: &[Pair]) -> Result<()> {
        for (index, pair) in pairs.iter().enumerate() {
            ensure_symbol(&self.name, &pair.canon)
                .and_then(|_| ensure_symbol(&self.name, &pair.symbol))
                .map_err(|e| Error::Batch {
                    index,
                    item: pair.to_string(),
                    source: Box::new(e),
                })?;
        }
        self.atomically(|| {
            self.backend.execute(&self.sql.delete_all, &[])?;
            for pair in pairs {
                self.insert(&pair.canon, &pair.symbol)?;
            }
            Ok(())
        })
        .map_err(self.storage_error("restore"))
    }

    // ========== Internals ==========

    fn lookup_canon(&self, symbol: &str) -> Result<Option<String>> {
        self.backend.query_optional(&self.sql.select_canon, &[symbol])
    }

    fn insert(&self, canon: &str, symbol: &str) -> Result<()> {
        self.backend.execute(&self.sql.insert_pair, &[canon, symbol])?;
        Ok(())
    }

    fn render_tsv(&self, pairs: &[Pair]) -> Result<String> {
        tsv::render(pairs).map_err(|pair| Error::Constraint {
            store: self.name.to_string(),
            message: format!(
                "row ({:?}, {:?}) cannot be written as TSV",
                pair.canon, pair.symbol
            ),
        })
    }

    /// Run `f` inside a write transaction, rolling back on any error
    fn atomically<T>(&self, f: impl FnOnce() -> Result<T>) -> Result<T> {
        self.backend.begin()?;
        let result = f().and_then(|value| self.backend.commit().map(|_| value));
        if result.is_err() {
            if let Err(e) = self.backend.rollback() {
                tracing::debug!("{}: rollback after failure also failed: {}", self.name, e);
            }
        }
        result
    }

    /// Rewrap raw engine errors with the store name and operation
    fn storage_error(&self, operation: &'static str) -> impl Fn(Error) -> Error + '_ {
        move |e| match e {
            Error::Sqlite(_) | Error::Io(_) => Error::Storage {
                store: self.name.to_string(),
                operation,
                message: e.to_string(),
            },
            other => other,
        }
    }
}
