//! Symbol types - the persisted unit of an equivalence store
//!
//! Every symbol tracked by a store has exactly one row `(canon, symbol)`:
//! - `symbol` is the primary key of the backing relation
//! - `canon` names the representative of the symbol's bundle
//! - `canon == symbol` marks the bundle's canon row
//!
//! Store and slug names are validated here, before any connection is made.

use crate::tsv;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A `(canon, symbol)` row of the backing relation.
///
/// Two pairs share a bundle iff their canons are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Pair {
    /// Representative of the bundle this symbol belongs to
    pub canon: String,
    /// The symbol itself (unique across the store)
    pub symbol: String,
}

impl Pair {
    /// Create a new pair
    pub fn new(canon: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            canon: canon.into(),
            symbol: symbol.into(),
        }
    }

    /// Whether this row marks its bundle's canon
    pub fn is_canon(&self) -> bool {
        self.canon == self.symbol
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.canon, self.symbol)
    }
}

/// Validated store name, used verbatim as the backing table name.
///
/// Only `[A-Za-z0-9_]+` is accepted, which keeps the name safe to
/// embed in DDL where parameter binding is not available.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StoreName(String);

impl StoreName {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(Error::Configuration(format!(
                "Invalid store name '{}': only [A-Za-z0-9_] allowed",
                name
            )));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for StoreName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for StoreName {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::new(s)
    }
}

impl From<StoreName> for String {
    fn from(name: StoreName) -> Self {
        name.0
    }
}

impl fmt::Display for StoreName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// URL-safe dataset slug (`[A-Za-z0-9_-]+`) used by callers to address a store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slug(String);

impl Slug {
    pub fn new(slug: impl Into<String>) -> Result<Self> {
        let slug = slug.into();
        if slug.is_empty()
            || !slug
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(Error::Configuration(format!(
                "Invalid slug '{}': only [A-Za-z0-9_-] allowed",
                slug
            )));
        }
        Ok(Self(slug))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<StoreName> for Slug {
    fn from(name: StoreName) -> Self {
        // every store name is also a valid slug
        Self(name.0)
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Check that a symbol about to be written is non-empty and TSV-safe.
pub(crate) fn ensure_symbol(store: &StoreName, symbol: &str) -> Result<()> {
    let message = if symbol.is_empty() {
        "symbols must be non-empty".to_string()
    } else if !tsv::is_encodable(symbol) {
        format!("symbol {:?} contains a tab, line feed or carriage return", symbol)
    } else {
        return Ok(());
    };
    Err(Error::Constraint {
        store: store.to_string(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_name_validation() {
        assert!(StoreName::new("webdemo").is_ok());
        assert!(StoreName::new("Web_Demo_2").is_ok());

        for bad in ["", "web-demo", "web demo", "x;DROP TABLE y", "café"] {
            match StoreName::new(bad) {
                Err(Error::Configuration(_)) => {}
                other => panic!("expected configuration error for {:?}, got {:?}", bad, other),
            }
        }
    }

    #[test]
    fn test_slug_allows_dashes() {
        assert_eq!(Slug::new("web-demo").unwrap().as_str(), "web-demo");
        assert!(Slug::new("web/demo").is_err());
        assert!(Slug::new("").is_err());
    }

    #[test]
    fn test_store_name_serde() {
        let name: StoreName = serde_json::from_str("\"people\"").unwrap();
        assert_eq!(name.as_str(), "people");
        assert!(serde_json::from_str::<StoreName>("\"bad name\"").is_err());
    }

    #[test]
    fn test_ensure_symbol_rejects_empty_and_separators() {
        let store = StoreName::new("t").unwrap();
        assert!(ensure_symbol(&store, "http://example.org/a b").is_ok());
        for bad in ["", "x\ty", "a\nb", "v\r"] {
            match ensure_symbol(&store, bad) {
                Err(Error::Constraint { store, .. }) => assert_eq!(store, "t"),
                other => panic!("expected constraint error for {:?}, got {:?}", bad, other),
            }
        }
    }

    #[test]
    fn test_pair_canon_marker() {
        assert!(Pair::new("a", "a").is_canon());
        assert!(!Pair::new("a", "aa").is_canon());
        assert_eq!(Pair::new("a", "aa").to_string(), "a\taa");
    }
}
