//! Database schema definitions
//!
//! Every store owns one relation named after the store:
//! `<name>(canon TEXT NOT NULL, symbol TEXT PRIMARY KEY)` plus an index on `canon`.
//!
//! Table names cannot be bound as parameters, so statements are rendered from
//! a validated [`StoreName`] and quoted. Symbol values are always bound.

use crate::symbol::StoreName;

/// Quote a validated store name for use as an identifier
pub fn quote(table: &StoreName) -> String {
    format!("\"{}\"", table.as_str())
}

/// SQL to create the pairs table
pub fn create_table(table: &StoreName) -> String {
    format!(
        r#"
CREATE TABLE IF NOT EXISTS {} (
    canon TEXT NOT NULL,
    symbol TEXT PRIMARY KEY NOT NULL
)
"#,
        quote(table)
    )
}

/// SQL to create the canon index
pub fn create_canon_index(table: &StoreName) -> String {
    format!(
        "CREATE INDEX IF NOT EXISTS \"idx_{}_canon\" ON {}(canon)",
        table.as_str(),
        quote(table)
    )
}

/// All schema creation statements
pub fn all_schema_statements(table: &StoreName) -> Vec<String> {
    vec![create_table(table), create_canon_index(table)]
}

pub fn drop_table(table: &StoreName) -> String {
    format!("DROP TABLE IF EXISTS {}", quote(table))
}

/// Row-level statements against one store's relation.
///
/// Rendered once per store so the hot paths only bind values.
#[derive(Debug, Clone)]
pub struct Statements {
    pub select_canon: String,
    pub select_bundle: String,
    pub search: String,
    pub insert_pair: String,
    pub merge: String,
    pub delete_symbol: String,
    pub delete_bundle: String,
    pub bundle_size: String,
    pub has_canon_row: String,
    pub all_canons: String,
    pub all_pairs: String,
    pub count_symbols: String,
    pub count_bundles: String,
    pub delete_all: String,
}

impl Statements {
    pub fn new(table: &StoreName) -> Self {
        let t = quote(table);
        Self {
            select_canon: format!("SELECT canon FROM {t} WHERE symbol = ?1"),
            select_bundle: format!(
                "SELECT symbol FROM {t} WHERE canon = ?1 ORDER BY (canon = symbol) DESC, symbol ASC"
            ),
            search: format!(
                "SELECT symbol FROM {t} WHERE instr(symbol, ?1) > 0 ORDER BY (canon = symbol) DESC, symbol ASC"
            ),
            insert_pair: format!("INSERT INTO {t} (canon, symbol) VALUES (?1, ?2)"),
            merge: format!("UPDATE {t} SET canon = ?1 WHERE canon = ?2"),
            delete_symbol: format!("DELETE FROM {t} WHERE symbol = ?1"),
            delete_bundle: format!("DELETE FROM {t} WHERE canon = ?1"),
            bundle_size: format!("SELECT COUNT(*) FROM {t} WHERE canon = ?1"),
            has_canon_row: format!("SELECT COUNT(*) FROM {t} WHERE canon = ?1 AND symbol = ?1"),
            all_canons: format!("SELECT DISTINCT canon FROM {t} ORDER BY canon ASC"),
            all_pairs: format!("SELECT canon, symbol FROM {t} ORDER BY canon ASC, symbol ASC"),
            count_symbols: format!("SELECT COUNT(*) FROM {t}"),
            count_bundles: format!("SELECT COUNT(DISTINCT canon) FROM {t}"),
            delete_all: format!("DELETE FROM {t}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statements_quote_table() {
        let name = StoreName::new("people").unwrap();
        let stmts = Statements::new(&name);
        assert_eq!(stmts.select_canon, "SELECT canon FROM \"people\" WHERE symbol = ?1");
        assert!(create_table(&name).contains("CREATE TABLE IF NOT EXISTS \"people\""));
        assert!(create_canon_index(&name).contains("\"idx_people_canon\""));
    }
}
