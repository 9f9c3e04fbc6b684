//! Store statistics

use serde::{Deserialize, Serialize};

/// Symbol and bundle counts for one store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    /// Distinct symbols (rows)
    pub symbols: u64,
    /// Distinct canons
    pub bundles: u64,
}

impl std::fmt::Display for Statistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Store Statistics:")?;
        writeln!(f, "  Symbols: {}", self.symbols)?;
        write!(f, "  Bundles: {}", self.bundles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let stats = Statistics { symbols: 5, bundles: 3 };
        assert_eq!(stats.to_string(), "Store Statistics:\n  Symbols: 5\n  Bundles: 3");
    }

    #[test]
    fn test_serializes_as_map() {
        let json = serde_json::to_value(Statistics { symbols: 5, bundles: 3 }).unwrap();
        assert_eq!(json, serde_json::json!({"symbols": 5, "bundles": 3}));
    }
}
