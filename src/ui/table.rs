use tabled::{settings::Style, Table, Tabled};
use crate::query::analysis::Frequency;

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Tabled)]
struct FrequencyRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Count")]
    count: usize,
}

#[derive(Default)]
pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_row(&mut self, label: &str, value: impl ToString) -> &mut Self {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
        self
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

/// Render the first `limit` entries of a frequency table
pub fn frequency_table(frequencies: &[Frequency], limit: usize) -> String {
    if frequencies.is_empty() {
        return String::new();
    }
    let rows = frequencies.iter().take(limit).map(|f| FrequencyRow {
        name: f.name.clone(),
        count: f.count,
    });
    Table::new(rows).with(Style::rounded()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_builder_renders_nothing() {
        assert_eq!(TableBuilder::new().build(), "");
        assert_eq!(frequency_table(&[], 10), "");
    }

    #[test]
    fn test_rows_are_rendered() {
        let mut builder = TableBuilder::new();
        builder.add_row("Symbols", 5).add_row("Bundles", 3);
        let table = builder.build();
        assert!(table.contains("Symbols"));
        assert!(table.contains('5'));
    }

    #[test]
    fn test_frequency_table_respects_limit() {
        let freqs = vec![
            Frequency { name: "dbpedia.org".into(), count: 2 },
            Frequency { name: "wikidata.org".into(), count: 1 },
        ];
        let table = frequency_table(&freqs, 1);
        assert!(table.contains("dbpedia.org"));
        assert!(!table.contains("wikidata.org"));
    }
}
