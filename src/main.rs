//! sameas CLI - Command-line front end for equivalence stores

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use sameas::config::{self, SameasConfig};
use sameas::storage::SqliteBackend;
use sameas::ui::{self, Icons, Spinner, TableBuilder};
use sameas::{Backend, Store, StoreConfig};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "sameas")]
#[command(version)]
#[command(about = "Equivalence store - bundles of interchangeable symbols with a canon")]
#[command(long_about = r#"
sameas keeps symbols in bundles of equivalents, each with one canon:
  • Assert that two symbols are the same
  • Look up a symbol's canon or its whole bundle
  • Bulk import/export as TSV, backup and restore
  • Statistics and domain/integrity analysis

Example usage:
  sameas assert http://dbpedia.org/resource/Paris http://www.wikidata.org/entity/Q90
  sameas query http://www.wikidata.org/entity/Q90
  sameas import --file pairs.tsv
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the database file
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Store name (table name, [A-Za-z0-9_]+)
    #[arg(short, long, global = true)]
    store: Option<String>,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Emit JSON instead of human-readable output
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the store's relation (and optionally a config file)
    Init {
        /// Write the effective settings to the config file
        #[arg(long)]
        write_config: bool,

        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Assert that two symbols are equivalent (the first one's canon wins a merge)
    Assert { a: String, b: String },

    /// Assert every pair of a TSV file (first two fields per line)
    Import {
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Print every (canon, symbol) pair as TSV
    Export,

    /// Print the canon of a symbol
    Canon { symbol: String },

    /// Print the bundle of a symbol, canon first
    Query { symbol: String },

    /// Find symbols containing a substring (case-sensitive)
    Search { pattern: String },

    /// Remove symbols (a canon can only go once it is alone)
    Remove {
        #[arg(required = true)]
        symbols: Vec<String>,
    },

    /// Remove the whole bundle of a symbol
    RemoveBundle { symbol: String },

    /// Make a symbol the canon of its bundle
    SetCanon {
        symbol: String,

        /// Refuse if the bundle already has a canon
        #[arg(long)]
        restrict: bool,
    },

    /// List all canons
    Canons,

    /// Show symbol and bundle counts
    Stats,

    /// Analyse bundle sizes, URL domains and integrity
    Analyse {
        /// Rows to show per frequency table
        #[arg(long, default_value = "10")]
        top: usize,
    },

    /// Delete every pair, keeping the store
    Empty,

    /// Drop the store entirely
    Drop,

    /// Write the store to a TSV backup file
    Backup {
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Replace the store's contents with a TSV backup file
    Restore {
        #[arg(short, long)]
        file: PathBuf,
    },

    /// List the stores in the database
    List,
}

/// What a command needs from the store's relation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    /// Create the relation if missing
    Create,
    /// The relation must already exist
    Existing,
    /// Only the database connection
    Database,
}

impl Commands {
    fn access(&self) -> Access {
        match self {
            Commands::Init { .. }
            | Commands::Assert { .. }
            | Commands::Import { .. }
            | Commands::SetCanon { .. }
            | Commands::Restore { .. } => Access::Create,
            Commands::Drop | Commands::List => Access::Database,
            _ => Access::Existing,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let file_config = config::load_config(cli.config.as_deref())?.unwrap_or_default();
    let store_config = file_config.store_config(cli.store.as_deref());
    let backend = SqliteBackend::new(file_config.sqlite_config(cli.database.as_deref()));

    if let Commands::Init { write_config, force } = &cli.command {
        if *write_config {
            let path = cli.config.clone().unwrap_or_else(config::default_config_path);
            let effective = SameasConfig {
                database: backend.config().path.as_ref().map(|p| p.display().to_string()),
                store: Some(store_config.name.clone()),
                ..file_config.clone()
            };
            config::write_config(&path, &effective, *force)?;
            ui::info("Config", &path.display().to_string());
        }
    }

    let access = cli.command.access();
    let result = open_store(store_config, backend, access)
        .and_then(|store| run(cli.command, &store, cli.json));
    if let Err(e) = result {
        ui::error(&format!("{:#}", e));
        std::process::exit(1);
    }
    Ok(())
}

/// Connect, creating the relation only for commands that write
fn open_store(config: StoreConfig, backend: SqliteBackend, access: Access) -> anyhow::Result<Store> {
    let mut store = Store::new(config, backend)?;
    store.connect()?;
    match access {
        Access::Create => store.init()?,
        Access::Existing => {
            if !store.is_init()? {
                anyhow::bail!("store '{}' does not exist (run `sameas init`)", store.name());
            }
        }
        Access::Database => {}
    }
    Ok(store)
}

fn run(command: Commands, store: &Store, json: bool) -> anyhow::Result<()> {
    match command {
        Commands::Init { .. } => {
            ui::success(&format!("Store '{}' ready", store.name()));
        }

        Commands::Assert { a, b } => {
            store.assert_pair(&a, &b)?;
            if json {
                print_json(&serde_json::json!({ "canon": store.get_canon(&a)? }))?;
            } else {
                ui::success(&format!("{} {} {}", a, Icons::LINK, b));
            }
        }

        Commands::Import { file } => {
            let text = std::fs::read_to_string(&file)?;
            let spinner = Spinner::new(&format!("Importing {}", file.display()));
            let before = store.statistics()?;
            let result = store.assert_tsv(&text);
            spinner.finish_and_clear();
            result?;
            let after = store.statistics()?;
            ui::success(&format!(
                "Imported {} new symbols ({} total, {} bundles)",
                after.symbols.saturating_sub(before.symbols),
                after.symbols,
                after.bundles
            ));
        }

        Commands::Export => {
            let tsv = store.dump_tsv()?;
            if !tsv.is_empty() {
                println!("{}", tsv);
            }
        }

        Commands::Canon { symbol } => {
            println!("{}", store.get_canon(&symbol)?);
        }

        Commands::Query { symbol } => {
            let symbols = store.query_symbol(&symbol)?;
            if json {
                print_json(&symbols)?;
            } else {
                let canon = store.get_canon(&symbol)?;
                ui::bundle(&symbols, &canon);
            }
        }

        Commands::Search { pattern } => {
            let found = store.search(&pattern)?;
            if json {
                print_json(&found)?;
            } else if found.is_empty() {
                ui::empty("No symbols found.");
            } else {
                ui::header(Icons::SEARCH, &format!("{} matches for '{}'", found.len(), pattern));
                for symbol in found {
                    println!("- {}", symbol);
                }
            }
        }

        Commands::Remove { symbols } => {
            store.remove_symbols(&symbols)?;
            ui::success(&format!("Removed {} symbols", symbols.len()));
        }

        Commands::RemoveBundle { symbol } => {
            let removed = store.remove_bundle(&symbol)?;
            ui::success(&format!("Removed {} symbols", removed));
        }

        Commands::SetCanon { symbol, restrict } => {
            store.set_canon(&symbol, restrict)?;
            ui::success(&format!("{} {} is canon", Icons::CROWN, symbol));
        }

        Commands::Canons => {
            let canons = store.all_canons()?;
            if json {
                print_json(&canons)?;
            } else {
                for canon in canons {
                    println!("{}", canon);
                }
            }
        }

        Commands::Stats => {
            let stats = store.statistics()?;
            if json {
                print_json(&stats)?;
            } else {
                ui::header(Icons::STATS, &format!("Statistics for '{}'", store.full_name()));
                let mut table = TableBuilder::new();
                table
                    .add_row("Symbols", stats.symbols)
                    .add_row("Bundles", stats.bundles);
                println!("{}", table.build());
            }
        }

        Commands::Analyse { top } => {
            let spinner = Spinner::new("Analysing store");
            let report = store.analyse();
            spinner.finish_and_clear();
            let report = report?;
            if json {
                print_json(&report)?;
                return Ok(());
            }

            ui::header(Icons::STATS, &format!("Analysis of '{}'", store.full_name()));
            let mut table = TableBuilder::new();
            table.add_row("Rows", report.rows).add_row("Bundles", report.bundles);
            if let Some(sizes) = &report.sizes {
                table
                    .add_row("Average bundle size", format!("{:.2}", sizes.average))
                    .add_row("Median bundle size", sizes.median)
                    .add_row("Mode bundle size", sizes.mode)
                    .add_row("Largest bundle", sizes.largest);
            }
            table
                .add_row("http symbols", report.schemes.http)
                .add_row("https symbols", report.schemes.https)
                .add_row("Other symbols", report.schemes.other)
                .add_row("Singletons", report.singletons.len());
            println!("{}", table.build());

            if let Some(sizes) = &report.sizes {
                ui::section("Bundle sizes");
                for (size, count) in &sizes.histogram {
                    ui::summary_row(&format!("{:>6}", size), &count.to_string());
                }
            }
            if !report.domains.is_empty() {
                ui::section("Domains");
                println!("{}", ui::frequency_table(&report.domains, top));
                ui::section("TLDs");
                println!("{}", ui::frequency_table(&report.tlds, top));
            }
            for canon in &report.missing_canons {
                ui::warn(&format!("Bundle '{}' has no canon row", canon));
            }
        }

        Commands::Empty => {
            store.empty_store()?;
            ui::success(&format!("{} Emptied '{}'", Icons::DEL, store.name()));
        }

        Commands::Drop => {
            store.delete_store()?;
            ui::success(&format!("{} Dropped '{}'", Icons::DEL, store.name()));
        }

        Commands::Backup { file } => {
            let rows = store.backup(&file)?;
            ui::success(&format!("{} Wrote {} pairs to {}", Icons::PACKAGE, rows, file.display()));
        }

        Commands::Restore { file } => {
            let spinner = Spinner::new(&format!("Restoring from {}", file.display()));
            let result = store.restore(&file);
            spinner.finish_and_clear();
            let rows = result?;
            ui::success(&format!("{} Restored {} pairs", Icons::PACKAGE, rows));
            let report = store.analyse()?;
            if !report.is_consistent() {
                ui::warn(&format!(
                    "{} bundles have no canon row (run `sameas analyse`)",
                    report.missing_canons.len()
                ));
            }
        }

        Commands::List => {
            let tables = store.backend().tables()?;
            if json {
                print_json(&tables)?;
            } else {
                ui::header(Icons::DATABASE, "Stores");
                for table in tables {
                    println!("- {}", table);
                }
            }
        }
    }

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sameas::SqliteConfig;

    fn access(args: &[&str]) -> Access {
        let mut argv = vec!["sameas"];
        argv.extend_from_slice(args);
        Cli::parse_from(argv).command.access()
    }

    #[test]
    fn test_only_writes_create_the_relation() {
        assert_eq!(access(&["init"]), Access::Create);
        assert_eq!(access(&["assert", "a", "b"]), Access::Create);
        assert_eq!(access(&["restore", "--file", "x.tsv"]), Access::Create);
        assert_eq!(access(&["canon", "x"]), Access::Existing);
        assert_eq!(access(&["search", "x"]), Access::Existing);
        assert_eq!(access(&["stats"]), Access::Existing);
        assert_eq!(access(&["list", "--store", "foo"]), Access::Database);
        assert_eq!(access(&["drop"]), Access::Database);
    }

    #[test]
    fn test_reads_leave_the_database_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sameas.db");
        let backend = || SqliteBackend::new(SqliteConfig::file(&path));

        assert!(open_store(StoreConfig::new("foo"), backend(), Access::Existing).is_err());
        let store = open_store(StoreConfig::new("foo"), backend(), Access::Database).unwrap();
        assert!(store.backend().tables().unwrap().is_empty());

        let store = open_store(StoreConfig::new("foo"), backend(), Access::Create).unwrap();
        assert_eq!(store.backend().tables().unwrap(), vec!["foo"]);
        assert!(open_store(StoreConfig::new("foo"), backend(), Access::Existing).is_ok());
    }
}
