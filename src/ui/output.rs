use crate::ui::{theme, Icons};
use owo_colors::OwoColorize;

pub fn header(icon: &str, text: &str) {
    println!("{} {}", icon, text.style(theme().heading));
}

pub fn success(label: &str) {
    println!("{} {}", Icons::CHECK, label.style(theme().ok));
}

pub fn error(label: &str) {
    eprintln!("{} {}", Icons::CROSS, label.style(theme().failure));
}

pub fn warn(label: &str) {
    eprintln!("{} {}", Icons::WARN, label.style(theme().caution));
}

pub fn info(label: &str, value: &str) {
    println!(
        "{} {}: {}",
        Icons::INFO.style(theme().marker),
        label.style(theme().label),
        value
    );
}

pub fn section(title: &str) {
    println!();
    println!("━{}━", title.style(theme().heading));
}

pub fn empty(label: &str) {
    println!("{} {}", Icons::EMPTY, label.style(theme().label));
}

/// Print a bundle as returned by `query_symbol`: canon first, then members
pub fn bundle(symbols: &[String], canon: &str) {
    for symbol in symbols {
        if symbol == canon {
            println!("{} {}", Icons::CROWN, symbol.style(theme().canon));
        } else {
            println!("   {}", symbol);
        }
    }
}

pub fn summary_row(label: &str, value: &str) {
    println!("  {} {}", label.style(theme().label), value);
}
