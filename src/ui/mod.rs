//! Terminal rendering for the command-line front end

pub mod icons;
pub mod output;
pub mod progress;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{bundle, empty, error, header, info, section, success, summary_row, warn};
pub use progress::Spinner;
pub use table::{frequency_table, TableBuilder};
pub use theme::{theme, Theme};
