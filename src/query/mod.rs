//! Query/analysis helpers built on full scans of a store

pub mod analysis;
pub mod stats;

pub use analysis::{Analysis, BundleSizes, Frequency, SchemeCounts};
pub use stats::Statistics;
