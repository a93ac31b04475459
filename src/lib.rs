// Duplicate coordinate detection - the main implementation
pub mod dedup;

// CSV record source and sink
pub mod csv;

// Logging and system helpers
pub mod utils;

// Re-export main types for convenience
pub use dedup::{Coordinate, DedupConfig, DedupProcessor, DedupStats, DuplicateSet};
pub use dedup::{PointRecord, RecordSink, RecordSource};
