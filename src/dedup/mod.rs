pub mod builder;
pub mod bucket;
pub mod config;
pub mod constants;
pub mod coordinate;
pub mod matcher;
pub mod partitioner;
pub mod processor;
pub mod record;
pub mod scanner;


pub use builder::{DuplicateSet, DuplicateSetBuilder};
pub use config::DedupConfig;
pub use coordinate::Coordinate;
pub use processor::DedupProcessor;
pub use record::{PointRecord, RecordSink, RecordSource};

use anyhow::Result;

#[derive(Debug, Clone)]
pub struct DedupStats {
    pub total_records: u64,
    pub duplicate_coordinates: u64,
    pub matched_records: u64,
    pub buckets_scanned: u64,
    pub phase2_skipped: bool,
    pub partition_time_ms: u64,
    pub scan_time_ms: u64,
    pub match_time_ms: u64,
    pub processing_time_ms: u64,
    pub peak_memory_mb: f64,
}

impl Default for DedupStats {
    fn default() -> Self {
        Self {
            total_records: 0,
            duplicate_coordinates: 0,
            matched_records: 0,
            buckets_scanned: 0,
            phase2_skipped: false,
            partition_time_ms: 0,
            scan_time_ms: 0,
            match_time_ms: 0,
            processing_time_ms: 0,
            peak_memory_mb: 0.0,
        }
    }
}

/// One-call entry point: find every coordinate occurring more than once in
/// `source` and forward the full records at those coordinates to `sink`.
pub async fn find_duplicate_records<S, K>(
    source: &mut S,
    sink: &mut K,
    config: DedupConfig,
) -> Result<DedupStats>
where
    S: RecordSource,
    K: RecordSink,
{
    let mut processor = DedupProcessor::new(config)?;
    processor.process(source, sink).await
}
