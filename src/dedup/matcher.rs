use anyhow::Result;
use crate::dedup::builder::DuplicateSet;
use crate::dedup::constants::PROGRESS_REPORT_INTERVAL_RECORDS;
use crate::dedup::record::{RecordSink, RecordSource};

/// Pass 2: forwards every source record whose coordinate is in the
/// duplicate set to the sink, in source order.
pub struct RecordMatcher<'a> {
    duplicates: &'a DuplicateSet,
    verbose: bool,
}

impl<'a> RecordMatcher<'a> {
    pub fn new(duplicates: &'a DuplicateSet, verbose: bool) -> Self {
        Self {
            duplicates,
            verbose,
        }
    }

    /// Returns the number of records forwarded. Records are not deduplicated
    /// here: every record sitting at a hot coordinate goes through.
    pub fn run<S, K>(&self, source: &mut S, sink: &mut K) -> Result<u64>
    where
        S: RecordSource,
        K: RecordSink,
    {
        let mut matched = 0u64;
        let mut examined = 0u64;

        for record in source.records()? {
            let record = record?;
            examined += 1;

            if self.duplicates.contains(record.coordinate) {
                sink.write(&record)?;
                matched += 1;
            }

            if self.verbose && examined % PROGRESS_REPORT_INTERVAL_RECORDS == 0 {
                println!("🎯 Examined {} records, matched {} so far...", examined, matched);
            }
        }

        Ok(matched)
    }
}
