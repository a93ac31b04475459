use anyhow::{Context, Result};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::dedup::builder::{DuplicateSet, DuplicateSetBuilder};
use crate::dedup::bucket::BucketStore;
use crate::dedup::config::DedupConfig;
use crate::dedup::constants::*;
use crate::dedup::matcher::RecordMatcher;
use crate::dedup::partitioner::BucketPartitioner;
use crate::dedup::record::{RecordSink, RecordSource};
use crate::dedup::scanner;
use crate::dedup::DedupStats;
use crate::utils::get_process_memory_usage;

/// Drives the whole run: partition pass, parallel bucket scan, duplicate
/// set merge, and the second matching pass.
pub struct DedupProcessor {
    config: DedupConfig,
    stats: DedupStats,
    start_time: Instant,
}

impl DedupProcessor {
    pub fn new(config: DedupConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config,
            stats: DedupStats::default(),
            start_time: Instant::now(),
        })
    }

    pub async fn process<S, K>(&mut self, source: &mut S, sink: &mut K) -> Result<DedupStats>
    where
        S: RecordSource,
        K: RecordSink,
    {
        self.start_time = Instant::now();
        self.stats = DedupStats::default();
        self.prepare_work_directory()?;

        if self.config.verbose {
            println!("🚀 Starting duplicate coordinate search");
            println!("🗃️ Buckets: {} under {}",
                self.config.bucket_count, self.config.work_directory.display());
            println!("🔧 Scan workers: {}", self.config.worker_threads);
        }

        // Phase 1: route every coordinate to its bucket file.
        let partition_start = Instant::now();
        let store = BucketStore::create(
            &self.config.work_directory,
            self.config.bucket_count,
            self.config.flush_threshold,
        )?;
        let mut partitioner = BucketPartitioner::new(store, self.config.verbose);
        let routed = partitioner.partition(source.coordinates()?)?;
        let bucket_paths = partitioner.into_bucket_paths();
        self.stats.total_records = routed;
        self.stats.partition_time_ms = partition_start.elapsed().as_millis() as u64;

        if self.config.verbose {
            println!("📦 Routed {} coordinates into {} buckets", routed, bucket_paths.len());
        }

        // Scan every bucket, workers bounded by the configured pool size.
        let scan_start = Instant::now();
        let duplicates = self.scan_buckets(bucket_paths).await?;
        self.stats.scan_time_ms = scan_start.elapsed().as_millis() as u64;
        self.stats.duplicate_coordinates = duplicates.len() as u64;
        self.sample_peak_memory();

        if duplicates.is_empty() {
            if self.config.verbose {
                println!("✅ No duplicates found. Done.");
            }
            self.stats.phase2_skipped = true;
            sink.close()?;
            self.cleanup()?;
            self.stats.processing_time_ms = self.start_time.elapsed().as_millis() as u64;
            return Ok(self.stats.clone());
        }

        if self.config.verbose {
            println!("🔗 Found {} duplicate coordinate(s)", duplicates.len());
        }

        // Phase 2: pull the full records sitting at the hot coordinates.
        let match_start = Instant::now();
        let matcher = RecordMatcher::new(&duplicates, self.config.verbose);
        let matched = matcher.run(source, sink)?;
        sink.close()?;
        self.stats.matched_records = matched;
        self.stats.match_time_ms = match_start.elapsed().as_millis() as u64;
        self.sample_peak_memory();

        if self.config.verbose {
            println!("✅ Matched {} record(s) at those {} location(s)",
                matched, duplicates.len());
        }

        self.cleanup()?;
        self.stats.processing_time_ms = self.start_time.elapsed().as_millis() as u64;
        Ok(self.stats.clone())
    }

    /// Scans all buckets concurrently and merges their duplicate lists as
    /// the scans complete. The first failed bucket aborts the run.
    async fn scan_buckets(&mut self, bucket_paths: Vec<std::path::PathBuf>) -> Result<DuplicateSet> {
        let semaphore = Arc::new(Semaphore::new(self.config.worker_threads));
        let builder = Arc::new(Mutex::new(DuplicateSetBuilder::new()));
        let mut tasks = JoinSet::new();

        self.stats.buckets_scanned = bucket_paths.len() as u64;

        for path in bucket_paths {
            let permit = semaphore.clone().acquire_owned().await?;
            let builder = builder.clone();

            tasks.spawn_blocking(move || {
                let _permit = permit;
                let duplicates = scanner::scan_bucket(&path)?;
                if !duplicates.is_empty() {
                    builder.lock().add_bucket(duplicates);
                }
                Ok::<(), anyhow::Error>(())
            });
        }

        while let Some(joined) = tasks.join_next().await {
            let scan_result = joined.context("Bucket scan task failed")?;
            if let Err(e) = scan_result {
                tasks.abort_all();
                return Err(e);
            }
        }

        let builder = Arc::into_inner(builder)
            .context("Bucket scan accumulator still held after all tasks joined")?
            .into_inner();
        Ok(builder.build())
    }

    /// An aborted run must not leave bucket files behind for the next one,
    /// so anything matching the bucket naming scheme is deleted up front.
    fn prepare_work_directory(&self) -> Result<()> {
        let dir = &self.config.work_directory;
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Can't create working directory '{}'", dir.display()))?;

        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if name.starts_with(BUCKET_FILE_PREFIX) && name.ends_with(BUCKET_FILE_EXTENSION) {
                std::fs::remove_file(&path)
                    .with_context(|| format!("Can't remove stale bucket file '{}'", path.display()))?;
            }
        }

        Ok(())
    }

    /// Best-effort teardown; failures here are reported but never mask the
    /// run's result.
    fn cleanup(&self) -> Result<()> {
        if self.config.keep_bucket_files {
            return Ok(());
        }

        for index in 0..self.config.bucket_count {
            let path = self.config.work_directory
                .join(crate::dedup::bucket::bucket_file_name(index));
            if path.exists() {
                if let Err(e) = std::fs::remove_file(&path) {
                    eprintln!("Warning: Failed to remove bucket file '{}': {}", path.display(), e);
                }
            }
        }

        if let Err(_) = std::fs::remove_dir(&self.config.work_directory) {
        }

        Ok(())
    }

    fn sample_peak_memory(&mut self) {
        let usage_mb = get_process_memory_usage() as f64 / BYTES_PER_MB as f64;
        if usage_mb > self.stats.peak_memory_mb {
            self.stats.peak_memory_mb = usage_mb;
        }
    }
}
