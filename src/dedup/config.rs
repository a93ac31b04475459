use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use anyhow::Result;
use crate::dedup::constants::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupConfig {
    pub bucket_count: usize,
    pub flush_threshold: usize,
    pub worker_threads: usize,
    pub io_buffer_size_kb: usize,
    pub work_directory: PathBuf,
    pub keep_bucket_files: bool,
    pub verbose: bool,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            bucket_count: DEFAULT_BUCKET_COUNT,
            flush_threshold: DEFAULT_FLUSH_THRESHOLD,
            worker_threads: DEFAULT_WORKER_THREADS,
            io_buffer_size_kb: DEFAULT_IO_BUFFER_SIZE_KB,
            work_directory: std::env::temp_dir().join(WORK_DIR_NAME),
            keep_bucket_files: false,
            verbose: false,
        }
    }
}

impl DedupConfig {
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_file(&self, path: &std::path::Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !self.bucket_count.is_power_of_two() {
            return Err(anyhow::anyhow!(
                "Bucket count must be a power of two, got {}",
                self.bucket_count
            ));
        }

        if self.bucket_count < MIN_BUCKET_COUNT || self.bucket_count > MAX_BUCKET_COUNT {
            return Err(anyhow::anyhow!(
                "Bucket count must be between {} and {}",
                MIN_BUCKET_COUNT, MAX_BUCKET_COUNT
            ));
        }

        if self.flush_threshold < MIN_FLUSH_THRESHOLD
            || self.flush_threshold > MAX_FLUSH_THRESHOLD {
            return Err(anyhow::anyhow!(
                "Flush threshold must be between {} and {} coordinates",
                MIN_FLUSH_THRESHOLD, MAX_FLUSH_THRESHOLD
            ));
        }

        if self.worker_threads < MIN_WORKER_THREADS
            || self.worker_threads > MAX_WORKER_THREADS {
            return Err(anyhow::anyhow!(
                "Worker threads must be between {} and {}",
                MIN_WORKER_THREADS, MAX_WORKER_THREADS
            ));
        }

        if self.io_buffer_size_kb < MIN_IO_BUFFER_SIZE_KB
            || self.io_buffer_size_kb > MAX_IO_BUFFER_SIZE_KB {
            return Err(anyhow::anyhow!(
                "IO buffer size must be between {} and {} KB",
                MIN_IO_BUFFER_SIZE_KB, MAX_IO_BUFFER_SIZE_KB
            ));
        }

        Ok(())
    }

    pub fn io_buffer_size_bytes(&self) -> usize {
        self.io_buffer_size_kb * BYTES_PER_KB
    }
}
