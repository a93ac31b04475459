use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use crate::dedup::constants::*;
use crate::dedup::coordinate::{Coordinate, ENCODED_LEN};

/// Selects the bucket a coordinate belongs to. Pure function of the
/// coordinate, so two records at the same location always land in the same
/// bucket and buckets can be deduplicated independently.
///
/// Mixes both axes before masking; hashing only the low bits of x would
/// skew bucket sizes for inputs clustered in longitude.
pub fn bucket_index(coordinate: Coordinate, bucket_count: usize) -> usize {
    let mixed = (coordinate.x as u32)
        .wrapping_mul(0x9e37_79b9)
        ^ (coordinate.y as u32).wrapping_mul(0x85eb_ca6b);
    (mixed & (bucket_count as u32 - 1)) as usize
}

pub fn bucket_file_name(index: usize) -> String {
    format!("{}{:02x}{}", BUCKET_FILE_PREFIX, index, BUCKET_FILE_EXTENSION)
}

/// One append-only bucket file plus its in-memory write buffer.
pub struct Bucket {
    path: PathBuf,
    file: File,
    pending: Vec<Coordinate>,
    flush_threshold: usize,
    written: u64,
}

impl Bucket {
    /// Creates the bucket file, truncating anything a previous run left
    /// behind.
    pub fn create(directory: &Path, index: usize, flush_threshold: usize) -> Result<Self> {
        let path = directory.join(bucket_file_name(index));
        let file = File::create(&path)
            .with_context(|| format!("Can't create bucket file '{}'", path.display()))?;

        Ok(Self {
            path,
            file,
            pending: Vec::with_capacity(flush_threshold.min(DEFAULT_FLUSH_THRESHOLD)),
            flush_threshold,
            written: 0,
        })
    }

    pub fn push(&mut self, coordinate: Coordinate) -> Result<()> {
        self.pending.push(coordinate);
        if self.pending.len() >= self.flush_threshold {
            self.flush()?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let mut encoded = Vec::with_capacity(self.pending.len() * ENCODED_LEN);
        for coordinate in &self.pending {
            encoded.extend_from_slice(&coordinate.to_le_bytes());
        }

        self.file
            .write_all(&encoded)
            .with_context(|| format!("Can't write to bucket file '{}'", self.path.display()))?;

        self.written += self.pending.len() as u64;
        self.pending.clear();
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Coordinates flushed to disk so far.
    pub fn written(&self) -> u64 {
        self.written
    }
}

/// The fixed set of bucket files for one run.
pub struct BucketStore {
    buckets: Vec<Bucket>,
}

impl BucketStore {
    pub fn create(directory: &Path, bucket_count: usize, flush_threshold: usize) -> Result<Self> {
        let mut buckets = Vec::with_capacity(bucket_count);
        for index in 0..bucket_count {
            buckets.push(Bucket::create(directory, index, flush_threshold)?);
        }
        Ok(Self { buckets })
    }

    pub fn route(&mut self, coordinate: Coordinate) -> Result<()> {
        let index = bucket_index(coordinate, self.buckets.len());
        self.buckets[index].push(coordinate)
    }

    pub fn flush_all(&mut self) -> Result<()> {
        for bucket in &mut self.buckets {
            bucket.flush()?;
        }
        Ok(())
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.buckets.iter().map(|b| b.path().to_path_buf()).collect()
    }

    pub fn total_written(&self) -> u64 {
        self.buckets.iter().map(|b| b.written()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_bucket_index_is_deterministic() {
        let coord = Coordinate::from_degrees(13.4, 52.5);
        let first = bucket_index(coord, 256);
        for _ in 0..10 {
            assert_eq!(bucket_index(coord, 256), first);
        }
        assert!(first < 256);
    }

    #[test]
    fn test_bucket_index_stays_in_range() {
        for x in -1000..1000 {
            let coord = Coordinate::new(x * 7919, x);
            assert!(bucket_index(coord, 16) < 16);
        }
    }

    #[test]
    fn test_bucket_file_name() {
        assert_eq!(bucket_file_name(0), "locations_00.dat");
        assert_eq!(bucket_file_name(171), "locations_ab.dat");
        assert_eq!(bucket_file_name(255), "locations_ff.dat");
    }

    #[test]
    fn test_flush_threshold_loses_nothing() {
        let dir = tempdir().unwrap();
        let mut bucket = Bucket::create(dir.path(), 0, 16).unwrap();

        // 40 entries with a threshold of 16: two automatic flushes plus a
        // final partial one.
        for i in 0..40 {
            bucket.push(Coordinate::new(i, -i)).unwrap();
        }
        assert_eq!(bucket.written(), 32);

        bucket.flush().unwrap();
        assert_eq!(bucket.written(), 40);

        let size = std::fs::metadata(bucket.path()).unwrap().len();
        assert_eq!(size, 40 * ENCODED_LEN as u64);
    }

    #[test]
    fn test_create_truncates_previous_contents() {
        let dir = tempdir().unwrap();
        {
            let mut bucket = Bucket::create(dir.path(), 3, 16).unwrap();
            bucket.push(Coordinate::new(1, 2)).unwrap();
            bucket.flush().unwrap();
        }

        let bucket = Bucket::create(dir.path(), 3, 16).unwrap();
        let size = std::fs::metadata(bucket.path()).unwrap().len();
        assert_eq!(size, 0);
    }

    #[test]
    fn test_store_routes_same_coordinate_to_same_file() {
        let dir = tempdir().unwrap();
        let mut store = BucketStore::create(dir.path(), 8, 1024).unwrap();

        let coord = Coordinate::new(42, 7);
        store.route(coord).unwrap();
        store.route(coord).unwrap();
        store.flush_all().unwrap();

        let expected = dir.path().join(bucket_file_name(bucket_index(coord, 8)));
        let size = std::fs::metadata(expected).unwrap().len();
        assert_eq!(size, 2 * ENCODED_LEN as u64);
        assert_eq!(store.total_written(), 2);
    }
}
