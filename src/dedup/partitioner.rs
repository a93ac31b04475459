use anyhow::Result;
use std::path::PathBuf;
use crate::dedup::bucket::BucketStore;
use crate::dedup::constants::PROGRESS_REPORT_INTERVAL_RECORDS;
use crate::dedup::coordinate::Coordinate;

/// Pass 1: routes every source coordinate into its bucket file.
pub struct BucketPartitioner {
    store: BucketStore,
    routed: u64,
    verbose: bool,
}

impl BucketPartitioner {
    pub fn new(store: BucketStore, verbose: bool) -> Self {
        Self {
            store,
            routed: 0,
            verbose,
        }
    }

    /// Consumes the coordinate stream, writing each coordinate to exactly
    /// one bucket. Flushes every bucket before returning; the routed count
    /// equals the count sitting in the bucket files afterwards.
    pub fn partition<I>(&mut self, coordinates: I) -> Result<u64>
    where
        I: Iterator<Item = Result<Coordinate>>,
    {
        for coordinate in coordinates {
            self.store.route(coordinate?)?;
            self.routed += 1;

            if self.verbose && self.routed % PROGRESS_REPORT_INTERVAL_RECORDS == 0 {
                println!("📦 Routed {} coordinates into {} buckets...",
                    self.routed, self.store.bucket_count());
            }
        }

        self.store.flush_all()?;
        Ok(self.routed)
    }

    pub fn routed(&self) -> u64 {
        self.routed
    }

    /// Hands back the bucket file paths once partitioning is done.
    pub fn into_bucket_paths(self) -> Vec<PathBuf> {
        self.store.paths()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dedup::coordinate::ENCODED_LEN;
    use tempfile::tempdir;

    #[test]
    fn test_routed_count_matches_disk_contents() {
        let dir = tempdir().unwrap();
        // A threshold small enough that every bucket flushes mid-stream.
        let store = BucketStore::create(dir.path(), 4, 1024).unwrap();
        let mut partitioner = BucketPartitioner::new(store, false);

        let coordinates = (0..10_000).map(|i| Ok(Coordinate::new(i, i * 31)));
        let routed = partitioner.partition(coordinates).unwrap();
        assert_eq!(routed, 10_000);

        let on_disk: u64 = partitioner
            .into_bucket_paths()
            .iter()
            .map(|path| std::fs::metadata(path).unwrap().len())
            .sum();
        assert_eq!(on_disk, 10_000 * ENCODED_LEN as u64);
    }

    #[test]
    fn test_source_error_aborts_partitioning() {
        let dir = tempdir().unwrap();
        let store = BucketStore::create(dir.path(), 4, 1024).unwrap();
        let mut partitioner = BucketPartitioner::new(store, false);

        let coordinates = vec![
            Ok(Coordinate::new(1, 1)),
            Err(anyhow::anyhow!("decode failed")),
            Ok(Coordinate::new(2, 2)),
        ];
        assert!(partitioner.partition(coordinates.into_iter()).is_err());
    }
}
