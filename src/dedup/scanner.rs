use anyhow::{Context, Result};
use memmap2::Mmap;
use rayon::prelude::*;
use std::fs::File;
use std::path::Path;
use crate::dedup::coordinate::{Coordinate, ENCODED_LEN};

/// Scans one bucket file for coordinates that occur two or more times in
/// it. Returns each duplicate value exactly once, in sorted order.
///
/// The whole bucket is loaded at once; memory use is bounded by the largest
/// bucket, not the dataset. An unreadable or corrupt file is fatal.
pub fn scan_bucket(path: &Path) -> Result<Vec<Coordinate>> {
    let file = File::open(path)
        .with_context(|| format!("Can't open bucket file '{}'", path.display()))?;
    let len = file
        .metadata()
        .with_context(|| format!("Can't stat bucket file '{}'", path.display()))?
        .len();

    if len == 0 {
        return Ok(Vec::new());
    }

    if len % ENCODED_LEN as u64 != 0 {
        anyhow::bail!(
            "Corrupt bucket file '{}': {} bytes is not a whole number of coordinates",
            path.display(), len
        );
    }

    // The bucket files are private to this run and nothing writes them
    // after partitioning finished.
    let mapping = unsafe { Mmap::map(&file) }
        .with_context(|| format!("Can't map bucket file '{}'", path.display()))?;

    let mut coordinates: Vec<Coordinate> = mapping
        .chunks_exact(ENCODED_LEN)
        .map(Coordinate::from_le_bytes)
        .collect();
    drop(mapping);

    coordinates.par_sort_unstable();

    Ok(collect_adjacent_duplicates(&coordinates))
}

/// Single linear scan over a sorted slice: a run of k >= 2 equal values
/// emits the value once and the scan skips the rest of the run.
fn collect_adjacent_duplicates(sorted: &[Coordinate]) -> Vec<Coordinate> {
    let mut duplicates = Vec::new();
    let mut i = 0;

    while i + 1 < sorted.len() {
        if sorted[i] == sorted[i + 1] {
            let value = sorted[i];
            duplicates.push(value);
            i += 2;
            while i < sorted.len() && sorted[i] == value {
                i += 1;
            }
        } else {
            i += 1;
        }
    }

    duplicates
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_bucket(path: &Path, coords: &[Coordinate]) {
        let mut file = File::create(path).unwrap();
        for coord in coords {
            file.write_all(&coord.to_le_bytes()).unwrap();
        }
    }

    #[test]
    fn test_empty_bucket_yields_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("locations_00.dat");
        write_bucket(&path, &[]);

        assert!(scan_bucket(&path).unwrap().is_empty());
    }

    #[test]
    fn test_no_duplicates_yields_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("locations_00.dat");
        write_bucket(&path, &[
            Coordinate::new(3, 3),
            Coordinate::new(1, 1),
            Coordinate::new(2, 2),
        ]);

        assert!(scan_bucket(&path).unwrap().is_empty());
    }

    #[test]
    fn test_runs_emit_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("locations_00.dat");
        // (1,1) three times and (5,5) twice, shuffled in with singletons.
        write_bucket(&path, &[
            Coordinate::new(5, 5),
            Coordinate::new(1, 1),
            Coordinate::new(9, 9),
            Coordinate::new(1, 1),
            Coordinate::new(5, 5),
            Coordinate::new(1, 1),
            Coordinate::new(7, 7),
        ]);

        let duplicates = scan_bucket(&path).unwrap();
        assert_eq!(duplicates, vec![Coordinate::new(1, 1), Coordinate::new(5, 5)]);
    }

    #[test]
    fn test_scan_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("locations_00.dat");
        write_bucket(&path, &[
            Coordinate::new(4, 0),
            Coordinate::new(-2, 1),
            Coordinate::new(4, 0),
            Coordinate::new(8, 8),
        ]);

        let first = scan_bucket(&path).unwrap();
        let second = scan_bucket(&path).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, vec![Coordinate::new(4, 0)]);
    }

    #[test]
    fn test_corrupt_bucket_is_fatal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("locations_00.dat");
        let mut file = File::create(&path).unwrap();
        file.write_all(&[1, 2, 3]).unwrap();
        drop(file);

        let err = scan_bucket(&path).unwrap_err();
        assert!(err.to_string().contains("locations_00.dat"));
    }

    #[test]
    fn test_adjacent_scan_on_boundary_run() {
        // Run reaching the end of the slice.
        let sorted = vec![
            Coordinate::new(1, 1),
            Coordinate::new(2, 2),
            Coordinate::new(2, 2),
            Coordinate::new(2, 2),
        ];
        assert_eq!(collect_adjacent_duplicates(&sorted), vec![Coordinate::new(2, 2)]);
    }
}
