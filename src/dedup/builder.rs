use crate::dedup::coordinate::Coordinate;

/// Collects per-bucket duplicate lists, in whatever order the scans finish,
/// and merges them into one global sorted set.
#[derive(Default)]
pub struct DuplicateSetBuilder {
    coordinates: Vec<Coordinate>,
}

impl DuplicateSetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_bucket(&mut self, duplicates: Vec<Coordinate>) {
        self.coordinates.extend(duplicates);
    }

    /// Sorts and dedups the concatenation. Bucketing is a pure function of
    /// the coordinate, so a duplicate can only ever come from one bucket;
    /// the dedup here is a safety net that also makes the artifact
    /// canonical.
    pub fn build(mut self) -> DuplicateSet {
        self.coordinates.sort_unstable();
        self.coordinates.dedup();
        DuplicateSet {
            coordinates: self.coordinates,
        }
    }
}

/// The global, sorted, duplicate-free set of coordinates that occurred two
/// or more times anywhere in the input.
pub struct DuplicateSet {
    coordinates: Vec<Coordinate>,
}

impl DuplicateSet {
    pub fn contains(&self, coordinate: Coordinate) -> bool {
        self.coordinates.binary_search(&coordinate).is_ok()
    }

    pub fn len(&self) -> usize {
        self.coordinates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }

    pub fn as_slice(&self) -> &[Coordinate] {
        &self.coordinates
    }
}
