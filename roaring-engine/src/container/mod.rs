//! The three interchangeable representations of the low 16 bits of every
//! value sharing one key.
//!
//! A [`Container`] holds at most 65536 values and always picks one of:
//!
//! * `Array`: a sorted list, used while the cardinality is at most
//!   [`ARRAY_MAX_CARDINALITY`]
//! * `Bitset`: 65536 bits, used above that
//! * `Run`: sorted intervals, only chosen by [`Container::run_optimize`], range
//!   insertion, or operations between run containers, and only when it is the
//!   smallest encoding
//!
//! Every operation depends only on the logical contents of a container.

use std::mem;

pub(crate) mod array;
pub(crate) mod bitset;
mod ops;
pub(crate) mod run;

pub(crate) use self::array::ArrayContainer;
pub(crate) use self::bitset::{BitsetContainer, BITSET_BYTES};
pub(crate) use self::run::{RunBuilder, RunContainer};

use self::array::ArrayIter;
use self::bitset::BitsetIter;
use self::run::RunIter;

/// Largest cardinality stored as a sorted array, above it a container is a bitset
pub const ARRAY_MAX_CARDINALITY: usize = 4096;

/// Number of 64 bit words in a bitset container
pub const BITSET_WORDS: usize = 1024;

/// Maximum number of containers in a bitmap, one per possible key
pub const MAX_CONTAINERS: usize = 1 << 16;

/// Number of possible low values in one container
pub(crate) const CONTAINER_CAPACITY: u32 = 1 << 16;

#[derive(Clone, Debug)]
pub(crate) enum Container {
    Array(ArrayContainer),
    Bitset(BitsetContainer),
    Run(RunContainer),
}

impl Default for Container {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Container {
    #[inline]
    pub const fn new() -> Self {
        Container::Array(ArrayContainer::new())
    }

    #[inline]
    pub fn full() -> Self {
        Container::Run(RunContainer::full())
    }

    /// The values `[start, end)` in their most compact representation
    pub fn from_range(start: u32, end: u32) -> Self {
        Self::from_run(RunContainer::from_range(start, end))
    }

    /// Promotes to a bitset when over [`ARRAY_MAX_CARDINALITY`]
    #[inline]
    pub fn from_array(array: ArrayContainer) -> Self {
        if array.is_over_capacity() {
            Container::Bitset(array.to_bitset())
        } else {
            Container::Array(array)
        }
    }

    /// Demotes to an array at or below [`ARRAY_MAX_CARDINALITY`]
    #[inline]
    pub fn from_bitset(bitset: BitsetContainer) -> Self {
        if bitset.len() as usize <= ARRAY_MAX_CARDINALITY {
            Container::Array(bitset.to_array())
        } else {
            Container::Bitset(bitset)
        }
    }

    /// Keeps the runs only while they are strictly smaller than the array or
    /// bitset encoding of the same values
    pub fn from_run(run: RunContainer) -> Self {
        let cardinality = run.len();
        if run.size_in_bytes() < non_run_size_in_bytes(cardinality) {
            Container::Run(run)
        } else if cardinality as usize <= ARRAY_MAX_CARDINALITY {
            Container::Array(run.to_array())
        } else {
            Container::Bitset(run.to_bitset())
        }
    }

    /// Re-selects the representation from the current contents.
    ///
    /// A bitset must have an exact cardinality when this is called.
    pub fn normalize(&mut self) {
        let container = mem::take(self);
        *self = match container {
            Container::Array(array) => Container::from_array(array),
            Container::Bitset(bitset) if bitset.len() == CONTAINER_CAPACITY => Container::full(),
            Container::Bitset(bitset) => Container::from_bitset(bitset),
            Container::Run(run) => Container::from_run(run),
        };
    }

    #[inline]
    pub fn len(&self) -> u32 {
        match self {
            Container::Array(array) => array.len(),
            Container::Bitset(bitset) => bitset.len(),
            Container::Run(run) => run.len(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        match self {
            Container::Array(array) => array.is_empty(),
            Container::Bitset(bitset) => bitset.is_empty(),
            Container::Run(run) => run.is_empty(),
        }
    }

    #[inline]
    pub fn is_run(&self) -> bool {
        matches!(self, Container::Run(_))
    }

    #[inline]
    pub fn contains(&self, value: u16) -> bool {
        match self {
            Container::Array(array) => array.contains(value),
            Container::Bitset(bitset) => bitset.contains(value),
            Container::Run(run) => run.contains(value),
        }
    }

    pub fn add(&mut self, value: u16) -> bool {
        match self {
            Container::Array(array) => {
                if !array.insert(value) {
                    return false;
                }
                if array.is_over_capacity() {
                    *self = Container::Bitset(array.to_bitset());
                }
                true
            }
            Container::Bitset(bitset) => bitset.insert(value),
            Container::Run(run) => run.insert(value),
        }
    }

    pub fn remove(&mut self, value: u16) -> bool {
        match self {
            Container::Array(array) => array.remove(value),
            Container::Bitset(bitset) => {
                if !bitset.remove(value) {
                    return false;
                }
                if bitset.len() as usize <= ARRAY_MAX_CARDINALITY {
                    *self = Container::Array(bitset.to_array());
                }
                true
            }
            Container::Run(run) => run.remove(value),
        }
    }

    /// Adds `[start, end)`, `end <= 65536`
    pub fn add_range(&mut self, start: u32, end: u32) {
        if start >= end {
            return;
        }
        if start == 0 && end == CONTAINER_CAPACITY {
            *self = Container::full();
            return;
        }
        if self.is_empty() {
            *self = Container::from_range(start, end);
            return;
        }
        match self {
            Container::Array(array) => {
                let added = (end - start) - array.count_range(start, end);
                if (array.len() + added) as usize <= ARRAY_MAX_CARDINALITY {
                    array.insert_range(start, end);
                } else {
                    let mut bitset = array.to_bitset();
                    bitset.insert_range(start, end);
                    *self = Container::Bitset(bitset);
                }
            }
            Container::Bitset(bitset) => {
                bitset.insert_range(start, end);
                if bitset.len() == CONTAINER_CAPACITY {
                    *self = Container::full();
                }
            }
            Container::Run(run) => run.insert_range(start, end),
        }
    }

    /// Removes `[start, end)`, `end <= 65536`
    pub fn remove_range(&mut self, start: u32, end: u32) {
        if start >= end {
            return;
        }
        match self {
            Container::Array(array) => array.remove_range(start, end),
            Container::Bitset(bitset) => {
                bitset.remove_range(start, end);
                if bitset.len() as usize <= ARRAY_MAX_CARDINALITY {
                    *self = Container::Array(bitset.to_array());
                }
            }
            Container::Run(run) => {
                run.remove_range(start, end);
            }
        }
    }

    /// Complements `[start, end)`, `end <= 65536`
    pub fn flip_range(&mut self, start: u32, end: u32) {
        if start >= end {
            return;
        }
        if let Container::Bitset(bitset) = self {
            bitset.flip_range(start, end);
            self.normalize();
        } else {
            self.xor_inplace(&Container::Run(RunContainer::from_range(start, end)));
        }
    }

    /// Whether every value of the non empty range `[start, end)` is present
    pub fn contains_range(&self, start: u32, end: u32) -> bool {
        debug_assert!(start < end);
        match self {
            Container::Array(array) => array.contains_range(start, end),
            Container::Bitset(bitset) => bitset.contains_range(start, end),
            Container::Run(run) => run.contains_range(start, end),
        }
    }

    /// Number of values in `[start, end)`
    pub fn count_range(&self, start: u32, end: u32) -> u32 {
        if start >= end {
            return 0;
        }
        match self {
            Container::Array(array) => array.count_range(start, end),
            Container::Bitset(bitset) => bitset.count_range(start, end),
            Container::Run(run) => run.count_range(start, end),
        }
    }

    #[inline]
    pub fn min(&self) -> Option<u16> {
        match self {
            Container::Array(array) => array.min(),
            Container::Bitset(bitset) => bitset.min(),
            Container::Run(run) => run.min(),
        }
    }

    #[inline]
    pub fn max(&self) -> Option<u16> {
        match self {
            Container::Array(array) => array.max(),
            Container::Bitset(bitset) => bitset.max(),
            Container::Run(run) => run.max(),
        }
    }

    /// Number of values `<= value`
    #[inline]
    pub fn rank(&self, value: u16) -> u32 {
        match self {
            Container::Array(array) => array.rank(value),
            Container::Bitset(bitset) => bitset.rank(value),
            Container::Run(run) => run.rank(value),
        }
    }

    /// The value at 0 based position `rank`
    #[inline]
    pub fn select(&self, rank: u32) -> Option<u16> {
        match self {
            Container::Array(array) => array.select(rank),
            Container::Bitset(bitset) => bitset.select(rank),
            Container::Run(run) => run.select(rank),
        }
    }

    #[inline]
    pub fn iter(&self) -> ContainerIter<'_> {
        match self {
            Container::Array(array) => ContainerIter::Array(array.iter()),
            Container::Bitset(bitset) => ContainerIter::Bitset(bitset.iter()),
            Container::Run(run) => ContainerIter::Run(run.iter()),
        }
    }

    /// Iterate values `>= low`
    #[inline]
    pub fn iter_from(&self, low: u16) -> ContainerIter<'_> {
        match self {
            Container::Array(array) => ContainerIter::Array(array.iter_from(low)),
            Container::Bitset(bitset) => ContainerIter::Bitset(bitset.iter_from(low)),
            Container::Run(run) => ContainerIter::Run(run.iter_from(low)),
        }
    }

    /// Keeps the values for which `keep` returns true
    pub fn retain(&mut self, mut keep: impl FnMut(u16) -> bool) {
        let values: Vec<u16> = self.iter().filter(|&v| keep(v)).collect();
        if values.len() as u32 != self.len() {
            *self = Container::from_array(ArrayContainer::from_sorted_unchecked(values));
        }
    }

    /// Converts to runs when strictly smaller than the current encoding (and
    /// back out of runs when they are not).
    ///
    /// Returns true if the container is run encoded afterwards
    pub fn run_optimize(&mut self) -> bool {
        match self {
            Container::Array(array) => {
                let runs = array.number_of_runs() as usize;
                if run::serialized_size(runs) < array.size_in_bytes() {
                    *self = Container::Run(RunContainer::from_array(array));
                }
            }
            Container::Bitset(bitset) => {
                let runs = bitset.number_of_runs() as usize;
                if run::serialized_size(runs) < BITSET_BYTES {
                    *self = Container::Run(bitset.to_runs());
                }
            }
            Container::Run(_) => self.normalize(),
        }
        self.is_run()
    }

    /// Returns true if the container was run encoded
    pub fn remove_run_compression(&mut self) -> bool {
        let Container::Run(run) = self else {
            return false;
        };
        *self = if run.len() as usize <= ARRAY_MAX_CARDINALITY {
            Container::Array(run.to_array())
        } else {
            Container::Bitset(run.to_bitset())
        };
        true
    }

    /// Bytes released
    pub fn shrink_to_fit(&mut self) -> usize {
        match self {
            Container::Array(array) => array.shrink_to_fit(),
            Container::Bitset(_) => 0,
            Container::Run(run) => run.shrink_to_fit(),
        }
    }

    /// Payload size in the portable format
    #[inline]
    pub fn size_in_bytes(&self) -> usize {
        match self {
            Container::Run(run) => run.size_in_bytes(),
            other => non_run_size_in_bytes(other.len()),
        }
    }
}

/// Portable payload size of a non run container of `cardinality` values
#[inline]
pub(crate) fn non_run_size_in_bytes(cardinality: u32) -> usize {
    if cardinality as usize <= ARRAY_MAX_CARDINALITY {
        cardinality as usize * mem::size_of::<u16>()
    } else {
        BITSET_BYTES
    }
}

impl PartialEq for Container {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Container::Array(a), Container::Array(b)) => a == b,
            (Container::Bitset(a), Container::Bitset(b)) => a == b,
            (Container::Run(a), Container::Run(b)) => a == b,
            (a, b) => a.len() == b.len() && a.iter().eq(b.iter()),
        }
    }
}

impl Eq for Container {}

#[derive(Clone)]
pub(crate) enum ContainerIter<'a> {
    Array(ArrayIter<'a>),
    Bitset(BitsetIter<'a>),
    Run(RunIter<'a>),
}

impl Iterator for ContainerIter<'_> {
    type Item = u16;

    #[inline]
    fn next(&mut self) -> Option<u16> {
        match self {
            ContainerIter::Array(iter) => iter.next(),
            ContainerIter::Bitset(iter) => iter.next(),
            ContainerIter::Run(iter) => iter.next(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(container: &Container) -> &'static str {
        match container {
            Container::Array(_) => "array",
            Container::Bitset(_) => "bitset",
            Container::Run(_) => "run",
        }
    }

    #[test]
    fn array_promotes_and_bitset_demotes() {
        let mut c = Container::new();
        for v in 0..ARRAY_MAX_CARDINALITY as u16 {
            assert!(c.add(v * 2));
        }
        assert_eq!(kind(&c), "array");
        c.add(65535);
        assert_eq!(kind(&c), "bitset");
        assert_eq!(c.len(), 4097);
        c.remove(65535);
        assert_eq!(kind(&c), "array");
        assert_eq!(c.len(), 4096);
    }

    #[test]
    fn range_containers_are_compact() {
        assert_eq!(kind(&Container::from_range(0, 1)), "array");
        assert_eq!(kind(&Container::from_range(0, 2)), "array");
        assert_eq!(kind(&Container::from_range(0, 3)), "array");
        assert_eq!(kind(&Container::from_range(0, 4)), "run");
        let mut c = Container::new();
        c.add_range(0, 1 << 16);
        assert!(matches!(&c, Container::Run(run) if run.is_full()));
        assert_eq!(c.len(), 1 << 16);
    }

    #[test]
    fn add_range_to_array_promotes() {
        let mut c = Container::new();
        c.add(5);
        c.add_range(100, 5000);
        assert_eq!(kind(&c), "bitset");
        assert_eq!(c.len(), 4901);
        c.remove_range(0, 4000);
        assert_eq!(kind(&c), "array");
        assert_eq!(c.len(), 1000);
    }

    #[test]
    fn flip_range_every_kind() {
        let mut array = Container::new();
        array.add(1);
        array.flip_range(0, 3);
        assert_eq!(array.iter().collect::<Vec<_>>(), [0, 2]);

        let mut bitset = Container::from_bitset(BitsetContainer::from_range(0, 5000));
        bitset.flip_range(0, 5000);
        assert!(bitset.is_empty());

        let mut run = Container::from_range(10, 20);
        run.flip_range(15, 25);
        assert_eq!(run.len(), 10);
        assert!(run.contains(24));
        assert!(!run.contains(15));
    }

    #[test]
    fn run_optimize_only_when_smaller() {
        let mut sparse = Container::new();
        sparse.add(1);
        sparse.add(3);
        assert!(!sparse.run_optimize());

        let mut dense = Container::from_bitset(BitsetContainer::from_range(0, 10_000));
        assert!(dense.run_optimize());
        assert_eq!(dense.len(), 10_000);
        assert!(dense.remove_run_compression());
        assert_eq!(kind(&dense), "bitset");
        assert!(!dense.remove_run_compression());
    }

    #[test]
    fn runs_tied_with_array_size_are_dropped() {
        // one run of three values takes 6 bytes, as does the array
        let mut tied = Container::Run(RunContainer::from_range(10, 13));
        assert!(!tied.run_optimize());
        assert_eq!(kind(&tied), "array");

        let mut array = Container::Array(ArrayContainer::from_sorted_unchecked(vec![10, 11, 12]));
        assert!(!array.run_optimize());
        assert_eq!(kind(&array), "array");

        let mut longer = Container::Array(ArrayContainer::from_sorted_unchecked(vec![10, 11, 12, 13]));
        assert!(longer.run_optimize());
        assert_eq!(kind(&longer), "run");
    }

    #[test]
    fn equality_is_logical() {
        let run = Container::Run(RunContainer::from_range(0, 10));
        let array = Container::Array(ArrayContainer::from_range(0, 10));
        assert_eq!(run, array);
        assert_ne!(run, Container::Array(ArrayContainer::from_range(0, 9)));
    }

    #[test]
    fn select_rank_across_kinds() {
        for c in [
            Container::Array(ArrayContainer::from_range(100, 200)),
            Container::Bitset(BitsetContainer::from_range(100, 200)),
            Container::Run(RunContainer::from_range(100, 200)),
        ] {
            assert_eq!(c.rank(99), 0);
            assert_eq!(c.rank(150), 51);
            assert_eq!(c.select(50), Some(150));
            assert_eq!(c.select(100), None);
            assert_eq!(c.min(), Some(100));
            assert_eq!(c.max(), Some(199));
            assert_eq!(c.iter_from(198).collect::<Vec<_>>(), [198, 199]);
        }
    }
}
