use std::cmp::Ordering;
use std::iter::Copied;
use std::mem;
use std::slice;

use super::bitset::BitsetContainer;
use super::ARRAY_MAX_CARDINALITY;

/// Ratio above which intersections switch from a linear merge to galloping
/// (binary searching each value of the small side in the large side).
const GALLOP_THRESHOLD: usize = 64;

/// A sorted, duplicate free list of low values
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct ArrayContainer {
    values: Vec<u16>,
}

pub(crate) type ArrayIter<'a> = Copied<slice::Iter<'a, u16>>;

impl ArrayContainer {
    #[inline]
    pub const fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// `values` must already be sorted and free of duplicates
    #[inline]
    pub fn from_sorted_unchecked(values: Vec<u16>) -> Self {
        debug_assert!(values.windows(2).all(|w| w[0] < w[1]));
        Self { values }
    }

    /// All values in `[start, end)`
    #[cfg(test)]
    pub fn from_range(start: u32, end: u32) -> Self {
        debug_assert!(start <= end && end <= 1 << 16);
        Self {
            values: (start..end).map(|v| v as u16).collect(),
        }
    }

    #[inline]
    pub fn len(&self) -> u32 {
        self.values.len() as u32
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[u16] {
        &self.values
    }

    #[inline]
    pub fn iter(&self) -> ArrayIter<'_> {
        self.values.iter().copied()
    }

    /// Iterate values `>= low`
    #[inline]
    pub fn iter_from(&self, low: u16) -> ArrayIter<'_> {
        let start = self.values.partition_point(|&v| v < low);
        self.values[start..].iter().copied()
    }

    #[inline]
    pub fn contains(&self, value: u16) -> bool {
        self.values.binary_search(&value).is_ok()
    }

    /// Inserts `value`, the caller is responsible for promoting to a bitset
    /// once the container grows past [`ARRAY_MAX_CARDINALITY`].
    #[inline]
    pub fn insert(&mut self, value: u16) -> bool {
        match self.values.binary_search(&value) {
            Ok(_) => false,
            Err(index) => {
                self.values.insert(index, value);
                true
            }
        }
    }

    #[inline]
    pub fn remove(&mut self, value: u16) -> bool {
        match self.values.binary_search(&value) {
            Ok(index) => {
                self.values.remove(index);
                true
            }
            Err(_) => false,
        }
    }

    /// Number of values in `[start, end)`
    pub fn count_range(&self, start: u32, end: u32) -> u32 {
        let lo = self.values.partition_point(|&v| u32::from(v) < start);
        let hi = self.values.partition_point(|&v| u32::from(v) < end);
        (hi - lo) as u32
    }

    pub fn contains_range(&self, start: u32, end: u32) -> bool {
        let span = (end - start) as usize;
        let lo = self.values.partition_point(|&v| u32::from(v) < start);
        match self.values.get(lo..lo + span) {
            Some(window) => {
                u32::from(window[0]) == start && u32::from(window[span - 1]) == end - 1
            }
            None => false,
        }
    }

    /// Adds every value of `[start, end)`, may exceed [`ARRAY_MAX_CARDINALITY`]
    pub fn insert_range(&mut self, start: u32, end: u32) {
        let lo = self.values.partition_point(|&v| u32::from(v) < start);
        let hi = self.values.partition_point(|&v| u32::from(v) < end);
        self.values
            .splice(lo..hi, (start..end).map(|v| v as u16));
    }

    pub fn remove_range(&mut self, start: u32, end: u32) {
        let lo = self.values.partition_point(|&v| u32::from(v) < start);
        let hi = self.values.partition_point(|&v| u32::from(v) < end);
        self.values.drain(lo..hi);
    }

    #[inline]
    pub fn min(&self) -> Option<u16> {
        self.values.first().copied()
    }

    #[inline]
    pub fn max(&self) -> Option<u16> {
        self.values.last().copied()
    }

    /// Number of values `<= value`
    #[inline]
    pub fn rank(&self, value: u16) -> u32 {
        self.values.partition_point(|&v| v <= value) as u32
    }

    #[inline]
    pub fn select(&self, rank: u32) -> Option<u16> {
        self.values.get(rank as usize).copied()
    }

    pub fn number_of_runs(&self) -> u32 {
        let mut runs = 0;
        let mut previous: Option<u16> = None;
        for &value in &self.values {
            if previous.map_or(true, |p| u32::from(p) + 1 != u32::from(value)) {
                runs += 1;
            }
            previous = Some(value);
        }
        runs
    }

    pub fn to_bitset(&self) -> BitsetContainer {
        let mut bitset = BitsetContainer::new();
        for &value in &self.values {
            bitset.insert(value);
        }
        bitset
    }

    /// Bytes released
    pub fn shrink_to_fit(&mut self) -> usize {
        let before = self.values.capacity();
        self.values.shrink_to_fit();
        (before - self.values.capacity()) * mem::size_of::<u16>()
    }

    #[inline]
    pub fn size_in_bytes(&self) -> usize {
        self.values.len() * mem::size_of::<u16>()
    }

    pub fn intersection(&self, other: &Self) -> Self {
        let (small, large) = order_by_len(&self.values, &other.values);
        let mut values = Vec::with_capacity(small.len());
        if small.len() * GALLOP_THRESHOLD < large.len() {
            let mut rest = large;
            for &value in small {
                match rest.binary_search(&value) {
                    Ok(index) => {
                        values.push(value);
                        rest = &rest[index + 1..];
                    }
                    Err(index) => rest = &rest[index..],
                }
            }
        } else {
            let (mut i, mut j) = (0, 0);
            while i < small.len() && j < large.len() {
                match small[i].cmp(&large[j]) {
                    Ordering::Less => i += 1,
                    Ordering::Greater => j += 1,
                    Ordering::Equal => {
                        values.push(small[i]);
                        i += 1;
                        j += 1;
                    }
                }
            }
        }
        Self { values }
    }

    pub fn intersection_len(&self, other: &Self) -> u32 {
        let (small, large) = order_by_len(&self.values, &other.values);
        let mut count = 0;
        if small.len() * GALLOP_THRESHOLD < large.len() {
            let mut rest = large;
            for value in small {
                match rest.binary_search(value) {
                    Ok(index) => {
                        count += 1;
                        rest = &rest[index + 1..];
                    }
                    Err(index) => rest = &rest[index..],
                }
            }
        } else {
            let (mut i, mut j) = (0, 0);
            while i < small.len() && j < large.len() {
                match small[i].cmp(&large[j]) {
                    Ordering::Less => i += 1,
                    Ordering::Greater => j += 1,
                    Ordering::Equal => {
                        count += 1;
                        i += 1;
                        j += 1;
                    }
                }
            }
        }
        count
    }

    pub fn intersects(&self, other: &Self) -> bool {
        let (mut i, mut j) = (0, 0);
        while i < self.values.len() && j < other.values.len() {
            match self.values[i].cmp(&other.values[j]) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => return true,
            }
        }
        false
    }

    /// Sorted merge, the result may exceed [`ARRAY_MAX_CARDINALITY`]
    pub fn union(&self, other: &Self) -> Self {
        let (a, b) = (&self.values, &other.values);
        let mut values = Vec::with_capacity(a.len() + b.len());
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                Ordering::Less => {
                    values.push(a[i]);
                    i += 1;
                }
                Ordering::Greater => {
                    values.push(b[j]);
                    j += 1;
                }
                Ordering::Equal => {
                    values.push(a[i]);
                    i += 1;
                    j += 1;
                }
            }
        }
        values.extend_from_slice(&a[i..]);
        values.extend_from_slice(&b[j..]);
        Self { values }
    }

    pub fn difference(&self, other: &Self) -> Self {
        let (a, b) = (&self.values, &other.values);
        let mut values = Vec::with_capacity(a.len());
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                Ordering::Less => {
                    values.push(a[i]);
                    i += 1;
                }
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    i += 1;
                    j += 1;
                }
            }
        }
        values.extend_from_slice(&a[i..]);
        Self { values }
    }

    /// Sorted merge, the result may exceed [`ARRAY_MAX_CARDINALITY`]
    pub fn symmetric_difference(&self, other: &Self) -> Self {
        let (a, b) = (&self.values, &other.values);
        let mut values = Vec::with_capacity(a.len() + b.len());
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                Ordering::Less => {
                    values.push(a[i]);
                    i += 1;
                }
                Ordering::Greater => {
                    values.push(b[j]);
                    j += 1;
                }
                Ordering::Equal => {
                    i += 1;
                    j += 1;
                }
            }
        }
        values.extend_from_slice(&a[i..]);
        values.extend_from_slice(&b[j..]);
        Self { values }
    }

    pub fn filter_by(&self, mut keep: impl FnMut(u16) -> bool) -> Self {
        Self {
            values: self.values.iter().copied().filter(|&v| keep(v)).collect(),
        }
    }

    #[inline]
    pub fn is_over_capacity(&self) -> bool {
        self.values.len() > ARRAY_MAX_CARDINALITY
    }
}

#[inline]
fn order_by_len<'a>(a: &'a [u16], b: &'a [u16]) -> (&'a [u16], &'a [u16]) {
    if a.len() <= b.len() {
        (a, b)
    } else {
        (b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn array(values: &[u16]) -> ArrayContainer {
        ArrayContainer::from_sorted_unchecked(values.to_vec())
    }

    #[test]
    fn insert_and_remove_keep_order() {
        let mut a = ArrayContainer::new();
        assert!(a.insert(10));
        assert!(a.insert(2));
        assert!(a.insert(7));
        assert!(!a.insert(7));
        assert_eq!(a.as_slice(), [2, 7, 10]);
        assert!(a.remove(7));
        assert!(!a.remove(7));
        assert_eq!(a.as_slice(), [2, 10]);
    }

    #[test]
    fn ranges() {
        let mut a = array(&[1, 5, 100]);
        a.insert_range(3, 8);
        assert_eq!(a.as_slice(), [1, 3, 4, 5, 6, 7, 100]);
        assert!(a.contains_range(3, 8));
        assert!(!a.contains_range(2, 8));
        assert_eq!(a.count_range(0, 6), 4);
        a.remove_range(4, 101);
        assert_eq!(a.as_slice(), [1, 3]);
    }

    #[test]
    fn set_algebra() {
        let a = array(&[1, 2, 3, 10]);
        let b = array(&[2, 3, 4]);
        assert_eq!(a.intersection(&b).as_slice(), [2, 3]);
        assert_eq!(a.intersection_len(&b), 2);
        assert_eq!(a.union(&b).as_slice(), [1, 2, 3, 4, 10]);
        assert_eq!(a.difference(&b).as_slice(), [1, 10]);
        assert_eq!(a.symmetric_difference(&b).as_slice(), [1, 4, 10]);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&array(&[5, 6])));
    }

    #[test]
    fn galloping_intersection_matches_merge() {
        let large = ArrayContainer::from_range(0, 4000);
        let small = array(&[3, 999, 3999, 4001]);
        assert_eq!(small.intersection(&large).as_slice(), [3, 999, 3999]);
        assert_eq!(large.intersection_len(&small), 3);
    }

    #[test]
    fn rank_select_runs() {
        let a = array(&[1, 2, 3, 7, 9, 10]);
        assert_eq!(a.rank(0), 0);
        assert_eq!(a.rank(3), 3);
        assert_eq!(a.rank(8), 4);
        assert_eq!(a.select(3), Some(7));
        assert_eq!(a.select(6), None);
        assert_eq!(a.number_of_runs(), 3);
    }
}
