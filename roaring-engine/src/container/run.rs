use std::cmp;
use std::mem;

use super::array::ArrayContainer;
use super::bitset::{for_each_word_in_range, BitsetContainer};
use super::BITSET_WORDS;

/// A run of consecutive values: `value` followed by `length` more values,
/// i.e. `value..=value + length`. This is also the on-disk descriptor layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Rle16 {
    pub value: u16,
    pub length: u16,
}

impl Rle16 {
    #[inline]
    pub const fn new(value: u16, length: u16) -> Self {
        Self { value, length }
    }

    #[inline]
    pub fn start(self) -> u32 {
        u32::from(self.value)
    }

    /// Exclusive end
    #[inline]
    pub fn end(self) -> u32 {
        u32::from(self.value) + u32::from(self.length) + 1
    }

    #[inline]
    pub fn len(self) -> u32 {
        u32::from(self.length) + 1
    }
}

/// Sorted, disjoint and non-adjacent runs
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct RunContainer {
    runs: Vec<Rle16>,
}

/// Accumulates half open ranges in ascending start order, merging any that
/// overlap or touch.
pub(crate) struct RunBuilder {
    runs: Vec<Rle16>,
}

impl RunBuilder {
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            runs: Vec::with_capacity(capacity),
        }
    }

    pub fn push_range(&mut self, start: u32, end: u32) {
        if start >= end {
            return;
        }
        if let Some(last) = self.runs.last_mut() {
            debug_assert!(start >= last.start());
            let last_end = last.end();
            if start <= last_end {
                if end > last_end {
                    last.length = (end - 1 - last.start()) as u16;
                }
                return;
            }
        }
        self.runs
            .push(Rle16::new(start as u16, (end - 1 - start) as u16));
    }

    #[inline]
    pub fn finish(self) -> RunContainer {
        RunContainer { runs: self.runs }
    }
}

impl RunContainer {
    #[inline]
    pub fn full() -> Self {
        Self::from_range(0, 1 << 16)
    }

    pub fn from_range(start: u32, end: u32) -> Self {
        let mut builder = RunBuilder::with_capacity(1);
        builder.push_range(start, end);
        builder.finish()
    }

    pub fn from_array(array: &ArrayContainer) -> Self {
        let mut builder = RunBuilder::with_capacity(array.number_of_runs() as usize);
        for value in array.iter() {
            let value = u32::from(value);
            builder.push_range(value, value + 1);
        }
        builder.finish()
    }

    #[inline]
    pub fn runs(&self) -> &[Rle16] {
        &self.runs
    }

    /// `(start, end)` half open ranges of every run
    #[inline]
    pub fn ranges(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.runs.iter().map(|run| (run.start(), run.end()))
    }

    #[inline]
    pub fn num_runs(&self) -> u32 {
        self.runs.len() as u32
    }

    pub fn len(&self) -> u32 {
        self.runs.iter().map(|run| run.len()).sum()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.runs.len() == 1 && self.runs[0].value == 0 && self.runs[0].length == u16::MAX
    }

    /// Index of the run containing `value`, or where it would be inserted
    #[inline]
    fn find(&self, value: u32) -> Result<usize, usize> {
        let index = self.runs.partition_point(|run| run.end() <= value);
        match self.runs.get(index) {
            Some(run) if run.start() <= value => Ok(index),
            _ => Err(index),
        }
    }

    #[inline]
    pub fn contains(&self, value: u16) -> bool {
        self.find(u32::from(value)).is_ok()
    }

    pub fn insert(&mut self, value: u16) -> bool {
        if self.contains(value) {
            return false;
        }
        let value = u32::from(value);
        self.insert_range(value, value + 1);
        true
    }

    pub fn remove(&mut self, value: u16) -> bool {
        if !self.contains(value) {
            return false;
        }
        let value = u32::from(value);
        self.remove_range(value, value + 1);
        true
    }

    pub fn insert_range(&mut self, start: u32, end: u32) {
        if start >= end {
            return;
        }
        // every run overlapping or touching [start, end) is merged into one
        let lo = self.runs.partition_point(|run| run.end() < start);
        let hi = self.runs.partition_point(|run| run.start() <= end);
        let (mut new_start, mut new_end) = (start, end);
        if lo < hi {
            new_start = cmp::min(new_start, self.runs[lo].start());
            new_end = cmp::max(new_end, self.runs[hi - 1].end());
        }
        let merged = Rle16::new(new_start as u16, (new_end - 1 - new_start) as u16);
        self.runs.splice(lo..hi, [merged]);
    }

    pub fn remove_range(&mut self, start: u32, end: u32) {
        if start >= end {
            return;
        }
        let lo = self.runs.partition_point(|run| run.end() <= start);
        let hi = self.runs.partition_point(|run| run.start() < end);
        if lo >= hi {
            return;
        }
        let first = self.runs[lo];
        let last = self.runs[hi - 1];
        let mut kept = Vec::with_capacity(2);
        if first.start() < start {
            kept.push(Rle16::new(first.value, (start - 1 - first.start()) as u16));
        }
        if last.end() > end {
            kept.push(Rle16::new(end as u16, (last.end() - 1 - end) as u16));
        }
        self.runs.splice(lo..hi, kept);
    }

    pub fn count_range(&self, start: u32, end: u32) -> u32 {
        self.ranges()
            .skip(self.runs.partition_point(|run| run.end() <= start))
            .take_while(|&(s, _)| s < end)
            .map(|(s, e)| cmp::min(e, end).saturating_sub(cmp::max(s, start)))
            .sum()
    }

    pub fn contains_range(&self, start: u32, end: u32) -> bool {
        match self.find(start) {
            Ok(index) => self.runs[index].end() >= end,
            Err(_) => false,
        }
    }

    #[inline]
    pub fn min(&self) -> Option<u16> {
        self.runs.first().map(|run| run.value)
    }

    #[inline]
    pub fn max(&self) -> Option<u16> {
        self.runs.last().map(|run| run.value + run.length)
    }

    /// Number of values `<= value`
    pub fn rank(&self, value: u16) -> u32 {
        let value = u32::from(value);
        let mut rank = 0;
        for run in &self.runs {
            if run.start() > value {
                break;
            }
            rank += cmp::min(run.end(), value + 1) - run.start();
        }
        rank
    }

    pub fn select(&self, rank: u32) -> Option<u16> {
        let mut remaining = rank;
        for run in &self.runs {
            if remaining < run.len() {
                return Some((run.start() + remaining) as u16);
            }
            remaining -= run.len();
        }
        None
    }

    #[inline]
    pub fn iter(&self) -> RunIter<'_> {
        RunIter {
            runs: &self.runs,
            index: 0,
            offset: 0,
        }
    }

    /// Iterate values `>= low`
    pub fn iter_from(&self, low: u16) -> RunIter<'_> {
        let low = u32::from(low);
        let index = self.runs.partition_point(|run| run.end() <= low);
        let offset = self
            .runs
            .get(index)
            .map_or(0, |run| low.saturating_sub(run.start()));
        RunIter {
            runs: &self.runs,
            index,
            offset,
        }
    }

    pub fn to_array(&self) -> ArrayContainer {
        let mut values = Vec::with_capacity(self.len() as usize);
        values.extend(self.iter());
        ArrayContainer::from_sorted_unchecked(values)
    }

    pub fn to_bitset(&self) -> BitsetContainer {
        let mut words = Box::new([0u64; BITSET_WORDS]);
        for (start, end) in self.ranges() {
            for_each_word_in_range(start, end, |index, mask| words[index] |= mask);
        }
        BitsetContainer::from_words(words)
    }

    /// Bytes released
    pub fn shrink_to_fit(&mut self) -> usize {
        let before = self.runs.capacity();
        self.runs.shrink_to_fit();
        (before - self.runs.capacity()) * mem::size_of::<Rle16>()
    }

    #[inline]
    pub fn size_in_bytes(&self) -> usize {
        serialized_size(self.runs.len())
    }

    pub fn union(&self, other: &Self) -> Self {
        let (a, b) = (&self.runs, &other.runs);
        let mut builder = RunBuilder::with_capacity(a.len() + b.len());
        let (mut i, mut j) = (0, 0);
        while i < a.len() || j < b.len() {
            let take_a = j >= b.len() || (i < a.len() && a[i].value <= b[j].value);
            let run = if take_a {
                i += 1;
                a[i - 1]
            } else {
                j += 1;
                b[j - 1]
            };
            builder.push_range(run.start(), run.end());
        }
        builder.finish()
    }

    pub fn intersection(&self, other: &Self) -> Self {
        let (a, b) = (&self.runs, &other.runs);
        let mut builder = RunBuilder::with_capacity(cmp::max(a.len(), b.len()));
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            let start = cmp::max(a[i].start(), b[j].start());
            let end = cmp::min(a[i].end(), b[j].end());
            builder.push_range(start, end);
            if a[i].end() < b[j].end() {
                i += 1;
            } else {
                j += 1;
            }
        }
        builder.finish()
    }

    pub fn intersection_len(&self, other: &Self) -> u32 {
        let (a, b) = (&self.runs, &other.runs);
        let (mut i, mut j, mut count) = (0, 0, 0);
        while i < a.len() && j < b.len() {
            let start = cmp::max(a[i].start(), b[j].start());
            let end = cmp::min(a[i].end(), b[j].end());
            count += end.saturating_sub(start);
            if a[i].end() < b[j].end() {
                i += 1;
            } else {
                j += 1;
            }
        }
        count
    }

    pub fn intersects(&self, other: &Self) -> bool {
        let (a, b) = (&self.runs, &other.runs);
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            if cmp::max(a[i].start(), b[j].start()) < cmp::min(a[i].end(), b[j].end()) {
                return true;
            }
            if a[i].end() < b[j].end() {
                i += 1;
            } else {
                j += 1;
            }
        }
        false
    }

    pub fn difference(&self, other: &Self) -> Self {
        let (a, b) = (&self.runs, &other.runs);
        let mut builder = RunBuilder::with_capacity(a.len() + b.len());
        let mut j = 0;
        for run in a {
            let (mut start, end) = (run.start(), run.end());
            while j < b.len() && b[j].end() <= start {
                j += 1;
            }
            let mut k = j;
            while k < b.len() && b[k].start() < end {
                if b[k].start() > start {
                    builder.push_range(start, b[k].start());
                }
                start = cmp::max(start, b[k].end());
                if b[k].end() >= end {
                    break;
                }
                k += 1;
            }
            builder.push_range(start, end);
            j = k;
        }
        builder.finish()
    }

    pub fn symmetric_difference(&self, other: &Self) -> Self {
        self.difference(other).union(&other.difference(self))
    }
}

#[inline]
pub(crate) const fn serialized_size(num_runs: usize) -> usize {
    mem::size_of::<u16>() + num_runs * 2 * mem::size_of::<u16>()
}

#[derive(Clone)]
pub(crate) struct RunIter<'a> {
    runs: &'a [Rle16],
    index: usize,
    offset: u32,
}

impl Iterator for RunIter<'_> {
    type Item = u16;

    #[inline]
    fn next(&mut self) -> Option<u16> {
        let run = self.runs.get(self.index)?;
        let value = run.start() + self.offset;
        if self.offset == u32::from(run.length) {
            self.index += 1;
            self.offset = 0;
        } else {
            self.offset += 1;
        }
        Some(value as u16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runs(ranges: &[(u32, u32)]) -> RunContainer {
        let mut builder = RunBuilder::with_capacity(ranges.len());
        for &(start, end) in ranges {
            builder.push_range(start, end);
        }
        builder.finish()
    }

    fn ranges(container: &RunContainer) -> Vec<(u32, u32)> {
        container.ranges().collect()
    }

    #[test]
    fn builder_merges_touching_ranges() {
        let r = runs(&[(0, 5), (5, 10), (8, 12), (20, 21)]);
        assert_eq!(ranges(&r), [(0, 12), (20, 21)]);
        assert_eq!(r.len(), 13);
    }

    #[test]
    fn insert_and_remove() {
        let mut r = RunContainer::default();
        assert!(r.insert(5));
        assert!(r.insert(7));
        assert!(r.insert(6));
        assert!(!r.insert(6));
        assert_eq!(ranges(&r), [(5, 8)]);
        assert!(r.remove(6));
        assert_eq!(ranges(&r), [(5, 6), (7, 8)]);
        assert!(!r.remove(6));
    }

    #[test]
    fn range_edits() {
        let mut r = runs(&[(10, 20), (30, 40), (50, 60)]);
        r.insert_range(15, 31);
        assert_eq!(ranges(&r), [(10, 40), (50, 60)]);
        r.insert_range(40, 50);
        assert_eq!(ranges(&r), [(10, 60)]);
        r.remove_range(20, 30);
        assert_eq!(ranges(&r), [(10, 20), (30, 60)]);
        r.remove_range(0, 15);
        assert_eq!(ranges(&r), [(15, 20), (30, 60)]);
        assert_eq!(r.count_range(18, 35), 7);
        assert!(r.contains_range(30, 60));
        assert!(!r.contains_range(19, 31));
    }

    #[test]
    fn full_container() {
        let mut r = RunContainer::full();
        assert!(r.is_full());
        assert_eq!(r.len(), 1 << 16);
        assert_eq!(r.max(), Some(u16::MAX));
        r.remove(u16::MAX);
        assert!(!r.is_full());
        assert_eq!(r.select(65534), Some(65534));
        assert_eq!(r.select(65535), None);
    }

    #[test]
    fn interval_algebra() {
        let a = runs(&[(0, 10), (20, 30)]);
        let b = runs(&[(5, 25), (40, 45)]);
        assert_eq!(ranges(&a.union(&b)), [(0, 30), (40, 45)]);
        assert_eq!(ranges(&a.intersection(&b)), [(5, 10), (20, 25)]);
        assert_eq!(a.intersection_len(&b), 10);
        assert_eq!(ranges(&a.difference(&b)), [(0, 5), (25, 30)]);
        assert_eq!(ranges(&b.difference(&a)), [(10, 20), (40, 45)]);
        assert_eq!(
            ranges(&a.symmetric_difference(&b)),
            [(0, 5), (10, 20), (25, 30), (40, 45)]
        );
        assert!(a.intersects(&b));
        assert!(!a.intersects(&runs(&[(10, 20)])));
    }

    #[test]
    fn rank_select_iter() {
        let r = runs(&[(3, 6), (10, 12)]);
        assert_eq!(r.iter().collect::<Vec<_>>(), [3, 4, 5, 10, 11]);
        assert_eq!(r.iter_from(5).collect::<Vec<_>>(), [5, 10, 11]);
        assert_eq!(r.iter_from(7).collect::<Vec<_>>(), [10, 11]);
        assert_eq!(r.rank(4), 2);
        assert_eq!(r.rank(9), 3);
        assert_eq!(r.rank(11), 5);
        assert_eq!(r.select(3), Some(10));
    }
}
