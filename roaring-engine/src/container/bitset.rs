use std::fmt;

use super::array::ArrayContainer;
use super::run::{RunBuilder, RunContainer};
use super::BITSET_WORDS;

/// Serialized (and in-memory) size of every bitset container
pub(crate) const BITSET_BYTES: usize = BITSET_WORDS * 8;

/// A fixed 65536 bit vector with a cached cardinality.
///
/// The cached cardinality is always exact, except while a lazy union/xor is in
/// progress (see [`BitsetContainer::words_mut_lazy`]).
#[derive(Clone, PartialEq, Eq)]
pub(crate) struct BitsetContainer {
    words: Box<[u64; BITSET_WORDS]>,
    cardinality: u32,
}

impl fmt::Debug for BitsetContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitsetContainer")
            .field("cardinality", &self.cardinality)
            .finish_non_exhaustive()
    }
}

impl BitsetContainer {
    #[inline]
    pub fn new() -> Self {
        Self {
            words: Box::new([0; BITSET_WORDS]),
            cardinality: 0,
        }
    }

    pub fn from_words(words: Box<[u64; BITSET_WORDS]>) -> Self {
        let cardinality = popcount(&words[..]);
        Self { words, cardinality }
    }

    #[cfg(test)]
    pub fn from_range(start: u32, end: u32) -> Self {
        let mut bitset = Self::new();
        bitset.insert_range(start, end);
        bitset
    }

    #[inline]
    pub fn words(&self) -> &[u64; BITSET_WORDS] {
        &self.words
    }

    /// Direct word access which does not maintain the cardinality:
    /// [`BitsetContainer::recompute_cardinality`] must run before the next read of `len`.
    #[inline]
    pub fn words_mut_lazy(&mut self) -> &mut [u64; BITSET_WORDS] {
        &mut self.words
    }

    #[inline]
    pub fn len(&self) -> u32 {
        self.cardinality
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cardinality == 0
    }

    pub fn recompute_cardinality(&mut self) -> u32 {
        self.cardinality = popcount(&self.words[..]);
        self.cardinality
    }

    #[inline]
    pub fn contains(&self, value: u16) -> bool {
        let (index, bit) = position(value);
        self.words[index] & (1 << bit) != 0
    }

    #[inline]
    pub fn insert(&mut self, value: u16) -> bool {
        let (index, bit) = position(value);
        let before = self.words[index];
        let after = before | (1 << bit);
        self.words[index] = after;
        let inserted = before != after;
        self.cardinality += u32::from(inserted);
        inserted
    }

    #[inline]
    pub fn remove(&mut self, value: u16) -> bool {
        let (index, bit) = position(value);
        let before = self.words[index];
        let after = before & !(1 << bit);
        self.words[index] = after;
        let removed = before != after;
        self.cardinality -= u32::from(removed);
        removed
    }

    /// Toggles `value` without maintaining the cardinality
    #[inline]
    pub fn flip_lazy(&mut self, value: u16) {
        let (index, bit) = position(value);
        self.words[index] ^= 1 << bit;
    }

    pub fn insert_range(&mut self, start: u32, end: u32) {
        self.apply_range(start, end, |word, mask| *word |= mask);
    }

    pub fn remove_range(&mut self, start: u32, end: u32) {
        self.apply_range(start, end, |word, mask| *word &= !mask);
    }

    pub fn flip_range(&mut self, start: u32, end: u32) {
        self.apply_range(start, end, |word, mask| *word ^= mask);
    }

    fn apply_range(&mut self, start: u32, end: u32, op: impl Fn(&mut u64, u64)) {
        let words = &mut self.words;
        let mut delta: i64 = 0;
        for_each_word_in_range(start, end, |index, mask| {
            let before = words[index];
            op(&mut words[index], mask);
            delta += i64::from(words[index].count_ones()) - i64::from(before.count_ones());
        });
        self.cardinality = (i64::from(self.cardinality) + delta) as u32;
    }

    pub fn count_range(&self, start: u32, end: u32) -> u32 {
        let mut count = 0;
        for_each_word_in_range(start, end, |index, mask| {
            count += (self.words[index] & mask).count_ones();
        });
        count
    }

    pub fn contains_range(&self, start: u32, end: u32) -> bool {
        self.count_range(start, end) == end - start
    }

    pub fn intersects_range(&self, start: u32, end: u32) -> bool {
        let mut found = false;
        for_each_word_in_range(start, end, |index, mask| {
            found |= self.words[index] & mask != 0;
        });
        found
    }

    pub fn min(&self) -> Option<u16> {
        self.words
            .iter()
            .position(|&w| w != 0)
            .map(|index| (index * 64 + self.words[index].trailing_zeros() as usize) as u16)
    }

    pub fn max(&self) -> Option<u16> {
        self.words
            .iter()
            .rposition(|&w| w != 0)
            .map(|index| (index * 64 + 63 - self.words[index].leading_zeros() as usize) as u16)
    }

    /// Number of values `<= value`
    pub fn rank(&self, value: u16) -> u32 {
        let (index, bit) = position(value);
        let below = popcount(&self.words[..index]);
        below + (self.words[index] & (u64::MAX >> (63 - bit))).count_ones()
    }

    pub fn select(&self, rank: u32) -> Option<u16> {
        let mut remaining = rank;
        for (index, &word) in self.words.iter().enumerate() {
            let ones = word.count_ones();
            if remaining < ones {
                return Some((index * 64 + select_in_word(word, remaining) as usize) as u16);
            }
            remaining -= ones;
        }
        None
    }

    /// Counts transitions from a set bit to an unset bit, i.e. the number of runs
    pub fn number_of_runs(&self) -> u32 {
        let mut runs = 0;
        let mut next = self.words[0];
        for index in 0..BITSET_WORDS - 1 {
            let word = next;
            next = self.words[index + 1];
            runs += ((!word) & (word << 1)).count_ones() + ((word >> 63) & !next & 1) as u32;
        }
        let word = next;
        runs += ((!word) & (word << 1)).count_ones() + (word >> 63) as u32;
        runs
    }

    #[inline]
    pub fn iter(&self) -> BitsetIter<'_> {
        BitsetIter {
            words: &self.words,
            index: 0,
            current: self.words[0],
        }
    }

    /// Iterate values `>= low`
    pub fn iter_from(&self, low: u16) -> BitsetIter<'_> {
        let (index, bit) = position(low);
        BitsetIter {
            words: &self.words,
            index,
            current: self.words[index] & (u64::MAX << bit),
        }
    }

    pub fn to_array(&self) -> ArrayContainer {
        let mut values = Vec::with_capacity(self.cardinality as usize);
        values.extend(self.iter());
        ArrayContainer::from_sorted_unchecked(values)
    }

    pub fn to_runs(&self) -> RunContainer {
        let mut builder = RunBuilder::with_capacity(self.number_of_runs() as usize);
        let mut index = 0;
        let mut word = self.words[0];
        loop {
            // skip to the next set bit, which starts a run
            while word == 0 {
                index += 1;
                if index == BITSET_WORDS {
                    return builder.finish();
                }
                word = self.words[index];
            }
            let start = (index * 64) as u32 + word.trailing_zeros();
            // fill the low bits to find the end of the run
            word |= word - 1;
            while word == u64::MAX {
                index += 1;
                if index == BITSET_WORDS {
                    builder.push_range(start, 1 << 16);
                    return builder.finish();
                }
                word = self.words[index];
            }
            let end = (index * 64) as u32 + (!word).trailing_zeros();
            builder.push_range(start, end);
            word &= word + 1;
        }
    }

    pub fn union_with(&mut self, other: &Self) {
        for (a, b) in self.words.iter_mut().zip(other.words.iter()) {
            *a |= *b;
        }
        self.recompute_cardinality();
    }

    pub fn intersect_with(&mut self, other: &Self) {
        for (a, b) in self.words.iter_mut().zip(other.words.iter()) {
            *a &= *b;
        }
        self.recompute_cardinality();
    }

    pub fn difference_with(&mut self, other: &Self) {
        for (a, b) in self.words.iter_mut().zip(other.words.iter()) {
            *a &= !*b;
        }
        self.recompute_cardinality();
    }

    pub fn symmetric_difference_with(&mut self, other: &Self) {
        for (a, b) in self.words.iter_mut().zip(other.words.iter()) {
            *a ^= *b;
        }
        self.recompute_cardinality();
    }

    pub fn intersection_len(&self, other: &Self) -> u32 {
        self.words
            .iter()
            .zip(other.words.iter())
            .map(|(a, b)| (a & b).count_ones())
            .sum()
    }

    pub fn intersects(&self, other: &Self) -> bool {
        self.words
            .iter()
            .zip(other.words.iter())
            .any(|(a, b)| a & b != 0)
    }
}

#[derive(Clone)]
pub(crate) struct BitsetIter<'a> {
    words: &'a [u64; BITSET_WORDS],
    index: usize,
    current: u64,
}

impl Iterator for BitsetIter<'_> {
    type Item = u16;

    #[inline]
    fn next(&mut self) -> Option<u16> {
        loop {
            if self.current != 0 {
                let bit = self.current.trailing_zeros() as usize;
                self.current &= self.current - 1;
                return Some((self.index * 64 + bit) as u16);
            }
            self.index += 1;
            if self.index >= BITSET_WORDS {
                return None;
            }
            self.current = self.words[self.index];
        }
    }
}

#[inline]
fn position(value: u16) -> (usize, u32) {
    (usize::from(value >> 6), u32::from(value & 63))
}

#[inline]
pub(crate) fn popcount(words: &[u64]) -> u32 {
    words.iter().map(|w| w.count_ones()).sum()
}

/// Position of the `rank`-th (0 based) set bit of `word`
#[inline]
fn select_in_word(mut word: u64, rank: u32) -> u32 {
    for _ in 0..rank {
        word &= word - 1;
    }
    word.trailing_zeros()
}

/// Calls `f(word_index, mask)` for every word overlapping `[start, end)`,
/// with `mask` selecting the bits of that word inside the range.
pub(crate) fn for_each_word_in_range(start: u32, end: u32, mut f: impl FnMut(usize, u64)) {
    if start >= end {
        return;
    }
    debug_assert!(end <= 1 << 16);
    let first = (start / 64) as usize;
    let last = ((end - 1) / 64) as usize;
    let first_mask = u64::MAX << (start % 64);
    let last_mask = u64::MAX >> (63 - (end - 1) % 64);
    if first == last {
        f(first, first_mask & last_mask);
        return;
    }
    f(first, first_mask);
    for index in first + 1..last {
        f(index, u64::MAX);
    }
    f(last, last_mask);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_remove_maintain_cardinality() {
        let mut b = BitsetContainer::new();
        assert!(b.insert(0));
        assert!(b.insert(65535));
        assert!(!b.insert(0));
        assert_eq!(b.len(), 2);
        assert!(b.remove(0));
        assert!(!b.remove(0));
        assert_eq!(b.len(), 1);
        assert_eq!(b.min(), Some(65535));
        assert_eq!(b.max(), Some(65535));
    }

    #[test]
    fn range_ops() {
        let mut b = BitsetContainer::from_range(10, 200);
        assert_eq!(b.len(), 190);
        assert!(b.contains_range(10, 200));
        assert!(!b.contains_range(9, 200));
        b.remove_range(50, 60);
        assert_eq!(b.len(), 180);
        assert_eq!(b.count_range(0, 60), 40);
        b.flip_range(0, 20);
        assert_eq!(b.len(), 180);
        assert!(b.contains(0));
        assert!(!b.contains(10));
        assert!(b.intersects_range(55, 70));
        assert!(!b.intersects_range(50, 60));
    }

    #[test]
    fn rank_and_select_agree() {
        let mut b = BitsetContainer::new();
        for v in (0..65535u16).step_by(7) {
            b.insert(v);
        }
        for (rank, value) in b.iter().enumerate() {
            assert_eq!(b.select(rank as u32), Some(value));
            assert_eq!(b.rank(value), rank as u32 + 1);
        }
        assert_eq!(b.select(b.len()), None);
    }

    #[test]
    fn runs_round_trip() {
        let mut b = BitsetContainer::new();
        b.insert_range(0, 70);
        b.insert_range(127, 129);
        b.insert_range(1000, 1 << 16);
        assert_eq!(b.number_of_runs(), 3);
        let runs = b.to_runs();
        assert_eq!(runs.len(), b.len());
        assert_eq!(runs.num_runs(), 3);
        assert!(runs.iter().eq(b.iter()));
    }

    #[test]
    fn iter_from_skips_lower_values() {
        let b = BitsetContainer::from_range(60, 70);
        assert_eq!(b.iter_from(65).collect::<Vec<_>>(), [65, 66, 67, 68, 69]);
        assert_eq!(b.iter_from(100).next(), None);
    }
}
