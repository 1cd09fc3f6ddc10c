//! Pairwise algebra between every combination of container representations.
//!
//! Results pick their own representation from their contents. In place
//! variants mutate a bitset receiver directly and fall back to building a new
//! container otherwise.

use super::array::ArrayContainer;
use super::bitset::{for_each_word_in_range, BitsetContainer};
use super::run::{RunBuilder, RunContainer};
use super::{Container, ARRAY_MAX_CARDINALITY, BITSET_WORDS};

impl Container {
    pub fn and(&self, other: &Self) -> Self {
        use Container::*;
        match (self, other) {
            (Run(run), _) if run.is_full() => other.clone(),
            (_, Run(run)) if run.is_full() => self.clone(),
            (Array(a), Array(b)) => Array(a.intersection(b)),
            (Array(a), Bitset(b)) | (Bitset(b), Array(a)) => Array(a.filter_by(|v| b.contains(v))),
            (Array(a), Run(r)) | (Run(r), Array(a)) => Array(array_and_run(a, r)),
            (Bitset(a), Bitset(b)) => {
                if a.intersection_len(b) as usize <= ARRAY_MAX_CARDINALITY {
                    let values = a
                        .words()
                        .iter()
                        .zip(b.words().iter())
                        .enumerate()
                        .flat_map(|(index, (x, y))| word_values(index, x & y))
                        .collect();
                    Array(ArrayContainer::from_sorted_unchecked(values))
                } else {
                    let mut result = a.clone();
                    result.intersect_with(b);
                    Bitset(result)
                }
            }
            (Bitset(b), Run(r)) | (Run(r), Bitset(b)) => {
                let mut words = Box::new([0u64; BITSET_WORDS]);
                for (start, end) in r.ranges() {
                    for_each_word_in_range(start, end, |index, mask| {
                        words[index] |= b.words()[index] & mask;
                    });
                }
                Container::from_bitset(BitsetContainer::from_words(words))
            }
            (Run(a), Run(b)) => Container::from_run(a.intersection(b)),
        }
    }

    pub fn or(&self, other: &Self) -> Self {
        use Container::*;
        match (self, other) {
            (Run(run), _) | (_, Run(run)) if run.is_full() => Container::full(),
            (Array(a), Array(b)) => Container::from_array(a.union(b)),
            (Array(a), Bitset(b)) | (Bitset(b), Array(a)) => {
                let mut result = b.clone();
                for value in a.iter() {
                    result.insert(value);
                }
                Bitset(result)
            }
            (Array(a), Run(r)) | (Run(r), Array(a)) => Container::from_run(run_or_array(r, a)),
            (Bitset(a), Bitset(b)) => {
                let mut result = a.clone();
                result.union_with(b);
                Bitset(result)
            }
            (Bitset(b), Run(r)) | (Run(r), Bitset(b)) => {
                let mut result = b.clone();
                for (start, end) in r.ranges() {
                    result.insert_range(start, end);
                }
                let mut result = Bitset(result);
                result.normalize();
                result
            }
            (Run(a), Run(b)) => Container::from_run(a.union(b)),
        }
    }

    pub fn xor(&self, other: &Self) -> Self {
        use Container::*;
        match (self, other) {
            (Array(a), Array(b)) => Container::from_array(a.symmetric_difference(b)),
            (Array(a), Bitset(b)) | (Bitset(b), Array(a)) => {
                let mut result = b.clone();
                for value in a.iter() {
                    result.flip_lazy(value);
                }
                result.recompute_cardinality();
                Container::from_bitset(result)
            }
            (Array(a), Run(r)) | (Run(r), Array(a)) => {
                Container::from_run(r.symmetric_difference(&RunContainer::from_array(a)))
            }
            (Bitset(a), Bitset(b)) => {
                let mut result = a.clone();
                result.symmetric_difference_with(b);
                Container::from_bitset(result)
            }
            (Bitset(b), Run(r)) | (Run(r), Bitset(b)) => {
                let mut result = b.clone();
                for (start, end) in r.ranges() {
                    result.flip_range(start, end);
                }
                let mut result = Bitset(result);
                result.normalize();
                result
            }
            (Run(a), Run(b)) => Container::from_run(a.symmetric_difference(b)),
        }
    }

    /// Values of `self` not in `other`
    pub fn andnot(&self, other: &Self) -> Self {
        use Container::*;
        match (self, other) {
            (_, Run(run)) if run.is_full() => Container::new(),
            (Array(a), Array(b)) => Array(a.difference(b)),
            (Array(a), Bitset(b)) => Array(a.filter_by(|v| !b.contains(v))),
            (Array(a), Run(r)) => Array(array_andnot_run(a, r)),
            (Bitset(a), Array(b)) => {
                let mut result = a.clone();
                for value in b.iter() {
                    result.remove(value);
                }
                Container::from_bitset(result)
            }
            (Bitset(a), Bitset(b)) => {
                let mut result = a.clone();
                result.difference_with(b);
                Container::from_bitset(result)
            }
            (Bitset(b), Run(r)) => {
                let mut result = b.clone();
                for (start, end) in r.ranges() {
                    result.remove_range(start, end);
                }
                Container::from_bitset(result)
            }
            (Run(r), Array(a)) => Container::from_run(r.difference(&RunContainer::from_array(a))),
            (Run(r), Bitset(b)) => {
                let mut result = r.to_bitset();
                result.difference_with(b);
                Container::from_bitset(result)
            }
            (Run(a), Run(b)) => Container::from_run(a.difference(b)),
        }
    }

    pub fn and_inplace(&mut self, other: &Self) {
        let handled = match (&mut *self, other) {
            (_, Container::Run(run)) if run.is_full() => return,
            (Container::Bitset(a), Container::Bitset(b)) => {
                a.intersect_with(b);
                true
            }
            (Container::Bitset(b), Container::Run(r)) => {
                let mut previous = 0;
                for (start, end) in r.ranges() {
                    b.remove_range(previous, start);
                    previous = end;
                }
                b.remove_range(previous, 1 << 16);
                true
            }
            _ => false,
        };
        if handled {
            self.normalize();
        } else {
            *self = self.and(other);
        }
    }

    pub fn or_inplace(&mut self, other: &Self) {
        let handled = match (&mut *self, other) {
            (Container::Bitset(a), Container::Bitset(b)) => {
                a.union_with(b);
                true
            }
            (Container::Bitset(b), Container::Array(a)) => {
                for value in a.iter() {
                    b.insert(value);
                }
                true
            }
            (Container::Bitset(b), Container::Run(r)) => {
                for (start, end) in r.ranges() {
                    b.insert_range(start, end);
                }
                true
            }
            _ => false,
        };
        if handled {
            self.normalize();
        } else {
            *self = self.or(other);
        }
    }

    pub fn xor_inplace(&mut self, other: &Self) {
        let handled = match (&mut *self, other) {
            (Container::Bitset(a), Container::Bitset(b)) => {
                a.symmetric_difference_with(b);
                true
            }
            (Container::Bitset(b), Container::Array(a)) => {
                for value in a.iter() {
                    b.flip_lazy(value);
                }
                b.recompute_cardinality();
                true
            }
            (Container::Bitset(b), Container::Run(r)) => {
                for (start, end) in r.ranges() {
                    b.flip_range(start, end);
                }
                true
            }
            _ => false,
        };
        if handled {
            self.normalize();
        } else {
            *self = self.xor(other);
        }
    }

    pub fn andnot_inplace(&mut self, other: &Self) {
        let handled = match (&mut *self, other) {
            (Container::Bitset(a), Container::Bitset(b)) => {
                a.difference_with(b);
                true
            }
            (Container::Bitset(b), Container::Array(a)) => {
                for value in a.iter() {
                    b.remove(value);
                }
                true
            }
            (Container::Bitset(b), Container::Run(r)) => {
                for (start, end) in r.ranges() {
                    b.remove_range(start, end);
                }
                true
            }
            (Container::Array(a), Container::Bitset(b)) => {
                *a = a.filter_by(|v| !b.contains(v));
                true
            }
            _ => false,
        };
        if handled {
            self.normalize();
        } else {
            *self = self.andnot(other);
        }
    }

    /// `|self & other|` without building the intersection
    pub fn and_cardinality(&self, other: &Self) -> u32 {
        use Container::*;
        match (self, other) {
            (Run(run), _) if run.is_full() => other.len(),
            (_, Run(run)) if run.is_full() => self.len(),
            (Array(a), Array(b)) => a.intersection_len(b),
            (Array(a), Bitset(b)) | (Bitset(b), Array(a)) => {
                a.iter().filter(|&v| b.contains(v)).count() as u32
            }
            (Array(a), Run(r)) | (Run(r), Array(a)) => array_and_run_len(a, r),
            (Bitset(a), Bitset(b)) => a.intersection_len(b),
            (Bitset(b), Run(r)) | (Run(r), Bitset(b)) => {
                r.ranges().map(|(start, end)| b.count_range(start, end)).sum()
            }
            (Run(a), Run(b)) => a.intersection_len(b),
        }
    }

    /// Whether `self & other` is non empty, without building it
    pub fn intersects(&self, other: &Self) -> bool {
        use Container::*;
        match (self, other) {
            (Array(a), Array(b)) => a.intersects(b),
            (Array(a), Bitset(b)) | (Bitset(b), Array(a)) => a.iter().any(|v| b.contains(v)),
            (Array(a), Run(r)) | (Run(r), Array(a)) => a.iter().any(|v| r.contains(v)),
            (Bitset(a), Bitset(b)) => a.intersects(b),
            (Bitset(b), Run(r)) | (Run(r), Bitset(b)) => {
                r.ranges().any(|(start, end)| b.intersects_range(start, end))
            }
            (Run(a), Run(b)) => a.intersects(b),
        }
    }

    pub fn is_subset(&self, other: &Self) -> bool {
        let len = self.len();
        len <= other.len() && self.and_cardinality(other) == len
    }

    /// Union which leaves a bitset receiver with a stale cardinality.
    ///
    /// With `force_bitsets` non bitset receivers are converted to bitsets first.
    /// [`Container::repair`] must run before the container is read again.
    pub fn lazy_or_inplace(&mut self, other: &Self, force_bitsets: bool) {
        if let Container::Run(run) = other {
            if run.is_full() {
                *self = Container::full();
                return;
            }
        }
        if force_bitsets || matches!(other, Container::Bitset(_)) {
            self.make_bitset();
        }
        let Container::Bitset(bitset) = self else {
            self.or_inplace(other);
            return;
        };
        let words = bitset.words_mut_lazy();
        match other {
            Container::Array(a) => {
                for value in a.iter() {
                    words[usize::from(value >> 6)] |= 1 << (value & 63);
                }
            }
            Container::Bitset(b) => {
                for (x, y) in words.iter_mut().zip(b.words().iter()) {
                    *x |= *y;
                }
            }
            Container::Run(r) => {
                for (start, end) in r.ranges() {
                    for_each_word_in_range(start, end, |index, mask| words[index] |= mask);
                }
            }
        }
    }

    /// Symmetric difference which leaves a bitset receiver with a stale
    /// cardinality. [`Container::repair`] must run before the container is
    /// read again.
    pub fn lazy_xor_inplace(&mut self, other: &Self) {
        if matches!(other, Container::Bitset(_)) {
            self.make_bitset();
        }
        let Container::Bitset(bitset) = self else {
            self.xor_inplace(other);
            return;
        };
        let words = bitset.words_mut_lazy();
        match other {
            Container::Array(a) => {
                for value in a.iter() {
                    words[usize::from(value >> 6)] ^= 1 << (value & 63);
                }
            }
            Container::Bitset(b) => {
                for (x, y) in words.iter_mut().zip(b.words().iter()) {
                    *x ^= *y;
                }
            }
            Container::Run(r) => {
                for (start, end) in r.ranges() {
                    for_each_word_in_range(start, end, |index, mask| words[index] ^= mask);
                }
            }
        }
    }

    /// Restores an exact cardinality and the representation policy after lazy
    /// operations
    pub fn repair(&mut self) {
        if let Container::Bitset(bitset) = self {
            bitset.recompute_cardinality();
        }
        self.normalize();
    }

    fn make_bitset(&mut self) {
        match self {
            Container::Array(array) => *self = Container::Bitset(array.to_bitset()),
            Container::Run(run) => *self = Container::Bitset(run.to_bitset()),
            Container::Bitset(_) => {}
        }
    }
}

/// Values set in `word`, which is the `index`-th word of a bitset
fn word_values(index: usize, mut word: u64) -> impl Iterator<Item = u16> {
    std::iter::from_fn(move || {
        if word == 0 {
            return None;
        }
        let bit = word.trailing_zeros() as usize;
        word &= word - 1;
        Some((index * 64 + bit) as u16)
    })
}

/// Walks the array and the runs together; calls `f(value, in_run)` for every
/// array value.
fn walk_array_runs(array: &ArrayContainer, runs: &RunContainer, mut f: impl FnMut(u16, bool)) {
    let runs = runs.runs();
    let mut index = 0;
    for value in array.iter() {
        let v = u32::from(value);
        while index < runs.len() && runs[index].end() <= v {
            index += 1;
        }
        let inside = index < runs.len() && runs[index].start() <= v;
        f(value, inside);
    }
}

fn array_and_run(array: &ArrayContainer, runs: &RunContainer) -> ArrayContainer {
    let mut values = Vec::with_capacity(array.len() as usize);
    walk_array_runs(array, runs, |value, inside| {
        if inside {
            values.push(value);
        }
    });
    ArrayContainer::from_sorted_unchecked(values)
}

fn array_and_run_len(array: &ArrayContainer, runs: &RunContainer) -> u32 {
    let mut count = 0;
    walk_array_runs(array, runs, |_, inside| count += u32::from(inside));
    count
}

fn array_andnot_run(array: &ArrayContainer, runs: &RunContainer) -> ArrayContainer {
    let mut values = Vec::with_capacity(array.len() as usize);
    walk_array_runs(array, runs, |value, inside| {
        if !inside {
            values.push(value);
        }
    });
    ArrayContainer::from_sorted_unchecked(values)
}

fn run_or_array(runs: &RunContainer, array: &ArrayContainer) -> RunContainer {
    let mut builder = RunBuilder::with_capacity(runs.num_runs() as usize + array.len() as usize);
    let mut values = array.iter().map(|v| (u32::from(v), u32::from(v) + 1)).peekable();
    for (start, end) in runs.ranges() {
        while let Some(&(value, next)) = values.peek() {
            if value > start {
                break;
            }
            builder.push_range(value, next);
            values.next();
        }
        builder.push_range(start, end);
    }
    for (value, next) in values {
        builder.push_range(value, next);
    }
    builder.finish()
}
