use std::cmp::{self, Reverse};
use std::collections::BinaryHeap;
use std::mem;
use std::ops::RangeBounds;

use tracing::trace;

use crate::container::{ArrayContainer, Container, CONTAINER_CAPACITY};

use super::index::{merge_join, Merged, RoaringArray};
use super::util::{join, range_to_exclusive, split, split_range};
use super::{Bitmap, Statistics};

impl Bitmap {
    /// Creates a new bitmap (initially empty)
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let bitmap = Bitmap::create();
    ///
    /// assert!(bitmap.is_empty());
    /// ```
    #[inline]
    pub fn create() -> Self {
        Bitmap {
            high_low_container: RoaringArray::new(),
        }
    }

    /// Creates a new bitmap (initially empty) with a provided
    /// container-storage capacity (it is a performance hint).
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let bitmap = Bitmap::create_with_capacity(100_000);
    ///
    /// assert!(bitmap.is_empty());
    /// ```
    #[inline]
    pub fn create_with_capacity(capacity: u32) -> Self {
        let containers = cmp::min(capacity as usize, crate::MAX_CONTAINERS);
        Bitmap {
            high_low_container: RoaringArray::with_capacity(containers),
        }
    }

    /// Creates a new bitmap from a slice of u32 integers
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let elements = vec![1, 2];
    ///
    /// let bitmap = Bitmap::of(&elements);
    ///
    /// let mut bitmap2 = Bitmap::create();
    ///
    /// for element in &elements {
    ///     bitmap2.add(*element);
    /// }
    ///
    /// assert!(bitmap.contains(1));
    /// assert!(bitmap.contains(2));
    /// assert!(!bitmap.contains(3));
    /// assert_eq!(bitmap, bitmap2);
    /// ```
    #[inline]
    pub fn of(elements: &[u32]) -> Self {
        let mut bitmap = Bitmap::create();
        bitmap.add_many(elements);
        bitmap
    }

    /// Create a new bitmap containing every value in `range`
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let bitmap = Bitmap::from_range(10..20);
    /// assert_eq!(bitmap.cardinality(), 10);
    /// assert_eq!(bitmap.minimum(), Some(10));
    /// assert_eq!(bitmap.maximum(), Some(19));
    ///
    /// let bitmap = Bitmap::from_range(u32::MAX - 1..);
    /// assert_eq!(bitmap.to_vec(), [u32::MAX - 1, u32::MAX]);
    /// ```
    #[inline]
    pub fn from_range<R: RangeBounds<u32>>(range: R) -> Self {
        let mut bitmap = Bitmap::create();
        bitmap.add_range(range);
        bitmap
    }

    /// Create a new bitmap with the values `start, start + step, ...` strictly
    /// inside `range`
    ///
    /// # Panics
    ///
    /// If `step` is 0
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let bitmap = Bitmap::from_range_with_step(0..10, 3);
    /// assert_eq!(bitmap.to_vec(), [0, 3, 6, 9]);
    ///
    /// let bitmap = Bitmap::from_range_with_step(..=u32::MAX, 1 << 31);
    /// assert_eq!(bitmap.to_vec(), [0, 1 << 31]);
    ///
    /// let bitmap = Bitmap::from_range_with_step(5..5, 1);
    /// assert!(bitmap.is_empty());
    /// ```
    pub fn from_range_with_step<R: RangeBounds<u32>>(range: R, step: u32) -> Self {
        assert_ne!(step, 0, "step must be at least 1");
        let (start, end) = range_to_exclusive(range);
        let mut bitmap = Bitmap::create();
        if step == 1 {
            bitmap.add_range_exclusive(start, end);
            return bitmap;
        }
        let step = u64::from(step);
        let mut value = start;
        while value < end {
            let key = (value >> 16) as u16;
            let key_end = cmp::min(end, (u64::from(key) + 1) << 16);
            let values: Vec<u16> = (value..key_end)
                .step_by(step as usize)
                .map(|v| v as u16)
                .collect();
            value += values.len() as u64 * step;
            let container = Container::from_array(ArrayContainer::from_sorted_unchecked(values));
            bitmap.high_low_container.push(key, container);
        }
        bitmap
    }

    /// Add the integer element to the bitmap
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let mut bitmap = Bitmap::create();
    /// assert!(bitmap.is_empty());
    /// bitmap.add(1);
    /// assert!(!bitmap.is_empty());
    /// ```
    #[inline]
    pub fn add(&mut self, element: u32) {
        self.add_checked(element);
    }

    /// Add the integer element to the bitmap. Returns true if the value was
    /// added, false if the value was already in the bitmap.
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let mut bitmap = Bitmap::create();
    /// assert!(bitmap.add_checked(1));
    /// assert!(!bitmap.add_checked(1));
    /// ```
    #[inline]
    pub fn add_checked(&mut self, element: u32) -> bool {
        let (key, low) = split(element);
        self.high_low_container.get_or_create(key).add(low)
    }

    /// Add all the integers of the slice to the bitmap
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let mut bitmap = Bitmap::create();
    /// bitmap.add_many(&[1, 2, 3]);
    ///
    /// assert!(!bitmap.is_empty());
    /// assert!(bitmap.contains(1));
    /// assert!(bitmap.contains(2));
    /// assert!(bitmap.contains(3));
    /// ```
    pub fn add_many(&mut self, elements: &[u32]) {
        // consecutive values usually share a container
        let mut cached: Option<(u16, usize)> = None;
        for &element in elements {
            let (key, low) = split(element);
            let index = match cached {
                Some((cached_key, index)) if cached_key == key => index,
                _ => {
                    let index = self.high_low_container.get_or_create_index(key);
                    cached = Some((key, index));
                    index
                }
            };
            self.high_low_container.container_at_mut(index).add(low);
        }
    }

    /// Add all values in range
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let mut bitmap1 = Bitmap::create();
    /// bitmap1.add_range((1..3));
    ///
    /// assert!(!bitmap1.is_empty());
    /// assert!(bitmap1.contains(1));
    /// assert!(bitmap1.contains(2));
    /// assert!(!bitmap1.contains(3));
    ///
    /// let mut bitmap2 = Bitmap::create();
    /// bitmap2.add_range((3..1));
    /// assert!(bitmap2.is_empty());
    ///
    /// let mut bitmap3 = Bitmap::create();
    /// bitmap3.add_range((3..3));
    /// assert!(bitmap3.is_empty());
    ///
    /// let mut bitmap4 = Bitmap::create();
    /// bitmap4.add_range(..=2);
    /// bitmap4.add_range(u32::MAX..=u32::MAX);
    /// assert!(bitmap4.contains(0));
    /// assert!(bitmap4.contains(1));
    /// assert!(bitmap4.contains(2));
    /// assert!(bitmap4.contains(u32::MAX));
    /// assert_eq!(bitmap4.cardinality(), 4);
    /// ```
    #[inline]
    pub fn add_range<R: RangeBounds<u32>>(&mut self, range: R) {
        let (start, end) = range_to_exclusive(range);
        self.add_range_exclusive(start, end);
    }

    fn add_range_exclusive(&mut self, start: u64, end: u64) {
        if start >= end {
            return;
        }
        for (key, low_start, low_end) in split_range(start, end) {
            self.high_low_container
                .get_or_create(key)
                .add_range(low_start, low_end);
        }
    }

    /// Clear the integer element from the bitmap
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let mut bitmap = Bitmap::create();
    /// bitmap.add(1);
    /// bitmap.remove(1);
    ///
    /// assert!(bitmap.is_empty());
    /// ```
    #[inline]
    pub fn remove(&mut self, element: u32) {
        self.remove_checked(element);
    }

    /// Remove the integer element from the bitmap. Returns true if the value
    /// was removed, false if the value was not present in the bitmap.
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let mut bitmap = Bitmap::create();
    /// bitmap.add(1);
    /// assert!(bitmap.remove_checked(1));
    /// assert!(!bitmap.remove_checked(1));
    /// ```
    pub fn remove_checked(&mut self, element: u32) -> bool {
        let (key, low) = split(element);
        let Some(container) = self.high_low_container.get_mut(key) else {
            return false;
        };
        let removed = container.remove(low);
        if container.is_empty() {
            self.high_low_container.remove(key);
        }
        removed
    }

    /// Remove all the integers of the slice from the bitmap
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let mut bitmap = Bitmap::of(&[1, 2, 3, 1 << 20]);
    /// bitmap.remove_many(&[2, 1 << 20, 7]);
    ///
    /// assert_eq!(bitmap.to_vec(), [1, 3]);
    /// ```
    pub fn remove_many(&mut self, elements: &[u32]) {
        for &element in elements {
            self.remove(element);
        }
    }

    /// Remove all values in range
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let mut bitmap = Bitmap::create();
    /// bitmap.add_range((1..4));
    /// assert!(!bitmap.is_empty());
    ///
    /// bitmap.remove_range((1..3));
    ///
    /// assert!(!bitmap.contains(1));
    /// assert!(!bitmap.contains(2));
    /// assert!(bitmap.contains(3));
    ///
    /// bitmap.add_range(u32::MAX..=u32::MAX);
    /// assert!(bitmap.contains(u32::MAX));
    /// bitmap.remove_range(..);
    /// assert!(bitmap.is_empty());
    /// ```
    pub fn remove_range<R: RangeBounds<u32>>(&mut self, range: R) {
        let (start, end) = range_to_exclusive(range);
        if start >= end {
            return;
        }
        for (key, low_start, low_end) in split_range(start, end) {
            let Ok(index) = self.high_low_container.get_index(key) else {
                continue;
            };
            let container = self.high_low_container.container_at_mut(index);
            container.remove_range(low_start, low_end);
            if container.is_empty() {
                self.high_low_container.remove_at(index);
            }
        }
    }

    /// Empties the bitmap
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let mut bitmap = Bitmap::create();
    /// bitmap.add(1);
    /// bitmap.add(2);
    /// bitmap.clear();
    ///
    /// assert!(bitmap.is_empty());
    /// ```
    #[inline]
    pub fn clear(&mut self) {
        self.high_low_container.clear();
    }

    /// Removes and returns the smallest value
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let mut bitmap = Bitmap::of(&[5, 1 << 20]);
    /// assert_eq!(bitmap.pop_first(), Some(5));
    /// assert_eq!(bitmap.pop_first(), Some(1 << 20));
    /// assert_eq!(bitmap.pop_first(), None);
    /// ```
    #[doc(alias = "drop_first")]
    pub fn pop_first(&mut self) -> Option<u32> {
        let first = self.minimum()?;
        self.remove(first);
        Some(first)
    }

    /// Removes and returns the greatest value
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let mut bitmap = Bitmap::of(&[5, 1 << 20]);
    /// assert_eq!(bitmap.pop_last(), Some(1 << 20));
    /// assert_eq!(bitmap.pop_last(), Some(5));
    /// assert_eq!(bitmap.pop_last(), None);
    /// ```
    #[doc(alias = "drop_last")]
    pub fn pop_last(&mut self) -> Option<u32> {
        let last = self.maximum()?;
        self.remove(last);
        Some(last)
    }

    /// Keeps only the values for which `f` returns true
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let mut bitmap = Bitmap::from_range(0..10_000);
    /// bitmap.retain(|v| v % 1000 == 0);
    ///
    /// assert_eq!(bitmap.to_vec(), [0, 1000, 2000, 3000, 4000, 5000, 6000, 7000, 8000, 9000]);
    /// ```
    #[doc(alias = "remove_all")]
    pub fn retain<F: FnMut(u32) -> bool>(&mut self, mut f: F) {
        for (key, container) in self.high_low_container.iter_mut() {
            container.retain(|low| f(join(key, low)));
        }
        self.high_low_container.retain_non_empty();
    }

    /// Contains returns true if the integer element is contained in the bitmap
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let bitmap = Bitmap::of(&[1]);
    ///
    /// assert!(bitmap.contains(1));
    /// assert!(!bitmap.contains(2));
    /// ```
    #[inline]
    pub fn contains(&self, element: u32) -> bool {
        let (key, low) = split(element);
        self.high_low_container
            .get(key)
            .map_or(false, |container| container.contains(low))
    }

    /// Check whether a range of values of range are present
    ///
    /// An empty range is always contained.
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let bitmap = Bitmap::of(&[1, 2]);
    /// assert!(bitmap.contains_range((1..3)));
    ///
    /// let mut bitmap = bitmap.clone();
    /// bitmap.add(u32::MAX - 1);
    /// bitmap.add(u32::MAX);
    /// assert!(bitmap.contains_range((u32::MAX - 1)..=u32::MAX));
    /// assert!(!bitmap.contains_range(0..3));
    /// ```
    pub fn contains_range<R: RangeBounds<u32>>(&self, range: R) -> bool {
        let (start, end) = range_to_exclusive(range);
        if start >= end {
            return true;
        }
        split_range(start, end).all(|(key, low_start, low_end)| {
            self.high_low_container
                .get(key)
                .map_or(false, |container| container.contains_range(low_start, low_end))
        })
    }

    /// Returns number of elements in range
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let bitmap = Bitmap::of(&[1, 3, 4]);
    ///
    /// assert_eq!(bitmap.range_cardinality((..1)), 0);
    /// assert_eq!(bitmap.range_cardinality((..2)), 1);
    /// assert_eq!(bitmap.range_cardinality((2..5)), 2);
    /// assert_eq!(bitmap.range_cardinality((..5)), 3);
    /// assert_eq!(bitmap.range_cardinality((1..=4)), 3);
    /// ```
    pub fn range_cardinality<R: RangeBounds<u32>>(&self, range: R) -> u64 {
        let (start, end) = range_to_exclusive(range);
        if start >= end {
            return 0;
        }
        let first_key = (start >> 16) as u16;
        let last_key = ((end - 1) >> 16) as u16;
        let from = match self.high_low_container.get_index(first_key) {
            Ok(index) | Err(index) => index,
        };
        self.high_low_container
            .iter()
            .skip(from)
            .take_while(|&(key, _)| key <= last_key)
            .map(|(key, container)| {
                let base = u64::from(key) << 16;
                let low_start = start.max(base) - base;
                let low_end = end.min(base + u64::from(CONTAINER_CAPACITY)) - base;
                u64::from(container.count_range(low_start as u32, low_end as u32))
            })
            .sum()
    }

    /// Returns the number of integers contained in the bitmap
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let bitmap = Bitmap::of(&[1]);
    ///
    /// assert_eq!(bitmap.cardinality(), 1);
    ///
    /// let mut bitmap = bitmap.clone();
    ///
    /// bitmap.add(2);
    ///
    /// assert_eq!(bitmap.cardinality(), 2);
    /// ```
    #[inline]
    pub fn cardinality(&self) -> u64 {
        self.high_low_container
            .containers()
            .iter()
            .map(|container| u64::from(container.len()))
            .sum()
    }

    /// Returns true if the Bitmap is empty.
    /// Faster than doing: bitmap.cardinality() == 0)
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let mut bitmap = Bitmap::create();
    ///
    /// assert!(bitmap.is_empty());
    ///
    /// bitmap.add(1);
    ///
    /// assert!(!bitmap.is_empty());
    /// ```
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.high_low_container.is_empty()
    }

    /// And computes the intersection between two bitmaps and returns the result
    /// as a new bitmap
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let bitmap1 = Bitmap::of(&[1]);
    /// let bitmap2 = Bitmap::of(&[1, 2]);
    ///
    /// let bitmap3 = bitmap1.and(&bitmap2);
    ///
    /// assert!(bitmap3.contains(1));
    /// assert!(!bitmap3.contains(2));
    /// ```
    #[inline]
    pub fn and(&self, other: &Self) -> Self {
        self.combine(other, false, false, Container::and)
    }

    /// Computes the intersection between two bitmaps and stores the result
    /// in the current bitmap
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let mut bitmap1 = Bitmap::of(&[15]);
    /// let bitmap2 = Bitmap::of(&[25]);
    /// let mut bitmap3 = Bitmap::of(&[15]);
    /// let bitmap4 = Bitmap::of(&[15, 25]);
    ///
    /// bitmap1.and_inplace(&bitmap2);
    ///
    /// assert_eq!(bitmap1.cardinality(), 0);
    /// assert!(!bitmap1.contains(15));
    /// assert!(!bitmap1.contains(25));
    ///
    /// bitmap3.and_inplace(&bitmap4);
    ///
    /// assert_eq!(bitmap3.cardinality(), 1);
    /// assert!(bitmap3.contains(15));
    /// assert!(!bitmap3.contains(25));
    /// ```
    #[inline]
    pub fn and_inplace(&mut self, other: &Self) {
        self.combine_inplace(other, false, false, Container::and_inplace);
    }

    /// Or computes the union between two bitmaps and returns the result
    /// as a new bitmap
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let bitmap1 = Bitmap::of(&[15]);
    /// let bitmap2 = Bitmap::of(&[25]);
    ///
    /// let bitmap3 = bitmap1.or(&bitmap2);
    ///
    /// assert_eq!(bitmap3.cardinality(), 2);
    /// assert!(bitmap3.contains(15));
    /// assert!(bitmap3.contains(25));
    /// ```
    #[inline]
    pub fn or(&self, other: &Self) -> Self {
        self.combine(other, true, true, Container::or)
    }

    /// Computes the union between two bitmaps and stores the result in
    /// the current bitmap.
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let mut bitmap1 = Bitmap::of(&[15]);
    /// let bitmap2 = Bitmap::of(&[25]);
    ///
    /// bitmap1.or_inplace(&bitmap2);
    ///
    /// assert_eq!(bitmap1.cardinality(), 2);
    /// assert!(bitmap1.contains(15));
    /// assert!(bitmap1.contains(25));
    /// ```
    #[inline]
    pub fn or_inplace(&mut self, other: &Self) {
        self.combine_inplace(other, true, true, Container::or_inplace);
    }

    /// Computes the union between many bitmaps quickly, as opposed to having
    /// to call or() repeatedly. Returns the result as a new bitmap.
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let bitmap1 = Bitmap::of(&[15]);
    /// let bitmap2 = Bitmap::of(&[25]);
    /// let bitmap3 = Bitmap::of(&[35]);
    ///
    /// let bitmap4 = Bitmap::fast_or(&[&bitmap1, &bitmap2, &bitmap3]);
    ///
    /// assert_eq!(bitmap4.cardinality(), 3);
    /// assert!(bitmap4.contains(15));
    /// assert!(bitmap4.contains(25));
    /// assert!(bitmap4.contains(35));
    /// ```
    pub fn fast_or(bitmaps: &[&Bitmap]) -> Self {
        let mut result = Bitmap::create();
        result.lazy_batch(|lazy| {
            for bitmap in bitmaps {
                lazy.or_inplace(bitmap, false);
            }
        });
        result
    }

    /// Compute the union of 'number' bitmaps using a heap. This can
    /// sometimes be faster than Bitmap::fast_or.
    ///
    /// All the containers sharing a key are merged together before the result
    /// container for that key is stored.
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let bitmap1 = Bitmap::of(&[15]);
    /// let bitmap2 = Bitmap::of(&[25]);
    /// let bitmap3 = Bitmap::of(&[35]);
    ///
    /// let bitmap4 = Bitmap::fast_or_heap(&[&bitmap1, &bitmap2, &bitmap3]);
    ///
    /// assert_eq!(bitmap4.cardinality(), 3);
    /// assert!(bitmap4.contains(15));
    /// assert!(bitmap4.contains(25));
    /// assert!(bitmap4.contains(35));
    /// ```
    pub fn fast_or_heap(bitmaps: &[&Bitmap]) -> Self {
        let mut cursors = vec![0; bitmaps.len()];
        let mut heap = BinaryHeap::with_capacity(bitmaps.len());
        for (source, bitmap) in bitmaps.iter().enumerate() {
            if let Some(&key) = bitmap.high_low_container.keys().first() {
                heap.push(Reverse((key, source)));
            }
        }

        let mut result = RoaringArray::new();
        while let Some(Reverse((key, source))) = heap.pop() {
            let mut container = bitmaps[source]
                .high_low_container
                .container_at(cursors[source])
                .clone();
            advance_heap_cursor(&mut heap, &mut cursors, bitmaps, source);

            let mut merged = false;
            while let Some(&Reverse((next_key, source))) = heap.peek() {
                if next_key != key {
                    break;
                }
                heap.pop();
                let other = bitmaps[source]
                    .high_low_container
                    .container_at(cursors[source]);
                container.lazy_or_inplace(other, true);
                merged = true;
                advance_heap_cursor(&mut heap, &mut cursors, bitmaps, source);
            }
            if merged {
                container.repair();
            }
            result.push(key, container);
        }
        Bitmap {
            high_low_container: result,
        }
    }

    /// Computes the symmetric difference (xor) between two bitmaps
    /// and returns new bitmap.
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let bitmap1 = Bitmap::of(&[15, 25]);
    /// let bitmap2 = Bitmap::of(&[25, 35]);
    ///
    /// let bitmap3 = bitmap1.xor(&bitmap2);
    ///
    /// assert_eq!(bitmap3.cardinality(), 2);
    /// assert!(bitmap3.contains(15));
    /// assert!(!bitmap3.contains(25));
    /// assert!(bitmap3.contains(35));
    /// ```
    #[inline]
    pub fn xor(&self, other: &Self) -> Self {
        self.combine(other, true, true, Container::xor)
    }

    /// Inplace version of xor, stores result in current bitmap.
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let mut bitmap1 = Bitmap::of(&[15, 25]);
    /// let bitmap2 = Bitmap::of(&[25, 35]);
    ///
    /// bitmap1.xor_inplace(&bitmap2);
    ///
    /// assert_eq!(bitmap1.cardinality(), 2);
    /// assert!(bitmap1.contains(15));
    /// assert!(!bitmap1.contains(25));
    /// assert!(bitmap1.contains(35));
    /// ```
    #[inline]
    pub fn xor_inplace(&mut self, other: &Self) {
        self.combine_inplace(other, true, true, Container::xor_inplace);
    }

    /// Computes the symmetric difference (xor) between multiple bitmaps
    /// and returns new bitmap as a result.
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let bitmap1 = Bitmap::of(&[15, 25]);
    /// let bitmap2 = Bitmap::of(&[25, 35]);
    ///
    /// let bitmap3 = Bitmap::fast_xor(&[&bitmap1, &bitmap2]);
    ///
    /// assert_eq!(bitmap3.cardinality(), 2);
    /// assert!(bitmap3.contains(15));
    /// assert!(!bitmap3.contains(25));
    /// assert!(bitmap3.contains(35));
    /// ```
    pub fn fast_xor(bitmaps: &[&Bitmap]) -> Self {
        let mut result = Bitmap::create();
        result.lazy_batch(|lazy| {
            for bitmap in bitmaps {
                lazy.xor_inplace(bitmap);
            }
        });
        result
    }

    /// Computes the difference between two bitmaps and returns the result.
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let bitmap1 = Bitmap::of(&[15, 25]);
    /// let bitmap2 = Bitmap::of(&[25, 35]);
    ///
    /// let bitmap3 = bitmap1.andnot(&bitmap2);
    ///
    /// assert_eq!(bitmap3.cardinality(), 1);
    /// assert!(bitmap3.contains(15));
    /// assert!(!bitmap3.contains(25));
    /// assert!(!bitmap3.contains(35));
    /// ```
    #[inline]
    pub fn andnot(&self, other: &Self) -> Self {
        self.combine(other, true, false, Container::andnot)
    }

    /// Computes the difference between two bitmaps and stores the result
    /// in the current bitmap.
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let mut bitmap1 = Bitmap::of(&[15, 25]);
    /// let bitmap2 = Bitmap::of(&[25, 35]);
    ///
    /// bitmap1.andnot_inplace(&bitmap2);
    ///
    /// assert_eq!(bitmap1.cardinality(), 1);
    /// assert!(bitmap1.contains(15));
    /// assert!(!bitmap1.contains(25));
    /// assert!(!bitmap1.contains(35));
    ///
    /// let mut bitmap3 = Bitmap::of(&[15]);
    /// let bitmap4 = Bitmap::create();
    /// bitmap3.andnot_inplace(&bitmap4);
    /// assert_eq!(bitmap3.cardinality(), 1);
    /// assert!(bitmap3.contains(15));
    /// ```
    #[inline]
    pub fn andnot_inplace(&mut self, other: &Self) {
        self.combine_inplace(other, true, false, Container::andnot_inplace);
    }

    /// Merge join producing a new bitmap. Containers only present on one side
    /// are copied when `keep_left`/`keep_right` is set.
    fn combine<F>(&self, other: &Self, keep_left: bool, keep_right: bool, op: F) -> Self
    where
        F: Fn(&Container, &Container) -> Container,
    {
        let capacity = cmp::max(
            self.high_low_container.len(),
            other.high_low_container.len(),
        );
        let mut result = RoaringArray::with_capacity(capacity);
        for step in merge_join(self.high_low_container.iter(), other.high_low_container.iter()) {
            match step {
                Merged::Left(key, container) if keep_left => result.push(key, container.clone()),
                Merged::Right(key, container) if keep_right => {
                    result.push(key, container.clone())
                }
                Merged::Both(key, a, b) => result.push_non_empty(key, op(a, b)),
                _ => {}
            }
        }
        Bitmap {
            high_low_container: result,
        }
    }

    fn combine_inplace<F>(&mut self, other: &Self, keep_left: bool, keep_right: bool, op: F)
    where
        F: Fn(&mut Container, &Container),
    {
        let containers = mem::take(&mut self.high_low_container);
        let result = &mut self.high_low_container;
        for step in merge_join(containers, other.high_low_container.iter()) {
            match step {
                Merged::Left(key, container) if keep_left => result.push(key, container),
                Merged::Right(key, container) if keep_right => {
                    result.push(key, container.clone())
                }
                Merged::Both(key, mut a, b) => {
                    op(&mut a, b);
                    result.push_non_empty(key, a);
                }
                _ => {}
            }
        }
    }

    /// Negates the bits in the given range
    /// any integer present in this range and in the bitmap is removed.
    /// Returns result as a new bitmap.
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let bitmap1 = Bitmap::of(&[4]);
    ///
    /// let bitmap2 = bitmap1.flip(1..3);
    ///
    /// assert_eq!(bitmap2.cardinality(), 3);
    /// assert!(bitmap2.contains(1));
    /// assert!(bitmap2.contains(2));
    /// assert!(!bitmap2.contains(3));
    /// assert!(bitmap2.contains(4));
    ///
    /// let bitmap3 = bitmap1.flip(1..=5);
    /// assert_eq!(bitmap3.to_vec(), [1, 2, 3, 5])
    /// ```
    #[inline]
    pub fn flip<R: RangeBounds<u32>>(&self, range: R) -> Self {
        let mut result = self.clone();
        result.flip_inplace(range);
        result
    }

    /// Negates the bits in the given range
    /// any integer present in this range and in the bitmap is removed.
    /// Stores the result in the current bitmap.
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let mut bitmap1 = Bitmap::of(&[4]);
    /// bitmap1.flip_inplace(1..3);
    ///
    /// assert_eq!(bitmap1.cardinality(), 3);
    /// assert!(bitmap1.contains(1));
    /// assert!(bitmap1.contains(2));
    /// assert!(!bitmap1.contains(3));
    /// assert!(bitmap1.contains(4));
    /// bitmap1.flip_inplace(4..=4);
    /// assert_eq!(bitmap1.to_vec(), [1, 2]);
    /// ```
    pub fn flip_inplace<R: RangeBounds<u32>>(&mut self, range: R) {
        let (start, end) = range_to_exclusive(range);
        if start >= end {
            return;
        }
        for (key, low_start, low_end) in split_range(start, end) {
            let index = self.high_low_container.get_or_create_index(key);
            let container = self.high_low_container.container_at_mut(index);
            container.flip_range(low_start, low_end);
            if container.is_empty() {
                self.high_low_container.remove_at(index);
            }
        }
    }

    /// Returns a vector containing all of the integers stored in the Bitmap
    /// in sorted order.
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let bitmap = Bitmap::of(&[15, 25]);
    ///
    /// assert_eq!(bitmap.to_vec(), [15, 25]);
    /// ```
    pub fn to_vec(&self) -> Vec<u32> {
        let mut values = Vec::with_capacity(self.cardinality() as usize);
        values.extend(self.iter());
        values
    }

    /// Compresses of the bitmap. Returns true if at least one container is
    /// run encoded afterwards.
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::{Bitmap, Portable};
    ///
    /// let mut bitmap: Bitmap = (100..1000).collect();
    ///
    /// assert_eq!(bitmap.cardinality(), 900);
    /// let old_size = bitmap.get_serialized_size_in_bytes::<Portable>();
    /// assert!(bitmap.run_optimize());
    /// let new_size = bitmap.get_serialized_size_in_bytes::<Portable>();
    /// assert!(new_size < old_size);
    /// ```
    pub fn run_optimize(&mut self) -> bool {
        let mut has_run = false;
        for container in self.high_low_container.containers_mut() {
            has_run |= container.run_optimize();
        }
        trace!(
            containers = self.high_low_container.len(),
            has_run,
            "run optimized bitmap"
        );
        has_run
    }

    /// Removes run-length encoding even when it is more space efficient. Returns
    /// true if a change was applied.
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let mut bitmap: Bitmap = (100..1000).collect();
    ///
    /// assert_eq!(bitmap.cardinality(), 900);
    ///
    /// bitmap.run_optimize();
    ///
    /// assert!(bitmap.remove_run_compression());
    /// assert!(!bitmap.remove_run_compression());
    /// ```
    pub fn remove_run_compression(&mut self) -> bool {
        let mut changed = false;
        for container in self.high_low_container.containers_mut() {
            changed |= container.remove_run_compression();
        }
        trace!(
            containers = self.high_low_container.len(),
            changed,
            "removed run compression"
        );
        changed
    }

    /// Reallocates the memory to shrink the memory usage. Returns the number
    /// of bytes saved.
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let mut bitmap = Bitmap::create_with_capacity(10);
    /// bitmap.add(10);
    /// assert!(bitmap.shrink_to_fit() > 0);
    /// assert_eq!(bitmap.shrink_to_fit(), 0);
    /// ```
    #[inline]
    pub fn shrink_to_fit(&mut self) -> usize {
        self.high_low_container.shrink_to_fit()
    }

    /// Return true if all the elements of Self are in &other.
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let bitmap1: Bitmap = (5..10).collect();
    /// let bitmap2: Bitmap = (5..8).collect();
    /// let bitmap3: Bitmap = (5..10).collect();
    /// let bitmap4: Bitmap = (9..11).collect();
    ///
    /// assert!(bitmap2.is_subset(&bitmap1));
    /// assert!(bitmap3.is_subset(&bitmap1));
    /// assert!(!bitmap4.is_subset(&bitmap1));
    /// ```
    pub fn is_subset(&self, other: &Self) -> bool {
        if self.high_low_container.len() > other.high_low_container.len() {
            return false;
        }
        merge_join(self.high_low_container.iter(), other.high_low_container.iter()).all(|step| {
            match step {
                Merged::Left(..) => false,
                Merged::Right(..) => true,
                Merged::Both(_, a, b) => a.is_subset(b),
            }
        })
    }

    /// Return true if all the elements of Self are in &other and &other is strictly greater
    /// than Self.
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let bitmap1: Bitmap = (5..9).collect();
    /// let bitmap2: Bitmap = (5..8).collect();
    /// let bitmap3: Bitmap = (5..10).collect();
    /// let bitmap4: Bitmap = (9..11).collect();
    ///
    /// assert!(bitmap2.is_strict_subset(&bitmap1));
    /// assert!(!bitmap1.is_strict_subset(&bitmap1));
    /// assert!(!bitmap3.is_strict_subset(&bitmap1));
    /// assert!(!bitmap4.is_strict_subset(&bitmap1));
    /// ```
    #[inline]
    pub fn is_strict_subset(&self, other: &Self) -> bool {
        self.is_subset(other) && self.cardinality() < other.cardinality()
    }

    /// Return true if Self and &other intersect
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let bitmap1: Bitmap = (1..5).collect();
    /// let bitmap2: Bitmap = (5..9).collect();
    /// let bitmap3: Bitmap = (3..7).collect();
    ///
    /// assert_eq!(bitmap1.intersect(&bitmap2), false);
    /// assert_eq!(bitmap1.intersect(&bitmap3), true);
    /// assert_eq!(bitmap2.intersect(&bitmap3), true);
    /// ```
    pub fn intersect(&self, other: &Self) -> bool {
        merge_join(self.high_low_container.iter(), other.high_low_container.iter())
            .any(|step| matches!(step, Merged::Both(_, a, b) if a.intersects(b)))
    }

    /// Return true if Self and &other have no value in common
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let bitmap1: Bitmap = (1..5).collect();
    /// let bitmap2: Bitmap = (5..9).collect();
    ///
    /// assert!(bitmap1.is_disjoint(&bitmap2));
    /// assert!(!bitmap1.is_disjoint(&bitmap1));
    /// ```
    #[inline]
    pub fn is_disjoint(&self, other: &Self) -> bool {
        !self.intersect(other)
    }

    /// Return the Jaccard index between Self and &other
    ///
    /// The index of two empty bitmaps is undefined, and returned as `NaN`.
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let bitmap1: Bitmap = (1..5).collect();
    /// let bitmap2: Bitmap = (5..9).collect();
    /// let bitmap3: Bitmap = (3..9).collect();
    ///
    /// assert_eq!(bitmap1.jaccard_index(&bitmap2), 0.0);
    /// assert_eq!(bitmap1.jaccard_index(&bitmap3), 0.25);
    /// assert_eq!(bitmap2.jaccard_index(&bitmap3), 0.6666666666666666);
    /// assert!(Bitmap::create().jaccard_index(&Bitmap::create()).is_nan());
    /// ```
    pub fn jaccard_index(&self, other: &Self) -> f64 {
        let intersection = self.and_cardinality(other);
        let union = self.cardinality() + other.cardinality() - intersection;
        intersection as f64 / union as f64
    }

    /// Return the size of the intersection between Self and &other
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let bitmap1 = Bitmap::of(&[1]);
    /// let bitmap2 = Bitmap::of(&[1, 2]);
    ///
    /// assert_eq!(bitmap1.and_cardinality(&bitmap2), 1);
    /// ```
    pub fn and_cardinality(&self, other: &Self) -> u64 {
        merge_join(self.high_low_container.iter(), other.high_low_container.iter())
            .map(|step| match step {
                Merged::Both(_, a, b) => u64::from(a.and_cardinality(b)),
                _ => 0,
            })
            .sum()
    }

    /// Return the size of the union between Self and &other
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let bitmap1 = Bitmap::of(&[15]);
    /// let bitmap2 = Bitmap::of(&[25]);
    ///
    /// assert_eq!(bitmap1.or_cardinality(&bitmap2), 2);
    /// ```
    #[inline]
    pub fn or_cardinality(&self, other: &Self) -> u64 {
        self.cardinality() + other.cardinality() - self.and_cardinality(other)
    }

    /// Return the size of the difference between Self and &other
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let bitmap1 = Bitmap::of(&[15, 25]);
    /// let bitmap2 = Bitmap::of(&[25, 35]);
    ///
    /// assert_eq!(bitmap1.andnot_cardinality(&bitmap2), 1);
    /// ```
    #[inline]
    pub fn andnot_cardinality(&self, other: &Self) -> u64 {
        self.cardinality() - self.and_cardinality(other)
    }

    /// Return the size of the symmetric difference between Self and &other
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let bitmap1 = Bitmap::of(&[15, 25]);
    /// let bitmap2 = Bitmap::of(&[25, 35]);
    ///
    /// assert_eq!(bitmap1.xor_cardinality(&bitmap2), 2);
    /// ```
    #[inline]
    pub fn xor_cardinality(&self, other: &Self) -> u64 {
        self.cardinality() + other.cardinality() - 2 * self.and_cardinality(other)
    }

    /// Returns the smallest value in the set.
    ///
    /// Returns `None` if the set is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let mut bitmap: Bitmap = (5..10).collect();
    /// let empty_bitmap: Bitmap = Bitmap::create();
    ///
    /// assert_eq!(bitmap.minimum(), Some(5));
    /// assert_eq!(empty_bitmap.minimum(), None);
    ///
    /// bitmap.add(3);
    ///
    /// assert_eq!(bitmap.minimum(), Some(3));
    /// ```
    #[inline]
    pub fn minimum(&self) -> Option<u32> {
        let (key, container) = self.high_low_container.iter().next()?;
        container.min().map(|low| join(key, low))
    }

    /// Returns the greatest value in the set.
    ///
    /// Returns `None` if the set is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let mut bitmap: Bitmap = (5..10).collect();
    /// let empty_bitmap: Bitmap = Bitmap::create();
    ///
    /// assert_eq!(bitmap.maximum(), Some(9));
    /// assert_eq!(empty_bitmap.maximum(), None);
    ///
    /// bitmap.add(15);
    ///
    /// assert_eq!(bitmap.maximum(), Some(15));
    /// ```
    #[inline]
    pub fn maximum(&self) -> Option<u32> {
        let (key, container) = self.high_low_container.iter().next_back()?;
        container.max().map(|low| join(key, low))
    }

    /// Rank returns the number of values smaller or equal to x.
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let mut bitmap: Bitmap = (5..10).collect();
    ///
    /// assert_eq!(bitmap.rank(4), 0);
    /// assert_eq!(bitmap.rank(8), 4);
    ///
    /// bitmap.add(15);
    ///
    /// assert_eq!(bitmap.rank(11), 5);
    /// assert_eq!(bitmap.rank(15), 6);
    /// ```
    pub fn rank(&self, x: u32) -> u64 {
        let (key, low) = split(x);
        let mut rank = 0;
        for (container_key, container) in self.high_low_container.iter() {
            match container_key.cmp(&key) {
                cmp::Ordering::Less => rank += u64::from(container.len()),
                cmp::Ordering::Equal => {
                    rank += u64::from(container.rank(low));
                    break;
                }
                cmp::Ordering::Greater => break,
            }
        }
        rank
    }

    /// Select returns the element having the designated rank, if it exists
    /// If the size of the roaring bitmap is strictly greater than rank,
    /// then this function returns element of given rank wrapped in Some.
    /// Otherwise, it returns None.
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let bitmap: Bitmap = (5..10).collect();
    ///
    /// assert_eq!(bitmap.select(0), Some(5));
    /// assert_eq!(bitmap.select(1), Some(6));
    /// assert_eq!(bitmap.select(2), Some(7));
    /// assert_eq!(bitmap.select(3), Some(8));
    /// assert_eq!(bitmap.select(4), Some(9));
    /// assert_eq!(bitmap.select(5), None);
    /// ```
    pub fn select(&self, rank: u32) -> Option<u32> {
        let mut remaining = rank;
        for (key, container) in self.high_low_container.iter() {
            let len = container.len();
            if remaining < len {
                return container.select(remaining).map(|low| join(key, low));
            }
            remaining -= len;
        }
        None
    }

    /// Returns statistics about the composition of a roaring bitmap.
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let mut bitmap: Bitmap = (1..100).collect();
    /// let statistics = bitmap.statistics();
    ///
    /// assert_eq!(statistics.n_containers, 1);
    /// assert_eq!(statistics.n_array_containers, 1);
    /// assert_eq!(statistics.n_run_containers, 0);
    /// assert_eq!(statistics.n_bitset_containers, 0);
    /// assert_eq!(statistics.n_values_array_containers, 99);
    /// assert_eq!(statistics.n_values_run_containers, 0);
    /// assert_eq!(statistics.n_values_bitset_containers, 0);
    /// assert_eq!(statistics.n_bytes_array_containers, 198);
    /// assert_eq!(statistics.n_bytes_run_containers, 0);
    /// assert_eq!(statistics.n_bytes_bitset_containers, 0);
    /// assert_eq!(statistics.max_value, 99);
    /// assert_eq!(statistics.min_value, 1);
    /// assert_eq!(statistics.sum_value, 4950);
    /// assert_eq!(statistics.cardinality, 99);
    ///
    /// bitmap.run_optimize();
    /// let statistics = bitmap.statistics();
    ///
    /// assert_eq!(statistics.n_containers, 1);
    /// assert_eq!(statistics.n_array_containers, 0);
    /// assert_eq!(statistics.n_run_containers, 1);
    /// assert_eq!(statistics.n_bitset_containers, 0);
    /// assert_eq!(statistics.n_values_array_containers, 0);
    /// assert_eq!(statistics.n_values_run_containers, 99);
    /// assert_eq!(statistics.n_values_bitset_containers, 0);
    /// assert_eq!(statistics.n_bytes_array_containers, 0);
    /// assert_eq!(statistics.n_bytes_run_containers, 6);
    /// assert_eq!(statistics.n_bytes_bitset_containers, 0);
    /// assert_eq!(statistics.max_value, 99);
    /// assert_eq!(statistics.min_value, 1);
    /// assert_eq!(statistics.sum_value, 4950);
    /// assert_eq!(statistics.cardinality, 99);
    /// ```
    pub fn statistics(&self) -> Statistics {
        let mut statistics = Statistics {
            min_value: self.minimum().unwrap_or(u32::MAX),
            max_value: self.maximum().unwrap_or(0),
            ..Statistics::default()
        };
        for (key, container) in self.high_low_container.iter() {
            let values = u64::from(container.len());
            let bytes = container.size_in_bytes() as u64;
            statistics.n_containers += 1;
            statistics.cardinality += values;
            statistics.sum_value += container
                .iter()
                .map(|low| u64::from(join(key, low)))
                .sum::<u64>();
            match container {
                Container::Array(_) => {
                    statistics.n_array_containers += 1;
                    statistics.n_values_array_containers += values;
                    statistics.n_bytes_array_containers += bytes;
                }
                Container::Bitset(_) => {
                    statistics.n_bitset_containers += 1;
                    statistics.n_values_bitset_containers += values;
                    statistics.n_bytes_bitset_containers += bytes;
                }
                Container::Run(_) => {
                    statistics.n_run_containers += 1;
                    statistics.n_values_run_containers += values;
                    statistics.n_bytes_run_containers += bytes;
                }
            }
        }
        statistics
    }

    /// Polynomial hash (`h = h * 31 + value`, wrapping) of the values in
    /// ascending order.
    ///
    /// Equal bitmaps hash equally regardless of their internal representation.
    /// This walks every value, so callers comparing often should cache it.
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let bitmap = Bitmap::from_range_with_step(0..100, 2);
    /// assert_eq!(bitmap.content_hash(), 3801178162);
    ///
    /// let mut optimized = bitmap.clone();
    /// optimized.run_optimize();
    /// assert_eq!(optimized.content_hash(), bitmap.content_hash());
    /// assert_eq!(Bitmap::of(&[1, 2, 3]).content_hash(), 1026);
    /// ```
    pub fn content_hash(&self) -> u32 {
        self.iter()
            .fold(0u32, |hash, value| hash.wrapping_mul(31).wrapping_add(value))
    }
}

fn advance_heap_cursor(
    heap: &mut BinaryHeap<Reverse<(u16, usize)>>,
    cursors: &mut [usize],
    bitmaps: &[&Bitmap],
    source: usize,
) {
    cursors[source] += 1;
    if let Some(&key) = bitmaps[source]
        .high_low_container
        .keys()
        .get(cursors[source])
    {
        heap.push(Reverse((key, source)));
    }
}
