use std::mem;

use tracing::trace;

use super::index::{merge_join, Merged};
use super::Bitmap;
use crate::container::Container;

/// Handle used to combine bitmaps inside [`Bitmap::lazy_batch`]
///
/// Bitset containers touched through this handle skip cardinality upkeep until
/// the batch ends.
pub struct LazyBitmap<'a> {
    bitmap: &'a mut Bitmap,
}

impl<'a> LazyBitmap<'a> {
    /// Modifies the bitmap this lazy bitmap is associated with to be the union of the two bitmaps.
    ///
    /// # Arguments
    /// * `other` - The other bitmap to union with.
    /// * `force_bitsets` - Whether to force conversions to bitsets when modifying containers
    #[inline]
    pub fn or_inplace(&mut self, other: &Bitmap, force_bitsets: bool) -> &mut Self {
        self.merge(other, |a, b| a.lazy_or_inplace(b, force_bitsets));
        self
    }

    /// Modifies the bitmap this lazy bitmap is associated with to be the xor of the two bitmaps.
    #[inline]
    pub fn xor_inplace(&mut self, other: &Bitmap) -> &mut Self {
        self.merge(other, Container::lazy_xor_inplace);
        self
    }

    // Empty containers are kept until repair, their cardinality may be stale.
    fn merge<F>(&mut self, other: &Bitmap, op: F)
    where
        F: Fn(&mut Container, &Container),
    {
        let target = &mut self.bitmap.high_low_container;
        let containers = mem::take(target);
        for step in merge_join(containers, other.high_low_container.iter()) {
            match step {
                Merged::Left(key, container) => target.push(key, container),
                Merged::Right(key, container) => target.push(key, container.clone()),
                Merged::Both(key, mut container, other) => {
                    op(&mut container, other);
                    target.push(key, container);
                }
            }
        }
    }
}

impl<'a> std::ops::BitOrAssign<&Bitmap> for LazyBitmap<'a> {
    #[inline]
    fn bitor_assign(&mut self, other: &Bitmap) {
        self.or_inplace(other, false);
    }
}

impl<'a> std::ops::BitXorAssign<&Bitmap> for LazyBitmap<'a> {
    #[inline]
    fn bitxor_assign(&mut self, other: &Bitmap) {
        self.xor_inplace(other);
    }
}

impl Bitmap {
    /// Perform multiple bitwise operations on a bitmap.
    ///
    /// The passed closure will be passed a handle which can be used to perform bitwise operations on the bitmap lazily.
    ///
    /// The result will be equivalent to doing the same operations on this bitmap directly, but because of reduced
    /// bookkeeping in between operations, it should be faster
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// // Perform a series of bitwise operations on a bitmap:
    /// let mut bitmap = Bitmap::of(&[99]);
    /// let bitmaps_to_or = [Bitmap::of(&[1, 2, 5, 10]), Bitmap::of(&[1, 30, 100])];
    /// let bitmaps_to_xor = [Bitmap::of(&[5]), Bitmap::of(&[1, 1000, 1001])];
    ///
    /// bitmap.lazy_batch(|lazy| {
    ///     for b in &bitmaps_to_or {
    ///         *lazy |= b;
    ///     }
    ///     for b in &bitmaps_to_xor {
    ///         *lazy ^= b;
    ///     }
    /// });
    /// let mut bitmap2 = Bitmap::of(&[99]);
    /// for b in &bitmaps_to_or {
    ///     bitmap2 |= b;
    /// }
    /// for b in &bitmaps_to_xor {
    ///     bitmap2 ^= b;
    /// }
    /// assert_eq!(bitmap, bitmap2);
    /// assert_eq!(bitmap.to_vec(), [2, 10, 30, 99, 100, 1000, 1001]);
    /// ```
    ///
    /// The result the passed closure is returned from `lazy_batch`
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let mut bitmap = Bitmap::create();
    /// let bitmaps_to_or = [Bitmap::of(&[1, 2, 5, 10]), Bitmap::of(&[1, 30, 100])];
    /// let total_added = bitmap.lazy_batch(|lazy| {
    ///     let mut total = 0;
    ///     for b in &bitmaps_to_or {
    ///         lazy.or_inplace(b, true);
    ///         total += b.cardinality();
    ///     }
    ///     total
    /// });
    /// assert_eq!(total_added, 7);
    /// assert_eq!(bitmap.cardinality(), 6);
    /// ```
    pub fn lazy_batch<F, O>(&mut self, f: F) -> O
    where
        F: FnOnce(&mut LazyBitmap<'_>) -> O,
    {
        let mut lazy_bitmap = LazyBitmap { bitmap: self };
        let result = f(&mut lazy_bitmap);
        self.repair_after_lazy();
        result
    }

    fn repair_after_lazy(&mut self) {
        for container in self.high_low_container.containers_mut() {
            container.repair();
        }
        self.high_low_container.retain_non_empty();
        trace!(
            containers = self.high_low_container.len(),
            "repaired bitmap after lazy operations"
        );
    }

    /// Union of two bitmaps computed through the lazy path
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let bitmap1 = Bitmap::of(&[1, 2, 70_000]);
    /// let bitmap2 = Bitmap::from_range(100..10_000);
    ///
    /// let bitmap3 = bitmap1.lazy_or(&bitmap2, true);
    /// assert_eq!(bitmap3, bitmap1.or(&bitmap2));
    /// ```
    pub fn lazy_or(&self, other: &Bitmap, force_bitsets: bool) -> Bitmap {
        let mut result = self.clone();
        result.lazy_batch(|lazy| {
            lazy.or_inplace(other, force_bitsets);
        });
        result
    }

    /// Symmetric difference of two bitmaps computed through the lazy path
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let bitmap1 = Bitmap::from_range(0..5000);
    /// let bitmap2 = Bitmap::from_range(0..5000);
    ///
    /// assert!(bitmap1.lazy_xor(&bitmap2).is_empty());
    /// ```
    pub fn lazy_xor(&self, other: &Bitmap) -> Bitmap {
        let mut result = self.clone();
        result.lazy_batch(|lazy| {
            lazy.xor_inplace(other);
        });
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lazy_results_match_eager_ones() {
        let sparse = Bitmap::of(&[3, 7, 70_000, 1 << 20]);
        let dense = Bitmap::from_range_with_step(0..200_000, 3);
        let mut runs = Bitmap::from_range(1000..90_000);
        runs.run_optimize();

        let inputs = [&sparse, &dense, &runs];
        for a in inputs {
            for b in inputs {
                assert_eq!(a.lazy_or(b, false), a.or(b));
                assert_eq!(a.lazy_or(b, true), a.or(b));
                assert_eq!(a.lazy_xor(b), a.xor(b));
            }
        }
    }

    #[test]
    fn batch_drops_emptied_containers() {
        let mut bitmap = Bitmap::from_range(0..100_000);
        let other = bitmap.clone();
        bitmap.lazy_batch(|lazy| {
            *lazy ^= &other;
        });
        assert!(bitmap.is_empty());
        assert_eq!(bitmap.statistics().n_containers, 0);
    }

    #[test]
    fn repaired_containers_are_normalized() {
        let mut bitmap = Bitmap::create();
        let small = Bitmap::of(&[1, 2, 3]);
        bitmap.lazy_batch(|lazy| {
            lazy.or_inplace(&small, true);
        });
        let statistics = bitmap.statistics();
        assert_eq!(statistics.n_array_containers, 1);
        assert_eq!(statistics.n_bitset_containers, 0);
        assert_eq!(bitmap.cardinality(), 3);
    }
}
