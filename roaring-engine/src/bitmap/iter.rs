use std::iter::{FromIterator, FusedIterator, IntoIterator};

use crate::container::ContainerIter;

use super::index::RoaringArray;
use super::util::split;
use super::Bitmap;

/// Ascending iterator over the values of a [`Bitmap`]
#[derive(Clone)]
pub struct BitmapIterator<'a> {
    containers: &'a RoaringArray,
    /// Index of the container after the one being walked
    next_index: usize,
    key: u32,
    current: Option<ContainerIter<'a>>,
}

impl<'a> BitmapIterator<'a> {
    fn new(bitmap: &'a Bitmap) -> Self {
        let mut iter = BitmapIterator {
            containers: &bitmap.high_low_container,
            next_index: 0,
            key: 0,
            current: None,
        };
        iter.enter_container(0, None);
        iter
    }

    /// Starts walking the container at `index`, from `low` if given
    fn enter_container(&mut self, index: usize, low: Option<u16>) {
        if index >= self.containers.len() {
            self.next_index = self.containers.len();
            self.current = None;
            return;
        }
        let container = self.containers.container_at(index);
        self.key = u32::from(self.containers.key_at(index)) << 16;
        self.current = Some(match low {
            Some(low) => container.iter_from(low),
            None => container.iter(),
        });
        self.next_index = index + 1;
    }

    /// Attempt to read many values from the iterator into `dst`
    ///
    /// Returns the number of items read from the iterator, may be `< dst.len()` iff
    /// the iterator is exhausted.
    ///
    /// This can be much more efficient than repeated iteration.
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let mut bitmap: Bitmap = Bitmap::create();
    /// bitmap.add_range(0..100);
    /// bitmap.add(222);
    /// bitmap.add(555);
    ///
    /// let mut buf = [0; 100];
    /// let mut iter = bitmap.iter();
    /// assert_eq!(iter.next_many(&mut buf), 100);
    /// // Get the first 100 items, from the original range added
    /// for (i, item) in buf.iter().enumerate() {
    ///     assert_eq!(*item, i as u32);
    /// }
    /// // Calls to next_many() can be interleaved with calls to next()
    /// assert_eq!(iter.next(), Some(222));
    /// assert_eq!(iter.next_many(&mut buf), 1);
    /// assert_eq!(buf[0], 555);
    ///
    /// assert_eq!(iter.next(), None);
    /// assert_eq!(iter.next_many(&mut buf), 0);
    /// ```
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// fn print_by_chunks(bitmap: &Bitmap) {
    ///     let mut buf = [0; 1024];
    ///     let mut iter = bitmap.iter();
    ///     loop {
    ///         let n = iter.next_many(&mut buf);
    ///         if n == 0 {
    ///             break;
    ///         }
    ///         println!("{:?}", &buf[..n]);
    ///     }
    /// }
    ///
    /// # print_by_chunks(&Bitmap::of(&[1, 2, 8, 20, 1000]));
    /// ```
    pub fn next_many(&mut self, dst: &mut [u32]) -> usize {
        let mut filled = 0;
        while filled < dst.len() {
            let Some(current) = self.current.as_mut() else {
                break;
            };
            let key = self.key;
            for (slot, low) in dst[filled..].iter_mut().zip(current.by_ref()) {
                *slot = key | u32::from(low);
                filled += 1;
            }
            if filled < dst.len() {
                self.enter_container(self.next_index, None);
            }
        }
        filled
    }

    /// Reset the iterator to the first value `>= val`
    ///
    /// This can move the iterator forwards or backwards.
    ///
    /// # Examples
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let mut bitmap = Bitmap::of(&[0, 1, 100, 1000, u32::MAX]);
    /// let mut iter = bitmap.iter();
    /// iter.reset_at_or_after(0);
    /// assert_eq!(iter.next(), Some(0));
    /// iter.reset_at_or_after(0);
    /// assert_eq!(iter.next(), Some(0));
    ///
    /// iter.reset_at_or_after(101);
    /// assert_eq!(iter.next(), Some(1000));
    /// assert_eq!(iter.next(), Some(u32::MAX));
    /// assert_eq!(iter.next(), None);
    /// iter.reset_at_or_after(u32::MAX);
    /// assert_eq!(iter.next(), Some(u32::MAX));
    /// assert_eq!(iter.next(), None);
    /// ```
    pub fn reset_at_or_after(&mut self, val: u32) {
        let (key, low) = split(val);
        match self.containers.get_index(key) {
            Ok(index) => self.enter_container(index, Some(low)),
            Err(index) => self.enter_container(index, None),
        }
    }
}

impl<'a> Iterator for BitmapIterator<'a> {
    type Item = u32;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let current = self.current.as_mut()?;
            if let Some(low) = current.next() {
                return Some(self.key | u32::from(low));
            }
            self.enter_container(self.next_index, None);
        }
    }
}

impl FusedIterator for BitmapIterator<'_> {}

impl Bitmap {
    /// Returns an iterator over each value stored in the bitmap.
    /// Returned values are ordered in ascending order.
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let mut bitmap = Bitmap::create();
    /// bitmap.add(4);
    /// bitmap.add(3);
    /// bitmap.add(2);
    /// let mut iterator = bitmap.iter();
    ///
    /// assert_eq!(iterator.next(), Some(2));
    /// assert_eq!(iterator.next(), Some(3));
    /// assert_eq!(iterator.next(), Some(4));
    /// assert_eq!(iterator.next(), None);
    /// ```
    #[inline]
    pub fn iter(&self) -> BitmapIterator<'_> {
        BitmapIterator::new(self)
    }
}

impl<'a> IntoIterator for &'a Bitmap {
    type Item = u32;
    type IntoIter = BitmapIterator<'a>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<u32> for Bitmap {
    /// Convenience method for creating bitmap from iterator.
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::Bitmap;
    ///
    /// let bitmap: Bitmap = (1..3).collect();
    ///
    /// assert!(!bitmap.is_empty());
    /// assert!(bitmap.contains(1));
    /// assert!(bitmap.contains(2));
    /// assert_eq!(bitmap.cardinality(), 2);
    /// ```
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        let mut bitmap = Bitmap::create();
        bitmap.extend(iter);
        bitmap
    }
}

impl<'a> FromIterator<&'a u32> for Bitmap {
    fn from_iter<I: IntoIterator<Item = &'a u32>>(iter: I) -> Self {
        iter.into_iter().copied().collect()
    }
}

impl Extend<u32> for Bitmap {
    fn extend<T: IntoIterator<Item = u32>>(&mut self, iter: T) {
        let values: Vec<u32> = iter.into_iter().collect();
        self.add_many(&values);
    }
}

impl<'a> Extend<&'a u32> for Bitmap {
    fn extend<T: IntoIterator<Item = &'a u32>>(&mut self, iter: T) {
        self.extend(iter.into_iter().copied());
    }
}
