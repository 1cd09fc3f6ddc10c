use std::cmp::Ordering;
use std::iter::{Peekable, Zip};
use std::mem;
use std::slice;
use std::vec;

use crate::container::Container;

/// Sorted mapping from the high 16 bits of a value to the container holding
/// its low 16 bits.
///
/// Keys are strictly increasing. Outside of a lazy batch no container is empty.
#[derive(Clone, Default)]
pub(crate) struct RoaringArray {
    keys: Vec<u16>,
    containers: Vec<Container>,
}

impl RoaringArray {
    #[inline]
    pub const fn new() -> Self {
        Self {
            keys: Vec::new(),
            containers: Vec::new(),
        }
    }

    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            keys: Vec::with_capacity(capacity),
            containers: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    #[inline]
    pub fn keys(&self) -> &[u16] {
        &self.keys
    }

    #[inline]
    pub fn containers(&self) -> &[Container] {
        &self.containers
    }

    #[inline]
    pub fn containers_mut(&mut self) -> &mut [Container] {
        &mut self.containers
    }

    #[inline]
    pub fn get_index(&self, key: u16) -> Result<usize, usize> {
        self.keys.binary_search(&key)
    }

    #[inline]
    pub fn get(&self, key: u16) -> Option<&Container> {
        let index = self.get_index(key).ok()?;
        Some(&self.containers[index])
    }

    #[inline]
    pub fn get_mut(&mut self, key: u16) -> Option<&mut Container> {
        let index = self.get_index(key).ok()?;
        Some(&mut self.containers[index])
    }

    /// Index of the container for `key`, inserting an empty one if absent
    pub fn get_or_create_index(&mut self, key: u16) -> usize {
        match self.get_index(key) {
            Ok(index) => index,
            Err(index) => {
                self.insert_at(index, key, Container::new());
                index
            }
        }
    }

    #[inline]
    pub fn get_or_create(&mut self, key: u16) -> &mut Container {
        let index = self.get_or_create_index(key);
        &mut self.containers[index]
    }

    #[inline]
    pub fn key_at(&self, index: usize) -> u16 {
        self.keys[index]
    }

    #[inline]
    pub fn container_at(&self, index: usize) -> &Container {
        &self.containers[index]
    }

    #[inline]
    pub fn container_at_mut(&mut self, index: usize) -> &mut Container {
        &mut self.containers[index]
    }

    #[inline]
    pub fn insert_at(&mut self, index: usize, key: u16, container: Container) {
        debug_assert!(index == 0 || self.keys[index - 1] < key);
        debug_assert!(index == self.keys.len() || key < self.keys[index]);
        self.keys.insert(index, key);
        self.containers.insert(index, container);
    }

    pub fn remove(&mut self, key: u16) -> Option<Container> {
        let index = self.get_index(key).ok()?;
        Some(self.remove_at(index))
    }

    #[inline]
    pub fn remove_at(&mut self, index: usize) -> Container {
        self.keys.remove(index);
        self.containers.remove(index)
    }

    /// Appends a container, `key` must be greater than every key present
    #[inline]
    pub fn push(&mut self, key: u16, container: Container) {
        debug_assert!(self.keys.last().map_or(true, |&last| last < key));
        self.keys.push(key);
        self.containers.push(container);
    }

    #[inline]
    pub fn push_non_empty(&mut self, key: u16, container: Container) {
        if !container.is_empty() {
            self.push(key, container);
        }
    }

    pub fn retain_non_empty(&mut self) {
        let mut write = 0;
        for read in 0..self.keys.len() {
            if !self.containers[read].is_empty() {
                self.keys.swap(write, read);
                self.containers.swap(write, read);
                write += 1;
            }
        }
        self.keys.truncate(write);
        self.containers.truncate(write);
    }

    #[inline]
    pub fn clear(&mut self) {
        self.keys.clear();
        self.containers.clear();
    }

    /// Bytes released
    pub fn shrink_to_fit(&mut self) -> usize {
        let mut released = (self.keys.capacity() - self.keys.len()) * mem::size_of::<u16>()
            + (self.containers.capacity() - self.containers.len()) * mem::size_of::<Container>();
        self.keys.shrink_to_fit();
        self.containers.shrink_to_fit();
        for container in &mut self.containers {
            released += container.shrink_to_fit();
        }
        released
    }

    #[inline]
    pub fn iter(&self) -> Zip<std::iter::Copied<slice::Iter<'_, u16>>, slice::Iter<'_, Container>> {
        self.keys.iter().copied().zip(self.containers.iter())
    }

    #[inline]
    pub fn iter_mut(
        &mut self,
    ) -> Zip<std::iter::Copied<slice::Iter<'_, u16>>, slice::IterMut<'_, Container>> {
        self.keys.iter().copied().zip(self.containers.iter_mut())
    }
}

impl IntoIterator for RoaringArray {
    type Item = (u16, Container);
    type IntoIter = Zip<vec::IntoIter<u16>, vec::IntoIter<Container>>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.keys.into_iter().zip(self.containers)
    }
}

impl FromIterator<(u16, Container)> for RoaringArray {
    fn from_iter<I: IntoIterator<Item = (u16, Container)>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut array = Self::with_capacity(iter.size_hint().0);
        for (key, container) in iter {
            array.push(key, container);
        }
        array
    }
}

/// One step of a merge join over two key ordered streams
pub(crate) enum Merged<L, R> {
    Left(u16, L),
    Right(u16, R),
    Both(u16, L, R),
}

pub(crate) struct MergeJoin<I: Iterator, J: Iterator> {
    left: Peekable<I>,
    right: Peekable<J>,
}

/// Walks two streams of `(key, item)` in ascending key order, pairing items
/// with equal keys
pub(crate) fn merge_join<I, J, L, R>(left: I, right: J) -> MergeJoin<I::IntoIter, J::IntoIter>
where
    I: IntoIterator<Item = (u16, L)>,
    J: IntoIterator<Item = (u16, R)>,
{
    MergeJoin {
        left: left.into_iter().peekable(),
        right: right.into_iter().peekable(),
    }
}

impl<I, J, L, R> Iterator for MergeJoin<I, J>
where
    I: Iterator<Item = (u16, L)>,
    J: Iterator<Item = (u16, R)>,
{
    type Item = Merged<L, R>;

    fn next(&mut self) -> Option<Self::Item> {
        let ordering = match (self.left.peek(), self.right.peek()) {
            (None, None) => return None,
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (Some((a, _)), Some((b, _))) => a.cmp(b),
        };
        match ordering {
            Ordering::Less => {
                let (key, left) = self.left.next()?;
                Some(Merged::Left(key, left))
            }
            Ordering::Greater => {
                let (key, right) = self.right.next()?;
                Some(Merged::Right(key, right))
            }
            Ordering::Equal => {
                let (key, left) = self.left.next()?;
                let (_, right) = self.right.next()?;
                Some(Merged::Both(key, left, right))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn singleton(value: u16) -> Container {
        let mut container = Container::new();
        container.add(value);
        container
    }

    #[test]
    fn get_or_create_keeps_keys_sorted() {
        let mut array = RoaringArray::new();
        array.get_or_create(5).add(1);
        array.get_or_create(1).add(2);
        array.get_or_create(3).add(3);
        array.get_or_create(5).add(4);
        assert_eq!(array.keys(), [1, 3, 5]);
        assert_eq!(array.get(5).map(Container::len), Some(2));
        assert!(array.get(4).is_none());
        assert!(array.remove(3).is_some());
        assert!(array.remove(3).is_none());
        assert_eq!(array.keys(), [1, 5]);
    }

    #[test]
    fn retain_non_empty_drops_empties() {
        let mut array: RoaringArray = vec![
            (1, singleton(1)),
            (2, Container::new()),
            (3, singleton(3)),
            (4, Container::new()),
        ]
        .into_iter()
        .collect();
        array.retain_non_empty();
        assert_eq!(array.keys(), [1, 3]);
        assert_eq!(array.container_at(1).min(), Some(3));
    }

    #[test]
    fn merge_join_pairs_equal_keys() {
        let left = vec![(1u16, 'a'), (3, 'b'), (4, 'c')];
        let right = vec![(2u16, 'x'), (3, 'y'), (9, 'z')];
        let steps: Vec<String> = merge_join(left, right)
            .map(|step| match step {
                Merged::Left(k, l) => format!("L{k}{l}"),
                Merged::Right(k, r) => format!("R{k}{r}"),
                Merged::Both(k, l, r) => format!("B{k}{l}{r}"),
            })
            .collect();
        assert_eq!(steps, ["L1a", "R2x", "B3by", "L4c", "R9z"]);
    }
}
