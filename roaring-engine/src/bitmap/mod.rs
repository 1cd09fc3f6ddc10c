//! 32-bit compressed bitmaps.
//!
//! A value is split into a 16 bit key and a 16 bit low part. Values sharing a
//! key live together in one container, and containers are kept sorted by key.
//!
//! # Example
//!
//! ```rust
//! use roaring_engine::Bitmap;
//!
//! let mut rb1 = Bitmap::create();
//! rb1.add(1);
//! rb1.add(2);
//! rb1.add(3);
//! rb1.add(4);
//! rb1.add(5);
//! rb1.add(100);
//! rb1.add(1000);
//! rb1.run_optimize();
//!
//! let mut rb2 = Bitmap::create();
//! rb2.add(3);
//! rb2.add(4);
//! rb2.add(1000);
//! rb2.run_optimize();
//!
//! let mut rb3 = Bitmap::create();
//!
//! assert_eq!(rb1.cardinality(), 7);
//! assert!(rb1.contains(3));
//!
//! rb1.and_inplace(&rb2);
//! rb3.add(5);
//! rb3.or_inplace(&rb1);
//!
//! let rb4 = Bitmap::fast_or(&[&rb1, &rb2, &rb3]);
//!
//! assert_eq!(rb1.to_vec(), [3, 4, 1000]);
//! assert_eq!(rb3.to_vec(), [3, 4, 5, 1000]);
//! assert_eq!(rb4, rb3);
//! ```

mod imp;
mod index;
mod iter;
mod lazy;
mod ops;
#[cfg(feature = "serde")]
mod serde;
mod serialization;
mod util;

use self::index::RoaringArray;

pub use self::iter::BitmapIterator;
pub use self::lazy::LazyBitmap;
pub use self::serialization::{Deserializer, Serializer};

/// A compressed bitmap
#[derive(Clone, Default)]
pub struct Bitmap {
    high_low_container: RoaringArray,
}

/// Detailed statistics on the composition of a bitmap
///
/// Byte counts are the sizes of the portable encoding of each container kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Statistics {
    pub n_containers: u32,
    pub n_array_containers: u32,
    pub n_run_containers: u32,
    pub n_bitset_containers: u32,
    pub n_values_array_containers: u64,
    pub n_values_run_containers: u64,
    pub n_values_bitset_containers: u64,
    pub n_bytes_array_containers: u64,
    pub n_bytes_run_containers: u64,
    pub n_bytes_bitset_containers: u64,
    /// Largest value, `0` for an empty bitmap
    pub max_value: u32,
    /// Smallest value, `u32::MAX` for an empty bitmap
    pub min_value: u32,
    /// Sum of all values
    pub sum_value: u64,
    pub cardinality: u64,
}
