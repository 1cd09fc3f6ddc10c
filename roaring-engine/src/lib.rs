//! Compressed bitmaps for sets of 32-bit integers, in the Roaring layout.
//!
//! Values are grouped by their high 16 bits into containers, each stored as a
//! sorted array, a bitset or a list of runs, whichever is smallest. See
//! [`Bitmap`] for the full API and <https://roaringbitmap.org> for the
//! background.
//!
//! ```
//! use roaring_engine::{Bitmap, Portable};
//!
//! let mut bitmap: Bitmap = (1..4).collect();
//! bitmap.add_range(1_000_000..2_000_000);
//! bitmap.run_optimize();
//!
//! let bytes = bitmap.serialize::<Portable>();
//! assert_eq!(Bitmap::deserialize::<Portable>(&bytes), bitmap);
//! ```

pub mod bitmap;
mod container;
mod error;
mod serialization;

pub use bitmap::{Bitmap, BitmapIterator, LazyBitmap, Statistics};
pub use bitmap::{Deserializer, Serializer};
pub use container::{ARRAY_MAX_CARDINALITY, BITSET_WORDS, MAX_CONTAINERS};
pub use error::{Error, Result};
pub use serialization::{Native, Portable, SERIAL_COOKIE, SERIAL_COOKIE_NO_RUNCONTAINER};

mod sealed {
    pub trait Sealed {}
}
