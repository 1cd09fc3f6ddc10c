/// The `Portable` format is meant to be compatible with other roaring bitmap libraries, such as Go or Java.
///
/// All integers are little endian.
///
/// It's defined here: <https://github.com/RoaringBitmap/RoaringFormatSpec>
pub enum Portable {}

/// The `Native` format format can sometimes be more space efficient than [`Portable`],
///
/// e.g. when the data is sparse. It's not compatible with Java and Go implementations.
/// Use [`Portable`] for that purpose.
pub enum Native {}

impl crate::sealed::Sealed for Portable {}
impl crate::sealed::Sealed for Native {}

/// Portable cookie of a bitmap with no run container
pub const SERIAL_COOKIE_NO_RUNCONTAINER: u32 = 12346;

/// Portable cookie of a bitmap with at least one run container, stored in the
/// low 16 bits of the first word
pub const SERIAL_COOKIE: u32 = 12347;

/// Below this many containers, a portable stream with run containers has no
/// offset header
pub(crate) const NO_OFFSET_THRESHOLD: usize = 4;

/// Native tag: a plain list of `u32` values follows
pub(crate) const NATIVE_ARRAY_UINT32: u8 = 1;

/// Native tag: a portable stream follows
pub(crate) const NATIVE_CONTAINER: u8 = 2;
