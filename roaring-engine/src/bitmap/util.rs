use std::ops::{Bound, RangeBounds};

#[inline]
pub fn split(value: u32) -> (u16, u16) {
    ((value >> 16) as u16, value as u16)
}

#[inline]
pub fn join(key: u16, low: u16) -> u32 {
    (u32::from(key) << 16) | u32::from(low)
}

/// One past the largest `u32`
pub const VALUE_SPACE_END: u64 = 1 << 32;

/// Converts any range of `u32` into the half open `[start, end)` over `u64`,
/// `start >= end` means the range is empty
pub fn range_to_exclusive<R: RangeBounds<u32>>(range: R) -> (u64, u64) {
    let start = match range.start_bound() {
        Bound::Included(&i) => u64::from(i),
        Bound::Excluded(&i) => u64::from(i) + 1,
        Bound::Unbounded => 0,
    };
    let end = match range.end_bound() {
        Bound::Included(&i) => u64::from(i) + 1,
        Bound::Excluded(&i) => u64::from(i),
        Bound::Unbounded => VALUE_SPACE_END,
    };
    (start, end)
}

/// Splits the non empty `[start, end)` at key boundaries, yielding
/// `(key, low_start, low_end)` with `low_end <= 65536`
pub fn split_range(start: u64, end: u64) -> impl Iterator<Item = (u16, u32, u32)> {
    debug_assert!(start < end && end <= VALUE_SPACE_END);
    let first = (start >> 16) as u32;
    let last = ((end - 1) >> 16) as u32;
    (first..=last).map(move |key| {
        let base = u64::from(key) << 16;
        let low_start = start.max(base) - base;
        let low_end = end.min(base + (1 << 16)) - base;
        (key as u16, low_start as u32, low_end as u32)
    })
}
