use libfuzzer_sys::arbitrary::{self, Arbitrary, Unstructured};
use roaring_engine::Bitmap;
use std::collections::BTreeSet;
use std::ops::RangeInclusive;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Num(pub u32);

/// Values stay within four containers so operations collide often
pub const MAX_NUM: u32 = 0x1_0000 * 4;

impl<'a> Arbitrary<'a> for Num {
    fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
        Ok(Self(u.int_in_range(0..=(MAX_NUM - 1))?))
    }
}

fn bounds(range: &RangeInclusive<Num>) -> RangeInclusive<u32> {
    range.start().0..=range.end().0
}

#[derive(Arbitrary, Debug)]
pub enum MutableBitmapOperation {
    Add(Num),
    AddChecked(Num),
    AddMany(Vec<Num>),
    AddRange(RangeInclusive<Num>),
    Remove(Num),
    RemoveChecked(Num),
    RemoveMany(Vec<Num>),
    RemoveRange(RangeInclusive<Num>),
    Clear,
    FlipInplace(RangeInclusive<Num>),
    PopFirst,
    PopLast,
    RetainEven,
    ShrinkToFit,
    RunOptimize,
    RemoveRunCompression,
    // Enough values to force a bitset container
    MakeBitset { key: u8 },
    MakeRange { key: u8 },
}

#[derive(Arbitrary, Debug)]
pub enum ReadBitmapOp {
    ContainsRange(RangeInclusive<Num>),
    Contains(Num),
    RangeCardinality(RangeInclusive<Num>),
    Cardinality,
    Flip(RangeInclusive<Num>),
    ToVec,
    GetSerializedSizeInBytes,
    IsEmpty,
    Minimum,
    Maximum,
    Rank(Num),
    Select(Num),
    Statistics,
    ContentHash,
    Clone,
    Debug,
    WithIter(Vec<IterOperation>),
}

#[derive(Arbitrary, Debug)]
pub enum BitmapCompOperation {
    Eq,
    IsSubset,
    IsStrictSubset,
    Intersect,
    JaccardIndex,
    And,
    Or,
    Xor,
    AndNot,
    LazyOr { force_bitsets: bool },
    LazyXor,
}

#[derive(Arbitrary, Debug)]
pub enum IterOperation {
    ResetAtOrAfter(u32),
    ReadNext,
    NextMany(u16),
}

impl MutableBitmapOperation {
    /// Applies the operation to both the bitmap and a reference set
    pub fn apply(&self, b: &mut Bitmap, model: &mut BTreeSet<u32>) {
        match *self {
            MutableBitmapOperation::Add(i) => {
                b.add(i.0);
                model.insert(i.0);
            }
            MutableBitmapOperation::AddChecked(i) => {
                assert_eq!(b.add_checked(i.0), model.insert(i.0));
            }
            MutableBitmapOperation::AddMany(ref items) => {
                let items: Vec<u32> = items.iter().map(|n| n.0).collect();
                b.add_many(&items);
                model.extend(items);
            }
            MutableBitmapOperation::AddRange(ref r) => {
                b.add_range(bounds(r));
                model.extend(bounds(r));
            }
            MutableBitmapOperation::Remove(i) => {
                b.remove(i.0);
                model.remove(&i.0);
            }
            MutableBitmapOperation::RemoveChecked(i) => {
                assert_eq!(b.remove_checked(i.0), model.remove(&i.0));
            }
            MutableBitmapOperation::RemoveMany(ref items) => {
                let items: Vec<u32> = items.iter().map(|n| n.0).collect();
                b.remove_many(&items);
                for item in items {
                    model.remove(&item);
                }
            }
            MutableBitmapOperation::RemoveRange(ref r) => {
                b.remove_range(bounds(r));
                model.retain(|v| !bounds(r).contains(v));
            }
            MutableBitmapOperation::Clear => {
                b.clear();
                model.clear();
            }
            MutableBitmapOperation::FlipInplace(ref r) => {
                b.flip_inplace(bounds(r));
                for v in bounds(r) {
                    if !model.remove(&v) {
                        model.insert(v);
                    }
                }
            }
            MutableBitmapOperation::PopFirst => {
                assert_eq!(b.pop_first(), model.pop_first());
            }
            MutableBitmapOperation::PopLast => {
                assert_eq!(b.pop_last(), model.pop_last());
            }
            MutableBitmapOperation::RetainEven => {
                b.retain(|v| v % 2 == 0);
                model.retain(|v| v % 2 == 0);
            }
            MutableBitmapOperation::ShrinkToFit => {
                b.shrink_to_fit();
            }
            MutableBitmapOperation::RunOptimize => {
                b.run_optimize();
            }
            MutableBitmapOperation::RemoveRunCompression => {
                b.remove_run_compression();
            }
            MutableBitmapOperation::MakeBitset { key } => {
                let start = u32::from(key % 4) * 0x1_0000;
                let end = start + 9 * 1024;
                for i in (start..end).step_by(2) {
                    b.add(i);
                    model.insert(i);
                }
            }
            MutableBitmapOperation::MakeRange { key } => {
                let start = u32::from(key % 4) * 0x1_0000;
                let end = start + 0xFFFF;
                b.add_range(start..=end);
                model.extend(start..=end);
            }
        }
        assert_eq!(b.cardinality(), model.len() as u64);
    }
}

impl ReadBitmapOp {
    pub fn check(&self, b: &Bitmap, model: &BTreeSet<u32>) {
        match *self {
            ReadBitmapOp::ContainsRange(ref r) => {
                let expected = bounds(r).all(|v| model.contains(&v));
                assert_eq!(b.contains_range(bounds(r)), expected);
            }
            ReadBitmapOp::Contains(i) => {
                assert_eq!(b.contains(i.0), model.contains(&i.0));
            }
            ReadBitmapOp::RangeCardinality(ref r) => {
                let expected = if r.start() <= r.end() {
                    model.range(bounds(r)).count() as u64
                } else {
                    0
                };
                assert_eq!(b.range_cardinality(bounds(r)), expected);
            }
            ReadBitmapOp::Cardinality => {
                assert_eq!(b.cardinality(), model.len() as u64);
            }
            ReadBitmapOp::Flip(ref r) => {
                let flipped = b.flip(bounds(r));
                let changed = bounds(r).count() as u64;
                let inside = b.range_cardinality(bounds(r));
                assert_eq!(flipped.cardinality(), b.cardinality() - inside + (changed - inside));
            }
            ReadBitmapOp::ToVec => {
                assert!(b.to_vec().iter().eq(model.iter()));
            }
            ReadBitmapOp::GetSerializedSizeInBytes => {
                let size = b.get_serialized_size_in_bytes::<roaring_engine::Portable>();
                assert_eq!(size, b.serialize::<roaring_engine::Portable>().len());
            }
            ReadBitmapOp::IsEmpty => {
                assert_eq!(b.is_empty(), model.is_empty());
            }
            ReadBitmapOp::Minimum => {
                assert_eq!(b.minimum(), model.first().copied());
            }
            ReadBitmapOp::Maximum => {
                assert_eq!(b.maximum(), model.last().copied());
            }
            ReadBitmapOp::Rank(i) => {
                assert_eq!(b.rank(i.0), model.range(..=i.0).count() as u64);
            }
            ReadBitmapOp::Select(i) => {
                assert_eq!(b.select(i.0), model.iter().nth(i.0 as usize).copied());
            }
            ReadBitmapOp::Statistics => {
                let stats = b.statistics();
                assert_eq!(stats.cardinality, model.len() as u64);
            }
            ReadBitmapOp::ContentHash => {
                let expected = model
                    .iter()
                    .fold(0u32, |hash, &v| hash.wrapping_mul(31).wrapping_add(v));
                assert_eq!(b.content_hash(), expected);
            }
            ReadBitmapOp::Clone => {
                assert_eq!(b.clone(), *b);
            }
            ReadBitmapOp::Debug => {
                use std::io::Write;
                write!(std::io::sink(), "{:?}", b).unwrap();
            }
            ReadBitmapOp::WithIter(ref iter_ops) => {
                let mut iter = b.iter();
                let mut expected = model.range(..);
                for op in iter_ops {
                    match *op {
                        IterOperation::ResetAtOrAfter(i) => {
                            iter.reset_at_or_after(i);
                            expected = model.range(i..);
                        }
                        IterOperation::ReadNext => {
                            assert_eq!(iter.next(), expected.next().copied());
                        }
                        IterOperation::NextMany(n) => {
                            let mut v = vec![0; n as usize];
                            let read = iter.next_many(&mut v);
                            assert!(read <= n as usize);
                            assert!(v[..read].iter().eq(expected.by_ref().take(read)));
                        }
                    }
                }
            }
        }
    }
}

impl BitmapCompOperation {
    pub fn apply(&self, lhs: &mut Bitmap, rhs: &Bitmap) {
        match *self {
            BitmapCompOperation::Eq => {
                assert_eq!(lhs == rhs, lhs.to_vec() == rhs.to_vec());
                assert_eq!(lhs, lhs);
            }
            BitmapCompOperation::IsSubset => {
                assert_eq!(lhs.is_subset(rhs), lhs.andnot_cardinality(rhs) == 0);
                assert!(lhs.is_subset(lhs));
            }
            BitmapCompOperation::IsStrictSubset => {
                lhs.is_strict_subset(rhs);
                assert!(!lhs.is_strict_subset(lhs));
            }
            BitmapCompOperation::Intersect => {
                assert_eq!(lhs.intersect(rhs), !lhs.is_disjoint(rhs));
                assert!(lhs.is_empty() || lhs.intersect(lhs));
            }
            BitmapCompOperation::JaccardIndex => {
                lhs.jaccard_index(rhs);
                if !lhs.is_empty() {
                    assert_eq!(lhs.jaccard_index(lhs), 1.0);
                }
            }
            BitmapCompOperation::And => {
                assert_eq!(lhs.and(lhs), *lhs);

                let res = lhs.and(rhs);
                assert_eq!(res.cardinality(), lhs.and_cardinality(rhs));
                lhs.and_inplace(rhs);
                assert_eq!(*lhs, res);
            }
            BitmapCompOperation::Or => {
                assert_eq!(lhs.or(lhs), *lhs);

                let res = lhs.or(rhs);
                assert_eq!(res.cardinality(), lhs.or_cardinality(rhs));
                assert_eq!(res, Bitmap::fast_or(&[lhs, rhs]));
                assert_eq!(res, Bitmap::fast_or_heap(&[lhs, rhs]));

                lhs.or_inplace(rhs);
                assert_eq!(*lhs, res);
            }
            BitmapCompOperation::Xor => {
                assert!(lhs.xor(lhs).is_empty());

                let res = lhs.xor(rhs);
                assert_eq!(res.cardinality(), lhs.xor_cardinality(rhs));
                assert_eq!(res, Bitmap::fast_xor(&[lhs, rhs]));

                lhs.xor_inplace(rhs);
                assert_eq!(*lhs, res);
            }
            BitmapCompOperation::AndNot => {
                assert!(lhs.andnot(lhs).is_empty());

                let res = lhs.andnot(rhs);
                assert_eq!(res.cardinality(), lhs.andnot_cardinality(rhs));

                lhs.andnot_inplace(rhs);
                assert_eq!(*lhs, res);
            }
            BitmapCompOperation::LazyOr { force_bitsets } => {
                let res = lhs.or(rhs);
                lhs.lazy_batch(|lazy| {
                    lazy.or_inplace(rhs, force_bitsets);
                });
                assert_eq!(*lhs, res);
            }
            BitmapCompOperation::LazyXor => {
                let res = lhs.xor(rhs);
                assert_eq!(lhs.lazy_xor(rhs), res);
                *lhs = res;
            }
        }
    }
}
