use byteorder::{ByteOrder, LittleEndian};
use tracing::debug;

use super::index::RoaringArray;
use super::Bitmap;
use crate::container::{
    ArrayContainer, BitsetContainer, Container, RunBuilder, ARRAY_MAX_CARDINALITY, BITSET_BYTES,
    BITSET_WORDS, MAX_CONTAINERS,
};
use crate::error::{Error, Result};
use crate::serialization::{
    NATIVE_ARRAY_UINT32, NATIVE_CONTAINER, NO_OFFSET_THRESHOLD, SERIAL_COOKIE,
    SERIAL_COOKIE_NO_RUNCONTAINER,
};
use crate::{sealed::Sealed, Native, Portable};

pub trait Serializer: Sealed {
    /// Appends the serialized bitmap to `dst`, returning the bytes written
    fn serialize_into<'a>(bitmap: &Bitmap, dst: &'a mut Vec<u8>) -> &'a [u8];
    fn get_serialized_size_in_bytes(bitmap: &Bitmap) -> usize;
}

pub trait Deserializer: Sealed {
    /// Deserializes a bitmap, returning `None` on any invalid input
    fn try_deserialize(buffer: &[u8]) -> Option<Bitmap> {
        Self::deserialize_checked(buffer).ok()
    }

    /// Deserializes a bitmap, validating every count, offset and payload
    /// against the buffer
    fn deserialize_checked(buffer: &[u8]) -> Result<Bitmap>;

    /// Deserializes a bitmap without validating its structure
    ///
    /// # Safety
    ///
    /// `buffer` must have been produced by the matching [`Serializer`]. Values
    /// are not checked for order, so any other input may yield a bitmap whose
    /// operations return meaningless results. Reads past the end of `buffer`
    /// panic.
    unsafe fn try_deserialize_unchecked(buffer: &[u8]) -> Bitmap;

    /// Number of bytes taken by the serialized bitmap at the start of `buffer`,
    /// if its headers are well formed
    fn find_serialized_size(buffer: &[u8]) -> Option<usize>;
}

impl Serializer for Portable {
    /// Serializes a bitmap to a slice of bytes in portable format.
    /// See [`Bitmap::serialize_into`] for examples.
    fn serialize_into<'a>(bitmap: &Bitmap, dst: &'a mut Vec<u8>) -> &'a [u8] {
        let start = dst.len();
        let len = portable_size(&bitmap.high_low_container);
        dst.resize(start + len, 0);
        let written = write_portable(&bitmap.high_low_container, &mut dst[start..]);
        debug_assert_eq!(written, len);
        &dst[start..]
    }

    /// Computes the serialized size in bytes of the Bitmap in portable format.
    /// See [`Bitmap::get_serialized_size_in_bytes`] for examples.
    fn get_serialized_size_in_bytes(bitmap: &Bitmap) -> usize {
        portable_size(&bitmap.high_low_container)
    }
}

impl Deserializer for Portable {
    fn deserialize_checked(buffer: &[u8]) -> Result<Bitmap> {
        read_portable(buffer, true)
            .map(|(bitmap, _)| bitmap)
            .map_err(|error| {
                debug!(%error, len = buffer.len(), "rejected portable bitmap");
                error
            })
    }

    unsafe fn try_deserialize_unchecked(buffer: &[u8]) -> Bitmap {
        match read_portable(buffer, false) {
            Ok((bitmap, _)) => bitmap,
            Err(error) => panic!("truncated portable bitmap: {error}"),
        }
    }

    fn find_serialized_size(buffer: &[u8]) -> Option<usize> {
        scan_portable(buffer).ok()
    }
}

impl Serializer for Native {
    /// Serializes a bitmap to a slice of bytes in native format.
    /// See [`Bitmap::serialize_into`] for examples.
    fn serialize_into<'a>(bitmap: &Bitmap, dst: &'a mut Vec<u8>) -> &'a [u8] {
        let start = dst.len();
        match native_layout(bitmap) {
            NativeLayout::Values { cardinality } => {
                let len = 1 + 4 + 4 * cardinality as usize;
                dst.resize(start + len, 0);
                let out = &mut dst[start..];
                out[0] = NATIVE_ARRAY_UINT32;
                LittleEndian::write_u32(&mut out[1..5], cardinality);
                for (chunk, value) in out[5..].chunks_exact_mut(4).zip(bitmap.iter()) {
                    LittleEndian::write_u32(chunk, value);
                }
            }
            NativeLayout::Portable { len } => {
                dst.resize(start + 1 + len, 0);
                let out = &mut dst[start..];
                out[0] = NATIVE_CONTAINER;
                write_portable(&bitmap.high_low_container, &mut out[1..]);
            }
        }
        &dst[start..]
    }

    /// Computes the serialized size in bytes of the Bitmap in native format.
    /// See [`Bitmap::get_serialized_size_in_bytes`] for examples.
    fn get_serialized_size_in_bytes(bitmap: &Bitmap) -> usize {
        match native_layout(bitmap) {
            NativeLayout::Values { cardinality } => 1 + 4 + 4 * cardinality as usize,
            NativeLayout::Portable { len } => 1 + len,
        }
    }
}

impl Deserializer for Native {
    fn deserialize_checked(buffer: &[u8]) -> Result<Bitmap> {
        read_native(buffer, true)
            .map(|(bitmap, _)| bitmap)
            .map_err(|error| {
                debug!(%error, len = buffer.len(), "rejected native bitmap");
                error
            })
    }

    unsafe fn try_deserialize_unchecked(buffer: &[u8]) -> Bitmap {
        match read_native(buffer, false) {
            Ok((bitmap, _)) => bitmap,
            Err(error) => panic!("truncated native bitmap: {error}"),
        }
    }

    fn find_serialized_size(buffer: &[u8]) -> Option<usize> {
        let mut reader = Reader::new(buffer);
        match reader.read_u8().ok()? {
            NATIVE_ARRAY_UINT32 => {
                let cardinality = reader.read_u32().ok()? as usize;
                reader.take(cardinality.checked_mul(4)?).ok()?;
                Some(reader.position())
            }
            NATIVE_CONTAINER => scan_portable(&buffer[1..]).ok().map(|len| len + 1),
            _ => None,
        }
    }
}

enum NativeLayout {
    Values { cardinality: u32 },
    Portable { len: usize },
}

/// A plain value list is used unless the portable stream is strictly smaller
fn native_layout(bitmap: &Bitmap) -> NativeLayout {
    let portable = portable_size(&bitmap.high_low_container);
    let cardinality = bitmap.cardinality();
    let as_values = 4 + 4 * cardinality;
    if (portable as u64) < as_values {
        NativeLayout::Portable { len: portable }
    } else {
        NativeLayout::Values {
            cardinality: cardinality as u32,
        }
    }
}

fn has_run_containers(array: &RoaringArray) -> bool {
    array.containers().iter().any(Container::is_run)
}

fn portable_header_size(count: usize, has_runs: bool) -> usize {
    if has_runs {
        let offsets = if count >= NO_OFFSET_THRESHOLD { 4 * count } else { 0 };
        4 + (count + 7) / 8 + 4 * count + offsets
    } else {
        4 + 4 + 4 * count + 4 * count
    }
}

fn portable_size(array: &RoaringArray) -> usize {
    let payload: usize = array.containers().iter().map(Container::size_in_bytes).sum();
    portable_header_size(array.len(), has_run_containers(array)) + payload
}

/// Writes the portable stream into `out`, which must be zeroed and large
/// enough. Returns the number of bytes written.
fn write_portable(array: &RoaringArray, out: &mut [u8]) -> usize {
    let count = array.len();
    let has_runs = has_run_containers(array);
    let mut pos;
    if has_runs {
        LittleEndian::write_u32(out, SERIAL_COOKIE | ((count as u32 - 1) << 16));
        pos = 4;
        for (index, container) in array.containers().iter().enumerate() {
            if container.is_run() {
                out[pos + index / 8] |= 1 << (index % 8);
            }
        }
        pos += (count + 7) / 8;
    } else {
        LittleEndian::write_u32(out, SERIAL_COOKIE_NO_RUNCONTAINER);
        LittleEndian::write_u32(&mut out[4..], count as u32);
        pos = 8;
    }

    for (key, container) in array.iter() {
        debug_assert!(!container.is_empty());
        LittleEndian::write_u16(&mut out[pos..], key);
        LittleEndian::write_u16(&mut out[pos + 2..], (container.len() - 1) as u16);
        pos += 4;
    }

    if !has_runs || count >= NO_OFFSET_THRESHOLD {
        let mut offset = pos + 4 * count;
        for container in array.containers() {
            LittleEndian::write_u32(&mut out[pos..], offset as u32);
            offset += container.size_in_bytes();
            pos += 4;
        }
    }

    for container in array.containers() {
        pos += write_container(container, &mut out[pos..]);
    }
    pos
}

fn write_container(container: &Container, out: &mut [u8]) -> usize {
    match container {
        Container::Run(run) => {
            LittleEndian::write_u16(out, run.num_runs() as u16);
            for (chunk, rle) in out[2..].chunks_exact_mut(4).zip(run.runs()) {
                LittleEndian::write_u16(&mut chunk[..2], rle.value);
                LittleEndian::write_u16(&mut chunk[2..], rle.length);
            }
            2 + 4 * run.num_runs() as usize
        }
        Container::Array(array) if array.len() as usize <= ARRAY_MAX_CARDINALITY => {
            let len = 2 * array.as_slice().len();
            LittleEndian::write_u16_into(array.as_slice(), &mut out[..len]);
            len
        }
        Container::Bitset(bitset) if bitset.len() as usize > ARRAY_MAX_CARDINALITY => {
            LittleEndian::write_u64_into(&bitset.words()[..], &mut out[..BITSET_BYTES]);
            BITSET_BYTES
        }
        Container::Array(array) => {
            let bitset = array.to_bitset();
            LittleEndian::write_u64_into(&bitset.words()[..], &mut out[..BITSET_BYTES]);
            BITSET_BYTES
        }
        Container::Bitset(bitset) => {
            let mut len = 0;
            for (chunk, value) in out.chunks_exact_mut(2).zip(bitset.iter()) {
                LittleEndian::write_u16(chunk, value);
                len += 2;
            }
            len
        }
    }
}

/// Bounds checked cursor over a byte slice
struct Reader<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> Reader<'a> {
    fn new(buffer: &'a [u8]) -> Self {
        Reader {
            buffer,
            position: 0,
        }
    }

    #[inline]
    fn position(&self) -> usize {
        self.position
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let available = self.buffer.len() - self.position;
        if len > available {
            return Err(Error::EndOfBuffer {
                needed: len,
                available,
            });
        }
        let bytes = &self.buffer[self.position..self.position + len];
        self.position += len;
        Ok(bytes)
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn read_u16(&mut self) -> Result<u16> {
        self.take(2).map(LittleEndian::read_u16)
    }

    fn read_u32(&mut self) -> Result<u32> {
        self.take(4).map(LittleEndian::read_u32)
    }
}

struct Descriptor {
    key: u16,
    cardinality: u32,
    is_run: bool,
}

struct PortableHeader<'a> {
    descriptors: Vec<Descriptor>,
    offsets: Option<&'a [u8]>,
}

fn read_portable_header<'a>(reader: &mut Reader<'a>) -> Result<PortableHeader<'a>> {
    let cookie = reader.read_u32()?;
    let (count, run_flags) = if cookie & 0xFFFF == SERIAL_COOKIE {
        let count = (cookie >> 16) as usize + 1;
        (count, Some(reader.take((count + 7) / 8)?))
    } else if cookie == SERIAL_COOKIE_NO_RUNCONTAINER {
        let count = reader.read_u32()? as usize;
        if count > MAX_CONTAINERS {
            return Err(Error::TooManyContainers(count));
        }
        (count, None)
    } else {
        return Err(Error::InvalidCookie(cookie));
    };

    let header = reader.take(4 * count)?;
    let descriptors = header
        .chunks_exact(4)
        .enumerate()
        .map(|(index, chunk)| Descriptor {
            key: LittleEndian::read_u16(&chunk[..2]),
            cardinality: u32::from(LittleEndian::read_u16(&chunk[2..])) + 1,
            is_run: run_flags.map_or(false, |flags| flags[index / 8] & (1 << (index % 8)) != 0),
        })
        .collect();

    let offsets = if run_flags.is_none() || count >= NO_OFFSET_THRESHOLD {
        Some(reader.take(4 * count)?)
    } else {
        None
    };
    Ok(PortableHeader {
        descriptors,
        offsets,
    })
}

fn read_portable(buffer: &[u8], validate: bool) -> Result<(Bitmap, usize)> {
    let mut reader = Reader::new(buffer);
    let header = read_portable_header(&mut reader)?;
    let mut containers = RoaringArray::with_capacity(header.descriptors.len());
    let mut previous_key = None;

    for (index, descriptor) in header.descriptors.iter().enumerate() {
        if validate {
            if previous_key.map_or(false, |previous| previous >= descriptor.key) {
                return Err(Error::InvalidFormat("keys are not strictly increasing"));
            }
            if let Some(offsets) = header.offsets {
                let offset = LittleEndian::read_u32(&offsets[4 * index..]) as usize;
                if offset != reader.position() {
                    return Err(Error::InvalidFormat("container offset does not match its position"));
                }
            }
        }
        previous_key = Some(descriptor.key);
        let container = read_container(&mut reader, descriptor, validate)?;
        containers.push(descriptor.key, container);
    }

    let bitmap = Bitmap {
        high_low_container: containers,
    };
    Ok((bitmap, reader.position()))
}

fn read_container(reader: &mut Reader, descriptor: &Descriptor, validate: bool) -> Result<Container> {
    let cardinality = descriptor.cardinality;
    if descriptor.is_run {
        let num_runs = usize::from(reader.read_u16()?);
        let data = reader.take(4 * num_runs)?;
        let mut builder = RunBuilder::with_capacity(num_runs);
        let mut total = 0u32;
        let mut next_start = 0u32;
        for chunk in data.chunks_exact(4) {
            let start = u32::from(LittleEndian::read_u16(&chunk[..2]));
            let length = u32::from(LittleEndian::read_u16(&chunk[2..]));
            let end = start + length + 1;
            if validate {
                if end > 1 << 16 {
                    return Err(Error::InvalidFormat("run overflows its container"));
                }
                if start < next_start {
                    return Err(Error::InvalidFormat("runs are not sorted and disjoint"));
                }
            }
            total += length + 1;
            next_start = end;
            builder.push_range(start, end.min(1 << 16));
        }
        if validate && total != cardinality {
            return Err(Error::InvalidFormat("run cardinality does not match its header"));
        }
        Ok(Container::from_run(builder.finish()))
    } else if cardinality as usize <= ARRAY_MAX_CARDINALITY {
        let data = reader.take(2 * cardinality as usize)?;
        let mut values = vec![0u16; cardinality as usize];
        LittleEndian::read_u16_into(data, &mut values);
        if validate && values.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(Error::InvalidFormat("array values are not strictly increasing"));
        }
        Ok(Container::from_array(ArrayContainer::from_sorted_unchecked(values)))
    } else {
        let data = reader.take(BITSET_BYTES)?;
        let mut words = Box::new([0u64; BITSET_WORDS]);
        LittleEndian::read_u64_into(data, &mut words[..]);
        let bitset = BitsetContainer::from_words(words);
        if validate && bitset.len() != cardinality {
            return Err(Error::InvalidFormat("bitset cardinality does not match its header"));
        }
        Ok(Container::from_bitset(bitset))
    }
}

/// Length of the portable stream at the start of `buffer`, reading only
/// headers and run counts
fn scan_portable(buffer: &[u8]) -> Result<usize> {
    let mut reader = Reader::new(buffer);
    let header = read_portable_header(&mut reader)?;
    for descriptor in &header.descriptors {
        if descriptor.is_run {
            let num_runs = usize::from(reader.read_u16()?);
            reader.take(4 * num_runs)?;
        } else if descriptor.cardinality as usize <= ARRAY_MAX_CARDINALITY {
            reader.take(2 * descriptor.cardinality as usize)?;
        } else {
            reader.take(BITSET_BYTES)?;
        }
    }
    Ok(reader.position())
}

fn read_native(buffer: &[u8], validate: bool) -> Result<(Bitmap, usize)> {
    let mut reader = Reader::new(buffer);
    match reader.read_u8()? {
        NATIVE_ARRAY_UINT32 => {
            let cardinality = reader.read_u32()? as usize;
            let len = cardinality.checked_mul(4).ok_or(Error::EndOfBuffer {
                needed: usize::MAX,
                available: buffer.len() - reader.position(),
            })?;
            let data = reader.take(len)?;
            let mut values = vec![0u32; cardinality];
            LittleEndian::read_u32_into(data, &mut values);
            if validate && values.windows(2).any(|pair| pair[0] >= pair[1]) {
                return Err(Error::InvalidFormat("values are not strictly increasing"));
            }
            Ok((Bitmap::of(&values), reader.position()))
        }
        NATIVE_CONTAINER => {
            let (bitmap, len) = read_portable(&buffer[1..], validate)?;
            Ok((bitmap, len + 1))
        }
        _ => Err(Error::InvalidFormat("unknown native tag")),
    }
}

impl Bitmap {
    /// Computes the serialized size in bytes of the Bitmap in format `S`.
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::{Bitmap, Native, Portable};
    ///
    /// let bitmap = Bitmap::create();
    /// assert_eq!(bitmap.get_serialized_size_in_bytes::<Portable>(), 8);
    ///
    /// let bitmap = Bitmap::of(&[1, 1 << 20]);
    /// assert_eq!(bitmap.get_serialized_size_in_bytes::<Native>(), 13);
    /// assert_eq!(bitmap.serialize::<Native>().len(), 13);
    /// ```
    #[inline]
    pub fn get_serialized_size_in_bytes<S: Serializer>(&self) -> usize {
        S::get_serialized_size_in_bytes(self)
    }

    /// Serializes a bitmap to a slice of bytes in format `S`.
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::{Bitmap, Portable};
    ///
    /// let original_bitmap: Bitmap = (1..5).collect();
    ///
    /// let serialized_buffer = original_bitmap.serialize::<Portable>();
    ///
    /// let deserialized_bitmap = Bitmap::deserialize::<Portable>(&serialized_buffer);
    ///
    /// assert_eq!(original_bitmap, deserialized_bitmap);
    /// ```
    #[inline]
    pub fn serialize<S: Serializer>(&self) -> Vec<u8> {
        let mut dst = Vec::new();
        self.serialize_into::<S>(&mut dst);
        dst
    }

    /// Serializes a bitmap to a slice of bytes in format `S`, re-using existing capacity
    ///
    /// `dst` is not cleared, data is added after any existing data. Returns the added slice
    /// of `dst`.
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::{Bitmap, Portable};
    ///
    /// let original_bitmap_1: Bitmap = (1..5).collect();
    /// let original_bitmap_2: Bitmap = (1..10).collect();
    ///
    /// let mut data = Vec::new();
    /// for bitmap in [original_bitmap_1, original_bitmap_2] {
    ///     data.clear();
    ///     bitmap.serialize_into::<Portable>(&mut data);
    ///     // do something with data
    /// }
    ///
    /// let mut data = vec![0xFF];
    /// let written = Bitmap::of(&[7]).serialize_into::<Portable>(&mut data).len();
    /// assert_eq!(data[0], 0xFF);
    /// assert_eq!(data.len(), written + 1);
    /// ```
    #[inline]
    pub fn serialize_into<'a, S: Serializer>(&self, dst: &'a mut Vec<u8>) -> &'a [u8] {
        S::serialize_into(self, dst)
    }

    /// Given a serialized bitmap as slice of bytes returns a bitmap instance.
    /// See example of [`Self::serialize`] function.
    ///
    /// On invalid input returns None.
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::{Bitmap, Portable};
    ///
    /// let original_bitmap: Bitmap = (1..5).collect();
    /// let serialized_buffer = original_bitmap.serialize::<Portable>();
    ///
    /// let deserialized_bitmap = Bitmap::try_deserialize::<Portable>(&serialized_buffer);
    /// assert_eq!(original_bitmap, deserialized_bitmap.unwrap());
    ///
    /// let invalid_buffer: Vec<u8> = vec![3];
    /// let deserialized_bitmap = Bitmap::try_deserialize::<Portable>(&invalid_buffer);
    /// assert!(deserialized_bitmap.is_none());
    /// ```
    #[inline]
    pub fn try_deserialize<D: Deserializer>(buffer: &[u8]) -> Option<Self> {
        D::try_deserialize(buffer)
    }

    /// Given a serialized bitmap as slice of bytes returns a bitmap instance.
    /// See example of [`Self::serialize`] function.
    ///
    /// On invalid input returns empty bitmap.
    #[inline]
    pub fn deserialize<D: Deserializer>(buffer: &[u8]) -> Self {
        Self::try_deserialize::<D>(buffer).unwrap_or_default()
    }

    /// Given a serialized bitmap as slice of bytes returns a bitmap instance,
    /// or the reason the input was rejected.
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::{Bitmap, Error, Native};
    ///
    /// let bitmap = Bitmap::of(&[1, 2, 3]);
    /// let buffer = bitmap.serialize::<Native>();
    /// assert_eq!(Bitmap::deserialize_checked::<Native>(&buffer), Ok(bitmap));
    ///
    /// let truncated = &buffer[..buffer.len() - 1];
    /// assert!(matches!(
    ///     Bitmap::deserialize_checked::<Native>(truncated),
    ///     Err(Error::EndOfBuffer { .. })
    /// ));
    /// ```
    #[inline]
    pub fn deserialize_checked<D: Deserializer>(buffer: &[u8]) -> Result<Self> {
        D::deserialize_checked(buffer)
    }

    /// Given a serialized bitmap as slice of bytes returns a bitmap instance,
    /// skipping structural validation.
    ///
    /// # Safety
    ///
    /// See [`Deserializer::try_deserialize_unchecked`].
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_engine::{Bitmap, Portable};
    ///
    /// let bitmap = Bitmap::from_range(10..100_000);
    /// let buffer = bitmap.serialize::<Portable>();
    /// let deserialized = unsafe { Bitmap::try_deserialize_unchecked::<Portable>(&buffer) };
    /// assert_eq!(bitmap, deserialized);
    /// ```
    #[inline]
    pub unsafe fn try_deserialize_unchecked<D: Deserializer>(buffer: &[u8]) -> Self {
        D::try_deserialize_unchecked(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mixed() -> Bitmap {
        let mut bitmap = Bitmap::of(&[1, 5, 9]);
        bitmap.add_range(70_000..80_000);
        bitmap.add_range(200_000..300_000);
        let sparse: Vec<u32> = ((1 << 20)..(1 << 20) + 20_000).step_by(3).collect();
        bitmap.add_many(&sparse);
        bitmap.run_optimize();
        bitmap
    }

    #[test]
    fn empty_bitmap_layout() {
        let bitmap = Bitmap::create();
        assert_eq!(bitmap.serialize::<Portable>(), [0x3A, 0x30, 0, 0, 0, 0, 0, 0]);
        assert_eq!(bitmap.serialize::<Native>(), [1, 0, 0, 0, 0]);
        assert_eq!(Bitmap::deserialize_checked::<Portable>(&[0x3A, 0x30, 0, 0, 0, 0, 0, 0]), Ok(bitmap));
    }

    #[test]
    fn portable_layout_without_runs() {
        let bitmap = Bitmap::of(&[1, 2, 1 << 16]);
        let bytes = bitmap.serialize::<Portable>();
        #[rustfmt::skip]
        let expected = [
            0x3A, 0x30, 0, 0, 2, 0, 0, 0, // cookie, count
            0, 0, 1, 0, 1, 0, 0, 0,       // (key 0, card 2), (key 1, card 1)
            24, 0, 0, 0, 28, 0, 0, 0,     // offsets
            1, 0, 2, 0, 0, 0,             // payloads
        ];
        assert_eq!(bytes, expected);
        assert_eq!(bitmap.get_serialized_size_in_bytes::<Portable>(), bytes.len());
    }

    #[test]
    fn portable_layout_with_runs() {
        let mut bitmap = Bitmap::from_range(10..1000);
        bitmap.run_optimize();
        let bytes = bitmap.serialize::<Portable>();
        #[rustfmt::skip]
        let expected = [
            0x3B, 0x30, 0, 0, // cookie, one container
            1,                // run flags
            0, 0, 0xDD, 0x03, // key 0, card 990
            1, 0, 10, 0, 0xDD, 0x03,
        ];
        assert_eq!(bytes, expected);
        assert_eq!(Portable::find_serialized_size(&bytes), Some(bytes.len()));
    }

    #[test]
    fn round_trips_every_kind() {
        let bitmaps = [
            Bitmap::create(),
            Bitmap::of(&[0, u32::MAX]),
            Bitmap::from_range_with_step(0..200_000, 2),
            mixed(),
        ];
        for bitmap in &bitmaps {
            let portable = bitmap.serialize::<Portable>();
            assert_eq!(portable.len(), bitmap.get_serialized_size_in_bytes::<Portable>());
            assert_eq!(Bitmap::deserialize_checked::<Portable>(&portable).as_ref(), Ok(bitmap));
            assert_eq!(Portable::find_serialized_size(&portable), Some(portable.len()));

            let native = bitmap.serialize::<Native>();
            assert_eq!(native.len(), bitmap.get_serialized_size_in_bytes::<Native>());
            assert_eq!(Bitmap::deserialize_checked::<Native>(&native).as_ref(), Ok(bitmap));
            assert_eq!(Native::find_serialized_size(&native), Some(native.len()));
        }
    }

    #[test]
    fn native_picks_the_smaller_layout() {
        let sparse = Bitmap::of(&[1, 1 << 20, 1 << 30]);
        assert_eq!(sparse.serialize::<Native>()[0], NATIVE_ARRAY_UINT32);
        let dense = Bitmap::from_range(0..100_000);
        assert_eq!(dense.serialize::<Native>()[0], NATIVE_CONTAINER);
    }

    #[test]
    fn find_size_ignores_trailing_bytes() {
        let bitmap = mixed();
        let mut bytes = bitmap.serialize::<Portable>();
        let len = bytes.len();
        bytes.extend_from_slice(&[0xAB; 17]);
        assert_eq!(Portable::find_serialized_size(&bytes), Some(len));
        assert_eq!(Portable::find_serialized_size(&bytes[..len - 1]), None);
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(
            Bitmap::deserialize_checked::<Portable>(&[1, 2, 3, 4]),
            Err(Error::InvalidCookie(0x0403_0201))
        );
        assert!(matches!(
            Bitmap::deserialize_checked::<Portable>(&[0x3A, 0x30]),
            Err(Error::EndOfBuffer { needed: 4, available: 2 })
        ));

        let mut too_many = vec![0x3A, 0x30, 0, 0];
        too_many.extend_from_slice(&70_000u32.to_le_bytes());
        assert_eq!(
            Bitmap::deserialize_checked::<Portable>(&too_many),
            Err(Error::TooManyContainers(70_000))
        );

        // keys out of order
        let mut bytes = Bitmap::of(&[1, 1 << 16]).serialize::<Portable>();
        bytes.swap(8, 12);
        assert_eq!(
            Bitmap::deserialize_checked::<Portable>(&bytes),
            Err(Error::InvalidFormat("keys are not strictly increasing"))
        );

        // unsorted array payload
        let mut bytes = Bitmap::of(&[1, 2]).serialize::<Portable>();
        let payload = bytes.len() - 4;
        bytes.swap(payload, payload + 2);
        assert_eq!(
            Bitmap::deserialize_checked::<Portable>(&bytes),
            Err(Error::InvalidFormat("array values are not strictly increasing"))
        );

        // bitset popcount disagreeing with its header
        let mut bytes = Bitmap::from_range_with_step(0..20_000, 2).serialize::<Portable>();
        let last = bytes.len() - 1;
        bytes[last] = 0xFF;
        assert_eq!(
            Bitmap::deserialize_checked::<Portable>(&bytes),
            Err(Error::InvalidFormat("bitset cardinality does not match its header"))
        );

        assert_eq!(Bitmap::try_deserialize::<Native>(&[9]), None);
        assert!(Bitmap::deserialize::<Native>(&[]).is_empty());
    }

    #[test]
    fn rejects_overflowing_runs() {
        #[rustfmt::skip]
        let bytes = [
            0x3B, 0x30, 0, 0,
            1,
            0, 0, 0x09, 0,
            1, 0, 0xFA, 0xFF, 0x09, 0,
        ];
        assert_eq!(
            Bitmap::deserialize_checked::<Portable>(&bytes),
            Err(Error::InvalidFormat("run overflows its container"))
        );
    }
}
