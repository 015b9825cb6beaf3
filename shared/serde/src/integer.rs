use crate::{bit_reader::BitReader, bit_writer::BitWrite, error::SerdeErr, serde::Serde};

// Prefixed integers
//
// The value is split into `resolution`-bit chunks, least significant first.
// Every chunk is preceded by a continuation bit: `1` if more chunks follow,
// `0` on the final chunk. Signed values are zig-zag transformed first so small
// magnitudes of either sign stay in a single chunk.

fn low_mask(width: u8) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

fn check_resolution(resolution: u8) {
    if resolution == 0 || resolution > 64 {
        panic!(
            "prefixed integer resolution must be within 1..=64, got {}",
            resolution
        );
    }
}

pub fn zigzag_encode(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

pub fn zigzag_decode(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

pub fn write_prefixed_unsigned(writer: &mut dyn BitWrite, value: u64, resolution: u8) {
    check_resolution(resolution);

    let mut value = value;
    loop {
        let chunk = value & low_mask(resolution);
        value = value.checked_shr(resolution as u32).unwrap_or(0);
        let proceed = value != 0;
        writer.write_bit(proceed);
        writer.write_bits(chunk, resolution);
        if !proceed {
            return;
        }
    }
}

pub fn read_prefixed_unsigned(reader: &mut BitReader, resolution: u8) -> Result<u64, SerdeErr> {
    if resolution == 0 || resolution > 64 {
        return Err(SerdeErr::InvalidBitWidth { width: resolution });
    }

    let mut output: u64 = 0;
    let mut shift: u32 = 0;
    loop {
        if shift >= 64 {
            return Err(SerdeErr::Overflow);
        }
        let proceed = reader.read_bit()?;
        let chunk = reader.read_bits(resolution)?;

        let kept = 64 - shift;
        if kept < resolution as u32 && chunk >> kept != 0 {
            return Err(SerdeErr::Overflow);
        }
        output |= chunk << shift;
        shift += resolution as u32;

        if !proceed {
            return Ok(output);
        }
    }
}

pub fn prefixed_unsigned_bit_length(value: u64, resolution: u8) -> u32 {
    check_resolution(resolution);

    let significant = 64 - value.leading_zeros();
    let chunks = significant.div_ceil(resolution as u32).max(1);
    chunks * (resolution as u32 + 1)
}

pub fn write_prefixed(writer: &mut dyn BitWrite, value: i64, resolution: u8) {
    write_prefixed_unsigned(writer, zigzag_encode(value), resolution);
}

pub fn read_prefixed(reader: &mut BitReader, resolution: u8) -> Result<i64, SerdeErr> {
    Ok(zigzag_decode(read_prefixed_unsigned(reader, resolution)?))
}

pub fn prefixed_bit_length(value: i64, resolution: u8) -> u32 {
    prefixed_unsigned_bit_length(zigzag_encode(value), resolution)
}

// Segmented integers
//
// Sign-magnitude. A sign bit, then the low `segment_bits` of the magnitude
// unconditionally. While fewer than `max_bits` magnitude bits have been
// written, a continuation bit says whether another segment follows; the last
// segment is narrowed so the magnitude never exceeds `max_bits` bits. Once
// `max_bits` is reached no continuation bit is written.

fn check_segments(segment_bits: u8, max_bits: u8) {
    if segment_bits == 0 || segment_bits > max_bits || max_bits > 63 {
        panic!(
            "invalid segmented integer layout ({}, {}), need 0 < segment <= max <= 63",
            segment_bits, max_bits
        );
    }
}

pub fn write_segmented(writer: &mut dyn BitWrite, value: i64, segment_bits: u8, max_bits: u8) {
    check_segments(segment_bits, max_bits);

    let negative = value < 0;
    let mut magnitude = value.unsigned_abs();
    if magnitude > low_mask(max_bits) {
        panic!(
            "value `{}` is too large! (with `{}` magnitude bits, can't encode a magnitude greater than `{}`)",
            value,
            max_bits,
            low_mask(max_bits)
        );
    }

    writer.write_bit(negative);

    writer.write_bits(magnitude & low_mask(segment_bits), segment_bits);
    magnitude >>= segment_bits;
    let mut consumed = segment_bits;

    while consumed < max_bits {
        let proceed = magnitude != 0;
        writer.write_bit(proceed);
        if !proceed {
            return;
        }
        let width = segment_bits.min(max_bits - consumed);
        writer.write_bits(magnitude & low_mask(width), width);
        magnitude >>= width;
        consumed += width;
    }
}

pub fn read_segmented(
    reader: &mut BitReader,
    segment_bits: u8,
    max_bits: u8,
) -> Result<i64, SerdeErr> {
    if segment_bits == 0 || segment_bits > max_bits || max_bits > 63 {
        return Err(SerdeErr::InvalidValue {
            type_name: "SegmentedInteger",
            reason: "segment layout must satisfy 0 < segment <= max <= 63",
        });
    }

    let negative = reader.read_bit()?;

    let mut magnitude = reader.read_bits(segment_bits)?;
    let mut consumed = segment_bits;

    while consumed < max_bits {
        if !reader.read_bit()? {
            break;
        }
        let width = segment_bits.min(max_bits - consumed);
        magnitude |= reader.read_bits(width)? << consumed;
        consumed += width;
    }

    let magnitude = magnitude as i64;
    Ok(if negative { -magnitude } else { magnitude })
}

pub fn segmented_bit_length(value: i64, segment_bits: u8, max_bits: u8) -> u32 {
    check_segments(segment_bits, max_bits);

    let mut magnitude = value.unsigned_abs() >> segment_bits;
    let mut consumed = segment_bits;
    let mut output = 1 + segment_bits as u32;

    while consumed < max_bits {
        output += 1;
        if magnitude == 0 {
            break;
        }
        let width = segment_bits.min(max_bits - consumed);
        output += width as u32;
        magnitude >>= width;
        consumed += width;
    }
    output
}

// Typed wrappers

pub type UnsignedPrefixedInteger<const RESOLUTION: u8> = PrefixedInteger<false, RESOLUTION>;
pub type SignedPrefixedInteger<const RESOLUTION: u8> = PrefixedInteger<true, RESOLUTION>;

// The generic outer type is a thin shell over non-generic free functions, to
// keep monomorphization from duplicating the codec for every resolution.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct PrefixedInteger<const SIGNED: bool, const RESOLUTION: u8> {
    inner_value: i128,
}

impl<const SIGNED: bool, const RESOLUTION: u8> PrefixedInteger<SIGNED, RESOLUTION> {
    pub fn new<T: Into<i128>>(value: T) -> Self {
        let value = value.into();
        if SIGNED {
            if value < i64::MIN as i128 || value > i64::MAX as i128 {
                panic!("can't encode `{}` in a signed prefixed integer", value);
            }
        } else if value < 0 || value > u64::MAX as i128 {
            panic!("can't encode `{}` in an unsigned prefixed integer", value);
        }
        Self { inner_value: value }
    }

    pub fn get(&self) -> i128 {
        self.inner_value
    }
}

impl<const SIGNED: bool, const RESOLUTION: u8> Serde for PrefixedInteger<SIGNED, RESOLUTION> {
    fn ser(&self, writer: &mut dyn BitWrite) {
        if SIGNED {
            write_prefixed(writer, self.inner_value as i64, RESOLUTION);
        } else {
            write_prefixed_unsigned(writer, self.inner_value as u64, RESOLUTION);
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let inner_value = if SIGNED {
            read_prefixed(reader, RESOLUTION)? as i128
        } else {
            read_prefixed_unsigned(reader, RESOLUTION)? as i128
        };
        Ok(Self { inner_value })
    }

    fn bit_length(&self) -> u32 {
        if SIGNED {
            prefixed_bit_length(self.inner_value as i64, RESOLUTION)
        } else {
            prefixed_unsigned_bit_length(self.inner_value as u64, RESOLUTION)
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct SegmentedInteger<const SEGMENT_BITS: u8, const MAX_BITS: u8> {
    inner_value: i64,
}

impl<const SEGMENT_BITS: u8, const MAX_BITS: u8> SegmentedInteger<SEGMENT_BITS, MAX_BITS> {
    pub fn new<T: Into<i64>>(value: T) -> Self {
        let value = value.into();
        check_segments(SEGMENT_BITS, MAX_BITS);
        if value.unsigned_abs() > low_mask(MAX_BITS) {
            panic!(
                "with `{}` magnitude bits, can't encode `{}`",
                MAX_BITS, value
            );
        }
        Self { inner_value: value }
    }

    pub fn get(&self) -> i64 {
        self.inner_value
    }
}

impl<const SEGMENT_BITS: u8, const MAX_BITS: u8> Serde for SegmentedInteger<SEGMENT_BITS, MAX_BITS> {
    fn ser(&self, writer: &mut dyn BitWrite) {
        write_segmented(writer, self.inner_value, SEGMENT_BITS, MAX_BITS);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let inner_value = read_segmented(reader, SEGMENT_BITS, MAX_BITS)?;
        Ok(Self { inner_value })
    }

    fn bit_length(&self) -> u32 {
        segmented_bit_length(self.inner_value, SEGMENT_BITS, MAX_BITS)
    }
}
