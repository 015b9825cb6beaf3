use crate::{
    bit_reader::BitReader,
    bit_writer::BitWrite,
    error::SerdeErr,
    integer::{read_segmented, segmented_bit_length, write_segmented},
};

const SIGN_MASK: u32 = 0x8000_0000;
const EXPONENT_MASK: u32 = 0x7F80_0000;
const MANTISSA_MASK: u32 = 0x007F_FFFF;
const MANTISSA_BITS: u32 = 23;

/// Segment layout `(segment_bits, max_bits)` for the exponent difference
pub const EXPONENT_SEGMENTS: (u8, u8) = (2, 8);
/// Segment layout `(segment_bits, max_bits)` for the mantissa difference
pub const MANTISSA_SEGMENTS: (u8, u8) = (9, 23);

fn split(bits: u32) -> (bool, i64, i64) {
    let sign = bits & SIGN_MASK != 0;
    let exponent = ((bits & EXPONENT_MASK) >> MANTISSA_BITS) as i64;
    let mantissa = (bits & MANTISSA_MASK) as i64;
    (sign, exponent, mantissa)
}

/// Writes the full 32-bit pattern, used for baseline transmission
pub fn write_full(writer: &mut dyn BitWrite, value: f32) {
    writer.write_bits(value.to_bits() as u64, 32);
}

pub fn read_full(reader: &mut BitReader) -> Result<f32, SerdeErr> {
    Ok(f32::from_bits(reader.read_bits(32)? as u32))
}

/// Writes `new_value` as a difference against `old_value`.
///
/// Returns `false`, after writing a single `0` bit, when the two bit patterns
/// are identical. Otherwise writes `1`, the new sign bit, then the signed
/// exponent and mantissa differences as segmented integers.
///
/// Decoding is only lossless if the reader holds the exact same `old_value`.
pub fn write_delta(writer: &mut dyn BitWrite, old_value: f32, new_value: f32) -> bool {
    let old_bits = old_value.to_bits();
    let new_bits = new_value.to_bits();

    if old_bits == new_bits {
        writer.write_bit(false);
        return false;
    }

    writer.write_bit(true);

    let (_, old_exponent, old_mantissa) = split(old_bits);
    let (new_sign, new_exponent, new_mantissa) = split(new_bits);

    writer.write_bit(new_sign);
    write_segmented(
        writer,
        new_exponent - old_exponent,
        EXPONENT_SEGMENTS.0,
        EXPONENT_SEGMENTS.1,
    );
    write_segmented(
        writer,
        new_mantissa - old_mantissa,
        MANTISSA_SEGMENTS.0,
        MANTISSA_SEGMENTS.1,
    );

    true
}

pub fn read_delta(reader: &mut BitReader, old_value: f32) -> Result<f32, SerdeErr> {
    if !reader.read_bit()? {
        return Ok(old_value);
    }

    let (_, old_exponent, old_mantissa) = split(old_value.to_bits());

    let new_sign = reader.read_bit()?;
    let exponent_delta = read_segmented(reader, EXPONENT_SEGMENTS.0, EXPONENT_SEGMENTS.1)?;
    let mantissa_delta = read_segmented(reader, MANTISSA_SEGMENTS.0, MANTISSA_SEGMENTS.1)?;

    let new_exponent = old_exponent + exponent_delta;
    let new_mantissa = old_mantissa + mantissa_delta;

    // only possible when the baselines have diverged
    if !(0..=0xFF).contains(&new_exponent) || !(0..=MANTISSA_MASK as i64).contains(&new_mantissa) {
        return Err(SerdeErr::InvalidValue {
            type_name: "f32",
            reason: "delta applied to baseline leaves the exponent or mantissa out of range",
        });
    }

    let sign = if new_sign { SIGN_MASK } else { 0 };
    let bits = sign | ((new_exponent as u32) << MANTISSA_BITS) | new_mantissa as u32;
    Ok(f32::from_bits(bits))
}

pub fn delta_bit_length(old_value: f32, new_value: f32) -> u32 {
    let old_bits = old_value.to_bits();
    let new_bits = new_value.to_bits();
    if old_bits == new_bits {
        return 1;
    }

    let (_, old_exponent, old_mantissa) = split(old_bits);
    let (_, new_exponent, new_mantissa) = split(new_bits);

    2 + segmented_bit_length(
        new_exponent - old_exponent,
        EXPONENT_SEGMENTS.0,
        EXPONENT_SEGMENTS.1,
    ) + segmented_bit_length(
        new_mantissa - old_mantissa,
        MANTISSA_SEGMENTS.0,
        MANTISSA_SEGMENTS.1,
    )
}
