use std::f32::consts::PI;

use crate::{
    bit_reader::BitReader,
    bit_writer::BitWrite,
    error::SerdeErr,
    integer::{prefixed_bit_length, read_prefixed, write_prefixed},
    serde::Serde,
};

/// A scalar in `[-1, 1]` stored at a reduced, fixed resolution.
///
/// Used for angles and ratios. Only the quantized integer `value` takes part
/// in encoding and delta math, never the float it was built from, so both
/// peers always agree on the exact baseline.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash)]
pub struct NormalizedFloat {
    pub value: i64,
}

impl NormalizedFloat {
    /// Chunk width used when the quantized value or its delta is prefixed
    pub const BIT_RESOLUTION: u8 = 8;
    /// Number of quantization steps between 0 and 1
    pub const STEPS: i64 = (1 << 15) - 1;

    pub fn new(value: f32) -> Self {
        let clamped = if value.is_nan() {
            0.0
        } else {
            value.clamp(-1.0, 1.0)
        };
        Self {
            value: (clamped * Self::STEPS as f32).round() as i64,
        }
    }

    /// Wraps `radians` into `[-PI, PI]` and normalizes it
    pub fn from_angle(radians: f32) -> Self {
        let wrapped = (radians + PI).rem_euclid(2.0 * PI) - PI;
        Self::new(wrapped / PI)
    }

    pub fn from_raw(value: i64) -> Self {
        Self { value }
    }

    pub fn get(&self) -> f32 {
        self.value as f32 / Self::STEPS as f32
    }

    pub fn to_angle(&self) -> f32 {
        self.get() * PI
    }
}

impl Serde for NormalizedFloat {
    fn ser(&self, writer: &mut dyn BitWrite) {
        write_prefixed(writer, self.value, Self::BIT_RESOLUTION);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            value: read_prefixed(reader, Self::BIT_RESOLUTION)?,
        })
    }

    fn bit_length(&self) -> u32 {
        prefixed_bit_length(self.value, Self::BIT_RESOLUTION)
    }
}

/// Writes a changed bit and, if changed, the signed difference of the
/// quantized values as a prefixed integer. Returns whether it changed.
pub fn write_angle_delta(
    writer: &mut dyn BitWrite,
    old_value: NormalizedFloat,
    new_value: NormalizedFloat,
) -> bool {
    let delta = new_value.value.wrapping_sub(old_value.value);

    if delta == 0 {
        writer.write_bit(false);
        return false;
    }

    writer.write_bit(true);
    write_prefixed(writer, delta, NormalizedFloat::BIT_RESOLUTION);
    true
}

pub fn read_angle_delta(
    reader: &mut BitReader,
    old_value: NormalizedFloat,
) -> Result<NormalizedFloat, SerdeErr> {
    if !reader.read_bit()? {
        return Ok(old_value);
    }

    let delta = read_prefixed(reader, NormalizedFloat::BIT_RESOLUTION)?;
    Ok(NormalizedFloat {
        value: old_value.value.wrapping_add(delta),
    })
}
