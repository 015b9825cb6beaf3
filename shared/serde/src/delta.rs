use crate::{
    bit_reader::BitReader,
    bit_writer::BitWrite,
    error::SerdeErr,
    float,
    integer::{read_prefixed, write_prefixed},
    normalized_float::{read_angle_delta, write_angle_delta, NormalizedFloat},
    serde::Serde,
};

/// Chunk width for integer deltas
pub const INTEGER_DELTA_RESOLUTION: u8 = 6;

/// A type that can be encoded as a difference against a baseline both peers
/// already agree on.
pub trait DeltaSerde: Serde {
    /// Writes `self` against `baseline`, returning `false` if nothing changed.
    /// An unchanged value always costs exactly one bit.
    fn ser_delta(&self, baseline: &Self, writer: &mut dyn BitWrite) -> bool;

    /// Reads a value written by `ser_delta` against the same `baseline`
    fn de_delta(baseline: &Self, reader: &mut BitReader) -> Result<Self, SerdeErr>;
}

/// Changed bit followed by the full value. Fallback for types without a
/// cheaper difference encoding.
pub fn ser_delta_generic<T: Serde>(value: &T, baseline: &T, writer: &mut dyn BitWrite) -> bool {
    if value == baseline {
        writer.write_bit(false);
        return false;
    }
    writer.write_bit(true);
    value.ser(writer);
    true
}

pub fn de_delta_generic<T: Serde>(baseline: &T, reader: &mut BitReader) -> Result<T, SerdeErr> {
    if reader.read_bit()? {
        T::de(reader)
    } else {
        Ok(baseline.clone())
    }
}

impl DeltaSerde for f32 {
    fn ser_delta(&self, baseline: &Self, writer: &mut dyn BitWrite) -> bool {
        float::write_delta(writer, *baseline, *self)
    }

    fn de_delta(baseline: &Self, reader: &mut BitReader) -> Result<Self, SerdeErr> {
        float::read_delta(reader, *baseline)
    }
}

impl DeltaSerde for NormalizedFloat {
    fn ser_delta(&self, baseline: &Self, writer: &mut dyn BitWrite) -> bool {
        write_angle_delta(writer, *baseline, *self)
    }

    fn de_delta(baseline: &Self, reader: &mut BitReader) -> Result<Self, SerdeErr> {
        read_angle_delta(reader, *baseline)
    }
}

// Integer deltas are taken with wrapping arithmetic on the 64-bit pattern, so
// any pair of values is representable and the reader's wrapping add restores
// the exact value.
macro_rules! impl_delta_for_integer {
    ($($ty:ty),* $(,)?) => {
        $(
            impl DeltaSerde for $ty {
                fn ser_delta(&self, baseline: &Self, writer: &mut dyn BitWrite) -> bool {
                    let delta = (*self as i64).wrapping_sub(*baseline as i64);
                    if delta == 0 {
                        writer.write_bit(false);
                        return false;
                    }
                    writer.write_bit(true);
                    write_prefixed(writer, delta, INTEGER_DELTA_RESOLUTION);
                    true
                }

                fn de_delta(baseline: &Self, reader: &mut BitReader) -> Result<Self, SerdeErr> {
                    if !reader.read_bit()? {
                        return Ok(*baseline);
                    }
                    let delta = read_prefixed(reader, INTEGER_DELTA_RESOLUTION)?;
                    Ok((*baseline as i64).wrapping_add(delta) as $ty)
                }
            }
        )*
    };
}

impl_delta_for_integer!(u8, u16, u32, u64, i8, i16, i32, i64);

impl DeltaSerde for bool {
    fn ser_delta(&self, baseline: &Self, writer: &mut dyn BitWrite) -> bool {
        ser_delta_generic(self, baseline, writer)
    }

    fn de_delta(baseline: &Self, reader: &mut BitReader) -> Result<Self, SerdeErr> {
        de_delta_generic(baseline, reader)
    }
}

impl DeltaSerde for String {
    fn ser_delta(&self, baseline: &Self, writer: &mut dyn BitWrite) -> bool {
        ser_delta_generic(self, baseline, writer)
    }

    fn de_delta(baseline: &Self, reader: &mut BitReader) -> Result<Self, SerdeErr> {
        de_delta_generic(baseline, reader)
    }
}

/// Tracks the baseline for one delta-encoded stream.
///
/// Sender and receiver each keep one. The first write after construction or
/// `reset` is a full encoding; every later write is a delta against the last
/// value written. Both sides must call `reset` at the same point in the stream
/// to resynchronize. Deltas require ordered, gap-free delivery.
#[derive(Debug, Clone)]
pub struct DeltaBaseline<T: DeltaSerde> {
    baseline: Option<T>,
}

impl<T: DeltaSerde> Default for DeltaBaseline<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DeltaSerde> DeltaBaseline<T> {
    pub fn new() -> Self {
        Self { baseline: None }
    }

    pub fn baseline(&self) -> Option<&T> {
        self.baseline.as_ref()
    }

    pub fn is_synced(&self) -> bool {
        self.baseline.is_some()
    }

    /// Forgets the baseline so the next value is sent in full
    pub fn reset(&mut self) {
        self.baseline = None;
    }

    /// Writes `value` and adopts it as the new baseline. Returns whether any
    /// change was written; a full write always counts as a change.
    pub fn write(&mut self, value: &T, writer: &mut dyn BitWrite) -> bool {
        let changed = match &self.baseline {
            Some(baseline) => value.ser_delta(baseline, writer),
            None => {
                value.ser(writer);
                true
            }
        };
        self.baseline = Some(value.clone());
        changed
    }

    pub fn read(&mut self, reader: &mut BitReader) -> Result<T, SerdeErr> {
        let value = match &self.baseline {
            Some(baseline) => T::de_delta(baseline, reader)?,
            None => T::de(reader)?,
        };
        self.baseline = Some(value.clone());
        Ok(value)
    }
}
