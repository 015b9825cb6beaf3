use crate::{bit_reader::BitReader, bit_writer::BitWrite, error::SerdeErr, integer};

/// A type that can be written to and read back from a bit stream.
///
/// `de` must consume exactly the bits `ser` produced.
pub trait Serde: Sized + Clone + PartialEq {
    /// Encodes into the given bit stream
    fn ser(&self, writer: &mut dyn BitWrite);

    /// Decodes from the given bit stream
    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr>;

    /// Number of bits `ser` will produce for this value
    fn bit_length(&self) -> u32;
}

/// Implemented by types whose encoding always has the same width
pub trait ConstBitLength {
    fn const_bit_length() -> u32;
}

// Unit

impl Serde for () {
    fn ser(&self, _writer: &mut dyn BitWrite) {}

    fn de(_reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(())
    }

    fn bit_length(&self) -> u32 {
        0
    }
}

impl ConstBitLength for () {
    fn const_bit_length() -> u32 {
        0
    }
}

// Boolean

impl Serde for bool {
    fn ser(&self, writer: &mut dyn BitWrite) {
        writer.write_bit(*self);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        reader.read_bit()
    }

    fn bit_length(&self) -> u32 {
        1
    }
}

impl ConstBitLength for bool {
    fn const_bit_length() -> u32 {
        1
    }
}

// Fixed-width integers, written verbatim in their two's complement bit pattern

macro_rules! impl_serde_for_integer {
    ($($ty:ty => $unsigned:ty),* $(,)?) => {
        $(
            impl Serde for $ty {
                fn ser(&self, writer: &mut dyn BitWrite) {
                    writer.write_bits(*self as $unsigned as u64, <$ty>::BITS as u8);
                }

                fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
                    let bits = reader.read_bits(<$ty>::BITS as u8)?;
                    Ok(bits as $unsigned as $ty)
                }

                fn bit_length(&self) -> u32 {
                    <$ty>::BITS
                }
            }

            impl ConstBitLength for $ty {
                fn const_bit_length() -> u32 {
                    <$ty>::BITS
                }
            }
        )*
    };
}

impl_serde_for_integer!(
    u8 => u8,
    u16 => u16,
    u32 => u32,
    u64 => u64,
    i8 => u8,
    i16 => u16,
    i32 => u32,
    i64 => u64,
);

// Floats, written as their full IEEE-754 bit pattern

impl Serde for f32 {
    fn ser(&self, writer: &mut dyn BitWrite) {
        writer.write_bits(self.to_bits() as u64, 32);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(f32::from_bits(reader.read_bits(32)? as u32))
    }

    fn bit_length(&self) -> u32 {
        32
    }
}

impl ConstBitLength for f32 {
    fn const_bit_length() -> u32 {
        32
    }
}

impl Serde for f64 {
    fn ser(&self, writer: &mut dyn BitWrite) {
        writer.write_bits(self.to_bits(), 64);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(f64::from_bits(reader.read_bits(64)?))
    }

    fn bit_length(&self) -> u32 {
        64
    }
}

impl ConstBitLength for f64 {
    fn const_bit_length() -> u32 {
        64
    }
}

// Containers

const LENGTH_RESOLUTION: u8 = 7;

impl<T: Serde> Serde for Option<T> {
    fn ser(&self, writer: &mut dyn BitWrite) {
        match self {
            Some(value) => {
                writer.write_bit(true);
                value.ser(writer);
            }
            None => writer.write_bit(false),
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        if reader.read_bit()? {
            Ok(Some(T::de(reader)?))
        } else {
            Ok(None)
        }
    }

    fn bit_length(&self) -> u32 {
        match self {
            Some(value) => 1 + value.bit_length(),
            None => 1,
        }
    }
}

impl<T: Serde> Serde for Vec<T> {
    fn ser(&self, writer: &mut dyn BitWrite) {
        integer::write_prefixed_unsigned(writer, self.len() as u64, LENGTH_RESOLUTION);
        for item in self {
            item.ser(writer);
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let length = integer::read_prefixed_unsigned(reader, LENGTH_RESOLUTION)?;
        let length = usize::try_from(length).map_err(|_| SerdeErr::InvalidValue {
            type_name: "Vec",
            reason: "length does not fit in usize",
        })?;
        let mut output = Vec::with_capacity(length.min(1024));
        for _ in 0..length {
            output.push(T::de(reader)?);
        }
        Ok(output)
    }

    fn bit_length(&self) -> u32 {
        let mut output = integer::prefixed_unsigned_bit_length(self.len() as u64, LENGTH_RESOLUTION);
        for item in self {
            output += item.bit_length();
        }
        output
    }
}

impl Serde for String {
    fn ser(&self, writer: &mut dyn BitWrite) {
        let bytes = self.as_bytes();
        integer::write_prefixed_unsigned(writer, bytes.len() as u64, LENGTH_RESOLUTION);
        for byte in bytes {
            writer.write_byte(*byte);
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let length = integer::read_prefixed_unsigned(reader, LENGTH_RESOLUTION)?;
        let length = usize::try_from(length).map_err(|_| SerdeErr::InvalidValue {
            type_name: "String",
            reason: "length does not fit in usize",
        })?;
        let mut bytes = Vec::with_capacity(length.min(1024));
        for _ in 0..length {
            bytes.push(reader.read_byte()?);
        }
        String::from_utf8(bytes).map_err(|_| SerdeErr::InvalidValue {
            type_name: "String",
            reason: "bytes are not valid UTF-8",
        })
    }

    fn bit_length(&self) -> u32 {
        let length = self.len() as u64;
        integer::prefixed_unsigned_bit_length(length, LENGTH_RESOLUTION) + (length as u32) * 8
    }
}

impl<A: Serde, B: Serde> Serde for (A, B) {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.0.ser(writer);
        self.1.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok((A::de(reader)?, B::de(reader)?))
    }

    fn bit_length(&self) -> u32 {
        self.0.bit_length() + self.1.bit_length()
    }
}

impl<A: Serde, B: Serde, C: Serde> Serde for (A, B, C) {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.0.ser(writer);
        self.1.ser(writer);
        self.2.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok((A::de(reader)?, B::de(reader)?, C::de(reader)?))
    }

    fn bit_length(&self) -> u32 {
        self.0.bit_length() + self.1.bit_length() + self.2.bit_length()
    }
}
