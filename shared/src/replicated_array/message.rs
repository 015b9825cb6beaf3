use tandem_serde::{BitReader, BitWrite, BitWriter, Serde, SerdeErr};

const KIND_BITS: u8 = 2;

/// Wire messages of a ReplicatedArray.
///
/// Each starts with a 2-bit kind; indices and lengths are 32-bit signed
/// integers and values use `T`'s own encoding.
#[derive(Clone, Debug, PartialEq)]
pub enum ArrayMessage<T> {
    InitialSize { length: i32 },
    Set { index: i32, value: T },
    Clear,
    Resize { length: i32 },
}

impl<T> ArrayMessage<T> {
    fn kind(&self) -> u64 {
        match self {
            ArrayMessage::InitialSize { .. } => 0,
            ArrayMessage::Set { .. } => 1,
            ArrayMessage::Clear => 2,
            ArrayMessage::Resize { .. } => 3,
        }
    }
}

impl<T: Serde> ArrayMessage<T> {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = BitWriter::new();
        self.ser(&mut writer);
        writer.to_bytes()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SerdeErr> {
        let mut reader = BitReader::new(bytes);
        Self::de(&mut reader)
    }
}

impl<T: Serde> Serde for ArrayMessage<T> {
    fn ser(&self, writer: &mut dyn BitWrite) {
        writer.write_bits(self.kind(), KIND_BITS);
        match self {
            ArrayMessage::InitialSize { length } | ArrayMessage::Resize { length } => {
                length.ser(writer);
            }
            ArrayMessage::Set { index, value } => {
                index.ser(writer);
                value.ser(writer);
            }
            ArrayMessage::Clear => {}
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        match reader.read_bits(KIND_BITS)? {
            0 => Ok(ArrayMessage::InitialSize {
                length: i32::de(reader)?,
            }),
            1 => {
                let index = i32::de(reader)?;
                let value = T::de(reader)?;
                Ok(ArrayMessage::Set { index, value })
            }
            2 => Ok(ArrayMessage::Clear),
            _ => Ok(ArrayMessage::Resize {
                length: i32::de(reader)?,
            }),
        }
    }

    fn bit_length(&self) -> u32 {
        let body = match self {
            ArrayMessage::InitialSize { length } | ArrayMessage::Resize { length } => {
                length.bit_length()
            }
            ArrayMessage::Set { index, value } => index.bit_length() + value.bit_length(),
            ArrayMessage::Clear => 0,
        };
        KIND_BITS as u32 + body
    }
}
