use crate::error::SerdeErr;

/// Consume-only cursor over a buffer produced by a [`BitWriter`](crate::BitWriter).
///
/// Bits come back in exactly the order and width they were written.
pub struct BitReader<'b> {
    buffer: &'b [u8],
    bit_length: u32,
    position: u32,
}

impl<'b> BitReader<'b> {
    /// Reader bounded by the whole buffer, including any zero padding in the
    /// final byte.
    pub fn new(buffer: &'b [u8]) -> Self {
        let bit_length = (buffer.len() as u32).saturating_mul(8);
        Self {
            buffer,
            bit_length,
            position: 0,
        }
    }

    /// Reader bounded by an exact bit count, usually `BitWriter::bits_written`.
    pub fn with_bit_length(buffer: &'b [u8], bit_length: u32) -> Self {
        let available = (buffer.len() as u32).saturating_mul(8);
        Self {
            buffer,
            bit_length: bit_length.min(available),
            position: 0,
        }
    }

    pub fn bits_read(&self) -> u32 {
        self.position
    }

    pub fn bits_remaining(&self) -> u32 {
        self.bit_length - self.position
    }

    pub fn read_bit(&mut self) -> Result<bool, SerdeErr> {
        if self.position >= self.bit_length {
            return Err(SerdeErr::Eof {
                requested: 1,
                remaining: 0,
            });
        }

        let byte = self.buffer[(self.position / 8) as usize];
        let bit = (byte >> (self.position % 8)) & 1 != 0;
        self.position += 1;

        Ok(bit)
    }

    pub fn read_byte(&mut self) -> Result<u8, SerdeErr> {
        Ok(self.read_bits(8)? as u8)
    }

    /// Reads `width` bits written by `BitWrite::write_bits`.
    ///
    /// The width check happens before any bits are consumed, so a failed read
    /// leaves the cursor where it was.
    pub fn read_bits(&mut self, width: u8) -> Result<u64, SerdeErr> {
        if width == 0 || width > 64 {
            return Err(SerdeErr::InvalidBitWidth { width });
        }
        let remaining = self.bits_remaining();
        if (width as u32) > remaining {
            return Err(SerdeErr::Eof {
                requested: width as u32,
                remaining,
            });
        }

        let mut output: u64 = 0;
        for i in 0..width {
            if self.read_bit()? {
                output |= 1 << i;
            }
        }

        Ok(output)
    }
}
