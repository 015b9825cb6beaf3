/// Destination for bit-level serialization
pub trait BitWrite {
    fn write_bit(&mut self, bit: bool);

    fn write_byte(&mut self, byte: u8) {
        let mut temp = byte;
        for _ in 0..8 {
            self.write_bit(temp & 1 != 0);
            temp >>= 1;
        }
    }

    /// Writes the low `width` bits of `value`, least significant first.
    ///
    /// # Panics
    ///
    /// Panics if `width` is outside of `1..=64`. The width is always agreed
    /// out of band by the calling codec, so a bad width is a programming error.
    fn write_bits(&mut self, value: u64, width: u8) {
        if width == 0 || width > 64 {
            panic!("can't write {} bits, width must be within 1..=64", width);
        }
        let mut temp = value;
        for _ in 0..width {
            self.write_bit(temp & 1 != 0);
            temp >>= 1;
        }
    }
}

/// Append-only, growable bit buffer.
///
/// Bits are packed least significant first with no alignment padding between
/// writes. The final byte is zero-padded when the buffer is taken.
pub struct BitWriter {
    scratch: u8,
    scratch_index: u8,
    buffer: Vec<u8>,
    bits_written: u32,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::with_capacity(64)
    }

    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            scratch: 0,
            scratch_index: 0,
            buffer: Vec::with_capacity(bytes),
            bits_written: 0,
        }
    }

    fn flush_scratch(&mut self) {
        if self.scratch_index > 0 {
            let byte = (self.scratch << (8 - self.scratch_index)).reverse_bits();
            self.buffer.push(byte);
            self.scratch = 0;
            self.scratch_index = 0;
        }
    }

    pub fn to_bytes(mut self) -> Vec<u8> {
        self.flush_scratch();
        self.buffer
    }

    pub fn bits_written(&self) -> u32 {
        self.bits_written
    }
}

impl Default for BitWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl BitWrite for BitWriter {
    fn write_bit(&mut self, bit: bool) {
        self.scratch <<= 1;

        if bit {
            self.scratch |= 1;
        }

        self.scratch_index += 1;
        self.bits_written += 1;

        if self.scratch_index >= 8 {
            self.buffer.push(self.scratch.reverse_bits());
            self.scratch_index = 0;
            self.scratch = 0;
        }
    }
}

/// A BitWrite that only counts, used to measure encodings without buffering them
pub struct BitCounter {
    bits: u32,
}

impl BitCounter {
    pub fn new() -> Self {
        Self { bits: 0 }
    }

    pub fn bits_needed(&self) -> u32 {
        self.bits
    }
}

impl Default for BitCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl BitWrite for BitCounter {
    fn write_bit(&mut self, _bit: bool) {
        self.bits += 1;
    }

    fn write_bits(&mut self, _value: u64, width: u8) {
        if width == 0 || width > 64 {
            panic!("can't write {} bits, width must be within 1..=64", width);
        }
        self.bits += width as u32;
    }
}
