use thiserror::Error;

/// Errors that can occur while reading from a bit stream
///
/// Every one of these means the reader and writer disagree about the shape of
/// the data, which is a protocol or version mismatch between peers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerdeErr {
    /// Attempted to read past the end of the written data
    #[error("Attempted to read {requested} bit(s) with only {remaining} remaining in the stream")]
    Eof { requested: u32, remaining: u32 },

    /// A bit width outside of `1..=64` was requested
    #[error("Bit width {width} is invalid, must be within 1..=64")]
    InvalidBitWidth { width: u8 },

    /// A variable-width integer did not terminate within 64 bits
    #[error("Variable-width integer exceeded 64 bits while decoding")]
    Overflow,

    /// The decoded bits do not describe a valid value of the expected type
    #[error("Invalid value while decoding {type_name}: {reason}")]
    InvalidValue {
        type_name: &'static str,
        reason: &'static str,
    },
}
