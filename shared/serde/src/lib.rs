//! # Tandem Serde
//! Bit-level serialization for the tandem replication protocol: a raw bit
//! stream, variable-width integers, and delta codecs for integers and floats.

#![deny(unstable_features, unused_import_braces)]

mod bit_reader;
mod bit_writer;
mod delta;
mod error;
mod normalized_float;
mod serde;

pub mod float;
pub mod integer;

pub use bit_reader::BitReader;
pub use bit_writer::{BitCounter, BitWrite, BitWriter};
pub use delta::{
    de_delta_generic, ser_delta_generic, DeltaBaseline, DeltaSerde, INTEGER_DELTA_RESOLUTION,
};
pub use error::SerdeErr;
pub use integer::{
    PrefixedInteger, SegmentedInteger, SignedPrefixedInteger, UnsignedPrefixedInteger,
};
pub use normalized_float::{read_angle_delta, write_angle_delta, NormalizedFloat};
pub use serde::{ConstBitLength, Serde};
