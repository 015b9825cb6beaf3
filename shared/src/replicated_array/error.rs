use thiserror::Error;

use tandem_serde::SerdeErr;

use crate::types::PeerId;

/// Errors that can occur during ReplicatedArray operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArrayError {
    /// A peer that is not the controller attempted a mutation
    #[error("Invalid permissions when calling {operation}() on a ReplicatedArray (owner_auth: {owner_auth}). Maybe try enabling owner authority")]
    AuthorityViolation {
        operation: &'static str,
        owner_auth: bool,
    },

    /// Index was not within `0..length`
    #[error("Index {index} is out of range for a ReplicatedArray of length {length}")]
    IndexOutOfRange { index: usize, length: usize },

    /// Positional insertion and removal are not part of the container
    #[error("ReplicatedArray does not support {operation}(). Use resize() and set() instead")]
    UnsupportedOperation { operation: &'static str },

    /// Length can't be carried by the 32-bit signed wire field
    #[error("ReplicatedArray length {length} is invalid on the wire")]
    InvalidLength { length: i64 },

    /// A message arrived from a peer that may not mutate this array
    #[error("{peer} is not allowed to modify this ReplicatedArray")]
    UnauthorizedSender { peer: PeerId },

    /// Message could not be decoded
    #[error("Failed to decode ReplicatedArray message: {0}")]
    Serde(#[from] SerdeErr),
}
