use thiserror::Error;

use tandem_serde::SerdeErr;

use crate::types::PeerId;

/// Errors that can occur during StateMachine operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateMachineError {
    /// A peer that is not the controller attempted a transition
    #[error("Only the controller can call {operation}() on a StateMachine (owner_auth: {owner_auth})")]
    AuthorityViolation {
        operation: &'static str,
        owner_auth: bool,
    },

    /// The referenced node is not part of this machine
    #[error("State '{node}' is not in the states list")]
    NodeNotFound { node: String },

    /// The payload's type is not the type the target node declares
    #[error("State '{node}' takes a payload of type {expected}, got {actual}")]
    PayloadTypeMismatch {
        node: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// A node declares a payload type that was never registered
    #[error("Payload type {payload} is declared by state '{node}' but was never registered. Call `add_payload()` on the builder")]
    PayloadNotRegistered { node: String, payload: &'static str },

    /// A message carried a payload for a state that declares none
    #[error("Received a payload for state {state_id}, which doesn't declare a payload type")]
    UndeclaredPayload { state_id: i32 },

    /// A state id outside of `-1..state_count`
    #[error("State id {state_id} is out of range for a StateMachine with {state_count} states")]
    StateOutOfRange { state_id: i32, state_count: usize },

    /// Next/previous on a machine without states
    #[error("StateMachine has no states")]
    NoStates,

    /// A message arrived from a peer that may not drive this machine
    #[error("{peer} is not allowed to drive this StateMachine")]
    UnauthorizedSender { peer: PeerId },

    /// Message could not be decoded
    #[error("Failed to decode StateMachine message: {0}")]
    Serde(#[from] SerdeErr),
}
