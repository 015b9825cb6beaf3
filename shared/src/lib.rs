//! # Tandem Shared
//! Replicated containers and state machines that stay in sync between a
//! server and its clients, built on the tandem bit codec.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

pub use tandem_serde::{
    float, integer, read_angle_delta, write_angle_delta, BitCounter, BitReader, BitWrite,
    BitWriter, ConstBitLength, DeltaBaseline, DeltaSerde, NormalizedFloat, PrefixedInteger,
    SegmentedInteger, Serde, SerdeErr, SignedPrefixedInteger, UnsignedPrefixedInteger,
};

mod network;
mod replicated_array;
mod state_machine;
mod types;

pub use network::{
    context::{DeliveryMode, MessageTarget, NetworkContext, OutgoingMessage},
    module::NetworkModule,
};
pub use replicated_array::{
    change::ArrayChange, config::ReplicatedArrayConfig, error::ArrayError, message::ArrayMessage,
    replicated_array::ReplicatedArray,
};
pub use state_machine::{
    builder::StateMachineBuilder,
    config::StateMachineConfig,
    error::StateMachineError,
    event::StateMachineEvent,
    message::{StateMachineMessage, StateMessageKind},
    node::{NodeResult, StateNode, Typed, TypedStateNode},
    payload::{Payload, PayloadKind, PayloadKinds},
    state_machine::{NodeRef, StateMachine, StateMachineState, NO_STATE},
};
pub use types::{HostType, PeerId};
