use std::error::Error;

use tandem_serde::Serde;

use crate::state_machine::payload::{Payload, PayloadKind};

/// Result of a node callback. Failures are logged by the state machine and
/// never stop the transition they happened in.
pub type NodeResult = Result<(), Box<dyn Error + Send + Sync>>;

/// One state of a `StateMachine`.
///
/// Nodes are addressed by their position in the machine, which is fixed when
/// the machine is built and must be identical on every peer. `is_server` tells
/// the callback which role it is running for; on a host, `enter` and `exit`
/// run once per role.
pub trait StateNode {
    fn name(&self) -> &str;

    /// The payload type this node accepts, if any
    fn payload_kind(&self) -> Option<PayloadKind> {
        None
    }

    /// Called once, when the machine is built
    fn setup(&mut self) {}

    /// `payload` is only ever of this node's declared kind
    fn enter(&mut self, payload: Option<&dyn Payload>, is_server: bool) -> NodeResult;

    fn exit(&mut self, _is_server: bool) -> NodeResult {
        Ok(())
    }

    /// Called every tick while this node is the active state
    fn update(&mut self, _is_server: bool) {}
}

/// A node with a statically known payload type. Register it with
/// `StateMachineBuilder::add_typed_state`.
pub trait TypedStateNode {
    type Payload: Serde + 'static;

    fn name(&self) -> &str;

    fn setup(&mut self) {}

    /// `payload` is `None` when the transition carried no data
    fn enter(&mut self, payload: Option<&Self::Payload>, is_server: bool) -> NodeResult;

    fn exit(&mut self, _is_server: bool) -> NodeResult {
        Ok(())
    }

    fn update(&mut self, _is_server: bool) {}
}

/// Adapts a `TypedStateNode` to the type-erased `StateNode`
pub struct Typed<N: TypedStateNode>(pub N);

impl<N: TypedStateNode> StateNode for Typed<N> {
    fn name(&self) -> &str {
        TypedStateNode::name(&self.0)
    }

    fn payload_kind(&self) -> Option<PayloadKind> {
        Some(PayloadKind::of::<N::Payload>())
    }

    fn setup(&mut self) {
        TypedStateNode::setup(&mut self.0);
    }

    fn enter(&mut self, payload: Option<&dyn Payload>, is_server: bool) -> NodeResult {
        let typed = payload.and_then(|payload| payload.downcast_ref::<N::Payload>());
        TypedStateNode::enter(&mut self.0, typed, is_server)
    }

    fn exit(&mut self, is_server: bool) -> NodeResult {
        TypedStateNode::exit(&mut self.0, is_server)
    }

    fn update(&mut self, is_server: bool) {
        TypedStateNode::update(&mut self.0, is_server);
    }
}
