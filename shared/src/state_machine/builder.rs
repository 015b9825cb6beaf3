use log::error;

use tandem_serde::Serde;

use crate::state_machine::{
    config::StateMachineConfig,
    error::StateMachineError,
    node::{StateNode, Typed, TypedStateNode},
    payload::PayloadKinds,
    state_machine::StateMachine,
};

/// Collects the states and payload types of a `StateMachine`.
///
/// Every peer must add the same states in the same order, since states are
/// addressed by position on the wire.
pub struct StateMachineBuilder {
    config: StateMachineConfig,
    nodes: Vec<Box<dyn StateNode>>,
    payload_kinds: PayloadKinds,
}

impl StateMachineBuilder {
    pub fn new(config: StateMachineConfig) -> Self {
        Self {
            config,
            nodes: Vec::new(),
            payload_kinds: PayloadKinds::new(),
        }
    }

    /// Registers a payload type, so it can be decoded when received
    pub fn add_payload<P: Serde + 'static>(mut self) -> Self {
        self.payload_kinds.add_payload::<P>();
        self
    }

    pub fn add_state<N: StateNode + 'static>(mut self, node: N) -> Self {
        self.nodes.push(Box::new(node));
        self
    }

    /// Adds a state taking a payload. Its payload type is registered too.
    pub fn add_typed_state<N: TypedStateNode + 'static>(mut self, node: N) -> Self {
        self.payload_kinds.add_payload::<N::Payload>();
        self.nodes.push(Box::new(Typed(node)));
        self
    }

    pub fn state_count(&self) -> usize {
        self.nodes.len()
    }

    /// Checks every declared payload type is registered, then runs each
    /// node's setup in order
    pub fn build(self) -> Result<StateMachine, StateMachineError> {
        let Self {
            config,
            mut nodes,
            payload_kinds,
        } = self;

        for node in &nodes {
            let Some(kind) = node.payload_kind() else {
                continue;
            };
            if !payload_kinds.contains(&kind) {
                let err = StateMachineError::PayloadNotRegistered {
                    node: node.name().to_string(),
                    payload: kind.type_name(),
                };
                error!("{}", err);
                return Err(err);
            }
        }

        for node in nodes.iter_mut() {
            node.setup();
        }

        Ok(StateMachine::new(config, nodes, payload_kinds))
    }
}

impl Default for StateMachineBuilder {
    fn default() -> Self {
        Self::new(StateMachineConfig::default())
    }
}
