use std::{any::type_name, collections::VecDeque};

use log::{debug, error, warn};

use tandem_serde::Serde;

use crate::{
    network::{
        context::{DeliveryMode, NetworkContext},
        module::NetworkModule,
    },
    state_machine::{
        config::StateMachineConfig,
        error::StateMachineError,
        event::StateMachineEvent,
        message::{StateMachineMessage, StateMessageKind},
        node::StateNode,
        payload::{Payload, PayloadKind, PayloadKinds},
    },
    types::PeerId,
};

/// State id meaning "no active state"
pub const NO_STATE: i32 = -1;

/// Addresses a node by position or by name
#[derive(Clone, Copy, Debug)]
pub enum NodeRef<'a> {
    Index(usize),
    Name(&'a str),
}

impl From<usize> for NodeRef<'_> {
    fn from(index: usize) -> Self {
        NodeRef::Index(index)
    }
}

impl<'a> From<&'a str> for NodeRef<'a> {
    fn from(name: &'a str) -> Self {
        NodeRef::Name(name)
    }
}

/// The replicated part of a `StateMachine`
#[derive(Clone)]
pub struct StateMachineState {
    pub state_id: i32,
    pub payload: Option<Box<dyn Payload>>,
}

impl StateMachineState {
    pub fn idle() -> Self {
        Self {
            state_id: NO_STATE,
            payload: None,
        }
    }

    fn matches(&self, state_id: i32, payload: Option<&dyn Payload>) -> bool {
        if self.state_id != state_id {
            return false;
        }
        match (self.payload.as_deref(), payload) {
            (None, None) => true,
            (Some(current), Some(other)) => current.equals(other),
            _ => false,
        }
    }
}

impl Default for StateMachineState {
    fn default() -> Self {
        Self::idle()
    }
}

/// An ordered list of states, one of which may be active, replicated from a
/// single controller to every observer.
///
/// Transitions run the old state's `exit` and the new state's `enter` once
/// for every role the local peer holds. Node failures are logged and never
/// interrupt a transition. Build one with `StateMachineBuilder`.
pub struct StateMachine {
    config: StateMachineConfig,
    nodes: Vec<Box<dyn StateNode>>,
    payload_kinds: PayloadKinds,
    current: StateMachineState,
    previous_state_id: i32,
    initialized: bool,
    /// The last applied message was a replay, so the buffered broadcast of
    /// the same transition may still be in flight
    awaiting_buffered: bool,
    events: VecDeque<StateMachineEvent>,
}

impl StateMachine {
    pub(crate) fn new(
        config: StateMachineConfig,
        nodes: Vec<Box<dyn StateNode>>,
        payload_kinds: PayloadKinds,
    ) -> Self {
        Self {
            config,
            nodes,
            payload_kinds,
            current: StateMachineState::idle(),
            previous_state_id: NO_STATE,
            initialized: false,
            awaiting_buffered: false,
            events: VecDeque::new(),
        }
    }

    // Transitions

    /// Goes to `node` without a payload
    pub fn set_state<'a>(
        &mut self,
        ctx: &mut dyn NetworkContext,
        node: impl Into<NodeRef<'a>>,
    ) -> Result<(), StateMachineError> {
        let node = node.into();
        self.validate_authority(ctx, "set_state")?;
        let index = self.resolve(node)?;
        self.transition(ctx, state_id_of(index), None);
        Ok(())
    }

    /// Goes to `node`, handing it `payload`. The node must declare `P` as its
    /// payload type.
    pub fn set_state_with<'a, P: Serde + 'static>(
        &mut self,
        ctx: &mut dyn NetworkContext,
        node: impl Into<NodeRef<'a>>,
        payload: P,
    ) -> Result<(), StateMachineError> {
        let node = node.into();
        self.validate_authority(ctx, "set_state")?;
        let index = self.resolve(node)?;
        self.check_payload_kind::<P>(index)?;
        self.transition(ctx, state_id_of(index), Some(Box::new(payload)));
        Ok(())
    }

    /// Leaves the active state without entering another
    pub fn clear_state(&mut self, ctx: &mut dyn NetworkContext) -> Result<(), StateMachineError> {
        self.validate_authority(ctx, "clear_state")?;
        self.transition(ctx, NO_STATE, None);
        Ok(())
    }

    /// Goes to the following state, wrapping to the first
    pub fn next(&mut self, ctx: &mut dyn NetworkContext) -> Result<(), StateMachineError> {
        let index = self.next_index()?;
        self.set_state(ctx, index)
    }

    pub fn next_with<P: Serde + 'static>(
        &mut self,
        ctx: &mut dyn NetworkContext,
        payload: P,
    ) -> Result<(), StateMachineError> {
        let index = self.next_index()?;
        self.set_state_with(ctx, index, payload)
    }

    /// Goes to the preceding state, wrapping to the last
    pub fn previous(&mut self, ctx: &mut dyn NetworkContext) -> Result<(), StateMachineError> {
        let index = self.previous_index()?;
        self.set_state(ctx, index)
    }

    pub fn previous_with<P: Serde + 'static>(
        &mut self,
        ctx: &mut dyn NetworkContext,
        payload: P,
    ) -> Result<(), StateMachineError> {
        let index = self.previous_index()?;
        self.set_state_with(ctx, index, payload)
    }

    // Accessors

    pub fn current_state(&self) -> &StateMachineState {
        &self.current
    }

    pub fn current_state_id(&self) -> i32 {
        self.current.state_id
    }

    pub fn previous_state_id(&self) -> i32 {
        self.previous_state_id
    }

    pub fn current_node_name(&self) -> Option<&str> {
        self.current_index().and_then(|index| self.node_name(index))
    }

    pub fn previous_node_name(&self) -> Option<&str> {
        self.index_of_state(self.previous_state_id)
            .and_then(|index| self.node_name(index))
    }

    /// The active state's payload, if it has one of type `P`
    pub fn payload<P: 'static>(&self) -> Option<&P> {
        self.current
            .payload
            .as_deref()
            .and_then(|payload| payload.downcast_ref::<P>())
    }

    pub fn state_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node_name(&self, index: usize) -> Option<&str> {
        self.nodes.get(index).map(|node| node.name())
    }

    pub fn node_index(&self, name: &str) -> Option<usize> {
        self.nodes.iter().position(|node| node.name() == name)
    }

    pub fn payload_kind_of(&self, index: usize) -> Option<PayloadKind> {
        self.nodes.get(index).and_then(|node| node.payload_kind())
    }

    pub fn owner_auth(&self) -> bool {
        self.config.owner_auth
    }

    /// Drains every event recorded since the last call, oldest first
    pub fn take_events(&mut self) -> Vec<StateMachineEvent> {
        self.events.drain(..).collect()
    }

    // Internals

    fn validate_authority(
        &self,
        ctx: &dyn NetworkContext,
        operation: &'static str,
    ) -> Result<(), StateMachineError> {
        if !ctx.is_spawned() || ctx.is_controller(self.config.owner_auth) {
            return Ok(());
        }

        let err = StateMachineError::AuthorityViolation {
            operation,
            owner_auth: self.config.owner_auth,
        };
        error!("{} (local peer: {})", err, ctx.local_peer());
        Err(err)
    }

    fn resolve(&self, node: NodeRef<'_>) -> Result<usize, StateMachineError> {
        let found = match node {
            NodeRef::Index(index) => (index < self.nodes.len()).then_some(index),
            NodeRef::Name(name) => self.node_index(name),
        };
        found.ok_or_else(|| {
            let node = match node {
                NodeRef::Index(index) => format!("#{}", index),
                NodeRef::Name(name) => name.to_string(),
            };
            let err = StateMachineError::NodeNotFound { node };
            error!("{}", err);
            err
        })
    }

    fn check_payload_kind<P: Serde + 'static>(&self, index: usize) -> Result<(), StateMachineError> {
        let declared = self.nodes[index].payload_kind();
        if declared == Some(PayloadKind::of::<P>()) {
            return Ok(());
        }

        let err = StateMachineError::PayloadTypeMismatch {
            node: self.nodes[index].name().to_string(),
            expected: declared.map_or("()", |kind| kind.type_name()),
            actual: type_name::<P>(),
        };
        error!("{}", err);
        Err(err)
    }

    fn next_index(&self) -> Result<usize, StateMachineError> {
        let count = self.nodes.len();
        if count == 0 {
            return Err(StateMachineError::NoStates);
        }
        Ok(match self.current_index() {
            Some(index) if index + 1 < count => index + 1,
            _ => 0,
        })
    }

    fn previous_index(&self) -> Result<usize, StateMachineError> {
        let count = self.nodes.len();
        if count == 0 {
            return Err(StateMachineError::NoStates);
        }
        Ok(match self.current_index() {
            Some(index) if index > 0 => index - 1,
            _ => count - 1,
        })
    }

    fn current_index(&self) -> Option<usize> {
        self.index_of_state(self.current.state_id)
    }

    fn index_of_state(&self, state_id: i32) -> Option<usize> {
        usize::try_from(state_id)
            .ok()
            .filter(|index| *index < self.nodes.len())
    }

    /// Local transition initiated by the controller
    fn transition(
        &mut self,
        ctx: &mut dyn NetworkContext,
        state_id: i32,
        payload: Option<Box<dyn Payload>>,
    ) {
        let roles = local_roles(ctx);
        let previous = self.current_index();

        self.exit_active(&roles);
        self.previous_state_id = self.current.state_id;
        self.current = StateMachineState { state_id, payload };

        if ctx.is_spawned() {
            self.send_transition(ctx);
        }

        self.enter_active(&roles);
        self.events.push_back(StateMachineEvent::StateChanged {
            previous,
            current: self.current_index(),
        });
    }

    /// Transition received from the network
    fn apply_remote(
        &mut self,
        roles: &[bool],
        state_id: i32,
        payload: Option<Box<dyn Payload>>,
    ) {
        let previous = self.current_index();

        self.exit_active(roles);
        self.previous_state_id = self.current.state_id;
        self.current = StateMachineState { state_id, payload };
        self.enter_active(roles);

        self.events.push_back(StateMachineEvent::StateChanged {
            previous,
            current: self.current_index(),
        });
        self.events.push_back(StateMachineEvent::ReceivedNewData);
    }

    fn exit_active(&mut self, roles: &[bool]) {
        let Some(index) = self.current_index() else {
            return;
        };
        let node = &mut self.nodes[index];
        for &is_server in roles {
            if let Err(err) = node.exit(is_server) {
                error!("State '{}' failed to exit: {}", node.name(), err);
            }
        }
    }

    fn enter_active(&mut self, roles: &[bool]) {
        let Some(index) = self.current_index() else {
            return;
        };
        let payload = self.current.payload.as_deref();
        let node = &mut self.nodes[index];
        for &is_server in roles {
            if let Err(err) = node.enter(payload, is_server) {
                error!("State '{}' failed to enter: {}", node.name(), err);
            }
        }
    }

    /// The server announces to every observer and keeps the announcement for
    /// late joiners. A client controller asks the server instead.
    fn send_transition(&self, ctx: &mut dyn NetworkContext) {
        let kind = if ctx.is_server() {
            StateMessageKind::Broadcast
        } else {
            StateMessageKind::Request
        };
        let bytes = self.message(kind).to_bytes();

        debug!(
            "Sending StateMachine {:?} to state {}",
            kind, self.current.state_id
        );
        match kind {
            StateMessageKind::Request => {
                ctx.send_to_server(DeliveryMode::ReliableOrdered, bytes, true);
            }
            _ => {
                ctx.send_to_all(DeliveryMode::ReliableOrdered, bytes, false, true);
            }
        }
    }

    fn message(&self, kind: StateMessageKind) -> StateMachineMessage {
        let declared = self
            .current_index()
            .and_then(|index| self.nodes[index].payload_kind());
        let payload = self
            .current
            .payload
            .as_ref()
            .filter(|payload| Some(payload.kind()) == declared)
            .cloned();

        StateMachineMessage {
            kind,
            state_id: self.current.state_id,
            payload,
        }
    }

    fn decode(&self, bytes: &[u8]) -> Result<StateMachineMessage, StateMachineError> {
        let message = StateMachineMessage::from_bytes(bytes, |state_id, reader| {
            let index = self.validate_state_id(state_id)?;
            let declared = index.and_then(|index| self.nodes[index].payload_kind());
            let (Some(index), Some(kind)) = (index, declared) else {
                return Err(StateMachineError::UndeclaredPayload { state_id });
            };
            match self.payload_kinds.read(&kind, reader) {
                Some(payload) => Ok(payload?),
                None => Err(StateMachineError::PayloadNotRegistered {
                    node: self.nodes[index].name().to_string(),
                    payload: kind.type_name(),
                }),
            }
        })?;
        self.validate_state_id(message.state_id)?;
        Ok(message)
    }

    /// Accepts `NO_STATE` and every node position
    fn validate_state_id(&self, state_id: i32) -> Result<Option<usize>, StateMachineError> {
        if state_id == NO_STATE {
            return Ok(None);
        }
        self.index_of_state(state_id)
            .map(Some)
            .ok_or(StateMachineError::StateOutOfRange {
                state_id,
                state_count: self.nodes.len(),
            })
    }
}

impl NetworkModule for StateMachine {
    type Error = StateMachineError;

    /// The controller enters the first state, once
    fn on_spawned(&mut self, ctx: &mut dyn NetworkContext) -> Result<(), StateMachineError> {
        if !ctx.is_controller(self.config.owner_auth) || self.initialized {
            return Ok(());
        }

        if self.config.enter_first_state_on_spawn && !self.nodes.is_empty() {
            self.set_state(ctx, 0usize)?;
        }
        self.initialized = true;
        Ok(())
    }

    fn on_observer_added(&mut self, ctx: &mut dyn NetworkContext, observer: PeerId) {
        if !ctx.is_server() || self.current_index().is_none() {
            return;
        }

        debug!(
            "Syncing StateMachine state {} to {}",
            self.current.state_id, observer
        );
        let bytes = self.message(StateMessageKind::Replay).to_bytes();
        ctx.send_to_target(observer, DeliveryMode::ReliableOrdered, bytes);
    }

    fn receive(
        &mut self,
        ctx: &mut dyn NetworkContext,
        from: PeerId,
        payload: &[u8],
    ) -> Result<(), StateMachineError> {
        let message = self.decode(payload)?;

        if ctx.is_server() {
            let from_owner = self.config.owner_auth && ctx.owner() == Some(from);
            if message.kind != StateMessageKind::Request || !from_owner {
                warn!(
                    "Dropping StateMachine {:?} from {}, which doesn't control it",
                    message.kind, from
                );
                return Err(StateMachineError::UnauthorizedSender { peer: from });
            }

            let roles = local_roles(ctx);
            self.apply_remote(&roles, message.state_id, message.payload);
            let bytes = self.message(StateMessageKind::Broadcast).to_bytes();
            ctx.send_to_all(DeliveryMode::ReliableOrdered, bytes, false, true);
            return Ok(());
        }

        match message.kind {
            StateMessageKind::Request => {
                warn!("Dropping StateMachine request from {}", from);
                return Err(StateMachineError::UnauthorizedSender { peer: from });
            }
            _ if ctx.is_controller(self.config.owner_auth) => {
                debug!("Ignoring StateMachine {:?} as its controller", message.kind);
                return Ok(());
            }
            StateMessageKind::Replay
                if self
                    .current
                    .matches(message.state_id, message.payload.as_deref()) =>
            {
                debug!(
                    "Already in state {}, skipping replay",
                    self.current.state_id
                );
                return Ok(());
            }
            StateMessageKind::Broadcast if self.awaiting_buffered => {
                self.awaiting_buffered = false;
                if self
                    .current
                    .matches(message.state_id, message.payload.as_deref())
                {
                    debug!(
                        "Already synced to state {}, skipping buffered broadcast",
                        self.current.state_id
                    );
                    return Ok(());
                }
            }
            _ => {}
        }

        self.awaiting_buffered = message.kind == StateMessageKind::Replay;
        self.apply_remote(&[false], message.state_id, message.payload);
        Ok(())
    }

    /// Ticks the active state
    fn update(&mut self, ctx: &mut dyn NetworkContext) {
        let Some(index) = self.current_index() else {
            return;
        };
        self.nodes[index].update(ctx.is_server());
    }
}

fn state_id_of(index: usize) -> i32 {
    i32::try_from(index).unwrap_or(i32::MAX)
}

fn local_roles(ctx: &dyn NetworkContext) -> Vec<bool> {
    let mut roles = Vec::with_capacity(2);
    if ctx.is_server() {
        roles.push(true);
    }
    if ctx.is_client() {
        roles.push(false);
    }
    roles
}
