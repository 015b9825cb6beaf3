use crate::types::{HostType, PeerId};

/// Delivery guarantee requested from the transport
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeliveryMode {
    /// Every message arrives, in the order it was sent
    ReliableOrdered,
    /// Messages may be dropped or reordered
    Unreliable,
}

/// Who an outgoing message is addressed to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageTarget {
    /// Every observer except the sender
    All {
        /// Skip the owning peer
        exclude_owner: bool,
        /// Keep the most recent message of this kind and replay it to
        /// observers that attach later
        buffer_last: bool,
    },
    /// The server only
    Server {
        /// The server should drop the message unless the sender owns the entity
        require_ownership: bool,
    },
    /// A single observer
    Peer(PeerId),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub target: MessageTarget,
    pub mode: DeliveryMode,
    pub payload: Vec<u8>,
}

/// Everything a replicated module needs from the hosting runtime: who the
/// local peer is, what roles it holds, and a way to send bytes.
///
/// Sends are fire-and-forget. Deliveries come back in through
/// `NetworkModule::receive` on the same logical thread.
pub trait NetworkContext {
    fn local_peer(&self) -> PeerId;

    fn is_server(&self) -> bool;

    fn is_client(&self) -> bool;

    fn is_host(&self) -> bool {
        self.is_server() && self.is_client()
    }

    /// The peer that owns the hosting entity, if any
    fn owner(&self) -> Option<PeerId>;

    fn is_owner(&self) -> bool {
        self.owner() == Some(self.local_peer())
    }

    /// Whether the hosting entity is live on the network. Before spawning,
    /// nothing is sent and authority is not enforced.
    fn is_spawned(&self) -> bool;

    /// Whether the local peer may initiate mutations.
    ///
    /// With `owner_auth` and an assigned owner, only the owner controls.
    /// Otherwise the server does.
    fn is_controller(&self, owner_auth: bool) -> bool {
        match self.owner() {
            Some(owner) if owner_auth => owner == self.local_peer(),
            _ => self.is_server(),
        }
    }

    /// Whether the local peer currently acts in `host_type`
    fn has_role(&self, host_type: HostType) -> bool {
        match host_type {
            HostType::Server => self.is_server(),
            HostType::Client => self.is_client(),
        }
    }

    fn send(&mut self, message: OutgoingMessage);

    fn send_to_all(
        &mut self,
        mode: DeliveryMode,
        payload: Vec<u8>,
        exclude_owner: bool,
        buffer_last: bool,
    ) {
        self.send(OutgoingMessage {
            target: MessageTarget::All {
                exclude_owner,
                buffer_last,
            },
            mode,
            payload,
        });
    }

    fn send_to_server(&mut self, mode: DeliveryMode, payload: Vec<u8>, require_ownership: bool) {
        self.send(OutgoingMessage {
            target: MessageTarget::Server { require_ownership },
            mode,
            payload,
        });
    }

    fn send_to_target(&mut self, target: PeerId, mode: DeliveryMode, payload: Vec<u8>) {
        self.send(OutgoingMessage {
            target: MessageTarget::Peer(target),
            mode,
            payload,
        });
    }
}
