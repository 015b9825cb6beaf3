use std::collections::VecDeque;

use log::{debug, warn};

use tandem_shared::{MessageTarget, NetworkModule, OutgoingMessage, PeerId};

use super::RecordingContext;

pub const SERVER_PEER: PeerId = PeerId::new(0);

struct Peer<M> {
    ctx: RecordingContext,
    module: M,
    received: Vec<Vec<u8>>,
}

/// One server and any number of clients, each running its own copy of a
/// module, connected by reliable-ordered in-memory delivery.
///
/// Messages only move on `flush`. A buffered broadcast is kept and delivered
/// to clients that join afterwards, before the server's own observer sync.
pub struct LocalNetwork<M: NetworkModule> {
    factory: Box<dyn Fn() -> M>,
    server: Peer<M>,
    clients: Vec<Peer<M>>,
    owner: Option<PeerId>,
    buffered: Option<Vec<u8>>,
    errors: Vec<(PeerId, M::Error)>,
}

impl<M: NetworkModule> LocalNetwork<M> {
    pub fn new(factory: impl Fn() -> M + 'static) -> Self {
        let server = Peer {
            ctx: RecordingContext::server().unspawned(),
            module: factory(),
            received: Vec::new(),
        };
        Self {
            factory: Box::new(factory),
            server,
            clients: Vec::new(),
            owner: None,
            buffered: None,
            errors: Vec::new(),
        }
    }

    /// Assigns ownership of the hosting entity to `owner` on every peer
    pub fn with_owner(mut self, owner: u64) -> Self {
        let owner = PeerId::new(owner);
        self.owner = Some(owner);
        self.server.ctx.owner = Some(owner);
        for client in &mut self.clients {
            client.ctx.owner = Some(owner);
        }
        self
    }

    /// Spawns the entity on the server and delivers what that produces
    pub fn spawn(&mut self) {
        self.server.ctx.spawned = true;
        if let Err(err) = self.server.module.on_spawned(&mut self.server.ctx) {
            self.errors.push((SERVER_PEER, err));
        }
        self.flush();
    }

    /// Connects a new client and attaches it as an observer
    pub fn add_client(&mut self) -> PeerId {
        let peer = PeerId::new(self.clients.len() as u64 + 1);
        let mut ctx = RecordingContext::client(peer.to_u64());
        ctx.owner = self.owner;
        self.clients.push(Peer {
            ctx,
            module: (self.factory)(),
            received: Vec::new(),
        });
        debug!("{} joined", peer);

        if let Some(bytes) = self.buffered.clone() {
            self.deliver(SERVER_PEER, peer, bytes);
        }
        self.server.module.on_observer_added(&mut self.server.ctx, peer);
        self.flush();

        let client = self.peer_mut(peer);
        if let Err(err) = client.module.on_spawned(&mut client.ctx) {
            self.errors.push((peer, err));
        }
        self.flush();

        peer
    }

    pub fn client_ids(&self) -> Vec<PeerId> {
        self.clients.iter().map(|client| client.ctx.local_peer).collect()
    }

    pub fn server(&self) -> &M {
        &self.server.module
    }

    pub fn client(&self, peer: PeerId) -> &M {
        &self.peer(peer).module
    }

    /// Runs `f` against the server's module and context, then flushes
    pub fn with_server<R>(&mut self, f: impl FnOnce(&mut M, &mut RecordingContext) -> R) -> R {
        let result = f(&mut self.server.module, &mut self.server.ctx);
        self.flush();
        result
    }

    /// Runs `f` against a client's module and context, then flushes
    pub fn with_client<R>(
        &mut self,
        peer: PeerId,
        f: impl FnOnce(&mut M, &mut RecordingContext) -> R,
    ) -> R {
        let client = self.peer_mut(peer);
        let result = f(&mut client.module, &mut client.ctx);
        self.flush();
        result
    }

    /// Every payload `peer` has received, in delivery order
    pub fn received(&self, peer: PeerId) -> &[Vec<u8>] {
        &self.peer(peer).received
    }

    /// Errors returned by `receive` or `on_spawned`, drained
    pub fn take_errors(&mut self) -> Vec<(PeerId, M::Error)> {
        std::mem::take(&mut self.errors)
    }

    /// Delivers outgoing messages until no peer has anything left to send
    pub fn flush(&mut self) {
        loop {
            let mut outgoing = VecDeque::new();
            for message in self.server.ctx.take_sent() {
                outgoing.push_back((SERVER_PEER, message));
            }
            for client in &mut self.clients {
                let from = client.ctx.local_peer;
                for message in client.ctx.take_sent() {
                    outgoing.push_back((from, message));
                }
            }

            if outgoing.is_empty() {
                return;
            }
            while let Some((from, message)) = outgoing.pop_front() {
                self.route(from, message);
            }
        }
    }

    fn route(&mut self, from: PeerId, message: OutgoingMessage) {
        let OutgoingMessage {
            target, payload, ..
        } = message;

        match target {
            MessageTarget::All {
                exclude_owner,
                buffer_last,
            } => {
                if buffer_last && from == SERVER_PEER {
                    self.buffered = Some(payload.clone());
                }
                let mut recipients = self.client_ids();
                if from != SERVER_PEER {
                    recipients.push(SERVER_PEER);
                }
                for peer in recipients {
                    if peer == from || (exclude_owner && Some(peer) == self.owner) {
                        continue;
                    }
                    self.deliver(from, peer, payload.clone());
                }
            }
            MessageTarget::Server { require_ownership } => {
                if require_ownership && Some(from) != self.owner {
                    warn!("Transport dropped a message from {}, which isn't the owner", from);
                    return;
                }
                self.deliver(from, SERVER_PEER, payload);
            }
            MessageTarget::Peer(peer) => {
                self.deliver(from, peer, payload);
            }
        }
    }

    fn deliver(&mut self, from: PeerId, to: PeerId, payload: Vec<u8>) {
        let peer = self.peer_mut(to);
        let result = peer.module.receive(&mut peer.ctx, from, &payload);
        peer.received.push(payload);
        if let Err(err) = result {
            self.errors.push((to, err));
        }
    }

    fn peer(&self, peer: PeerId) -> &Peer<M> {
        if peer == SERVER_PEER {
            return &self.server;
        }
        self.clients
            .iter()
            .find(|client| client.ctx.local_peer == peer)
            .unwrap_or_else(|| panic!("{} is not connected", peer))
    }

    fn peer_mut(&mut self, peer: PeerId) -> &mut Peer<M> {
        if peer == SERVER_PEER {
            return &mut self.server;
        }
        self.clients
            .iter_mut()
            .find(|client| client.ctx.local_peer == peer)
            .unwrap_or_else(|| panic!("{} is not connected", peer))
    }
}
