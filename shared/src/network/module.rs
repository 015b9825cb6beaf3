use crate::{network::context::NetworkContext, types::PeerId};

/// Lifecycle of a replicated unit hosted on a network entity.
///
/// The hosting runtime calls these explicitly; the module never reaches into
/// the runtime on its own.
pub trait NetworkModule {
    type Error: std::error::Error;

    /// The hosting entity has just become live on the network
    fn on_spawned(&mut self, ctx: &mut dyn NetworkContext) -> Result<(), Self::Error>;

    /// Server side: a new observer attached and needs the current state
    fn on_observer_added(&mut self, ctx: &mut dyn NetworkContext, observer: PeerId);

    /// A message produced by this module on another peer has arrived
    fn receive(
        &mut self,
        ctx: &mut dyn NetworkContext,
        from: PeerId,
        payload: &[u8],
    ) -> Result<(), Self::Error>;

    /// Called once per tick
    fn update(&mut self, _ctx: &mut dyn NetworkContext) {}
}
