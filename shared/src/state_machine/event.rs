/// Local notifications from a `StateMachine`. Recorded after the machine's
/// state has already changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StateMachineEvent {
    /// Fired on every peer that applied a transition. `None` means no active state.
    StateChanged {
        previous: Option<usize>,
        current: Option<usize>,
    },
    /// Fired after a transition received from the network was applied
    ReceivedNewData,
}
