/// Contains Config properties which will be used by a StateMachine
#[derive(Clone, Debug)]
pub struct StateMachineConfig {
    /// When true, and the hosting entity has an owner, the owning client is
    /// the only peer allowed to initiate transitions. Otherwise only the server is.
    pub owner_auth: bool,
    /// Whether the controller enters the first state when the hosting entity spawns
    pub enter_first_state_on_spawn: bool,
}

impl Default for StateMachineConfig {
    fn default() -> Self {
        Self {
            owner_auth: false,
            enter_first_state_on_spawn: true,
        }
    }
}
