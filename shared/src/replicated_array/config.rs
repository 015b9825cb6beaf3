/// Contains Config properties which will be used by a ReplicatedArray
#[derive(Clone, Debug)]
pub struct ReplicatedArrayConfig {
    /// When true, and the hosting entity has an owner, the owning client is
    /// the only peer allowed to mutate the array. Otherwise only the server is.
    pub owner_auth: bool,
    /// Number of default-valued elements the array starts with
    pub initial_length: usize,
}

impl Default for ReplicatedArrayConfig {
    fn default() -> Self {
        Self {
            owner_auth: false,
            initial_length: 0,
        }
    }
}
