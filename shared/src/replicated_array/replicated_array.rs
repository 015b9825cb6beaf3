use std::{collections::VecDeque, ops::Index, slice};

use log::{debug, error, warn};

use tandem_serde::Serde;

use crate::{
    network::{
        context::{DeliveryMode, NetworkContext},
        module::NetworkModule,
    },
    replicated_array::{
        change::ArrayChange, config::ReplicatedArrayConfig, error::ArrayError,
        message::ArrayMessage,
    },
    types::PeerId,
};

/// A fixed-capacity array whose element writes, clears and resizes are
/// replicated to every observer.
///
/// Only the controller (see `NetworkContext::is_controller`) may mutate it
/// once the hosting entity is spawned. Reads are never checked. Capacity only
/// changes through `resize`; positional insertion and removal are unsupported.
pub struct ReplicatedArray<T: Serde + Default> {
    owner_auth: bool,
    items: Vec<T>,
    changes: VecDeque<ArrayChange<T>>,
}

impl<T: Serde + Default> ReplicatedArray<T> {
    pub fn new(config: ReplicatedArrayConfig) -> Self {
        let mut items = Vec::with_capacity(config.initial_length);
        items.resize_with(config.initial_length, T::default);
        Self {
            owner_auth: config.owner_auth,
            items,
            changes: VecDeque::new(),
        }
    }

    pub fn with_length(length: usize, owner_auth: bool) -> Self {
        Self::new(ReplicatedArrayConfig {
            owner_auth,
            initial_length: length,
        })
    }

    pub fn owner_auth(&self) -> bool {
        self.owner_auth
    }

    // Read path

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.items.clone()
    }

    pub fn index_of(&self, value: &T) -> Option<usize> {
        self.items.iter().position(|item| item == value)
    }

    pub fn contains(&self, value: &T) -> bool {
        self.index_of(value).is_some()
    }

    /// Drains every change recorded since the last call, oldest first
    pub fn take_changes(&mut self) -> Vec<ArrayChange<T>> {
        self.changes.drain(..).collect()
    }

    // Mutation

    /// Writes `value` at `index` and replicates it
    ///
    /// # Panics
    ///
    /// Panics if the local peer is not the controller or `index` is out of range.
    /// Consider using `try_set` for non-panicking error handling.
    pub fn set(&mut self, ctx: &mut dyn NetworkContext, index: usize, value: T) {
        if let Err(err) = self.try_set(ctx, index, value) {
            panic!("{}", err);
        }
    }

    /// Writes `value` at `index` and replicates it. Writing a value equal to
    /// the current one does nothing.
    pub fn try_set(
        &mut self,
        ctx: &mut dyn NetworkContext,
        index: usize,
        value: T,
    ) -> Result<(), ArrayError> {
        self.validate_authority(ctx, "set")?;

        let length = self.items.len();
        let Some(item) = self.items.get_mut(index) else {
            return Err(ArrayError::IndexOutOfRange { index, length });
        };

        if *item == value {
            return Ok(());
        }
        *item = value.clone();

        self.changes.push_back(ArrayChange::Set {
            index,
            value: value.clone(),
        });

        if ctx.is_spawned() {
            let index = wire_length(index)?;
            self.send(ctx, &ArrayMessage::Set { index, value });
        }
        Ok(())
    }

    /// Changes the length, truncating or filling with default values
    ///
    /// # Panics
    ///
    /// Panics if the local peer is not the controller or the length doesn't fit the wire.
    /// Consider using `try_resize` for non-panicking error handling.
    pub fn resize(&mut self, ctx: &mut dyn NetworkContext, length: usize) {
        if let Err(err) = self.try_resize(ctx, length) {
            panic!("{}", err);
        }
    }

    pub fn try_resize(
        &mut self,
        ctx: &mut dyn NetworkContext,
        length: usize,
    ) -> Result<(), ArrayError> {
        self.validate_authority(ctx, "resize")?;
        let wire = wire_length(length)?;

        if self.items.len() == length {
            return Ok(());
        }
        self.items.resize_with(length, T::default);

        self.changes.push_back(ArrayChange::Resized { length });

        if ctx.is_spawned() {
            self.send(ctx, &ArrayMessage::Resize { length: wire });
        }
        Ok(())
    }

    /// Resets every element to its default value, keeping the length
    ///
    /// # Panics
    ///
    /// Panics if the local peer is not the controller.
    /// Consider using `try_clear` for non-panicking error handling.
    pub fn clear(&mut self, ctx: &mut dyn NetworkContext) {
        if let Err(err) = self.try_clear(ctx) {
            panic!("{}", err);
        }
    }

    pub fn try_clear(&mut self, ctx: &mut dyn NetworkContext) -> Result<(), ArrayError> {
        self.validate_authority(ctx, "clear")?;

        self.reset_items();
        self.changes.push_back(ArrayChange::Cleared);

        if ctx.is_spawned() {
            self.send(ctx, &ArrayMessage::Clear);
        }
        Ok(())
    }

    /// Re-sends the current value at `index` without changing it, for values
    /// mutated in place behind `set`'s back
    ///
    /// # Panics
    ///
    /// Panics if the local peer is not the controller or `index` is out of range.
    /// Consider using `try_mark_dirty` for non-panicking error handling.
    pub fn mark_dirty(&mut self, ctx: &mut dyn NetworkContext, index: usize) {
        if let Err(err) = self.try_mark_dirty(ctx, index) {
            panic!("{}", err);
        }
    }

    pub fn try_mark_dirty(
        &mut self,
        ctx: &mut dyn NetworkContext,
        index: usize,
    ) -> Result<(), ArrayError> {
        if !ctx.is_spawned() {
            return Ok(());
        }
        self.validate_authority(ctx, "mark_dirty")?;

        let Some(value) = self.items.get(index).cloned() else {
            let length = self.items.len();
            error!(
                "Invalid index {} for mark_dirty in ReplicatedArray. Array length: {}",
                index, length
            );
            return Err(ArrayError::IndexOutOfRange { index, length });
        };

        self.changes.push_back(ArrayChange::Set {
            index,
            value: value.clone(),
        });

        let index = wire_length(index)?;
        self.send(ctx, &ArrayMessage::Set { index, value });
        Ok(())
    }

    // Structural operations a list would have. None are supported.

    pub fn insert(&mut self, _index: usize, _value: T) -> Result<(), ArrayError> {
        Err(ArrayError::UnsupportedOperation {
            operation: "insert",
        })
    }

    pub fn remove_at(&mut self, _index: usize) -> Result<T, ArrayError> {
        Err(ArrayError::UnsupportedOperation {
            operation: "remove_at",
        })
    }

    pub fn push(&mut self, _value: T) -> Result<(), ArrayError> {
        Err(ArrayError::UnsupportedOperation { operation: "push" })
    }

    pub fn remove(&mut self, _value: &T) -> Result<bool, ArrayError> {
        Err(ArrayError::UnsupportedOperation {
            operation: "remove",
        })
    }

    // Internals

    fn validate_authority(
        &self,
        ctx: &dyn NetworkContext,
        operation: &'static str,
    ) -> Result<(), ArrayError> {
        if !ctx.is_spawned() {
            return Ok(());
        }
        if ctx.is_controller(self.owner_auth) {
            return Ok(());
        }

        let err = ArrayError::AuthorityViolation {
            operation,
            owner_auth: self.owner_auth,
        };
        error!("{} (local peer: {})", err, ctx.local_peer());
        Err(err)
    }

    fn reset_items(&mut self) {
        for item in self.items.iter_mut() {
            *item = T::default();
        }
    }

    /// Server authority broadcasts to everyone, owner authority goes through
    /// the server which relays it.
    fn send(&self, ctx: &mut dyn NetworkContext, message: &ArrayMessage<T>) {
        let payload = message.to_bytes();
        if ctx.is_server() {
            ctx.send_to_all(DeliveryMode::ReliableOrdered, payload, false, false);
        } else {
            ctx.send_to_server(DeliveryMode::ReliableOrdered, payload, true);
        }
    }

    fn apply_remote(&mut self, message: ArrayMessage<T>) -> Result<(), ArrayError> {
        match message {
            ArrayMessage::InitialSize { length } => {
                let length = local_length(length)?;
                if self.items.len() != length {
                    self.items.resize_with(length, T::default);
                    self.reset_items();
                    self.changes.push_back(ArrayChange::Resized { length });
                    self.changes.push_back(ArrayChange::Cleared);
                }
            }
            ArrayMessage::Set { index, value } => {
                let slot = usize::try_from(index)
                    .ok()
                    .and_then(|index| self.items.get_mut(index).map(|item| (index, item)));
                let Some((index, item)) = slot else {
                    warn!(
                        "Ignoring remote write to index {} of a ReplicatedArray with length {}",
                        index,
                        self.items.len()
                    );
                    return Ok(());
                };
                *item = value.clone();
                self.changes.push_back(ArrayChange::Set { index, value });
            }
            ArrayMessage::Clear => {
                self.reset_items();
                self.changes.push_back(ArrayChange::Cleared);
            }
            ArrayMessage::Resize { length } => {
                let length = local_length(length)?;
                if self.items.len() != length {
                    self.items.resize_with(length, T::default);
                    self.changes.push_back(ArrayChange::Resized { length });
                }
            }
        }
        Ok(())
    }

    fn full_state_messages(&self) -> Result<Vec<ArrayMessage<T>>, ArrayError> {
        let mut messages = Vec::with_capacity(self.items.len() + 1);
        messages.push(ArrayMessage::InitialSize {
            length: wire_length(self.items.len())?,
        });
        for (index, value) in self.items.iter().enumerate() {
            messages.push(ArrayMessage::Set {
                index: wire_length(index)?,
                value: value.clone(),
            });
        }
        Ok(messages)
    }
}

impl<T: Serde + Default> NetworkModule for ReplicatedArray<T> {
    type Error = ArrayError;

    /// The controller announces the length, then every element
    fn on_spawned(&mut self, ctx: &mut dyn NetworkContext) -> Result<(), ArrayError> {
        if !ctx.is_controller(self.owner_auth) {
            return Ok(());
        }

        for message in self.full_state_messages()? {
            self.send(ctx, &message);
        }
        Ok(())
    }

    /// Sends the joiner the length, then every element as its own indexed
    /// write, so initial and incremental sync share one code path
    fn on_observer_added(&mut self, ctx: &mut dyn NetworkContext, observer: PeerId) {
        if !ctx.is_server() {
            return;
        }

        let messages = match self.full_state_messages() {
            Ok(messages) => messages,
            Err(err) => {
                error!("Can't sync ReplicatedArray to {}: {}", observer, err);
                return;
            }
        };
        debug!(
            "Syncing ReplicatedArray of length {} to {}",
            self.items.len(),
            observer
        );
        for message in messages {
            ctx.send_to_target(observer, DeliveryMode::ReliableOrdered, message.to_bytes());
        }
    }

    fn receive(
        &mut self,
        ctx: &mut dyn NetworkContext,
        from: PeerId,
        payload: &[u8],
    ) -> Result<(), ArrayError> {
        let message = ArrayMessage::<T>::from_bytes(payload)?;

        if !ctx.is_server() {
            return self.apply_remote(message);
        }

        // On the server, only the owning client may write, and only with owner authority
        if !self.owner_auth || ctx.owner() != Some(from) {
            warn!(
                "Dropping ReplicatedArray message from {}, which doesn't control it",
                from
            );
            return Err(ArrayError::UnauthorizedSender { peer: from });
        }

        self.apply_remote(message)?;
        ctx.send_to_all(DeliveryMode::ReliableOrdered, payload.to_vec(), true, false);
        Ok(())
    }
}

impl<T: Serde + Default> Index<usize> for ReplicatedArray<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.items[index]
    }
}

impl<'a, T: Serde + Default> IntoIterator for &'a ReplicatedArray<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

fn wire_length(value: usize) -> Result<i32, ArrayError> {
    i32::try_from(value).map_err(|_| ArrayError::InvalidLength {
        length: value as i64,
    })
}

fn local_length(value: i32) -> Result<usize, ArrayError> {
    usize::try_from(value).map_err(|_| ArrayError::InvalidLength {
        length: value as i64,
    })
}
