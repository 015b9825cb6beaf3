use std::{
    any::{type_name, Any, TypeId},
    collections::HashMap,
    marker::PhantomData,
};

use tandem_serde::{BitReader, BitWrite, Serde, SerdeErr};

/// Identifies a payload type. Compared by `TypeId`, the name is for messages.
#[derive(Clone, Copy, Debug)]
pub struct PayloadKind {
    type_id: TypeId,
    type_name: &'static str,
}

impl PayloadKind {
    pub fn of<P: Serde + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<P>(),
            type_name: type_name::<P>(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl PartialEq for PayloadKind {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for PayloadKind {}

impl std::hash::Hash for PayloadKind {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

/// Type-erased data carried by a state transition
pub trait Payload: Any {
    fn kind(&self) -> PayloadKind;

    fn write(&self, writer: &mut dyn BitWrite);

    fn clone_boxed(&self) -> Box<dyn Payload>;

    fn equals(&self, other: &dyn Payload) -> bool;

    fn as_any(&self) -> &dyn Any;
}

impl<T: Serde + 'static> Payload for T {
    fn kind(&self) -> PayloadKind {
        PayloadKind::of::<T>()
    }

    fn write(&self, writer: &mut dyn BitWrite) {
        self.ser(writer);
    }

    fn clone_boxed(&self) -> Box<dyn Payload> {
        Box::new(self.clone())
    }

    fn equals(&self, other: &dyn Payload) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| other == self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl dyn Payload {
    pub fn downcast_ref<P: 'static>(&self) -> Option<&P> {
        self.as_any().downcast_ref::<P>()
    }
}

impl Clone for Box<dyn Payload> {
    fn clone(&self) -> Self {
        (**self).clone_boxed()
    }
}

trait PayloadBuilder {
    fn read(&self, reader: &mut BitReader) -> Result<Box<dyn Payload>, SerdeErr>;
}

struct TypedPayloadBuilder<P> {
    phantom: PhantomData<fn() -> P>,
}

impl<P: Serde + 'static> PayloadBuilder for TypedPayloadBuilder<P> {
    fn read(&self, reader: &mut BitReader) -> Result<Box<dyn Payload>, SerdeErr> {
        Ok(Box::new(P::de(reader)?))
    }
}

/// Registry of every payload type a state machine may carry, used to decode
/// a payload once the receiving node's declared kind is known
pub struct PayloadKinds {
    builders: HashMap<PayloadKind, Box<dyn PayloadBuilder>>,
}

impl PayloadKinds {
    pub fn new() -> Self {
        Self {
            builders: HashMap::new(),
        }
    }

    pub fn add_payload<P: Serde + 'static>(&mut self) {
        self.builders.insert(
            PayloadKind::of::<P>(),
            Box::new(TypedPayloadBuilder::<P> {
                phantom: PhantomData,
            }),
        );
    }

    pub fn contains(&self, kind: &PayloadKind) -> bool {
        self.builders.contains_key(kind)
    }

    pub fn len(&self) -> usize {
        self.builders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }

    /// Decodes a payload of `kind`. Returns `None` if `kind` was never registered.
    pub fn read(
        &self,
        kind: &PayloadKind,
        reader: &mut BitReader,
    ) -> Option<Result<Box<dyn Payload>, SerdeErr>> {
        self.builders.get(kind).map(|builder| builder.read(reader))
    }
}

impl Default for PayloadKinds {
    fn default() -> Self {
        Self::new()
    }
}
