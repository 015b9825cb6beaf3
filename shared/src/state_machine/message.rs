use tandem_serde::{BitReader, BitWrite, BitWriter, Serde, SerdeErr};

use crate::state_machine::{error::StateMachineError, payload::Payload};

const KIND_BITS: u8 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StateMessageKind {
    /// Client controller asking the server to apply a transition
    Request,
    /// Server announcing a transition to every observer
    Broadcast,
    /// Server syncing the current state to one late-joining observer
    Replay,
}

impl StateMessageKind {
    fn to_bits(self) -> u64 {
        match self {
            StateMessageKind::Request => 0,
            StateMessageKind::Broadcast => 1,
            StateMessageKind::Replay => 2,
        }
    }

    fn from_bits(bits: u64) -> Result<Self, SerdeErr> {
        match bits {
            0 => Ok(StateMessageKind::Request),
            1 => Ok(StateMessageKind::Broadcast),
            2 => Ok(StateMessageKind::Replay),
            _ => Err(SerdeErr::InvalidValue {
                type_name: "StateMessageKind",
                reason: "unknown message kind",
            }),
        }
    }
}

/// A state transition on the wire: a 2-bit kind, the 32-bit state id, a
/// presence bit and, when present, the payload in its own encoding.
///
/// The payload's type is not written. Receivers decode it as the type the
/// target state declares.
pub struct StateMachineMessage {
    pub kind: StateMessageKind,
    pub state_id: i32,
    pub payload: Option<Box<dyn Payload>>,
}

impl StateMachineMessage {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = BitWriter::new();
        self.write(&mut writer);
        writer.to_bytes()
    }

    pub fn write(&self, writer: &mut dyn BitWrite) {
        writer.write_bits(self.kind.to_bits(), KIND_BITS);
        self.state_id.ser(writer);
        self.payload.is_some().ser(writer);
        if let Some(payload) = &self.payload {
            payload.write(writer);
        }
    }

    /// Decodes a message. `read_payload` is handed the state id and a reader
    /// positioned at the payload, and is only called if one is present.
    pub fn from_bytes<F>(bytes: &[u8], read_payload: F) -> Result<Self, StateMachineError>
    where
        F: FnOnce(i32, &mut BitReader) -> Result<Box<dyn Payload>, StateMachineError>,
    {
        let mut reader = BitReader::new(bytes);
        let kind = StateMessageKind::from_bits(reader.read_bits(KIND_BITS)?)?;
        let state_id = i32::de(&mut reader)?;
        let payload = if bool::de(&mut reader)? {
            Some(read_payload(state_id, &mut reader)?)
        } else {
            None
        };

        Ok(Self {
            kind,
            state_id,
            payload,
        })
    }
}
