// Messages exchanged between routers.

use serde::{Deserialize, Serialize};

use crate::types::RouterId;

/// Command recognized in a control message.
pub const DOWN_COMMAND: &str = "DOWN";

/// A message on the wire is exactly one of these variants. The `type`
/// field is the discriminant; unknown values are rejected on decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireMessage {
    DistanceVectorUpdate(DistanceVectorUpdate),
    ControlMessage(ControlMessage),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceVectorUpdate {
    pub origin_id: RouterId,
    pub entries: Vec<DistanceEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistanceEntry {
    pub node_id: RouterId,
    pub distance: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlMessage {
    pub origin_id: RouterId,
    pub command: String,
}

/// Commands a router acts upon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    Down,
}

impl ControlMessage {
    pub fn down(origin_id: impl Into<String>) -> Self {
        Self {
            origin_id: origin_id.into(),
            command: DOWN_COMMAND.to_string(),
        }
    }

    /// Returns `None` for commands this router does not know.
    pub fn parsed_command(&self) -> Option<ControlCommand> {
        match self.command.as_str() {
            DOWN_COMMAND => Some(ControlCommand::Down),
            _ => None,
        }
    }
}

impl WireMessage {
    pub fn origin_id(&self) -> &str {
        match self {
            WireMessage::DistanceVectorUpdate(update) => &update.origin_id,
            WireMessage::ControlMessage(control) => &control.origin_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            WireMessage::DistanceVectorUpdate(_) => "distance_vector_update",
            WireMessage::ControlMessage(_) => "control_message",
        }
    }
}

impl From<DistanceVectorUpdate> for WireMessage {
    fn from(update: DistanceVectorUpdate) -> Self {
        WireMessage::DistanceVectorUpdate(update)
    }
}

impl From<ControlMessage> for WireMessage {
    fn from(control: ControlMessage) -> Self {
        WireMessage::ControlMessage(control)
    }
}
