//! Outbound commands.
//!
//! A [`Command`] is the typed form of what the mobile client tells the mirror.
//! Each command maps to one wire name and contributes its own fields on top of
//! the common `room`/`userId`/`type` triple added by the dispatcher.

use std::{fmt, str::FromStr};

use serde_json::{Map, Value};

use crate::ProtocolError;

/// Client type announced in every outbound envelope.
pub const CLIENT_TYPE: &str = "mobile";

/// Wire names of all outbound commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandName {
    /// `join` - request to join a room
    Join,
    /// `client-leave` - leave the room before tearing down
    ClientLeave,
    /// `product-select`
    ProductSelect,
    /// `tea-select`
    TeaSelect,
    /// `tea-order`
    TeaOrder,
    /// `treatment-select`
    TreatmentSelect,
    /// `view-treatment`
    ViewTreatment,
}

impl CommandName {
    /// Every command, in wire-table order.
    pub const ALL: [Self; 7] = [
        Self::Join,
        Self::ClientLeave,
        Self::ProductSelect,
        Self::TeaSelect,
        Self::TeaOrder,
        Self::TreatmentSelect,
        Self::ViewTreatment,
    ];

    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Join => "join",
            Self::ClientLeave => "client-leave",
            Self::ProductSelect => "product-select",
            Self::TeaSelect => "tea-select",
            Self::TeaOrder => "tea-order",
            Self::TreatmentSelect => "treatment-select",
            Self::ViewTreatment => "view-treatment",
        }
    }

    /// Whether the session must be paired before this command may be sent.
    ///
    /// Only the handshake commands are exempt.
    pub fn requires_pairing(self) -> bool {
        !matches!(self, Self::Join | Self::ClientLeave)
    }
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandName {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| ProtocolError::UnknownCommand(s.to_string()))
    }
}

/// A typed outbound command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Join the stored room.
    Join,
    /// Leave the current room.
    ClientLeave,
    /// Highlight a product on the mirror.
    ProductSelect {
        /// Position in the product list.
        index: u32,
    },
    /// Highlight a tea.
    TeaSelect {
        /// Position in the tea list.
        index: u32,
    },
    /// Place a tea order.
    TeaOrder {
        /// JSON-encoded order, passed through untouched.
        data: String,
    },
    /// Highlight a treatment.
    TreatmentSelect {
        /// Position in the treatment list.
        index: u32,
    },
    /// Show an appointment's treatment details.
    ViewTreatment {
        /// JSON-encoded appointment, passed through untouched.
        data: String,
    },
}

impl Command {
    /// Wire name of this command.
    pub fn name(&self) -> CommandName {
        match self {
            Self::Join => CommandName::Join,
            Self::ClientLeave => CommandName::ClientLeave,
            Self::ProductSelect { .. } => CommandName::ProductSelect,
            Self::TeaSelect { .. } => CommandName::TeaSelect,
            Self::TeaOrder { .. } => CommandName::TeaOrder,
            Self::TreatmentSelect { .. } => CommandName::TreatmentSelect,
            Self::ViewTreatment { .. } => CommandName::ViewTreatment,
        }
    }

    /// See [`CommandName::requires_pairing`].
    pub fn requires_pairing(&self) -> bool {
        self.name().requires_pairing()
    }

    /// Command-specific fields, excluding the common envelope fields.
    pub fn fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        match self {
            Self::Join | Self::ClientLeave => {},
            Self::ProductSelect { index }
            | Self::TeaSelect { index }
            | Self::TreatmentSelect { index } => {
                fields.insert("index".into(), Value::from(*index));
            },
            Self::TeaOrder { data } | Self::ViewTreatment { data } => {
                fields.insert("data".into(), Value::String(data.clone()));
            },
        }
        fields
    }
}
