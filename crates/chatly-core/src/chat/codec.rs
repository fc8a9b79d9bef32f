//! Turn codec: raw text <-> [`Turn`] <-> provider [`WireTurn`].
//!
//! No validation or sanitization happens here. Content is carried verbatim,
//! including the empty string.

use chatly_types::error::CodecError;
use chatly_types::turn::{Turn, TurnRole, WirePart, WireTurn};

pub struct TurnCodec;

impl TurnCodec {
    /// Wrap inbound client text as a user turn.
    pub fn to_user_turn(text: impl Into<String>) -> Turn {
        Turn::new(TurnRole::User, text)
    }

    /// Wrap a completion result as a model turn.
    pub fn to_model_turn(text: impl Into<String>) -> Turn {
        Turn::new(TurnRole::Model, text)
    }

    /// Encode a turn as a single-part wire turn.
    pub fn encode(turn: &Turn) -> WireTurn {
        WireTurn {
            role: turn.role().to_string(),
            parts: vec![WirePart {
                text: turn.content().to_string(),
            }],
        }
    }

    pub fn encode_all(turns: &[Turn]) -> Vec<WireTurn> {
        turns.iter().map(Self::encode).collect()
    }

    /// Decode a wire turn. Multiple parts are concatenated in order.
    pub fn decode(wire: &WireTurn) -> Result<Turn, CodecError> {
        let role: TurnRole = wire
            .role
            .parse()
            .map_err(|_| CodecError::UnknownRole(wire.role.clone()))?;
        let content: String = wire.parts.iter().map(|p| p.text.as_str()).collect();
        Ok(Turn::new(role, content))
    }
}
