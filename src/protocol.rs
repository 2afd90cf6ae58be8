// Wire messages.
//
// Suffixes follow the direction of travel: `P` messages are sent by the
// punter, `S` messages by the server. In stateless mode the server echoes
// back whatever `state` the punter attached to its previous reply.

use std::io::BufRead;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::framing;
use crate::punter::{GameState, Map, PunterId, SiteId};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HandshakeP {
    pub me: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HandshakeS {
    pub you: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SetupS {
    pub punter: PunterId,
    pub punters: usize,
    pub map: Map,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Settings>,
}

/// Protocol extensions the server has switched on. Only logged; this client
/// never bids futures, splurges or buys options.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Settings {
    #[serde(default)]
    pub futures: bool,
    #[serde(default)]
    pub splurges: bool,
    #[serde(default)]
    pub options: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ReadyP {
    pub ready: PunterId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<GameState>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Move {
    Claim(Claim),
    Pass(Pass),
    Splurge(Splurge),
    #[serde(rename = "option")]
    BuyOption(Claim),
}

impl Move {
    pub fn claim(punter: PunterId, source: SiteId, target: SiteId) -> Move {
        Move::Claim(Claim {
            punter,
            source,
            target,
        })
    }

    pub fn pass(punter: PunterId) -> Move {
        Move::Pass(Pass { punter })
    }

    pub fn punter(&self) -> PunterId {
        match self {
            Move::Claim(claim) | Move::BuyOption(claim) => claim.punter,
            Move::Pass(pass) => pass.punter,
            Move::Splurge(splurge) => splurge.punter,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Claim {
    pub punter: PunterId,
    pub source: SiteId,
    pub target: SiteId,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pass {
    pub punter: PunterId,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Splurge {
    pub punter: PunterId,
    pub route: Vec<SiteId>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    pub punter: PunterId,
    pub score: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MoveP {
    #[serde(flatten)]
    pub play: Move,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<GameState>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Moves {
    pub moves: Vec<Move>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MovesScores {
    pub moves: Vec<Move>,
    pub scores: Vec<Score>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TurnS {
    // move is a reserved keyword
    #[serde(rename = "move")]
    pub turn: Moves,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<GameState>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StopS {
    pub stop: MovesScores,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<GameState>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct TimeoutS {
    pub timeout: f64,
}

/// Anything the server may send once the handshake is done.
///
/// Decoding looks at the top-level keys first so that a payload of unknown
/// shape is reported as such instead of as a field-level format error.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum ServerMessage {
    Setup(SetupS),
    Turn(TurnS),
    Stop(StopS),
    Timeout(TimeoutS),
}

impl ServerMessage {
    pub fn recv<R: BufRead>(stream: &mut R) -> Result<ServerMessage> {
        let payload = framing::recv_frame(stream)?;
        ServerMessage::from_payload(&payload)
    }

    pub fn from_payload(payload: &[u8]) -> Result<ServerMessage> {
        let value: Value = serde_json::from_slice(payload)?;
        ServerMessage::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<ServerMessage> {
        let kind = match value.as_object() {
            Some(obj) if obj.contains_key("move") => "turn",
            Some(obj) if obj.contains_key("stop") => "stop",
            Some(obj) if obj.contains_key("punter") => "setup",
            Some(obj) if obj.contains_key("timeout") => "timeout",
            Some(obj) => {
                let keys = obj.keys().map(String::as_str).collect::<Vec<_>>();
                return Err(Error::Unrecognized(format!("keys [{}]", keys.join(", "))));
            }
            None => return Err(Error::Unrecognized(format!("non-object {}", value))),
        };
        let msg = match kind {
            "turn" => ServerMessage::Turn(serde_json::from_value(value)?),
            "stop" => ServerMessage::Stop(serde_json::from_value(value)?),
            "setup" => ServerMessage::Setup(serde_json::from_value(value)?),
            _ => ServerMessage::Timeout(serde_json::from_value(value)?),
        };
        Ok(msg)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::Setup(_) => "setup",
            ServerMessage::Turn(_) => "turn",
            ServerMessage::Stop(_) => "stop",
            ServerMessage::Timeout(_) => "timeout",
        }
    }
}

pub fn handshake(name: String) -> HandshakeP {
    HandshakeP { me: name }
}
