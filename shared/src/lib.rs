//! Wire model and codec shared by the arena server and its clients.
//!
//! Every message travels as one length-prefixed frame (see [`framing`]) whose
//! payload is a bincode-encoded [`Packet`]. Decoding is strict: unknown
//! variants, non-0/1 booleans, truncated payloads and trailing bytes are all
//! rejected.

use bincode::Options;
use serde::{Deserialize, Serialize};

pub mod framing;

pub const ARENA_WIDTH: f32 = 800.0;
pub const ARENA_HEIGHT: f32 = 600.0;
pub const PLAYER_RADIUS: f32 = 20.0;
pub const PLAYER_SPEED: f32 = 5.0;
pub const NPC_RADIUS: f32 = 15.0;
pub const CAPTURE_REWARD: u32 = 10;

/// Largest payload either side will ever put in a frame.
pub const MAX_FRAME_LEN: usize = 1 << 20;
/// Largest payload the server accepts from a client. An intent is 8 bytes.
pub const MAX_CLIENT_FRAME_LEN: usize = 256;

pub type PlayerId = u32;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum Packet {
    /// Client -> server: the directional keys currently held.
    Intent(Intent),
    /// Server -> client: the world as seen right after the intent was applied.
    State(GameSnapshot),
}

/// Directional input for one player. The latest intent replaces the previous
/// one outright. All four keys are always on the wire; a released key is
/// encoded as `false`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct Intent {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

impl Intent {
    /// Horizontal direction in `{-1, 0, 1}`, positive to the right.
    pub fn axis_x(&self) -> f32 {
        f32::from(u8::from(self.right)) - f32::from(u8::from(self.left))
    }

    /// Vertical direction in `{-1, 0, 1}`, positive downwards.
    pub fn axis_y(&self) -> f32 {
        f32::from(u8::from(self.down)) - f32::from(u8::from(self.up))
    }

    pub fn is_idle(&self) -> bool {
        self.axis_x() == 0.0 && self.axis_y() == 0.0
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GameSnapshot {
    /// Id of the player this snapshot was produced for.
    #[serde(rename = "self")]
    pub self_id: PlayerId,
    pub players: Vec<PlayerState>,
    pub npcs: Vec<NpcState>,
}

impl GameSnapshot {
    pub fn player(&self, id: PlayerId) -> Option<&PlayerState> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn own(&self) -> Option<&PlayerState> {
        self.player(self.self_id)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PlayerState {
    pub id: PlayerId,
    pub x: f32,
    pub y: f32,
    pub score: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NpcState {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

fn codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .with_limit(MAX_FRAME_LEN as u64)
        .reject_trailing_bytes()
}

/// Serializes a packet into a frame payload.
pub fn encode_packet(packet: &Packet) -> bincode::Result<Vec<u8>> {
    codec().serialize(packet)
}

/// Parses a frame payload, rejecting anything that is not exactly one packet.
pub fn decode_packet(bytes: &[u8]) -> bincode::Result<Packet> {
    codec().deserialize(bytes)
}
