//! Error taxonomy of the server.
//!
//! Session errors stay local to one connection. Startup and simulation errors
//! end the process.

use crate::config::ConfigError;
use shared::framing::FramingError;
use std::io;

/// The client sent something that is not a valid intent.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed payload: {0}")]
    Decode(#[from] bincode::Error),
    #[error("unexpected {0} packet from client")]
    UnexpectedPacket(&'static str),
    #[error("frame of {len} bytes exceeds limit of {max}")]
    FrameTooLarge { len: usize, max: usize },
}

/// A new player could not be admitted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JoinError {
    #[error("player ids exhausted")]
    IdsExhausted,
}

/// Why a connection session ended.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("client disconnected")]
    Disconnected,
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),
    #[error("join rejected: {0}")]
    Rejected(#[from] JoinError),
}

impl From<FramingError> for SessionError {
    fn from(e: FramingError) -> Self {
        match e {
            FramingError::ConnectionClosed => SessionError::Disconnected,
            FramingError::FrameTooLarge { len, max } => {
                SessionError::Protocol(ProtocolError::FrameTooLarge { len, max })
            }
            FramingError::Io(e) => SessionError::Transport(e),
        }
    }
}

/// Broken world invariant. Always a bug, never a runtime condition.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimulationFault {
    #[error("{entity} left the arena at ({x}, {y})")]
    OutOfBounds { entity: String, x: f32, y: f32 },
    #[error("{entity} has a non-finite position or velocity")]
    NonFinite { entity: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
    #[error("simulation fault: {0}")]
    Simulation(#[from] SimulationFault),
}
