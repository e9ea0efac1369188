//! One connected client, from first byte to disconnect.

use crate::error::{ProtocolError, SessionError};
use crate::world_handle::WorldHandle;
use log::{debug, info, warn};
use shared::framing::{read_frame, write_frame};
use shared::{decode_packet, encode_packet, Packet, PlayerId, MAX_CLIENT_FRAME_LEN};
use std::net::SocketAddr;
use tokio::io::{AsyncRead, AsyncWrite};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Active(PlayerId),
    Closed,
}

/// Lockstep request/response loop for one client: read an intent, store it,
/// reply with a snapshot. The world lock is only held inside
/// [`WorldHandle`] calls, never across a read or a write.
pub struct ConnectionSession<S> {
    stream: S,
    peer: SocketAddr,
    world: WorldHandle,
    state: SessionState,
}

impl<S> ConnectionSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, peer: SocketAddr, world: WorldHandle) -> Self {
        Self {
            stream,
            peer,
            world,
            state: SessionState::Connecting,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Joins the world as a new player.
    pub async fn activate(&mut self) -> Result<PlayerId, SessionError> {
        if let SessionState::Active(id) = self.state {
            return Ok(id);
        }
        let id = self.world.add_player().await?;
        self.state = SessionState::Active(id);
        info!("Player {} joined from {}", id, self.peer);
        Ok(id)
    }

    /// Serves the client until it disconnects or misbehaves, then removes its
    /// player. Returns the reason the session ended.
    pub async fn run(mut self) -> SessionError {
        let id = match self.activate().await {
            Ok(id) => id,
            Err(reason) => {
                warn!("Refused {}: {}", self.peer, reason);
                self.state = SessionState::Closed;
                return reason;
            }
        };
        let reason = match self.serve(id).await {
            Ok(never) => match never {},
            Err(e) => e,
        };
        self.close(id).await;

        match &reason {
            SessionError::Disconnected => info!("Player {} disconnected", id),
            SessionError::Protocol(e) => warn!("Player {} dropped: {}", id, e),
            SessionError::Transport(e) => warn!("Player {} connection lost: {}", id, e),
            SessionError::Rejected(e) => warn!("Player {} rejected: {}", id, e),
        }
        reason
    }

    async fn serve(&mut self, id: PlayerId) -> Result<std::convert::Infallible, SessionError> {
        loop {
            let payload = read_frame(&mut self.stream, MAX_CLIENT_FRAME_LEN).await?;

            let intent = match decode_packet(&payload).map_err(ProtocolError::from)? {
                Packet::Intent(intent) => intent,
                Packet::State(_) => return Err(ProtocolError::UnexpectedPacket("state").into()),
            };

            let snapshot = self.world.exchange(id, intent).await;
            let reply = encode_packet(&Packet::State(snapshot)).map_err(ProtocolError::from)?;

            write_frame(&mut self.stream, &reply).await?;
            debug!("Player {} sent {:?}", id, intent);
        }
    }

    async fn close(&mut self, id: PlayerId) {
        if self.state == SessionState::Closed {
            return;
        }
        self.world.remove_player(id).await;
        self.state = SessionState::Closed;
    }
}
