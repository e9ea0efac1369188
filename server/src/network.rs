//! TCP listener that turns every accepted connection into a session task.

use crate::clock::SimulationClock;
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::game::GameWorld;
use crate::session::ConnectionSession;
use crate::world_handle::WorldHandle;
use log::{error, info, warn};
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;

pub struct Server {
    listener: TcpListener,
    world: WorldHandle,
}

impl Server {
    /// Binds the listening socket. A failure here is a configuration problem
    /// and is not retried.
    pub async fn bind(addr: &str, world: WorldHandle) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.to_string(),
                source,
            })?;

        let local = listener.local_addr().map_err(|source| ServerError::Bind {
            addr: addr.to_string(),
            source,
        })?;
        info!("Server listening on {}", local);

        Ok(Server { listener, world })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn world(&self) -> &WorldHandle {
        &self.world
    }

    /// Accepts connections forever, one session task per connection.
    pub async fn run(self) -> Result<(), ServerError> {
        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    if let Err(e) = stream.set_nodelay(true) {
                        warn!("Failed to set TCP_NODELAY for {}: {}", peer, e);
                    }
                    let session = ConnectionSession::new(stream, peer, self.world.clone());
                    tokio::spawn(session.run());
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            }
        }
    }
}

/// Builds the world, binds the listener and runs listener and clock until
/// one of them fails.
pub async fn serve(config: ServerConfig) -> Result<(), ServerError> {
    config.validate()?;

    let world = match config.seed {
        Some(seed) => GameWorld::with_seed(config.world.clone(), seed, Instant::now()),
        None => GameWorld::new(config.world.clone()),
    };
    let world = WorldHandle::new(world);

    let server = Server::bind(&config.addr, world.clone()).await?;
    let clock = SimulationClock::new(world, config.tick_rate);

    tokio::select! {
        result = server.run() => result,
        result = clock.run() => result.map_err(ServerError::from),
    }
}
