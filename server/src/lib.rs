//! # Arena Server Library
//!
//! Authoritative server for a small multiplayer arena game: players steer
//! circles around a rectangle and score by touching wandering NPCs. The
//! server owns the only copy of the world, advances it on its own clock and
//! answers every client intent with a fresh snapshot.
//!
//! ## Architecture
//!
//! ### Shared World
//! A single [`GameWorld`](game::GameWorld) holds players, NPCs, pending
//! intents and the spawn timer. It is not synchronized itself; it lives behind
//! one mutex inside [`WorldHandle`](world_handle::WorldHandle), which is
//! cloned into every task. All world access goes through short critical
//! sections that never include network I/O, so a stalled client only stalls
//! its own session.
//!
//! ### Tasks
//! - **Simulation clock** ([`clock`]): steps the world at a fixed rate,
//!   independent of traffic. A step that overruns delays the next one.
//! - **Listener** ([`network`]): accepts TCP connections and spawns one
//!   session task per connection.
//! - **Sessions** ([`session`]): lockstep loop per client: read an intent
//!   frame, store it, reply with a snapshot frame. When the connection ends
//!   for any reason the player is removed, exactly once.
//!
//! ### Protocol
//! Frames are length-prefixed and carry bincode-encoded
//! [`shared::Packet`]s. Decoding is strict; anything malformed closes the
//! offending connection and nothing else.
//!
//! ### Failure Model
//! Per-connection errors stay inside their session. A bind failure or a
//! broken world invariant ([`error::SimulationFault`]) ends the process.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::serve;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig {
//!         addr: "127.0.0.1:21001".to_string(),
//!         tick_rate: 60,
//!         ..ServerConfig::default()
//!     };
//!
//!     // Runs the listener and the simulation clock until one of them fails.
//!     serve(config).await?;
//!     Ok(())
//! }
//! ```

pub mod clock;
pub mod config;
pub mod entity;
pub mod error;
pub mod game;
pub mod network;
pub mod session;
pub mod world_handle;
