use clap::Parser;
use log::info;
use server::config::{ServerConfig, WorldConfig};
use server::network::serve;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "21001")]
    port: u16,

    /// Simulation steps per second
    #[arg(short, long, default_value = "60")]
    tick_rate: u32,

    /// Maximum number of NPCs alive at once
    #[arg(long, default_value = "10")]
    max_npcs: usize,

    /// Milliseconds between NPC spawn attempts
    #[arg(long, default_value = "2000")]
    spawn_interval_ms: u64,

    /// Arena width
    #[arg(long, default_value = "800")]
    width: f32,

    /// Arena height (no short flag to avoid conflict with --help)
    #[arg(long, default_value = "600")]
    height: f32,

    /// Seed the world RNG for a reproducible session
    #[arg(long)]
    seed: Option<u64>,
}

impl Args {
    fn into_config(self) -> ServerConfig {
        ServerConfig {
            addr: format!("{}:{}", self.host, self.port),
            tick_rate: self.tick_rate,
            seed: self.seed,
            world: WorldConfig {
                max_x: self.width,
                max_y: self.height,
                max_npcs: self.max_npcs,
                spawn_interval: Duration::from_millis(self.spawn_interval_ms),
                ..WorldConfig::default()
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let config = Args::parse().into_config();
    info!(
        "Starting server on {} at {} Hz ({}x{} arena, {} npcs max)",
        config.addr, config.tick_rate, config.world.max_x, config.world.max_y, config.world.max_npcs
    );

    tokio::select! {
        result = serve(config) => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
