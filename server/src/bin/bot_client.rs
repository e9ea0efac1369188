//! Headless client that drives the server protocol: sends a scripted intent
//! every interval and prints what comes back.

use clap::Parser;
use log::{info, warn};
use shared::framing::{recv_packet, send_packet};
use shared::{GameSnapshot, Intent, Packet, MAX_FRAME_LEN};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::sleep;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:21001")]
    server: String,

    /// Number of intent/snapshot exchanges before disconnecting
    #[arg(long, default_value = "600")]
    steps: u32,

    /// Delay between exchanges in milliseconds
    #[arg(long, default_value = "16")]
    interval_ms: u64,
}

/// Walks a square: each side lasts 60 steps.
fn scripted_intent(step: u32) -> Intent {
    match (step / 60) % 4 {
        0 => Intent {
            right: true,
            ..Intent::default()
        },
        1 => Intent {
            down: true,
            ..Intent::default()
        },
        2 => Intent {
            left: true,
            ..Intent::default()
        },
        _ => Intent {
            up: true,
            ..Intent::default()
        },
    }
}

fn report(step: u32, snapshot: &GameSnapshot) {
    let Some(me) = snapshot.own() else {
        warn!("Snapshot does not contain player {}", snapshot.self_id);
        return;
    };
    println!(
        "step {:>4}: player {} at ({:.1}, {:.1}) score {} | {} players, {} npcs",
        step,
        me.id,
        me.x,
        me.y,
        me.score,
        snapshot.players.len(),
        snapshot.npcs.len()
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();
    let mut stream = TcpStream::connect(&args.server).await?;
    stream.set_nodelay(true)?;
    info!("Connected to {}", args.server);

    for step in 0..args.steps {
        send_packet(&mut stream, &Packet::Intent(scripted_intent(step))).await?;

        match recv_packet(&mut stream, MAX_FRAME_LEN).await? {
            Packet::State(snapshot) => {
                if step % 30 == 0 {
                    report(step, &snapshot);
                }
            }
            other => warn!("Unexpected packet from server: {:?}", other),
        }

        sleep(Duration::from_millis(args.interval_ms)).await;
    }

    info!("Bot finished after {} steps", args.steps);
    Ok(())
}
