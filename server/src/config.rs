//! Startup configuration for the world and the server process.

use shared::{ARENA_HEIGHT, ARENA_WIDTH, CAPTURE_REWARD, NPC_RADIUS, PLAYER_RADIUS, PLAYER_SPEED};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("arena {width}x{height} cannot hold an entity of radius {radius}")]
    ArenaTooSmall { width: f32, height: f32, radius: f32 },
    #[error("{name} must be finite and positive, got {value}")]
    NotPositive { name: &'static str, value: f32 },
    #[error("npc speed range {min}..{max} is empty")]
    EmptySpeedRange { min: f32, max: f32 },
    #[error("tick rate must be at least 1 Hz")]
    ZeroTickRate,
}

/// Tunables of the simulated world. Defaults reproduce the classic game.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldConfig {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
    pub player_radius: f32,
    /// Distance covered per tick while a direction is held.
    pub player_speed: f32,
    /// Keep fresh players this far from the walls when possible.
    pub player_spawn_margin: f32,
    pub npc_radius: f32,
    pub npc_speed_min: f32,
    pub npc_speed_max: f32,
    pub max_npcs: usize,
    pub spawn_interval: Duration,
    pub capture_reward: u32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            min_x: 0.0,
            min_y: 0.0,
            max_x: ARENA_WIDTH,
            max_y: ARENA_HEIGHT,
            player_radius: PLAYER_RADIUS,
            player_speed: PLAYER_SPEED,
            player_spawn_margin: 100.0,
            npc_radius: NPC_RADIUS,
            npc_speed_min: 2.0,
            npc_speed_max: 4.0,
            max_npcs: 10,
            spawn_interval: Duration::from_secs(2),
            capture_reward: CAPTURE_REWARD,
        }
    }
}

impl WorldConfig {
    /// Square arena `0..size` on both axes, everything else default.
    pub fn square(size: f32) -> Self {
        Self {
            max_x: size,
            max_y: size,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("player_radius", self.player_radius),
            ("player_speed", self.player_speed),
            ("npc_radius", self.npc_radius),
            ("npc_speed_min", self.npc_speed_min),
            ("npc_speed_max", self.npc_speed_max),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::NotPositive { name, value });
            }
        }

        if self.npc_speed_min > self.npc_speed_max {
            return Err(ConfigError::EmptySpeedRange {
                min: self.npc_speed_min,
                max: self.npc_speed_max,
            });
        }

        let width = self.max_x - self.min_x;
        let height = self.max_y - self.min_y;
        let radius = self.player_radius.max(self.npc_radius);
        if !(width >= 2.0 * radius && height >= 2.0 * radius) {
            return Err(ConfigError::ArenaTooSmall {
                width,
                height,
                radius,
            });
        }

        Ok(())
    }
}

/// Everything `main` needs to start serving.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: String,
    pub tick_rate: u32,
    /// Fixed RNG seed; `None` seeds from the OS.
    pub seed: Option<u64>,
    pub world: WorldConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:21001".to_string(),
            tick_rate: 60,
            seed: None,
            world: WorldConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.tick_rate.max(1)))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_rate == 0 {
            return Err(ConfigError::ZeroTickRate);
        }
        self.world.validate()
    }
}
