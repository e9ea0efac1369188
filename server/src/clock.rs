//! Fixed-rate driver for [`GameWorld::advance`](crate::game::GameWorld::advance).

use crate::error::SimulationFault;
use crate::world_handle::WorldHandle;
use log::{debug, error, info};
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};

pub struct SimulationClock {
    world: WorldHandle,
    period: Duration,
    tick_rate: u32,
}

impl SimulationClock {
    pub fn new(world: WorldHandle, tick_rate: u32) -> Self {
        let tick_rate = tick_rate.max(1);
        Self {
            world,
            period: Duration::from_secs_f64(1.0 / f64::from(tick_rate)),
            tick_rate,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Steps the world forever. Returns only when the world reports a fault.
    ///
    /// An overrunning step pushes the next one back; steps are never skipped
    /// or run back to back to catch up.
    pub async fn run(self) -> Result<(), SimulationFault> {
        self.run_ticks(None).await
    }

    /// Steps the world `ticks` times at the configured rate.
    pub async fn run_for(self, ticks: u64) -> Result<(), SimulationFault> {
        self.run_ticks(Some(ticks)).await
    }

    async fn run_ticks(self, limit: Option<u64>) -> Result<(), SimulationFault> {
        let mut timer = interval(self.period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "Simulation clock running at {} Hz ({:?} per tick)",
            self.tick_rate, self.period
        );

        let mut steps = 0u64;
        while limit.map_or(true, |limit| steps < limit) {
            timer.tick().await;

            let outcome = self.world.advance().await.map_err(|fault| {
                error!("Simulation fault after {} ticks: {}", steps, fault);
                fault
            })?;
            steps += 1;

            if outcome.spawned {
                debug!("Tick {}: npc spawned", steps);
            }
            if steps % u64::from(self.tick_rate) == 0 {
                let (players, npcs) = self
                    .world
                    .inspect(|w| (w.player_count(), w.npc_count()))
                    .await;
                debug!("Tick {}: {} players, {} npcs", steps, players, npcs);
            }
        }

        Ok(())
    }
}
