//! The one lock around the world.
//!
//! Every method takes the lock, does a single bounded piece of work and
//! releases it before returning owned data. Callers never see the guard, so
//! network I/O can never happen while the world is locked.

use crate::error::{JoinError, SimulationFault};
use crate::game::{GameWorld, StepOutcome};
use shared::{GameSnapshot, Intent, PlayerId};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
pub struct WorldHandle {
    world: Arc<Mutex<GameWorld>>,
}

impl WorldHandle {
    pub fn new(world: GameWorld) -> Self {
        Self {
            world: Arc::new(Mutex::new(world)),
        }
    }

    pub async fn add_player(&self) -> Result<PlayerId, JoinError> {
        self.world.lock().await.add_player()
    }

    pub async fn remove_player(&self, id: PlayerId) {
        self.world.lock().await.remove_player(id);
    }

    pub async fn set_intent(&self, id: PlayerId, intent: Intent) {
        self.world.lock().await.set_intent(id, intent);
    }

    pub async fn snapshot(&self, for_id: PlayerId) -> GameSnapshot {
        self.world.lock().await.snapshot(for_id)
    }

    /// Stores the intent and copies the resulting view in one critical
    /// section, so the reply reflects exactly the world the intent entered.
    pub async fn exchange(&self, id: PlayerId, intent: Intent) -> GameSnapshot {
        let mut world = self.world.lock().await;
        world.set_intent(id, intent);
        world.snapshot(id)
    }

    pub async fn advance(&self) -> Result<StepOutcome, SimulationFault> {
        self.world.lock().await.advance()
    }

    /// Runs `f` against the locked world. Keep `f` short and free of I/O.
    pub async fn inspect<T>(&self, f: impl FnOnce(&GameWorld) -> T) -> T {
        let world = self.world.lock().await;
        f(&world)
    }

    /// Runs `f` against the locked world mutably. Keep `f` short and free of I/O.
    pub async fn with_world<T>(&self, f: impl FnOnce(&mut GameWorld) -> T) -> T {
        let mut world = self.world.lock().await;
        f(&mut world)
    }
}
