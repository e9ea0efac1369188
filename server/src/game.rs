use crate::config::WorldConfig;
use crate::entity::{Arena, Npc, Player};
use crate::error::{JoinError, SimulationFault};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{GameSnapshot, Intent, PlayerId};
use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

/// What happened during one call to [`GameWorld::advance`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepOutcome {
    pub spawned: bool,
    /// Player ids credited with a capture, in processing order.
    pub captures: Vec<PlayerId>,
}

/// The authoritative world. Not synchronized; wrap it in a
/// [`WorldHandle`](crate::world_handle::WorldHandle) to share it.
#[derive(Debug)]
pub struct GameWorld {
    config: WorldConfig,
    arena: Arena,
    // Ordered by id so capture resolution is deterministic.
    players: BTreeMap<PlayerId, Player>,
    npcs: Vec<Npc>,
    intents: HashMap<PlayerId, Intent>,
    // None once every id has been handed out.
    next_player_id: Option<PlayerId>,
    last_spawn: Instant,
    rng: StdRng,
    tick: u64,
}

impl GameWorld {
    pub fn new(config: WorldConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy(), Instant::now())
    }

    /// Builds a reproducible world: same seed, same start instant and same
    /// inputs give the same snapshots.
    pub fn with_seed(config: WorldConfig, seed: u64, started_at: Instant) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed), started_at)
    }

    fn with_rng(config: WorldConfig, rng: StdRng, started_at: Instant) -> Self {
        Self {
            arena: Arena::from_config(&config),
            config,
            players: BTreeMap::new(),
            npcs: Vec::new(),
            intents: HashMap::new(),
            next_player_id: Some(1),
            last_spawn: started_at,
            rng,
            tick: 0,
        }
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn npcs(&self) -> &[Npc] {
        &self.npcs
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn npc_count(&self) -> usize {
        self.npcs.len()
    }

    /// Adds a player at a random point away from the walls.
    pub fn add_player(&mut self) -> Result<PlayerId, JoinError> {
        let radius = self.config.player_radius;
        let x = self.random_spawn_coord(self.arena.min_x, self.arena.max_x, radius);
        let y = self.random_spawn_coord(self.arena.min_y, self.arena.max_y, radius);
        self.add_player_at(x, y)
    }

    /// Adds a player at `(x, y)`, clamped into the arena. Ids are never
    /// reused, so this fails once the id space is used up.
    pub fn add_player_at(&mut self, x: f32, y: f32) -> Result<PlayerId, JoinError> {
        let id = self.next_player_id.ok_or(JoinError::IdsExhausted)?;
        self.next_player_id = id.checked_add(1);

        let radius = self.config.player_radius;
        let (x, y) = self.arena.clamp(x, y, radius);
        let player = Player::new(id, x, y, radius, self.config.player_speed);

        info!("Added player {} at ({:.1}, {:.1})", id, player.x, player.y);
        self.players.insert(id, player);
        self.intents.insert(id, Intent::default());
        Ok(id)
    }

    #[cfg(test)]
    pub(crate) fn set_next_player_id(&mut self, next: Option<PlayerId>) {
        self.next_player_id = next;
    }

    /// Removes a player and its intent. Unknown ids are ignored.
    pub fn remove_player(&mut self, id: PlayerId) {
        self.intents.remove(&id);
        if let Some(player) = self.players.remove(&id) {
            info!("Removed player {} (score {})", id, player.score);
        }
    }

    /// Replaces the stored intent of `id`. Dropped if the player is gone.
    pub fn set_intent(&mut self, id: PlayerId, intent: Intent) {
        if let Some(slot) = self.intents.get_mut(&id) {
            *slot = intent;
        }
    }

    /// Places an NPC unless the population cap is reached.
    pub fn insert_npc(&mut self, npc: Npc) -> bool {
        if self.npcs.len() >= self.config.max_npcs {
            return false;
        }
        self.npcs.push(npc);
        true
    }

    pub fn advance(&mut self) -> Result<StepOutcome, SimulationFault> {
        self.advance_at(Instant::now())
    }

    /// Runs one simulation step using `now` as the current time.
    pub fn advance_at(&mut self, now: Instant) -> Result<StepOutcome, SimulationFault> {
        let mut outcome = StepOutcome::default();

        if now.saturating_duration_since(self.last_spawn) >= self.config.spawn_interval {
            outcome.spawned = self.spawn_npc();
            self.last_spawn = now;
        }

        for npc in &mut self.npcs {
            npc.step(&self.arena);
        }

        for player in self.players.values_mut() {
            if let Some(intent) = self.intents.get(&player.id) {
                player.apply_intent(intent, &self.arena);
            }
        }

        self.resolve_captures(&mut outcome);
        self.tick += 1;
        self.check_invariants()?;

        Ok(outcome)
    }

    pub fn snapshot(&self, for_id: PlayerId) -> GameSnapshot {
        GameSnapshot {
            self_id: for_id,
            players: self.players.values().map(Player::to_state).collect(),
            npcs: self.npcs.iter().map(Npc::to_state).collect(),
        }
    }

    fn spawn_npc(&mut self) -> bool {
        if self.npcs.len() >= self.config.max_npcs {
            return false;
        }

        let radius = self.config.npc_radius;
        let (lo_x, hi_x) = self.arena.x_range(radius);
        let (lo_y, hi_y) = self.arena.y_range(radius);

        let (x, y) = match self.rng.gen_range(0..4) {
            0 => (self.rng.gen_range(lo_x..=hi_x), lo_y),
            1 => (hi_x, self.rng.gen_range(lo_y..=hi_y)),
            2 => (self.rng.gen_range(lo_x..=hi_x), hi_y),
            _ => (lo_x, self.rng.gen_range(lo_y..=hi_y)),
        };
        let vx = self.random_npc_velocity();
        let vy = self.random_npc_velocity();

        debug!("Spawned npc at ({:.1}, {:.1}) moving ({}, {})", x, y, vx, vy);
        self.insert_npc(Npc::new(x, y, vx, vy, radius))
    }

    fn random_npc_velocity(&mut self) -> f32 {
        let magnitude = self
            .rng
            .gen_range(self.config.npc_speed_min..=self.config.npc_speed_max);
        if self.rng.gen_bool(0.5) {
            magnitude
        } else {
            -magnitude
        }
    }

    fn random_spawn_coord(&mut self, min: f32, max: f32, radius: f32) -> f32 {
        let inset = self.config.player_spawn_margin.max(radius);
        let (lo, hi) = if min + inset <= max - inset {
            (min + inset, max - inset)
        } else {
            // Arena narrower than the margin allows: use all the room there is.
            (min + radius, max - radius)
        };
        if lo > hi {
            return (min + max) / 2.0;
        }
        self.rng.gen_range(lo..=hi)
    }

    fn resolve_captures(&mut self, outcome: &mut StepOutcome) {
        let reward = self.config.capture_reward;
        for player in self.players.values_mut() {
            self.npcs.retain(|npc| {
                if player.overlaps(npc) {
                    player.award(reward);
                    outcome.captures.push(player.id);
                    false
                } else {
                    true
                }
            });
        }

        if !outcome.captures.is_empty() {
            debug!("Tick {}: captures by {:?}", self.tick, outcome.captures);
        }
    }

    fn check_invariants(&self) -> Result<(), SimulationFault> {
        for player in self.players.values() {
            let entity = || format!("player {}", player.id);
            if !player.x.is_finite() || !player.y.is_finite() {
                return Err(SimulationFault::NonFinite { entity: entity() });
            }
            if !self.arena.contains(player.x, player.y, player.radius) {
                return Err(SimulationFault::OutOfBounds {
                    entity: entity(),
                    x: player.x,
                    y: player.y,
                });
            }
        }

        for (index, npc) in self.npcs.iter().enumerate() {
            let entity = || format!("npc #{}", index);
            if ![npc.x, npc.y, npc.vx, npc.vy].iter().all(|v| v.is_finite()) {
                return Err(SimulationFault::NonFinite { entity: entity() });
            }
            if !self.arena.contains(npc.x, npc.y, npc.radius) {
                return Err(SimulationFault::OutOfBounds {
                    entity: entity(),
                    x: npc.x,
                    y: npc.y,
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use std::time::Duration;

    fn quiet_config(size: f32) -> WorldConfig {
        // Spawning effectively disabled so tests control the NPC set.
        WorldConfig {
            spawn_interval: Duration::from_secs(3600),
            ..WorldConfig::square(size)
        }
    }

    fn seeded(config: WorldConfig, seed: u64) -> (GameWorld, Instant) {
        let start = Instant::now();
        (GameWorld::with_seed(config, seed, start), start)
    }

    fn left() -> Intent {
        Intent {
            left: true,
            ..Intent::default()
        }
    }

    #[test]
    fn test_ids_are_unique_and_never_reused() {
        let mut world = GameWorld::new(WorldConfig::default());
        let a = world.add_player().unwrap();
        let b = world.add_player().unwrap();
        world.remove_player(a);
        let c = world.add_player().unwrap();

        assert_eq!((a, b, c), (1, 2, 3));
        assert_eq!(world.player_count(), 2);
        assert!(world.player(a).is_none());
    }

    #[test]
    fn test_id_space_exhaustion_rejects_join() {
        let mut world = GameWorld::new(WorldConfig::default());
        world.set_next_player_id(Some(PlayerId::MAX));

        assert_eq!(world.add_player(), Ok(PlayerId::MAX));
        assert_eq!(world.add_player(), Err(JoinError::IdsExhausted));
        assert_eq!(
            world.add_player_at(50.0, 50.0),
            Err(JoinError::IdsExhausted)
        );
        assert_eq!(world.player_count(), 1);

        // Freeing a slot does not recycle the id.
        world.remove_player(PlayerId::MAX);
        assert_eq!(world.add_player(), Err(JoinError::IdsExhausted));
    }

    #[test]
    fn test_add_player_spawns_inside_margin() {
        let (mut world, _) = seeded(WorldConfig::default(), 7);
        for _ in 0..200 {
            let id = world.add_player().unwrap();
            let player = world.player(id).unwrap();
            assert!((100.0..=700.0).contains(&player.x), "x = {}", player.x);
            assert!((100.0..=500.0).contains(&player.y), "y = {}", player.y);
            assert_eq!(player.score, 0);
        }
    }

    #[test]
    fn test_add_player_fits_tiny_arena() {
        let (mut world, _) = seeded(WorldConfig::square(50.0), 1);
        for _ in 0..50 {
            let id = world.add_player().unwrap();
            let player = world.player(id).unwrap();
            assert!(world.arena().contains(player.x, player.y, player.radius));
        }
    }

    #[test]
    fn test_remove_player_is_idempotent() {
        let (mut world, start) = seeded(quiet_config(100.0), 3);
        let keep = world.add_player_at(30.0, 30.0).unwrap();
        let gone = world.add_player_at(60.0, 60.0).unwrap();

        world.remove_player(gone);
        let once = world.snapshot(keep);
        world.remove_player(gone);
        let twice = world.snapshot(keep);

        assert_eq!(once, twice);
        assert_eq!(twice.players.len(), 1);

        world.remove_player(999);
        world.advance_at(start).unwrap();
        assert_eq!(world.player_count(), 1);
    }

    #[test]
    fn test_intent_for_missing_player_is_dropped() {
        let (mut world, start) = seeded(quiet_config(100.0), 3);
        world.set_intent(42, left());
        world.advance_at(start).unwrap();
        assert_eq!(world.player_count(), 0);

        let id = world.add_player_at(50.0, 50.0).unwrap();
        world.remove_player(id);
        world.set_intent(id, left());
        assert!(world.player(id).is_none());
    }

    #[test]
    fn test_scenario_ten_steps_left() {
        let config = WorldConfig {
            player_speed: 1.0,
            ..quiet_config(100.0)
        };
        let (mut world, start) = seeded(config, 1);
        let id = world.add_player_at(50.0, 50.0).unwrap();
        world.set_intent(id, left());

        for _ in 0..10 {
            world.advance_at(start).unwrap();
        }

        let player = world.player(id).unwrap();
        assert_approx_eq!(player.x, 40.0);
        assert_approx_eq!(player.y, 50.0);
        assert_eq!(world.tick(), 10);
    }

    #[test]
    fn test_latest_intent_replaces_previous() {
        let config = WorldConfig {
            player_speed: 1.0,
            ..quiet_config(100.0)
        };
        let (mut world, start) = seeded(config, 1);
        let id = world.add_player_at(50.0, 50.0).unwrap();

        world.set_intent(
            id,
            Intent {
                left: true,
                up: true,
                ..Intent::default()
            },
        );
        world.set_intent(
            id,
            Intent {
                down: true,
                ..Intent::default()
            },
        );
        world.advance_at(start).unwrap();

        let player = world.player(id).unwrap();
        assert_approx_eq!(player.x, 50.0);
        assert_approx_eq!(player.y, 51.0);

        // The last intent keeps applying until replaced.
        world.advance_at(start).unwrap();
        assert_approx_eq!(world.player(id).unwrap().y, 52.0);
    }

    #[test]
    fn test_scenario_npc_bounces_off_left_wall() {
        let (mut world, start) = seeded(quiet_config(100.0), 1);
        assert!(world.insert_npc(Npc::new(0.0, 50.0, -2.0, 0.0, 15.0)));

        world.advance_at(start).unwrap();

        let npc = &world.npcs()[0];
        assert_eq!(npc.x, 15.0);
        assert_eq!(npc.y, 50.0);
        assert_eq!(npc.vx, 2.0);
        assert_eq!(npc.vy, 0.0);
    }

    #[test]
    fn test_scenario_single_capture() {
        let (mut world, start) = seeded(quiet_config(100.0), 1);
        let id = world.add_player_at(50.0, 50.0).unwrap();
        world.insert_npc(Npc::new(50.0, 50.0, 0.0, 0.0, 15.0));

        let outcome = world.advance_at(start).unwrap();

        assert_eq!(outcome.captures, vec![id]);
        assert_eq!(world.npc_count(), 0);
        assert_eq!(world.player(id).unwrap().score, 10);

        world.advance_at(start).unwrap();
        assert_eq!(world.player(id).unwrap().score, 10);
    }

    #[test]
    fn test_contested_npc_goes_to_lowest_id() {
        let (mut world, start) = seeded(quiet_config(200.0), 1);
        let first = world.add_player_at(90.0, 100.0).unwrap();
        let second = world.add_player_at(110.0, 100.0).unwrap();
        world.insert_npc(Npc::new(100.0, 100.0, 0.0, 0.0, 15.0));

        let outcome = world.advance_at(start).unwrap();

        assert_eq!(outcome.captures, vec![first]);
        assert_eq!(world.player(first).unwrap().score, 10);
        assert_eq!(world.player(second).unwrap().score, 0);
    }

    #[test]
    fn test_player_can_capture_several_npcs() {
        let (mut world, start) = seeded(quiet_config(200.0), 1);
        let id = world.add_player_at(100.0, 100.0).unwrap();
        world.insert_npc(Npc::new(95.0, 100.0, 0.0, 0.0, 15.0));
        world.insert_npc(Npc::new(105.0, 100.0, 0.0, 0.0, 15.0));
        world.insert_npc(Npc::new(20.0, 20.0, 0.0, 0.0, 15.0));

        let outcome = world.advance_at(start).unwrap();

        assert_eq!(outcome.captures, vec![id, id]);
        assert_eq!(world.player(id).unwrap().score, 20);
        assert_eq!(world.npc_count(), 1);
    }

    #[test]
    fn test_spawn_waits_for_interval() {
        let config = WorldConfig {
            spawn_interval: Duration::from_millis(500),
            ..WorldConfig::default()
        };
        let (mut world, start) = seeded(config, 9);

        let outcome = world.advance_at(start + Duration::from_millis(499)).unwrap();
        assert!(!outcome.spawned);
        assert_eq!(world.npc_count(), 0);

        let outcome = world.advance_at(start + Duration::from_millis(500)).unwrap();
        assert!(outcome.spawned);
        assert_eq!(world.npc_count(), 1);

        // Timer was reset by the spawn.
        let outcome = world.advance_at(start + Duration::from_millis(900)).unwrap();
        assert!(!outcome.spawned);
    }

    #[test]
    fn test_spawned_npcs_start_on_edge_with_valid_velocity() {
        let config = WorldConfig {
            spawn_interval: Duration::ZERO,
            max_npcs: 1,
            ..WorldConfig::default()
        };
        let (mut world, start) = seeded(config, 11);
        let arena = *world.arena();

        for _ in 0..100 {
            // Spawn then inspect before the NPC moves again.
            world.npcs.clear();
            assert!(world.spawn_npc());
            let npc = &world.npcs()[0];
            let (lo_x, hi_x) = arena.x_range(npc.radius);
            let (lo_y, hi_y) = arena.y_range(npc.radius);
            let on_edge = npc.x == lo_x || npc.x == hi_x || npc.y == lo_y || npc.y == hi_y;
            assert!(on_edge, "npc at ({}, {}) is not on an edge", npc.x, npc.y);
            for v in [npc.vx, npc.vy] {
                assert!((2.0..=4.0).contains(&v.abs()), "speed {}", v);
            }
        }
        world.advance_at(start).unwrap();
    }

    #[test]
    fn test_npc_cap_holds() {
        let config = WorldConfig {
            spawn_interval: Duration::ZERO,
            max_npcs: 4,
            ..WorldConfig::default()
        };
        let (mut world, start) = seeded(config, 5);

        for step in 0..100u64 {
            world
                .advance_at(start + Duration::from_millis(step * 16))
                .unwrap();
            assert!(world.npc_count() <= 4);
        }
        assert_eq!(world.npc_count(), 4);
        assert!(!world.insert_npc(Npc::new(50.0, 50.0, 2.0, 2.0, 15.0)));
        assert_eq!(world.npc_count(), 4);
    }

    #[test]
    fn test_bounds_scores_and_bounces_over_long_run() {
        let config = WorldConfig {
            spawn_interval: Duration::ZERO,
            player_speed: 7.0,
            ..WorldConfig::default()
        };
        let (mut world, start) = seeded(config, 1234);
        let ids: Vec<PlayerId> = (0..6).map(|_| world.add_player().unwrap()).collect();
        let mut scores: HashMap<PlayerId, u32> = HashMap::new();

        for step in 0..2_000usize {
            for (i, id) in ids.iter().enumerate() {
                let phase = (step / 50 + i) % 4;
                let intent = Intent {
                    left: phase == 0,
                    right: phase == 1,
                    up: phase == 2 || phase == 0,
                    down: phase == 3,
                };
                world.set_intent(*id, intent);
            }

            let before: Vec<Npc> = world.npcs().to_vec();
            let outcome = world
                .advance_at(start + Duration::from_millis(step as u64))
                .unwrap();

            for player in world.players() {
                let (lo_x, hi_x) = world.arena().x_range(player.radius);
                let (lo_y, hi_y) = world.arena().y_range(player.radius);
                assert!(player.x >= lo_x && player.x <= hi_x);
                assert!(player.y >= lo_y && player.y <= hi_y);

                let previous = scores.insert(player.id, player.score).unwrap_or(0);
                assert!(player.score >= previous);
            }

            // Without captures the old NPCs are a prefix of the new list.
            if outcome.captures.is_empty() {
                for (prev, npc) in before.iter().zip(world.npcs()) {
                    let (lo_x, hi_x) = world.arena().x_range(npc.radius);
                    let hit_x = prev.x + prev.vx <= lo_x || prev.x + prev.vx >= hi_x;
                    assert_eq!(npc.vx == -prev.vx, hit_x);
                    let (lo_y, hi_y) = world.arena().y_range(npc.radius);
                    let hit_y = prev.y + prev.vy <= lo_y || prev.y + prev.vy >= hi_y;
                    assert_eq!(npc.vy == -prev.vy, hit_y);
                }
            }
            for npc in world.npcs() {
                assert!(world.arena().contains(npc.x, npc.y, npc.radius));
            }
        }
    }

    #[test]
    fn test_same_seed_same_history() {
        let config = WorldConfig {
            spawn_interval: Duration::from_millis(20),
            ..WorldConfig::default()
        };
        let start = Instant::now();
        let mut a = GameWorld::with_seed(config.clone(), 77, start);
        let mut b = GameWorld::with_seed(config, 77, start);

        let pa = a.add_player().unwrap();
        let pb = b.add_player().unwrap();
        assert_eq!(pa, pb);

        for step in 0..300u64 {
            let intent = Intent {
                right: step % 40 < 20,
                left: step % 40 >= 20,
                down: step % 30 < 10,
                up: false,
            };
            a.set_intent(pa, intent);
            b.set_intent(pb, intent);
            let now = start + Duration::from_millis(step * 5);
            assert_eq!(a.advance_at(now).unwrap(), b.advance_at(now).unwrap());
            assert_eq!(a.snapshot(pa), b.snapshot(pb));
        }
    }

    #[test]
    fn test_snapshot_contents() {
        let (mut world, _) = seeded(quiet_config(200.0), 1);
        let a = world.add_player_at(40.0, 50.0).unwrap();
        let b = world.add_player_at(140.0, 150.0).unwrap();
        world.insert_npc(Npc::new(100.0, 20.0, 2.0, 3.0, 15.0));

        let snapshot = world.snapshot(b);
        assert_eq!(snapshot.self_id, b);
        let ids: Vec<PlayerId> = snapshot.players.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![a, b]);
        assert_approx_eq!(snapshot.players[1].x, 140.0);
        assert_eq!(snapshot.npcs.len(), 1);
        assert_approx_eq!(snapshot.npcs[0].radius, 15.0);
    }

    #[test]
    fn test_invariant_violation_is_reported() {
        let (mut world, start) = seeded(quiet_config(100.0), 1);
        world.add_player_at(50.0, 50.0).unwrap();
        world.insert_npc(Npc::new(80.0, 80.0, 1.0, 1.0, 5.0));
        assert!(world.advance_at(start).is_ok());

        world.insert_npc(Npc::new(20.0, 80.0, f32::NAN, 1.0, 5.0));
        assert_eq!(
            world.advance_at(start),
            Err(SimulationFault::NonFinite {
                entity: "npc #1".to_string()
            })
        );
    }
}
