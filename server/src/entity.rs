use crate::config::WorldConfig;
use shared::{Intent, NpcState, PlayerId, PlayerState};

/// Axis-aligned playing field. Entity centers stay within the field shrunk by
/// their radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arena {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Arena {
    pub fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn from_config(config: &WorldConfig) -> Self {
        Self::new(config.min_x, config.min_y, config.max_x, config.max_y)
    }

    /// Allowed range for a center coordinate on the x axis.
    pub fn x_range(&self, radius: f32) -> (f32, f32) {
        (self.min_x + radius, self.max_x - radius)
    }

    pub fn y_range(&self, radius: f32) -> (f32, f32) {
        (self.min_y + radius, self.max_y - radius)
    }

    pub fn clamp(&self, x: f32, y: f32, radius: f32) -> (f32, f32) {
        let (lo_x, hi_x) = self.x_range(radius);
        let (lo_y, hi_y) = self.y_range(radius);
        (x.clamp(lo_x, hi_x), y.clamp(lo_y, hi_y))
    }

    pub fn contains(&self, x: f32, y: f32, radius: f32) -> bool {
        let (lo_x, hi_x) = self.x_range(radius);
        let (lo_y, hi_y) = self.y_range(radius);
        (lo_x..=hi_x).contains(&x) && (lo_y..=hi_y).contains(&y)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub speed: f32,
    pub score: u32,
}

impl Player {
    pub fn new(id: PlayerId, x: f32, y: f32, radius: f32, speed: f32) -> Self {
        Self {
            id,
            x,
            y,
            radius,
            speed,
            score: 0,
        }
    }

    /// Moves one tick in the direction held by `intent`, then clamps.
    pub fn apply_intent(&mut self, intent: &Intent, arena: &Arena) {
        let x = self.x + self.speed * intent.axis_x();
        let y = self.y + self.speed * intent.axis_y();
        (self.x, self.y) = arena.clamp(x, y, self.radius);
    }

    pub fn overlaps(&self, npc: &Npc) -> bool {
        let dx = self.x - npc.x;
        let dy = self.y - npc.y;
        (dx * dx + dy * dy).sqrt() < self.radius + npc.radius
    }

    pub fn award(&mut self, reward: u32) {
        self.score = self.score.saturating_add(reward);
    }

    pub fn to_state(&self) -> PlayerState {
        PlayerState {
            id: self.id,
            x: self.x,
            y: self.y,
            score: self.score,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Npc {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub radius: f32,
}

/// Which walls an NPC bounced off during one move.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bounce {
    pub x: bool,
    pub y: bool,
}

impl Npc {
    pub fn new(x: f32, y: f32, vx: f32, vy: f32, radius: f32) -> Self {
        Self {
            x,
            y,
            vx,
            vy,
            radius,
        }
    }

    /// Advances by one velocity step. A coordinate that reaches or crosses
    /// its bound is pinned to it and that velocity component flips sign.
    pub fn step(&mut self, arena: &Arena) -> Bounce {
        let (lo_x, hi_x) = arena.x_range(self.radius);
        let (lo_y, hi_y) = arena.y_range(self.radius);

        let (x, bounce_x) = reflect(self.x + self.vx, lo_x, hi_x);
        let (y, bounce_y) = reflect(self.y + self.vy, lo_y, hi_y);

        self.x = x;
        self.y = y;
        if bounce_x {
            self.vx = -self.vx;
        }
        if bounce_y {
            self.vy = -self.vy;
        }

        Bounce {
            x: bounce_x,
            y: bounce_y,
        }
    }

    pub fn to_state(&self) -> NpcState {
        NpcState {
            x: self.x,
            y: self.y,
            radius: self.radius,
        }
    }
}

// Reaching a bound counts as hitting it.
fn reflect(value: f32, lo: f32, hi: f32) -> (f32, bool) {
    if value <= lo {
        (lo, true)
    } else if value >= hi {
        (hi, true)
    } else {
        (value, false)
    }
}
