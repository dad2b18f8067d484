//! Node kinematics: fixed positions and a bounded 2-D random walk

use crate::time::SimTime;
use rand::rngs::StdRng;
use rand::Rng;
use std::f64::consts::TAU;

/// Position in metres
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Position) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Axis-aligned area in metres
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Bounds {
    pub fn contains(&self, p: &Position) -> bool {
        p.x >= self.x_min && p.x <= self.x_max && p.y >= self.y_min && p.y <= self.y_max
    }

    fn clamp(&self, p: Position) -> Position {
        Position::new(p.x.clamp(self.x_min, self.x_max), p.y.clamp(self.y_min, self.y_max))
    }

    fn sample(&self, rng: &mut StdRng) -> Position {
        Position::new(
            sample_range(rng, self.x_min, self.x_max),
            sample_range(rng, self.y_min, self.y_max),
        )
    }
}

fn sample_range(rng: &mut StdRng, lo: f64, hi: f64) -> f64 {
    if hi > lo {
        rng.gen_range(lo..hi)
    } else {
        lo
    }
}

/// Motion model installed on a node
#[derive(Clone, Debug, PartialEq)]
pub enum MobilityModel {
    Fixed {
        position: Position,
    },
    RandomWalk {
        bounds: Bounds,
        initial_area: Bounds,
        speed_min_mps: f64,
        speed_max_mps: f64,
        step_distance_m: f64,
    },
}

impl Default for MobilityModel {
    fn default() -> Self {
        MobilityModel::Fixed {
            position: Position::default(),
        }
    }
}

impl MobilityModel {
    pub fn is_random_walk(&self) -> bool {
        matches!(self, MobilityModel::RandomWalk { .. })
    }
}

/// Runtime state: straight-line motion since `since`
#[derive(Clone, Debug)]
pub(crate) struct MotionState {
    pub model: MobilityModel,
    origin: Position,
    velocity: (f64, f64),
    since: SimTime,
}

impl MotionState {
    /// Place the node; random walkers draw their start from the initial area
    pub fn new(model: MobilityModel, rng: &mut StdRng) -> Self {
        let origin = match &model {
            MobilityModel::Fixed { position } => *position,
            MobilityModel::RandomWalk { initial_area, .. } => initial_area.sample(rng),
        };
        Self {
            model,
            origin,
            velocity: (0.0, 0.0),
            since: SimTime::ZERO,
        }
    }

    pub fn position(&self, now: SimTime) -> Position {
        let dt = now.saturating_sub(self.since).as_secs_f64();
        let p = Position::new(self.origin.x + self.velocity.0 * dt, self.origin.y + self.velocity.1 * dt);
        match &self.model {
            MobilityModel::RandomWalk { bounds, .. } => bounds.clamp(p),
            MobilityModel::Fixed { .. } => p,
        }
    }

    /// Start a new walk leg at `now`; returns when the next leg begins.
    ///
    /// Direction components pointing out of the bounds are reflected so the
    /// leg stays inside.
    pub fn next_leg(&mut self, now: SimTime, rng: &mut StdRng) -> Option<SimTime> {
        let MobilityModel::RandomWalk {
            bounds,
            speed_min_mps,
            speed_max_mps,
            step_distance_m,
            ..
        } = self.model
        else {
            return None;
        };

        let here = self.position(now);
        let speed = sample_range(rng, speed_min_mps, speed_max_mps);
        let direction = rng.gen_range(0.0..TAU);
        let (mut vx, mut vy) = (speed * direction.cos(), speed * direction.sin());

        let leg_secs = step_distance_m / speed;
        let end_x = here.x + vx * leg_secs;
        let end_y = here.y + vy * leg_secs;
        if end_x < bounds.x_min || end_x > bounds.x_max {
            vx = -vx;
        }
        if end_y < bounds.y_min || end_y > bounds.y_max {
            vy = -vy;
        }

        self.origin = here;
        self.velocity = (vx, vy);
        self.since = now;
        Some(now + SimTime::from_secs_f64(leg_secs))
    }
}
