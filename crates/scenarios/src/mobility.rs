//! Mobility policies and per-role overrides
//!
//! A run either pins every node in place or lets every node wander on a
//! bounded 2-D random walk. Roles can be overridden individually so that,
//! for example, the access point stays put while clients move.

use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of a node in the three-tier topology
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    Server,
    AccessPoint,
    Client,
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeRole::Server => "server",
            NodeRole::AccessPoint => "access_point",
            NodeRole::Client => "client",
        };
        f.write_str(name)
    }
}

/// Axis-aligned rectangle in metres
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Rectangle {
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    /// Square of the given side length centred at the origin
    pub fn centered_square(side: f64) -> Self {
        let half = side / 2.0;
        Self::new(-half, half, -half, half)
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.x_min && x <= self.x_max && y >= self.y_min && y <= self.y_max
    }

    pub fn contains(&self, other: &Rectangle) -> bool {
        self.contains_point(other.x_min, other.y_min) && self.contains_point(other.x_max, other.y_max)
    }
}

/// Kind of motion a node is given
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionKind {
    Fixed,
    RandomWalk,
}

/// Fully resolved motion policy handed to the engine for one node
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum MobilityPolicy {
    /// Node stays at the origin for the whole run
    Fixed,
    /// Bounded 2-D random walk
    RandomWalk {
        bounds: Rectangle,
        /// Initial positions are drawn uniformly from this area
        initial_area: Rectangle,
        speed_min_mps: f64,
        speed_max_mps: f64,
        /// Distance travelled before a new direction and speed are drawn
        step_distance_m: f64,
    },
}

impl MobilityPolicy {
    pub fn kind(&self) -> MotionKind {
        match self {
            MobilityPolicy::Fixed => MotionKind::Fixed,
            MobilityPolicy::RandomWalk { .. } => MotionKind::RandomWalk,
        }
    }
}

/// Per-role override; `None` follows the run's mobility flag
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleOverrides {
    pub server: Option<MotionKind>,
    pub access_point: Option<MotionKind>,
    pub clients: Option<MotionKind>,
}

impl RoleOverrides {
    pub fn for_role(&self, role: NodeRole) -> Option<MotionKind> {
        match role {
            NodeRole::Server => self.server,
            NodeRole::AccessPoint => self.access_point,
            NodeRole::Client => self.clients,
        }
    }
}

/// Mobility section of a sweep configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MobilityPlan {
    pub bounds: Rectangle,
    pub initial_area: Rectangle,
    pub speed_min_mps: f64,
    pub speed_max_mps: f64,
    pub step_distance_m: f64,
    pub overrides: RoleOverrides,
}

impl Default for MobilityPlan {
    fn default() -> Self {
        Self {
            bounds: Rectangle::centered_square(100.0),
            initial_area: Rectangle::new(0.0, 50.0, 0.0, 50.0),
            speed_min_mps: 2.0,
            speed_max_mps: 4.0,
            step_distance_m: 1.0,
            overrides: RoleOverrides::default(),
        }
    }
}

impl MobilityPlan {
    /// Motion kind a role gets for a run with the given mobility flag
    pub fn kind_for(&self, role: NodeRole, mobility_enabled: bool) -> MotionKind {
        self.overrides.for_role(role).unwrap_or(if mobility_enabled {
            MotionKind::RandomWalk
        } else {
            MotionKind::Fixed
        })
    }

    /// Resolved policy for a role
    pub fn policy_for(&self, role: NodeRole, mobility_enabled: bool) -> MobilityPolicy {
        match self.kind_for(role, mobility_enabled) {
            MotionKind::Fixed => MobilityPolicy::Fixed,
            MotionKind::RandomWalk => MobilityPolicy::RandomWalk {
                bounds: self.bounds,
                initial_area: self.initial_area,
                speed_min_mps: self.speed_min_mps,
                speed_max_mps: self.speed_max_mps,
                step_distance_m: self.step_distance_m,
            },
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bounds.width() <= 0.0 || self.bounds.height() <= 0.0 {
            return Err(ConfigError::InvalidMobility(
                "walk bounds must have a positive area".to_string(),
            ));
        }
        if !self.bounds.contains(&self.initial_area) {
            return Err(ConfigError::InvalidMobility(
                "initial area must lie inside the walk bounds".to_string(),
            ));
        }
        if self.speed_min_mps <= 0.0 || self.speed_max_mps < self.speed_min_mps {
            return Err(ConfigError::InvalidMobility(format!(
                "invalid speed range [{}, {}]",
                self.speed_min_mps, self.speed_max_mps
            )));
        }
        if self.step_distance_m <= 0.0 {
            return Err(ConfigError::InvalidMobility(
                "step distance must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_plan_is_uniform_across_roles() {
        let plan = MobilityPlan::default();
        for role in [NodeRole::Server, NodeRole::AccessPoint, NodeRole::Client] {
            assert_eq!(plan.kind_for(role, false), MotionKind::Fixed);
            assert_eq!(plan.kind_for(role, true), MotionKind::RandomWalk);
        }
        assert!(plan.validate().is_ok());
    }

    #[test]
    fn test_default_region() {
        let plan = MobilityPlan::default();
        assert_eq!(plan.bounds, Rectangle::new(-50.0, 50.0, -50.0, 50.0));
        assert_eq!(plan.initial_area.width(), 50.0);
        assert_eq!(plan.initial_area.height(), 50.0);
        assert!(plan.bounds.contains(&plan.initial_area));
    }

    #[test]
    fn test_role_override_pins_access_point() {
        let mut plan = MobilityPlan::default();
        plan.overrides.access_point = Some(MotionKind::Fixed);

        assert_eq!(plan.policy_for(NodeRole::AccessPoint, true), MobilityPolicy::Fixed);
        assert_eq!(plan.kind_for(NodeRole::Client, true), MotionKind::RandomWalk);
        assert_eq!(plan.kind_for(NodeRole::Server, true), MotionKind::RandomWalk);
    }

    #[test]
    fn test_invalid_initial_area() {
        let plan = MobilityPlan {
            initial_area: Rectangle::new(0.0, 80.0, 0.0, 80.0),
            ..MobilityPlan::default()
        };
        assert!(matches!(plan.validate(), Err(ConfigError::InvalidMobility(_))));
    }
}
