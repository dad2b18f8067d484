//! Assigns a motion policy to every node of a run

use crate::engine::SimulationEngine;
use crate::topology::Topology;
use crate::Result;
use scenarios::{MobilityPlan, MotionKind, NodeRole};
use tracing::debug;

/// Motion given to one node
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MobilityAssignment {
    pub role: NodeRole,
    pub index: u32,
    pub kind: MotionKind,
}

pub struct MobilityConfigurator<'a> {
    plan: &'a MobilityPlan,
}

impl<'a> MobilityConfigurator<'a> {
    pub fn new(plan: &'a MobilityPlan) -> Self {
        Self { plan }
    }

    /// Apply the plan to server, access point and every client.
    ///
    /// Without role overrides all nodes get the same kind: fixed when
    /// mobility is off, a bounded random walk when it is on.
    pub fn apply(
        &self,
        engine: &mut dyn SimulationEngine,
        topology: &Topology,
        mobility_enabled: bool,
    ) -> Result<Vec<MobilityAssignment>> {
        let mut assignments = Vec::with_capacity(topology.node_count());
        for node in topology.nodes() {
            let policy = self.plan.policy_for(node.role, mobility_enabled);
            engine.set_mobility(node.handle, &policy)?;
            assignments.push(MobilityAssignment {
                role: node.role,
                index: node.index,
                kind: policy.kind(),
            });
        }
        let walking = assignments
            .iter()
            .filter(|a| a.kind == MotionKind::RandomWalk)
            .count();
        debug!(
            "Mobility: {} of {} nodes on a random walk",
            walking,
            assignments.len()
        );
        Ok(assignments)
    }
}
