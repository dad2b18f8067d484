//! Single-run orchestration
//!
//! One run owns one engine from creation to teardown. [`run_experiment`]
//! validates the run, builds the topology, assigns mobility, installs and
//! schedules traffic, advances the engine to the deadline and collects the
//! flow statistics. The engine is destroyed on every exit path, including
//! early returns on error.

use crate::engine::{EngineFactory, SimulationEngine};
use crate::mobility::{MobilityAssignment, MobilityConfigurator};
use crate::schedule::{RunScheduler, ScheduledApp};
use crate::topology::{Topology, TopologyBuilder};
use crate::traffic::{InstalledTraffic, TrafficPlan};
use crate::Result;
use observability::{FlowStats, RunArtifact};
use scenarios::{RunConfig, SweepConfig};
use std::time::Duration;
use tracing::debug;

/// Engine bound to a single run; destroyed when dropped
pub struct RunContext {
    run: RunConfig,
    seed: u64,
    engine: Box<dyn SimulationEngine>,
    destroyed: bool,
}

impl RunContext {
    pub fn open(factory: &dyn EngineFactory, run: RunConfig, seed: u64) -> Result<Self> {
        let engine = factory.create(seed)?;
        debug!("Opened engine for {} (seed {:#018x})", run.name(), seed);
        Ok(Self {
            run,
            seed,
            engine,
            destroyed: false,
        })
    }

    pub fn run(&self) -> &RunConfig {
        &self.run
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn engine(&mut self) -> &mut dyn SimulationEngine {
        self.engine.as_mut()
    }

    /// Tear the engine down now instead of at drop
    pub fn close(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if !self.destroyed {
            self.engine.destroy();
            self.destroyed = true;
            debug!("Closed engine for {}", self.run.name());
        }
    }
}

impl Drop for RunContext {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Everything a finished run produced
#[derive(Clone, Debug)]
pub struct RunOutcome {
    pub run: RunConfig,
    pub seed: u64,
    pub deadline: Duration,
    pub topology: Topology,
    pub mobility: Vec<MobilityAssignment>,
    pub plan: TrafficPlan,
    pub schedule: Vec<ScheduledApp>,
    pub flows: Vec<FlowStats>,
}

impl RunOutcome {
    pub fn artifact(&self) -> RunArtifact {
        RunArtifact::new(
            self.run,
            self.seed,
            self.deadline.as_secs_f64(),
            self.flows.clone(),
        )
    }
}

/// Execute one run on a fresh engine from `factory`
pub fn run_experiment(
    factory: &dyn EngineFactory,
    sweep: &SweepConfig,
    run: &RunConfig,
) -> Result<RunOutcome> {
    run.validate()?;
    sweep.mobility.validate()?;
    sweep.traffic.validate()?;
    let scheduler = RunScheduler::new(sweep.schedule)?;
    let seed = run.seed(sweep.base_seed);

    let mut context = RunContext::open(factory, *run, seed)?;

    let topology = TopologyBuilder::new(&sweep.link, &sweep.wifi, &sweep.addressing)
        .build(context.engine(), run.client_count)?;

    let mobility = MobilityConfigurator::new(&sweep.mobility).apply(
        context.engine(),
        &topology,
        run.mobility_enabled,
    )?;

    let plan = TrafficPlan::select(
        run.protocol,
        run.client_count,
        topology.server_address,
        &sweep.traffic,
    );
    let installed = InstalledTraffic::install(context.engine(), &topology, &plan)?;
    let schedule = scheduler.apply(context.engine(), &installed)?;

    let engine = context.engine();
    engine.populate_routing()?;
    engine.enable_flow_monitor()?;
    engine.run_until(scheduler.deadline())?;
    let flows = engine.collect_flow_stats()?;
    context.close();

    debug!("{}: {} flows", run.name(), flows.len());

    Ok(RunOutcome {
        run: *run,
        seed,
        deadline: scheduler.deadline(),
        topology,
        mobility,
        plan,
        schedule,
        flows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::NetworkSimFactory;
    use crate::TestbenchError;
    use observability::FlowProtocol;
    use scenarios::{MotionKind, ProtocolMode};

    #[test]
    fn test_single_static_udp_client() {
        let sweep = SweepConfig::default();
        let run = RunConfig::new(1, false, ProtocolMode::Udp);
        let outcome = run_experiment(&NetworkSimFactory, &sweep, &run).unwrap();

        assert_eq!(outcome.topology.node_count(), 3);
        assert!(outcome.mobility.iter().all(|a| a.kind == MotionKind::Fixed));
        assert_eq!(outcome.seed, run.seed(sweep.base_seed));

        let request = outcome
            .flows
            .iter()
            .find(|f| f.destination_address == outcome.topology.server_address)
            .expect("client to server flow");
        assert_eq!(request.protocol, FlowProtocol::Udp);
        assert!(request.tx_packets > 0 && request.tx_packets <= 10);
        assert!(request.time_first_tx_s >= 2.0);
        assert!(request.time_last_tx_s <= 10.0);
        assert_eq!(request.lost_packets, 0);

        // the echo server answers every request
        let reply = outcome
            .flows
            .iter()
            .find(|f| f.source_address == outcome.topology.server_address)
            .expect("server to client flow");
        assert_eq!(reply.rx_packets, request.rx_packets);
    }

    #[test]
    fn test_mixed_run_leaves_udp_unanswered() {
        let sweep = SweepConfig::default();
        let run = RunConfig::new(2, false, ProtocolMode::Mixed);
        let outcome = run_experiment(&NetworkSimFactory, &sweep, &run).unwrap();

        let udp: Vec<_> = outcome
            .flows
            .iter()
            .filter(|f| f.protocol == FlowProtocol::Udp)
            .collect();
        assert_eq!(udp.len(), 1);
        assert_eq!(udp[0].destination_address, outcome.topology.server_address);
        assert!(outcome.flows.iter().any(|f| f.protocol == FlowProtocol::Tcp));
    }

    #[test]
    fn test_zero_clients_rejected() {
        let sweep = SweepConfig::default();
        let run = RunConfig::new(0, false, ProtocolMode::Udp);
        let err = run_experiment(&NetworkSimFactory, &sweep, &run).unwrap_err();
        assert!(err.is_configuration_error());
        assert!(matches!(err, TestbenchError::Config(_)));
    }

    #[test]
    fn test_oversized_echo_packets_rejected() {
        let mut sweep = SweepConfig::default();
        sweep.traffic.echo.packet_size = u32::MAX;
        let run = RunConfig::new(1, false, ProtocolMode::Udp);
        let err = run_experiment(&NetworkSimFactory, &sweep, &run).unwrap_err();
        assert!(err.is_configuration_error());
        assert!(matches!(err, TestbenchError::Config(_)));
    }
}
