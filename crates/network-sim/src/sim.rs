//! Discrete-event network simulator
//!
//! Events are kept in a min-heap ordered by (time, insertion sequence), so
//! two runs built the same way with the same seed replay identically.

use crate::app::{Action, App, AppConfig, AppCounters};
use crate::flowmon::{FlowKey, FlowMonitor, FlowRecord};
use crate::medium::{propagation, PointToPointConfig, PointToPointLink, WifiCell, WifiConfig};
use crate::mobility::{MobilityModel, MotionState, Position};
use crate::packet::{Packet, Payload, Transport};
use crate::time::SimTime;
use crate::SimError;
use log::{debug, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap, VecDeque};
use std::fmt;
use std::net::{Ipv4Addr, SocketAddrV4};

/// First port handed out to client applications
pub const EPHEMERAL_PORT_BASE: u16 = 49153;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AppId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node{}", self.0)
    }
}

/// Totals for one call to [`NetworkSimulator::run`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub events_processed: u64,
    pub packets_sent: u64,
    pub packets_dropped: u64,
    pub end_time: SimTime,
}

#[derive(Clone, Copy, Debug)]
enum Channel {
    PointToPoint { link: usize, end: usize },
    Wifi { cell: usize },
}

#[derive(Debug)]
struct Device {
    node: usize,
    channel: Channel,
    address: Option<(Ipv4Addr, u8)>,
}

#[derive(Debug)]
struct Node {
    name: String,
    devices: Vec<usize>,
    motion: MotionState,
    next_port: u16,
}

#[derive(Clone, Copy, Debug)]
struct Hop {
    device: usize,
    next: usize,
}

#[derive(Debug)]
enum Event {
    AppStart(usize),
    AppStop(usize),
    EchoTick(usize),
    Rto { app: usize, epoch: u64 },
    Arrive { node: usize, packet: Packet },
    Walk(usize),
}

#[derive(Debug)]
struct Scheduled {
    at: SimTime,
    seq: u64,
    event: Event,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at && self.seq == other.seq
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.at, self.seq).cmp(&(other.at, other.seq))
    }
}

/// A self-contained simulated network
///
/// Build the topology, install applications, call [`build_routes`], then
/// [`run`] until a deadline. Every instance owns its own clock, RNG and
/// state, so separate runs never see each other.
///
/// [`build_routes`]: NetworkSimulator::build_routes
/// [`run`]: NetworkSimulator::run
#[derive(Debug)]
pub struct NetworkSimulator {
    now: SimTime,
    rng: StdRng,
    nodes: Vec<Node>,
    devices: Vec<Device>,
    links: Vec<PointToPointLink>,
    cells: Vec<WifiCell>,
    apps: Vec<App>,
    owners: HashMap<Ipv4Addr, usize>,
    routes: Option<Vec<Vec<Option<Hop>>>>,
    monitor: Option<FlowMonitor>,
    queue: BinaryHeap<Reverse<Scheduled>>,
    next_seq: u64,
    next_uid: u64,
    armed: bool,
    summary: RunSummary,
}

impl NetworkSimulator {
    pub fn new(seed: u64) -> Self {
        Self {
            now: SimTime::ZERO,
            rng: StdRng::seed_from_u64(seed),
            nodes: Vec::new(),
            devices: Vec::new(),
            links: Vec::new(),
            cells: Vec::new(),
            apps: Vec::new(),
            owners: HashMap::new(),
            routes: None,
            monitor: None,
            queue: BinaryHeap::new(),
            next_seq: 0,
            next_uid: 0,
            armed: false,
            summary: RunSummary::default(),
        }
    }

    pub fn now(&self) -> SimTime {
        self.now
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn add_node(&mut self, name: impl Into<String>) -> NodeId {
        let motion = MotionState::new(MobilityModel::default(), &mut self.rng);
        self.nodes.push(Node {
            name: name.into(),
            devices: Vec::new(),
            motion,
            next_port: EPHEMERAL_PORT_BASE,
        });
        self.routes = None;
        NodeId(self.nodes.len() - 1)
    }

    pub fn node_name(&self, node: NodeId) -> Result<&str, SimError> {
        Ok(self.node(node.0)?.name.as_str())
    }

    /// Join two nodes with a full-duplex link; returns (device on a, device on b)
    pub fn connect_point_to_point(
        &mut self,
        a: NodeId,
        b: NodeId,
        config: &PointToPointConfig,
    ) -> Result<(DeviceId, DeviceId), SimError> {
        self.node(a.0)?;
        self.node(b.0)?;
        let link = self.links.len();
        let dev_a = self.add_device(a.0, Channel::PointToPoint { link, end: 0 });
        let dev_b = self.add_device(b.0, Channel::PointToPoint { link, end: 1 });
        self.links
            .push(PointToPointLink::new(config.clone(), [dev_a, dev_b]));
        debug!(
            "p2p link {} <-> {} at {} bps, delay {}",
            self.nodes[a.0].name, self.nodes[b.0].name, config.data_rate_bps, config.delay
        );
        Ok((DeviceId(dev_a), DeviceId(dev_b)))
    }

    pub fn create_wifi_cell(&mut self, config: &WifiConfig) -> CellId {
        self.cells.push(WifiCell::new(config.clone()));
        CellId(self.cells.len() - 1)
    }

    pub fn attach_wifi(&mut self, node: NodeId, cell: CellId) -> Result<DeviceId, SimError> {
        self.node(node.0)?;
        if cell.0 >= self.cells.len() {
            return Err(SimError::UnknownCell(cell.0));
        }
        let dev = self.add_device(node.0, Channel::Wifi { cell: cell.0 });
        self.cells[cell.0].members.push(dev);
        Ok(DeviceId(dev))
    }

    pub fn assign_address(
        &mut self,
        device: DeviceId,
        address: Ipv4Addr,
        prefix: u8,
    ) -> Result<(), SimError> {
        if device.0 >= self.devices.len() {
            return Err(SimError::UnknownDevice(device.0));
        }
        if self.owners.contains_key(&address) {
            return Err(SimError::AddressConflict(address));
        }
        let dev = &mut self.devices[device.0];
        if let Some((old, _)) = dev.address.replace((address, prefix)) {
            self.owners.remove(&old);
        }
        self.owners.insert(address, dev.node);
        Ok(())
    }

    pub fn device_address(&self, device: DeviceId) -> Option<Ipv4Addr> {
        self.devices
            .get(device.0)
            .and_then(|d| d.address)
            .map(|(addr, _)| addr)
    }

    pub fn set_mobility(&mut self, node: NodeId, model: MobilityModel) -> Result<(), SimError> {
        self.node(node.0)?;
        let walks = model.is_random_walk();
        self.nodes[node.0].motion = MotionState::new(model, &mut self.rng);
        if walks {
            self.schedule(self.now, Event::Walk(node.0));
        }
        Ok(())
    }

    pub fn mobility(&self, node: NodeId) -> Result<&MobilityModel, SimError> {
        Ok(&self.node(node.0)?.motion.model)
    }

    pub fn position(&self, node: NodeId) -> Result<Position, SimError> {
        Ok(self.node(node.0)?.motion.position(self.now))
    }

    /// Install an application; it runs from time zero until told otherwise
    pub fn install_app(&mut self, node: NodeId, config: AppConfig) -> Result<AppId, SimError> {
        self.node(node.0)?;
        let protocol = config.transport();
        let local_port = match config.listen_port() {
            Some(port) => {
                let taken = self.apps.iter().any(|app| {
                    app.node == node.0
                        && app.config.transport() == protocol
                        && app.local_port == port
                });
                if taken {
                    return Err(SimError::DuplicateEndpoint { node: node.0, port });
                }
                port
            }
            None => {
                let n = &mut self.nodes[node.0];
                let port = n.next_port;
                n.next_port = n.next_port.checked_add(1).ok_or(SimError::PortsExhausted(node.0))?;
                port
            }
        };
        self.apps.push(App::new(node.0, config, local_port));
        Ok(AppId(self.apps.len() - 1))
    }

    pub fn set_app_window(
        &mut self,
        app: AppId,
        start: SimTime,
        stop: SimTime,
    ) -> Result<(), SimError> {
        let entry = self
            .apps
            .get_mut(app.0)
            .ok_or(SimError::UnknownApp(app.0))?;
        entry.start = start;
        entry.stop = Some(stop);
        Ok(())
    }

    pub fn app_counters(&self, app: AppId) -> Result<AppCounters, SimError> {
        self.apps
            .get(app.0)
            .map(|a| a.counters)
            .ok_or(SimError::UnknownApp(app.0))
    }

    pub fn app_local_port(&self, app: AppId) -> Result<u16, SimError> {
        self.apps
            .get(app.0)
            .map(|a| a.local_port)
            .ok_or(SimError::UnknownApp(app.0))
    }

    pub fn enable_flow_monitor(&mut self) {
        if self.monitor.is_none() {
            self.monitor = Some(FlowMonitor::default());
        }
    }

    /// Flow statistics gathered so far, ordered by flow id
    pub fn flow_records(&self) -> &[FlowRecord] {
        self.monitor.as_ref().map(|m| m.records()).unwrap_or(&[])
    }

    /// Compute shortest-hop routes between every pair of nodes
    pub fn build_routes(&mut self) {
        let count = self.nodes.len();
        let mut table = vec![vec![None; count]; count];
        for (src, row) in table.iter_mut().enumerate() {
            let mut visited = vec![false; count];
            visited[src] = true;
            let mut frontier = VecDeque::new();
            for (dev, next) in self.neighbours(src) {
                if !visited[next] {
                    visited[next] = true;
                    row[next] = Some(Hop { device: dev, next });
                    frontier.push_back(next);
                }
            }
            while let Some(at) = frontier.pop_front() {
                let first = row[at];
                for (_, next) in self.neighbours(at) {
                    if !visited[next] {
                        visited[next] = true;
                        row[next] = first;
                        frontier.push_back(next);
                    }
                }
            }
        }
        self.routes = Some(table);
        debug!("routes built for {} nodes", count);
    }

    /// Advance the simulation up to and including `stop`
    pub fn run(&mut self, stop: SimTime) -> Result<RunSummary, SimError> {
        if self.routes.is_none() {
            return Err(SimError::RoutesNotBuilt);
        }
        if !self.armed {
            self.armed = true;
            for id in 0..self.apps.len() {
                let (start, end) = (self.apps[id].start, self.apps[id].stop);
                self.schedule(start, Event::AppStart(id));
                if let Some(end) = end {
                    self.schedule(end, Event::AppStop(id));
                }
            }
        }

        while self.queue.peek().is_some_and(|Reverse(next)| next.at <= stop) {
            let Some(Reverse(Scheduled { at, event, .. })) = self.queue.pop() else {
                break;
            };
            self.now = at;
            self.summary.events_processed += 1;
            self.dispatch(event);
        }
        self.now = self.now.max(stop);
        self.summary.end_time = self.now;
        Ok(self.summary)
    }

    fn node(&self, id: usize) -> Result<&Node, SimError> {
        self.nodes.get(id).ok_or(SimError::UnknownNode(id))
    }

    fn add_device(&mut self, node: usize, channel: Channel) -> usize {
        self.devices.push(Device {
            node,
            channel,
            address: None,
        });
        let dev = self.devices.len() - 1;
        self.nodes[node].devices.push(dev);
        self.routes = None;
        dev
    }

    fn neighbours(&self, node: usize) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        for &dev in &self.nodes[node].devices {
            match self.devices[dev].channel {
                Channel::PointToPoint { link, end } => {
                    let peer = self.links[link].ends[1 - end];
                    out.push((dev, self.devices[peer].node));
                }
                Channel::Wifi { cell } => {
                    for &member in &self.cells[cell].members {
                        let peer = self.devices[member].node;
                        if peer != node {
                            out.push((dev, peer));
                        }
                    }
                }
            }
        }
        out
    }

    fn schedule(&mut self, at: SimTime, event: Event) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Reverse(Scheduled { at, seq, event }));
    }

    fn dispatch(&mut self, event: Event) {
        let now = self.now;
        match event {
            Event::AppStart(id) => {
                let actions = self.apps[id].on_start(now);
                self.apply(id, actions);
            }
            Event::AppStop(id) => self.apps[id].on_stop(),
            Event::EchoTick(id) => {
                let actions = self.apps[id].on_tick(now);
                self.apply(id, actions);
            }
            Event::Rto { app, epoch } => {
                let actions = self.apps[app].on_rto(now, epoch);
                self.apply(app, actions);
            }
            Event::Arrive { node, packet } => self.arrive(node, packet),
            Event::Walk(node) => {
                if let Some(next) = self.nodes[node].motion.next_leg(now, &mut self.rng) {
                    self.schedule(next, Event::Walk(node));
                }
            }
        }
    }

    fn apply(&mut self, app: usize, actions: Vec<Action>) {
        for action in actions {
            match action {
                Action::Send {
                    destination,
                    protocol,
                    size,
                    payload,
                } => self.originate(app, destination, protocol, size, payload),
                Action::Tick(at) => self.schedule(at, Event::EchoTick(app)),
                Action::ArmRto { at, epoch } => self.schedule(at, Event::Rto { app, epoch }),
            }
        }
    }

    fn source_address(&self, node: usize, destination: Ipv4Addr) -> Ipv4Addr {
        let via = self
            .owners
            .get(&destination)
            .and_then(|&dst| self.routes.as_ref().and_then(|r| r[node][dst]))
            .map(|hop| hop.device);
        let devices = &self.nodes[node].devices;
        via.into_iter()
            .chain(devices.iter().copied())
            .find_map(|dev| self.devices[dev].address)
            .map(|(addr, _)| addr)
            .unwrap_or(Ipv4Addr::UNSPECIFIED)
    }

    fn originate(
        &mut self,
        app: usize,
        destination: SocketAddrV4,
        protocol: Transport,
        size: u32,
        payload: Payload,
    ) {
        let node = self.apps[app].node;
        let source = SocketAddrV4::new(
            self.source_address(node, *destination.ip()),
            self.apps[app].local_port,
        );
        let uid = self.next_uid;
        self.next_uid += 1;
        let packet = Packet {
            uid,
            protocol,
            source,
            destination,
            size,
            payload,
        };
        self.summary.packets_sent += 1;
        if let Some(monitor) = self.monitor.as_mut() {
            let key = FlowKey {
                protocol,
                source,
                destination,
            };
            monitor.record_tx(uid, key, size, self.now);
        }
        self.forward(node, packet);
    }

    fn drop_packet(&mut self, packet: &Packet, reason: &str) {
        trace!("drop uid {} ({}) at {}", packet.uid, reason, self.now);
        self.summary.packets_dropped += 1;
        if let Some(monitor) = self.monitor.as_mut() {
            monitor.record_drop(packet.uid);
        }
    }

    fn forward(&mut self, node: usize, packet: Packet) {
        let Some(&dst) = self.owners.get(packet.destination.ip()) else {
            self.drop_packet(&packet, "no route");
            return;
        };
        if dst == node {
            self.schedule(self.now, Event::Arrive { node, packet });
            return;
        }
        let hop = self.routes.as_ref().and_then(|r| r[node][dst]);
        let Some(Hop { device, next }) = hop else {
            self.drop_packet(&packet, "unreachable");
            return;
        };

        match self.devices[device].channel {
            Channel::PointToPoint { link, end } => {
                let link = &mut self.links[link];
                let wire = SimTime::transmission(packet.size, link.config.data_rate_bps);
                let delay = link.config.delay;
                match link.tx[end].enqueue(self.now, wire) {
                    Some(finish) => self.schedule(finish + delay, Event::Arrive { node: next, packet }),
                    None => self.drop_packet(&packet, "p2p queue full"),
                }
            }
            Channel::Wifi { cell } => {
                let from = self.nodes[node].motion.position(self.now);
                let to = self.nodes[next].motion.position(self.now);
                let cell = &mut self.cells[cell];
                let airtime = cell.config.airtime(packet.size);
                let queued = cell.tx.enqueue(self.now, airtime);
                let p = cell.config.delivery_probability(from.distance(&to));
                let Some(finish) = queued else {
                    self.drop_packet(&packet, "wifi queue full");
                    return;
                };
                if p < 1.0 && self.rng.gen::<f64>() >= p {
                    self.drop_packet(&packet, "out of range");
                    return;
                }
                self.schedule(finish + propagation(from, to), Event::Arrive { node: next, packet });
            }
        }
    }

    fn arrive(&mut self, node: usize, packet: Packet) {
        let owner = self.owners.get(packet.destination.ip()).copied();
        if owner != Some(node) {
            self.forward(node, packet);
            return;
        }
        if let Some(monitor) = self.monitor.as_mut() {
            monitor.record_rx(packet.uid, packet.size, self.now);
        }
        let port = packet.destination.port();
        let listener = self.apps.iter().position(|app| {
            app.node == node
                && app.running
                && app.config.transport() == packet.protocol
                && app.local_port == port
        });
        match listener {
            Some(id) => {
                let actions = self.apps[id].on_receive(self.now, &packet);
                self.apply(id, actions);
            }
            None => trace!(
                "no listener for {:?} port {} on {}",
                packet.protocol,
                port,
                self.nodes[node].name
            ),
        }
    }
}
