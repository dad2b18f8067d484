//! Per-flow statistics collected at the IP layer
//!
//! A flow is one (protocol, source, destination) tuple. Packets are stamped
//! when the originating node hands them to IP and matched again on delivery
//! at the destination node, which gives per-packet one-way delay.

use crate::packet::Transport;
use crate::time::SimTime;
use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddrV4;

/// Five-tuple identifying a flow
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FlowKey {
    pub protocol: Transport,
    pub source: SocketAddrV4,
    pub destination: SocketAddrV4,
}

/// Delay or jitter histogram with fixed-width bins
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Histogram {
    bin_width: SimTime,
    bins: BTreeMap<u64, u64>,
}

impl Histogram {
    pub fn new(bin_width: SimTime) -> Self {
        Self {
            bin_width,
            bins: BTreeMap::new(),
        }
    }

    pub fn add(&mut self, value: SimTime) {
        let width = self.bin_width.as_nanos().max(1);
        *self.bins.entry(value.as_nanos() / width).or_insert(0) += 1;
    }

    pub fn bin_width(&self) -> SimTime {
        self.bin_width
    }

    /// Non-empty bins as (bin start, count), in ascending order
    pub fn bins(&self) -> Vec<(SimTime, u64)> {
        self.bins
            .iter()
            .map(|(&index, &count)| (SimTime::from_nanos(index * self.bin_width.as_nanos()), count))
            .collect()
    }

    pub fn total(&self) -> u64 {
        self.bins.values().sum()
    }
}

/// Counters for one flow
#[derive(Clone, Debug, PartialEq)]
pub struct FlowRecord {
    pub flow_id: u32,
    pub key: FlowKey,
    pub tx_bytes: u64,
    pub rx_bytes: u64,
    pub tx_packets: u64,
    pub rx_packets: u64,
    pub lost_packets: u64,
    pub time_first_tx: SimTime,
    pub time_last_tx: SimTime,
    pub time_first_rx: Option<SimTime>,
    pub time_last_rx: Option<SimTime>,
    pub delay_sum: SimTime,
    pub jitter_sum: SimTime,
    pub last_delay: Option<SimTime>,
    pub delay_histogram: Histogram,
    pub jitter_histogram: Histogram,
}

impl FlowRecord {
    fn new(flow_id: u32, key: FlowKey, now: SimTime, bin_width: SimTime) -> Self {
        Self {
            flow_id,
            key,
            tx_bytes: 0,
            rx_bytes: 0,
            tx_packets: 0,
            rx_packets: 0,
            lost_packets: 0,
            time_first_tx: now,
            time_last_tx: now,
            time_first_rx: None,
            time_last_rx: None,
            delay_sum: SimTime::ZERO,
            jitter_sum: SimTime::ZERO,
            last_delay: None,
            delay_histogram: Histogram::new(bin_width),
            jitter_histogram: Histogram::new(bin_width),
        }
    }
}

/// Tracks packets in flight and aggregates them into flows
#[derive(Debug)]
pub struct FlowMonitor {
    bin_width: SimTime,
    flows: Vec<FlowRecord>,
    index: HashMap<FlowKey, usize>,
    /// packet uid -> (flow index, tx time)
    in_flight: HashMap<u64, (usize, SimTime)>,
}

impl Default for FlowMonitor {
    fn default() -> Self {
        Self::new(SimTime::from_millis(1))
    }
}

impl FlowMonitor {
    pub fn new(bin_width: SimTime) -> Self {
        Self {
            bin_width,
            flows: Vec::new(),
            index: HashMap::new(),
            in_flight: HashMap::new(),
        }
    }

    /// Packet handed to IP at its source node
    pub fn record_tx(&mut self, uid: u64, key: FlowKey, bytes: u32, now: SimTime) {
        let slot = match self.index.get(&key) {
            Some(&slot) => slot,
            None => {
                let slot = self.flows.len();
                let flow_id = slot as u32 + 1;
                self.flows.push(FlowRecord::new(flow_id, key, now, self.bin_width));
                self.index.insert(key, slot);
                slot
            }
        };
        let flow = &mut self.flows[slot];
        flow.tx_packets += 1;
        flow.tx_bytes += bytes as u64;
        flow.time_last_tx = now;
        self.in_flight.insert(uid, (slot, now));
    }

    /// Packet delivered to IP at its destination node
    pub fn record_rx(&mut self, uid: u64, bytes: u32, now: SimTime) {
        let Some((slot, sent_at)) = self.in_flight.remove(&uid) else {
            return;
        };
        let flow = &mut self.flows[slot];
        let delay = now - sent_at;

        if let Some(previous) = flow.last_delay {
            let jitter = if delay > previous {
                delay - previous
            } else {
                previous - delay
            };
            flow.jitter_sum += jitter;
            flow.jitter_histogram.add(jitter);
        }
        flow.last_delay = Some(delay);
        flow.delay_sum += delay;
        flow.delay_histogram.add(delay);

        flow.rx_packets += 1;
        flow.rx_bytes += bytes as u64;
        flow.time_first_rx.get_or_insert(now);
        flow.time_last_rx = Some(now);
    }

    /// Packet dropped anywhere along its path
    pub fn record_drop(&mut self, uid: u64) {
        if let Some((slot, _)) = self.in_flight.remove(&uid) {
            self.flows[slot].lost_packets += 1;
        }
    }

    /// Flows ordered by id
    pub fn records(&self) -> &[FlowRecord] {
        &self.flows
    }

    pub fn packets_in_flight(&self) -> usize {
        self.in_flight.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn key(port: u16) -> FlowKey {
        FlowKey {
            protocol: Transport::Udp,
            source: SocketAddrV4::new(Ipv4Addr::new(192, 168, 0, 1), port),
            destination: SocketAddrV4::new(Ipv4Addr::new(10, 1, 1, 1), 9),
        }
    }

    #[test]
    fn test_delay_and_jitter_accounting() {
        let mut monitor = FlowMonitor::default();
        monitor.record_tx(1, key(49153), 1052, SimTime::from_secs(2));
        monitor.record_tx(2, key(49153), 1052, SimTime::from_secs(3));
        monitor.record_rx(1, 1052, SimTime::from_secs(2) + SimTime::from_millis(2));
        monitor.record_rx(2, 1052, SimTime::from_secs(3) + SimTime::from_millis(5));

        let flow = &monitor.records()[0];
        assert_eq!(flow.flow_id, 1);
        assert_eq!(flow.tx_packets, 2);
        assert_eq!(flow.rx_packets, 2);
        assert_eq!(flow.rx_bytes, 2104);
        assert_eq!(flow.delay_sum, SimTime::from_millis(7));
        assert_eq!(flow.jitter_sum, SimTime::from_millis(3));
        assert_eq!(flow.delay_histogram.total(), 2);
        assert_eq!(flow.jitter_histogram.total(), 1);
        assert_eq!(flow.time_first_rx, Some(SimTime::from_millis(2002)));
        assert_eq!(monitor.packets_in_flight(), 0);
    }

    #[test]
    fn test_flows_numbered_by_first_sighting() {
        let mut monitor = FlowMonitor::default();
        monitor.record_tx(1, key(2), 100, SimTime::ZERO);
        monitor.record_tx(2, key(1), 100, SimTime::ZERO);
        monitor.record_tx(3, key(2), 100, SimTime::ZERO);
        monitor.record_drop(3);

        let records = monitor.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].key.source.port(), 2);
        assert_eq!(records[0].tx_packets, 2);
        assert_eq!(records[0].lost_packets, 1);
        assert_eq!(records[1].flow_id, 2);
    }

    #[test]
    fn test_histogram_bins() {
        let mut hist = Histogram::new(SimTime::from_millis(1));
        hist.add(SimTime::from_micros(300));
        hist.add(SimTime::from_micros(900));
        hist.add(SimTime::from_micros(2500));
        assert_eq!(
            hist.bins(),
            vec![(SimTime::ZERO, 2), (SimTime::from_millis(2), 1)]
        );
    }
}
