//! Transmission media: full-duplex point-to-point links and shared wifi cells

use crate::mobility::Position;
use crate::time::SimTime;
use std::collections::VecDeque;

const SPEED_OF_LIGHT_MPS: f64 = 299_792_458.0;

/// Parameters of a point-to-point link
#[derive(Clone, Debug, PartialEq)]
pub struct PointToPointConfig {
    pub data_rate_bps: u64,
    pub delay: SimTime,
    /// Drop-tail queue length per direction, in packets
    pub queue_packets: usize,
}

impl Default for PointToPointConfig {
    fn default() -> Self {
        Self {
            data_rate_bps: 100_000_000,
            delay: SimTime::from_millis(1),
            queue_packets: 100,
        }
    }
}

/// Parameters of an infrastructure wifi cell
#[derive(Clone, Debug, PartialEq)]
pub struct WifiConfig {
    pub ssid: String,
    pub phy_rate_bps: u64,
    /// Fixed per-frame cost (preamble, interframe spacing, MAC ack)
    pub frame_overhead: SimTime,
    pub queue_packets: usize,
    /// Frames are always delivered up to this distance
    pub reliable_range_m: f64,
    /// Frames are never delivered beyond this distance
    pub max_range_m: f64,
}

impl Default for WifiConfig {
    fn default() -> Self {
        Self {
            ssid: "sweep-cell".to_string(),
            phy_rate_bps: 54_000_000,
            frame_overhead: SimTime::from_micros(100),
            queue_packets: 500,
            reliable_range_m: 50.0,
            max_range_m: 110.0,
        }
    }
}

impl WifiConfig {
    /// Probability that a frame sent over `distance` metres arrives
    pub fn delivery_probability(&self, distance: f64) -> f64 {
        if distance <= self.reliable_range_m {
            1.0
        } else if distance >= self.max_range_m {
            0.0
        } else {
            (self.max_range_m - distance) / (self.max_range_m - self.reliable_range_m)
        }
    }

    pub fn airtime(&self, bytes: u32) -> SimTime {
        self.frame_overhead + SimTime::transmission(bytes, self.phy_rate_bps)
    }
}

pub(crate) fn propagation(a: Position, b: Position) -> SimTime {
    SimTime::from_secs_f64(a.distance(&b) / SPEED_OF_LIGHT_MPS)
}

/// A FIFO transmitter with a drop-tail queue
///
/// Holds the finish times of everything queued or on the wire.
#[derive(Debug)]
pub(crate) struct Transmitter {
    limit: usize,
    backlog: VecDeque<SimTime>,
}

impl Transmitter {
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            backlog: VecDeque::new(),
        }
    }

    /// Queue a frame taking `duration` on the wire; `None` if the queue is full
    pub fn enqueue(&mut self, now: SimTime, duration: SimTime) -> Option<SimTime> {
        while self.backlog.front().is_some_and(|&finish| finish <= now) {
            self.backlog.pop_front();
        }
        if self.backlog.len() >= self.limit {
            return None;
        }
        let start = self.backlog.back().copied().unwrap_or(now).max(now);
        let finish = start + duration;
        self.backlog.push_back(finish);
        Some(finish)
    }
}

#[derive(Debug)]
pub(crate) struct PointToPointLink {
    pub config: PointToPointConfig,
    pub ends: [usize; 2],
    pub tx: [Transmitter; 2],
}

impl PointToPointLink {
    pub fn new(config: PointToPointConfig, ends: [usize; 2]) -> Self {
        let tx = [
            Transmitter::new(config.queue_packets),
            Transmitter::new(config.queue_packets),
        ];
        Self { config, ends, tx }
    }
}

#[derive(Debug)]
pub(crate) struct WifiCell {
    pub config: WifiConfig,
    pub members: Vec<usize>,
    pub tx: Transmitter,
}

impl WifiCell {
    pub fn new(config: WifiConfig) -> Self {
        let tx = Transmitter::new(config.queue_packets);
        Self {
            config,
            members: Vec::new(),
            tx,
        }
    }
}
