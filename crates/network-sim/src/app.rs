//! Traffic applications hosted on simulated nodes
//!
//! Applications never touch the simulator directly. Each callback returns a
//! list of [`Action`]s which the simulator turns into packets and timers.

use crate::packet::{Packet, Payload, Transport};
use crate::time::SimTime;
use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddrV4;

/// Retransmission timeout for the bulk sender
pub const TCP_RTO: SimTime = SimTime::from_secs(1);
/// Initial congestion window, in segments
pub const TCP_INITIAL_WINDOW: u32 = 10;

const DUP_ACK_THRESHOLD: u32 = 3;

/// What an application does once installed
#[derive(Clone, Debug, PartialEq)]
pub enum AppConfig {
    /// Answers every echo request with a reply of the same size
    UdpEchoServer { port: u16 },
    /// Sends `max_packets` requests of `packet_size` payload bytes, one per `interval`
    UdpEchoClient {
        remote: SocketAddrV4,
        max_packets: u32,
        interval: SimTime,
        packet_size: u32,
    },
    /// Accepts TCP data from any peer and acknowledges every segment
    TcpSink { port: u16 },
    /// Pushes `max_bytes` (0 = unlimited) to `remote` as fast as the window allows
    TcpBulkSender {
        remote: SocketAddrV4,
        max_bytes: u64,
        segment_size: u32,
    },
}

impl AppConfig {
    pub fn transport(&self) -> Transport {
        match self {
            AppConfig::UdpEchoServer { .. } | AppConfig::UdpEchoClient { .. } => Transport::Udp,
            AppConfig::TcpSink { .. } | AppConfig::TcpBulkSender { .. } => Transport::Tcp,
        }
    }

    /// Well-known port for listeners, `None` for clients
    pub fn listen_port(&self) -> Option<u16> {
        match self {
            AppConfig::UdpEchoServer { port } | AppConfig::TcpSink { port } => Some(*port),
            _ => None,
        }
    }
}

/// Counters exposed per application
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AppCounters {
    pub packets_sent: u64,
    pub packets_received: u64,
    pub bytes_acked: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Action {
    Send {
        destination: SocketAddrV4,
        protocol: Transport,
        size: u32,
        payload: Payload,
    },
    Tick(SimTime),
    ArmRto { at: SimTime, epoch: u64 },
}

#[derive(Debug)]
pub(crate) struct App {
    pub node: usize,
    pub config: AppConfig,
    pub local_port: u16,
    pub start: SimTime,
    pub stop: Option<SimTime>,
    pub running: bool,
    pub counters: AppCounters,
    state: AppState,
}

#[derive(Debug)]
enum AppState {
    EchoServer,
    EchoClient { sent: u32 },
    Sink { peers: HashMap<SocketAddrV4, SinkPeer> },
    Bulk(BulkSender),
}

#[derive(Debug, Default)]
struct SinkPeer {
    expected: u64,
    out_of_order: BTreeMap<u64, u32>,
}

#[derive(Debug)]
struct BulkSender {
    segment: u32,
    budget: Option<u64>,
    next_seq: u64,
    acked: u64,
    cwnd: f64,
    ssthresh: f64,
    dup_acks: u32,
    rto_epoch: u64,
}

impl App {
    pub fn new(node: usize, config: AppConfig, local_port: u16) -> Self {
        let state = match &config {
            AppConfig::UdpEchoServer { .. } => AppState::EchoServer,
            AppConfig::UdpEchoClient { .. } => AppState::EchoClient { sent: 0 },
            AppConfig::TcpSink { .. } => AppState::Sink {
                peers: HashMap::new(),
            },
            AppConfig::TcpBulkSender {
                max_bytes,
                segment_size,
                ..
            } => {
                let segment = (*segment_size).max(1);
                AppState::Bulk(BulkSender {
                    segment,
                    budget: (*max_bytes > 0).then_some(*max_bytes),
                    next_seq: 0,
                    acked: 0,
                    cwnd: TCP_INITIAL_WINDOW.saturating_mul(segment) as f64,
                    ssthresh: f64::MAX,
                    dup_acks: 0,
                    rto_epoch: 0,
                })
            }
        };
        Self {
            node,
            config,
            local_port,
            start: SimTime::ZERO,
            stop: None,
            running: false,
            counters: AppCounters::default(),
            state,
        }
    }

    pub fn on_start(&mut self, now: SimTime) -> Vec<Action> {
        self.running = true;
        let mut actions = Vec::new();
        if matches!(self.config, AppConfig::UdpEchoClient { .. }) {
            self.echo_request(now, &mut actions);
        }
        if let (AppConfig::TcpBulkSender { remote, .. }, AppState::Bulk(sender)) =
            (&self.config, &mut self.state)
        {
            sender.fill_window(*remote, &mut actions);
            sender.arm(now, &mut actions);
        }
        self.count_sends(&actions);
        actions
    }

    pub fn on_stop(&mut self) {
        self.running = false;
    }

    pub fn on_tick(&mut self, now: SimTime) -> Vec<Action> {
        let mut actions = Vec::new();
        if self.running {
            self.echo_request(now, &mut actions);
        }
        self.count_sends(&actions);
        actions
    }

    pub fn on_rto(&mut self, now: SimTime, epoch: u64) -> Vec<Action> {
        let mut actions = Vec::new();
        if !self.running {
            return actions;
        }
        if let (AppConfig::TcpBulkSender { remote, .. }, AppState::Bulk(sender)) =
            (&self.config, &mut self.state)
        {
            if sender.rto_epoch == epoch && sender.in_flight() > 0 {
                sender.timeout();
                sender.fill_window(*remote, &mut actions);
                sender.arm(now, &mut actions);
            }
        }
        self.count_sends(&actions);
        actions
    }

    pub fn on_receive(&mut self, now: SimTime, packet: &Packet) -> Vec<Action> {
        let mut actions = Vec::new();
        if !self.running {
            return actions;
        }
        self.counters.packets_received += 1;
        match (&self.config, &mut self.state, packet.payload) {
            (AppConfig::UdpEchoServer { .. }, AppState::EchoServer, Payload::EchoRequest { seq }) => {
                actions.push(Action::Send {
                    destination: packet.source,
                    protocol: Transport::Udp,
                    size: packet.size,
                    payload: Payload::EchoReply { seq },
                });
            }
            (AppConfig::TcpSink { .. }, AppState::Sink { peers }, Payload::Segment { seq, len }) => {
                let peer = peers.entry(packet.source).or_default();
                peer.accept(seq, len);
                actions.push(Action::Send {
                    destination: packet.source,
                    protocol: Transport::Tcp,
                    size: Transport::Tcp.header_bytes(),
                    payload: Payload::Ack { ack: peer.expected },
                });
            }
            (
                AppConfig::TcpBulkSender { remote, .. },
                AppState::Bulk(sender),
                Payload::Ack { ack },
            ) => {
                if sender.on_ack(ack, *remote, &mut actions) {
                    sender.arm(now, &mut actions);
                }
                sender.fill_window(*remote, &mut actions);
                self.counters.bytes_acked = sender.acked;
            }
            _ => {}
        }
        self.count_sends(&actions);
        actions
    }

    fn echo_request(&mut self, now: SimTime, actions: &mut Vec<Action>) {
        let (
            AppConfig::UdpEchoClient {
                remote,
                max_packets,
                interval,
                packet_size,
            },
            AppState::EchoClient { sent },
        ) = (&self.config, &mut self.state)
        else {
            return;
        };
        if *sent >= *max_packets {
            return;
        }
        actions.push(Action::Send {
            destination: *remote,
            protocol: Transport::Udp,
            size: packet_size.saturating_add(Transport::Udp.header_bytes()),
            payload: Payload::EchoRequest { seq: *sent },
        });
        *sent += 1;
        if *sent < *max_packets {
            actions.push(Action::Tick(now + *interval));
        }
    }

    fn count_sends(&mut self, actions: &[Action]) {
        let sends = actions
            .iter()
            .filter(|a| matches!(a, Action::Send { .. }))
            .count();
        self.counters.packets_sent += sends as u64;
    }
}

impl SinkPeer {
    fn accept(&mut self, seq: u64, len: u32) {
        if seq == self.expected {
            self.expected += len as u64;
            while let Some(len) = self.out_of_order.remove(&self.expected) {
                self.expected += len as u64;
            }
        } else if seq > self.expected {
            self.out_of_order.insert(seq, len);
        }
    }
}

impl BulkSender {
    fn in_flight(&self) -> u64 {
        self.next_seq - self.acked
    }

    fn segment_at(&self, seq: u64) -> u32 {
        let len = match self.budget {
            Some(budget) => budget.saturating_sub(seq).min(self.segment as u64),
            None => self.segment as u64,
        };
        len as u32
    }

    fn push_segment(remote: SocketAddrV4, seq: u64, len: u32, actions: &mut Vec<Action>) {
        actions.push(Action::Send {
            destination: remote,
            protocol: Transport::Tcp,
            size: len.saturating_add(Transport::Tcp.header_bytes()),
            payload: Payload::Segment { seq, len },
        });
    }

    fn fill_window(&mut self, remote: SocketAddrV4, actions: &mut Vec<Action>) {
        loop {
            let len = self.segment_at(self.next_seq);
            if len == 0 || (self.in_flight() + len as u64) as f64 > self.cwnd {
                break;
            }
            Self::push_segment(remote, self.next_seq, len, actions);
            self.next_seq += len as u64;
        }
    }

    fn arm(&mut self, now: SimTime, actions: &mut Vec<Action>) {
        if self.in_flight() == 0 {
            return;
        }
        self.rto_epoch += 1;
        actions.push(Action::ArmRto {
            at: now + TCP_RTO,
            epoch: self.rto_epoch,
        });
    }

    fn halve(&mut self) {
        let floor = 2.0 * self.segment as f64;
        self.ssthresh = (self.in_flight() as f64 / 2.0).max(floor);
    }

    /// Returns true when the cumulative ack moved forward
    fn on_ack(&mut self, ack: u64, remote: SocketAddrV4, actions: &mut Vec<Action>) -> bool {
        let seg = self.segment as f64;
        if ack > self.acked {
            self.acked = ack;
            self.next_seq = self.next_seq.max(ack);
            self.dup_acks = 0;
            if self.cwnd < self.ssthresh {
                self.cwnd += seg;
            } else {
                self.cwnd += seg * seg / self.cwnd;
            }
            return true;
        }
        if ack == self.acked && self.in_flight() > 0 {
            self.dup_acks += 1;
            if self.dup_acks == DUP_ACK_THRESHOLD {
                self.halve();
                self.cwnd = self.ssthresh;
                let len = self.segment_at(self.acked).min((self.in_flight()) as u32);
                Self::push_segment(remote, self.acked, len, actions);
            }
        }
        false
    }

    fn timeout(&mut self) {
        self.halve();
        self.cwnd = self.segment as f64;
        self.next_seq = self.acked;
        self.dup_acks = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn server() -> SocketAddrV4 {
        SocketAddrV4::new(Ipv4Addr::new(10, 1, 1, 1), 9)
    }

    fn sends(actions: &[Action]) -> Vec<Payload> {
        actions
            .iter()
            .filter_map(|a| match a {
                Action::Send { payload, .. } => Some(*payload),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_echo_client_stops_at_max_packets() {
        let mut app = App::new(
            0,
            AppConfig::UdpEchoClient {
                remote: server(),
                max_packets: 2,
                interval: SimTime::from_secs(1),
                packet_size: 1024,
            },
            49153,
        );
        let first = app.on_start(SimTime::from_secs(2));
        assert_eq!(
            first[0],
            Action::Send {
                destination: server(),
                protocol: Transport::Udp,
                size: 1052,
                payload: Payload::EchoRequest { seq: 0 },
            }
        );
        assert_eq!(first[1], Action::Tick(SimTime::from_secs(3)));

        let second = app.on_tick(SimTime::from_secs(3));
        assert_eq!(sends(&second), vec![Payload::EchoRequest { seq: 1 }]);
        assert_eq!(second.len(), 1);
        assert!(app.on_tick(SimTime::from_secs(4)).is_empty());
        assert_eq!(app.counters.packets_sent, 2);
    }

    #[test]
    fn test_bulk_sender_initial_window() {
        let mut app = App::new(
            0,
            AppConfig::TcpBulkSender {
                remote: server(),
                max_bytes: 0,
                segment_size: 536,
            },
            49153,
        );
        let actions = app.on_start(SimTime::ZERO);
        assert_eq!(sends(&actions).len(), TCP_INITIAL_WINDOW as usize);
        assert!(matches!(actions.last(), Some(Action::ArmRto { epoch: 1, .. })));
    }

    #[test]
    fn test_huge_sizes_saturate() {
        let mut echo = App::new(
            0,
            AppConfig::UdpEchoClient {
                remote: server(),
                max_packets: 1,
                interval: SimTime::from_secs(1),
                packet_size: u32::MAX,
            },
            49153,
        );
        let actions = echo.on_start(SimTime::ZERO);
        assert!(matches!(actions[0], Action::Send { size: u32::MAX, .. }));

        let mut bulk = App::new(
            0,
            AppConfig::TcpBulkSender {
                remote: server(),
                max_bytes: 0,
                segment_size: u32::MAX,
            },
            49153,
        );
        assert!(!sends(&bulk.on_start(SimTime::ZERO)).is_empty());
    }

    #[test]
    fn test_bulk_sender_respects_budget() {
        let mut app = App::new(
            0,
            AppConfig::TcpBulkSender {
                remote: server(),
                max_bytes: 1000,
                segment_size: 536,
            },
            49153,
        );
        let actions = app.on_start(SimTime::ZERO);
        assert_eq!(
            sends(&actions),
            vec![
                Payload::Segment { seq: 0, len: 536 },
                Payload::Segment { seq: 536, len: 464 },
            ]
        );
    }

    #[test]
    fn test_triple_duplicate_ack_retransmits() {
        let mut app = App::new(
            0,
            AppConfig::TcpBulkSender {
                remote: server(),
                max_bytes: 0,
                segment_size: 100,
            },
            49153,
        );
        app.on_start(SimTime::ZERO);
        let ack = |ack| Packet {
            uid: 0,
            protocol: Transport::Tcp,
            source: server(),
            destination: SocketAddrV4::new(Ipv4Addr::new(192, 168, 0, 1), 49153),
            size: 40,
            payload: Payload::Ack { ack },
        };
        // first ack opens the window by one segment in slow start
        let grown = app.on_receive(SimTime::from_millis(1), &ack(100));
        assert_eq!(sends(&grown).len(), 2);

        app.on_receive(SimTime::from_millis(2), &ack(100));
        app.on_receive(SimTime::from_millis(3), &ack(100));
        let third = app.on_receive(SimTime::from_millis(4), &ack(100));
        assert_eq!(sends(&third), vec![Payload::Segment { seq: 100, len: 100 }]);
    }

    #[test]
    fn test_sink_reassembles_out_of_order() {
        let mut peer = SinkPeer::default();
        peer.accept(536, 536);
        assert_eq!(peer.expected, 0);
        peer.accept(0, 536);
        assert_eq!(peer.expected, 1072);
        peer.accept(0, 536);
        assert_eq!(peer.expected, 1072);
    }

    #[test]
    fn test_stopped_app_ignores_traffic() {
        let mut app = App::new(0, AppConfig::UdpEchoServer { port: 9 }, 9);
        let request = Packet {
            uid: 1,
            protocol: Transport::Udp,
            source: SocketAddrV4::new(Ipv4Addr::new(192, 168, 0, 1), 49153),
            destination: server(),
            size: 1052,
            payload: Payload::EchoRequest { seq: 0 },
        };
        assert!(app.on_receive(SimTime::ZERO, &request).is_empty());
        app.on_start(SimTime::ZERO);
        assert_eq!(app.on_receive(SimTime::ZERO, &request).len(), 1);
        app.on_stop();
        assert!(app.on_receive(SimTime::ZERO, &request).is_empty());
    }
}
