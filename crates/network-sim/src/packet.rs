use std::net::SocketAddrV4;

/// Transport protocol carried by a packet
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Transport {
    Udp,
    Tcp,
}

impl Transport {
    /// IANA protocol number
    pub fn number(&self) -> u8 {
        match self {
            Transport::Udp => 17,
            Transport::Tcp => 6,
        }
    }

    /// IP + transport header bytes
    pub fn header_bytes(&self) -> u32 {
        match self {
            Transport::Udp => 28,
            Transport::Tcp => 40,
        }
    }
}

/// Application content, kept symbolic
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Payload {
    EchoRequest { seq: u32 },
    EchoReply { seq: u32 },
    Segment { seq: u64, len: u32 },
    Ack { ack: u64 },
}

/// An IP packet in flight
#[derive(Clone, Debug, PartialEq)]
pub struct Packet {
    pub uid: u64,
    pub protocol: Transport,
    pub source: SocketAddrV4,
    pub destination: SocketAddrV4,
    /// Size on the wire at the IP layer
    pub size: u32,
    pub payload: Payload,
}
