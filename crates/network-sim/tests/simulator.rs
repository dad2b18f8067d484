use network_sim::{
    AppConfig, AppId, Bounds, MobilityModel, NetworkSimulator, NodeId, PointToPointConfig,
    Position, SimError, SimTime, Transport, WifiConfig,
};
use std::net::{Ipv4Addr, SocketAddrV4};

const SERVER_ADDR: Ipv4Addr = Ipv4Addr::new(10, 1, 1, 1);

struct Net {
    sim: NetworkSimulator,
    server: NodeId,
    clients: Vec<NodeId>,
}

fn build(seed: u64, clients: u8) -> Net {
    let mut sim = NetworkSimulator::new(seed);
    let server = sim.add_node("server");
    let ap = sim.add_node("ap");
    let (s_dev, ap_dev) = sim
        .connect_point_to_point(server, ap, &PointToPointConfig::default())
        .unwrap();
    sim.assign_address(s_dev, SERVER_ADDR, 24).unwrap();
    sim.assign_address(ap_dev, Ipv4Addr::new(10, 1, 1, 2), 24).unwrap();

    let cell = sim.create_wifi_cell(&WifiConfig::default());
    let mut nodes = Vec::new();
    for i in 0..clients {
        let node = sim.add_node(format!("client{i}"));
        let dev = sim.attach_wifi(node, cell).unwrap();
        sim.assign_address(dev, Ipv4Addr::new(192, 168, 0, i + 1), 24)
            .unwrap();
        nodes.push(node);
    }
    let ap_wifi = sim.attach_wifi(ap, cell).unwrap();
    sim.assign_address(ap_wifi, Ipv4Addr::new(192, 168, 0, clients + 1), 24)
        .unwrap();

    Net {
        sim,
        server,
        clients: nodes,
    }
}

fn echo_client(remote: Ipv4Addr) -> AppConfig {
    AppConfig::UdpEchoClient {
        remote: SocketAddrV4::new(remote, 9),
        max_packets: 10,
        interval: SimTime::from_secs(1),
        packet_size: 1024,
    }
}

fn window(sim: &mut NetworkSimulator, app: AppId, start: u64, stop: u64) {
    sim.set_app_window(app, SimTime::from_secs(start), SimTime::from_secs(stop))
        .unwrap();
}

fn random_walk() -> MobilityModel {
    MobilityModel::RandomWalk {
        bounds: Bounds {
            x_min: -50.0,
            x_max: 50.0,
            y_min: -50.0,
            y_max: 50.0,
        },
        initial_area: Bounds {
            x_min: 0.0,
            x_max: 50.0,
            y_min: 0.0,
            y_max: 50.0,
        },
        speed_min_mps: 2.0,
        speed_max_mps: 4.0,
        step_distance_m: 1.0,
    }
}

#[test]
fn udp_echo_round_trip() {
    let mut net = build(1, 1);
    let server = net
        .sim
        .install_app(net.server, AppConfig::UdpEchoServer { port: 9 })
        .unwrap();
    let client = net
        .sim
        .install_app(net.clients[0], echo_client(SERVER_ADDR))
        .unwrap();
    window(&mut net.sim, server, 1, 10);
    window(&mut net.sim, client, 2, 10);
    net.sim.enable_flow_monitor();
    net.sim.build_routes();
    net.sim.run(SimTime::from_secs(10)).unwrap();

    let flows = net.sim.flow_records();
    assert_eq!(flows.len(), 2);

    let request = &flows[0];
    assert_eq!(request.flow_id, 1);
    assert_eq!(request.key.protocol, Transport::Udp);
    assert_eq!(*request.key.source.ip(), Ipv4Addr::new(192, 168, 0, 1));
    assert_eq!(request.key.source.port(), 49153);
    assert_eq!(request.key.destination, SocketAddrV4::new(SERVER_ADDR, 9));
    assert_eq!(request.time_first_tx, SimTime::from_secs(2));
    // the tick at the stop time is cancelled by the stop itself
    assert_eq!(request.tx_packets, 8);
    assert_eq!(request.rx_packets, 8);
    assert_eq!(request.lost_packets, 0);
    assert_eq!(request.tx_bytes, 8 * 1052);
    assert!(request.delay_sum > SimTime::ZERO);

    let reply = &flows[1];
    assert_eq!(reply.key.source, SocketAddrV4::new(SERVER_ADDR, 9));
    assert_eq!(reply.rx_packets, 8);

    let counters = net.sim.app_counters(client).unwrap();
    assert_eq!(counters.packets_sent, 8);
    assert_eq!(counters.packets_received, 8);
}

#[test]
fn unknown_destination_counts_as_lost() {
    let mut net = build(1, 1);
    let client = net
        .sim
        .install_app(net.clients[0], echo_client(Ipv4Addr::new(172, 16, 0, 1)))
        .unwrap();
    window(&mut net.sim, client, 2, 10);
    net.sim.enable_flow_monitor();
    net.sim.build_routes();
    net.sim.run(SimTime::from_secs(10)).unwrap();

    let flows = net.sim.flow_records();
    assert_eq!(flows.len(), 1);
    assert_eq!(flows[0].lost_packets, flows[0].tx_packets);
    assert_eq!(flows[0].rx_packets, 0);
}

#[test]
fn out_of_range_client_loses_everything() {
    let mut net = build(3, 1);
    net.sim
        .set_mobility(
            net.clients[0],
            MobilityModel::Fixed {
                position: Position::new(200.0, 0.0),
            },
        )
        .unwrap();
    net.sim
        .install_app(net.server, AppConfig::UdpEchoServer { port: 9 })
        .unwrap();
    net.sim
        .install_app(net.clients[0], echo_client(SERVER_ADDR))
        .unwrap();
    net.sim.enable_flow_monitor();
    net.sim.build_routes();
    let summary = net.sim.run(SimTime::from_secs(5)).unwrap();

    let flows = net.sim.flow_records();
    assert_eq!(flows.len(), 1);
    assert!(flows[0].tx_packets > 0);
    assert_eq!(flows[0].lost_packets, flows[0].tx_packets);
    assert_eq!(summary.packets_dropped, flows[0].tx_packets);
}

#[test]
fn udp_without_listener_is_received_but_not_answered() {
    let mut net = build(1, 1);
    net.sim
        .install_app(net.server, AppConfig::TcpSink { port: 9 })
        .unwrap();
    net.sim
        .install_app(net.clients[0], echo_client(SERVER_ADDR))
        .unwrap();
    net.sim.enable_flow_monitor();
    net.sim.build_routes();
    net.sim.run(SimTime::from_secs(3)).unwrap();

    let flows = net.sim.flow_records();
    assert_eq!(flows.len(), 1);
    assert!(flows[0].rx_packets > 0);
    assert_eq!(flows[0].lost_packets, 0);
}

#[test]
fn tcp_bulk_transfer_makes_progress() {
    let mut net = build(1, 2);
    let sink = net
        .sim
        .install_app(net.server, AppConfig::TcpSink { port: 9 })
        .unwrap();
    window(&mut net.sim, sink, 1, 10);
    let mut senders = Vec::new();
    for &client in &net.clients {
        let app = net
            .sim
            .install_app(
                client,
                AppConfig::TcpBulkSender {
                    remote: SocketAddrV4::new(SERVER_ADDR, 9),
                    max_bytes: 0,
                    segment_size: 536,
                },
            )
            .unwrap();
        window(&mut net.sim, app, 2, 10);
        senders.push(app);
    }
    net.sim.enable_flow_monitor();
    net.sim.build_routes();
    net.sim.run(SimTime::from_secs(10)).unwrap();

    for app in senders {
        assert!(net.sim.app_counters(app).unwrap().bytes_acked > 100_000);
    }
    let flows = net.sim.flow_records();
    // one data flow and one ack flow per client
    assert_eq!(flows.len(), 4);
    assert!(flows.iter().all(|f| f.key.protocol == Transport::Tcp));
    let data: Vec<_> = flows
        .iter()
        .filter(|f| f.key.destination.port() == 9)
        .collect();
    assert_eq!(data.len(), 2);
    assert!(data.iter().all(|f| f.tx_bytes > f.tx_packets * 40));
}

#[test]
fn same_seed_replays_identically() {
    let run = |seed| {
        let mut net = build(seed, 4);
        for &client in &net.clients {
            net.sim.set_mobility(client, random_walk()).unwrap();
        }
        let server = net
            .sim
            .install_app(net.server, AppConfig::UdpEchoServer { port: 9 })
            .unwrap();
        window(&mut net.sim, server, 1, 10);
        for &client in &net.clients {
            let app = net
                .sim
                .install_app(client, echo_client(SERVER_ADDR))
                .unwrap();
            window(&mut net.sim, app, 2, 10);
        }
        net.sim.enable_flow_monitor();
        net.sim.build_routes();
        net.sim.run(SimTime::from_secs(10)).unwrap();
        let positions: Vec<Position> = net
            .clients
            .iter()
            .map(|&c| net.sim.position(c).unwrap())
            .collect();
        (net.sim.flow_records().to_vec(), positions)
    };

    let (flows_a, pos_a) = run(42);
    let (flows_b, pos_b) = run(42);
    assert_eq!(flows_a, flows_b);
    assert_eq!(pos_a, pos_b);

    let (_, pos_c) = run(43);
    assert_ne!(pos_a, pos_c);
}

#[test]
fn walkers_stay_inside_bounds() {
    let mut net = build(9, 3);
    for &client in &net.clients {
        net.sim.set_mobility(client, random_walk()).unwrap();
    }
    net.sim.build_routes();
    for step in 1..=20 {
        net.sim.run(SimTime::from_millis(step * 500)).unwrap();
        for &client in &net.clients {
            let p = net.sim.position(client).unwrap();
            assert!((-50.0..=50.0).contains(&p.x), "x out of bounds: {p:?}");
            assert!((-50.0..=50.0).contains(&p.y), "y out of bounds: {p:?}");
        }
    }
    assert_eq!(net.sim.position(net.server).unwrap(), Position::default());
}

#[test]
fn configuration_errors() {
    let mut net = build(1, 1);
    assert_eq!(
        net.sim.run(SimTime::from_secs(1)),
        Err(SimError::RoutesNotBuilt)
    );

    net.sim
        .install_app(net.server, AppConfig::UdpEchoServer { port: 9 })
        .unwrap();
    assert_eq!(
        net.sim
            .install_app(net.server, AppConfig::UdpEchoServer { port: 9 }),
        Err(SimError::DuplicateEndpoint { node: 0, port: 9 })
    );
    // same port on another transport is fine
    assert!(net
        .sim
        .install_app(net.server, AppConfig::TcpSink { port: 9 })
        .is_ok());

    let extra = net.sim.add_node("extra");
    let (dev, _) = net
        .sim
        .connect_point_to_point(extra, net.server, &PointToPointConfig::default())
        .unwrap();
    assert_eq!(
        net.sim.assign_address(dev, SERVER_ADDR, 24),
        Err(SimError::AddressConflict(SERVER_ADDR))
    );
    assert_eq!(
        net.sim.set_mobility(NodeId(99), MobilityModel::default()),
        Err(SimError::UnknownNode(99))
    );
}
