mod common;
use common::*;
use shared::tracker::HeartbeatTracker;
use shared::transport::{CommandSender, HeartbeatListener};

const NODE_5: MacAddr = MacAddr::new([0xB0, 0x7F, 0x8D, 0x77, 0x1E, 0x84]);

#[tokio::test]
async fn reset_broadcast() {
    let node = NodeDummy::run(NODE_5).await;

    ctl::run(&config(
        Topology::TwentyOne,
        &node,
        Command::Reset(TargetArgs::default()),
    ))
    .await
    .unwrap();

    let (buf, cmd) = node.recv().await;
    assert_eq!(
        buf,
        [
            0xCE, 0xFA, 0xAD, 0xDE, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00
        ]
    );
    assert!(cmd.addresses(&node.mac));
}

#[tokio::test]
async fn led_by_node_index() {
    let node = NodeDummy::run(NODE_5).await;
    let other = MacAddr::new([0xB0, 0xE6, 0xF3, 0x05, 0x8B, 0xEB]);

    ctl::run(&config(
        Topology::TwentyOne,
        &node,
        Command::Led {
            state: LedState::On,
            target: TargetArgs {
                node: Some(5),
                mac: None,
            },
        },
    ))
    .await
    .unwrap();

    let (buf, cmd) = node.recv().await;
    assert_eq!(19, buf.len());
    assert_eq!(&buf[13..19], &[0x84, 0x1E, 0x77, 0x8D, 0x7F, 0xB0]);
    assert!(matches!(cmd, ControlCommand::LedSet(LedSet { on: true, .. })));
    assert!(cmd.addresses(&node.mac));
    assert!(!cmd.addresses(&other));
}

#[tokio::test]
async fn dfu_by_mac() {
    let node = NodeDummy::run(NODE_5).await;

    ctl::run(&config(
        Topology::Seven,
        &node,
        Command::Dfu(TargetArgs {
            node: None,
            mac: Some(NODE_5),
        }),
    ))
    .await
    .unwrap();

    let (_, cmd) = node.recv().await;
    assert_eq!(Opcode::DfuTrigger, cmd.opcode());
    assert_eq!(Target::Unicast(NODE_5), cmd.target());
}

#[tokio::test]
async fn unknown_node_index_fails() {
    let node = NodeDummy::run(NODE_5).await;

    let res = ctl::run(&config(
        Topology::Seven,
        &node,
        Command::Reset(TargetArgs {
            node: Some(21),
            mac: None,
        }),
    ))
    .await;

    assert!(res.is_err());
}

#[tokio::test]
async fn dfu_sequential_addresses_every_node() {
    let node = NodeDummy::run(NODE_5).await;
    let book = AddressBook::for_topology(Topology::Seven);
    let sender = CommandSender::with_dest(node.addr()).await.unwrap();

    ctl::dfu_sequential(&sender, &book, Duration::from_millis(1))
        .await
        .unwrap();

    for e in book.entries() {
        let (_, cmd) = node.recv().await;
        assert_eq!(Opcode::DfuTrigger, cmd.opcode());
        assert_eq!(Target::Unicast(e.mac), cmd.target());
    }
}

#[tokio::test]
async fn dfu_sequential_stops_at_first_failure() {
    let book = AddressBook::for_topology(Topology::Seven);
    // Port 0 is not a valid destination, every send fails
    let sender = CommandSender::with_dest((std::net::Ipv4Addr::LOCALHOST, 0).into())
        .await
        .unwrap();

    // Would take a minute if the remaining nodes were still processed
    let err = tokio::time::timeout(
        Duration::from_secs(1),
        ctl::dfu_sequential(&sender, &book, Duration::from_secs(10)),
    )
    .await
    .expect("dfu-sequential did not stop after the failed send")
    .unwrap_err();

    assert!(
        format!("{err:#}")
            .starts_with("Triggering firmware update on node 0 (B0:25:EE:73:EF:F4) failed:")
    );
}

#[tokio::test]
async fn blink_alternates() {
    let node = NodeDummy::run(NODE_5).await;
    let cfg = config(
        Topology::TwentyOne,
        &node,
        Command::Blink {
            target: TargetArgs::default(),
            interval: Some(Duration::from_millis(10)),
        },
    );

    let received = tokio::select! {
        res = ctl::run(&cfg) => panic!("Blinking stopped: {res:?}"),
        received = async {
            let mut states = vec![];
            for _ in 0..4 {
                if let (_, ControlCommand::LedSet(m)) = node.recv().await {
                    assert!(m.is_broadcast);
                    states.push(m.on);
                }
            }
            states
        } => received,
    };

    assert_eq!(vec![true, false, true, false], received);
}

#[tokio::test]
async fn listen_tracks_heartbeats() {
    let node = NodeDummy::run(NODE_5).await;
    let reported = MacAddr::new([0x00, 0x08, 0xDC, 0x00, 0x00, 0x05]);

    let mut listener = HeartbeatListener::bind(
        (std::net::Ipv4Addr::LOCALHOST, 0).into(),
        HeartbeatTracker::new(AddressBook::for_topology(Topology::TwentyOne)),
    )
    .await
    .unwrap();
    let addr = listener.local_addr().unwrap();

    for version in [3, 5, 2, 7] {
        node.send_heartbeat(addr, reported, version).await;
    }

    let mut sightings = vec![];
    for _ in 0..4 {
        if let Some(s) = listener.recv_next().await.unwrap() {
            sightings.push(s);
        }
    }

    assert_eq!(
        vec![3, 5, 7],
        sightings.iter().map(|s| s.version).collect::<Vec<_>>()
    );
    assert!(sightings.iter().all(|s| s.node == Some(5)));
    assert_eq!(vec![5], sightings[2].seen);
    assert_eq!(3, listener.tracker().event_count());
    assert_eq!(Some(7), listener.tracker().version_of(&reported));
}
