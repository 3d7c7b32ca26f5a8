/// Packet routing through the hub: broadcast relay, unicast relay and packets
/// addressed to the hub itself.
use radome_server::HubConfig;
use radome_shared::{
    NetworkManager, NetworkState, PacketEvent, Qos, ReceivedPacket, Scheduler, SendError,
    BROADCAST_PLAYER_ID, HUB_PLAYER_ID,
};
use radome_test::{drain, LocalNetwork, TestSession, TickEvents};

const CHAT: u8 = 7;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn three_peers() -> TestSession {
    let mut session = TestSession::new(LocalNetwork::new(), HubConfig::default());
    session.join_spokes(2);
    session
}

fn packet(sender: u16, body: &[u8]) -> ReceivedPacket {
    ReceivedPacket {
        sender,
        kind: CHAT,
        body: body.into(),
    }
}

fn run(session: &mut TestSession, ticks: usize) -> Vec<TickEvents> {
    (0..ticks).map(|_| session.tick()).collect()
}

#[test]
fn broadcast_reaches_other_spoke_with_sender_id() {
    init_logger();
    let mut session = three_peers();

    session.spokes[0]
        .broadcast(CHAT, b"hello", Qos::Reliable, false)
        .unwrap();
    let mut history = run(&mut session, 6);

    let mut receiver = TickEvents::spoke(&mut history, 1);
    assert_eq!(drain::<PacketEvent>(&mut receiver), vec![packet(1, b"hello")]);

    // the sender does not hear its own broadcast
    let mut sender = TickEvents::spoke(&mut history, 0);
    assert!(drain::<PacketEvent>(&mut sender).is_empty());
}

#[test]
fn unicast_between_spokes_is_relayed_only() {
    init_logger();
    let mut session = three_peers();

    session.spokes[0]
        .send(2, CHAT, b"psst", Qos::Reliable, false)
        .unwrap();
    let mut history = run(&mut session, 6);

    let mut receiver = TickEvents::spoke(&mut history, 1);
    assert_eq!(drain::<PacketEvent>(&mut receiver), vec![packet(1, b"psst")]);
    let mut hub = TickEvents::hub(&mut history);
    assert!(drain::<PacketEvent>(&mut hub).is_empty());
}

#[test]
fn packets_for_the_hub_are_not_relayed() {
    init_logger();
    let mut session = three_peers();

    session.spokes[1]
        .send(HUB_PLAYER_ID, CHAT, b"ping", Qos::Unreliable, false)
        .unwrap();
    let mut history = run(&mut session, 6);

    let mut hub = TickEvents::hub(&mut history);
    assert_eq!(drain::<PacketEvent>(&mut hub), vec![packet(2, b"ping")]);
    let mut other = TickEvents::spoke(&mut history, 0);
    assert!(drain::<PacketEvent>(&mut other).is_empty());
}

#[test]
fn hub_sends_to_one_spoke() {
    init_logger();
    let mut session = three_peers();

    session
        .hub
        .send(2, CHAT, b"direct", Qos::Reliable, true)
        .unwrap();
    let mut history = run(&mut session, 6);

    let mut target = TickEvents::spoke(&mut history, 1);
    assert_eq!(drain::<PacketEvent>(&mut target), vec![packet(0, b"direct")]);
    let mut other = TickEvents::spoke(&mut history, 0);
    assert!(drain::<PacketEvent>(&mut other).is_empty());
}

#[test]
fn hub_broadcast_reaches_every_spoke() {
    init_logger();
    let mut session = three_peers();

    session
        .hub
        .send(BROADCAST_PLAYER_ID, CHAT, b"all", Qos::Reliable, false)
        .unwrap();
    let mut history = run(&mut session, 6);

    for index in 0..2 {
        let mut events = TickEvents::spoke(&mut history, index);
        assert_eq!(drain::<PacketEvent>(&mut events), vec![packet(0, b"all")]);
    }
}

#[test]
fn reliable_packets_keep_send_order() {
    init_logger();
    let mut session = three_peers();

    for tag in 0..20u8 {
        session.spokes[0]
            .send(2, CHAT, &[tag], Qos::Reliable, tag % 3 == 0)
            .unwrap();
        if tag % 5 == 0 {
            session.tick();
        }
    }
    let mut history = run(&mut session, 8);

    let mut receiver = TickEvents::spoke(&mut history, 1);
    let tags: Vec<u8> = drain::<PacketEvent>(&mut receiver)
        .into_iter()
        .map(|packet| packet.body[0])
        .collect();
    // ticks taken while sending may already have delivered the first tags
    assert!(tags.windows(2).all(|pair| pair[0] < pair[1]));
    assert_eq!(tags.last(), Some(&19));
}

#[test]
fn reserved_and_unknown_targets_are_rejected() {
    init_logger();
    let mut session = three_peers();

    assert_eq!(
        session.spokes[0].send(2, 200, b"", Qos::Reliable, false),
        Err(SendError::ReservedKind(200))
    );
    assert_eq!(
        session.hub.send(9, CHAT, b"", Qos::Reliable, false),
        Err(SendError::UnknownTarget(9))
    );
    assert_eq!(
        session.hub.send(HUB_PLAYER_ID, CHAT, b"", Qos::Reliable, false),
        Err(SendError::UnknownTarget(HUB_PLAYER_ID))
    );
}

#[test]
fn threaded_session_joins_and_relays() {
    init_logger();
    let mut session =
        TestSession::with_scheduler(LocalNetwork::new(), HubConfig::default(), Scheduler::Threaded);
    session.join_spokes(2);
    assert_eq!(session.hub.player_count(), 3);
    assert!(session
        .spokes
        .iter()
        .all(|spoke| spoke.state() == NetworkState::Online));

    session.spokes[0]
        .broadcast(CHAT, b"hi", Qos::Reliable, false)
        .unwrap();
    // worker timing decides which tick a datagram is polled in
    let mut history = run(&mut session, 20);

    let mut receiver = TickEvents::spoke(&mut history, 1);
    assert_eq!(drain::<PacketEvent>(&mut receiver), vec![packet(1, b"hi")]);
    let mut hub = TickEvents::hub(&mut history);
    assert_eq!(drain::<PacketEvent>(&mut hub), vec![packet(1, b"hi")]);
}
