/// Join handshake between a hub and its spokes, end to end over the local
/// transport.
use radome_client::{Spoke, SpokeConfig};
use radome_server::{Hub, HubConfig};
use radome_shared::{
    from_body, to_body, BuiltInPacket, Connector, Envelope, Events, Link, LinkConfig, Listener,
    NetworkManager, NetworkState, PlayerNotice, Qos, RegisterPlayer, RegisterPlayerEvent,
    Scheduler, UnregisterPlayerEvent, BROADCAST_PLAYER_ID, HUB_PLAYER_ID,
};
use radome_test::{
    assert_player_count, assert_state, drain, hub_addr, spoke_addr, LocalNetwork, TestSession,
    TickEvents,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn first_spoke_receives_join_packet() {
    init_logger();

    let network = LocalNetwork::new();
    let config = HubConfig {
        scheduler: Scheduler::Inline,
        ..Default::default()
    };
    let mut hub = Hub::new(config, Box::new(network.listener()));
    hub.start(hub_addr()).unwrap();

    // a bare link stands in for the spoke so the raw join packet is visible
    let mut connector = network.connector(spoke_addr(0));
    let connection = connector.connect(hub_addr()).unwrap();
    let mut link = Link::new(connection, LinkConfig::default());

    let mut events = hub.receive();
    assert_eq!(events.read::<RegisterPlayerEvent>().collect::<Vec<_>>(), vec![1]);
    hub.send_all_packets();

    link.begin_receive(&Scheduler::Inline);
    link.complete_receive();
    assert!(link.is_connected());

    let received = link.take_received();
    let join = received
        .iter()
        .flat_map(|datagram| datagram.chunks().collect::<Vec<_>>())
        .filter_map(|entry| Envelope::read(entry).ok())
        .find(|envelope| envelope.kind == BuiltInPacket::RegisterPlayer.to_u8())
        .map(|envelope| from_body::<RegisterPlayer>(envelope.body).unwrap())
        .expect("no join packet");

    assert_eq!(
        join,
        RegisterPlayer {
            assigned_id: 1,
            epoch_millis: hub.leader_start_time(),
            sync_seq: 0,
            active_ids: vec![0b0000_0001],
        }
    );
    assert_eq!(hub.player_count(), 2);
}

#[test]
fn spoke_goes_online_after_join() {
    init_logger();

    let mut session = TestSession::new(LocalNetwork::new(), HubConfig::default());
    let mut history = session.join_spokes(1);

    let spoke = &session.spokes[0];
    assert_state!(*spoke, NetworkState::Online);
    assert_state!(session.hub, NetworkState::Online);
    assert_eq!(spoke.player_id(), 1);
    assert!(!spoke.is_leader());
    assert_eq!(spoke.leader_start_time(), session.hub.leader_start_time());
    assert!(spoke.is_active_player(0));
    assert!(spoke.is_active_player(1));
    assert_player_count!(*spoke, 2);
    assert_player_count!(session.hub, 2);

    let mut hub_events = TickEvents::hub(&mut history);
    assert_eq!(drain::<RegisterPlayerEvent>(&mut hub_events), vec![1]);
}

#[test]
fn later_spokes_are_announced_to_earlier_ones() {
    init_logger();

    let mut session = TestSession::new(LocalNetwork::new(), HubConfig::default());
    session.join_spokes(1);
    let mut history = session.join_spokes(2);

    let ids: Vec<u16> = session.spokes.iter().map(|spoke| spoke.player_id()).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    for spoke in &session.spokes {
        assert_player_count!(*spoke, 4);
    }

    let mut first = TickEvents::spoke(&mut history, 0);
    assert_eq!(drain::<RegisterPlayerEvent>(&mut first), vec![2, 3]);
    let mut last = TickEvents::spoke(&mut history, 2);
    assert!(drain::<RegisterPlayerEvent>(&mut last).is_empty());
}

#[test]
fn hub_start_twice_fails() {
    init_logger();

    let network = LocalNetwork::new();
    let mut hub = Hub::new(HubConfig::default(), Box::new(network.listener()));
    hub.start(hub_addr()).unwrap();
    assert!(hub.start(hub_addr()).is_err());
}

#[test]
fn spoke_without_hub_fails_to_start() {
    init_logger();

    let network = LocalNetwork::new();
    let mut spoke = radome_client::Spoke::new(
        Default::default(),
        Box::new(network.connector(spoke_addr(0))),
    );
    assert!(spoke.start(hub_addr()).is_err());
    assert_state!(spoke, NetworkState::Offline);
}

fn notice(kind: BuiltInPacket, id: u16) -> Vec<u8> {
    Envelope::new(
        BROADCAST_PLAYER_ID,
        HUB_PLAYER_ID,
        kind.to_u8(),
        &to_body(&PlayerNotice { id }),
    )
    .to_bytes()
}

#[test]
fn notices_ahead_of_the_join_packet_are_replayed_in_order() {
    init_logger();

    let network = LocalNetwork::new();
    let mut listener = network.listener();
    listener.listen(hub_addr()).unwrap();

    let config = SpokeConfig {
        scheduler: Scheduler::Inline,
        ..Default::default()
    };
    let mut spoke = Spoke::new(config, Box::new(network.connector(spoke_addr(0))));
    spoke.start(hub_addr()).unwrap();

    // a bare link stands in for the hub so the notices can go out first
    let connection = listener.accept().expect("spoke did not connect");
    let mut hub = Link::new(connection, LinkConfig::default());
    for envelope in [
        notice(BuiltInPacket::NotifyAddPlayer, 3),
        notice(BuiltInPacket::NotifyRemovePlayer, 2),
        notice(BuiltInPacket::NotifyAddPlayer, 2),
    ] {
        hub.send(&envelope, Qos::Reliable, false).unwrap();
    }
    let join = RegisterPlayer {
        assigned_id: 1,
        epoch_millis: 1234,
        sync_seq: 0,
        active_ids: vec![0b0000_0101],
    };
    let join = Envelope::new(
        1,
        HUB_PLAYER_ID,
        BuiltInPacket::RegisterPlayer.to_u8(),
        &to_body(&join),
    )
    .to_bytes();
    hub.send(&join, Qos::Reliable, false).unwrap();
    hub.send_reliable_chunks();

    let mut history: Vec<Events> = Vec::new();
    for _ in 0..3 {
        history.push(spoke.receive());
        spoke.send_all_packets();
    }

    assert_state!(spoke, NetworkState::Online);
    assert_eq!(spoke.player_id(), 1);
    assert_eq!(spoke.leader_start_time(), 1234);
    assert_player_count!(spoke, 4);
    for id in 0..4 {
        assert!(spoke.is_active_player(id), "player {}", id);
    }
    assert_eq!(drain::<RegisterPlayerEvent>(&mut history), vec![3, 2]);
    assert_eq!(drain::<UnregisterPlayerEvent>(&mut history), vec![2]);
}
