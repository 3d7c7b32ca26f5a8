use std::{mem, net::SocketAddr};

use radome_client::{Spoke, SpokeConfig};
use radome_server::{Hub, HubConfig};
use radome_shared::{Events, NetworkEvent, NetworkManager, NetworkState, Scheduler};

use crate::local_transport::LocalNetwork;

pub fn hub_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 7000))
}

/// Each spoke gets a stable address, so a reconnect is recognised by the hub
pub fn spoke_addr(index: usize) -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 7001 + index as u16))
}

/// Events surfaced by one tick of every node
pub struct TickEvents {
    pub hub: Events,
    pub spokes: Vec<Events>,
}

impl TickEvents {
    /// Moves the hub's events out of every tick in `history`
    pub fn hub(history: &mut [TickEvents]) -> Vec<Events> {
        history.iter_mut().map(|tick| mem::take(&mut tick.hub)).collect()
    }

    /// Moves one spoke's events out of every tick in `history`. Ticks from
    /// before the spoke existed are skipped.
    pub fn spoke(history: &mut [TickEvents], index: usize) -> Vec<Events> {
        history
            .iter_mut()
            .filter_map(|tick| tick.spokes.get_mut(index).map(mem::take))
            .collect()
    }
}

/// Reads every event of type `V` out of `events`, in order
pub fn drain<V>(events: &mut [Events]) -> Vec<<V::Iter as Iterator>::Item>
where
    V: NetworkEvent,
    V::Iter: Iterator,
{
    events.iter_mut().flat_map(|events| events.read::<V>()).collect()
}

/// A hub and its spokes wired together over a `LocalNetwork`. Unless built
/// `with_scheduler`, every node runs its receive jobs inline so ticks are
/// deterministic.
pub struct TestSession {
    pub network: LocalNetwork,
    pub hub: Hub,
    pub spokes: Vec<Spoke>,
    addrs: Vec<SocketAddr>,
    next_addr: usize,
    scheduler: Scheduler,
}

impl TestSession {
    pub fn new(network: LocalNetwork, hub_config: HubConfig) -> Self {
        Self::with_scheduler(network, hub_config, Scheduler::Inline)
    }

    /// A session whose hub and spokes all schedule link jobs on `scheduler`
    pub fn with_scheduler(
        network: LocalNetwork,
        hub_config: HubConfig,
        scheduler: Scheduler,
    ) -> Self {
        let hub_config = HubConfig {
            scheduler,
            ..hub_config
        };
        let mut hub = Hub::new(hub_config, Box::new(network.listener()));
        hub.start(hub_addr()).expect("hub failed to start");
        Self {
            network,
            hub,
            spokes: Vec::new(),
            addrs: Vec::new(),
            next_addr: 0,
            scheduler,
        }
    }

    /// Starts a new spoke from a fresh address and returns its index in
    /// `spokes`
    pub fn add_spoke(&mut self) -> usize {
        let index = self.spokes.len();
        let addr = spoke_addr(self.next_addr);
        self.next_addr += 1;
        let config = SpokeConfig {
            scheduler: self.scheduler,
            ..Default::default()
        };
        let mut spoke = Spoke::new(config, Box::new(self.network.connector(addr)));
        spoke.start(hub_addr()).expect("spoke failed to start");
        self.spokes.push(spoke);
        self.addrs.push(addr);
        index
    }

    /// Receives on every node, then flushes every node.
    pub fn tick(&mut self) -> TickEvents {
        let hub = self.hub.receive();
        let spokes = self.spokes.iter_mut().map(|spoke| spoke.receive()).collect();

        self.hub.send_all_packets();
        for spoke in self.spokes.iter_mut() {
            spoke.send_all_packets();
        }
        TickEvents { hub, spokes }
    }

    /// Ticks until `done` holds, up to `max_ticks`. Returns every tick's
    /// events and whether `done` was reached.
    pub fn tick_until(
        &mut self,
        max_ticks: usize,
        mut done: impl FnMut(&TestSession) -> bool,
    ) -> (Vec<TickEvents>, bool) {
        let mut history = Vec::new();
        for _ in 0..max_ticks {
            if done(self) {
                return (history, true);
            }
            history.push(self.tick());
        }
        let reached = done(self);
        (history, reached)
    }

    /// The address the spoke at `index` connects from
    pub fn addr_of(&self, index: usize) -> SocketAddr {
        self.addrs[index]
    }

    /// Takes a spoke out of the session. It is no longer ticked.
    pub fn remove_spoke(&mut self, index: usize) -> Spoke {
        self.addrs.remove(index);
        self.spokes.remove(index)
    }

    /// Puts a spoke taken out with `remove_spoke` back at the end of
    /// `spokes` and returns its new index.
    pub fn restore_spoke(&mut self, spoke: Spoke, addr: SocketAddr) -> usize {
        self.spokes.push(spoke);
        self.addrs.push(addr);
        self.spokes.len() - 1
    }

    pub fn all_online(&self) -> bool {
        self.hub.state() == NetworkState::Online
            && self
                .spokes
                .iter()
                .all(|spoke| spoke.state() == NetworkState::Online)
    }

    /// Adds `count` spokes and ticks until all of them have joined.
    pub fn join_spokes(&mut self, count: usize) -> Vec<TickEvents> {
        for _ in 0..count {
            self.add_spoke();
        }
        let expected = self.spokes.len() as u16 + 1;
        let (history, joined) = self.tick_until(50, |session| {
            session.all_online()
                && session.hub.player_count() == expected
                && session
                    .spokes
                    .iter()
                    .all(|spoke| spoke.player_count() == expected)
        });
        assert!(joined, "spokes did not join within 50 ticks");
        history
    }
}
