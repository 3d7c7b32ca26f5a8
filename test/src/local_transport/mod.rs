//! In-memory transport for end-to-end tests.
//! Routes datagrams between a hub and its spokes without network I/O.

mod conditioner;

use std::{
    collections::{HashMap, VecDeque},
    net::SocketAddr,
    sync::{Arc, Mutex, MutexGuard},
};

use log::debug;

use radome_shared::{
    Connection, ConnectionState, Connector, Listener, TransportError, TransportEvent,
};

pub use conditioner::{LinkConditioner, LinkConditionerConfig};

pub(crate) enum Item {
    Connect,
    Disconnect,
    Data(Vec<u8>),
}

#[derive(Default)]
struct Pipe {
    to_client: VecDeque<Item>,
    to_hub: VecDeque<Item>,
    severed: bool,
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum Side {
    Client,
    Hub,
}

impl Pipe {
    fn inbox(&mut self, side: Side) -> &mut VecDeque<Item> {
        match side {
            Side::Client => &mut self.to_client,
            Side::Hub => &mut self.to_hub,
        }
    }

    fn outbox(&mut self, side: Side) -> &mut VecDeque<Item> {
        match side {
            Side::Client => &mut self.to_hub,
            Side::Hub => &mut self.to_client,
        }
    }

    fn sever(&mut self) {
        if self.severed {
            return;
        }
        self.severed = true;
        self.to_client.push_back(Item::Disconnect);
        self.to_hub.push_back(Item::Disconnect);
    }
}

struct PipeRecord {
    client_addr: SocketAddr,
    pipe: Arc<Mutex<Pipe>>,
}

#[derive(Default)]
struct Shared {
    pending: HashMap<SocketAddr, VecDeque<LocalConnection>>,
    pipes: Vec<PipeRecord>,
}

/// A switchboard connecting `LocalListener`s and `LocalConnector`s created
/// from the same network.
#[derive(Clone)]
pub struct LocalNetwork {
    shared: Arc<Mutex<Shared>>,
    conditioner: Arc<Mutex<LinkConditioner>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl LocalNetwork {
    pub fn new() -> Self {
        Self::with_conditioner(LinkConditionerConfig::perfect(), 0)
    }

    pub fn with_conditioner(config: LinkConditionerConfig, seed: u64) -> Self {
        Self {
            shared: Arc::default(),
            conditioner: Arc::new(Mutex::new(LinkConditioner::new(config, seed))),
        }
    }

    pub fn set_conditioner(&self, config: LinkConditionerConfig) {
        lock(&self.conditioner).set_config(config);
    }

    pub fn listener(&self) -> LocalListener {
        LocalListener {
            network: self.clone(),
            addr: None,
        }
    }

    /// A connector whose connections always originate from `local_addr`
    pub fn connector(&self, local_addr: SocketAddr) -> LocalConnector {
        LocalConnector {
            network: self.clone(),
            local_addr,
        }
    }

    /// Drops every live connection from `client_addr`. Both ends observe a
    /// disconnect.
    pub fn sever(&self, client_addr: SocketAddr) {
        let shared = lock(&self.shared);
        for record in shared.pipes.iter().filter(|r| r.client_addr == client_addr) {
            lock(&record.pipe).sever();
        }
    }
}

impl Default for LocalNetwork {
    fn default() -> Self {
        Self::new()
    }
}

/// One end of an in-memory connection
pub struct LocalConnection {
    pipe: Arc<Mutex<Pipe>>,
    side: Side,
    conditioner: Arc<Mutex<LinkConditioner>>,
    state: ConnectionState,
    remote_addr: SocketAddr,
    current: Vec<u8>,
}

impl Connection for LocalConnection {
    fn send(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        if self.state == ConnectionState::Disconnected {
            return Err(TransportError::SendFailed {
                addr: self.remote_addr,
                len: payload.len(),
            });
        }
        let mut pipe = lock(&self.pipe);
        if pipe.severed {
            // lost on the wire
            return Ok(());
        }
        lock(&self.conditioner).deliver(pipe.outbox(self.side), payload);
        Ok(())
    }

    fn poll_event(&mut self) -> Option<TransportEvent<'_>> {
        let item = lock(&self.pipe).inbox(self.side).pop_front()?;
        match item {
            Item::Connect => {
                self.state = ConnectionState::Connected;
                Some(TransportEvent::Connect)
            }
            Item::Disconnect => {
                self.state = ConnectionState::Disconnected;
                Some(TransportEvent::Disconnect)
            }
            Item::Data(bytes) => {
                self.current = bytes;
                Some(TransportEvent::Data(&self.current))
            }
        }
    }

    fn state(&self) -> ConnectionState {
        self.state
    }

    fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }

    fn disconnect(&mut self) {
        self.state = ConnectionState::Disconnected;
        let mut pipe = lock(&self.pipe);
        if !pipe.severed {
            pipe.severed = true;
            pipe.outbox(self.side).push_back(Item::Disconnect);
        }
    }
}

pub struct LocalListener {
    network: LocalNetwork,
    addr: Option<SocketAddr>,
}

impl Listener for LocalListener {
    fn listen(&mut self, addr: SocketAddr) -> Result<(), TransportError> {
        let mut shared = lock(&self.network.shared);
        if shared.pending.contains_key(&addr) {
            return Err(TransportError::ListenFailed { addr });
        }
        shared.pending.insert(addr, VecDeque::new());
        self.addr = Some(addr);
        Ok(())
    }

    fn accept(&mut self) -> Option<Box<dyn Connection>> {
        let addr = self.addr?;
        let connection = lock(&self.network.shared).pending.get_mut(&addr)?.pop_front()?;
        lock(&connection.pipe).to_client.push_back(Item::Connect);
        Some(Box::new(connection))
    }

    fn close(&mut self) {
        if let Some(addr) = self.addr.take() {
            lock(&self.network.shared).pending.remove(&addr);
            debug!("local listener on {} closed", addr);
        }
    }
}

pub struct LocalConnector {
    network: LocalNetwork,
    local_addr: SocketAddr,
}

impl Connector for LocalConnector {
    fn connect(&mut self, addr: SocketAddr) -> Result<Box<dyn Connection>, TransportError> {
        let mut shared = lock(&self.network.shared);
        let Some(pending) = shared.pending.get_mut(&addr) else {
            return Err(TransportError::ConnectFailed { addr });
        };

        let pipe = Arc::new(Mutex::new(Pipe::default()));
        pending.push_back(LocalConnection {
            pipe: pipe.clone(),
            side: Side::Hub,
            conditioner: self.network.conditioner.clone(),
            state: ConnectionState::Connected,
            remote_addr: self.local_addr,
            current: Vec::new(),
        });
        shared.pipes.push(PipeRecord {
            client_addr: self.local_addr,
            pipe: pipe.clone(),
        });

        Ok(Box::new(LocalConnection {
            pipe,
            side: Side::Client,
            conditioner: self.network.conditioner.clone(),
            state: ConnectionState::Connecting,
            remote_addr: addr,
            current: Vec::new(),
        }))
    }
}
