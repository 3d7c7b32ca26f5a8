use std::{mem, net::SocketAddr};

use log::warn;

use crate::{
    link::{
        chunk_buffer::ChunkBuffer, error::LinkError, latency::LatencyRing,
        link_config::LinkConfig, receiver::Receiver, unacked::UnackedList,
    },
    protocol::{
        datagram::{encode_latency_probe, encode_single, Datagram},
        header::QosHeader,
        qos::{Qos, QosType},
    },
    scheduler::{JobHandle, Scheduler},
    sequence::{wrapping_diff, SeqNum},
    transport::{Connection, ConnectionState},
    backends::Timestamp,
};

/// The half of a link that performs I/O. It moves into the receive job and
/// comes back when the job is joined.
pub struct LinkIo {
    connection: Option<Box<dyn Connection>>,
    receiver: Receiver,
}

impl LinkIo {
    fn transmit(&mut self, datagram: &[u8]) {
        let Some(connection) = self.connection.as_mut() else {
            return;
        };
        if connection.state() != ConnectionState::Connected {
            return;
        }
        if let Err(err) = connection.send(datagram) {
            warn!("{}", err);
        }
    }

    fn run(mut self, outgoing: Vec<Box<[u8]>>) -> Self {
        for datagram in &outgoing {
            self.transmit(datagram);
        }
        if let Some(connection) = self.connection.as_mut() {
            self.receiver.receive_all(connection.as_mut());
        }
        self
    }
}

enum IoSlot {
    Home(LinkIo),
    Away(JobHandle<LinkIo>),
    Vacant,
}

impl IoSlot {
    /// Joins an in-flight job if there is one.
    fn home_mut(&mut self) -> &mut LinkIo {
        if let IoSlot::Away(_) = self {
            if let IoSlot::Away(job) = mem::replace(self, IoSlot::Vacant) {
                *self = IoSlot::Home(job.join());
            }
        }
        match self {
            IoSlot::Home(io) => io,
            _ => unreachable!("link I/O was lost to a panicked receive job"),
        }
    }
}

/// Reliability state of one connection: sequencing, chunk packing,
/// retransmission and latency sampling.
pub struct Link {
    config: LinkConfig,
    remote_addr: SocketAddr,
    self_seq: SeqNum,
    self_ack: SeqNum,
    other_seq: SeqNum,
    other_ack: SeqNum,
    latency: LatencyRing,
    connected: bool,
    disconnected: bool,
    attached: bool,
    reliable_chunks: ChunkBuffer,
    unreliable_chunks: ChunkBuffer,
    unacked: UnackedList,
    received: Vec<Datagram>,
    io: IoSlot,
    deferred: Vec<Box<[u8]>>,
}

impl Link {
    pub fn new(connection: Box<dyn Connection>, config: LinkConfig) -> Self {
        let remote_addr = connection.remote_addr();
        let receiver = Receiver::new(config.reorder_capacity);
        Self {
            config,
            remote_addr,
            self_seq: 0,
            self_ack: 0,
            other_seq: 0,
            other_ack: 0,
            latency: LatencyRing::new(),
            connected: false,
            disconnected: false,
            attached: true,
            reliable_chunks: ChunkBuffer::new(),
            unreliable_chunks: ChunkBuffer::new(),
            unacked: UnackedList::new(),
            received: Vec::new(),
            io: IoSlot::Home(LinkIo {
                connection: Some(connection),
                receiver,
            }),
            deferred: Vec::new(),
        }
    }

    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }

    pub fn self_seq(&self) -> SeqNum {
        self.self_seq
    }

    pub fn self_ack(&self) -> SeqNum {
        self.self_ack
    }

    pub fn other_seq(&self) -> SeqNum {
        self.other_seq
    }

    pub fn other_ack(&self) -> SeqNum {
        self.other_ack
    }

    /// Mean one-way latency over the last 16 probes, in milliseconds
    pub fn latency(&self) -> u16 {
        self.latency.mean()
    }

    /// True only for the tick in which the transport reported a connect
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// True only for the tick in which the transport reported a disconnect
    pub fn is_disconnected(&self) -> bool {
        self.disconnected
    }

    /// Whether a transport connection is currently bound
    pub fn has_connection(&self) -> bool {
        self.attached
    }

    pub fn unacked_count(&self) -> usize {
        self.unacked.len()
    }

    pub fn is_stalled(&self) -> bool {
        self.unacked.is_stalled()
    }

    /// Queues `payload` for the peer and returns the current `self_seq`.
    ///
    /// Chunked sends wait for the next flush. With `no_chunk` the datagram is
    /// handed to the transport right away, or as soon as a running receive
    /// job hands the connection back.
    pub fn send(&mut self, payload: &[u8], qos: Qos, no_chunk: bool) -> Result<SeqNum, LinkError> {
        if payload.len() > usize::from(u16::MAX) {
            return Err(LinkError::PayloadTooLarge {
                len: payload.len(),
                max: usize::from(u16::MAX),
            });
        }
        let qos_type = QosType::from(qos);

        if no_chunk {
            if qos == Qos::Reliable {
                // earlier chunks hold lower sequence numbers and must enter
                // the unacked list first
                self.queue_reliable_chunks();
                self.self_seq = self.self_seq.wrapping_add(1);
            }
            let datagram = encode_single(
                QosHeader::new(qos_type, self.self_seq, self.self_ack),
                payload,
            );
            self.transmit(&datagram);
            if qos == Qos::Reliable {
                self.unacked.push(datagram);
            }
            return Ok(self.self_seq);
        }

        let target_size = self.config.target_packet_size;
        let self_ack = self.self_ack;
        match qos {
            Qos::Reliable => {
                let self_seq = &mut self.self_seq;
                self.reliable_chunks.push(payload, target_size, || {
                    *self_seq = self_seq.wrapping_add(1);
                    QosHeader::new(QosType::Reliable, *self_seq, self_ack)
                });
            }
            Qos::Unreliable => {
                let self_seq = self.self_seq;
                self.unreliable_chunks.push(payload, target_size, || {
                    QosHeader::new(QosType::Unreliable, self_seq, self_ack)
                });
            }
        }
        Ok(self.self_seq)
    }

    /// Sends a `MeasureLatency` probe stamped with the wall clock. The probe
    /// also carries this side's freshest ack.
    pub fn send_latency_probe(&mut self) {
        let probe = encode_latency_probe(self.self_ack, Timestamp::now_millis());
        self.transmit(&probe);
    }

    /// Flushes pending reliable chunks, releases what the peer acknowledged
    /// and resends what is due.
    pub fn send_reliable_chunks(&mut self) {
        self.queue_reliable_chunks();
        self.unacked.release_acked(self.self_seq, self.other_ack);

        let io = self.io.home_mut();
        self.unacked
            .age_and_resend(self.config.timeout_frame_count, |datagram| io.transmit(datagram));
    }

    fn queue_reliable_chunks(&mut self) {
        for datagram in self.reliable_chunks.take_datagrams() {
            self.transmit(&datagram);
            self.unacked.push(datagram);
        }
    }

    fn transmit(&mut self, datagram: &[u8]) {
        match &mut self.io {
            IoSlot::Home(io) => io.transmit(datagram),
            _ => self.deferred.push(datagram.into()),
        }
    }

    /// Schedules the asynchronous half of the tick: sending the pending
    /// unreliable chunks, then draining the transport.
    pub fn begin_receive(&mut self, scheduler: &Scheduler) {
        let outgoing = self.unreliable_chunks.take_datagrams();
        self.io = match mem::replace(&mut self.io, IoSlot::Vacant) {
            IoSlot::Home(io) => IoSlot::Away(scheduler.schedule(move || io.run(outgoing))),
            IoSlot::Away(job) => IoSlot::Away(job.then(scheduler, move |io| io.run(outgoing))),
            IoSlot::Vacant => unreachable!("link I/O was lost to a panicked receive job"),
        };
    }

    /// Joins the receive job and adopts its results.
    pub fn complete_receive(&mut self) {
        let io = self.io.home_mut();
        for datagram in self.deferred.drain(..) {
            io.transmit(&datagram);
        }

        let outcome = io.receiver.take_outcome();
        if outcome.disconnected {
            io.connection = None;
        }
        self.attached = io.connection.is_some();

        self.other_seq = outcome.other_seq;
        self.other_ack = outcome.other_ack;
        self.self_ack = outcome.self_ack;
        self.connected = outcome.connected;
        self.disconnected = outcome.disconnected;
        for sample in outcome.latency_samples {
            self.latency.push(sample);
        }
        self.received.extend(outcome.received);
    }

    /// Datagrams delivered since the last call, in delivery order
    pub fn take_received(&mut self) -> Vec<Datagram> {
        mem::take(&mut self.received)
    }

    /// Binds a fresh transport connection. Everything still unacknowledged
    /// is resent on the next flush.
    pub fn reconnect(&mut self, connection: Box<dyn Connection>) {
        self.remote_addr = connection.remote_addr();
        let io = self.io.home_mut();
        if let Some(mut previous) = io.connection.replace(connection) {
            previous.disconnect();
        }
        self.attached = true;
        // a drop reported this tick is superseded by the new connection
        self.disconnected = false;
        self.unacked.reset_ages();
    }

    /// Continues this side's numbering after `seq`, the last sequence number
    /// the peer received from us. Queued reliable datagrams the peer already
    /// holds are released; if the peer's count does not line up with ours
    /// they are renumbered to follow `seq`.
    pub fn sync_self_seq(&mut self, seq: SeqNum) {
        let pending = self.reliable_chunks.chunk_count() as u16;
        let last_queued = self.self_seq.wrapping_sub(pending);
        let before_oldest = self.unacked.oldest_seq(last_queued).wrapping_sub(1);
        let held = wrapping_diff(before_oldest, seq);
        if held >= 0 && held as usize <= self.unacked.len() {
            self.unacked.release_acked(last_queued, seq);
            return;
        }

        self.unacked.restamp(seq.wrapping_add(1));
        let last_unacked = seq.wrapping_add(self.unacked.len() as u16);
        self.reliable_chunks.restamp(last_unacked.wrapping_add(1));
        self.self_seq = last_unacked.wrapping_add(pending);
    }

    /// Closes and drops the transport connection. Link state is kept.
    pub fn disconnect(&mut self) {
        let io = self.io.home_mut();
        if let Some(mut connection) = io.connection.take() {
            connection.disconnect();
        }
        self.attached = false;
    }

    /// Joins any in-flight job and discards all buffered state.
    pub fn dispose(&mut self) {
        self.disconnect();
        self.deferred.clear();
        self.received.clear();
        self.unacked.clear();
        self.reliable_chunks.take_datagrams();
        self.unreliable_chunks.take_datagrams();
    }
}
