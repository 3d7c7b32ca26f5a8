use log::{debug, error, info};

use crate::{
    backends::Timestamp,
    link::reorder_buffer::{Parked, ReorderBuffer},
    protocol::{datagram::Datagram, header::QosHeader, qos::QosType},
    sequence::{wrapping_diff, SeqNum},
    serde::Serde,
    transport::{Connection, TransportEvent},
};

/// Receive-side state of a link. Lives inside the link's I/O half and is
/// only touched by the receive pass, which may run on a worker thread.
pub struct Receiver {
    other_seq: SeqNum,
    other_ack: SeqNum,
    self_ack: SeqNum,
    accepted_first: bool,
    reorder: ReorderBuffer,
    received: Vec<Datagram>,
    latency_samples: Vec<u16>,
    connected: bool,
    disconnected: bool,
}

/// What one receive pass produced, handed back to the synchronous side.
pub struct ReceiveOutcome {
    pub other_seq: SeqNum,
    pub other_ack: SeqNum,
    pub self_ack: SeqNum,
    pub received: Vec<Datagram>,
    pub latency_samples: Vec<u16>,
    pub connected: bool,
    pub disconnected: bool,
}

impl Receiver {
    pub fn new(reorder_capacity: usize) -> Self {
        Self {
            other_seq: 0,
            other_ack: 0,
            self_ack: 0,
            accepted_first: false,
            reorder: ReorderBuffer::new(reorder_capacity),
            received: Vec::new(),
            latency_samples: Vec::new(),
            connected: false,
            disconnected: false,
        }
    }

    /// Drains every pending transport event of `connection`.
    pub fn receive_all(&mut self, connection: &mut dyn Connection) {
        let remote_addr = connection.remote_addr();
        while let Some(event) = connection.poll_event() {
            match event {
                TransportEvent::Connect => {
                    info!("link connected to {}", remote_addr);
                    self.connected = true;
                }
                TransportEvent::Disconnect => {
                    info!("link to {} disconnected", remote_addr);
                    self.disconnected = true;
                }
                TransportEvent::Data(bytes) => self.process(bytes),
            }
        }
        self.reorder.compact();
        self.self_ack = self.other_seq;
    }

    /// Handles one datagram taken off the wire.
    pub fn process(&mut self, bytes: &[u8]) {
        let mut reader = bytes;
        let header = match QosHeader::de(&mut reader) {
            Ok(header) => header,
            Err(_) => {
                debug!("discarding malformed datagram of {} bytes", bytes.len());
                return;
            }
        };
        self.other_ack = header.ack;

        match header.qos {
            QosType::MeasureLatency => match i64::de(&mut reader) {
                Ok(sent_at) => {
                    let elapsed = Timestamp::now_millis() - sent_at;
                    self.latency_samples
                        .push(elapsed.clamp(0, i64::from(u16::MAX)) as u16);
                }
                Err(_) => debug!("latency probe without timestamp"),
            },
            QosType::Unreliable => self.accept(bytes),
            QosType::Reliable => self.process_reliable(header.seq, bytes),
        }
    }

    fn process_reliable(&mut self, seq: SeqNum, bytes: &[u8]) {
        if !self.accepted_first {
            self.accepted_first = true;
            self.other_seq = seq;
            self.accept(bytes);
            return;
        }

        let diff = wrapping_diff(self.other_seq, seq);
        if diff == 1 {
            self.other_seq = seq;
            self.accept(bytes);
            for ready in self.reorder.advance() {
                self.other_seq = self.other_seq.wrapping_add(1);
                self.accept(&ready);
            }
        } else if diff > 1 {
            match self.reorder.park((diff - 2) as usize, bytes) {
                Parked::Stored => {}
                Parked::Duplicate => debug!("reliable datagram {} already buffered", seq),
                Parked::OverCapacity => error!(
                    "reliable datagram {} is {} ahead of {}, beyond the reorder buffer; dropped",
                    seq, diff, self.other_seq
                ),
            }
        } else {
            debug!("discarding stale reliable datagram {}", seq);
        }
    }

    fn accept(&mut self, bytes: &[u8]) {
        match Datagram::parse(bytes.to_vec().into_boxed_slice()) {
            Ok(datagram) => self.received.push(datagram),
            Err(_) => debug!("discarding unparsable datagram"),
        }
    }

    /// Hands this pass's results to the caller and resets the per-pass
    /// flags.
    pub fn take_outcome(&mut self) -> ReceiveOutcome {
        ReceiveOutcome {
            other_seq: self.other_seq,
            other_ack: self.other_ack,
            self_ack: self.self_ack,
            received: std::mem::take(&mut self.received),
            latency_samples: std::mem::take(&mut self.latency_samples),
            connected: std::mem::take(&mut self.connected),
            disconnected: std::mem::take(&mut self.disconnected),
        }
    }

    pub fn parked(&self) -> usize {
        self.reorder.parked()
    }
}
