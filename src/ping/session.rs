use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, trace};

use super::clock::Clock;
use super::errors::PingError;
use crate::config::PingConfig;
use crate::icmp::{self, DecodedMessage};
use crate::net::transport::{RecvError, Transport, RECV_BUFFER_SIZE};
use crate::stats::StatsAggregate;

/// The single outstanding probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InFlight {
    pub seq: u64,
    pub sent_at: Instant,
    pub deadline: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    InFlight(InFlight),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reply {
    pub seq: u64,
    /// Size of the ICMP reply message in bytes.
    pub len: usize,
    pub source: Ipv4Addr,
    pub rtt: Duration,
}

/// The outcome of one probe. Exactly one is produced per sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sample {
    Answered(Reply),
    Dropped { seq: u64 },
}

/// Drives one echo request at a time through a [`Transport`].
///
/// Sequence numbers start at 1 and are never reused; on the wire only their low 16 bits are
/// carried.
pub struct EchoSession<T, C> {
    transport: T,
    clock: C,
    destination: Ipv4Addr,
    identifier: u16,
    payload: Vec<u8>,
    timeout: Duration,
    delay: Duration,
    stats: Arc<StatsAggregate>,
    next_seq: u64,
    state: State,
    resume_at: Option<Instant>,
    buf: Vec<u8>,
}

impl<T: Transport, C: Clock> EchoSession<T, C> {
    pub fn new(
        transport: T,
        clock: C,
        destination: Ipv4Addr,
        identifier: u16,
        config: &PingConfig,
        stats: Arc<StatsAggregate>,
    ) -> Self {
        EchoSession {
            transport,
            clock,
            destination,
            identifier,
            payload: config.payload.clone(),
            timeout: config.timeout,
            delay: config.delay,
            stats,
            next_seq: 1,
            state: State::Idle,
            resume_at: None,
            buf: vec![0; RECV_BUFFER_SIZE],
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn identifier(&self) -> u16 {
        self.identifier
    }

    /// Send a probe if none is in flight, then wait for one inbound message.
    ///
    /// Returns `None` when the message that arrived was not the reply we wait for; the probe
    /// stays in flight with its original deadline.
    pub fn step(&mut self) -> Result<Option<Sample>, PingError> {
        let pending = match self.state {
            State::InFlight(pending) => pending,
            State::Idle => self.send_next()?,
        };

        let (len, source) = match self
            .transport
            .recv_with_deadline(&mut self.buf, pending.deadline)
        {
            Ok(received) => received,
            Err(RecvError::Timeout) => {
                debug!("icmp_seq={} timed out", pending.seq);
                self.stats.record_dropped();
                self.state = State::Idle;
                return Ok(Some(Sample::Dropped { seq: pending.seq }));
            }
            Err(RecvError::Io(err)) => return Err(PingError::Receive(err)),
        };
        let received_at = self.clock.now();

        let msg = icmp::decode(&self.buf[..len]).map_err(PingError::Decoding)?;
        if !self.is_reply_to(&msg, pending.seq) {
            trace!(
                "discarding {:?} from {} (id={} seq={})",
                msg.header.typ,
                source,
                msg.header.id,
                msg.header.seq
            );
            return Ok(None);
        }

        let rtt = received_at.saturating_duration_since(pending.sent_at);
        self.stats.record_answered(rtt);
        self.state = State::Idle;
        self.resume_at = Some(received_at + self.delay);

        Ok(Some(Sample::Answered(Reply {
            seq: pending.seq,
            len: msg.len,
            source,
            rtt,
        })))
    }

    fn send_next(&mut self) -> Result<InFlight, PingError> {
        if let Some(resume_at) = self.resume_at.take() {
            let now = self.clock.now();
            if resume_at > now {
                trace!("waiting {:?} before next probe", resume_at - now);
                self.clock.sleep(resume_at - now);
            }
        }

        let seq = self.next_seq;
        let packet =
            icmp::encode(self.identifier, seq as u16, &self.payload).map_err(PingError::Encoding)?;

        let sent_at = self.clock.now();
        let n = self
            .transport
            .send(&packet, self.destination)
            .map_err(PingError::Send)?;
        debug!("sent icmp_seq={} ({} bytes) to {}", seq, n, self.destination);

        self.next_seq += 1;
        self.stats.record_sent();

        let pending = InFlight {
            seq,
            sent_at,
            deadline: sent_at + self.timeout,
        };
        self.state = State::InFlight(pending);
        Ok(pending)
    }

    fn is_reply_to(&self, msg: &DecodedMessage, seq: u64) -> bool {
        msg.is_echo_reply() && msg.header.id == self.identifier && msg.header.seq == seq as u16
    }
}
