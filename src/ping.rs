pub mod clock;
pub mod errors;
pub mod session;

pub use clock::{Clock, SystemClock};
pub use errors::PingError;
pub use session::{EchoSession, InFlight, Reply, Sample, State};

use std::sync::Arc;
use std::thread;
use std::time::Instant;

use crossbeam::channel::{self, bounded, select, Receiver};
use log::debug;

use crate::config::PingConfig;
use crate::net::transport::{IcmpSocket, Transport};
use crate::net::Target;
use crate::report::Reporter;
use crate::stats::StatsAggregate;

/// Identifier carried by every echo request this process sends.
pub fn process_identifier() -> u16 {
    std::process::id() as u16
}

pub struct Pinger {
    target: Target,
    config: PingConfig,
}

impl Pinger {
    pub fn new(target: Target, config: PingConfig) -> Self {
        Self { target, config }
    }

    /// Ping until SIGINT, then print statistics.
    ///
    /// The echo session runs on its own thread. When the interrupt arrives a probe may still be
    /// in flight; its outcome is never recorded.
    pub fn ping(self) -> Result<(), PingError> {
        let start = Instant::now();
        let socket = IcmpSocket::open(self.config.ttl).map_err(PingError::TransportOpen)?;
        let ctrl_c_events = Self::setup_sigint_handler()?;

        let stats = Arc::new(StatsAggregate::new());
        let reporter = Reporter::new(self.target.host.clone(), self.target.addr, self.config.ttl);
        let session = EchoSession::new(
            socket,
            SystemClock,
            self.target.addr,
            process_identifier(),
            &self.config,
            Arc::clone(&stats),
        );

        println!("{}", reporter.format_banner(self.config.payload.len()));

        let (done_tx, done_rx) = bounded(1);
        {
            let reporter = reporter.clone();
            thread::Builder::new()
                .name("echo-session".to_string())
                .spawn(move || {
                    let _ = done_tx.send(run_session(session, &reporter));
                })
                .map_err(PingError::Spawn)?;
        }

        select! {
            recv(ctrl_c_events) -> _ => {
                debug!("received SIGINT");
                let snapshot = stats.snapshot();
                println!();
                println!("{}", reporter.format_summary(&snapshot, start.elapsed()));
                Ok(())
            }
            recv(done_rx) -> res => session_outcome(res),
        }
    }

    fn setup_sigint_handler() -> Result<Receiver<()>, PingError> {
        let (sender, receiver) = bounded(1);
        ctrlc::set_handler(move || {
            let _ = sender.try_send(());
        })
        .map_err(PingError::SignalHandler)?;

        Ok(receiver)
    }
}

/// The result the session thread reported. A closed channel means the thread died without
/// reporting, which only happens if it panicked.
fn session_outcome(res: Result<Result<(), PingError>, channel::RecvError>) -> Result<(), PingError> {
    res.unwrap_or(Err(PingError::SessionPanicked))
}

/// Step the session forever, printing a line per sample. Only returns on a fatal error.
pub fn run_session<T: Transport, C: Clock>(
    mut session: EchoSession<T, C>,
    reporter: &Reporter,
) -> Result<(), PingError> {
    loop {
        match session.step()? {
            Some(Sample::Answered(reply)) => println!("{}", reporter.format_reply(&reply)),
            Some(Sample::Dropped { seq }) => println!("{}", reporter.format_timeout(seq)),
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::transport::RecvError;
    use crossbeam::channel::Sender;
    use std::io;
    use std::net::Ipv4Addr;

    struct Unreachable;

    impl Transport for Unreachable {
        fn send(&mut self, _packet: &[u8], _destination: Ipv4Addr) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::AddrNotAvailable))
        }

        fn recv_with_deadline(
            &mut self,
            _buf: &mut [u8],
            _deadline: Instant,
        ) -> Result<(usize, Ipv4Addr), RecvError> {
            Err(RecvError::Timeout)
        }
    }

    #[test]
    fn session_loop_stops_on_fatal_error() {
        let addr = Ipv4Addr::new(192, 0, 2, 1);
        let stats = Arc::new(StatsAggregate::new());
        let session = EchoSession::new(
            Unreachable,
            SystemClock,
            addr,
            process_identifier(),
            &PingConfig::default(),
            Arc::clone(&stats),
        );
        let reporter = Reporter::new("192.0.2.1".to_string(), addr, 55);

        let res = run_session(session, &reporter);
        assert!(matches!(res, Err(PingError::Send(_))));
        assert_eq!(stats.snapshot().transmitted, 0);
    }

    #[test]
    fn dead_session_thread_is_fatal() {
        let (done_tx, done_rx): (Sender<Result<(), PingError>>, _) = bounded(1);
        drop(done_tx);

        let res = session_outcome(done_rx.recv());
        assert!(matches!(res, Err(PingError::SessionPanicked)));
    }

    #[test]
    fn reported_session_error_is_returned() {
        let (done_tx, done_rx) = bounded(1);
        done_tx
            .send(Err(PingError::Receive(io::Error::from(io::ErrorKind::Other))))
            .unwrap();

        let res = session_outcome(done_rx.recv());
        assert!(matches!(res, Err(PingError::Receive(_))));
    }
}
