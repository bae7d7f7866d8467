use std::io;
use std::mem::MaybeUninit;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::{Duration, Instant};
use std::{error, fmt};

use log::debug;
use socket2::{Domain, Protocol, SockAddr, Socket, Type};

use crate::icmp;

/// Large enough for any datagram on a 1500 byte MTU link.
pub const RECV_BUFFER_SIZE: usize = 1500;

/// Socket timeouts have microsecond resolution and a zero timeout blocks forever.
const MIN_READ_TIMEOUT: Duration = Duration::from_micros(1);

#[derive(Debug)]
pub enum RecvError {
    /// Nothing arrived before the deadline.
    Timeout,
    Io(io::Error),
}

impl fmt::Display for RecvError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RecvError::Timeout => write!(f, "timed out"),
            RecvError::Io(err) => write!(f, "{}", err),
        }
    }
}

impl error::Error for RecvError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            RecvError::Timeout => None,
            RecvError::Io(err) => Some(err),
        }
    }
}

impl From<io::Error> for RecvError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => RecvError::Timeout,
            _ => RecvError::Io(err),
        }
    }
}

/// A capability to exchange ICMP messages with IPv4 hosts.
pub trait Transport {
    /// Send one encoded ICMP message, returning the number of bytes written.
    fn send(&mut self, packet: &[u8], destination: Ipv4Addr) -> io::Result<usize>;

    /// Block until an ICMP message arrives or `deadline` passes.
    ///
    /// The message is copied into `buf` without any IP header; the returned length is that of
    /// the ICMP message. Any inbound ICMP traffic may be returned, not only replies to our
    /// own requests.
    fn recv_with_deadline(
        &mut self,
        buf: &mut [u8],
        deadline: Instant,
    ) -> Result<(usize, Ipv4Addr), RecvError>;
}

/// Raw ICMPv4 socket. Opening one usually requires root or CAP_NET_RAW.
pub struct IcmpSocket {
    socket: Socket,
}

impl IcmpSocket {
    pub fn open(ttl: u32) -> io::Result<Self> {
        let socket = Socket::new(Domain::IPV4, Type::RAW, Some(Protocol::ICMPV4))?;
        socket.set_ttl(ttl)?;
        debug!("opened raw ICMPv4 socket with ttl={}", ttl);
        Ok(IcmpSocket { socket })
    }
}

impl Transport for IcmpSocket {
    fn send(&mut self, packet: &[u8], destination: Ipv4Addr) -> io::Result<usize> {
        let addr = SocketAddrV4::new(destination, 0);
        self.socket.send_to(packet, &SockAddr::from(addr))
    }

    fn recv_with_deadline(
        &mut self,
        buf: &mut [u8],
        deadline: Instant,
    ) -> Result<(usize, Ipv4Addr), RecvError> {
        let timeout = match read_timeout(deadline.saturating_duration_since(Instant::now())) {
            Some(timeout) => timeout,
            None => return Err(RecvError::Timeout),
        };
        self.socket.set_read_timeout(Some(timeout))?;

        // SAFETY: `MaybeUninit<u8>` has the layout of `u8` and recv_from never writes
        // uninitialised bytes into the slice.
        let uninit = unsafe { &mut *(&mut *buf as *mut [u8] as *mut [MaybeUninit<u8>]) };
        let (n, from) = self.socket.recv_from(uninit)?;

        let len = icmp::ipv4_payload(&buf[..n])
            .map_err(|e| RecvError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))?
            .len();
        buf.copy_within(n - len..n, 0);

        let source = from
            .as_socket_ipv4()
            .map(|addr| *addr.ip())
            .unwrap_or(Ipv4Addr::UNSPECIFIED);
        Ok((len, source))
    }
}

/// Read timeout for the time left before a deadline, `None` once it has passed.
fn read_timeout(remaining: Duration) -> Option<Duration> {
    if remaining.is_zero() {
        return None;
    }
    Some(remaining.max(MIN_READ_TIMEOUT))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn would_block_is_a_timeout() {
        let err = RecvError::from(io::Error::from(io::ErrorKind::WouldBlock));
        assert!(matches!(err, RecvError::Timeout));
        let err = RecvError::from(io::Error::from(io::ErrorKind::TimedOut));
        assert!(matches!(err, RecvError::Timeout));
    }

    #[test]
    fn other_errors_are_fatal() {
        let err = RecvError::from(io::Error::from(io::ErrorKind::ConnectionReset));
        assert!(matches!(err, RecvError::Io(_)));
    }

    #[test]
    fn read_timeout_rounds_up_to_a_microsecond() {
        assert_eq!(read_timeout(Duration::ZERO), None);
        assert_eq!(
            read_timeout(Duration::from_nanos(500)),
            Some(Duration::from_micros(1))
        );
        assert_eq!(
            read_timeout(Duration::from_millis(2500)),
            Some(Duration::from_millis(2500))
        );
    }

    #[test]
    fn sub_microsecond_deadline_still_times_out() {
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, None).unwrap();
        let timeout = read_timeout(Duration::from_nanos(500)).unwrap();
        socket.set_read_timeout(Some(timeout)).unwrap();
        assert!(socket.read_timeout().unwrap().is_some());

        socket
            .bind(&SockAddr::from(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 0)))
            .unwrap();
        let mut buf = [MaybeUninit::<u8>::uninit(); 16];
        let err = RecvError::from(socket.recv_from(&mut buf).unwrap_err());
        assert!(matches!(err, RecvError::Timeout));
    }
}
