use std::{error, fmt, io};

use crate::icmp::{DecodeError, EncodeError};
use crate::net::ResolveError;

/// Fatal conditions. A probe timing out is not one of them.
#[derive(Debug)]
pub enum PingError {
    Resolution(ResolveError),
    TransportOpen(io::Error),
    Encoding(EncodeError),
    Send(io::Error),
    Receive(io::Error),
    Decoding(DecodeError),
    SignalHandler(ctrlc::Error),
    Spawn(io::Error),
    SessionPanicked,
}

impl fmt::Display for PingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PingError::Resolution(err) => write!(f, "{}", err),
            PingError::TransportOpen(err) => write!(
                f,
                "unable to open raw ICMP socket: {} (try running as root or with CAP_NET_RAW)",
                err
            ),
            PingError::Encoding(err) => write!(f, "unable to encode echo request: {}", err),
            PingError::Send(err) => write!(f, "unable to send: {}", err),
            PingError::Receive(err) => write!(f, "unable to recv: {}", err),
            PingError::Decoding(err) => write!(f, "unable to decode reply: {}", err),
            PingError::SignalHandler(err) => write!(f, "unable to setup SIGINT handler: {}", err),
            PingError::Spawn(err) => write!(f, "unable to start echo session: {}", err),
            PingError::SessionPanicked => write!(f, "echo session stopped unexpectedly"),
        }
    }
}

impl error::Error for PingError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            PingError::Resolution(err) => Some(err),
            PingError::TransportOpen(err) | PingError::Send(err) => Some(err),
            PingError::Receive(err) | PingError::Spawn(err) => Some(err),
            PingError::Encoding(err) => Some(err),
            PingError::Decoding(err) => Some(err),
            PingError::SignalHandler(err) => Some(err),
            PingError::SessionPanicked => None,
        }
    }
}

impl From<ResolveError> for PingError {
    fn from(err: ResolveError) -> Self {
        PingError::Resolution(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_failure_carries_privilege_hint() {
        let err = PingError::TransportOpen(io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(err.to_string().contains("CAP_NET_RAW"));
    }

    #[test]
    fn source_is_chained() {
        use std::error::Error;

        let err = PingError::Decoding(DecodeError::Truncated { len: 2 });
        assert_eq!(err.source().unwrap().to_string(), "truncated packet: 2 bytes");
    }
}
