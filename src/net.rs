pub mod transport;

use std::net::{IpAddr, Ipv4Addr};
use std::{error, fmt};

/// A host name together with the IPv4 address it resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub addr: Ipv4Addr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveErrors {
    LookupFailed(String),
    NoIpv4Address,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveError {
    pub target: String,
    pub err: ResolveErrors,
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.err {
            ResolveErrors::NoIpv4Address => {
                write!(f, "got no IPv4 address for \"{}\"", self.target)
            }
            ResolveErrors::LookupFailed(err) => {
                write!(f, "unable to lookup \"{}\": {}", self.target, err)
            }
        }
    }
}

impl error::Error for ResolveError {}

pub fn resolve(target: &str) -> Result<Target, ResolveError> {
    let fail = |err: ResolveErrors| ResolveError {
        target: target.to_string(),
        err,
    };

    let addrs = match target.parse::<IpAddr>() {
        Ok(addr) => vec![addr],
        // Not an address literal, assume input is a hostname.
        Err(_) => dns_lookup::lookup_host(target)
            .map_err(|e| fail(ResolveErrors::LookupFailed(e.to_string())))?,
    };

    first_ipv4(&addrs)
        .map(|addr| Target {
            host: target.to_string(),
            addr,
        })
        .ok_or_else(|| fail(ResolveErrors::NoIpv4Address))
}

fn first_ipv4(addrs: &[IpAddr]) -> Option<Ipv4Addr> {
    addrs.iter().find_map(|addr| match addr {
        IpAddr::V4(v4) => Some(*v4),
        IpAddr::V6(_) => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_ipv4_literal() {
        let target = resolve("127.0.0.1").unwrap();
        assert_eq!(target.host, "127.0.0.1");
        assert_eq!(target.addr, Ipv4Addr::LOCALHOST);
    }

    #[test]
    fn rejects_ipv6_literal() {
        let err = resolve("::1").unwrap_err();
        assert_eq!(err.err, ResolveErrors::NoIpv4Address);
        assert_eq!(err.to_string(), "got no IPv4 address for \"::1\"");
    }

    #[test]
    fn picks_first_ipv4() {
        let addrs = [
            "::1".parse().unwrap(),
            "10.0.0.2".parse().unwrap(),
            "10.0.0.3".parse().unwrap(),
        ];
        assert_eq!(first_ipv4(&addrs), Some(Ipv4Addr::new(10, 0, 0, 2)));
        assert_eq!(first_ipv4(&addrs[..1]), None);
    }
}
