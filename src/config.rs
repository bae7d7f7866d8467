use std::time::Duration;

pub const DEFAULT_TTL: u32 = 55;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);
pub const DEFAULT_DELAY: Duration = Duration::from_millis(1000);
pub const DEFAULT_PAYLOAD: &[u8] = b"HELLO-R-U-THERE";

/// Fixed parameters of an echo session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingConfig {
    /// IPv4 time-to-live set on outgoing probes.
    pub ttl: u32,
    /// How long to wait for a reply before the probe counts as dropped.
    pub timeout: Duration,
    /// Pause between an answered probe and the next send.
    pub delay: Duration,
    pub payload: Vec<u8>,
}

impl Default for PingConfig {
    fn default() -> Self {
        PingConfig {
            ttl: DEFAULT_TTL,
            timeout: DEFAULT_TIMEOUT,
            delay: DEFAULT_DELAY,
            payload: DEFAULT_PAYLOAD.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn defaults_match_wire_parameters() {
        let config = super::PingConfig::default();
        assert_eq!(config.ttl, 55);
        assert_eq!(config.timeout.as_millis(), 5000);
        assert_eq!(config.delay.as_millis(), 1000);
        assert_eq!(config.payload, b"HELLO-R-U-THERE");
    }
}
