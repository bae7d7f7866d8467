use std::net::Ipv4Addr;
use std::time::Duration;

use crate::ping::Reply;
use crate::stats::StatsSnapshot;

fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Renders console lines for one target.
#[derive(Debug, Clone)]
pub struct Reporter {
    host: String,
    addr: Ipv4Addr,
    ttl: u32,
}

impl Reporter {
    pub fn new(host: String, addr: Ipv4Addr, ttl: u32) -> Self {
        Reporter { host, addr, ttl }
    }

    pub fn format_banner(&self, payload_len: usize) -> String {
        format!("PING {} ({}) {} data bytes", self.host, self.addr, payload_len)
    }

    pub fn format_reply(&self, reply: &Reply) -> String {
        format!(
            "{} bytes from {}: icmp_seq={} ttl={} time={:.3} ms",
            reply.len,
            reply.source,
            reply.seq,
            self.ttl,
            millis(reply.rtt)
        )
    }

    pub fn format_timeout(&self, seq: u64) -> String {
        format!("Request timeout for icmp_seq={}", seq)
    }

    pub fn format_summary(&self, stats: &StatsSnapshot, elapsed: Duration) -> String {
        let rtt = match (stats.min_rtt, stats.avg_rtt(), stats.max_rtt) {
            (Some(min), Some(avg), Some(max)) => format!(
                "{:.3}/{:.3}/{:.3} ms",
                millis(min),
                millis(avg),
                millis(max)
            ),
            _ => "n/a".to_string(),
        };
        format!(
            "--- {} ping statistics ---\n\
             {} packets transmitted, {} received, {}% packet loss, time {}ms\n\
             rtt min/avg/max: {}",
            self.host,
            stats.transmitted,
            stats.received,
            stats.loss_percent(),
            elapsed.as_millis(),
            rtt
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::StatsAggregate;

    fn reporter() -> Reporter {
        Reporter::new("example.org".to_string(), Ipv4Addr::new(192, 0, 2, 1), 55)
    }

    #[test]
    fn reply_line() {
        let reply = Reply {
            seq: 4,
            len: 23,
            source: Ipv4Addr::new(192, 0, 2, 1),
            rtt: Duration::from_micros(10_250),
        };
        assert_eq!(
            reporter().format_reply(&reply),
            "23 bytes from 192.0.2.1: icmp_seq=4 ttl=55 time=10.250 ms"
        );
    }

    #[test]
    fn banner_and_timeout() {
        assert_eq!(
            reporter().format_banner(15),
            "PING example.org (192.0.2.1) 15 data bytes"
        );
        assert_eq!(
            reporter().format_timeout(2),
            "Request timeout for icmp_seq=2"
        );
    }

    #[test]
    fn summary_after_two_replies_and_a_drop() {
        let stats = StatsAggregate::new();
        for _ in 0..3 {
            stats.record_sent();
        }
        stats.record_answered(Duration::from_millis(10));
        stats.record_answered(Duration::from_millis(20));
        stats.record_dropped();

        let summary = reporter().format_summary(&stats.snapshot(), Duration::from_millis(3004));
        assert_eq!(
            summary,
            "--- example.org ping statistics ---\n\
             3 packets transmitted, 2 received, 33% packet loss, time 3004ms\n\
             rtt min/avg/max: 10.000/15.000/20.000 ms"
        );
    }

    #[test]
    fn summary_without_replies() {
        let stats = StatsAggregate::new();
        stats.record_sent();

        let summary = reporter().format_summary(&stats.snapshot(), Duration::from_millis(12));
        assert_eq!(
            summary,
            "--- example.org ping statistics ---\n\
             1 packets transmitted, 0 received, 0% packet loss, time 12ms\n\
             rtt min/avg/max: n/a"
        );
    }
}
