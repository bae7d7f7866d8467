pub mod config;
pub mod icmp;
pub mod net;
pub mod ping;
pub mod report;
pub mod stats;
