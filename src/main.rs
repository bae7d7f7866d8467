use ruthere::config::PingConfig;
use ruthere::net;
use ruthere::ping::{PingError, Pinger};

fn print_usage(cmd: &str) {
    eprint!("Usage\n  {} target\n", cmd)
}

fn run(target: &str) -> Result<(), PingError> {
    let target = net::resolve(target)?;
    Pinger::new(target, PingConfig::default()).ping()
}

fn main() {
    env_logger::Builder::from_default_env()
        .format_timestamp_millis()
        .init();

    let mut args = std::env::args();
    let cmd = args.next().unwrap_or_else(|| "ruthere".to_string());
    if args.len() != 1 {
        print_usage(&cmd);
        return;
    }

    let target = args.next().unwrap_or_default();
    if target.is_empty() || target == "--help" {
        print_usage(&cmd);
        return;
    }

    if let Err(e) = run(&target) {
        eprintln!("{cmd}: {}", e);
        std::process::exit(1);
    }
}
