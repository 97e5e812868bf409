//! Startup configuration.
//!
//! Read once from flags and environment, immutable afterwards. The defaults
//! are the addresses and identity the service has always used.

use std::net::SocketAddr;

use clap::Parser;

#[derive(Clone, Debug, Parser)]
#[command(name = "addsvc", version, about = "Adds two integers over HTTP/JSON")]
pub struct Config {
    /// Address of the HTTP/JSON listener.
    #[arg(long, env = "ADDSVC_HTTP_ADDR", default_value = "0.0.0.0:8000")]
    pub http_addr: SocketAddr,

    /// Address of the debug listener (health, readiness, counters).
    #[arg(long, env = "ADDSVC_DEBUG_ADDR", default_value = "0.0.0.0:8001")]
    pub debug_addr: SocketAddr,

    /// The only username allowed to call the service.
    #[arg(long, env = "ADDSVC_IDENTITY", default_value = "user")]
    pub identity: String,

    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins if set.
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, default_value_t = false)]
    pub json_logs: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_fixed_addresses() {
        let config = Config::try_parse_from(["addsvc"]).unwrap();
        assert_eq!(config.http_addr, "0.0.0.0:8000".parse().unwrap());
        assert_eq!(config.debug_addr, "0.0.0.0:8001".parse().unwrap());
        assert_eq!(config.identity, "user");
        assert!(!config.json_logs);
    }

    #[test]
    fn flags_override_defaults() {
        let config = Config::try_parse_from([
            "addsvc",
            "--http-addr",
            "127.0.0.1:9000",
            "--identity",
            "admin",
        ])
        .unwrap();
        assert_eq!(config.http_addr.port(), 9000);
        assert_eq!(config.identity, "admin");
    }

    #[test]
    fn rejects_bad_addresses() {
        assert!(Config::try_parse_from(["addsvc", "--debug-addr", "nope"]).is_err());
    }
}
