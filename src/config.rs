//! Command-line configuration for the flashmc server.

use crate::storage::DEFAULT_SWEEP_INTERVAL;
use crate::{DEFAULT_HOST, DEFAULT_PORT};
use clap::Parser;
use std::time::Duration;

/// Command-line arguments for the cache server
#[derive(Parser, Debug, Clone)]
#[command(name = "flashmc")]
#[command(version)]
#[command(about = "An LRU cache with TTL served over a memcached-style text protocol", long_about = None)]
pub struct Config {
    /// Host to bind to
    #[arg(short = 'H', long, default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Maximum number of entries (0 = unbounded)
    #[arg(short, long, default_value_t = 0)]
    pub capacity: usize,

    /// Milliseconds between background sweeps for expired entries
    #[arg(
        long,
        default_value_t = DEFAULT_SWEEP_INTERVAL.as_millis() as u64,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub sweep_interval_ms: u64,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Config {
    /// Returns the bind address as a string
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["flashmc"]).unwrap();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9999);
        assert_eq!(config.capacity, 0);
        assert_eq!(config.sweep_interval(), Duration::from_secs(5));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.bind_address(), "127.0.0.1:9999");
    }

    #[test]
    fn test_flags() {
        let config = Config::try_parse_from([
            "flashmc",
            "-H",
            "0.0.0.0",
            "-p",
            "11211",
            "-c",
            "1000",
            "--sweep-interval-ms",
            "250",
            "--log-level",
            "debug",
        ])
        .unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:11211");
        assert_eq!(config.capacity, 1000);
        assert_eq!(config.sweep_interval(), Duration::from_millis(250));
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_long_flags() {
        let config =
            Config::try_parse_from(["flashmc", "--host", "localhost", "--port", "1", "--capacity", "2"])
                .unwrap();

        assert_eq!(config.bind_address(), "localhost:1");
        assert_eq!(config.capacity, 2);
    }

    #[test]
    fn test_invalid_values() {
        assert!(Config::try_parse_from(["flashmc", "--port", "70000"]).is_err());
        assert!(Config::try_parse_from(["flashmc", "--capacity", "-1"]).is_err());
        assert!(Config::try_parse_from(["flashmc", "--sweep-interval-ms", "0"]).is_err());
        assert!(Config::try_parse_from(["flashmc", "--bogus"]).is_err());
    }
}
