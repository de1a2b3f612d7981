//! Server configuration.
//!
//! All tunables come in through CLI flags with environment fallbacks
//! (`dotenvy` loads `.env` before parsing). The validated [`ServerConfig`]
//! is passed explicitly to the components that need it; there is no
//! process-wide mutable configuration.

use ces_control_core::types::{DEFAULT_CHUNK_BYTES, DEFAULT_QUERY_PAGE_LIMIT, LOOKBACK_DAYS};
use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "ces-control-server", version, about = "gRPC control-plane service delivering dogu logs")]
pub struct CliArgs {
    /// Address the gRPC server listens on.
    #[arg(long, env = "CES_SERVER_ADDR", default_value = "0.0.0.0:50051")]
    pub server_addr: String,

    /// Base URL of the Loki instance holding the cluster logs.
    #[arg(long, env = "CES_LOKI_URL")]
    pub loki_url: String,

    /// HTTP Basic auth username for Loki.
    #[arg(long, env = "CES_LOKI_USERNAME")]
    pub loki_username: String,

    /// HTTP Basic auth password for Loki.
    #[arg(long, env = "CES_LOKI_PASSWORD", hide_env_values = true)]
    pub loki_password: String,

    /// Maximum lines requested from Loki per pagination round.
    #[arg(long, env = "CES_QUERY_PAGE_LIMIT", default_value_t = DEFAULT_QUERY_PAGE_LIMIT)]
    pub query_page_limit: usize,

    /// Maximum payload bytes per response chunk.
    #[arg(long, env = "CES_CHUNK_BYTES", default_value_t = DEFAULT_CHUNK_BYTES)]
    pub chunk_bytes: usize,

    /// Width of one backward query window, in days.
    #[arg(long, env = "CES_LOOKBACK_DAYS", default_value_t = LOOKBACK_DAYS)]
    pub lookback_days: i64,
}

/// Validated runtime configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub server_addr: String,
    pub loki_url: String,
    pub loki_username: String,
    pub loki_password: String,
    pub query_page_limit: usize,
    pub chunk_bytes: usize,
    pub lookback_days: i64,
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.loki_url.trim().is_empty() {
            anyhow::bail!("Loki URL must not be empty");
        }
        if args.query_page_limit == 0 {
            anyhow::bail!("Query page limit must be greater than 0");
        }
        if args.chunk_bytes == 0 {
            anyhow::bail!("Chunk size must be greater than 0");
        }
        if args.lookback_days <= 0 {
            anyhow::bail!("Lookback must be at least one day");
        }

        Ok(Self {
            server_addr: args.server_addr,
            loki_url: args.loki_url,
            loki_username: args.loki_username,
            loki_password: args.loki_password,
            query_page_limit: args.query_page_limit,
            chunk_bytes: args.chunk_bytes,
            lookback_days: args.lookback_days,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> CliArgs {
        CliArgs {
            server_addr: "127.0.0.1:50051".to_string(),
            loki_url: "http://loki-gateway:3100".to_string(),
            loki_username: "admin".to_string(),
            loki_password: "secret".to_string(),
            query_page_limit: DEFAULT_QUERY_PAGE_LIMIT,
            chunk_bytes: DEFAULT_CHUNK_BYTES,
            lookback_days: LOOKBACK_DAYS,
        }
    }

    #[test]
    fn accepts_valid_arguments() {
        let config = ServerConfig::try_from(args()).unwrap();
        assert_eq!(config.query_page_limit, DEFAULT_QUERY_PAGE_LIMIT);
        assert_eq!(config.chunk_bytes, DEFAULT_CHUNK_BYTES);
    }

    #[test]
    fn rejects_zero_page_limit() {
        let mut invalid = args();
        invalid.query_page_limit = 0;
        assert!(ServerConfig::try_from(invalid).is_err());
    }

    #[test]
    fn rejects_zero_chunk_size() {
        let mut invalid = args();
        invalid.chunk_bytes = 0;
        assert!(ServerConfig::try_from(invalid).is_err());
    }

    #[test]
    fn rejects_non_positive_lookback() {
        let mut invalid = args();
        invalid.lookback_days = 0;
        assert!(ServerConfig::try_from(invalid).is_err());
    }
}
