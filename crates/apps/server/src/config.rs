use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;

pub const DEFAULT_ADDR: &str = "127.0.0.1:9200";
pub const DEFAULT_UPSTREAM_URL: &str = "https://files.rcsb.org/view";
pub const DEFAULT_EXTENSION: &str = "pdb";
pub const DEFAULT_USER_AGENT: &str = "ProteinViewer/1.0";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Flags override environment variables, which override the defaults.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Structure-file proxy for the protein viewer")]
pub struct Args {
    /// Listen address [env: PROTEIN_ADDR] (default: 127.0.0.1:9200)
    #[arg(long)]
    pub addr: Option<String>,

    /// Base URL of the structure repository [env: PROTEIN_UPSTREAM_URL]
    #[arg(long)]
    pub upstream_url: Option<String>,

    /// File extension requested from upstream [env: PROTEIN_UPSTREAM_EXT]
    #[arg(long)]
    pub extension: Option<String>,

    /// User-Agent sent upstream [env: PROTEIN_USER_AGENT]
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Upstream request timeout in seconds [env: PROTEIN_TIMEOUT_SECS]
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub extension: String,
    pub user_agent: String,
    pub timeout: Duration,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub upstream: UpstreamConfig,
}

impl ServerConfig {
    pub fn from_env(args: Args) -> Result<Self, String> {
        Self::resolve(args, |key| env::var(key).ok())
    }

    pub fn resolve(args: Args, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let addr_raw = args
            .addr
            .or_else(|| lookup("PROTEIN_ADDR"))
            .unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr: SocketAddr = addr_raw
            .parse()
            .map_err(|e| format!("invalid listen address {addr_raw:?}: {e}"))?;

        let timeout_secs = match args.timeout_secs {
            Some(v) => v,
            None => match lookup("PROTEIN_TIMEOUT_SECS") {
                Some(raw) => raw
                    .parse()
                    .map_err(|e| format!("invalid PROTEIN_TIMEOUT_SECS {raw:?}: {e}"))?,
                None => DEFAULT_TIMEOUT_SECS,
            },
        };

        let upstream = UpstreamConfig {
            base_url: args
                .upstream_url
                .or_else(|| lookup("PROTEIN_UPSTREAM_URL"))
                .unwrap_or_else(|| DEFAULT_UPSTREAM_URL.to_string()),
            extension: args
                .extension
                .or_else(|| lookup("PROTEIN_UPSTREAM_EXT"))
                .unwrap_or_else(|| DEFAULT_EXTENSION.to_string()),
            user_agent: args
                .user_agent
                .or_else(|| lookup("PROTEIN_USER_AGENT"))
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            timeout: Duration::from_secs(timeout_secs),
        };

        Ok(Self { addr, upstream })
    }
}
