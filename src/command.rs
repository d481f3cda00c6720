//! Command line interface for the signing proxy.

use crate::keys::AddressMatching;
use crate::middleware::Placement;
use crate::transport::DEFAULT_REQUEST_TIMEOUT;

/// Default port the proxy listens on
pub const DEFAULT_RPC_PORT: u16 = 8546;

#[derive(clap::Parser, Debug, Clone)]
#[clap(version = "0.1", author = "rawtx-signer")]
pub struct Opts {
    /// Url of the upstream node
    #[clap(short, long, default_value = "http://127.0.0.1:8545")]
    pub upstream: String,

    /// Port of the proxy RPC server
    #[clap(long, default_value_t = DEFAULT_RPC_PORT)]
    pub rpc_port: u16,

    /// Private keys used to sign transactions locally, hex encoded
    #[clap(
        short = 'k',
        long = "private-key",
        env = "RAWTX_PRIVATE_KEYS",
        value_delimiter = ',',
        required = true,
        hide_env_values = true
    )]
    pub private_keys: Vec<String>,

    /// How transaction senders are matched against the local keys
    #[clap(long, value_enum, default_value_t = AddressMatching::Canonical)]
    pub address_matching: AddressMatching,

    /// Inject the signer at this layer (0 = innermost) instead of adding it outermost
    #[clap(long)]
    pub inject_layer: Option<usize>,

    /// Upstream request timeout in seconds
    #[clap(long, default_value_t = DEFAULT_REQUEST_TIMEOUT.as_secs())]
    pub timeout: u64,
}

impl Opts {
    /// Where the signing middleware goes in the stack
    pub fn placement(&self) -> Placement {
        self.inject_layer
            .map_or(Placement::Outermost, Placement::Layer)
    }
}
