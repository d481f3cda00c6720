//! HTTP transport to an upstream node

use crate::traits::RequestHandler;
use crate::types::SignerResult;
use jsonrpsee::core::{async_trait, client::ClientT, params::ArrayParams};
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use serde_json::Value;
use std::time::Duration;

/// Default request timeout towards the upstream node
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// JSON-RPC over HTTP
#[derive(Clone, Debug)]
pub struct HttpTransport {
    url: String,
    client: HttpClient,
}

impl HttpTransport {
    /// Create a transport for the given node url
    pub fn new(url: &str) -> SignerResult<Self> {
        Self::with_timeout(url, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(url: &str, timeout: Duration) -> SignerResult<Self> {
        let client = HttpClientBuilder::default()
            .request_timeout(timeout)
            .build(url)?;
        Ok(Self {
            url: url.to_string(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RequestHandler for HttpTransport {
    async fn request(&self, method: &str, params: Vec<Value>) -> SignerResult<Value> {
        let mut rpc_params = ArrayParams::new();
        for param in params {
            rpc_params.insert(param)?;
        }
        log::trace!("{} -> {}", method, self.url);
        let response: Value = self.client.request(method, rpc_params).await?;
        Ok(response)
    }
}
