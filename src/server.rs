use crate::traits::{EthProxyApiServer, RequestHandler};
use crate::types::ETH_SEND_RAW_TRANSACTION;
use jsonrpsee::{
    core::{async_trait, RpcResult},
    server::{Server, ServerHandle},
    types::ErrorObject,
};
use serde_json::Value;
use std::net::SocketAddr;

/// Serves the ETH proxy API by forwarding every call to a request handler.
///
/// Put a [`Client`](crate::middleware::Client) carrying the signing middleware behind it to
/// get a signing proxy.
pub struct RpcForwarder<H> {
    handler: H,
}

impl<H: RequestHandler> RpcForwarder<H> {
    pub fn new(handler: H) -> Self {
        Self { handler }
    }

    async fn forward(&self, method: &str, params: Vec<Value>) -> RpcResult<Value> {
        self.handler
            .request(method, params)
            .await
            .map_err(ErrorObject::from)
    }
}

/// Positional params, dropping a trailing optional argument the caller left out
fn with_optional(mut params: Vec<Value>, optional: Option<Value>) -> Vec<Value> {
    if let Some(value) = optional {
        params.push(value);
    }
    params
}

/// Implement the ETH proxy API server
#[async_trait]
impl<H: RequestHandler + 'static> EthProxyApiServer for RpcForwarder<H> {
    // ########################################################################
    // Client
    // ########################################################################

    async fn chain_id(&self) -> RpcResult<Value> {
        self.forward("eth_chainId", vec![]).await
    }

    async fn net_version(&self) -> RpcResult<Value> {
        self.forward("net_version", vec![]).await
    }

    async fn block_number(&self) -> RpcResult<Value> {
        self.forward("eth_blockNumber", vec![]).await
    }

    async fn accounts(&self) -> RpcResult<Value> {
        self.forward("eth_accounts", vec![]).await
    }

    // ########################################################################
    // State
    // ########################################################################

    async fn balance(&self, address: Value, number_or_tag: Option<Value>) -> RpcResult<Value> {
        self.forward("eth_getBalance", with_optional(vec![address], number_or_tag))
            .await
    }

    async fn transaction_count(
        &self,
        address: Value,
        number_or_tag: Option<Value>,
    ) -> RpcResult<Value> {
        self.forward(
            "eth_getTransactionCount",
            with_optional(vec![address], number_or_tag),
        )
        .await
    }

    async fn transaction_receipt(&self, hash: Value) -> RpcResult<Value> {
        self.forward("eth_getTransactionReceipt", vec![hash]).await
    }

    // ########################################################################
    // Execute
    // ########################################################################

    async fn call(&self, request: Value, number_or_tag: Option<Value>) -> RpcResult<Value> {
        self.forward("eth_call", with_optional(vec![request], number_or_tag))
            .await
    }

    async fn estimate_gas(
        &self,
        request: Value,
        number_or_tag: Option<Value>,
    ) -> RpcResult<Value> {
        self.forward("eth_estimateGas", with_optional(vec![request], number_or_tag))
            .await
    }

    async fn gas_price(&self) -> RpcResult<Value> {
        self.forward("eth_gasPrice", vec![]).await
    }

    // ########################################################################
    // Submit
    // ########################################################################

    async fn send_transaction(&self, request: Value) -> RpcResult<Value> {
        self.forward("eth_sendTransaction", vec![request]).await
    }

    async fn send_raw_transaction(&self, bytes: Value) -> RpcResult<Value> {
        self.forward(ETH_SEND_RAW_TRANSACTION, vec![bytes]).await
    }
}

/// Runs the ETH proxy server on `127.0.0.1:port`; port 0 picks a free one
pub async fn run_server<H: RequestHandler + 'static>(
    handler: H,
    port: u16,
) -> anyhow::Result<(SocketAddr, ServerHandle)> {
    let forwarder = RpcForwarder::new(handler);

    let server = Server::builder().build(format!("127.0.0.1:{port}")).await?;
    let addr = server.local_addr()?;

    let server_handle = server.start(forwarder.into_rpc());

    log::info!("Server started at: {}", addr);

    Ok((addr, server_handle))
}
