use crate::types::SignerResult;
use jsonrpsee::core::{async_trait, RpcResult};
use jsonrpsee::proc_macros::rpc;
use serde_json::Value;
use std::sync::Arc;

/// Anything that can answer a JSON-RPC call: a transport, a client, or the rest of a
/// middleware chain.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    /// Perform `method` with positional `params`
    async fn request(&self, method: &str, params: Vec<Value>) -> SignerResult<Value>;
}

#[async_trait]
impl<T: RequestHandler + ?Sized> RequestHandler for Arc<T> {
    async fn request(&self, method: &str, params: Vec<Value>) -> SignerResult<Value> {
        (**self).request(method, params).await
    }
}

/// A layer of the request pipeline.
///
/// A middleware may answer a call itself, forward it to `next` unchanged, or replace it
/// with one or more different calls to `next`.
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Unique name of the layer inside a stack
    fn name(&self) -> &str;

    async fn handle(
        &self,
        method: &str,
        params: Vec<Value>,
        next: &dyn RequestHandler,
    ) -> SignerResult<Value>;
}

/// Eth RPC interface served by the signing proxy.
///
/// Parameters are kept as raw JSON so that every address encoding reaches the pipeline
/// exactly as the caller wrote it.
#[rpc(server, client)]
pub trait EthProxyApi {
    // ########################################################################
    // Client
    // ########################################################################

    /// Returns the chain ID used for transaction signing.
    #[method(name = "eth_chainId")]
    async fn chain_id(&self) -> RpcResult<Value>;

    /// Returns the network id.
    #[method(name = "net_version")]
    async fn net_version(&self) -> RpcResult<Value>;

    /// Returns highest block number.
    #[method(name = "eth_blockNumber")]
    async fn block_number(&self) -> RpcResult<Value>;

    /// Returns accounts list.
    #[method(name = "eth_accounts")]
    async fn accounts(&self) -> RpcResult<Value>;

    // ########################################################################
    // State
    // ########################################################################

    /// Returns balance of the given account.
    #[method(name = "eth_getBalance")]
    async fn balance(&self, address: Value, number_or_tag: Option<Value>) -> RpcResult<Value>;

    /// Returns the number of transactions sent from given address at given time (block number).
    #[method(name = "eth_getTransactionCount")]
    async fn transaction_count(
        &self,
        address: Value,
        number_or_tag: Option<Value>,
    ) -> RpcResult<Value>;

    /// Returns transaction receipt by transaction hash.
    #[method(name = "eth_getTransactionReceipt")]
    async fn transaction_receipt(&self, hash: Value) -> RpcResult<Value>;

    // ########################################################################
    // Execute
    // ########################################################################

    /// Call contract, returning the output data.
    #[method(name = "eth_call")]
    async fn call(&self, request: Value, number_or_tag: Option<Value>) -> RpcResult<Value>;

    /// Estimate gas needed for execution of given contract.
    #[method(name = "eth_estimateGas")]
    async fn estimate_gas(&self, request: Value, number_or_tag: Option<Value>)
        -> RpcResult<Value>;

    /// Returns current gas_price.
    #[method(name = "eth_gasPrice")]
    async fn gas_price(&self) -> RpcResult<Value>;

    // ########################################################################
    // Submit
    // ########################################################################

    /// Sends transaction; signed locally when the sender belongs to a local key.
    #[method(name = "eth_sendTransaction")]
    async fn send_transaction(&self, request: Value) -> RpcResult<Value>;

    /// Sends signed transaction, returning its hash.
    #[method(name = "eth_sendRawTransaction")]
    async fn send_raw_transaction(&self, bytes: Value) -> RpcResult<Value>;
}
