//! Layered request pipeline
//!
//! A [`MiddlewareStack`] is an ordered list of [`Middleware`]s in front of a transport.
//! Calls enter at the outermost layer; layer 0 is the innermost one, right next to the
//! transport.

use crate::normalize::FormatterRegistry;
use crate::traits::{Middleware, RequestHandler};
use crate::types::{SignerError, SignerResult, ETH_SEND_TRANSACTION};
use alloy_primitives::{Address, Bytes, B256, U64};
use jsonrpsee::core::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

pub mod abi;
pub mod signing;

pub use abi::AbiMiddleware;
pub use signing::{construct_sign_and_send_raw_middleware, SignAndSendRawMiddleware};

/// Where a middleware goes in the stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// In front of every other layer
    Outermost,
    /// At the given layer, counted from the innermost side
    Layer(usize),
}

/// Ordered middlewares; index 0 of `layers` is the outermost one
#[derive(Clone, Default)]
pub struct MiddlewareStack {
    layers: Vec<Arc<dyn Middleware>>,
}

impl std::fmt::Debug for MiddlewareStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl MiddlewareStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Layer names, outermost first
    pub fn names(&self) -> Vec<&str> {
        self.layers.iter().map(|layer| layer.name()).collect()
    }

    /// Add the middleware as the outermost layer
    pub fn add(&mut self, middleware: impl Middleware + 'static) -> SignerResult<()> {
        self.insert(Arc::new(middleware), Placement::Outermost)
    }

    /// Inject the middleware at `layer`, where 0 is the innermost position
    pub fn inject(&mut self, middleware: impl Middleware + 'static, layer: usize) -> SignerResult<()> {
        self.insert(Arc::new(middleware), Placement::Layer(layer))
    }

    /// Insert an already shared middleware at the given placement
    pub fn insert(&mut self, middleware: Arc<dyn Middleware>, placement: Placement) -> SignerResult<()> {
        if self.names().contains(&middleware.name()) {
            return Err(SignerError::DuplicateMiddleware(middleware.name().to_string()));
        }
        let index = match placement {
            Placement::Outermost => 0,
            Placement::Layer(layer) => {
                if layer > self.layers.len() {
                    return Err(SignerError::LayerOutOfRange {
                        layer,
                        len: self.layers.len(),
                    });
                }
                self.layers.len() - layer
            }
        };
        log::debug!("middleware `{}` placed at index {}", middleware.name(), index);
        self.layers.insert(index, middleware);
        Ok(())
    }

    /// Remove the named middleware, returns whether it was there
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.layers.len();
        self.layers.retain(|layer| layer.name() != name);
        before != self.layers.len()
    }
}

/// The remainder of a chain: the layers still to run and the transport behind them
struct Next<'a> {
    layers: &'a [Arc<dyn Middleware>],
    transport: &'a dyn RequestHandler,
}

#[async_trait]
impl<'a> RequestHandler for Next<'a> {
    async fn request(&self, method: &str, params: Vec<Value>) -> SignerResult<Value> {
        match self.layers.split_first() {
            Some((layer, rest)) => {
                let next = Next {
                    layers: rest,
                    transport: self.transport,
                };
                layer.handle(method, params, &next).await
            }
            None => self.transport.request(method, params).await,
        }
    }
}

/// JSON-RPC client: a middleware stack in front of a transport
#[derive(Clone)]
pub struct Client {
    stack: MiddlewareStack,
    transport: Arc<dyn RequestHandler>,
}

impl Client {
    /// Client with the default stack, which normalizes transaction parameters
    pub fn new(transport: Arc<dyn RequestHandler>, registry: FormatterRegistry) -> Self {
        let mut client = Self::bare(transport);
        client.stack.layers.push(Arc::new(AbiMiddleware::new(registry)));
        client
    }

    /// Client without any middleware
    pub fn bare(transport: Arc<dyn RequestHandler>) -> Self {
        Self {
            stack: MiddlewareStack::new(),
            transport,
        }
    }

    pub fn stack(&self) -> &MiddlewareStack {
        &self.stack
    }

    pub fn stack_mut(&mut self) -> &mut MiddlewareStack {
        &mut self.stack
    }

    async fn typed<T: DeserializeOwned>(&self, method: &str, params: Vec<Value>) -> SignerResult<T> {
        let value = self.request(method, params).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Send a transaction, returns its hash
    pub async fn send_transaction(&self, transaction: Value) -> SignerResult<B256> {
        self.typed(ETH_SEND_TRANSACTION, vec![transaction]).await
    }

    /// Execute a call against the latest block
    pub async fn call(&self, transaction: Value) -> SignerResult<Bytes> {
        self.typed("eth_call", vec![transaction, Value::from("latest")])
            .await
    }

    pub async fn chain_id(&self) -> SignerResult<u64> {
        let id: U64 = self.typed("eth_chainId", vec![]).await?;
        Ok(id.to())
    }

    pub async fn accounts(&self) -> SignerResult<Vec<Address>> {
        self.typed("eth_accounts", vec![]).await
    }
}

#[async_trait]
impl RequestHandler for Client {
    async fn request(&self, method: &str, params: Vec<Value>) -> SignerResult<Value> {
        let chain = Next {
            layers: &self.stack.layers,
            transport: self.transport.as_ref(),
        };
        chain.request(method, params).await
    }
}
