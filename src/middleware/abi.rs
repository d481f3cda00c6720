//! Normalizes the transaction object of the calls that carry one.

use crate::normalize::{normalize_transaction, FormatterRegistry};
use crate::traits::{Middleware, RequestHandler};
use crate::types::{SignerResult, ETH_SEND_TRANSACTION};
use jsonrpsee::core::async_trait;
use serde_json::Value;

pub const ABI_MIDDLEWARE: &str = "abi";

/// Methods whose first parameter is a transaction object
const TRANSACTION_METHODS: &[&str] = &[ETH_SEND_TRANSACTION, "eth_call", "eth_estimateGas"];

#[derive(Debug, Clone, Default)]
pub struct AbiMiddleware {
    registry: FormatterRegistry,
}

impl AbiMiddleware {
    pub fn new(registry: FormatterRegistry) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl Middleware for AbiMiddleware {
    fn name(&self) -> &str {
        ABI_MIDDLEWARE
    }

    async fn handle(
        &self,
        method: &str,
        mut params: Vec<Value>,
        next: &dyn RequestHandler,
    ) -> SignerResult<Value> {
        if TRANSACTION_METHODS.contains(&method) {
            if let Some(Value::Object(transaction)) = params.first_mut() {
                *transaction = normalize_transaction(&self.registry, transaction)?;
            }
        }
        next.request(method, params).await
    }
}
