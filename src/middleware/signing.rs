//! Sign-and-send-raw middleware
//!
//! Intercepts `eth_sendTransaction` calls whose sender is controlled by a local key, signs
//! them and submits them as `eth_sendRawTransaction` instead. Calls it cannot sign are
//! forwarded exactly as they came in.

use crate::address::{decode_address, AddressEncoding};
use crate::fill::{fill_nonce, fill_transaction_defaults};
use crate::keys::{AddressMatching, KeyMaterial, KeyRing};
use crate::normalize::{normalize_transaction, FormatterRegistry};
use crate::signing::sign_transaction;
use crate::traits::{Middleware, RequestHandler};
use crate::types::{SignerResult, ETH_SEND_RAW_TRANSACTION, ETH_SEND_TRANSACTION};
use alloy_primitives::hex;
use jsonrpsee::core::async_trait;
use serde_json::Value;

pub const SIGN_AND_SEND_RAW_MIDDLEWARE: &str = "sign_and_send_raw";

/// Build the middleware from one or more private keys, matching senders canonically
pub fn construct_sign_and_send_raw_middleware<I, K>(keys: I) -> SignerResult<SignAndSendRawMiddleware>
where
    I: IntoIterator<Item = K>,
    K: Into<KeyMaterial>,
{
    Ok(SignAndSendRawMiddleware::new(KeyRing::new(keys)?))
}

#[derive(Debug, Clone)]
pub struct SignAndSendRawMiddleware {
    keys: KeyRing,
    matching: AddressMatching,
    registry: FormatterRegistry,
}

impl SignAndSendRawMiddleware {
    pub fn new(keys: KeyRing) -> Self {
        Self {
            keys,
            matching: AddressMatching::Canonical,
            registry: FormatterRegistry::standard(),
        }
    }

    /// Switch the sender matching policy; the normalizer follows the policy
    pub fn with_matching(mut self, matching: AddressMatching) -> Self {
        self.matching = matching;
        self.registry = matching.registry();
        self
    }

    pub fn keys(&self) -> &KeyRing {
        &self.keys
    }

    pub fn matching(&self) -> AddressMatching {
        self.matching
    }

    /// Log a sender that belongs to a local key but was not recognised in its encoding,
    /// returns whether it did
    fn report_missed_sender(&self, from: &Value) -> bool {
        let Some(address) = decode_address(from).filter(|a| self.keys.contains(a)) else {
            return false;
        };
        log::warn!(
            "sender {} belongs to a local key but was not matched in {:?} encoding, \
             forwarding unsigned",
            address,
            AddressEncoding::of(from),
        );
        true
    }
}

#[async_trait]
impl Middleware for SignAndSendRawMiddleware {
    fn name(&self) -> &str {
        SIGN_AND_SEND_RAW_MIDDLEWARE
    }

    async fn handle(
        &self,
        method: &str,
        params: Vec<Value>,
        next: &dyn RequestHandler,
    ) -> SignerResult<Value> {
        if method != ETH_SEND_TRANSACTION {
            return next.request(method, params).await;
        }
        let original = match params.first() {
            Some(Value::Object(original)) => original.clone(),
            _ => return next.request(method, params).await,
        };

        let transaction = fill_nonce(next, original).await?;
        let transaction = fill_transaction_defaults(next, transaction).await?;
        let transaction = normalize_transaction(&self.registry, &transaction)?;

        let Some(from) = transaction.get("from").filter(|from| !from.is_null()) else {
            log::debug!("transaction has no sender, forwarding unsigned");
            return next.request(method, params).await;
        };
        let Some(signer) = self.keys.lookup(from, self.matching) else {
            self.report_missed_sender(from);
            return next.request(method, params).await;
        };

        let raw = sign_transaction(signer, &transaction)?;
        log::info!(
            "signed transaction from {} locally, submitting {} raw bytes",
            signer.address(),
            raw.len()
        );

        next.request(
            ETH_SEND_RAW_TRANSACTION,
            vec![Value::String(hex::encode_prefixed(&raw))],
        )
        .await
    }
}
