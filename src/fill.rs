//! Filling in the transaction fields the caller left out.
//!
//! Both helpers read chain state through the handler they are given, which inside a
//! middleware is the next layer of the pipeline.

use crate::address::decode_address;
use crate::normalize::TxParams;
use crate::traits::RequestHandler;
use crate::types::SignerResult;
use alloy_rpc_types_eth::BlockNumberOrTag;
use serde_json::{json, Value};

fn is_missing(transaction: &TxParams, field: &str) -> bool {
    transaction.get(field).map_or(true, Value::is_null)
}

/// Set `nonce` to the sender's pending transaction count, when there is a sender and no nonce
///
/// The node is always asked with the sender as checksum text, whatever encoding the
/// transaction carries; the transaction itself keeps its `from` as it was.
pub async fn fill_nonce(chain: &dyn RequestHandler, mut transaction: TxParams) -> SignerResult<TxParams> {
    let Some(from) = transaction.get("from").filter(|from| !from.is_null()) else {
        return Ok(transaction);
    };
    if is_missing(&transaction, "nonce") {
        let sender = decode_address(from)
            .map_or_else(|| from.clone(), |address| json!(address.to_checksum(None)));
        let count = chain
            .request(
                "eth_getTransactionCount",
                vec![sender, json!(BlockNumberOrTag::Pending)],
            )
            .await?;
        transaction.insert("nonce".to_string(), count);
    }
    Ok(transaction)
}

/// Fill `value`, `data`, `chainId`, `gas` and the fee field with their defaults
///
/// `gasPrice` is only filled for legacy transactions, i.e. when `maxFeePerGas` is absent.
pub async fn fill_transaction_defaults(
    chain: &dyn RequestHandler,
    mut transaction: TxParams,
) -> SignerResult<TxParams> {
    if is_missing(&transaction, "value") {
        transaction.insert("value".to_string(), json!(0));
    }
    if is_missing(&transaction, "data") {
        transaction.insert("data".to_string(), json!("0x"));
    }
    if is_missing(&transaction, "chainId") {
        let chain_id = chain.request("eth_chainId", vec![]).await?;
        transaction.insert("chainId".to_string(), chain_id);
    }
    if is_missing(&transaction, "gas") {
        let estimate = chain
            .request("eth_estimateGas", vec![Value::Object(transaction.clone())])
            .await?;
        transaction.insert("gas".to_string(), estimate);
    }
    if is_missing(&transaction, "gasPrice") && is_missing(&transaction, "maxFeePerGas") {
        let gas_price = chain.request("eth_gasPrice", vec![]).await?;
        transaction.insert("gasPrice".to_string(), gas_price);
    }
    Ok(transaction)
}
