//! Local transaction signing
//!
//! Input is a transaction that went through the normalizer, so address fields must be hex
//! text. Anything the normalizer left in another encoding is rejected here.

use crate::address::decode_hex_address;
use crate::normalize::{parse_quantity, TxParams};
use crate::types::{SignerError, SignerResult};
use alloy_consensus::{SignableTransaction, TxEip1559, TxEnvelope, TxLegacy};
use alloy_eips::eip2718::Encodable2718;
use alloy_primitives::{hex, Bytes, TxKind, U256};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use serde_json::Value;

/// Typed transaction ready to be signed
#[derive(Debug, Clone, PartialEq)]
pub enum UnsignedTransaction {
    Legacy(TxLegacy),
    Eip1559(TxEip1559),
}

impl UnsignedTransaction {
    /// Build the typed transaction out of a normalized parameter object
    ///
    /// A `maxFeePerGas` field selects EIP-1559, otherwise the transaction is legacy.
    pub fn from_params(transaction: &TxParams) -> SignerResult<Self> {
        let to = match field(transaction, "to") {
            None => TxKind::Create,
            Some(Value::String(text)) => TxKind::Call(decode_hex_address(text).ok_or_else(
                || SignerError::invalid_field("to", "expected a hex-encoded address"),
            )?),
            Some(_) => {
                return Err(SignerError::invalid_field(
                    "to",
                    "expected a hex-encoded address",
                ))
            }
        };
        let nonce = required_u64(transaction, "nonce")?;
        let gas_limit = required_u64(transaction, "gas")?;
        let value = optional_quantity(transaction, "value")?.unwrap_or(U256::ZERO);
        let input = input_data(transaction)?;
        let chain_id = optional_quantity(transaction, "chainId")?
            .map(|id| narrow::<u64>("chainId", id))
            .transpose()?;

        if let Some(max_fee) = optional_quantity(transaction, "maxFeePerGas")? {
            let max_priority_fee = optional_quantity(transaction, "maxPriorityFeePerGas")?
                .unwrap_or(U256::ZERO);
            let chain_id = chain_id
                .ok_or_else(|| SignerError::invalid_field("chainId", "missing"))?;

            return Ok(UnsignedTransaction::Eip1559(TxEip1559 {
                chain_id,
                nonce,
                gas_limit,
                max_fee_per_gas: narrow("maxFeePerGas", max_fee)?,
                max_priority_fee_per_gas: narrow("maxPriorityFeePerGas", max_priority_fee)?,
                to,
                value,
                access_list: Default::default(),
                input,
            }));
        }

        let gas_price = optional_quantity(transaction, "gasPrice")?
            .ok_or_else(|| SignerError::invalid_field("gasPrice", "missing"))?;

        Ok(UnsignedTransaction::Legacy(TxLegacy {
            chain_id,
            nonce,
            gas_price: narrow("gasPrice", gas_price)?,
            gas_limit,
            to,
            value,
            input,
        }))
    }

    /// Sign and wrap into an envelope
    pub fn sign(self, signer: &PrivateKeySigner) -> SignerResult<TxEnvelope> {
        let envelope = match self {
            UnsignedTransaction::Legacy(tx) => {
                let signature = signer.sign_hash_sync(&tx.signature_hash())?;
                TxEnvelope::from(tx.into_signed(signature))
            }
            UnsignedTransaction::Eip1559(tx) => {
                let signature = signer.sign_hash_sync(&tx.signature_hash())?;
                TxEnvelope::from(tx.into_signed(signature))
            }
        };
        Ok(envelope)
    }
}

/// Sign a normalized transaction and return the EIP-2718 encoded raw payload
pub fn sign_transaction(signer: &PrivateKeySigner, transaction: &TxParams) -> SignerResult<Bytes> {
    let envelope = UnsignedTransaction::from_params(transaction)?.sign(signer)?;
    log::debug!(
        "signed transaction {} for {}",
        envelope.tx_hash(),
        signer.address()
    );
    Ok(envelope.encoded_2718().into())
}

fn field<'a>(transaction: &'a TxParams, name: &str) -> Option<&'a Value> {
    transaction.get(name).filter(|value| !value.is_null())
}

fn optional_quantity(transaction: &TxParams, name: &str) -> SignerResult<Option<U256>> {
    field(transaction, name)
        .map(|value| parse_quantity(name, value))
        .transpose()
}

fn required_u64(transaction: &TxParams, name: &str) -> SignerResult<u64> {
    let value = optional_quantity(transaction, name)?
        .ok_or_else(|| SignerError::invalid_field(name, "missing"))?;
    narrow(name, value)
}

fn narrow<T: TryFrom<U256>>(name: &str, value: U256) -> SignerResult<T> {
    T::try_from(value).map_err(|_| SignerError::invalid_field(name, "value out of range"))
}

fn input_data(transaction: &TxParams) -> SignerResult<Bytes> {
    match field(transaction, "data") {
        None => Ok(Bytes::new()),
        Some(Value::String(text)) => {
            let digits = text
                .strip_prefix("0x")
                .ok_or_else(|| SignerError::invalid_field("data", "missing 0x prefix"))?;
            hex::decode(digits)
                .map(Bytes::from)
                .map_err(|e| SignerError::invalid_field("data", e.to_string()))
        }
        Some(_) => Err(SignerError::invalid_field("data", "expected hex text")),
    }
}
