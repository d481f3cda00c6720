//! Transaction normalization
//!
//! Every known transaction field has an ABI type, and every ABI type has a formatter which
//! rewrites the value into its canonical form. Formatters are fixpoints on their own output,
//! which keeps [`normalize_transaction`] idempotent.

use crate::address::{bytes_from_json, decode_hex_address};
use crate::types::{SignerError, SignerResult};
use alloy_primitives::{hex, U256};
use serde_json::{Map, Value};

/// Transaction parameters as they travel through the pipeline
pub type TxParams = Map<String, Value>;

/// ABI types of the transaction fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbiType {
    Address,
    Uint,
    Bytes,
}

/// ABI of the `eth_sendTransaction` parameter object
pub const TRANSACTION_PARAMS_ABI: &[(&str, AbiType)] = &[
    ("from", AbiType::Address),
    ("to", AbiType::Address),
    ("gas", AbiType::Uint),
    ("gasPrice", AbiType::Uint),
    ("maxFeePerGas", AbiType::Uint),
    ("maxPriorityFeePerGas", AbiType::Uint),
    ("value", AbiType::Uint),
    ("data", AbiType::Bytes),
    ("nonce", AbiType::Uint),
    ("chainId", AbiType::Uint),
];

/// Rewrites one field value into canonical form
pub type Formatter = fn(field: &str, value: &Value) -> SignerResult<Value>;

/// Per ABI type formatters
#[derive(Debug, Clone, Copy)]
pub struct FormatterRegistry {
    name: &'static str,
    address: Formatter,
    uint: Formatter,
    bytes: Formatter,
}

impl Default for FormatterRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl FormatterRegistry {
    /// Formatters that accept every address encoding
    pub fn standard() -> Self {
        Self {
            name: "standard",
            address: address_to_checksum,
            uint: int_to_hex,
            bytes: bytes_to_hex,
        }
    }

    /// Formatters that only recognise hex text addresses and leave raw byte addresses alone
    pub fn text_only() -> Self {
        Self {
            name: "text_only",
            address: hex_address_to_checksum,
            uint: int_to_hex,
            bytes: bytes_to_hex,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Format a single value of the given ABI type
    pub fn format(&self, abi_type: AbiType, field: &str, value: &Value) -> SignerResult<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        let formatter = match abi_type {
            AbiType::Address => self.address,
            AbiType::Uint => self.uint,
            AbiType::Bytes => self.bytes,
        };
        formatter(field, value)
    }
}

/// ABI type of a transaction field, `None` for fields outside the ABI
pub fn abi_type_of(field: &str) -> Option<AbiType> {
    TRANSACTION_PARAMS_ABI
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, abi_type)| *abi_type)
}

/// Apply the registry's formatters to every known field of the transaction
///
/// Missing fields stay missing and unknown fields are copied as they are.
pub fn normalize_transaction(
    registry: &FormatterRegistry,
    transaction: &TxParams,
) -> SignerResult<TxParams> {
    transaction
        .iter()
        .map(|(field, value)| {
            let value = match abi_type_of(field) {
                Some(abi_type) => registry.format(abi_type, field, value)?,
                None => value.clone(),
            };
            Ok((field.clone(), value))
        })
        .collect()
}

fn address_to_checksum(field: &str, value: &Value) -> SignerResult<Value> {
    match value {
        Value::String(_) => hex_address_to_checksum(field, value),
        Value::Array(_) => {
            let raw = bytes_from_json(value)
                .ok_or_else(|| SignerError::invalid_field(field, "expected a byte array"))?;
            if raw.len() != 20 {
                return Err(SignerError::invalid_field(
                    field,
                    format!("expected 20 address bytes, got {}", raw.len()),
                ));
            }
            Ok(Value::String(
                alloy_primitives::Address::from_slice(&raw).to_checksum(None),
            ))
        }
        _ => Err(SignerError::invalid_field(field, "expected an address")),
    }
}

fn hex_address_to_checksum(field: &str, value: &Value) -> SignerResult<Value> {
    match value {
        Value::String(text) => decode_hex_address(text)
            .map(|address| Value::String(address.to_checksum(None)))
            .ok_or_else(|| SignerError::invalid_field(field, "expected a hex-encoded address")),
        // not an encoding this formatter knows about
        Value::Array(_) => Ok(value.clone()),
        _ => Err(SignerError::invalid_field(field, "expected an address")),
    }
}

fn int_to_hex(field: &str, value: &Value) -> SignerResult<Value> {
    let number = parse_quantity(field, value)?;
    Ok(Value::String(format!("0x{:x}", number)))
}

fn bytes_to_hex(field: &str, value: &Value) -> SignerResult<Value> {
    let raw = match value {
        Value::String(text) => {
            let digits = text
                .strip_prefix("0x")
                .ok_or_else(|| SignerError::invalid_field(field, "missing 0x prefix"))?;
            hex::decode(digits).map_err(|e| SignerError::invalid_field(field, e.to_string()))?
        }
        Value::Array(_) => bytes_from_json(value)
            .ok_or_else(|| SignerError::invalid_field(field, "expected a byte array"))?,
        _ => return Err(SignerError::invalid_field(field, "expected bytes")),
    };
    Ok(Value::String(hex::encode_prefixed(raw)))
}

/// Read a JSON number or `0x` hex text as an unsigned integer
///
/// JSON numbers past `u64::MAX` arrive as `f64` and are taken as the exact integer that float
/// holds. Values that need more than 53 significant bits belong in hex text.
pub fn parse_quantity(field: &str, value: &Value) -> SignerResult<U256> {
    match value {
        Value::Number(number) => match number.as_u64() {
            Some(small) => Ok(U256::from(small)),
            None => number
                .as_f64()
                .and_then(integral_f64)
                .ok_or_else(|| SignerError::invalid_field(field, "expected an unsigned integer")),
        },
        Value::String(text) => {
            let digits = text
                .strip_prefix("0x")
                .filter(|digits| !digits.is_empty())
                .ok_or_else(|| SignerError::invalid_field(field, "expected a 0x quantity"))?;
            U256::from_str_radix(digits, 16)
                .map_err(|e| SignerError::invalid_field(field, e.to_string()))
        }
        _ => Err(SignerError::invalid_field(field, "expected a quantity")),
    }
}

/// The unsigned integer an integral `f64` holds, `None` for fractions, negatives and values
/// past 256 bits
fn integral_f64(value: f64) -> Option<U256> {
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 {
        return None;
    }
    if value == 0.0 {
        return Some(U256::ZERO);
    }
    let bits = value.to_bits();
    let exponent = ((bits >> 52) & 0x7ff) as i64 - 1075;
    let mantissa = (bits & ((1u64 << 52) - 1)) | (1u64 << 52);
    if exponent < 0 {
        return Some(U256::from(mantissa >> -exponent));
    }
    U256::from(mantissa).checked_shl(exponent as usize)
}
