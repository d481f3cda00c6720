//! Address encodings accepted on the wire.
//!
//! An address can reach the pipeline either as hex text (`"0x2c75..."`, any case) or as
//! raw bytes, which in JSON is an array of 20 integers. Both denote the same account.

use alloy_primitives::Address;
use serde_json::Value;
use std::str::FromStr;

const ADDRESS_LEN: usize = 20;

/// How an address is written in a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressEncoding {
    /// Hex text
    Hex,
    /// Raw byte array
    Bytes,
}

impl AddressEncoding {
    /// Detect the encoding of the given value, `None` if it is neither
    pub fn of(value: &Value) -> Option<Self> {
        match value {
            Value::String(_) => Some(AddressEncoding::Hex),
            Value::Array(_) => Some(AddressEncoding::Bytes),
            _ => None,
        }
    }

    /// Write the address in this encoding
    pub fn encode(&self, address: Address) -> Value {
        match self {
            AddressEncoding::Hex => Value::String(address.to_checksum(None)),
            AddressEncoding::Bytes => bytes_to_json(address.as_slice()),
        }
    }
}

/// Decode an address written in any of the supported encodings
pub fn decode_address(value: &Value) -> Option<Address> {
    match value {
        Value::String(text) => decode_hex_address(text),
        Value::Array(_) => {
            let raw = bytes_from_json(value)?;
            (raw.len() == ADDRESS_LEN).then(|| Address::from_slice(&raw))
        }
        _ => None,
    }
}

/// Decode a hex text address; the `0x` prefix is mandatory
pub fn decode_hex_address(text: &str) -> Option<Address> {
    if !text.starts_with("0x") {
        return None;
    }
    Address::from_str(text).ok()
}

/// Read a JSON array of integers in `0..=255` as bytes
pub(crate) fn bytes_from_json(value: &Value) -> Option<Vec<u8>> {
    value
        .as_array()?
        .iter()
        .map(|item| item.as_u64().and_then(|b| u8::try_from(b).ok()))
        .collect()
}

/// Write bytes as a JSON array of integers
pub(crate) fn bytes_to_json(raw: &[u8]) -> Value {
    Value::Array(raw.iter().map(|b| Value::from(*b)).collect())
}
