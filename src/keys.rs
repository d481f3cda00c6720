//! Local key material and sender lookup

use crate::address::decode_address;
use crate::normalize::FormatterRegistry;
use crate::types::{SignerError, SignerResult};
use alloy_primitives::Address;
use alloy_signer_local::PrivateKeySigner;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// A private key in any of the accepted shapes
#[derive(Clone)]
pub enum KeyMaterial {
    /// Ready to use signer
    Signer(PrivateKeySigner),
    /// Hex text, `0x` prefix optional
    Hex(String),
    /// 32 raw bytes
    Bytes(Vec<u8>),
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // never print the secret itself
        match self {
            KeyMaterial::Signer(signer) => write!(f, "Signer({})", signer.address()),
            KeyMaterial::Hex(_) => f.write_str("Hex(..)"),
            KeyMaterial::Bytes(_) => f.write_str("Bytes(..)"),
        }
    }
}

impl KeyMaterial {
    /// Turn the key material into a signer
    pub fn into_signer(self) -> SignerResult<PrivateKeySigner> {
        match self {
            KeyMaterial::Signer(signer) => Ok(signer),
            KeyMaterial::Hex(text) => text
                .trim()
                .parse::<PrivateKeySigner>()
                .map_err(|e| SignerError::InvalidKey(e.to_string())),
            KeyMaterial::Bytes(raw) => {
                PrivateKeySigner::from_slice(&raw).map_err(|e| SignerError::InvalidKey(e.to_string()))
            }
        }
    }
}

impl From<PrivateKeySigner> for KeyMaterial {
    fn from(signer: PrivateKeySigner) -> Self {
        KeyMaterial::Signer(signer)
    }
}

impl From<&str> for KeyMaterial {
    fn from(text: &str) -> Self {
        KeyMaterial::Hex(text.to_string())
    }
}

impl From<String> for KeyMaterial {
    fn from(text: String) -> Self {
        KeyMaterial::Hex(text)
    }
}

impl From<Vec<u8>> for KeyMaterial {
    fn from(raw: Vec<u8>) -> Self {
        KeyMaterial::Bytes(raw)
    }
}

impl From<[u8; 32]> for KeyMaterial {
    fn from(raw: [u8; 32]) -> Self {
        KeyMaterial::Bytes(raw.to_vec())
    }
}

/// How a transaction sender is compared against the local keys
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum AddressMatching {
    /// Decode the sender in any encoding and compare the 20 address bytes
    #[default]
    Canonical,
    /// Compare the sender text against the checksummed key addresses, byte-encoded senders
    /// never match
    Verbatim,
}

impl AddressMatching {
    /// Normalizer that goes with the policy
    pub fn registry(&self) -> FormatterRegistry {
        match self {
            AddressMatching::Canonical => FormatterRegistry::standard(),
            AddressMatching::Verbatim => FormatterRegistry::text_only(),
        }
    }
}

/// Signers indexed by the address they control
#[derive(Clone, Default)]
pub struct KeyRing {
    signers: HashMap<Address, PrivateKeySigner>,
    checksummed: HashMap<String, Address>,
}

impl std::fmt::Debug for KeyRing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyRing")
            .field("addresses", &self.addresses())
            .finish()
    }
}

impl KeyRing {
    /// Build the ring from any number of keys; keys controlling the same address collapse
    pub fn new<I, K>(keys: I) -> SignerResult<Self>
    where
        I: IntoIterator<Item = K>,
        K: Into<KeyMaterial>,
    {
        let mut ring = KeyRing::default();
        for key in keys {
            let signer = key.into().into_signer()?;
            let address = signer.address();
            ring.checksummed.insert(address.to_checksum(None), address);
            ring.signers.insert(address, signer);
        }
        Ok(ring)
    }

    /// Ring holding a single key
    pub fn single(key: impl Into<KeyMaterial>) -> SignerResult<Self> {
        Self::new([key.into()])
    }

    /// Addresses controlled by the ring, sorted
    pub fn addresses(&self) -> Vec<Address> {
        let mut addresses: Vec<Address> = self.signers.keys().copied().collect();
        addresses.sort();
        addresses
    }

    pub fn len(&self) -> usize {
        self.signers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signers.is_empty()
    }

    /// Whether the ring controls the given address
    pub fn contains(&self, address: &Address) -> bool {
        self.signers.contains_key(address)
    }

    /// Find the signer for a sender value
    pub fn lookup(&self, from: &Value, matching: AddressMatching) -> Option<&PrivateKeySigner> {
        let address = match matching {
            AddressMatching::Canonical => decode_address(from)?,
            AddressMatching::Verbatim => *self.checksummed.get(from.as_str()?)?,
        };
        self.signers.get(&address)
    }
}
