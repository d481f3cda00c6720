//! # rawtx-signer
//!
//! Local signing for Ethereum JSON-RPC clients.
//!
//! A [`SignAndSendRawMiddleware`] sits in a client's request pipeline and intercepts
//! `eth_sendTransaction`. When the sender is controlled by one of its private keys it fills the
//! nonce and default fields, normalizes the transaction, signs it locally and submits it as
//! `eth_sendRawTransaction`. Everything else passes through untouched.
//!
//! ## Address encodings
//!
//! Addresses may arrive as hex text or as raw bytes. With [`AddressMatching::Canonical`] both
//! are recognised. [`AddressMatching::Verbatim`] keeps the older behaviour where only hex text
//! senders are matched and byte-encoded ones silently fall through to the node unsigned.

pub mod address;
pub mod command;
pub mod fill;
pub mod keys;
pub mod middleware;
pub mod normalize;
pub mod server;
pub mod signing;
pub mod traits;
pub mod transport;
pub mod types;

#[cfg(test)]
mod mock;

pub use keys::{AddressMatching, KeyMaterial, KeyRing};
pub use middleware::{
    construct_sign_and_send_raw_middleware, AbiMiddleware, Client, MiddlewareStack, Placement,
    SignAndSendRawMiddleware,
};
pub use normalize::{normalize_transaction, FormatterRegistry, TxParams};
pub use traits::{Middleware, RequestHandler};
pub use transport::HttpTransport;
pub use types::{SignerError, SignerResult};
