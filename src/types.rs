//! Primitive types used in the library.

use jsonrpsee::types::ErrorObject;
use serde::{Deserialize, Serialize};

/// Sends a transaction through the node's own signer.
pub const ETH_SEND_TRANSACTION: &str = "eth_sendTransaction";
/// Broadcasts an already signed transaction.
pub const ETH_SEND_RAW_TRANSACTION: &str = "eth_sendRawTransaction";

/// JSON-RPC error code used for errors raised locally by this crate.
pub const LOCAL_ERROR_CODE: i32 = -32603;

/// Result alias used across the crate.
pub type SignerResult<T> = Result<T, SignerError>;

/// General error type for the signer library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum SignerError {
    /// The node answered with a JSON-RPC error object
    #[error("rpc error {code}: {message}")]
    Rpc { code: i32, message: String },
    /// Transport level failure, the request never got an answer
    #[error("transport error: {0}")]
    Transport(String),
    /// A transaction field could not be interpreted
    #[error("invalid `{field}` field: {reason}")]
    InvalidField { field: String, reason: String },
    /// Private key material could not be turned into a signer
    #[error("invalid private key: {0}")]
    InvalidKey(String),
    /// Local signing failed
    #[error("signing failed: {0}")]
    Signing(String),
    /// A middleware with the same name is already part of the stack
    #[error("middleware `{0}` is already in the stack")]
    DuplicateMiddleware(String),
    /// Injection layer past the end of the stack
    #[error("layer {layer} is out of range for a stack of {len}")]
    LayerOutOfRange { layer: usize, len: usize },
    /// Serde related error
    #[error("serde error: {0}")]
    SerdeError(&'static str),
}

impl SignerError {
    pub(crate) fn invalid_field(field: &str, reason: impl Into<String>) -> Self {
        SignerError::InvalidField {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// JSON-RPC error code carried by this error
    pub fn code(&self) -> i32 {
        match self {
            SignerError::Rpc { code, .. } => *code,
            _ => LOCAL_ERROR_CODE,
        }
    }
}

impl From<serde_json::Error> for SignerError {
    fn from(e: serde_json::Error) -> Self {
        log::error!("Serde json error: {:?}", e);
        SignerError::SerdeError("JSON deserialization error")
    }
}

impl From<jsonrpsee::core::ClientError> for SignerError {
    fn from(e: jsonrpsee::core::ClientError) -> Self {
        match e {
            jsonrpsee::core::ClientError::Call(err) => SignerError::Rpc {
                code: err.code(),
                message: err.message().to_string(),
            },
            other => {
                log::error!("jsonrpsee client error: {:?}", other);
                SignerError::Transport(other.to_string())
            }
        }
    }
}

impl From<jsonrpsee::types::ErrorObjectOwned> for SignerError {
    fn from(e: jsonrpsee::types::ErrorObjectOwned) -> Self {
        SignerError::Rpc {
            code: e.code(),
            message: e.message().to_string(),
        }
    }
}

impl From<alloy_signer::Error> for SignerError {
    fn from(e: alloy_signer::Error) -> Self {
        log::error!("signer error: {:?}", e);
        SignerError::Signing(e.to_string())
    }
}

impl From<SignerError> for ErrorObject<'_> {
    fn from(error: SignerError) -> Self {
        match error {
            SignerError::Rpc { code, message } => ErrorObject::owned(code, message, None::<()>),
            SignerError::Transport(msg) => {
                ErrorObject::owned(LOCAL_ERROR_CODE, "Upstream unavailable", Some(msg))
            }
            other => ErrorObject::owned(LOCAL_ERROR_CODE, other.to_string(), None::<()>),
        }
    }
}
