use ndef_types::TransportError;

use crate::{config::BridgeMode, native::NativeMethod};

/// Errors surfaced to the application by bridge operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, uniffi::Error)]
#[uniffi(flat_error)]
pub enum BridgeError {
    /// Failure reported by the native layer, relayed verbatim
    #[error("{0}")]
    Native(String),

    #[error("native layer dropped the {method} reply without answering")]
    ReplyDropped { method: NativeMethod },

    #[error("malformed {method} payload: {error}")]
    Malformed { method: NativeMethod, error: String },

    #[error("unable to encode arguments: {0}")]
    Encode(String),

    #[error("{method} is not available in {mode} mode")]
    Unsupported { method: NativeMethod, mode: BridgeMode },
}

pub type Result<T, E = BridgeError> = std::result::Result<T, E>;

impl BridgeError {
    pub(crate) fn malformed(method: NativeMethod, error: impl ToString) -> Self {
        Self::Malformed {
            method,
            error: error.to_string(),
        }
    }

    /// The message the native layer reported, if this error came from it
    pub fn native_message(&self) -> Option<&str> {
        match self {
            BridgeError::Native(message) => Some(message),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(error: serde_json::Error) -> Self {
        BridgeError::Encode(error.to_string())
    }
}

pub(crate) trait TransportResultExt<T> {
    fn for_method(self, method: NativeMethod) -> Result<T>;
}

impl<T> TransportResultExt<T> for std::result::Result<T, TransportError> {
    fn for_method(self, method: NativeMethod) -> Result<T> {
        self.map_err(|error| BridgeError::malformed(method, error))
    }
}
