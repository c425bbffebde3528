//! Error types for the mint scanner

use thiserror::Error;

/// Result type alias using our custom Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the mint scanner
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    // RPC errors
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("RPC timeout after {0}ms")]
    RpcTimeout(u64),

    // Notification errors
    #[error("Notification delivery failed: {0}")]
    Notification(String),

    #[error("Notification rejected: {0}")]
    NotificationRejected(String),

    // Stats store errors
    #[error("Stats persistence failed: {0}")]
    StatsPersistence(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    // Generic errors
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Check if this error is retryable (transient)
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Rpc(_) | Error::RpcTimeout(_) | Error::Notification(_)
        )
    }
}

// Conversion from solana_client errors
impl From<solana_client::client_error::ClientError> for Error {
    fn from(e: solana_client::client_error::ClientError) -> Self {
        Error::Rpc(e.to_string())
    }
}

// Conversion from serde_json errors
impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

// Conversion from I/O errors
impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

impl From<solana_sdk::pubkey::ParsePubkeyError> for Error {
    fn from(e: solana_sdk::pubkey::ParsePubkeyError) -> Self {
        Error::InvalidAddress(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(Error::Rpc("connection reset".into()).is_retryable());
        assert!(Error::RpcTimeout(5000).is_retryable());
        assert!(Error::Notification("502".into()).is_retryable());
        assert!(!Error::NotificationRejected("chat not found".into()).is_retryable());
        assert!(!Error::InvalidAddress("xyz".into()).is_retryable());
    }

    #[test]
    fn test_display() {
        assert_eq!(Error::RpcTimeout(250).to_string(), "RPC timeout after 250ms");
    }
}
