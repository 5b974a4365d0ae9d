use thiserror::Error;

/// Ошибка операций клиента хранилища.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("connection is closed")]
    ConnectionClosed,

    #[error("failed to connect to {address}: {reason}")]
    ConnectionFailed { address: String, reason: String },

    #[error("server error: {message}")]
    Server { message: String },

    #[error("subscription lost")]
    SubscriptionLost,
}

pub type StoreResult<T> = Result<T, StoreError>;
