pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// general errors
    #[error("illegal state: {0}")]
    IllegalStateError(String),

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("I/O error: {0}")]
    DetailedIoError(String),

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    /// log format errors
    #[error("corrupt batch: {0}")]
    CorruptMessage(String),

    #[error("batch too large: {0}")]
    MessageTooLarge(String),
}

impl AppError {
    /// True when the error marks the decode session as unusable, which is
    /// every format-level error. Transient I/O retries belong to the byte
    /// stream source, never to the decoder.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            AppError::CorruptMessage(_) | AppError::MessageTooLarge(_)
        )
    }
}
