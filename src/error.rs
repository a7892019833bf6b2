// Copyright (c) 2026 rezky_nightky

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RainError>;

#[derive(Debug, Error)]
pub enum RainError {
    #[error("terminal I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{message}")]
    InvalidArgument { message: String },

    #[error("invalid random range: {0}")]
    Range(#[from] rand::distr::uniform::Error),
}

impl RainError {
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RainError;

    #[test]
    fn invalid_keeps_message_verbatim() {
        let err = RainError::invalid("failed to apply --fps 0 (min 1 max 240)");
        assert_eq!(err.to_string(), "failed to apply --fps 0 (min 1 max 240)");
    }

    #[test]
    fn io_errors_convert_with_question_mark() {
        fn fails() -> super::Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))?;
            Ok(())
        }
        let err = fails().unwrap_err();
        assert!(matches!(err, RainError::Io(_)));
        assert!(err.to_string().contains("closed"));
    }
}
