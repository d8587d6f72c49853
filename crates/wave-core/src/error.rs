use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidInput,
    NotFound,
    Unavailable,
    Internal,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            Self::InvalidInput => "invalid_input",
            Self::NotFound => "not_found",
            Self::Unavailable => "unavailable",
            Self::Internal => "internal",
        };
        write!(f, "{value}")
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WaveError {
    #[error("{code}: {message}")]
    Failure { code: ErrorCode, message: String },

    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
}

impl WaveError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Failure {
            code,
            message: message.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Failure { code, .. } => *code,
            Self::Validation(_) => ErrorCode::InvalidInput,
        }
    }
}

pub type WaveResult<T> = Result<T, WaveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_lists_every_problem() {
        let err = WaveError::Validation(vec!["speed".to_string(), "warming".to_string()]);
        assert_eq!(err.to_string(), "validation failed: speed; warming");
        assert_eq!(err.code(), ErrorCode::InvalidInput);
    }

    #[test]
    fn failure_display_carries_code() {
        let err = WaveError::new(ErrorCode::Unavailable, "area not loaded");
        assert_eq!(err.to_string(), "unavailable: area not loaded");
    }
}
