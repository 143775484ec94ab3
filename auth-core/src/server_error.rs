//! Error codes the server may report in a type-256 reply.

use std::fmt;

/// Message used for codes outside the known table.
pub const UNKNOWN_ERROR_CODE: &str = "unknown error code";

/// Known server error codes (1..=5).
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerErrorKind {
    InvalidMessageCode = 1,
    IncorrectMessageLength = 2,
    InvalidParameter = 3,
    InvalidSingleToken = 4,
    AsciiDecodeError = 5,
}

impl ServerErrorKind {
    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            1 => Some(Self::InvalidMessageCode),
            2 => Some(Self::IncorrectMessageLength),
            3 => Some(Self::InvalidParameter),
            4 => Some(Self::InvalidSingleToken),
            5 => Some(Self::AsciiDecodeError),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidMessageCode => "INVALID_MESSAGE_CODE",
            Self::IncorrectMessageLength => "INCORRECT_MESSAGE_LENGTH",
            Self::InvalidParameter => "INVALID_PARAMETER",
            Self::InvalidSingleToken => "INVALID_SINGLE_TOKEN",
            Self::AsciiDecodeError => "ASCII_DECODE_ERROR",
        }
    }
}

/// Human-readable name for a server error code.
pub fn message_for(code: i16) -> &'static str {
    ServerErrorKind::from_code(code)
        .map(ServerErrorKind::as_str)
        .unwrap_or(UNKNOWN_ERROR_CODE)
}

/// A failure the server reported explicitly. Never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerError {
    pub code: i16,
    pub message: &'static str,
}

impl ServerError {
    pub fn from_code(code: i16) -> Self {
        Self {
            code,
            message: message_for(code),
        }
    }
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ServerError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes() {
        assert_eq!(message_for(1), "INVALID_MESSAGE_CODE");
        assert_eq!(message_for(2), "INCORRECT_MESSAGE_LENGTH");
        assert_eq!(message_for(3), "INVALID_PARAMETER");
        assert_eq!(message_for(4), "INVALID_SINGLE_TOKEN");
        assert_eq!(message_for(5), "ASCII_DECODE_ERROR");
    }

    #[test]
    fn unknown_codes() {
        for code in [0, 6, -1, 256, i16::MAX] {
            assert_eq!(message_for(code), UNKNOWN_ERROR_CODE);
        }
    }

    #[test]
    fn display_includes_code() {
        let err = ServerError::from_code(3);
        assert_eq!(
            ServerErrorKind::from_code(err.code),
            Some(ServerErrorKind::InvalidParameter)
        );
        assert_eq!(err.to_string(), "[3] INVALID_PARAMETER");
    }
}
