use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed record at byte {offset}: {kind}")]
    MalformedRecord { offset: usize, kind: MalformedKind },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Worker error: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Why a line could not be turned into a record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedKind {
    #[error("missing field delimiter")]
    MissingDelimiter,

    #[error("empty key")]
    EmptyKey,

    #[error("invalid number {0:?}")]
    InvalidNumber(String),
}

impl Error {
    pub(crate) fn malformed(offset: usize, kind: MalformedKind) -> Self {
        Self::MalformedRecord { offset, kind }
    }

    /// True for every malformed-record kind, empty keys included.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedRecord { .. })
    }

    /// Byte offset of the offending line, if this error points at one.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::MalformedRecord { offset, .. } => Some(*offset),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_display_includes_offset() {
        let err = Error::malformed(42, MalformedKind::InvalidNumber("abc".to_string()));
        assert_eq!(
            err.to_string(),
            "Malformed record at byte 42: invalid number \"abc\""
        );
        assert!(err.is_malformed());
        assert_eq!(err.offset(), Some(42));
    }

    #[test]
    fn test_empty_key_is_malformed() {
        let err = Error::malformed(0, MalformedKind::EmptyKey);
        assert!(err.is_malformed());
    }

    #[test]
    fn test_config_error_has_no_offset() {
        let err = Error::Config("bad".to_string());
        assert!(!err.is_malformed());
        assert_eq!(err.offset(), None);
    }
}
