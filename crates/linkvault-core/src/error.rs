use thiserror::Error;

/// Top-level error type for LinkVault.
///
/// Storage collaborators map their driver errors into `Storage` with enough
/// context to identify the failing call, so the `?` operator works across
/// crate boundaries without leaking driver types.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LinkVaultError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for LinkVaultError {
    fn from(err: toml::de::Error) -> Self {
        LinkVaultError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for LinkVaultError {
    fn from(err: toml::ser::Error) -> Self {
        LinkVaultError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for LinkVaultError {
    fn from(err: serde_json::Error) -> Self {
        LinkVaultError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for LinkVault operations.
pub type Result<T> = std::result::Result<T, LinkVaultError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let cases: Vec<(LinkVaultError, &str)> = vec![
            (
                LinkVaultError::Config("bad ttl".to_string()),
                "Configuration error: bad ttl",
            ),
            (
                LinkVaultError::Storage("database is locked".to_string()),
                "Storage error: database is locked",
            ),
            (
                LinkVaultError::Serialization("invalid json".to_string()),
                "Serialization error: invalid json",
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: LinkVaultError = io_err.into();
        assert!(matches!(err, LinkVaultError::Io(_)));
        assert!(err.to_string().starts_with("I/O error:"));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_error_from_toml_de() {
        let err: std::result::Result<toml::Value, _> = toml::from_str("invalid = [[[");
        let err: LinkVaultError = err.unwrap_err().into();
        assert!(matches!(err, LinkVaultError::Config(_)));
    }

    #[test]
    fn test_error_from_serde_json() {
        let err: std::result::Result<serde_json::Value, _> = serde_json::from_str("{ nope }");
        let err: LinkVaultError = err.unwrap_err().into();
        assert!(matches!(err, LinkVaultError::Serialization(_)));
    }

    #[test]
    fn test_result_type_with_question_mark() {
        fn inner() -> Result<u64> {
            let io_result: std::result::Result<u64, std::io::Error> = Ok(7);
            Ok(io_result? + 1)
        }

        assert_eq!(inner().unwrap(), 8);
    }
}
