use thiserror::Error;

/// Ошибка разбора строки источника соединения.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("empty source string")]
    Empty,

    #[error("unknown network scheme '{0}', expected tcp or unix")]
    UnknownNetwork(String),

    #[error("missing host:port address in source")]
    MissingAddr,

    #[error("invalid value {value:?} for query key {key:?}")]
    InvalidValue { key: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Проверяет текстовое представление ошибок разбора.
    #[test]
    fn test_source_error_display() {
        assert_eq!(SourceError::Empty.to_string(), "empty source string");
        assert_eq!(
            SourceError::UnknownNetwork("udp".into()).to_string(),
            "unknown network scheme 'udp', expected tcp or unix"
        );
        assert_eq!(
            SourceError::InvalidValue {
                key: "db".into(),
                value: "NaN".into(),
            }
            .to_string(),
            "invalid value \"NaN\" for query key \"db\""
        );
    }
}
