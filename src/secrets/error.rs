//! Error types for secret store reads.

use thiserror::Error;

use super::path::SecretKind;

/// Result type for secret store operations.
pub type Result<T> = std::result::Result<T, SecretsError>;

/// Failure reported by a secret store backend for a single read.
///
/// Backends classify their native errors into these variants so the rest of
/// the crate never sees SDK-specific types.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The secret does not exist at the requested path.
    #[error("secret not found")]
    NotFound,

    /// The caller is not allowed to read the secret (auth, policy, KMS).
    #[error("access denied: {message}")]
    AccessDenied { message: String },

    /// The store rejected the call because of rate limiting.
    #[error("request throttled: {message}")]
    Throttled { message: String },

    /// The store could not be reached (DNS, TLS, timeouts, 5xx).
    #[error("store unavailable: {message}")]
    Unavailable { message: String },

    /// Anything else the backend reported.
    #[error("backend error: {message}")]
    Backend { message: String },
}

impl StoreError {
    pub fn access_denied(message: impl Into<String>) -> Self {
        Self::AccessDenied { message: message.into() }
    }

    pub fn throttled(message: impl Into<String>) -> Self {
        Self::Throttled { message: message.into() }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable { message: message.into() }
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend { message: message.into() }
    }
}

/// Errors produced while building secret paths or reading secrets.
#[derive(Error, Debug)]
pub enum SecretsError {
    /// A path was requested without the arguments its kind requires.
    #[error("invalid template arguments for {kind} secret: missing {missing}")]
    InvalidTemplateArgs { kind: SecretKind, missing: &'static str },

    /// A configured path template is missing or misuses a placeholder.
    #[error("invalid {kind} path template '{template}': {reason}")]
    InvalidTemplate { kind: SecretKind, template: String, reason: String },

    /// The store call failed.
    #[error("failed to fetch secret '{path}': {source}")]
    Fetch {
        path: String,
        #[source]
        source: StoreError,
    },

    /// The store returned a value that is not the expected JSON document.
    ///
    /// Only the category and position of the serde_json error are kept; its
    /// message can quote the offending value, which may be the password.
    #[error("failed to decode secret '{path}': {category} error at line {line} column {column}")]
    Decode { path: String, category: &'static str, line: usize, column: usize },
}

impl SecretsError {
    pub fn fetch(path: impl Into<String>, source: StoreError) -> Self {
        Self::Fetch { path: path.into(), source }
    }

    pub fn decode(path: impl Into<String>, source: serde_json::Error) -> Self {
        let category = match source.classify() {
            serde_json::error::Category::Io => "io",
            serde_json::error::Category::Syntax => "syntax",
            serde_json::error::Category::Data => "data",
            serde_json::error::Category::Eof => "eof",
        };
        Self::Decode { path: path.into(), category, line: source.line(), column: source.column() }
    }

    pub fn invalid_template(
        kind: SecretKind,
        template: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidTemplate { kind, template: template.into(), reason: reason.into() }
    }

    /// Path of the secret involved, when the error came from a store read.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Fetch { path, .. } | Self::Decode { path, .. } => Some(path),
            Self::InvalidTemplateArgs { .. } | Self::InvalidTemplate { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_carries_path() {
        let err = SecretsError::fetch("mysql/dev/active-user", StoreError::NotFound);
        assert_eq!(err.path(), Some("mysql/dev/active-user"));
        assert_eq!(
            err.to_string(),
            "failed to fetch secret 'mysql/dev/active-user': secret not found"
        );
    }

    #[test]
    fn test_decode_error_display() {
        let source = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err = SecretsError::decode("mysql/dev/user-one", source);
        assert!(err.to_string().starts_with("failed to decode secret 'mysql/dev/user-one'"));
        assert!(matches!(err, SecretsError::Decode { category: "syntax", line: 1, .. }));
    }

    #[test]
    fn test_decode_error_omits_offending_value() {
        #[derive(Debug, serde::Deserialize)]
        #[allow(dead_code)]
        struct Credential {
            password: String,
        }

        let source =
            serde_json::from_str::<Credential>(r#"{"password": 918273645}"#).unwrap_err();
        assert!(source.to_string().contains("918273645"));

        let err = SecretsError::decode("mysql/dev/user-one", source);
        let message = err.to_string();
        assert!(!message.contains("918273645"), "{}", message);
        assert!(!format!("{:?}", err).contains("918273645"));
        assert_eq!(
            message,
            "failed to decode secret 'mysql/dev/user-one': data error at line 1 column 22"
        );
    }

    #[test]
    fn test_template_args_error_has_no_path() {
        let err =
            SecretsError::InvalidTemplateArgs { kind: SecretKind::Credential, missing: "slot" };
        assert!(err.path().is_none());
        assert_eq!(
            err.to_string(),
            "invalid template arguments for credential secret: missing slot"
        );
    }
}
