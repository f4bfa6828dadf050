//! Error types for the protocol crate.

use thiserror::Error;

/// Protocol error type covering every way a remote call can fail.
///
/// The type is `Clone` so that a single terminal handshake failure can be
/// handed to every caller waiting on session initialization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    // Session setup errors
    /// Required client configuration is missing or unusable.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The remote rejected the handshake or returned incomplete credentials.
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// A caller's wait for session initialization exceeded its budget.
    #[error("operation timed out: {0}")]
    Timeout(String),

    /// A signed call was attempted without session credentials.
    #[error("not initialized: session credentials are unavailable")]
    NotInitialized,

    // Call errors
    /// A call was issued without a method name.
    #[error("a method name is required")]
    MissingMethod,

    /// Network failure, non-200 status or a body that is not JSON.
    #[error("no response: {0}")]
    NoResponse(String),

    /// The remote answered with an error code (for example `badlogin`).
    #[error("remote rejected request: {0}")]
    Rejected(String),

    /// The envelope did not carry the payload the operation expects.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl ProtocolError {
    /// Returns the remote status code for [`ProtocolError::Rejected`].
    pub fn code(&self) -> Option<&str> {
        match self {
            ProtocolError::Rejected(code) => Some(code),
            _ => None,
        }
    }

    /// Whether the remote refused the submitted username/password.
    pub fn is_bad_login(&self) -> bool {
        matches!(self.code(), Some("badlogin") | Some("badlogin_strikes"))
    }
}

/// Result type alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> Self {
        ProtocolError::NoResponse(format!("malformed JSON body: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_display() {
        let err = ProtocolError::Configuration("api_key is empty".to_string());
        assert_eq!(err.to_string(), "configuration error: api_key is empty");
    }

    #[test]
    fn test_handshake_error_display() {
        let err = ProtocolError::Handshake("invalid_clientid".to_string());
        assert_eq!(err.to_string(), "handshake failed: invalid_clientid");
    }

    #[test]
    fn test_timeout_error_display() {
        let err = ProtocolError::Timeout("session not ready after 5s".to_string());
        assert_eq!(
            err.to_string(),
            "operation timed out: session not ready after 5s"
        );
    }

    #[test]
    fn test_rejected_error_display() {
        let err = ProtocolError::Rejected("badlogin".to_string());
        assert_eq!(err.to_string(), "remote rejected request: badlogin");
    }

    #[test]
    fn test_code_only_for_rejected() {
        assert_eq!(
            ProtocolError::Rejected("nopermission_loggedout".to_string()).code(),
            Some("nopermission_loggedout")
        );
        assert_eq!(ProtocolError::NotInitialized.code(), None);
        assert_eq!(ProtocolError::NoResponse("reset".to_string()).code(), None);
    }

    #[test]
    fn test_is_bad_login() {
        assert!(ProtocolError::Rejected("badlogin".to_string()).is_bad_login());
        assert!(ProtocolError::Rejected("badlogin_strikes".to_string()).is_bad_login());
        assert!(!ProtocolError::Rejected("invalidid".to_string()).is_bad_login());
        assert!(!ProtocolError::Handshake("badlogin".to_string()).is_bad_login());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("<html>").unwrap_err();
        let protocol_err: ProtocolError = json_err.into();
        assert!(matches!(protocol_err, ProtocolError::NoResponse(_)));
    }

    #[test]
    fn test_error_is_send_sync_clone() {
        fn assert_traits<T: Send + Sync + Clone>() {}
        assert_traits::<ProtocolError>();
    }
}
