//! Interpretation of the status codes embedded in response envelopes.
//!
//! The remote answers every well-formed request with HTTP 200 and reports
//! the outcome under `response.errormessage`. Some of those codes are not
//! errors at all: a successful login answers `redirect_login`, a successful
//! logout answers `cookieclear`. Which codes mean success is fixed per
//! operation by [`Operation::success_codes`].

use serde_json::Value;

use crate::error::{ProtocolError, Result};

/// Extracts the primary status code from an envelope.
///
/// Returns `None` when the envelope carries no `response.errormessage`
/// or an empty one.
/// When the remote sends a list (the code followed by phrase arguments),
/// only the first element is meaningful.
pub fn extract_error(envelope: &Value) -> Option<String> {
    let message = envelope.get("response")?.get("errormessage")?;
    let primary = match message {
        Value::Array(items) => items.first()?,
        other => other,
    };
    match primary {
        Value::String(code) if code.is_empty() => None,
        Value::String(code) => Some(code.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Operations whose envelopes carry a status code with a known meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `login_login`.
    Login,
    /// `login_logout`.
    Logout,
    /// `newthread_postthread`.
    NewThread,
    /// `newreply_postreply`.
    NewPost,
    /// `editpost_updatepost`.
    EditPost,
    /// `editpost_deletepost`.
    DeletePost,
    /// `inlinemod_close`.
    CloseThread,
    /// `inlinemod_open`.
    OpenThread,
    /// `inlinemod_dodeletethreads`.
    DeleteThread,
    /// `private_insertpm`.
    SendMessage,
    /// `private_confirmemptyfolder`.
    EmptyFolder,
    /// Read-only calls: any code is a failure.
    Read,
}

impl Operation {
    /// Codes that denote success for this operation.
    pub fn success_codes(&self) -> &'static [&'static str] {
        match self {
            Operation::Login => &["redirect_login"],
            Operation::Logout => &["cookieclear"],
            Operation::NewThread | Operation::NewPost => &["redirect_postthanks"],
            Operation::EditPost => &["redirect_editthanks"],
            Operation::DeletePost => &["redirect_deletepost"],
            Operation::CloseThread => &["redirect_inline_closed"],
            Operation::OpenThread => &["redirect_inline_opened"],
            Operation::DeleteThread => &["redirect_inline_deleted"],
            Operation::SendMessage => &["pm_messagesent"],
            Operation::EmptyFolder => &["pm_messagesdeleted"],
            Operation::Read => &[],
        }
    }

    /// Whether the remote must acknowledge success with one of the
    /// success codes; for these operations a missing code is a failure.
    pub fn requires_acknowledgement(&self) -> bool {
        matches!(self, Operation::SendMessage)
    }

    /// Classifies an envelope for this operation.
    pub fn classify(&self, envelope: &Value) -> Status {
        match extract_error(envelope) {
            None => Status::Clear,
            Some(code) if self.success_codes().contains(&code.as_str()) => {
                Status::Recoverable(code)
            }
            Some(code) => Status::Failure(code),
        }
    }

    /// Classifies an envelope and converts failures into errors.
    ///
    /// Returns the success code when the remote sent one.
    pub fn check(&self, envelope: &Value) -> Result<Option<String>> {
        match self.classify(envelope) {
            Status::Clear if self.requires_acknowledgement() => Err(
                ProtocolError::UnexpectedResponse(format!("{:?} was not acknowledged", self)),
            ),
            Status::Clear => Ok(None),
            Status::Recoverable(code) => Ok(Some(code)),
            Status::Failure(code) => Err(ProtocolError::Rejected(code)),
        }
    }
}

/// Tagged interpretation of an envelope's status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// No status code present.
    Clear,
    /// A code that looks like an error but denotes success.
    Recoverable(String),
    /// A genuine failure code.
    Failure(String),
}

impl Status {
    /// Whether the envelope denotes success.
    pub fn is_success(&self) -> bool {
        !matches!(self, Status::Failure(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_error_empty_code_is_absent() {
        assert_eq!(extract_error(&json!({"response": {"errormessage": ""}})), None);
        assert_eq!(extract_error(&json!({"response": {"errormessage": [""]}})), None);
        assert_eq!(extract_error(&json!({"response": {"errormessage": []}})), None);

        let envelope = json!({"response": {"errormessage": ""}});
        assert_eq!(Operation::Logout.check(&envelope), Ok(None));
        assert_eq!(Operation::Login.classify(&envelope), Status::Clear);
    }

    #[test]
    fn test_extract_error_absent() {
        assert_eq!(extract_error(&json!({})), None);
        assert_eq!(extract_error(&json!({"response": {}})), None);
        assert_eq!(extract_error(&json!({"response": "text"})), None);
    }

    #[test]
    fn test_extract_error_string() {
        let envelope = json!({"response": {"errormessage": "badlogin"}});
        assert_eq!(extract_error(&envelope), Some("badlogin".to_string()));
    }

    #[test]
    fn test_extract_error_list_takes_first() {
        let envelope = json!({"response": {"errormessage": ["badlogin_strikes", "3", "5"]}});
        assert_eq!(extract_error(&envelope), Some("badlogin_strikes".to_string()));
    }

    #[test]
    fn test_extract_error_empty_list() {
        let envelope = json!({"response": {"errormessage": []}});
        assert_eq!(extract_error(&envelope), None);
    }

    #[test]
    fn test_login_redirect_is_recoverable() {
        let envelope = json!({"response": {"errormessage": "redirect_login"}});
        assert_eq!(
            Operation::Login.classify(&envelope),
            Status::Recoverable("redirect_login".to_string())
        );
        assert_eq!(
            Operation::Login.check(&envelope),
            Ok(Some("redirect_login".to_string()))
        );
    }

    #[test]
    fn test_login_badlogin_is_failure() {
        let envelope = json!({"response": {"errormessage": "badlogin"}});
        assert_eq!(
            Operation::Login.classify(&envelope),
            Status::Failure("badlogin".to_string())
        );
        let err = Operation::Login.check(&envelope).unwrap_err();
        assert!(err.is_bad_login());
    }

    #[test]
    fn test_logout_cookieclear_is_recoverable() {
        let envelope = json!({"response": {"errormessage": ["cookieclear"]}});
        assert!(Operation::Logout.classify(&envelope).is_success());
    }

    #[test]
    fn test_success_code_is_scoped_to_operation() {
        let envelope = json!({"response": {"errormessage": "redirect_login"}});
        assert_eq!(
            Operation::Logout.classify(&envelope),
            Status::Failure("redirect_login".to_string())
        );
        assert_eq!(
            Operation::Read.classify(&envelope),
            Status::Failure("redirect_login".to_string())
        );
    }

    #[test]
    fn test_send_message_requires_acknowledgement() {
        let result = Operation::SendMessage.check(&json!({"response": {}}));
        assert!(matches!(result, Err(ProtocolError::UnexpectedResponse(_))));

        let sent = json!({"response": {"errormessage": "pm_messagesent"}});
        assert_eq!(
            Operation::SendMessage.check(&sent),
            Ok(Some("pm_messagesent".to_string()))
        );
    }

    #[test]
    fn test_clear_is_success_for_unacknowledged_operations() {
        assert_eq!(Operation::NewPost.check(&json!({})), Ok(None));
        assert_eq!(Operation::Read.check(&json!({"response": {}})), Ok(None));
    }
}
