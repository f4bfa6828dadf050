//! Typed views of forum content.
//!
//! Each entity exposes associated async functions that take the
//! [`SessionManager`] and go through [`SessionManager::call_method`] only.
//! Parsing is lenient: numbers may arrive as strings and lists may arrive
//! as a single object.

mod forum;
mod inbox;
mod member;
mod message;
mod post;
mod thread;

pub use forum::Forum;
pub use inbox::{Inbox, INBOX_FOLDER};
pub use member::Member;
pub use message::{Message, MessageStatus, Sender};
pub use post::Post;
pub use thread::Thread;

use protocol::fields::{opt_number, path};
use protocol::{extract_error, Operation, Params, ProtocolError, Result};
use serde::Serialize;
use serde_json::Value;

use crate::session::SessionManager;

/// Options shared by the operations that write content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostOptions {
    /// Append the user's signature.
    pub signature: bool,
    /// Reason recorded with edits and deletions.
    pub reason: Option<String>,
}

impl PostOptions {
    /// Options that append the signature.
    pub fn with_signature() -> Self {
        Self {
            signature: true,
            reason: None,
        }
    }

    /// Sets the edit or deletion reason.
    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    fn signature_flag(&self) -> &'static str {
        if self.signature {
            "1"
        } else {
            "0"
        }
    }

    fn reason_text(&self) -> &str {
        self.reason.as_deref().unwrap_or_default()
    }
}

/// Identifiers the remote reports after a write, when it reports them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PostReceipt {
    pub thread_id: Option<u64>,
    pub post_id: Option<u64>,
}

impl PostReceipt {
    fn from_envelope(envelope: &Value) -> Self {
        match envelope.get("show") {
            Some(show) => Self {
                thread_id: opt_number(show, "threadid").filter(|id| *id > 0),
                post_id: opt_number(show, "postid").filter(|id| *id > 0),
            },
            None => Self::default(),
        }
    }
}

/// Error for an envelope that lacks the payload a read expects.
///
/// The remote's own code wins when it sent one.
fn missing_payload(envelope: &Value, what: &str) -> ProtocolError {
    match extract_error(envelope) {
        Some(code) => ProtocolError::Rejected(code),
        None => ProtocolError::UnexpectedResponse(format!("response has no {}", what)),
    }
}

/// Looks up the payload of a read at `keys`.
fn payload<'a>(envelope: &'a Value, keys: &[&str], what: &str) -> Result<&'a Value> {
    path(envelope, keys)
        .filter(|value| !value.is_null())
        .ok_or_else(|| missing_payload(envelope, what))
}

/// Issues a write and checks its status code.
async fn submit(
    session: &SessionManager,
    operation: Operation,
    method: &str,
    params: Params,
    cookies: Option<Params>,
) -> Result<PostReceipt> {
    let response = session.call_method(method, params, cookies).await?;
    operation.check(&response)?;
    Ok(PostReceipt::from_envelope(&response))
}
