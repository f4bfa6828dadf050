//! Forums: the forum tree and the contents of a single forum.

use protocol::fields::{non_empty, number, one_or_many, opt_number, text};
use protocol::{Operation, Params, ProtocolError, Result};
use serde::Serialize;
use serde_json::Value;

use super::{payload, Thread};
use crate::session::SessionManager;

/// A forum, with its sub-forums and, when read through [`Forum::get`],
/// its first page of threads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Forum {
    pub id: u64,
    pub title: String,
    pub description: String,
    /// `None` for top-level forums.
    pub parent_id: Option<u64>,
    pub thread_count: u64,
    pub reply_count: u64,
    pub sub_forums: Vec<Forum>,
    pub threads: Vec<Thread>,
}

impl Forum {
    /// Parses a forum object and its nested `subforums`.
    pub fn from_value(forum: &Value) -> Self {
        Self {
            id: number(forum, "forumid"),
            title: non_empty(forum, "title")
                .or_else(|| non_empty(forum, "title_clean"))
                .unwrap_or_default(),
            description: text(forum, "description"),
            // The remote marks top-level forums with parent -1.
            parent_id: opt_number(forum, "parentid").filter(|id| *id > 0),
            thread_count: number(forum, "threadcount"),
            reply_count: number(forum, "replycount"),
            sub_forums: forum_entries(forum.get("subforums")),
            threads: Vec::new(),
        }
    }

    /// Parses a `forumdisplay` response body.
    fn from_response(response: &Value, info: &Value) -> Self {
        let mut forum = Self::from_value(info);
        let sub_forums = bit_entries(response.get("forumbits"), "forum");
        if !sub_forums.is_empty() {
            forum.sub_forums = sub_forums.into_iter().map(Self::from_value).collect();
        }
        forum.threads = bit_entries(response.get("threadbits"), "thread")
            .into_iter()
            .map(Thread::from_value)
            .collect();
        forum
    }

    /// Lists every forum visible to the current user, as a tree.
    pub async fn list(session: &SessionManager) -> Result<Vec<Self>> {
        let envelope = session
            .call_method("api_forumlist", Params::new(), None)
            .await?;
        Operation::Read.check(&envelope)?;
        if !(envelope.is_array() || envelope.is_object()) {
            return Err(ProtocolError::UnexpectedResponse(
                "forum list is neither a list nor an object".to_string(),
            ));
        }
        Ok(forum_entries(Some(&envelope)))
    }

    /// Reads one forum with its sub-forums and threads.
    pub async fn get(session: &SessionManager, forum_id: u64) -> Result<Self> {
        let envelope = session
            .call_method("forumdisplay", Params::new().with("forumid", forum_id), None)
            .await?;
        let info = payload(&envelope, &["response", "foruminfo"], "forum info")?;
        Ok(Self::from_response(&envelope["response"], info))
    }
}

/// Forums in a list, a single object or an id-keyed map.
fn forum_entries(value: Option<&Value>) -> Vec<Forum> {
    one_or_many(value)
        .into_iter()
        .filter(|forum| forum.get("forumid").is_some())
        .map(Forum::from_value)
        .collect()
}

/// Unwraps `{"<key>": {...}}` bits, tolerating bits that are the entry itself.
fn bit_entries<'a>(bits: Option<&'a Value>, key: &str) -> Vec<&'a Value> {
    one_or_many(bits)
        .into_iter()
        .map(|bit| bit.get(key).unwrap_or(bit))
        .filter(|entry| entry.is_object())
        .collect()
}
