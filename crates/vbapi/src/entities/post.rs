//! Posts: parsing and the reply, edit and delete operations.

use protocol::fields::{non_empty, opt_number, text, timestamp};
use protocol::{Operation, Params, Result};
use serde::Serialize;
use serde_json::Value;

use super::{submit, PostOptions, PostReceipt};
use crate::session::SessionManager;

/// A single post within a thread.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Post {
    pub id: u64,
    pub thread_id: Option<u64>,
    pub title: String,
    /// Rendered HTML.
    pub message: String,
    pub message_plain: String,
    pub message_bbcode: String,
    pub user_id: Option<u64>,
    pub username: String,
    pub signature: String,
    /// Unix seconds.
    pub posted: Option<u64>,
}

impl Post {
    /// Parses a `post` object.
    pub fn from_value(post: &Value) -> Self {
        Self {
            id: opt_number(post, "postid").unwrap_or_default(),
            thread_id: opt_number(post, "threadid"),
            title: text(post, "title"),
            message: text(post, "message"),
            message_plain: text(post, "message_plain"),
            message_bbcode: text(post, "message_bbcode"),
            user_id: opt_number(post, "userid").filter(|id| *id > 0),
            username: non_empty(post, "username")
                .or_else(|| non_empty(post, "postusername"))
                .unwrap_or_default(),
            signature: text(post, "signature"),
            posted: timestamp(post, "posttime").or_else(|| timestamp(post, "dateline")),
        }
    }

    /// Replies to a thread.
    pub async fn create(
        session: &SessionManager,
        thread_id: u64,
        message: &str,
        options: &PostOptions,
    ) -> Result<PostReceipt> {
        let params = Params::new()
            .with("threadid", thread_id)
            .with("message", message)
            .with("signature", options.signature_flag());
        submit(session, Operation::NewPost, "newreply_postreply", params, None).await
    }

    /// Replaces the body of an existing post.
    pub async fn edit(
        session: &SessionManager,
        post_id: u64,
        message: &str,
        options: &PostOptions,
    ) -> Result<PostReceipt> {
        let params = Params::new()
            .with("postid", post_id)
            .with("message", message)
            .with("reason", options.reason_text())
            .with("signature", options.signature_flag());
        submit(session, Operation::EditPost, "editpost_updatepost", params, None).await
    }

    /// Deletes a post.
    pub async fn delete(
        session: &SessionManager,
        post_id: u64,
        thread_id: u64,
        options: &PostOptions,
    ) -> Result<PostReceipt> {
        let params = Params::new()
            .with("postid", post_id)
            .with("threadid", thread_id)
            .with("reason", options.reason_text())
            .with("deletepost", "delete");
        submit(session, Operation::DeletePost, "editpost_deletepost", params, None).await
    }
}
