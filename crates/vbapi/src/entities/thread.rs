//! Threads: parsing, reading, creation and inline moderation.

use protocol::fields::{flag, non_empty, number, one_or_many, opt_number, text, timestamp};
use protocol::{Operation, Params, Result};
use serde::Serialize;
use serde_json::Value;

use super::{payload, submit, Post, PostOptions, PostReceipt};
use crate::session::SessionManager;

/// Cookie naming the thread an inline moderation action applies to.
const INLINE_THREAD_COOKIE: &str = "vbulletin_inlinethread";

/// A discussion thread, with its posts when read through [`Thread::get`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Thread {
    pub id: u64,
    pub title: String,
    pub forum_id: Option<u64>,
    pub forum_title: String,
    pub author: String,
    pub author_id: Option<u64>,
    pub reply_count: u64,
    pub view_count: u64,
    pub open: bool,
    pub sticky: bool,
    /// Unix seconds.
    pub created: Option<u64>,
    /// Unix seconds.
    pub last_post: Option<u64>,
    pub last_poster: String,
    pub posts: Vec<Post>,
}

impl Thread {
    /// Parses a `thread` object. Posts are left empty.
    pub fn from_value(thread: &Value) -> Self {
        Self {
            id: number(thread, "threadid"),
            title: non_empty(thread, "threadtitle")
                .or_else(|| non_empty(thread, "title"))
                .unwrap_or_default(),
            forum_id: opt_number(thread, "forumid"),
            forum_title: text(thread, "forumtitle"),
            author: text(thread, "postusername"),
            author_id: opt_number(thread, "postuserid").filter(|id| *id > 0),
            reply_count: number(thread, "replycount"),
            view_count: number(thread, "views"),
            // Missing means open; the remote sends 0 for closed threads.
            open: opt_number(thread, "open").map_or(true, |open| open != 0),
            sticky: flag(thread, "sticky"),
            created: timestamp(thread, "dateline"),
            last_post: timestamp(thread, "lastpost"),
            last_poster: text(thread, "lastposter"),
            posts: Vec::new(),
        }
    }

    /// Parses a `showthread` response body.
    fn from_response(response: &Value, thread: &Value) -> Self {
        let mut parsed = Self::from_value(thread);
        parsed.posts = one_or_many(response.get("postbits"))
            .into_iter()
            .map(|bit| bit.get("post").unwrap_or(bit))
            .filter(|post| post.is_object())
            .map(Post::from_value)
            .collect();
        parsed
    }

    /// Reads a thread and its first page of posts.
    pub async fn get(session: &SessionManager, thread_id: u64) -> Result<Self> {
        let envelope = session
            .call_method("showthread", Params::new().with("threadid", thread_id), None)
            .await?;
        let thread = payload(&envelope, &["response", "thread"], "thread")?;
        Ok(Self::from_response(&envelope["response"], thread))
    }

    /// Starts a new thread; its first post carries `message`.
    pub async fn create(
        session: &SessionManager,
        forum_id: u64,
        subject: &str,
        message: &str,
        options: &PostOptions,
    ) -> Result<PostReceipt> {
        let params = Params::new()
            .with("forumid", forum_id)
            .with("subject", subject)
            .with("message", message)
            .with("signature", options.signature_flag());
        submit(session, Operation::NewThread, "newthread_postthread", params, None).await
    }

    /// Closes a thread. Requires inline moderation rights.
    pub async fn close(session: &SessionManager, thread_id: u64) -> Result<PostReceipt> {
        moderate(session, Operation::CloseThread, "inlinemod_close", thread_id).await
    }

    /// Reopens a closed thread. Requires inline moderation rights.
    pub async fn open(session: &SessionManager, thread_id: u64) -> Result<PostReceipt> {
        moderate(session, Operation::OpenThread, "inlinemod_open", thread_id).await
    }

    /// Deletes a thread. Requires inline moderation rights.
    pub async fn delete(session: &SessionManager, thread_id: u64) -> Result<PostReceipt> {
        moderate(
            session,
            Operation::DeleteThread,
            "inlinemod_dodeletethreads",
            thread_id,
        )
        .await
    }
}

async fn moderate(
    session: &SessionManager,
    operation: Operation,
    method: &str,
    thread_id: u64,
) -> Result<PostReceipt> {
    let params = Params::new().with("threadid", thread_id);
    let cookies = Params::new().with(INLINE_THREAD_COOKIE, thread_id);
    submit(session, operation, method, params, Some(cookies)).await
}
