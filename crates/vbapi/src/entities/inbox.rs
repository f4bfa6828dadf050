//! The logged-in user's private message folders.

use protocol::fields::one_or_many;
use protocol::{Operation, Params, Result};
use serde::Serialize;
use serde_json::Value;

use super::{payload, Message};
use crate::session::SessionManager;

/// Folder the remote files received messages under.
pub const INBOX_FOLDER: u64 = 0;

/// Messages in one private message folder, newest period group first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Inbox {
    pub folder_id: u64,
    pub messages: Vec<Message>,
}

impl Inbox {
    /// Parses the `HTML` object of a `private_messagelist` response.
    pub fn from_html(folder_id: u64, html: &Value) -> Self {
        let messages = one_or_many(html.get("messagelist_periodgroups"))
            .into_iter()
            .flat_map(|group| one_or_many(group.get("messagelistbits")))
            .filter_map(|bit| {
                let pm = bit.get("pm").filter(|pm| pm.is_object())?;
                let user = bit.get("userbit").and_then(|userbit| userbit.get("userinfo"));
                Some(Message::from_list_entry(pm, user))
            })
            .collect();

        Self {
            folder_id,
            messages,
        }
    }

    /// Lists the messages in `folder_id`.
    pub async fn get(session: &SessionManager, folder_id: u64) -> Result<Self> {
        let envelope = session
            .call_method(
                "private_messagelist",
                Params::new().with("folderid", folder_id),
                None,
            )
            .await?;
        let html = payload(&envelope, &["response", "HTML"], "message list")?;
        Ok(Self::from_html(folder_id, html))
    }

    /// Deletes every message in `folder_id` sent before `before`
    /// (Unix seconds).
    pub async fn empty(session: &SessionManager, before: u64, folder_id: u64) -> Result<()> {
        let params = Params::new()
            .with("dateline", before)
            .with("folderid", folder_id);
        let envelope = session
            .call_method("private_confirmemptyfolder", params, None)
            .await?;
        Operation::EmptyFolder.check(&envelope)?;
        Ok(())
    }
}
