//! Private messages: reading one message and sending new ones.

use protocol::fields::{flag, non_empty, opt_number, path, text, timestamp};
use protocol::{Operation, Params, Result};
use serde::Serialize;
use serde_json::Value;

use super::{payload, PostOptions};
use crate::session::SessionManager;

/// Read state shown by a message's status icon.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    New,
    #[default]
    Old,
    Replied,
    Forwarded,
    Other(String),
}

impl MessageStatus {
    /// Maps a `statusicon` value.
    pub fn from_icon(icon: &str) -> Self {
        match icon {
            "new" => MessageStatus::New,
            "old" | "" => MessageStatus::Old,
            "replied" => MessageStatus::Replied,
            "forwarded" => MessageStatus::Forwarded,
            other => MessageStatus::Other(other.to_string()),
        }
    }
}

/// Author of a private message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Sender {
    pub id: Option<u64>,
    pub username: String,
    pub title: String,
    pub signature: String,
    pub avatar_url: String,
    pub online: bool,
    /// Unix seconds.
    pub join_date: Option<u64>,
}

/// A private message.
///
/// Messages listed in an [`Inbox`](super::Inbox) carry only the summary
/// fields; [`Message::get`] fills in the body and the sender block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Message {
    pub id: u64,
    pub folder_id: Option<u64>,
    pub title: String,
    pub recipients: Vec<String>,
    pub message: String,
    pub message_plain: String,
    pub message_bbcode: String,
    pub status: MessageStatus,
    /// Unix seconds.
    pub sent: Option<u64>,
    pub sender: Sender,
}

impl Message {
    /// Parses the `pm` and `postbit.post` objects of a `private_showpm` response.
    pub fn from_parts(pm: &Value, post: &Value) -> Self {
        Self {
            id: opt_number(pm, "pmid").unwrap_or_default(),
            folder_id: opt_number(pm, "folderid"),
            title: non_empty(post, "title")
                .or_else(|| non_empty(pm, "title"))
                .unwrap_or_default(),
            recipients: split_recipients(&text(pm, "recipients")),
            message: text(post, "message"),
            message_plain: text(post, "message_plain"),
            message_bbcode: text(post, "message_bbcode"),
            status: MessageStatus::from_icon(&text(post, "statusicon")),
            sent: timestamp(post, "posttime"),
            sender: Sender {
                id: opt_number(post, "userid").filter(|id| *id > 0),
                username: non_empty(post, "username")
                    .or_else(|| non_empty(pm, "fromusername"))
                    .unwrap_or_default(),
                title: text(post, "usertitle"),
                signature: text(post, "signature"),
                avatar_url: text(post, "avatarurl"),
                online: path(post, &["onlinestatus"])
                    .is_some_and(|status| flag(status, "onlinestatus")),
                join_date: timestamp(post, "joindate"),
            },
        }
    }

    /// Parses one entry of an inbox listing: a `pm` object and the
    /// sender's `userinfo`.
    pub fn from_list_entry(pm: &Value, user: Option<&Value>) -> Self {
        let sender = user
            .map(|user| Sender {
                id: opt_number(user, "userid").filter(|id| *id > 0),
                username: text(user, "username"),
                ..Sender::default()
            })
            .unwrap_or_default();

        Self {
            id: opt_number(pm, "pmid").unwrap_or_default(),
            folder_id: opt_number(pm, "folderid"),
            title: text(pm, "title"),
            status: MessageStatus::from_icon(&text(pm, "statusicon")),
            sent: timestamp(pm, "sendtime"),
            sender,
            ..Self::default()
        }
    }

    /// Reads one private message of the logged-in user.
    pub async fn get(session: &SessionManager, pm_id: u64) -> Result<Self> {
        let envelope = session
            .call_method("private_showpm", Params::new().with("pmid", pm_id), None)
            .await?;
        let pm = payload(&envelope, &["response", "HTML", "pm"], "private message")?;
        let post = payload(
            &envelope,
            &["response", "HTML", "postbit", "post"],
            "private message body",
        )?;
        Ok(Self::from_parts(pm, post))
    }

    /// Sends a private message to `recipients`, separated by `;`.
    ///
    /// The remote must acknowledge with `pm_messagesent`.
    pub async fn send(
        session: &SessionManager,
        recipients: &str,
        title: &str,
        message: &str,
        options: &PostOptions,
    ) -> Result<()> {
        let params = Params::new()
            .with("recipients", recipients)
            .with("title", title)
            .with("message", message)
            .with("signature", options.signature_flag());
        let envelope = session
            .call_method("private_insertpm", params, None)
            .await?;
        Operation::SendMessage.check(&envelope)?;
        Ok(())
    }
}

/// Splits a `"alice ; bob ; "` recipient list.
fn split_recipients(recipients: &str) -> Vec<String> {
    recipients
        .split(';')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::testing::ready_session;
    use protocol::ProtocolError;
    use serde_json::json;

    fn showpm() -> Value {
        json!({
            "response": {
                "HTML": {
                    "pm": {
                        "pmid": "301",
                        "title": "Fallback title",
                        "recipients": "alice ; bob ; ",
                        "savecopy": "0",
                        "folderid": "0",
                        "fromusername": "carol"
                    },
                    "postbit": {
                        "show": {},
                        "post": {
                            "statusicon": "replied",
                            "posttime": "1500000000",
                            "onlinestatusphrase": "x_is_online_now",
                            "userid": "9",
                            "username": "carol",
                            "avatarurl": "customavatars/avatar9_14.gif",
                            "onlinestatus": {"onlinestatus": "1"},
                            "usertitle": "Member",
                            "joindate": "1262304000",
                            "title": "Meeting",
                            "message": "<p>see you</p>",
                            "message_plain": "see you",
                            "message_bbcode": "see you",
                            "signature": "-- carol"
                        }
                    }
                }
            }
        })
    }

    #[test]
    fn test_split_recipients() {
        assert_eq!(split_recipients("alice ; bob ; "), vec!["alice", "bob"]);
        assert_eq!(split_recipients("alice"), vec!["alice"]);
        assert!(split_recipients(" ; ").is_empty());
    }

    #[test]
    fn test_status_icons() {
        assert_eq!(MessageStatus::from_icon("new"), MessageStatus::New);
        assert_eq!(MessageStatus::from_icon("old"), MessageStatus::Old);
        assert_eq!(MessageStatus::from_icon("forwarded"), MessageStatus::Forwarded);
        assert_eq!(
            MessageStatus::from_icon("flagged"),
            MessageStatus::Other("flagged".to_string())
        );
    }

    #[test]
    fn test_from_parts() {
        let envelope = showpm();
        let html = &envelope["response"]["HTML"];
        let message = Message::from_parts(&html["pm"], &html["postbit"]["post"]);

        assert_eq!(message.id, 301);
        assert_eq!(message.folder_id, Some(0));
        assert_eq!(message.title, "Meeting");
        assert_eq!(message.recipients, vec!["alice", "bob"]);
        assert_eq!(message.message_plain, "see you");
        assert_eq!(message.status, MessageStatus::Replied);
        assert_eq!(message.sent, Some(1_500_000_000));
        assert_eq!(message.sender.id, Some(9));
        assert_eq!(message.sender.username, "carol");
        assert!(message.sender.online);
        assert_eq!(message.sender.join_date, Some(1_262_304_000));
    }

    #[test]
    fn test_title_falls_back_to_pm() {
        let message = Message::from_parts(
            &json!({"pmid": 1, "title": "From pm", "fromusername": "dave"}),
            &json!({"title": ""}),
        );
        assert_eq!(message.title, "From pm");
        assert_eq!(message.sender.username, "dave");
        assert!(!message.sender.online);
    }

    #[tokio::test]
    async fn test_get() {
        let (session, transport) = ready_session(|_| Ok(showpm())).await;

        let message = Message::get(&session, 301).await.unwrap();
        assert_eq!(message.id, 301);

        let call = transport.requests().pop().unwrap();
        assert_eq!(call.method(), "private_showpm");
        assert_eq!(call.fields.get("pmid"), Some("301"));
    }

    #[tokio::test]
    async fn test_get_without_body() {
        let (session, _) =
            ready_session(|_| Ok(json!({"response": {"HTML": {"pm": {"pmid": 1}}}}))).await;

        let err = Message::get(&session, 1).await.unwrap_err();
        assert!(matches!(err, ProtocolError::UnexpectedResponse(_)));
    }

    #[tokio::test]
    async fn test_send_acknowledged() {
        let (session, transport) =
            ready_session(|_| Ok(json!({"response": {"errormessage": "pm_messagesent"}}))).await;

        Message::send(&session, "alice", "Hi", "Hello", &PostOptions::default())
            .await
            .unwrap();

        let call = transport.requests().pop().unwrap();
        assert_eq!(call.method(), "private_insertpm");
        assert_eq!(call.fields.get("recipients"), Some("alice"));
        assert_eq!(call.fields.get("title"), Some("Hi"));
        assert_eq!(call.fields.get("signature"), Some("0"));
    }

    #[tokio::test]
    async fn test_send_requires_acknowledgement() {
        let (session, _) = ready_session(|_| Ok(json!({"response": {}}))).await;

        let err = Message::send(&session, "alice", "Hi", "Hello", &PostOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ProtocolError::UnexpectedResponse(_)));
    }

    #[tokio::test]
    async fn test_send_rejected() {
        let (session, _) = ready_session(|_| {
            Ok(json!({"response": {"errormessage": ["pmrecipientsnotfound", "nobody"]}}))
        })
        .await;

        let err = Message::send(&session, "nobody", "Hi", "Hello", &PostOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some("pmrecipientsnotfound"));
    }
}
