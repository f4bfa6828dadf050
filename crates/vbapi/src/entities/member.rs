//! Member profiles.

use protocol::fields::{flag, non_empty, number, opt_number, text, timestamp};
use protocol::{Params, Result};
use serde::Serialize;
use serde_json::Value;

use super::payload;
use crate::session::SessionManager;

/// Public profile of a forum member.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Member {
    pub id: u64,
    pub username: String,
    pub title: String,
    pub avatar_url: String,
    pub post_count: u64,
    pub online: bool,
    pub homepage: Option<String>,
    /// Unix seconds.
    pub join_date: Option<u64>,
    /// Unix seconds.
    pub last_activity: Option<u64>,
}

impl Member {
    /// Parses a `prepared` profile object.
    pub fn from_value(prepared: &Value) -> Self {
        Self {
            id: number(prepared, "userid"),
            username: text(prepared, "username"),
            title: text(prepared, "usertitle"),
            avatar_url: text(prepared, "avatarurl"),
            post_count: opt_number(prepared, "posts").unwrap_or_default(),
            online: match prepared.get("onlinestatus") {
                Some(status @ Value::Object(_)) => flag(status, "onlinestatus"),
                _ => flag(prepared, "onlinestatus"),
            },
            homepage: non_empty(prepared, "homepage"),
            join_date: timestamp(prepared, "joindate"),
            last_activity: timestamp(prepared, "lastactivitytime"),
        }
    }

    /// Looks a member up by username.
    pub async fn get(session: &SessionManager, username: &str) -> Result<Self> {
        let envelope = session
            .call_method("member", Params::new().with("username", username), None)
            .await?;
        let prepared = payload(&envelope, &["response", "prepared"], "member profile")?;
        Ok(Self::from_value(prepared))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::testing::ready_session;
    use protocol::ProtocolError;
    use serde_json::json;

    #[test]
    fn test_from_value() {
        let member = Member::from_value(&json!({
            "userid": "7",
            "username": "alice",
            "usertitle": "Senior Member",
            "avatarurl": "customavatars/avatar7_1.gif",
            "posts": "1,204",
            "onlinestatus": {"onlinestatus": "1"},
            "homepage": "",
            "joindate": "1262304000",
            "lastactivitytime": 0
        }));
        assert_eq!(member.id, 7);
        assert_eq!(member.title, "Senior Member");
        assert!(member.online);
        assert_eq!(member.homepage, None);
        assert_eq!(member.join_date, Some(1_262_304_000));
        assert_eq!(member.last_activity, None);
        // Formatted counts are not numbers.
        assert_eq!(member.post_count, 0);
    }

    #[test]
    fn test_flat_online_status() {
        let member = Member::from_value(&json!({"userid": 1, "onlinestatus": 1}));
        assert!(member.online);
        assert!(!Member::from_value(&json!({"userid": 1})).online);
    }

    #[tokio::test]
    async fn test_get() {
        let (session, transport) = ready_session(|_| {
            Ok(json!({"response": {"prepared": {"userid": 7, "username": "alice", "posts": 12}}}))
        })
        .await;

        let member = Member::get(&session, "alice").await.unwrap();
        assert_eq!(member.username, "alice");
        assert_eq!(member.post_count, 12);

        let call = transport.requests().pop().unwrap();
        assert_eq!(call.method(), "member");
        assert_eq!(call.fields.get("username"), Some("alice"));
    }

    #[tokio::test]
    async fn test_get_unknown_member() {
        let (session, _) =
            ready_session(|_| Ok(json!({"response": {"errormessage": ["invalidid", "user"]}})))
                .await;

        let err = Member::get(&session, "nobody").await.unwrap_err();
        assert_eq!(err, ProtocolError::Rejected("invalidid".to_string()));
    }
}
