//! Wire fields, method names and the records exchanged with the remote.
//!
//! Requests are flat form bodies. Every signed request carries the
//! reserved identity fields (`api_m`, `api_c`, `api_s`, `api_v`, `api_sig`)
//! which always win over caller-supplied parameters of the same name.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::fields::{non_empty, number, text};
use crate::signing::sign;

/// Handshake method; the only unsigned call.
pub const METHOD_API_INIT: &str = "api_init";
/// Login method.
pub const METHOD_LOGIN: &str = "login_login";
/// Logout method.
pub const METHOD_LOGOUT: &str = "login_logout";

/// Reserved field: method name.
pub const FIELD_METHOD: &str = "api_m";
/// Reserved field: client id issued by the handshake.
pub const FIELD_CLIENT_ID: &str = "api_c";
/// Reserved field: access token issued by the handshake.
pub const FIELD_ACCESS_TOKEN: &str = "api_s";
/// Reserved field: API version reported by the handshake.
pub const FIELD_API_VERSION: &str = "api_v";
/// Reserved field: request signature.
pub const FIELD_SIGNATURE: &str = "api_sig";

/// All reserved request fields.
pub const RESERVED_FIELDS: [&str; 5] = [
    FIELD_METHOD,
    FIELD_CLIENT_ID,
    FIELD_ACCESS_TOKEN,
    FIELD_API_VERSION,
    FIELD_SIGNATURE,
];

/// Login form field carrying the username.
pub const FIELD_LOGIN_USERNAME: &str = "vb_login_username";
/// Login form field carrying the hashed password.
pub const FIELD_LOGIN_PASSWORD: &str = "vb_login_md5password";

/// Ordered form parameters for a request body or a cookie jar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(BTreeMap<String, String>);

impl Params {
    /// Creates an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parameter, builder style.
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.insert(key, value);
        self
    }

    /// Adds or replaces a parameter.
    pub fn insert(&mut self, key: impl Into<String>, value: impl ToString) {
        self.0.insert(key.into(), value.to_string());
    }

    /// Returns a parameter value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no parameters.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}

/// Identity sent with the handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeRequest {
    pub client_name: String,
    pub client_version: String,
    pub platform_name: String,
    pub platform_version: String,
    pub unique_id: String,
}

impl HandshakeRequest {
    /// Handshake form fields, without the method name.
    pub fn to_params(&self) -> Params {
        Params::new()
            .with("clientname", &self.client_name)
            .with("clientversion", &self.client_version)
            .with("platformname", &self.platform_name)
            .with("platformversion", &self.platform_version)
            .with("uniqueid", &self.unique_id)
    }
}

/// Credentials issued by a successful handshake.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCredentials {
    pub api_version: String,
    pub access_token: String,
    pub client_id: String,
    pub secret: String,
    /// Returned by the handshake but not used for signing.
    pub session_hash: String,
}

impl SessionCredentials {
    /// Parses a handshake envelope.
    ///
    /// Returns `None` unless every credential field is present and non-empty.
    pub fn from_handshake(envelope: &Value) -> Option<Self> {
        Some(Self {
            api_version: non_empty(envelope, "apiversion")?,
            access_token: non_empty(envelope, "apiaccesstoken")?,
            session_hash: non_empty(envelope, "sessionhash")?,
            client_id: non_empty(envelope, "apiclientid")?,
            secret: non_empty(envelope, "secret")?,
        })
    }

    /// Signature for a request made with these credentials.
    pub fn signature(&self, api_key: &str) -> String {
        sign(&self.access_token, &self.client_id, &self.secret, api_key)
    }
}

impl std::fmt::Debug for SessionCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCredentials")
            .field("api_version", &self.api_version)
            .field("client_id", &self.client_id)
            .field("access_token", &"<redacted>")
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// The logged-in user's session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSession {
    pub user_id: u64,
    pub username: String,
    pub db_session_hash: String,
    pub logged_in: bool,
}

impl UserSession {
    /// Parses the `session` object of an envelope, if there is one.
    pub fn from_envelope(envelope: &Value) -> Option<Self> {
        let session = envelope.get("session").filter(|s| s.is_object())?;
        Some(Self {
            user_id: number(session, "userid"),
            username: text(session, "username"),
            db_session_hash: text(session, "dbsessionhash"),
            logged_in: false,
        })
    }
}

/// Builds the form body for a call.
///
/// Caller parameters are copied first and the reserved fields written
/// afterwards, so a caller can never override them. With `signing` set the
/// identity fields and `api_sig` are attached; without it (the handshake)
/// only `api_m` is.
pub fn build_form(
    method: &str,
    params: Params,
    signing: Option<(&SessionCredentials, &str)>,
) -> Params {
    let mut form = params;
    for reserved in RESERVED_FIELDS {
        form.0.remove(reserved);
    }
    form.insert(FIELD_METHOD, method);
    if let Some((credentials, api_key)) = signing {
        form.insert(FIELD_CLIENT_ID, &credentials.client_id);
        form.insert(FIELD_ACCESS_TOKEN, &credentials.access_token);
        form.insert(FIELD_API_VERSION, &credentials.api_version);
        form.insert(FIELD_SIGNATURE, credentials.signature(api_key));
    }
    form
}
