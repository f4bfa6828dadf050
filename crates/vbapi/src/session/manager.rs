//! Session manager: handshake, signed calls, login and logout.
//!
//! Constructing a [`SessionManager`] starts the handshake on a background
//! task. Every signed call first waits on the [`InitGate`], so callers may
//! issue operations immediately after construction.

use std::sync::Arc;
use std::time::Duration;

use protocol::messages::{FIELD_LOGIN_PASSWORD, FIELD_LOGIN_USERNAME};
use protocol::{
    build_form, extract_error, hash_password, Operation, Params, ProtocolError, Result,
    SessionCredentials, Status, UserSession, METHOD_API_INIT, METHOD_LOGIN, METHOD_LOGOUT,
};
use serde_json::Value;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::gate::{InitGate, SessionPhase};
use crate::config::Config;
use crate::identity::ClientIdentity;
use crate::transport::{FormRequest, HttpTransport, Transport};

/// Error recorded when the handshake answers without credentials or a code.
const NO_SESSION_RETURNED: &str = "api connection did not return a session";

/// State shared between the manager and its handshake task.
struct Shared {
    identity: Option<ClientIdentity>,
    transport: Arc<dyn Transport>,
    gate: InitGate,
    user: RwLock<UserSession>,
    init_timeout: Duration,
}

/// Owner of one remote session.
///
/// Should be created inside a Tokio runtime; outside one it starts failed.
/// Dropping the manager aborts a handshake that is still in flight.
pub struct SessionManager {
    shared: Arc<Shared>,
    handshake: Option<JoinHandle<()>>,
}

impl SessionManager {
    /// Creates a manager using the HTTP transport and starts the handshake.
    pub fn new(config: &Config) -> Self {
        match HttpTransport::new(config.request_timeout()) {
            Ok(transport) => Self::with_transport(config, Arc::new(transport)),
            Err(error) => Self::failed(config, error),
        }
    }

    /// Creates a manager over `transport` and starts the handshake.
    ///
    /// When a required configuration field is empty, or no Tokio runtime is
    /// available to run the handshake, the manager starts in the failed
    /// state and never contacts the remote.
    pub fn with_transport(config: &Config, transport: Arc<dyn Transport>) -> Self {
        let missing = config.missing_fields();
        if !missing.is_empty() {
            return Self::failed(
                config,
                ProtocolError::Configuration(format!(
                    "initialization requires api.url, api.key, platform.name and platform.version; missing {}",
                    missing.join(", ")
                )),
            );
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                return Self::failed(
                    config,
                    ProtocolError::Configuration(
                        "session manager must be created inside a Tokio runtime".to_string(),
                    ),
                )
            }
        };

        let identity = match ClientIdentity::derive(config) {
            Ok(identity) => identity,
            Err(error) => return Self::failed(config, error),
        };

        let shared = Arc::new(Shared {
            identity: Some(identity),
            transport,
            gate: InitGate::new(),
            user: RwLock::new(UserSession::default()),
            init_timeout: config.init_timeout(),
        });

        let task_shared = Arc::clone(&shared);
        let handshake = runtime.spawn(async move { task_shared.run_handshake().await });

        Self {
            shared,
            handshake: Some(handshake),
        }
    }

    fn failed(config: &Config, error: ProtocolError) -> Self {
        warn!(error = %error, "Session manager starts in failed state");
        let shared = Arc::new(Shared {
            identity: None,
            transport: Arc::new(NoTransport),
            gate: InitGate::failed(error),
            user: RwLock::new(UserSession::default()),
            init_timeout: config.init_timeout(),
        });
        Self {
            shared,
            handshake: None,
        }
    }

    /// Current handshake phase.
    pub fn phase(&self) -> SessionPhase {
        self.shared.gate.phase()
    }

    /// Whether the handshake succeeded.
    pub fn is_initialized(&self) -> bool {
        matches!(self.phase(), SessionPhase::Ready(_))
    }

    /// The terminal handshake error, if any.
    pub fn init_error(&self) -> Option<ProtocolError> {
        match self.phase() {
            SessionPhase::Failed(error) => Some(error),
            _ => None,
        }
    }

    /// Credentials issued by the handshake, once it succeeded.
    pub fn credentials(&self) -> Option<Arc<SessionCredentials>> {
        self.shared.gate.credentials()
    }

    /// Identity derived from configuration; `None` for a misconfigured manager.
    pub fn identity(&self) -> Option<&ClientIdentity> {
        self.shared.identity.as_ref()
    }

    /// Waits for the handshake to settle, up to `timeout`.
    pub async fn wait_for_initialization(&self, timeout: Duration) -> Result<()> {
        self.shared.gate.wait(timeout).await.map(|_| ())
    }

    /// Snapshot of the logged-in user's session.
    pub async fn user_session(&self) -> UserSession {
        self.shared.user.read().await.clone()
    }

    /// Issues one remote call and returns the parsed envelope unexamined.
    ///
    /// Every method except the handshake waits for initialization and is
    /// signed. `cookies` are sent with this call only.
    pub async fn call_method(
        &self,
        method: &str,
        params: Params,
        cookies: Option<Params>,
    ) -> Result<Value> {
        self.shared.call_method(method, params, cookies).await
    }

    /// Logs in with a clear-text password, which is hashed before sending.
    pub async fn login(&self, username: &str, password: &str) -> Result<UserSession> {
        self.login_with_hashed_password(username, &hash_password(password))
            .await
    }

    /// Logs in with an already hashed password.
    ///
    /// On `redirect_login` the user session is replaced by the one the
    /// remote returned, stamped with `username` and marked logged in.
    /// A `session` object returned with any other code also replaces the
    /// stored session, so a rejected login leaves the guest session the
    /// remote reports rather than an earlier logged-in one.
    pub async fn login_with_hashed_password(
        &self,
        username: &str,
        hashed_password: &str,
    ) -> Result<UserSession> {
        let params = Params::new()
            .with(FIELD_LOGIN_USERNAME, username)
            .with(FIELD_LOGIN_PASSWORD, hashed_password);
        let response = self.call_method(METHOD_LOGIN, params, None).await?;

        let returned = UserSession::from_envelope(&response);
        let mut user = self.shared.user.write().await;
        match Operation::Login.classify(&response) {
            Status::Recoverable(_) => {
                let mut session = returned.unwrap_or_default();
                session.username = username.to_string();
                session.logged_in = true;
                *user = session;
                info!(username = %username, "Logged in");
                Ok(user.clone())
            }
            Status::Clear => {
                if let Some(session) = returned {
                    *user = session;
                }
                Ok(user.clone())
            }
            Status::Failure(code) => {
                if let Some(session) = returned {
                    *user = session;
                }
                debug!(code = %code, "Login rejected");
                Err(ProtocolError::Rejected(code))
            }
        }
    }

    /// Logs the current user out and resets the user session.
    pub async fn logout(&self) -> Result<bool> {
        let response = self.call_method(METHOD_LOGOUT, Params::new(), None).await?;
        Operation::Logout.check(&response)?;

        let mut session = UserSession::from_envelope(&response).unwrap_or_default();
        session.user_id = 0;
        session.username.clear();
        session.logged_in = false;
        *self.shared.user.write().await = session;
        info!("Logged out");
        Ok(true)
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        if let Some(handshake) = self.handshake.take() {
            handshake.abort();
        }
    }
}

impl Shared {
    async fn run_handshake(self: Arc<Self>) {
        info!("Starting session handshake");
        match self.handshake().await {
            Ok(credentials) => {
                info!(api_version = %credentials.api_version, "Session initialized");
                self.gate.open(credentials);
            }
            Err(error) => {
                warn!(error = %error, "Session initialization failed");
                self.gate.fail(error);
            }
        }
    }

    async fn handshake(&self) -> Result<SessionCredentials> {
        let identity = self.identity.as_ref().ok_or(ProtocolError::NotInitialized)?;
        let params = identity.handshake_request().to_params();
        let response = self.call_method(METHOD_API_INIT, params, None).await?;

        SessionCredentials::from_handshake(&response).ok_or_else(|| {
            ProtocolError::Handshake(
                extract_error(&response).unwrap_or_else(|| NO_SESSION_RETURNED.to_string()),
            )
        })
    }

    async fn call_method(
        &self,
        method: &str,
        params: Params,
        cookies: Option<Params>,
    ) -> Result<Value> {
        if method.is_empty() {
            return Err(ProtocolError::MissingMethod);
        }
        let signed = method != METHOD_API_INIT;

        let credentials = if signed {
            Some(self.gate.wait(self.init_timeout).await?)
        } else {
            None
        };
        let identity = self.identity.as_ref().ok_or(ProtocolError::NotInitialized)?;

        let signing = credentials
            .as_deref()
            .map(|credentials| (credentials, identity.api_key.as_str()));
        let fields = build_form(method, params, signing);

        debug!(method = %method, signed, "Calling remote method");
        self.transport
            .post_form(FormRequest {
                url: identity.api_url.clone(),
                user_agent: identity.client_name.clone(),
                fields,
                cookies,
                cookie_scope: identity.base_url.clone(),
            })
            .await
    }
}

/// Transport of a manager that failed before it could build one.
struct NoTransport;

impl Transport for NoTransport {
    fn post_form(&self, _request: FormRequest) -> crate::transport::BoxFuture<'_, Result<Value>> {
        Box::pin(async { Err(ProtocolError::NotInitialized) })
    }
}
