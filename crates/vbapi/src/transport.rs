//! HTTP boundary for remote calls.
//!
//! Every remote call is one form-encoded POST. A 200 response with a JSON
//! body is handed back unexamined; anything else is a
//! [`ProtocolError::NoResponse`] that keeps the underlying detail.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use protocol::{Params, ProtocolError, Result};
use reqwest::{header, Client, StatusCode};
use serde_json::Value;

/// Boxed future returned by [`Transport`] implementations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A single outgoing call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormRequest {
    /// RPC endpoint.
    pub url: String,
    /// Value of the `User-Agent` header.
    pub user_agent: String,
    /// Form body, reserved fields included.
    pub fields: Params,
    /// Cookies for this call only.
    pub cookies: Option<Params>,
    /// Root URL the cookies are scoped to.
    pub cookie_scope: String,
}

impl FormRequest {
    /// The method name carried in the form.
    pub fn method(&self) -> &str {
        self.fields.get("api_m").unwrap_or_default()
    }

    /// Renders the `Cookie` header, if any cookies apply to `url`.
    pub fn cookie_header(&self) -> Option<String> {
        let cookies = self.cookies.as_ref().filter(|c| !c.is_empty())?;
        if !self.url.starts_with(&self.cookie_scope) {
            return None;
        }
        Some(
            cookies
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

/// Trait for issuing remote calls.
///
/// This trait abstracts the HTTP client, allowing for different
/// implementations (e.g., reqwest, scripted for testing).
pub trait Transport: Send + Sync {
    /// Posts the form and returns the parsed JSON body.
    fn post_form(&self, request: FormRequest) -> BoxFuture<'_, Result<Value>>;
}

/// reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Creates a transport with the given per-request timeout.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProtocolError::Configuration(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn post_form(&self, request: FormRequest) -> BoxFuture<'_, Result<Value>> {
        Box::pin(async move {
            let mut builder = self
                .client
                .post(&request.url)
                .header(header::USER_AGENT, &request.user_agent)
                .form(&request.fields);
            if let Some(cookie) = request.cookie_header() {
                builder = builder.header(header::COOKIE, cookie);
            }

            let response = builder
                .send()
                .await
                .map_err(|e| ProtocolError::NoResponse(format!("request failed: {}", e)))?;

            let status = response.status();
            if status != StatusCode::OK {
                return Err(ProtocolError::NoResponse(format!(
                    "unexpected status {}",
                    status
                )));
            }

            let body = response
                .text()
                .await
                .map_err(|e| ProtocolError::NoResponse(format!("failed to read body: {}", e)))?;
            Ok(serde_json::from_str(&body)?)
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted transport for unit tests.

    use std::sync::{Arc, Mutex};

    use tokio::sync::Notify;

    use super::*;

    type Responder = Box<dyn Fn(&FormRequest) -> Result<Value> + Send + Sync>;

    /// Records every request and answers from a closure. The handshake can
    /// be held open until [`MockTransport::release_handshake`] is called.
    pub(crate) struct MockTransport {
        requests: Mutex<Vec<FormRequest>>,
        responder: Responder,
        handshake_hold: Option<Arc<Notify>>,
    }

    impl MockTransport {
        pub(crate) fn new(
            responder: impl Fn(&FormRequest) -> Result<Value> + Send + Sync + 'static,
        ) -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                responder: Box::new(responder),
                handshake_hold: None,
            }
        }

        pub(crate) fn holding_handshake(mut self) -> Self {
            self.handshake_hold = Some(Arc::new(Notify::new()));
            self
        }

        pub(crate) fn release_handshake(&self) {
            if let Some(hold) = &self.handshake_hold {
                hold.notify_one();
            }
        }

        pub(crate) fn requests(&self) -> Vec<FormRequest> {
            self.requests.lock().unwrap().clone()
        }

        pub(crate) fn count(&self, method: &str) -> usize {
            self.requests()
                .iter()
                .filter(|r| r.method() == method)
                .count()
        }
    }

    /// Credentials envelope answered by a healthy handshake.
    pub(crate) fn handshake_envelope() -> Value {
        serde_json::json!({
            "apiversion": "1",
            "apiaccesstoken": "tok",
            "sessionhash": "sh",
            "apiclientid": "cid",
            "secret": "sec"
        })
    }

    /// A manager whose handshake already succeeded; every later call is
    /// answered by `responder`.
    pub(crate) async fn ready_session(
        responder: impl Fn(&FormRequest) -> Result<Value> + Send + Sync + 'static,
    ) -> (crate::SessionManager, Arc<MockTransport>) {
        let transport = Arc::new(MockTransport::new(move |request| {
            if request.method() == protocol::METHOD_API_INIT {
                Ok(handshake_envelope())
            } else {
                responder(request)
            }
        }));
        let config = crate::Config::new("https://forum.example.com/api.php", "key", "tests", "1");
        let session = crate::SessionManager::with_transport(&config, transport.clone());
        session
            .wait_for_initialization(std::time::Duration::from_secs(5))
            .await
            .unwrap();
        (session, transport)
    }

    impl Transport for MockTransport {
        fn post_form(&self, request: FormRequest) -> BoxFuture<'_, Result<Value>> {
            Box::pin(async move {
                self.requests.lock().unwrap().push(request.clone());
                if request.method() == protocol::METHOD_API_INIT {
                    if let Some(hold) = &self.handshake_hold {
                        hold.notified().await;
                    }
                }
                (self.responder)(&request)
            })
        }
    }
}
