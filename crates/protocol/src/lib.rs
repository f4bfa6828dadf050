//! # vBulletin API Protocol Library
//!
//! This crate provides the I/O-free wire layer for the vBulletin mobile
//! API: how requests are signed, how response envelopes report their
//! outcome, and the records exchanged during the session lifecycle.
//!
//! ## Overview
//!
//! - **Signing**: `api_sig` computation and password hashing
//! - **Status Codes**: extraction of the embedded status code and its
//!   per-operation meaning (success marker or failure)
//! - **Messages**: reserved request fields, handshake and user session records
//! - **Fields**: lenient accessors for the remote's loosely typed JSON
//!
//! ## Request Lifecycle
//!
//! ```text
//! ┌──────────────┐  api_init (unsigned)   ┌──────────────────────────┐
//! │    client    │ ─────────────────────▶ │ apiaccesstoken, secret,  │
//! │              │ ◀───────────────────── │ apiclientid, apiversion  │
//! │              │                        └──────────────────────────┘
//! │              │  api_m, api_c, api_s, api_v, params,
//! │              │  api_sig = md5(token + clientid + secret + apikey)
//! │              │ ─────────────────────▶  {"response": {"errormessage": ...}}
//! └──────────────┘
//! ```
//!
//! ## Example Usage
//!
//! ```rust
//! use protocol::{build_form, Operation, Params, SessionCredentials};
//! use serde_json::json;
//!
//! let credentials = SessionCredentials::from_handshake(&json!({
//!     "apiversion": "1",
//!     "apiaccesstoken": "tok",
//!     "sessionhash": "sh",
//!     "apiclientid": "cid",
//!     "secret": "sec"
//! }))
//! .unwrap();
//!
//! let form = build_form("showthread", Params::new().with("threadid", 7), Some((&credentials, "key")));
//! assert_eq!(form.get("api_m"), Some("showthread"));
//! assert!(form.get("api_sig").is_some());
//!
//! let envelope = json!({"response": {"errormessage": "redirect_login"}});
//! assert!(Operation::Login.check(&envelope).is_ok());
//! ```
//!
//! ## Modules
//!
//! - [`signing`]: Request signatures and password hashing
//! - [`status`]: Status code extraction and classification
//! - [`messages`]: Wire fields and session records
//! - [`fields`]: Lenient JSON accessors
//! - [`error`]: Error types

pub mod error;
pub mod fields;
pub mod messages;
pub mod signing;
pub mod status;

pub use error::{ProtocolError, Result};
pub use messages::{
    build_form, HandshakeRequest, Params, SessionCredentials, UserSession, METHOD_API_INIT,
    METHOD_LOGIN, METHOD_LOGOUT, RESERVED_FIELDS,
};
pub use signing::{hash_password, md5_hex, sign};
pub use status::{extract_error, Operation, Status};
