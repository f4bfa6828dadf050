//! # vbapi
//!
//! Async client for the vBulletin mobile API.
//!
//! ## Overview
//!
//! - **Session Management**: the `api_init` handshake runs in the background
//!   as soon as a [`SessionManager`] is created; every later call waits for
//!   it, then is signed with the issued credentials
//! - **Authentication**: login with a clear-text or pre-hashed password, logout
//! - **Forum Content**: forums, threads, posts, member profiles and private
//!   messages mapped into typed entities
//! - **Configuration**: TOML file with environment overrides
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Entities (Forum, Thread, Post, Member, Inbox, Message)      │
//! ├──────────────────────────────────────────────────────────────┤
//! │  SessionManager                                              │
//! │  ┌────────────────┐  ┌───────────────┐  ┌─────────────────┐  │
//! │  │ ClientIdentity │  │   InitGate    │  │   UserSession   │  │
//! │  └────────────────┘  └───────────────┘  └─────────────────┘  │
//! ├──────────────────────────────────────────────────────────────┤
//! │  Transport (reqwest)           protocol (signing, status)    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vbapi::{Config, Forum, SessionManager};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::new("https://forum.example.com/api.php", "xXxXxXxX", "my-app", "1.0");
//!     let session = SessionManager::new(&config);
//!
//!     session.login("alice", "secret").await?;
//!     for forum in Forum::list(&session).await? {
//!         println!("{} ({} threads)", forum.title, forum.thread_count);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading and defaults
//! - [`identity`]: Client identity derived from configuration
//! - [`transport`]: HTTP boundary
//! - [`session`]: Handshake gate and session manager
//! - [`entities`]: Typed forum content

pub mod config;
pub mod entities;
pub mod identity;
pub mod session;
pub mod transport;

pub use config::{Config, ConfigError};
pub use entities::{
    Forum, Inbox, Member, Message, MessageStatus, Post, PostOptions, PostReceipt, Sender, Thread,
    INBOX_FOLDER,
};
pub use identity::ClientIdentity;
pub use protocol::{ProtocolError, Result, UserSession};
pub use session::{InitGate, SessionManager, SessionPhase};
pub use transport::{FormRequest, HttpTransport, Transport};
