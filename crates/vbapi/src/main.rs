//! vbapi
//!
//! Command-line client for the vBulletin mobile API.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use vbapi::config::Config;
use vbapi::{
    Forum, Inbox, Member, Message, Post, PostOptions, SessionManager, Thread, INBOX_FOLDER,
};

/// vbapi - read and post to a vBulletin forum from the terminal.
#[derive(Parser, Debug)]
#[command(name = "vbapi")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Username to log in with before running the command
    #[arg(short, long, global = true, env = "VBAPI_USERNAME")]
    pub username: Option<String>,

    /// Password for --username
    #[arg(short, long, global = true, env = "VBAPI_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List every forum visible to the user
    Forums,

    /// Show a forum with its sub-forums and threads
    Forum {
        /// Forum ID
        forum_id: u64,
    },

    /// Show a thread and its posts
    Thread {
        /// Thread ID
        thread_id: u64,
    },

    /// Show a member profile
    Member {
        /// Username to look up
        username: String,
    },

    /// List private messages
    Inbox {
        /// Folder ID (0 is the inbox)
        #[arg(long, default_value_t = INBOX_FOLDER)]
        folder: u64,
    },

    /// Show a private message
    Message {
        /// Private message ID
        pm_id: u64,
    },

    /// Send a private message
    Send {
        /// Recipients, separated by ';'
        to: String,
        /// Message title
        title: String,
        /// Message body
        body: String,
        /// Append your signature
        #[arg(long)]
        signature: bool,
    },

    /// Reply to a thread
    Reply {
        /// Thread ID
        thread_id: u64,
        /// Post body
        message: String,
        /// Append your signature
        #[arg(long)]
        signature: bool,
    },

    /// Start a new thread
    NewThread {
        /// Forum ID
        forum_id: u64,
        /// Thread subject
        subject: String,
        /// First post body
        message: String,
        /// Append your signature
        #[arg(long)]
        signature: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = if let Some(config_path) = &cli.config {
        Config::load(config_path)?
    } else {
        Config::load_default()?
    };

    // Apply environment variable overrides
    config.apply_env_overrides();

    // Initialize tracing
    let filter = if cli.verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(config_path) = &cli.config {
        tracing::info!("Using config file: {:?}", config_path);
    }

    // Validate configuration
    config.validate()?;

    let session = SessionManager::new(&config);
    session
        .wait_for_initialization(config.init_timeout())
        .await
        .context("Failed to connect to the forum API")?;

    if let Some(username) = &cli.username {
        let password = cli
            .password
            .as_deref()
            .context("--password is required with --username")?;
        let user = session
            .login(username, password)
            .await
            .with_context(|| format!("Failed to log in as {}", username))?;
        tracing::info!("Logged in as {} (user id {})", user.username, user.user_id);
    }

    match cli.command {
        Commands::Forums => print_json(&Forum::list(&session).await?)?,
        Commands::Forum { forum_id } => print_json(&Forum::get(&session, forum_id).await?)?,
        Commands::Thread { thread_id } => print_json(&Thread::get(&session, thread_id).await?)?,
        Commands::Member { username } => print_json(&Member::get(&session, &username).await?)?,
        Commands::Inbox { folder } => print_json(&Inbox::get(&session, folder).await?)?,
        Commands::Message { pm_id } => print_json(&Message::get(&session, pm_id).await?)?,
        Commands::Send {
            to,
            title,
            body,
            signature,
        } => {
            let options = PostOptions {
                signature,
                ..PostOptions::default()
            };
            Message::send(&session, &to, &title, &body, &options)
                .await
                .with_context(|| format!("Failed to send message to {}", to))?;
            println!("Message sent to {}", to);
        }
        Commands::Reply {
            thread_id,
            message,
            signature,
        } => {
            let options = PostOptions {
                signature,
                ..PostOptions::default()
            };
            let receipt = Post::create(&session, thread_id, &message, &options)
                .await
                .with_context(|| format!("Failed to reply to thread {}", thread_id))?;
            print_json(&receipt)?;
        }
        Commands::NewThread {
            forum_id,
            subject,
            message,
            signature,
        } => {
            let options = PostOptions {
                signature,
                ..PostOptions::default()
            };
            let receipt = Thread::create(&session, forum_id, &subject, &message, &options)
                .await
                .with_context(|| format!("Failed to create thread in forum {}", forum_id))?;
            print_json(&receipt)?;
        }
    }

    if session.user_session().await.logged_in {
        if let Err(e) = session.logout().await {
            tracing::warn!("Logout failed: {}", e);
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to render output")?;
    println!("{}", rendered);
    Ok(())
}
