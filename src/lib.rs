//! cite-chat - terminal front-end for hosted retrieval assistants
//!
//! This library forwards questions to a hosted assistant service, waits for
//! the assistant's run to finish, and turns the reply's file citations into
//! numbered footnotes.
//!
//! # Architecture
//!
//! - `assistant`: service trait, wire types and the HTTP client
//! - `session`: per-session transcript and thread state
//! - `conversation`: one chat turn, from prompt to processed reply
//! - `poller`: bounded, cancellable wait for a run
//! - `reply`: citation annotation resolution
//! - `config`: configuration management and validation
//! - `cli` / `commands`: command-line front-end
//! - `error`: error types and result alias
//!
//! # Example
//!
//! ```no_run
//! use cite_chat::{Config, ConversationDriver, Session};
//! use cite_chat::assistant::OpenAiAssistantClient;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let api = Arc::new(OpenAiAssistantClient::new(&config.assistant)?);
//!     let driver = ConversationDriver::from_config(&config);
//!     let mut session = Session::new(api);
//!
//!     let outcome = driver
//!         .submit(&mut session, "What does the style guide say?", &CancellationToken::new())
//!         .await?;
//!     if let Some(reply) = outcome.reply {
//!         println!("{}", reply.render());
//!     }
//!     Ok(())
//! }
//! ```

pub mod assistant;
pub mod cli;
pub mod commands;
pub mod config;
pub mod conversation;
pub mod error;
pub mod poller;
pub mod reply;
pub mod session;

// Re-export commonly used types
pub use assistant::{AssistantApi, OpenAiAssistantClient};
pub use config::Config;
pub use conversation::{ConversationDriver, TurnOutcome};
pub use error::{CiteChatError, Result};
pub use poller::RunPoller;
pub use reply::{ProcessedReply, ReplyProcessor};
pub use session::Session;
