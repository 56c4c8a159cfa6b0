//! Command handlers for cite-chat
//!
//! `chat` runs the interactive loop, `ask` answers a single prompt. Both
//! build the same client and driver from configuration.

pub mod ask;
pub mod chat;
pub mod render;
pub mod special_commands;

use crate::assistant::{AssistantApi, OpenAiAssistantClient};
use crate::config::Config;
use crate::conversation::ConversationDriver;
use crate::error::Result;

use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Build the service client and conversation driver
///
/// # Errors
///
/// Returns error if the HTTP client cannot be created
pub fn connect(config: &Config) -> Result<(Arc<dyn AssistantApi>, ConversationDriver)> {
    let api: Arc<dyn AssistantApi> = Arc::new(OpenAiAssistantClient::new(&config.assistant)?);
    Ok((api, ConversationDriver::from_config(config)))
}

/// Cancel `token` when the user presses Ctrl-C
///
/// Abort the returned handle once the guarded work has finished.
pub fn spawn_interrupt_watcher(token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, cancelling pending request");
            token.cancel();
        }
    })
}
