//! Conversation driver for cite-chat
//!
//! One call to [`ConversationDriver::submit`] is one chat turn: the prompt
//! is recorded locally and posted to the remote thread, a run is started and
//! awaited, and the newest assistant message is processed into display text
//! and appended to the transcript.

use crate::assistant::{latest_assistant_message, AssistantApi, Role};
use crate::config::Config;
use crate::error::{CiteChatError, Result};
use crate::poller::RunPoller;
use crate::reply::{ProcessedReply, ReplyProcessor};
use crate::session::Session;

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Result of a completed turn
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// Thread the turn ran on
    pub thread_id: String,
    /// Run that produced the reply
    pub run_id: String,
    /// Processed reply, `None` when the run produced no assistant message
    pub reply: Option<ProcessedReply>,
}

/// Drives chat turns against the assistant service
#[derive(Debug, Clone)]
pub struct ConversationDriver {
    assistant_id: String,
    poller: RunPoller,
    reuse_thread: bool,
}

impl ConversationDriver {
    /// Create a driver
    ///
    /// # Arguments
    ///
    /// * `assistant_id` - Assistant that runs are started with
    /// * `poller` - Strategy for waiting on runs
    /// * `reuse_thread` - Keep one thread per session instead of one per turn
    pub fn new(assistant_id: impl Into<String>, poller: RunPoller, reuse_thread: bool) -> Self {
        Self {
            assistant_id: assistant_id.into(),
            poller,
            reuse_thread,
        }
    }

    /// Create a driver from validated configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.assistant.assistant_id.clone(),
            RunPoller::from_config(&config.polling),
            config.conversation.reuse_thread,
        )
    }

    /// Run one chat turn
    ///
    /// The user message is appended to the transcript before any remote
    /// call, so it stays there (unanswered) when a later step fails. The
    /// assistant message is appended only when the run completed and
    /// produced a reply.
    ///
    /// # Arguments
    ///
    /// * `session` - Session whose transcript and thread are used
    /// * `prompt` - User input; must not be blank
    /// * `cancel` - Aborts the wait for the run
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a blank prompt or closed session, any
    /// service error from thread/message/run creation or message listing,
    /// and the run poller's errors. Runs abandoned through cancellation or
    /// an exhausted polling budget are cancelled remotely on a best-effort
    /// basis and their thread is dropped from the session, so the next turn
    /// starts on a new thread.
    pub async fn submit(
        &self,
        session: &mut Session,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<TurnOutcome> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(CiteChatError::InvalidInput("prompt is empty".to_string()).into());
        }
        if !session.is_started() {
            return Err(CiteChatError::InvalidInput("session is closed".to_string()).into());
        }

        let api = Arc::clone(session.api());
        session.transcript_mut().push(Role::User, prompt);

        let thread_id = self.ensure_thread(session, api.as_ref()).await?;
        api.create_message(&thread_id, Role::User, prompt).await?;

        let run = api
            .create_run(&thread_id, &self.assistant_id)
            .await
            .map_err(|e| {
                tracing::error!(thread_id = %thread_id, "Failed to create run: {}", e);
                e
            })?;
        tracing::info!(thread_id = %thread_id, run_id = %run.id, "Run created");

        let run = match self.poller.wait(api.as_ref(), &thread_id, run, cancel).await {
            Ok(run) => run,
            Err(e) => {
                if let Some(run_id) = abandoned_run_id(&e) {
                    if let Err(cancel_err) = api.cancel_run(&thread_id, run_id).await {
                        tracing::warn!(run_id, "Failed to cancel abandoned run: {}", cancel_err);
                    }
                    // The thread stays locked while the run is active or cancelling
                    session.clear_thread();
                }
                return Err(e);
            }
        };

        let messages = api.list_messages(&thread_id).await?;
        let latest = latest_assistant_message(&messages, Some(&run.id));
        let reply = ReplyProcessor::new(api.as_ref()).process(latest).await;

        match &reply {
            Some(processed) => {
                session
                    .transcript_mut()
                    .push(Role::Assistant, processed.render());
            }
            None => tracing::warn!(run_id = %run.id, "Run completed without an assistant reply"),
        }

        Ok(TurnOutcome {
            thread_id,
            run_id: run.id,
            reply,
        })
    }

    async fn ensure_thread(&self, session: &mut Session, api: &dyn AssistantApi) -> Result<String> {
        if self.reuse_thread {
            if let Some(existing) = session.thread_id() {
                return Ok(existing.to_string());
            }
        }

        let thread = api.create_thread().await?;
        tracing::info!(thread_id = %thread.id, "Created thread");
        session.set_thread_id(thread.id.clone());
        Ok(thread.id)
    }
}

/// Run id of a run the poller stopped waiting for
fn abandoned_run_id(error: &anyhow::Error) -> Option<&str> {
    match error.downcast_ref::<CiteChatError>()? {
        CiteChatError::Cancelled { run_id }
        | CiteChatError::PollTimeout { run_id, .. }
        | CiteChatError::PollAttemptsExceeded { run_id, .. } => Some(run_id),
        _ => None,
    }
}
