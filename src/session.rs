//! Session state for cite-chat
//!
//! A [`Session`] owns everything that lives for one chat session: the
//! service handle, the local transcript and the active remote thread. It is
//! created explicitly at startup and passed to every conversation turn.

use crate::assistant::{AssistantApi, Role};
use chrono::{DateTime, Local};
use std::sync::Arc;

/// One message of the local transcript
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub role: Role,
    pub content: String,
    /// When the entry was appended
    pub at: DateTime<Local>,
}

/// Append-only list of chat messages, in submission order
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and return a reference to it
    pub fn push(&mut self, role: Role, content: impl Into<String>) -> &TranscriptEntry {
        self.entries.push(TranscriptEntry {
            role,
            content: content.into(),
            at: Local::now(),
        });
        // The vector cannot be empty right after a push
        &self.entries[self.entries.len() - 1]
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&TranscriptEntry> {
        self.entries.last()
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

/// State of one interactive chat session
pub struct Session {
    api: Arc<dyn AssistantApi>,
    transcript: Transcript,
    thread_id: Option<String>,
    started: bool,
}

impl Session {
    /// Start a session bound to the given service handle
    pub fn new(api: Arc<dyn AssistantApi>) -> Self {
        tracing::debug!("Chat session started");
        Self {
            api,
            transcript: Transcript::new(),
            thread_id: None,
            started: true,
        }
    }

    /// Service handle used by this session
    pub fn api(&self) -> &Arc<dyn AssistantApi> {
        &self.api
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn transcript_mut(&mut self) -> &mut Transcript {
        &mut self.transcript
    }

    /// Active remote thread, if one has been created
    pub fn thread_id(&self) -> Option<&str> {
        self.thread_id.as_deref()
    }

    pub fn set_thread_id(&mut self, thread_id: impl Into<String>) {
        self.thread_id = Some(thread_id.into());
    }

    /// Forget the active thread; the transcript is kept
    pub fn clear_thread(&mut self) {
        if let Some(thread_id) = self.thread_id.take() {
            tracing::debug!(thread_id = %thread_id, "Dropped active thread");
        }
    }

    /// Whether the session is accepting input
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Clear the transcript and forget the thread
    ///
    /// The next prompt starts a new remote thread.
    pub fn reset(&mut self) {
        tracing::info!(
            messages = self.transcript.len(),
            thread_id = ?self.thread_id,
            "Resetting chat session"
        );
        self.transcript.clear();
        self.thread_id = None;
    }

    /// End the session; further turns are rejected
    pub fn close(&mut self) {
        self.started = false;
        tracing::debug!("Chat session closed");
    }
}
