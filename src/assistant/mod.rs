//! Assistant service module for cite-chat
//!
//! This module contains the abstraction over the hosted assistant service
//! (threads, messages, runs, files) and its HTTP implementation.

pub mod openai;
pub mod types;

pub use openai::OpenAiAssistantClient;
pub use types::{
    latest_assistant_message, Annotation, AnnotationKind, FileCitation, FileObject, FilePathRef,
    MessageContent, MessageList, Role, Run, RunError, RunStatus, TextContent, Thread,
    ThreadMessage,
};

use crate::error::Result;
use async_trait::async_trait;

/// Remote operations consumed from the hosted assistant service
///
/// Every call is a single request/response; implementations must not retry.
/// The conversation driver, run poller and reply processor only talk to the
/// service through this trait, which keeps them testable against mocks.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssistantApi: Send + Sync {
    /// Create an empty conversation thread
    async fn create_thread(&self) -> Result<Thread>;

    /// Append a message to a thread
    async fn create_message(
        &self,
        thread_id: &str,
        role: Role,
        content: &str,
    ) -> Result<ThreadMessage>;

    /// Start a run of `assistant_id` over the thread
    ///
    /// # Errors
    ///
    /// Returns a service error on quota, authentication or validation failure
    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run>;

    /// Fetch the current state of a run
    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run>;

    /// Ask the service to stop a pending run
    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<Run>;

    /// List the thread's messages, newest first
    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>>;

    /// Fetch metadata of an uploaded file
    async fn retrieve_file(&self, file_id: &str) -> Result<FileObject>;
}
