//! Wire types for the hosted assistant service
//!
//! These mirror the request/response contracts of the Assistants API (v2):
//! threads, messages with annotated text content, runs, and file metadata.
//! Unknown variants deserialize to catch-all values instead of failing so a
//! newer service never breaks a turn.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Author of a thread message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Message written by the person at the keyboard
    User,
    /// Message produced by the assistant during a run
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// Remote conversation container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    /// Thread identifier (e.g. `thread_abc123`)
    pub id: String,
}

/// Lifecycle status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Incomplete,
    Expired,
    /// Any status this client does not know about
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// Whether the run is still waiting to be picked up or being processed
    ///
    /// # Examples
    ///
    /// ```
    /// use cite_chat::assistant::RunStatus;
    ///
    /// assert!(RunStatus::Queued.is_pending());
    /// assert!(RunStatus::InProgress.is_pending());
    /// assert!(!RunStatus::Completed.is_pending());
    /// assert!(!RunStatus::Failed.is_pending());
    /// ```
    pub fn is_pending(self) -> bool {
        matches!(self, Self::Queued | Self::InProgress)
    }

    /// Wire name of the status
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::InProgress => "in_progress",
            Self::RequiresAction => "requires_action",
            Self::Cancelling => "cancelling",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
            Self::Completed => "completed",
            Self::Incomplete => "incomplete",
            Self::Expired => "expired",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure detail attached to a run that did not complete
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

/// Asynchronous job processing a thread with an assistant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    /// Run identifier (e.g. `run_abc123`)
    pub id: String,
    /// Thread the run belongs to
    #[serde(default)]
    pub thread_id: String,
    /// Current status
    pub status: RunStatus,
    /// Populated when the run failed
    #[serde(default)]
    pub last_error: Option<RunError>,
}

impl Run {
    /// Create a run value with the given status and no error detail
    pub fn new(id: impl Into<String>, thread_id: impl Into<String>, status: RunStatus) -> Self {
        Self {
            id: id.into(),
            thread_id: thread_id.into(),
            status,
            last_error: None,
        }
    }
}

/// Quote cited from an uploaded file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCitation {
    #[serde(default)]
    pub file_id: String,
    /// Quoted excerpt; the v2 API may omit it
    #[serde(default)]
    pub quote: Option<String>,
}

/// Reference to a file generated by the assistant
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePathRef {
    #[serde(default)]
    pub file_id: String,
}

/// Citation span within an assistant reply
///
/// The service reports one of `file_citation` or `file_path`; annotations
/// carrying neither are kept so their source span can still be replaced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// Literal source text in the reply (e.g. `【4:0†source】`)
    #[serde(default)]
    pub text: String,
    /// Start offset of `text` in the reply, in characters
    #[serde(default)]
    pub start_index: Option<usize>,
    /// End offset (exclusive) of `text` in the reply, in characters
    #[serde(default)]
    pub end_index: Option<usize>,
    #[serde(default)]
    pub file_citation: Option<FileCitation>,
    #[serde(default)]
    pub file_path: Option<FilePathRef>,
}

/// Which citation shape an annotation carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationKind {
    FileCitation,
    FilePath,
}

impl fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FileCitation => write!(f, "citation"),
            Self::FilePath => write!(f, "file path"),
        }
    }
}

impl Annotation {
    /// Creates a file-citation annotation without offsets
    ///
    /// # Examples
    ///
    /// ```
    /// use cite_chat::assistant::{Annotation, AnnotationKind};
    ///
    /// let annotation = Annotation::file_citation("【1†source】", "file-1", Some("a quote"));
    /// assert_eq!(annotation.kind(), Some(AnnotationKind::FileCitation));
    /// ```
    pub fn file_citation(
        text: impl Into<String>,
        file_id: impl Into<String>,
        quote: Option<&str>,
    ) -> Self {
        Self {
            text: text.into(),
            file_citation: Some(FileCitation {
                file_id: file_id.into(),
                quote: quote.map(str::to_string),
            }),
            ..Default::default()
        }
    }

    /// Creates a file-path annotation without offsets
    pub fn file_path(text: impl Into<String>, file_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            file_path: Some(FilePathRef {
                file_id: file_id.into(),
            }),
            ..Default::default()
        }
    }

    /// Attach character offsets to the annotation
    pub fn with_offsets(mut self, start: usize, end: usize) -> Self {
        self.start_index = Some(start);
        self.end_index = Some(end);
        self
    }

    /// Citation shape, or `None` when the annotation carries neither
    pub fn kind(&self) -> Option<AnnotationKind> {
        if self.file_citation.is_some() {
            Some(AnnotationKind::FileCitation)
        } else if self.file_path.is_some() {
            Some(AnnotationKind::FilePath)
        } else {
            None
        }
    }
}

/// Text block of a message with its annotations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextContent {
    pub value: String,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

/// One content block of a thread message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    Text { text: TextContent },
    /// Image and other non-text blocks
    #[serde(other)]
    Other,
}

/// Message stored in a remote thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadMessage {
    pub id: String,
    /// Creation time, unix seconds
    #[serde(default)]
    pub created_at: i64,
    pub role: Role,
    #[serde(default)]
    pub content: Vec<MessageContent>,
    /// Run that produced the message (assistant messages only)
    #[serde(default)]
    pub run_id: Option<String>,
}

impl ThreadMessage {
    /// Builds a message with a single text block
    pub fn text(
        id: impl Into<String>,
        role: Role,
        value: impl Into<String>,
        annotations: Vec<Annotation>,
    ) -> Self {
        Self {
            id: id.into(),
            created_at: 0,
            role,
            content: vec![MessageContent::Text {
                text: TextContent {
                    value: value.into(),
                    annotations,
                },
            }],
            run_id: None,
        }
    }

    /// First text block of the message, if any
    pub fn primary_text(&self) -> Option<&TextContent> {
        self.content.iter().find_map(|block| match block {
            MessageContent::Text { text } => Some(text),
            MessageContent::Other => None,
        })
    }
}

/// Page of messages returned by the list endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct MessageList {
    pub data: Vec<ThreadMessage>,
    #[serde(default)]
    pub has_more: bool,
}

/// Uploaded file metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileObject {
    pub id: String,
    pub filename: String,
}

/// Select the newest assistant message from a listing
///
/// With `run_id` set only messages produced by that run qualify, so a run
/// that wrote nothing yields `None` even on a thread holding older replies.
/// Among the candidates the greatest `created_at` wins; ties go to the
/// message listed first, which is the newest under the service's descending
/// order.
///
/// # Examples
///
/// ```
/// use cite_chat::assistant::{latest_assistant_message, Role, ThreadMessage};
///
/// let messages = vec![
///     ThreadMessage::text("msg_2", Role::Assistant, "second", vec![]),
///     ThreadMessage::text("msg_1", Role::User, "first", vec![]),
/// ];
/// let latest = latest_assistant_message(&messages, None).unwrap();
/// assert_eq!(latest.id, "msg_2");
/// ```
pub fn latest_assistant_message<'a>(
    messages: &'a [ThreadMessage],
    run_id: Option<&str>,
) -> Option<&'a ThreadMessage> {
    messages
        .iter()
        .filter(|m| m.role == Role::Assistant)
        .filter(|m| match run_id {
            Some(id) => m.run_id.as_deref() == Some(id),
            None => true,
        })
        .fold(None, |best: Option<&ThreadMessage>, m| match best {
            Some(b) if b.created_at >= m.created_at => Some(b),
            _ => Some(m),
        })
}
