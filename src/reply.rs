//! Reply processing for cite-chat
//!
//! Turns an assistant message into display text: each annotation's source
//! span is replaced by a footnote marker `[n]` (n being the annotation's
//! position in the reported list) and the cited files are resolved into a
//! citation list appended below the text.

use crate::assistant::{Annotation, AnnotationKind, AssistantApi, ThreadMessage};
use std::fmt;

/// A resolved citation line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Citation {
    /// Footnote index
    pub index: usize,
    pub kind: AnnotationKind,
    pub file_id: String,
    pub filename: String,
    /// Rendered line, e.g. `[0] quoted text from manual.pdf`
    pub line: String,
}

/// Problem with a single annotation; the rest of the reply is unaffected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationIssue {
    /// The annotation references no file
    MissingFileId { index: usize, kind: AnnotationKind },
    /// The file metadata could not be retrieved
    FileLookupFailed {
        index: usize,
        file_id: String,
        message: String,
    },
}

impl AnnotationIssue {
    /// Footnote index the issue refers to
    pub fn index(&self) -> usize {
        match self {
            Self::MissingFileId { index, .. } | Self::FileLookupFailed { index, .. } => *index,
        }
    }
}

impl fmt::Display for AnnotationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFileId { index, kind } => {
                write!(f, "No file ID found for {} index {}", kind, index)
            }
            Self::FileLookupFailed {
                index,
                file_id,
                message,
            } => write!(
                f,
                "Could not resolve file {} for citation index {}: {}",
                file_id, index, message
            ),
        }
    }
}

/// Assistant reply ready for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedReply {
    /// Identifier of the source message
    pub message_id: String,
    /// Reply text with footnote markers in place of citation spans
    pub text: String,
    /// Resolved citations in annotation order
    pub citations: Vec<Citation>,
    /// Per-annotation problems to show the user
    pub issues: Vec<AnnotationIssue>,
}

impl ProcessedReply {
    /// Text, a blank line, then one citation per line
    ///
    /// # Examples
    ///
    /// ```
    /// use cite_chat::reply::ProcessedReply;
    ///
    /// let reply = ProcessedReply {
    ///     message_id: "msg_1".to_string(),
    ///     text: "Hello".to_string(),
    ///     citations: vec![],
    ///     issues: vec![],
    /// };
    /// assert_eq!(reply.render(), "Hello\n\n");
    /// ```
    pub fn render(&self) -> String {
        let lines: Vec<&str> = self.citations.iter().map(|c| c.line.as_str()).collect();
        format!("{}\n\n{}", self.text, lines.join("\n"))
    }
}

/// Resolves annotations of assistant replies against the file service
pub struct ReplyProcessor<'a> {
    api: &'a dyn AssistantApi,
}

impl<'a> ReplyProcessor<'a> {
    pub fn new(api: &'a dyn AssistantApi) -> Self {
        Self { api }
    }

    /// Process the most recent assistant message
    ///
    /// Returns `None` when there is no assistant reply to process. File
    /// lookups happen one at a time in annotation order; a failed lookup or
    /// a missing file id becomes an [`AnnotationIssue`] and processing
    /// continues with the next annotation.
    pub async fn process(&self, reply: Option<&ThreadMessage>) -> Option<ProcessedReply> {
        let message = reply?;

        let (value, annotations) = match message.primary_text() {
            Some(text) => (text.value.as_str(), text.annotations.as_slice()),
            None => {
                tracing::debug!(message_id = %message.id, "Assistant message has no text block");
                ("", &[][..])
            }
        };

        let text = insert_footnote_markers(value, annotations);
        let mut citations = Vec::new();
        let mut issues = Vec::new();

        for (index, annotation) in annotations.iter().enumerate() {
            let (kind, file_id) = if let Some(citation) = &annotation.file_citation {
                (AnnotationKind::FileCitation, citation.file_id.as_str())
            } else if let Some(path) = &annotation.file_path {
                (AnnotationKind::FilePath, path.file_id.as_str())
            } else {
                tracing::debug!(index, "Ignoring annotation without a file reference");
                continue;
            };

            if file_id.trim().is_empty() {
                tracing::warn!(index, %kind, "Annotation has no file id");
                issues.push(AnnotationIssue::MissingFileId { index, kind });
                continue;
            }

            match self.api.retrieve_file(file_id).await {
                Ok(file) => {
                    let line = match kind {
                        AnnotationKind::FileCitation => {
                            let quote = annotation
                                .file_citation
                                .as_ref()
                                .and_then(|c| c.quote.as_deref())
                                .filter(|q| !q.trim().is_empty());
                            match quote {
                                Some(quote) => {
                                    format!("[{}] {} from {}", index, quote, file.filename)
                                }
                                None => format!("[{}] from {}", index, file.filename),
                            }
                        }
                        AnnotationKind::FilePath => {
                            format!("[{}] Click <here> to download {}", index, file.filename)
                        }
                    };
                    citations.push(Citation {
                        index,
                        kind,
                        file_id: file_id.to_string(),
                        filename: file.filename,
                        line,
                    });
                }
                Err(e) => {
                    tracing::warn!(index, file_id, "File lookup failed: {}", e);
                    issues.push(AnnotationIssue::FileLookupFailed {
                        index,
                        file_id: file_id.to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }

        tracing::debug!(
            message_id = %message.id,
            annotations = annotations.len(),
            citations = citations.len(),
            issues = issues.len(),
            "Processed assistant reply"
        );

        Some(ProcessedReply {
            message_id: message.id.clone(),
            text,
            citations,
            issues,
        })
    }
}

/// Replace each annotation's source span with `[index]`
///
/// Character offsets are used when they are in range, select exactly the
/// annotation's text and do not overlap a span already taken. Otherwise the
/// first occurrence of the text in the original reply that overlaps no taken
/// span is used, after all offset based spans are claimed. Inserted markers
/// are never searched. An annotation with empty text and unusable offsets
/// gets no marker.
///
/// # Examples
///
/// ```
/// use cite_chat::assistant::Annotation;
/// use cite_chat::reply::insert_footnote_markers;
///
/// let annotations = vec![
///     Annotation::file_citation("†", "f1", None).with_offsets(1, 2),
///     Annotation::file_citation("†", "f2", None).with_offsets(4, 5),
/// ];
/// assert_eq!(insert_footnote_markers("a† b†", &annotations), "a[0] b[1]");
/// ```
pub fn insert_footnote_markers(value: &str, annotations: &[Annotation]) -> String {
    let boundaries: Vec<usize> = value
        .char_indices()
        .map(|(byte, _)| byte)
        .chain(std::iter::once(value.len()))
        .collect();

    let mut spans: Vec<(usize, usize, usize)> = Vec::new();
    let mut literal: Vec<usize> = Vec::new();

    for (index, annotation) in annotations.iter().enumerate() {
        let span = match (annotation.start_index, annotation.end_index) {
            (Some(start), Some(end)) if start < end && end < boundaries.len() => {
                let (from, to) = (boundaries[start], boundaries[end]);
                let matches_text = value[from..to] == annotation.text;
                let overlaps = spans.iter().any(|&(_, s, e)| from < e && s < to);
                (matches_text && !overlaps).then_some((index, from, to))
            }
            _ => None,
        };

        match span {
            Some(span) => spans.push(span),
            None if !annotation.text.is_empty() => literal.push(index),
            None => tracing::debug!(index, "Annotation has no source text to replace"),
        }
    }

    for index in literal {
        match first_free_occurrence(value, &annotations[index].text, &spans) {
            Some((from, to)) => spans.push((index, from, to)),
            None => tracing::debug!(index, "Annotation text not found in reply"),
        }
    }

    let mut text = value.to_string();
    spans.sort_by(|a, b| b.1.cmp(&a.1));
    for (index, from, to) in spans {
        text.replace_range(from..to, &format!("[{}]", index));
    }

    text
}

/// Byte range of the first occurrence of `source` in `value` that overlaps
/// no taken span
fn first_free_occurrence(
    value: &str,
    source: &str,
    taken: &[(usize, usize, usize)],
) -> Option<(usize, usize)> {
    let mut start = 0;
    while let Some(offset) = value[start..].find(source) {
        let from = start + offset;
        let to = from + source.len();
        if !taken.iter().any(|&(_, s, e)| from < e && s < to) {
            return Some((from, to));
        }
        start = from + value[from..].chars().next().map_or(1, char::len_utf8);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::{FileObject, MockAssistantApi, Role};
    use crate::error::CiteChatError;

    fn reply(value: &str, annotations: Vec<Annotation>) -> ThreadMessage {
        ThreadMessage::text("msg_1", Role::Assistant, value, annotations)
    }

    fn expect_file(api: &mut MockAssistantApi, file_id: &'static str, filename: &'static str) {
        api.expect_retrieve_file()
            .withf(move |id| id == file_id)
            .times(1)
            .returning(move |_| {
                Ok(FileObject {
                    id: file_id.to_string(),
                    filename: filename.to_string(),
                })
            });
    }

    #[tokio::test]
    async fn test_no_annotations_renders_text_and_blank_line() {
        let api = MockAssistantApi::new();
        let message = reply("Plain answer.", vec![]);

        let processed = ReplyProcessor::new(&api)
            .process(Some(&message))
            .await
            .unwrap();
        assert_eq!(processed.render(), "Plain answer.\n\n");
        assert!(processed.citations.is_empty());
        assert!(processed.issues.is_empty());
    }

    #[tokio::test]
    async fn test_file_citation_is_resolved() {
        let mut api = MockAssistantApi::new();
        expect_file(&mut api, "f1", "doc.pdf");
        let message = reply(
            "The logo uses X for contrast.",
            vec![Annotation::file_citation("X", "f1", Some("Q"))],
        );

        let processed = ReplyProcessor::new(&api)
            .process(Some(&message))
            .await
            .unwrap();
        assert_eq!(processed.text, "The logo uses [0] for contrast.");
        let lines: Vec<&str> = processed.citations.iter().map(|c| c.line.as_str()).collect();
        assert_eq!(lines, vec!["[0] Q from doc.pdf"]);
        assert_eq!(
            processed.render(),
            "The logo uses [0] for contrast.\n\n[0] Q from doc.pdf"
        );
    }

    #[tokio::test]
    async fn test_missing_file_id_reports_issue_and_continues() {
        let mut api = MockAssistantApi::new();
        expect_file(&mut api, "f2", "guide.pdf");
        let message = reply(
            "First【a】 second【b】",
            vec![
                Annotation::file_citation("【a】", "", Some("lost")),
                Annotation::file_citation("【b】", "f2", Some("kept")),
            ],
        );

        let processed = ReplyProcessor::new(&api)
            .process(Some(&message))
            .await
            .unwrap();
        assert_eq!(processed.text, "First[0] second[1]");
        assert_eq!(processed.citations.len(), 1);
        assert_eq!(processed.citations[0].line, "[1] kept from guide.pdf");
        assert_eq!(
            processed.issues,
            vec![AnnotationIssue::MissingFileId {
                index: 0,
                kind: AnnotationKind::FileCitation
            }]
        );
        assert_eq!(
            processed.issues[0].to_string(),
            "No file ID found for citation index 0"
        );
    }

    #[tokio::test]
    async fn test_file_path_annotation() {
        let mut api = MockAssistantApi::new();
        expect_file(&mut api, "f9", "report.csv");
        let message = reply(
            "Download: sandbox:/mnt/data/report.csv",
            vec![Annotation::file_path("sandbox:/mnt/data/report.csv", "f9")],
        );

        let processed = ReplyProcessor::new(&api)
            .process(Some(&message))
            .await
            .unwrap();
        assert_eq!(
            processed.render(),
            "Download: [0]\n\n[0] Click <here> to download report.csv"
        );
    }

    #[tokio::test]
    async fn test_file_path_without_id() {
        let api = MockAssistantApi::new();
        let message = reply("x【p】", vec![Annotation::file_path("【p】", " ")]);

        let processed = ReplyProcessor::new(&api)
            .process(Some(&message))
            .await
            .unwrap();
        assert!(processed.citations.is_empty());
        assert_eq!(
            processed.issues[0].to_string(),
            "No file ID found for file path index 0"
        );
    }

    #[tokio::test]
    async fn test_unrecognized_annotation_only_replaces_text() {
        let api = MockAssistantApi::new();
        let unknown = Annotation {
            text: "【u】".to_string(),
            ..Default::default()
        };
        let message = reply("see【u】", vec![unknown]);

        let processed = ReplyProcessor::new(&api)
            .process(Some(&message))
            .await
            .unwrap();
        assert_eq!(processed.text, "see[0]");
        assert!(processed.citations.is_empty());
        assert!(processed.issues.is_empty());
    }

    #[tokio::test]
    async fn test_file_lookup_failure_is_reported_per_index() {
        let mut api = MockAssistantApi::new();
        api.expect_retrieve_file()
            .withf(|id| id == "gone")
            .times(1)
            .returning(|_| Err(CiteChatError::service("retrieve_file", 404, "No such File").into()));
        expect_file(&mut api, "f1", "doc.pdf");
        let message = reply(
            "a【1】 b【2】",
            vec![
                Annotation::file_citation("【1】", "gone", Some("q1")),
                Annotation::file_citation("【2】", "f1", Some("q2")),
            ],
        );

        let processed = ReplyProcessor::new(&api)
            .process(Some(&message))
            .await
            .unwrap();
        assert_eq!(processed.citations.len(), 1);
        assert_eq!(processed.citations[0].index, 1);
        assert_eq!(processed.issues.len(), 1);
        assert_eq!(processed.issues[0].index(), 0);
        assert!(processed.issues[0].to_string().contains("No such File"));
    }

    #[tokio::test]
    async fn test_citation_without_quote() {
        let mut api = MockAssistantApi::new();
        expect_file(&mut api, "f1", "doc.pdf");
        let message = reply("a【1】", vec![Annotation::file_citation("【1】", "f1", None)]);

        let processed = ReplyProcessor::new(&api)
            .process(Some(&message))
            .await
            .unwrap();
        assert_eq!(processed.citations[0].line, "[0] from doc.pdf");
    }

    #[tokio::test]
    async fn test_no_assistant_reply_returns_none() {
        let api = MockAssistantApi::new();
        assert!(ReplyProcessor::new(&api).process(None).await.is_none());
    }

    #[tokio::test]
    async fn test_message_without_text_block() {
        let api = MockAssistantApi::new();
        let mut message = reply("ignored", vec![]);
        message.content.clear();

        let processed = ReplyProcessor::new(&api)
            .process(Some(&message))
            .await
            .unwrap();
        assert_eq!(processed.render(), "\n\n");
    }

    #[test]
    fn test_markers_use_offsets_for_identical_sources() {
        let annotations = vec![
            Annotation::file_citation("【s】", "f1", None).with_offsets(7, 10),
            Annotation::file_citation("【s】", "f2", None).with_offsets(1, 4),
        ];
        // Offsets decide placement, not the order of literal occurrences
        assert_eq!(
            insert_footnote_markers("a【s】 b 【s】", &annotations),
            "a[1] b [0]"
        );
    }

    #[test]
    fn test_markers_offsets_are_character_based() {
        let annotations = vec![
            Annotation::file_citation("【1】", "f1", None).with_offsets(4, 7),
            Annotation::file_citation("【2】", "f2", None).with_offsets(12, 15),
        ];
        assert_eq!(
            insert_footnote_markers("Café【1】 and 【2】", &annotations),
            "Café[0] and [1]"
        );
    }

    #[test]
    fn test_markers_fall_back_to_first_occurrence() {
        let annotations = vec![
            Annotation::file_citation("【s】", "f1", None),
            Annotation::file_citation("【s】", "f2", None),
        ];
        assert_eq!(
            insert_footnote_markers("a【s】 b【s】 c", &annotations),
            "a[0] b[1] c"
        );
    }

    #[test]
    fn test_markers_mismatched_offsets_fall_back_to_text() {
        let annotations = vec![Annotation::file_citation("【x】", "f1", None).with_offsets(0, 3)];
        assert_eq!(insert_footnote_markers("ab 【x】", &annotations), "ab [0]");

        let out_of_range =
            vec![Annotation::file_citation("【x】", "f1", None).with_offsets(10, 40)];
        assert_eq!(insert_footnote_markers("ab 【x】", &out_of_range), "ab [0]");
    }

    #[test]
    fn test_markers_fallback_ignores_inserted_markers() {
        let annotations = vec![
            Annotation::file_citation("【a】", "f1", None).with_offsets(1, 4),
            Annotation::file_citation("0", "f2", None),
            Annotation::file_citation("]", "f3", None),
        ];
        assert_eq!(
            insert_footnote_markers("x【a】 ref 0 end]", &annotations),
            "x[0] ref [1] end[2]"
        );
    }

    #[test]
    fn test_markers_fallback_skips_occurrence_inside_offset_span() {
        let annotations = vec![
            Annotation::file_citation("【s】", "f1", None).with_offsets(1, 4),
            Annotation::file_citation("【s】", "f2", None),
        ];
        assert_eq!(
            insert_footnote_markers("a【s】 b【s】", &annotations),
            "a[0] b[1]"
        );
    }

    #[test]
    fn test_markers_skip_empty_source_text() {
        let annotations = vec![Annotation::file_citation("", "f1", None)];
        assert_eq!(insert_footnote_markers("unchanged", &annotations), "unchanged");
    }

    #[test]
    fn test_markers_missing_source_leaves_text() {
        let annotations = vec![Annotation::file_citation("【z】", "f1", None)];
        assert_eq!(insert_footnote_markers("no marker", &annotations), "no marker");
    }
}
