//! HTTP implementation of the assistant service
//!
//! Talks to the OpenAI Assistants API (v2). Each trait method maps to one
//! request; non-success responses are turned into
//! [`CiteChatError::Service`] with the service's own error message.

use crate::assistant::{
    AssistantApi, FileObject, MessageList, Role, Run, Thread, ThreadMessage,
};
use crate::config::AssistantConfig;
use crate::error::{CiteChatError, Result};

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Number of messages requested per listing
const MESSAGE_PAGE_LIMIT: u32 = 100;

/// Assistants API client
///
/// # Examples
///
/// ```
/// use cite_chat::assistant::OpenAiAssistantClient;
/// use cite_chat::config::AssistantConfig;
///
/// let config = AssistantConfig {
///     api_key: Some("sk-test".to_string()),
///     assistant_id: "asst_123".to_string(),
///     ..Default::default()
/// };
/// let client = OpenAiAssistantClient::new(&config).unwrap();
/// assert_eq!(client.api_base(), "https://api.openai.com/v1");
/// ```
pub struct OpenAiAssistantClient {
    client: Client,
    api_base: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct CreateMessageRequest<'a> {
    role: Role,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateRunRequest<'a> {
    assistant_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
}

impl OpenAiAssistantClient {
    /// Create a new client from configuration
    ///
    /// # Errors
    ///
    /// Returns error if no API key is configured or the HTTP client cannot
    /// be built
    pub fn new(config: &AssistantConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                CiteChatError::MissingCredentials(format!(
                    "{} is not set",
                    crate::config::API_KEY_ENV
                ))
            })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent(concat!("cite-chat/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CiteChatError::Config(format!("Failed to create HTTP client: {}", e)))?;

        let api_base = config.api_base.trim_end_matches('/').to_string();
        tracing::info!("Initialized assistant client: api_base={}", api_base);

        Ok(Self {
            client,
            api_base,
            api_key,
        })
    }

    /// Base URL requests are sent to
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.api_base, path);
        tracing::debug!("{} {}", method, url);
        self.client
            .request(method, url)
            .bearer_auth(&self.api_key)
            .header("OpenAI-Beta", "assistants=v2")
    }

    async fn send<T: DeserializeOwned>(&self, operation: &str, request: RequestBuilder) -> Result<T> {
        let response = request.send().await.map_err(|e| {
            tracing::error!("{} request failed: {}", operation, e);
            CiteChatError::Http(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or(body);
            tracing::warn!("{} returned {}: {}", operation, status, message);
            return Err(CiteChatError::service(operation, status.as_u16(), message).into());
        }

        response.json::<T>().await.map_err(|e| {
            tracing::error!("Failed to parse {} response: {}", operation, e);
            CiteChatError::service(
                operation,
                status.as_u16(),
                format!("unexpected response body: {}", e),
            )
            .into()
        })
    }
}

#[async_trait]
impl AssistantApi for OpenAiAssistantClient {
    async fn create_thread(&self) -> Result<Thread> {
        let request = self
            .request(Method::POST, "/threads")
            .json(&serde_json::json!({}));
        self.send("create_thread", request).await
    }

    async fn create_message(
        &self,
        thread_id: &str,
        role: Role,
        content: &str,
    ) -> Result<ThreadMessage> {
        let request = self
            .request(Method::POST, &format!("/threads/{}/messages", thread_id))
            .json(&CreateMessageRequest { role, content });
        self.send("create_message", request).await
    }

    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run> {
        let request = self
            .request(Method::POST, &format!("/threads/{}/runs", thread_id))
            .json(&CreateRunRequest { assistant_id });
        self.send("create_run", request).await
    }

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run> {
        let request = self.request(
            Method::GET,
            &format!("/threads/{}/runs/{}", thread_id, run_id),
        );
        self.send("retrieve_run", request).await
    }

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<Run> {
        let request = self.request(
            Method::POST,
            &format!("/threads/{}/runs/{}/cancel", thread_id, run_id),
        );
        self.send("cancel_run", request).await
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>> {
        let limit = MESSAGE_PAGE_LIMIT.to_string();
        let request = self
            .request(Method::GET, &format!("/threads/{}/messages", thread_id))
            .query(&[("order", "desc"), ("limit", limit.as_str())]);
        let page: MessageList = self.send("list_messages", request).await?;
        if page.has_more {
            tracing::debug!(
                "Thread {} has more than {} messages; only the newest page is used",
                thread_id,
                MESSAGE_PAGE_LIMIT
            );
        }
        Ok(page.data)
    }

    async fn retrieve_file(&self, file_id: &str) -> Result<FileObject> {
        let request = self.request(Method::GET, &format!("/files/{}", file_id));
        self.send("retrieve_file", request).await
    }
}
