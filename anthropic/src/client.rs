//! Anthropic API client implementation

use crate::{
    error::ClaudeError,
    messages::{ContentDelta, MessagesRequest, MessagesResponse, StreamEvent},
};
use async_stream::stream;
use futures::stream::{Stream, StreamExt};
use reqwest::{Client, Response, StatusCode};
use std::pin::Pin;

const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";

/// Stream of raw Messages API events
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, ClaudeError>> + Send>>;

/// Stream of text fragments, in arrival order
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, ClaudeError>> + Send>>;

/// Anthropic API client
#[derive(Clone)]
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    api_url: String,
}

impl std::fmt::Debug for AnthropicClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicClient")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

impl AnthropicClient {
    /// Create a new client with API key from environment
    ///
    /// # Errors
    ///
    /// Returns `ClaudeError::MissingApiKey` if `ANTHROPIC_API_KEY` is not set
    pub fn from_env() -> Result<Self, ClaudeError> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or(ClaudeError::MissingApiKey)?;

        Ok(Self::new(api_key))
    }

    /// Create a new client with explicit API key
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            api_url: DEFAULT_API_URL.to_string(),
        }
    }

    /// Point the client at another base URL (a proxy or a test server)
    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn post(&self, request: &MessagesRequest) -> Result<Response, ClaudeError> {
        let response = self
            .client
            .post(format!("{}/messages", self.api_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| ClaudeError::RequestFailed(e.to_string()))?;

        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::TOO_MANY_REQUESTS => Err(ClaudeError::RateLimited),
            StatusCode::UNAUTHORIZED => Err(ClaudeError::Unauthorized),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(ClaudeError::ApiError {
                    status: status.as_u16(),
                    message: body,
                })
            },
        }
    }

    /// Create messages (non-streaming)
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, API errors, or parsing failures
    pub async fn messages(&self, request: MessagesRequest) -> Result<MessagesResponse, ClaudeError> {
        let mut request = request;
        request.stream = false;

        self.post(&request)
            .await?
            .json::<MessagesResponse>()
            .await
            .map_err(|e| ClaudeError::ResponseParseFailed(e.to_string()))
    }

    /// Create messages (streaming)
    ///
    /// Returns a stream of `StreamEvent` items. The stream yields events as they
    /// arrive from the API and ends after `message_stop`.
    ///
    /// # Errors
    ///
    /// Returns errors for network failures or API errors. Individual stream items
    /// may also contain errors if event parsing fails.
    pub async fn messages_stream(&self, request: MessagesRequest) -> Result<EventStream, ClaudeError> {
        let mut streaming_request = request;
        streaming_request.stream = true;

        let byte_stream = self.post(&streaming_request).await?.bytes_stream();

        Ok(Box::pin(stream! {
            // Raw bytes: a chunk may end inside a multi-byte character
            let mut buffer: Vec<u8> = Vec::new();
            let mut done = false;

            for await chunk in byte_stream {
                match chunk {
                    Ok(bytes) => {
                        buffer.extend_from_slice(&bytes);

                        while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                            let raw: Vec<u8> = buffer.drain(..=pos).collect();
                            let line = match String::from_utf8(raw) {
                                Ok(line) => line,
                                Err(e) => {
                                    yield Err(ClaudeError::StreamFailed(format!("invalid UTF-8 in event stream: {e}")));
                                    done = true;
                                    break;
                                },
                            };
                            match parse_sse_line(&line) {
                                SseLine::Event(event) => {
                                    done = matches!(event, Ok(StreamEvent::MessageStop));
                                    yield event;
                                    if done {
                                        break;
                                    }
                                },
                                SseLine::Done => {
                                    done = true;
                                    break;
                                },
                                SseLine::Ignored => {},
                            }
                        }
                    },
                    Err(e) => {
                        yield Err(ClaudeError::StreamFailed(e.to_string()));
                        done = true;
                    },
                }
                if done {
                    break;
                }
            }

            // Final line without a trailing newline
            if !done {
                if let Ok(line) = std::str::from_utf8(&buffer) {
                    if let SseLine::Event(event) = parse_sse_line(line) {
                        yield event;
                    }
                }
            }
        }))
    }

    /// Stream only the text of the reply
    ///
    /// Non-text events are skipped. An `error` event from the API ends the
    /// stream with [`ClaudeError::StreamFailed`].
    ///
    /// # Errors
    ///
    /// Returns errors for network failures or API errors before streaming starts.
    pub async fn text_stream(&self, request: MessagesRequest) -> Result<TextStream, ClaudeError> {
        let events = self.messages_stream(request).await?;

        let text = events.filter_map(|event| async move {
            match event {
                Ok(StreamEvent::ContentBlockDelta {
                    delta: ContentDelta::TextDelta { text },
                    ..
                }) if !text.is_empty() => Some(Ok(text)),
                Ok(StreamEvent::Error { error }) => Some(Err(ClaudeError::StreamFailed(format!(
                    "{}: {}",
                    error.kind, error.message
                )))),
                Ok(_) => None,
                Err(e) => Some(Err(e)),
            }
        });

        Ok(Box::pin(text))
    }
}

enum SseLine {
    Event(Result<StreamEvent, ClaudeError>),
    Done,
    Ignored,
}

/// Interpret one line of a Server-Sent Events body
///
/// Only `data:` lines carry payloads; `event:` names repeat the JSON `type`.
fn parse_sse_line(line: &str) -> SseLine {
    let line = line.trim();
    let Some(data) = line.strip_prefix("data:") else {
        return SseLine::Ignored;
    };
    let data = data.trim_start();

    if data.is_empty() {
        return SseLine::Ignored;
    }
    if data == "[DONE]" {
        return SseLine::Done;
    }

    tracing::trace!(data, "SSE payload");
    SseLine::Event(
        serde_json::from_str::<StreamEvent>(data)
            .map_err(|e| ClaudeError::ResponseParseFailed(e.to_string())),
    )
}
