//! Community assistant chat.
//!
//! One exchange at a time: submitting appends the member's message and an
//! empty assistant entry, then the backend's reply is streamed into that
//! entry fragment by fragment.

use bashi_anthropic::{AnthropicClient, ClaudeError, Message, MessagesRequest};
use bashi_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
use async_stream::stream;
use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// First transcript entry of every conversation
pub const GREETING: &str =
    "Salam! I am your Oklahomabashi Assistant. How can I help you today with events or community info?";

/// Reply shown in place of a failed response
pub const APOLOGY: &str = "Sorry, I encountered an error. Please try again later.";

/// System instruction sent with every exchange
pub const SYSTEM_PROMPT: &str = "You are the official AI assistant for Oklahomabashi, a nonprofit for the \
Oklahoma-Bangladeshi community. Your tone is warm, professional, and culturally sensitive. You know \
about the Cultural Society (OBCS) and Sports Society (OBSS). Help users find events, explain Bengali \
traditions in the context of Oklahoma, and encourage community participation. Keep responses concise \
but helpful.";

/// Who wrote a transcript entry
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Speaker {
    /// The member
    User,
    /// The assistant
    Assistant,
}

/// One transcript entry
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatEntry {
    /// Author
    pub speaker: Speaker,
    /// Text so far
    pub text: String,
}

impl ChatEntry {
    fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
        }
    }
}

/// Chat widget state
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatState {
    /// Whether the chat window is open
    pub is_open: bool,
    /// Conversation, oldest first
    pub transcript: Vec<ChatEntry>,
    /// Whether a reply is streaming (input disabled)
    pub is_streaming: bool,
}

impl Default for ChatState {
    fn default() -> Self {
        Self {
            is_open: false,
            transcript: vec![ChatEntry::new(Speaker::Assistant, GREETING)],
            is_streaming: false,
        }
    }
}

/// Chat inputs
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChatAction {
    /// Open the chat window
    Open,
    /// Close the chat window
    Close,
    /// Send a message
    Submit {
        /// Message text
        text: String,
    },
    /// Next piece of the reply
    Fragment {
        /// Text to append
        text: String,
    },
    /// The reply is complete
    StreamFinished,
    /// The reply failed
    StreamFailed {
        /// What went wrong
        error: String,
    },
}

// ============================================================================
// Backend
// ============================================================================

/// Reply failures
#[derive(Debug, Error)]
pub enum ChatError {
    /// The completion API failed
    #[error(transparent)]
    Backend(#[from] ClaudeError),
    /// The completion API stopped sending data
    #[error("no reply data for {0:?}")]
    IdleTimeout(Duration),
}

/// Stream of reply fragments
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, ChatError>> + Send>>;

/// A hosted completion service that streams replies
pub trait ChatBackend: Send + Sync {
    /// Stream the reply to the conversation `history` under `system`
    ///
    /// The stream ends after the reply is complete or after its first error.
    fn stream_reply(&self, history: Vec<ChatEntry>, system: String) -> FragmentStream;
}

/// [`ChatBackend`] backed by the Anthropic Messages API
#[derive(Clone, Debug)]
pub struct AnthropicChatBackend {
    client: AnthropicClient,
    model: Option<String>,
    max_tokens: u32,
    idle_timeout: Duration,
}

impl AnthropicChatBackend {
    /// Backend using `client`
    #[must_use]
    pub const fn new(client: AnthropicClient) -> Self {
        Self {
            client,
            model: None,
            max_tokens: 1024,
            idle_timeout: Duration::from_secs(60),
        }
    }

    /// Override the model
    #[must_use]
    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    /// Cap the reply length
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Give up when no data arrives for `idle_timeout`
    #[must_use]
    pub const fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    fn request(&self, history: &[ChatEntry], system: String) -> MessagesRequest {
        let mut request = MessagesRequest::new(to_messages(history))
            .with_system(system)
            .with_max_tokens(self.max_tokens);
        if let Some(model) = &self.model {
            request = request.with_model(model.clone());
        }
        request
    }
}

/// Conversation as API messages
///
/// The API expects the member to speak first, so the leading greeting is
/// dropped, as are entries without text.
fn to_messages(history: &[ChatEntry]) -> Vec<Message> {
    history
        .iter()
        .skip_while(|entry| entry.speaker == Speaker::Assistant)
        .filter(|entry| !entry.text.is_empty())
        .map(|entry| match entry.speaker {
            Speaker::User => Message::user(entry.text.clone()),
            Speaker::Assistant => Message::assistant(entry.text.clone()),
        })
        .collect()
}

impl ChatBackend for AnthropicChatBackend {
    fn stream_reply(&self, history: Vec<ChatEntry>, system: String) -> FragmentStream {
        let client = self.client.clone();
        let request = self.request(&history, system);
        let idle = self.idle_timeout;

        Box::pin(stream! {
            let opened = match tokio::time::timeout(idle, client.text_stream(request)).await {
                Ok(Ok(fragments)) => Some(fragments),
                Ok(Err(error)) => {
                    yield Err(ChatError::Backend(error));
                    None
                },
                Err(_) => {
                    yield Err(ChatError::IdleTimeout(idle));
                    None
                },
            };

            if let Some(mut fragments) = opened {
                loop {
                    match tokio::time::timeout(idle, fragments.next()).await {
                        Ok(Some(Ok(text))) => yield Ok(text),
                        Ok(Some(Err(error))) => {
                            yield Err(ChatError::Backend(error));
                            break;
                        },
                        Ok(None) => break,
                        Err(_) => {
                            yield Err(ChatError::IdleTimeout(idle));
                            break;
                        },
                    }
                }
            }
        })
    }
}

// ============================================================================
// Reducer
// ============================================================================

/// Dependencies of [`ChatReducer`]
#[derive(Clone)]
pub struct ChatEnvironment {
    /// Completion service
    pub backend: Arc<dyn ChatBackend>,
    /// System instruction
    pub system_prompt: String,
}

impl ChatEnvironment {
    /// Environment with the organization's persona prompt
    #[must_use]
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            backend,
            system_prompt: SYSTEM_PROMPT.to_string(),
        }
    }
}

/// Reducer for the chat widget
#[derive(Clone, Copy, Debug, Default)]
pub struct ChatReducer;

impl Reducer for ChatReducer {
    type State = ChatState;
    type Action = ChatAction;
    type Environment = ChatEnvironment;

    fn reduce(
        &self,
        state: &mut ChatState,
        action: ChatAction,
        env: &ChatEnvironment,
    ) -> SmallVec<[Effect<ChatAction>; 4]> {
        match action {
            ChatAction::Open => {
                state.is_open = true;
                smallvec![Effect::None]
            },
            ChatAction::Close => {
                state.is_open = false;
                smallvec![Effect::None]
            },

            ChatAction::Submit { text } => {
                let text = text.trim();
                if text.is_empty() || state.is_streaming {
                    return smallvec![Effect::None];
                }

                state.transcript.push(ChatEntry::new(Speaker::User, text));
                let history = state.transcript.clone();
                state.transcript.push(ChatEntry::new(Speaker::Assistant, ""));
                state.is_streaming = true;
                tracing::debug!(entries = history.len(), "Chat exchange started");

                let replies = env.backend.stream_reply(history, env.system_prompt.clone());
                smallvec![Effect::Stream(Box::pin(reply_actions(replies)))]
            },

            ChatAction::Fragment { text } => {
                if !state.is_streaming {
                    return smallvec![Effect::None];
                }
                if let Some(entry) = state.transcript.last_mut() {
                    if entry.speaker == Speaker::Assistant {
                        entry.text.push_str(&text);
                    }
                }
                smallvec![Effect::None]
            },

            ChatAction::StreamFinished => {
                state.is_streaming = false;
                smallvec![Effect::None]
            },

            ChatAction::StreamFailed { error } => {
                tracing::warn!(%error, "Chat reply failed");
                if state.is_streaming {
                    if let Some(entry) = state.transcript.last_mut() {
                        if entry.speaker == Speaker::Assistant {
                            entry.text = APOLOGY.to_string();
                        }
                    }
                }
                state.is_streaming = false;
                smallvec![Effect::None]
            },
        }
    }
}

/// Reply fragments as chat actions, ending in `StreamFinished` or a
/// single `StreamFailed`
fn reply_actions(mut replies: FragmentStream) -> impl Stream<Item = ChatAction> + Send {
    stream! {
        let mut failed = false;
        while let Some(fragment) = replies.next().await {
            match fragment {
                Ok(text) => yield ChatAction::Fragment { text },
                Err(error) => {
                    yield ChatAction::StreamFailed { error: error.to_string() };
                    failed = true;
                    break;
                },
            }
        }
        if !failed {
            yield ChatAction::StreamFinished;
        }
    }
}
