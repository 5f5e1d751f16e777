//! # Anthropic Claude API Client
//!
//! Small client for the Anthropic Messages API, covering the two calls the
//! Oklahomabashi assistant needs: a plain request/response call and a
//! streamed call that yields text fragments as they arrive.
//!
//! ## Example
//!
//! ```no_run
//! use bashi_anthropic::{AnthropicClient, MessagesRequest};
//! use bashi_anthropic::types::Message;
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Create client from ANTHROPIC_API_KEY environment variable
//!     let client = AnthropicClient::from_env()?;
//!
//!     let request = MessagesRequest::new(vec![Message::user("Salam!")]);
//!
//!     let mut fragments = client.text_stream(request).await?;
//!     while let Some(fragment) = fragments.next().await {
//!         print!("{}", fragment?);
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod messages;
pub mod types;

// Re-export main types for convenience
pub use client::{AnthropicClient, TextStream};
pub use error::ClaudeError;
pub use messages::{
    ContentDelta, MessageDelta, MessageStart, MessagesRequest, MessagesResponse, StreamEvent,
};
pub use types::{ContentBlock, Message, Role, StopReason, Usage};
