//! OpenAI Adapters
//!
//! Two distinct wire protocols share this crate: the flat role-tagged Chat
//! Completions format, and the item-sequence Responses format. They differ
//! enough in shape (one vs. two tool-call ids, reasoning items vs. nothing)
//! that each gets its own adapter.

pub mod chat;
pub mod responses;

pub use chat::OpenAiChatProvider;
pub use responses::OpenAiResponsesProvider;

pub(crate) const DEFAULT_BASE_URL: &str = "https://api.openai.com";
