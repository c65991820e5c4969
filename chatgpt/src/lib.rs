pub mod client;

pub use client::{ChatDelta, ChatMessage, OpenAiModelClient};
