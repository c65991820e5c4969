//! Core library: conversation, deck state, editing and presentation logic
//! shared by the terminal UI and the command line.

pub mod client;
pub mod coordinates;
pub mod debounce;
pub mod deck;
pub mod error;
pub mod images;
pub mod orchestrator;
pub mod prompt;
pub mod sentinel;
pub mod slideshow;
pub mod store;

pub use client::{ModelClient, ModelPrompt, OpenAiAdapter, ResponseEvent, StubClient};
pub use error::{BioslideError, ErrorReporter};
pub use orchestrator::{Orchestrator, SessionSettings};
pub use store::{AppState, SlidePatch, Store};
