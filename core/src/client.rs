use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bioslide_chatgpt::{ChatDelta, ChatMessage, OpenAiModelClient};
use bioslide_common::{Message, Role};
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::mpsc::Receiver;

use crate::sentinel::SLIDES_SENTINEL;

#[derive(Debug, Clone)]
pub enum ResponseEvent {
    TextDelta(String),
    Completed,
    Error(String),
}

/// Everything the model sees for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelPrompt {
    pub system: String,
    pub messages: Vec<Message>,
}

#[async_trait]
pub trait ModelClient {
    async fn stream(&self, prompt: ModelPrompt) -> Result<Receiver<ResponseEvent>>;

    /// Collect a whole streamed reply into one string.
    async fn complete(&self, prompt: ModelPrompt) -> Result<String> {
        let mut rx = self.stream(prompt).await?;
        let mut text = String::new();
        while let Some(ev) = rx.recv().await {
            match ev {
                ResponseEvent::TextDelta(delta) => text.push_str(&delta),
                ResponseEvent::Completed => return Ok(text),
                ResponseEvent::Error(message) => return Err(anyhow!(message)),
            }
        }
        Err(anyhow!("model stream ended without completing"))
    }
}

/// Offline stand-in used when no API key is configured.
///
/// Asks one question, then answers with a three-slide deck about whatever
/// the first user message named.
pub struct StubClient;

impl StubClient {
    fn reply(messages: &[Message]) -> String {
        let user_turns: Vec<&Message> = messages.iter().filter(|m| m.role == Role::User).collect();
        let subject = user_turns
            .first()
            .map(|m| m.content.trim().to_string())
            .unwrap_or_default();
        if user_turns.len() < 2 {
            return format!("Which part of {subject}'s life should the presentation focus on?");
        }
        let payload = serde_json::json!({
            "slides": [
                { "id": "1", "title": subject, "content": format!("Who was {subject}?"), "imageSearchTerm": subject },
                { "id": "2", "title": "Early years", "content": "Childhood and education.", "imageSearchTerm": format!("{subject} young") },
                { "id": "3", "title": "Legacy", "content": "What we remember today.", "imageSearchTerm": format!("{subject} legacy") },
            ]
        });
        format!("Here is your presentation.\n{SLIDES_SENTINEL}\n{payload}")
    }
}

#[async_trait]
impl ModelClient for StubClient {
    async fn stream(&self, prompt: ModelPrompt) -> Result<Receiver<ResponseEvent>> {
        let (tx, rx) = tokio::sync::mpsc::channel(32);
        let _ = tx.send(ResponseEvent::TextDelta(Self::reply(&prompt.messages))).await;
        let _ = tx.send(ResponseEvent::Completed).await;
        Ok(rx)
    }
}

/// Adapter to wrap OpenAiModelClient into ModelClient
pub struct OpenAiAdapter {
    inner: OpenAiModelClient,
}

impl OpenAiAdapter {
    pub fn new(inner: OpenAiModelClient) -> Self {
        Self { inner }
    }

    fn wire_messages(prompt: &ModelPrompt) -> Vec<ChatMessage> {
        let system = Some(&prompt.system).filter(|s| !s.is_empty());
        system
            .map(|s| ChatMessage::system(s.clone()))
            .into_iter()
            .chain(prompt.messages.iter().map(ChatMessage::from))
            .collect()
    }
}

#[async_trait]
impl ModelClient for OpenAiAdapter {
    async fn stream(&self, prompt: ModelPrompt) -> Result<Receiver<ResponseEvent>> {
        let mut rx_text = self.inner.stream_chat(Self::wire_messages(&prompt)).await?;
        let (tx, rx) = tokio::sync::mpsc::channel(64);
        tokio::spawn(async move {
            while let Some(delta) = rx_text.recv().await {
                let ev = match delta {
                    ChatDelta::Text(text) => ResponseEvent::TextDelta(text),
                    ChatDelta::Done => ResponseEvent::Completed,
                    ChatDelta::Failed(message) => ResponseEvent::Error(message),
                };
                let last = !matches!(ev, ResponseEvent::TextDelta(_));
                if tx.send(ev).await.is_err() || last {
                    break;
                }
            }
        });
        Ok(rx)
    }

    async fn complete(&self, prompt: ModelPrompt) -> Result<String> {
        self.inner.complete_chat(Self::wire_messages(&prompt)).await
    }
}

/// One canned outcome for [`ScriptedClient`].
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Text(String),
    /// The request itself fails.
    Fail(String),
    /// The stream starts, then reports an error.
    StreamError(String),
}

/// Replays canned replies in order and records every prompt it was given.
#[derive(Default)]
pub struct ScriptedClient {
    replies: Mutex<VecDeque<ScriptedReply>>,
    prompts: Mutex<Vec<ModelPrompt>>,
}

impl ScriptedClient {
    pub fn new<I>(replies: I) -> Self
    where
        I: IntoIterator<Item = ScriptedReply>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(texts.into_iter().map(|t| ScriptedReply::Text(t.into())))
    }

    pub fn prompts(&self) -> Vec<ModelPrompt> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ModelClient for ScriptedClient {
    async fn stream(&self, prompt: ModelPrompt) -> Result<Receiver<ResponseEvent>> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt);
        }
        let next = self
            .replies
            .lock()
            .ok()
            .and_then(|mut r| r.pop_front())
            .ok_or_else(|| anyhow!("scripted client has no replies left"))?;

        let (tx, rx) = tokio::sync::mpsc::channel(32);
        match next {
            ScriptedReply::Text(text) => {
                // Two deltas, so callers have to assemble the reply.
                let split = text
                    .char_indices()
                    .nth(text.chars().count() / 2)
                    .map(|(i, _)| i)
                    .unwrap_or(0);
                let (head, tail) = text.split_at(split);
                let _ = tx.send(ResponseEvent::TextDelta(head.to_string())).await;
                let _ = tx.send(ResponseEvent::TextDelta(tail.to_string())).await;
                let _ = tx.send(ResponseEvent::Completed).await;
            }
            ScriptedReply::Fail(message) => return Err(anyhow!(message)),
            ScriptedReply::StreamError(message) => {
                let _ = tx.send(ResponseEvent::Error(message)).await;
            }
        }
        Ok(rx)
    }
}
