//! Conversation orchestrator.
//!
//! A background task owns the model conversation. Callers push [`Op`]s in
//! and read [`Event`]s out; the shared [`Store`] is the single place the
//! resulting messages and deck land.

use bioslide_common::{BioslideConfig, Message, Terms, View};
use bioslide_protocol::{ChatRequest, ChatTurnResponse, Event, Op, Submission};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};

use crate::client::{ModelClient, ModelPrompt, ResponseEvent};
use crate::error::{BioslideError, ErrorReporter, Result};
use crate::prompt::render_system_instruction;
use crate::sentinel::{parse_model_reply, ModelReply};
use crate::store::Store;

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub model: String,
    pub language: String,
    /// Pause between the deck landing and the switch to the graph view.
    pub transition_delay: Duration,
}

impl SessionSettings {
    pub fn from_config(config: &BioslideConfig) -> Self {
        Self {
            model: config.model.clone(),
            language: config.language.clone(),
            transition_delay: config.transition_delay(),
        }
    }

    pub fn terms(&self) -> &'static Terms {
        Terms::for_language(&self.language)
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from_config(&BioslideConfig::default())
    }
}

/// Run one conversation turn without touching any shared state.
pub async fn run_turn(
    client: &(dyn ModelClient + Send + Sync),
    request: &ChatRequest,
    settings: &SessionSettings,
) -> Result<ChatTurnResponse> {
    let text = client
        .complete(build_prompt(&request.messages, settings))
        .await
        .map_err(|e| BioslideError::Request(e.to_string()))?;
    Ok(to_turn_response(&text, settings.terms()))
}

fn build_prompt(messages: &[Message], settings: &SessionSettings) -> ModelPrompt {
    ModelPrompt {
        system: render_system_instruction(&settings.language),
        messages: messages.to_vec(),
    }
}

/// Classify a full model reply.
pub fn to_turn_response(text: &str, terms: &Terms) -> ChatTurnResponse {
    match parse_model_reply(text) {
        ModelReply::Incomplete { message } => ChatTurnResponse::question(message),
        ModelReply::Complete { message, slides } => {
            let message = if message.is_empty() { terms.slides_ready.to_string() } else { message };
            ChatTurnResponse::deck(message, slides)
        }
    }
}

#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

struct Inner {
    tx_submit: mpsc::Sender<Submission>,
    tx_event: mpsc::Sender<Event>,
    rx_event: Mutex<mpsc::Receiver<Event>>,
    store: Store,
}

impl Orchestrator {
    pub async fn spawn(
        client: Arc<dyn ModelClient + Send + Sync>,
        store: Store,
        settings: SessionSettings,
    ) -> Result<Self> {
        let (tx_submit, rx_submit) = mpsc::channel::<Submission>(64);
        let (tx_event, rx_event) = mpsc::channel::<Event>(256);

        tx_event
            .send(Event::SessionConfigured { model: settings.model.clone() })
            .await
            .map_err(|_| BioslideError::ChannelClosed)?;

        let session = Session {
            client,
            store: store.clone(),
            settings,
            tx_event: tx_event.clone(),
        };
        tokio::spawn(session.run(rx_submit));

        let inner = Arc::new(Inner { tx_submit, tx_event, rx_event: Mutex::new(rx_event), store });
        Ok(Self { inner })
    }

    /// Submit an operation.
    ///
    /// User input is appended to the conversation right away and marks the
    /// session as generating. Blank input is ignored; input arriving while a
    /// turn is in flight is rejected with [`Event::Busy`]. Returns whether
    /// the operation was accepted.
    pub async fn submit(&self, op: Op) -> Result<bool> {
        if let Op::UserInput { text } = &op {
            if text.trim().is_empty() {
                return Ok(false);
            }
            let mut accepted = false;
            self.inner.store.update(|s| {
                if s.generating {
                    s.clone()
                } else {
                    accepted = true;
                    s.with_message(Message::user(text.clone())).with_generating(true)
                }
            });
            if !accepted {
                let _ = self.inner.tx_event.send(Event::Busy).await;
                return Ok(false);
            }
        }
        self.inner
            .tx_submit
            .send(Submission::new(op))
            .await
            .map_err(|_| BioslideError::ChannelClosed)?;
        Ok(true)
    }

    pub async fn next_event(&self) -> Option<Event> {
        let mut rx = self.inner.rx_event.lock().await;
        rx.recv().await
    }
}

struct Session {
    client: Arc<dyn ModelClient + Send + Sync>,
    store: Store,
    settings: SessionSettings,
    tx_event: mpsc::Sender<Event>,
}

impl Session {
    async fn run(self, mut rx_submit: mpsc::Receiver<Submission>) {
        while let Some(sub) = rx_submit.recv().await {
            tracing::debug!("processing submission {}", sub.id);
            match sub.op {
                Op::UserInput { .. } => self.run_turn().await,
                Op::Reset => {
                    self.store.update(|s| s.reset());
                    self.emit(Event::ResetComplete).await;
                }
                Op::Shutdown => {
                    self.emit(Event::ShutdownComplete).await;
                    break;
                }
            }
        }
    }

    async fn emit(&self, event: Event) {
        let _ = self.tx_event.send(event).await;
    }

    async fn run_turn(&self) {
        self.emit(Event::TurnStarted).await;
        let history = self.store.snapshot().messages.clone();
        tracing::info!("starting conversation turn with {} messages", history.len());

        let outcome = self.stream_reply(build_prompt(&history, &self.settings)).await;
        let terms = self.settings.terms();

        match outcome {
            Ok(text) => {
                let response = to_turn_response(&text, terms);
                self.store.update(|s| s.with_message(Message::assistant(response.message.clone())));
                self.emit(Event::AgentMessage { message: response.message.clone() }).await;
                if let Some(slides) = response.slides.filter(|_| response.complete) {
                    self.hand_over_deck(slides).await;
                }
            }
            Err(e) => {
                tracing::warn!("conversation turn failed: {e}");
                let message = ErrorReporter::user_message(&e, terms);
                self.store.update(|s| s.with_message(Message::assistant(message.clone())));
                self.emit(Event::Error { message }).await;
            }
        }

        self.store.update(|s| s.with_generating(false));
        self.emit(Event::TurnComplete).await;
    }

    async fn stream_reply(&self, prompt: ModelPrompt) -> Result<String> {
        let mut rx = self
            .client
            .stream(prompt)
            .await
            .map_err(|e| BioslideError::Request(e.to_string()))?;
        let mut assembled = String::new();
        while let Some(ev) = rx.recv().await {
            match ev {
                ResponseEvent::TextDelta(delta) => {
                    assembled.push_str(&delta);
                    self.emit(Event::AgentMessageDelta { delta }).await;
                }
                ResponseEvent::Completed => return Ok(assembled),
                ResponseEvent::Error(message) => return Err(BioslideError::Request(message)),
            }
        }
        Err(BioslideError::ResponseShape("model stream ended without completing".to_string()))
    }

    /// Replace the deck and, after the configured pause, move to the graph.
    /// The deck belongs to the conversation screen only while it is active.
    async fn hand_over_deck(&self, slides: Vec<bioslide_common::Slide>) {
        let count = slides.len();
        let mut replaced = false;
        self.store.update(|s| {
            if s.view == View::Chat {
                replaced = true;
                s.with_slides(slides)
            } else {
                s.clone()
            }
        });
        if !replaced {
            tracing::warn!("dropping generated deck: conversation screen is no longer active");
            return;
        }
        tracing::info!("deck replaced with {count} slides");
        self.emit(Event::SlidesReady { count }).await;

        let store = self.store.clone();
        let tx_event = self.tx_event.clone();
        let delay = self.settings.transition_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut moved = false;
            store.update(|s| {
                if s.view == View::Chat && !s.slides.is_empty() {
                    moved = true;
                    s.with_view(View::Graph)
                } else {
                    s.clone()
                }
            });
            if moved {
                let _ = tx_event.send(Event::ViewChanged { view: View::Graph }).await;
            }
        });
    }
}
