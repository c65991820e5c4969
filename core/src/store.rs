//! Shared application state.
//!
//! [`AppState`] is an immutable value; every change goes through a pure
//! update function that returns the next state. [`Store`] holds the current
//! value, swaps it wholesale on update and pushes the new snapshot to every
//! subscriber.

use bioslide_common::{Message, Slide, View};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub view: View,
    pub messages: Vec<Message>,
    pub slides: Vec<Slide>,
    pub current_slide_index: usize,
    /// A conversation request is in flight.
    pub generating: bool,
}

/// Partial update for one slide. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlidePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
}

impl SlidePatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self { title: Some(title.into()), ..Self::default() }
    }

    pub fn content(content: impl Into<String>) -> Self {
        Self { content: Some(content.into()), ..Self::default() }
    }

    pub fn image_url(url: impl Into<String>) -> Self {
        Self { image_url: Some(url.into()), ..Self::default() }
    }

    fn apply(&self, slide: &Slide) -> Slide {
        let mut next = slide.clone();
        if let Some(title) = &self.title {
            next.title = title.clone();
        }
        if let Some(content) = &self.content {
            next.content = content.clone();
        }
        if let Some(url) = &self.image_url {
            next.image_url = if url.is_empty() { None } else { Some(url.clone()) };
        }
        next
    }
}

impl AppState {
    pub fn with_view(&self, view: View) -> Self {
        Self { view, ..self.clone() }
    }

    pub fn with_message(&self, message: Message) -> Self {
        let mut messages = self.messages.clone();
        messages.push(message);
        Self { messages, ..self.clone() }
    }

    pub fn with_generating(&self, generating: bool) -> Self {
        Self { generating, ..self.clone() }
    }

    /// Replace the whole deck. The slideshow restarts from the first slide.
    pub fn with_slides(&self, slides: Vec<Slide>) -> Self {
        Self { slides, current_slide_index: 0, ..self.clone() }
    }

    /// Apply `patch` to the slide with `id`. Unknown ids leave the state as is.
    pub fn with_slide_update(&self, id: &str, patch: &SlidePatch) -> Self {
        let slides = self
            .slides
            .iter()
            .map(|s| if s.id == id { patch.apply(s) } else { s.clone() })
            .collect();
        Self { slides, ..self.clone() }
    }

    pub fn with_slide_index(&self, index: usize) -> Self {
        Self { current_slide_index: self.clamp_index(index), ..self.clone() }
    }

    pub fn next_slide(&self) -> Self {
        self.with_slide_index(self.current_slide_index.saturating_add(1))
    }

    pub fn previous_slide(&self) -> Self {
        self.with_slide_index(self.current_slide_index.saturating_sub(1))
    }

    /// Back to an empty conversation with no deck.
    pub fn reset(&self) -> Self {
        Self::default()
    }

    pub fn current_slide(&self) -> Option<&Slide> {
        self.slides.get(self.current_slide_index)
    }

    fn clamp_index(&self, index: usize) -> usize {
        index.min(self.slides.len().saturating_sub(1))
    }
}

/// Holder of the current [`AppState`] with explicit subscribers.
///
/// Cloning a `Store` yields another handle to the same state.
#[derive(Clone, Default)]
pub struct Store {
    inner: Arc<StoreInner>,
}

#[derive(Default)]
struct StoreInner {
    state: Mutex<Arc<AppState>>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<Arc<AppState>>>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: AppState) -> Self {
        let store = Self::default();
        store.replace(state);
        store
    }

    pub fn snapshot(&self) -> Arc<AppState> {
        match self.inner.state.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Register a subscriber. It receives every state committed after this call.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<Arc<AppState>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock_subscribers().push(tx);
        rx
    }

    /// Compute the next state from the current one and commit it.
    /// Returns the committed state.
    pub fn update<F>(&self, f: F) -> Arc<AppState>
    where
        F: FnOnce(&AppState) -> AppState,
    {
        let mut guard = match self.inner.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let next = Arc::new(f(&guard));
        *guard = next.clone();
        // Still holding the state lock: subscribers see commits in order.
        self.notify(&next);
        next
    }

    fn replace(&self, state: AppState) {
        self.update(|_| state);
    }

    fn notify(&self, state: &Arc<AppState>) {
        self.lock_subscribers()
            .retain(|tx| tx.send(state.clone()).is_ok());
    }

    fn lock_subscribers(&self) -> std::sync::MutexGuard<'_, Vec<mpsc::UnboundedSender<Arc<AppState>>>> {
        match self.inner.subscribers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock_subscribers().len()
    }
}
