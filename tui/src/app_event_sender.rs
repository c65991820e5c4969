use bioslide_core::deck::ImagePicker;
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Image lookup for an editor session finished.
    ImagesLoaded { slide_id: String, picker: ImagePicker },
}

#[derive(Clone, Default)]
pub struct AppEventSender(Option<UnboundedSender<AppEvent>>);

impl AppEventSender {
    pub fn new(tx: UnboundedSender<AppEvent>) -> Self {
        Self(Some(tx))
    }

    pub fn noop() -> Self {
        Self(None)
    }

    pub fn send(&self, event: AppEvent) {
        if let Some(tx) = &self.0 {
            if tx.send(event).is_err() {
                tracing::debug!("app event dropped: receiver closed");
            }
        }
    }
}
