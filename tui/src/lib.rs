pub mod app;
pub mod app_event_sender;
pub mod chat;
pub mod graph;
pub mod map;
pub mod slideshow;
pub mod status_bar;

use anyhow::Result;
use bioslide_common::BioslideConfig;

pub use app::{App, Services};
pub use graph::ImageLookup;

/// Run the interactive biography session.
pub async fn run_interactive(config: BioslideConfig, services: Services) -> Result<()> {
    app::run_app(config, services).await
}
