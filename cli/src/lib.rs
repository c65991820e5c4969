use anyhow::{anyhow, Result};
use bioslide_chatgpt::OpenAiModelClient;
use bioslide_common::BioslideConfig;
use bioslide_core::coordinates::lookup_coordinates;
use bioslide_core::images::{validate_candidates, ImageProbe, ImageSearch, NoImageSearch, SerperAdapter};
use bioslide_core::{BioslideError, ErrorReporter, ModelClient, OpenAiAdapter, StubClient};
use bioslide_image_search::{HttpImageProbe, SerperClient};
use bioslide_protocol::{CoordinatesRequest, ImageSearchResponse};
use bioslide_tui::{ImageLookup, Services};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs::OpenOptions;
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "bioslide")]
#[command(about = "Interview-driven biography slide decks")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Override model (e.g., gpt-4o, gpt-4o-mini)
    #[arg(long)]
    pub model: Option<String>,

    /// Language of the conversation and slides (e.g., Armenian, English)
    #[arg(long)]
    pub language: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Interview, edit and present a deck in the terminal
    Interactive,
    /// Search images for a term and print them as JSON
    Images {
        term: String,
        /// Only keep images that actually load
        #[arg(long)]
        validate: bool,
    },
    /// Ask the model for the coordinates of a place
    Locate { name: String },
    /// Print the effective configuration
    Config {
        /// Also write it to the config file
        #[arg(long)]
        write: bool,
    },
}

impl Cli {
    fn apply(&self, mut config: BioslideConfig) -> BioslideConfig {
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if let Some(language) = &self.language {
            config.language = language.clone();
        }
        config
    }
}

pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.apply(BioslideConfig::load().await?);
    init_logging(&config, cli.debug)?;

    match cli.command {
        None | Some(Commands::Interactive) => {
            let services = Services {
                model: model_client(&config),
                images: image_lookup(&config),
            };
            bioslide_tui::run_interactive(config, services).await?;
        }
        Some(Commands::Images { term, validate }) => {
            let images = image_lookup(&config);
            print_outcome(search_images(&images, &term, validate).await)?;
        }
        Some(Commands::Locate { name }) => {
            let client = model_client(&config);
            let request = CoordinatesRequest { location_name: name };
            print_outcome(lookup_coordinates(client.as_ref(), &request).await)?;
        }
        Some(Commands::Config { write }) => {
            if write {
                config.save().await?;
                tracing::info!("configuration written to {}", BioslideConfig::config_path()?.display());
            }
            println!("{}", serde_json::to_string_pretty(&redacted(&config))?);
        }
    }

    Ok(())
}

/// Log to a file; the terminal belongs to the UI.
fn init_logging(config: &BioslideConfig, debug: bool) -> Result<()> {
    let path = config.log_file();
    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    let default_level = if debug { "debug" } else { "info" };
    let filter = if debug {
        EnvFilter::new(default_level)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow!("failed to install logger: {e}"))?;
    tracing::debug!("logging to {}", path.display());
    Ok(())
}

fn model_client(config: &BioslideConfig) -> Arc<dyn ModelClient + Send + Sync> {
    match OpenAiModelClient::from_config(config) {
        Some(client) => Arc::new(OpenAiAdapter::new(client)),
        None => {
            tracing::warn!("OPENAI_API_KEY not set, using the offline stub model");
            Arc::new(StubClient)
        }
    }
}

fn image_lookup(config: &BioslideConfig) -> ImageLookup {
    let search: Arc<dyn ImageSearch + Send + Sync> = match config.serper_api_key.clone() {
        Some(key) => Arc::new(SerperAdapter::new(SerperClient::new(key))),
        None => {
            tracing::warn!("SERPER_API_KEY not set, image search disabled");
            Arc::new(NoImageSearch)
        }
    };
    let probe: Arc<dyn ImageProbe + Send + Sync> = Arc::new(HttpImageProbe::new());
    ImageLookup { search, probe, timeout: config.probe_timeout() }
}

async fn search_images(images: &ImageLookup, term: &str, validate: bool) -> bioslide_core::error::Result<ImageSearchResponse> {
    let term = term.trim();
    if term.is_empty() {
        return Err(BioslideError::Validation("Search term is required".to_string()));
    }
    let mut found = images.search.search(term).await?;
    if validate {
        found = validate_candidates(images.probe.as_ref(), found, images.timeout).await;
    }
    Ok(ImageSearchResponse { images: found })
}

fn print_outcome<T: Serialize>(outcome: bioslide_core::error::Result<T>) -> Result<()> {
    let json = match outcome {
        Ok(value) => serde_json::to_string_pretty(&value)?,
        Err(e) => {
            tracing::warn!("command failed: {e}");
            serde_json::to_string_pretty(&ErrorReporter::to_body(&e))?
        }
    };
    println!("{json}");
    Ok(())
}

fn redacted(config: &BioslideConfig) -> BioslideConfig {
    let mask = |key: &Option<String>| key.as_ref().map(|_| "********".to_string());
    BioslideConfig {
        api_key: mask(&config.api_key),
        serper_api_key: mask(&config.serper_api_key),
        ..config.clone()
    }
}
