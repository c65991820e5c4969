use anyhow::Result;
use bioslide_common::{BioslideConfig, Terms, View};
use bioslide_core::{AppState, ModelClient, Orchestrator, SessionSettings, Store};
use bioslide_protocol::{Event as CoreEvent, Op};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::app_event_sender::{AppEvent, AppEventSender};
use crate::chat::{ChatAction, ChatPane};
use crate::graph::{GraphPane, ImageLookup};
use crate::slideshow::SlideshowPane;
use crate::status_bar::StatusBar;

/// Collaborators the UI talks to.
pub struct Services {
    pub model: Arc<dyn ModelClient + Send + Sync>,
    pub images: ImageLookup,
}

pub struct App {
    store: Store,
    state: Arc<AppState>,
    orchestrator: Orchestrator,
    terms: &'static Terms,
    chat: ChatPane,
    graph: GraphPane,
    status: String,
    should_quit: bool,
}

impl App {
    pub async fn new(config: &BioslideConfig, services: Services, app_tx: AppEventSender) -> Result<Self> {
        let store = Store::new();
        let settings = SessionSettings::from_config(config);
        let terms = settings.terms();
        let orchestrator = Orchestrator::spawn(services.model, store.clone(), settings).await?;
        Ok(Self {
            state: store.snapshot(),
            graph: GraphPane::new(services.images, config.debounce(), app_tx),
            store,
            orchestrator,
            terms,
            chat: ChatPane::new(),
            status: String::new(),
            should_quit: false,
        })
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub async fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.orchestrator.submit(Op::Shutdown).await?;
            self.should_quit = true;
            return Ok(());
        }

        match self.state.view {
            View::Chat => match self.chat.handle_key(key, &self.state) {
                ChatAction::Submit(text) => {
                    self.orchestrator.submit(Op::UserInput { text }).await?;
                }
                ChatAction::Reset => {
                    self.orchestrator.submit(Op::Reset).await?;
                }
                ChatAction::None => {}
            },
            View::Graph => self.graph.handle_key(key, &self.store),
            View::Slideshow => SlideshowPane::handle_key(key, &self.store),
        }
        self.state = self.store.snapshot();
        Ok(())
    }

    pub fn handle_core_event(&mut self, event: CoreEvent) {
        self.chat.on_event(&event);
        match event {
            CoreEvent::SessionConfigured { model } => {
                tracing::info!("session configured with model {model}");
            }
            CoreEvent::TurnStarted => self.status = self.terms.generating.to_string(),
            CoreEvent::SlidesReady { count } => {
                self.status = format!("{} ({count})", self.terms.slides_ready);
            }
            CoreEvent::Busy => self.status = self.terms.please_wait.to_string(),
            CoreEvent::Error { message } => self.status = message,
            CoreEvent::TurnComplete => {
                if self.status == self.terms.generating {
                    self.status.clear();
                }
            }
            CoreEvent::ResetComplete | CoreEvent::ViewChanged { .. } => self.status.clear(),
            CoreEvent::ShutdownComplete => self.should_quit = true,
            CoreEvent::AgentMessageDelta { .. } | CoreEvent::AgentMessage { .. } => {}
        }
        self.state = self.store.snapshot();
    }

    pub fn handle_app_event(&mut self, event: AppEvent) {
        self.graph.on_app_event(&event);
    }

    pub fn on_state(&mut self, state: Arc<AppState>) {
        self.state = state;
    }

    fn draw(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(3)])
            .split(frame.area());
        let (main, footer) = (chunks[0], chunks[1]);
        let terms = self.terms;

        let (screen, hints) = match self.state.view {
            View::Chat => {
                self.chat.render(main, frame.buffer_mut(), &self.state, terms);
                frame.set_cursor_position(self.chat.cursor(main));
                (terms.chat_title, "Enter: send · Ctrl+R: new · Ctrl+C: quit")
            }
            View::Graph => {
                self.graph.render(main, frame.buffer_mut(), &self.state, terms);
                if let Some(position) = self.graph.cursor(main) {
                    frame.set_cursor_position(position);
                }
                let hints = if self.graph.editor().is_some() {
                    "Tab: field · Ctrl+F: images · Ctrl+S: save · Esc: close"
                } else {
                    "↑↓: select · Enter: edit · i: image · p: present · Ctrl+C: quit"
                };
                (terms.graph_title, hints)
            }
            View::Slideshow => {
                SlideshowPane::render(main, frame.buffer_mut(), &self.state, terms);
                (terms.slideshow_title, "←→: navigate · e: edit · Ctrl+C: quit")
            }
        };
        frame.render_widget(StatusBar::new(screen, &self.status, hints).busy(self.state.generating), footer);
    }
}

/// Run the interactive session until the user quits.
pub async fn run_app(config: BioslideConfig, services: Services) -> Result<()> {
    let (app_tx, app_rx) = tokio::sync::mpsc::unbounded_channel();
    let app = App::new(&config, services, AppEventSender::new(app_tx)).await?;
    tracing::info!("bioslide tui started");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = event_loop(app, &mut terminal, app_rx).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

async fn event_loop<B: Backend>(
    mut app: App,
    terminal: &mut Terminal<B>,
    mut app_rx: UnboundedReceiver<AppEvent>,
) -> Result<()> {
    let orchestrator = app.orchestrator.clone();
    let mut store_rx = app.store().subscribe();

    while !app.should_quit() {
        terminal.draw(|f| app.draw(f))?;

        tokio::select! {
            Some(ev) = orchestrator.next_event() => app.handle_core_event(ev),
            Some(state) = store_rx.recv() => app.on_state(state),
            Some(ev) = app_rx.recv() => app.handle_app_event(ev),
            polled = tokio::task::spawn_blocking(|| event::poll(Duration::from_millis(50))) => {
                if let Ok(Ok(true)) = polled {
                    if let Event::Key(key) = event::read()? {
                        app.handle_key(key).await?;
                    }
                }
            }
        }
    }
    Ok(())
}
