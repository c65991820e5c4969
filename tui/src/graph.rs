//! Graph screen: the deck as a chain of nodes, plus the slide editor dialog.

use bioslide_common::{Terms, View};
use bioslide_core::debounce::{field_autosave, Debouncer};
use bioslide_core::deck::{DeckGraph, EditorField, EditorSession, ImagePicker};
use bioslide_core::images::{lookup_images, ImageProbe, ImageSearch};
use bioslide_core::{AppState, Store};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};
use std::sync::Arc;
use std::time::Duration;
use unicode_width::UnicodeWidthStr;

use crate::app_event_sender::{AppEvent, AppEventSender};

/// Image search plus validation, run off the UI loop.
#[derive(Clone)]
pub struct ImageLookup {
    pub search: Arc<dyn ImageSearch + Send + Sync>,
    pub probe: Arc<dyn ImageProbe + Send + Sync>,
    pub timeout: Duration,
}

impl ImageLookup {
    fn spawn(&self, slide_id: String, term: String, tx: AppEventSender) {
        let lookup = self.clone();
        tokio::spawn(async move {
            let picker = lookup_images(lookup.search.as_ref(), lookup.probe.as_ref(), &term, lookup.timeout).await;
            tx.send(AppEvent::ImagesLoaded { slide_id, picker });
        });
    }
}

struct EditorPane {
    session: EditorSession,
    autosave: Debouncer<EditorField, String>,
    picker_open: bool,
}

pub struct GraphPane {
    selected: usize,
    editor: Option<EditorPane>,
    images: ImageLookup,
    debounce: Duration,
    app_tx: AppEventSender,
}

impl GraphPane {
    pub fn new(images: ImageLookup, debounce: Duration, app_tx: AppEventSender) -> Self {
        Self { selected: 0, editor: None, images, debounce, app_tx }
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn editor(&self) -> Option<&EditorSession> {
        self.editor.as_ref().map(|e| &e.session)
    }

    pub fn handle_key(&mut self, key: KeyEvent, store: &Store) {
        if self.editor.is_some() {
            self.handle_editor_key(key, store);
            return;
        }
        let state = store.snapshot();
        let last = state.slides.len().saturating_sub(1);
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.selected = self.selected.min(last).saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => self.selected = (self.selected + 1).min(last),
            KeyCode::Enter => {
                if let Some(slide) = state.slides.get(self.selected) {
                    self.open(EditorSession::open(slide), store, false);
                }
            }
            KeyCode::Char('i') => {
                if let Some(slide) = state.slides.get(self.selected) {
                    self.open(EditorSession::open_image_only(slide), store, true);
                }
            }
            KeyCode::Char('p') if !state.slides.is_empty() => {
                store.update(|s| s.with_view(View::Slideshow));
            }
            _ => {}
        }
    }

    fn open(&mut self, session: EditorSession, store: &Store, with_picker: bool) {
        let autosave = field_autosave(store.clone(), session.slide_id.clone(), self.debounce);
        let mut editor = EditorPane { session, autosave, picker_open: false };
        if with_picker {
            self.open_picker(&mut editor);
        }
        self.editor = Some(editor);
    }

    fn open_picker(&self, editor: &mut EditorPane) {
        editor.picker_open = true;
        if !editor.session.wants_images() {
            return;
        }
        if let Some(term) = editor.session.image_search_term.clone() {
            editor.session.set_picker(ImagePicker::Loading);
            self.images.spawn(editor.session.slide_id.clone(), term, self.app_tx.clone());
        }
    }

    fn handle_editor_key(&mut self, key: KeyEvent, store: &Store) {
        let Some(mut editor) = self.editor.take() else {
            return;
        };
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let mut keep_open = true;

        if editor.picker_open {
            match key.code {
                KeyCode::Up | KeyCode::Char('k') => editor.session.highlight_previous(),
                KeyCode::Down | KeyCode::Char('j') => editor.session.highlight_next(),
                KeyCode::Enter => {
                    editor.session.choose_highlighted();
                    editor.picker_open = false;
                }
                KeyCode::Esc => {
                    editor.picker_open = false;
                    keep_open = !editor.session.image_only;
                }
                _ => {}
            }
        } else {
            let focus = editor.session.focus;
            let editable = !editor.session.image_only;
            match key.code {
                KeyCode::Esc => {
                    editor.autosave.flush_all();
                    keep_open = false;
                }
                KeyCode::Char('s') if ctrl => {
                    editor.autosave.cancel_all();
                    editor.session.save(store);
                    keep_open = false;
                }
                KeyCode::Char('f') if ctrl => self.open_picker(&mut editor),
                KeyCode::Tab if editable => {
                    editor.autosave.flush(&focus);
                    editor.session.focus = focus.next();
                }
                KeyCode::Enter if editable && focus == EditorField::Content => {
                    edit(&mut editor, |value| value.push('\n'));
                }
                KeyCode::Backspace if editable => {
                    edit(&mut editor, |value| {
                        value.pop();
                    });
                }
                KeyCode::Char(c) if editable && !ctrl => edit(&mut editor, |value| value.push(c)),
                _ => {}
            }
        }

        if keep_open {
            self.editor = Some(editor);
        }
    }

    pub fn on_app_event(&mut self, event: &AppEvent) {
        match event {
            AppEvent::ImagesLoaded { slide_id, picker } => {
                let Some(editor) = self.editor.as_mut() else {
                    return;
                };
                if &editor.session.slide_id == slide_id && editor.session.picker == ImagePicker::Loading {
                    editor.session.set_picker(picker.clone());
                }
            }
        }
    }

    pub fn render(&self, area: Rect, buf: &mut Buffer, state: &AppState, terms: &Terms) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Min(3), Constraint::Length(1)])
            .split(area);

        Paragraph::new(vec![
            Line::from(Span::styled(terms.graph_title, Style::default().add_modifier(Modifier::BOLD))),
            Line::from(Span::styled(terms.graph_subtitle, Style::default().fg(Color::Gray))),
        ])
        .render(rows[0], buf);

        let graph = DeckGraph::from_slides(&state.slides);
        let selected = self.selected.min(graph.nodes.len().saturating_sub(1));
        let mut lines = Vec::new();
        for (i, node) in graph.nodes.iter().enumerate() {
            let style = if i == selected {
                Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Cyan)
            };
            let has_image = state.slides.get(i).is_some_and(|s| s.image_url.is_some());
            lines.push(Line::from(vec![
                Span::styled(format!(" {} {} ", terms.slide_node, node.ordinal()), style),
                Span::raw(" "),
                Span::raw(node.label.as_str()),
                Span::styled(if has_image { "  🖼" } else { "" }, Style::default().fg(Color::Blue)),
            ]));
            if graph.edges.iter().any(|e| e.source == node.id) {
                lines.push(Line::from(Span::styled("    │", Style::default().fg(Color::DarkGray))));
                lines.push(Line::from(Span::styled("    ▼", Style::default().fg(Color::DarkGray))));
            }
        }
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL)).render(rows[1], buf);

        Paragraph::new(Span::styled(
            format!("[p] {}", terms.continue_to_slideshow),
            Style::default().fg(Color::Green),
        ))
        .render(rows[2], buf);

        if let Some(editor) = &self.editor {
            render_editor(editor, dialog_area(area), buf, terms);
        }
    }

    pub fn cursor(&self, area: Rect) -> Option<Position> {
        let editor = self.editor.as_ref()?;
        if editor.picker_open || editor.session.image_only {
            return None;
        }
        let [title, content, _] = editor_rows(inner(dialog_area(area)));
        let position = match editor.session.focus {
            EditorField::Title => Position::new(title.x + 1 + editor.session.title.width() as u16, title.y + 1),
            EditorField::Content => {
                let last = editor.session.content.rsplit('\n').next().unwrap_or_default();
                let row = editor.session.content.split('\n').count().saturating_sub(1) as u16;
                Position::new(content.x + 1 + last.width() as u16, content.y + 1 + row)
            }
        };
        Some(position)
    }
}

fn edit(editor: &mut EditorPane, change: impl FnOnce(&mut String)) {
    let field = editor.session.focus;
    let value = editor.session.field_value_mut(field);
    change(value);
    let value = value.clone();
    editor.autosave.schedule(field, value);
}

fn dialog_area(area: Rect) -> Rect {
    let width = area.width.saturating_mul(3) / 4;
    let height = area.height.saturating_mul(3) / 4;
    Rect::new(area.x + (area.width - width) / 2, area.y + (area.height - height) / 2, width, height)
}

fn inner(area: Rect) -> Rect {
    Block::default().borders(Borders::ALL).inner(area)
}

fn editor_rows(area: Rect) -> [Rect; 3] {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3), Constraint::Length(3)])
        .split(area);
    [rows[0], rows[1], rows[2]]
}

fn render_editor(editor: &EditorPane, area: Rect, buf: &mut Buffer, terms: &Terms) {
    let session = &editor.session;
    let title = if session.image_only { terms.select_image_title } else { terms.edit_slide };
    Clear.render(area, buf);
    Block::default()
        .title(format!(" {title} "))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .render(area, buf);

    let [title_row, content_row, image_row] = editor_rows(inner(area));
    let field_block = |label: &str, field: EditorField| {
        let focused = !session.image_only && !editor.picker_open && session.focus == field;
        let style = if focused { Style::default().fg(Color::Cyan) } else { Style::default().fg(Color::DarkGray) };
        Block::default().title(format!(" {label} ")).borders(Borders::ALL).border_style(style)
    };
    Paragraph::new(session.title.as_str())
        .block(field_block(terms.slide_title, EditorField::Title))
        .render(title_row, buf);
    Paragraph::new(session.content.as_str())
        .wrap(Wrap { trim: false })
        .block(field_block(terms.slide_content, EditorField::Content))
        .render(content_row, buf);

    let image = session.selected_image.as_deref().unwrap_or("-");
    Paragraph::new(Line::from(vec![
        Span::raw(format!("{image}  ")),
        Span::styled(
            format!("[^F] {}  [^S] {}  [Esc] {}", terms.select_image, terms.save_changes, terms.cancel),
            Style::default().fg(Color::Gray),
        ),
    ]))
    .block(Block::default().borders(Borders::ALL))
    .render(image_row, buf);

    if editor.picker_open {
        render_picker(session, dialog_area(area), buf, terms);
    }
}

fn render_picker(session: &EditorSession, area: Rect, buf: &mut Buffer, terms: &Terms) {
    Clear.render(area, buf);
    let lines: Vec<Line> = match &session.picker {
        ImagePicker::Loading => vec![Line::from(Span::styled(terms.loading_images, Style::default().fg(Color::Yellow)))],
        ImagePicker::Idle | ImagePicker::NoImages => {
            vec![Line::from(Span::styled(terms.no_images, Style::default().fg(Color::Gray)))]
        }
        ImagePicker::Ready(candidates) => candidates
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let chosen = session.selected_image.as_deref() == Some(c.url.as_str());
                let style = if i == session.highlighted {
                    Style::default().fg(Color::Black).bg(Color::Cyan)
                } else {
                    Style::default()
                };
                let label = if c.title.is_empty() { c.url.as_str() } else { c.title.as_str() };
                Line::from(Span::styled(format!("{} {label}", if chosen { "●" } else { "○" }), style))
            })
            .collect(),
    };
    Paragraph::new(lines)
        .block(Block::default().title(format!(" {} ", terms.select_image_title)).borders(Borders::ALL))
        .render(area, buf);
}
