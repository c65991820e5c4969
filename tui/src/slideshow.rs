use bioslide_common::{Terms, View};
use bioslide_core::slideshow::{SlideFrame, SlideshowView};
use bioslide_core::{AppState, Store};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use crate::map::LocationMap;

/// Presentation screen. Navigation goes straight to the store, which
/// clamps the index.
pub struct SlideshowPane;

impl SlideshowPane {
    pub fn handle_key(key: KeyEvent, store: &Store) {
        match key.code {
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Char(' ') | KeyCode::PageDown => {
                store.update(|s| s.next_slide());
            }
            KeyCode::Left | KeyCode::Char('h') | KeyCode::PageUp => {
                store.update(|s| s.previous_slide());
            }
            KeyCode::Esc | KeyCode::Char('e') => {
                store.update(|s| s.with_view(View::Graph));
            }
            _ => {}
        }
    }

    pub fn render(area: Rect, buf: &mut Buffer, state: &AppState, terms: &Terms) {
        match SlideshowView::from_state(state, terms) {
            SlideshowView::Empty { message } => {
                Paragraph::new(vec![
                    Line::from(Span::styled(message, Style::default().fg(Color::Red))),
                    Line::from(""),
                    Line::from(Span::styled(format!("[e] {}", terms.back_to_edit), Style::default().fg(Color::Gray))),
                ])
                .alignment(Alignment::Center)
                .block(Block::default().title(format!(" {} ", terms.slideshow_title)).borders(Borders::ALL))
                .render(area, buf);
            }
            SlideshowView::Slide(frame) => render_frame(&frame, area, buf, terms),
        }
    }
}

fn render_frame(frame: &SlideFrame, area: Rect, buf: &mut Buffer, terms: &Terms) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(1), Constraint::Length(1)])
        .split(area);

    let body = if frame.marker.is_some() {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(rows[0])
    } else {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(100)])
            .split(rows[0])
    };

    let mut lines = vec![
        Line::from(Span::styled(
            frame.slide.title.as_str(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    lines.extend(frame.slide.content.lines().map(Line::from));
    if let Some(url) = &frame.slide.image_url {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!("🖼 {url}"), Style::default().fg(Color::Blue))));
    }
    Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title(format!(" {} · {} ", terms.slideshow_title, frame.position_label))
                .borders(Borders::ALL),
        )
        .render(body[0], buf);

    if let Some(marker) = &frame.marker {
        LocationMap::new(marker, terms.location_marker).render(body[1], buf);
    }

    let dots: Vec<Span> = frame
        .progress()
        .into_iter()
        .map(|current| {
            if current {
                Span::styled("● ", Style::default().fg(Color::Cyan))
            } else {
                Span::styled("○ ", Style::default().fg(Color::DarkGray))
            }
        })
        .collect();
    Paragraph::new(Line::from(dots)).alignment(Alignment::Center).render(rows[1], buf);

    let enabled = |on: bool| if on { Style::default() } else { Style::default().fg(Color::DarkGray) };
    Paragraph::new(Line::from(vec![
        Span::styled(format!("← {}", terms.previous), enabled(frame.has_previous())),
        Span::raw("   "),
        Span::styled(format!("[e] {}", terms.back_to_edit), Style::default().fg(Color::Gray)),
        Span::raw("   "),
        Span::styled(format!("{} →", terms.next), enabled(frame.has_next())),
    ]))
    .alignment(Alignment::Center)
    .render(rows[2], buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use bioslide_common::terms::ENGLISH;
    use bioslide_common::Slide;
    use crossterm::event::KeyModifiers;

    fn store() -> Store {
        let state = AppState::default()
            .with_slides(vec![Slide::new("1", "One", "a"), Slide::new("2", "Two", "b"), Slide::new("3", "Three", "c")])
            .with_view(View::Slideshow);
        Store::with_state(state)
    }

    fn press(code: KeyCode, store: &Store) {
        SlideshowPane::handle_key(KeyEvent::new(code, KeyModifiers::NONE), store);
    }

    fn rendered(state: &AppState) -> String {
        let area = Rect::new(0, 0, 60, 12);
        let mut buf = Buffer::empty(area);
        SlideshowPane::render(area, &mut buf, state, &ENGLISH);
        buf.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn arrows_move_within_the_deck() {
        let store = store();
        let mut seen = Vec::new();
        for _ in 0..3 {
            press(KeyCode::Right, &store);
            seen.push(store.snapshot().current_slide_index);
        }
        assert_eq!(seen, vec![1, 2, 2]);
        press(KeyCode::Left, &store);
        assert_eq!(store.snapshot().current_slide_index, 1);
    }

    #[test]
    fn escape_returns_to_the_editor() {
        let store = store();
        press(KeyCode::Esc, &store);
        assert_eq!(store.snapshot().view, View::Graph);
    }

    #[test]
    fn renders_current_slide_and_position() {
        let store = store();
        press(KeyCode::Right, &store);
        let text = rendered(&store.snapshot());
        assert!(text.contains("Two"));
        assert!(text.contains("Slide 2 / 3"));
    }

    #[test]
    fn empty_deck_renders_the_error_state() {
        assert!(rendered(&AppState::default()).contains(ENGLISH.error_generating));
    }
}
