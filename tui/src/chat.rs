use bioslide_common::{Role, Terms};
use bioslide_core::AppState;
use bioslide_protocol::Event;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

#[derive(Debug, PartialEq, Eq)]
pub enum ChatAction {
    None,
    Submit(String),
    Reset,
}

/// Conversation screen: transcript plus the input line.
#[derive(Debug, Default)]
pub struct ChatPane {
    input: String,
    /// Assistant text streamed so far for the turn in flight.
    streaming: String,
}

impl ChatPane {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> ChatAction {
        match key.code {
            KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.input.clear();
                self.streaming.clear();
                ChatAction::Reset
            }
            KeyCode::Enter => {
                if state.generating || self.input.trim().is_empty() {
                    return ChatAction::None;
                }
                ChatAction::Submit(std::mem::take(&mut self.input))
            }
            KeyCode::Backspace => {
                self.input.pop();
                ChatAction::None
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.input.push(c);
                ChatAction::None
            }
            _ => ChatAction::None,
        }
    }

    pub fn on_event(&mut self, event: &Event) {
        match event {
            Event::TurnStarted => self.streaming.clear(),
            Event::AgentMessageDelta { delta } => self.streaming.push_str(delta),
            Event::AgentMessage { .. } | Event::Error { .. } | Event::TurnComplete | Event::ResetComplete => {
                self.streaming.clear()
            }
            _ => {}
        }
    }

    /// Where the terminal cursor goes inside `area`.
    pub fn cursor(&self, area: Rect) -> Position {
        let [_, _, input] = split(area);
        let x = input.x + 1 + self.input.width() as u16;
        Position::new(x.min(input.right().saturating_sub(2)), input.y + 1)
    }

    pub fn render(&self, area: Rect, buf: &mut Buffer, state: &AppState, terms: &Terms) {
        let [header, transcript, input] = split(area);

        Paragraph::new(vec![
            Line::from(Span::styled(terms.chat_title, Style::default().add_modifier(Modifier::BOLD))),
            Line::from(Span::styled(terms.chat_subtitle, Style::default().fg(Color::Gray))),
        ])
        .render(header, buf);

        let lines = self.transcript_lines(state, terms);
        let height = transcript.height.saturating_sub(2) as usize;
        let scroll = lines.len().saturating_sub(height) as u16;
        Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL))
            .wrap(Wrap { trim: false })
            .scroll((scroll, 0))
            .render(transcript, buf);

        let (text, style) = if self.input.is_empty() {
            (terms.chat_placeholder, Style::default().fg(Color::DarkGray))
        } else {
            (self.input.as_str(), Style::default())
        };
        let title = if state.generating { terms.generating } else { terms.send_button };
        Paragraph::new(Span::styled(text, style))
            .block(Block::default().title(format!(" {title} ")).borders(Borders::ALL))
            .render(input, buf);
    }

    fn transcript_lines<'a>(&'a self, state: &'a AppState, terms: &'a Terms) -> Vec<Line<'a>> {
        let mut lines = Vec::new();
        for message in &state.messages {
            lines.push(speaker(message.role));
            lines.extend(message.content.lines().map(Line::from));
            lines.push(Line::from(""));
        }
        if state.generating {
            lines.push(speaker(Role::Assistant));
            if self.streaming.is_empty() {
                lines.push(Line::from(Span::styled(terms.generating, Style::default().fg(Color::Yellow))));
            } else {
                lines.extend(self.streaming.lines().map(Line::from));
            }
        }
        lines
    }
}

fn speaker(role: Role) -> Line<'static> {
    let color = match role {
        Role::User => Color::Cyan,
        Role::Assistant => Color::Green,
    };
    Line::from(Span::styled(role.tag(), Style::default().fg(color).add_modifier(Modifier::BOLD)))
}

fn split(area: Rect) -> [Rect; 3] {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(3), Constraint::Length(3)])
        .split(area);
    [chunks[0], chunks[1], chunks[2]]
}

#[cfg(test)]
mod tests {
    use super::*;
    use bioslide_common::terms::ENGLISH;
    use bioslide_common::Message;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(pane: &mut ChatPane, text: &str, state: &AppState) {
        for c in text.chars() {
            pane.handle_key(key(KeyCode::Char(c)), state);
        }
    }

    #[test]
    fn enter_submits_and_clears_the_input() {
        let mut pane = ChatPane::new();
        let state = AppState::default();
        type_text(&mut pane, "Komitas", &state);
        assert_eq!(pane.handle_key(key(KeyCode::Enter), &state), ChatAction::Submit("Komitas".into()));
        assert_eq!(pane.input(), "");
    }

    #[test]
    fn blank_input_is_not_submitted() {
        let mut pane = ChatPane::new();
        let state = AppState::default();
        type_text(&mut pane, "   ", &state);
        assert_eq!(pane.handle_key(key(KeyCode::Enter), &state), ChatAction::None);
    }

    #[test]
    fn input_is_kept_while_a_turn_is_running() {
        let mut pane = ChatPane::new();
        let state = AppState::default().with_generating(true);
        type_text(&mut pane, "more", &state);
        assert_eq!(pane.handle_key(key(KeyCode::Enter), &state), ChatAction::None);
        assert_eq!(pane.input(), "more");
    }

    #[test]
    fn streamed_text_is_shown_until_the_turn_ends() {
        let mut pane = ChatPane::new();
        let state = AppState::default().with_message(Message::user("Einstein")).with_generating(true);
        pane.on_event(&Event::AgentMessageDelta { delta: "How many ".into() });
        pane.on_event(&Event::AgentMessageDelta { delta: "slides?".into() });

        let area = Rect::new(0, 0, 40, 14);
        let mut buf = Buffer::empty(area);
        pane.render(area, &mut buf, &state, &ENGLISH);
        let text: String = buf.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("How many slides?"));

        pane.on_event(&Event::TurnComplete);
        assert!(pane.streaming.is_empty());
    }
}
