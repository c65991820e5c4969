use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

/// Bottom line: active screen, what is going on, and the key hints.
pub struct StatusBar<'a> {
    screen: &'a str,
    status: &'a str,
    hints: &'a str,
    busy: bool,
}

impl<'a> StatusBar<'a> {
    pub fn new(screen: &'a str, status: &'a str, hints: &'a str) -> Self {
        Self { screen, status, hints, busy: false }
    }

    pub fn busy(mut self, busy: bool) -> Self {
        self.busy = busy;
        self
    }
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let badge = if self.busy { Color::Magenta } else { Color::Cyan };
        let mut spans = vec![Span::styled(
            format!(" {} ", self.screen),
            Style::default().fg(Color::Black).bg(badge).add_modifier(Modifier::BOLD),
        )];
        if !self.status.is_empty() {
            spans.push(Span::raw("  "));
            spans.push(Span::styled(self.status, Style::default().fg(Color::Yellow)));
        }
        spans.push(Span::raw("  |  "));
        spans.push(Span::styled(self.hints, Style::default().fg(Color::Gray)));

        Paragraph::new(Line::from(spans))
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Left)
            .render(area, buf);
    }
}
