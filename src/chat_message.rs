use crate::constants::{BOT_AVATAR, TYPING_FRAMES, USER_AVATAR};
use crate::models::{Message, Sender};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};
use textwrap::wrap;

/// Renders one [`Message`] as terminal lines.
pub struct ChatMessage<'a> {
    message: &'a Message,
}

impl<'a> ChatMessage<'a> {
    pub fn new(message: &'a Message) -> Self {
        Self { message }
    }

    /// `typing_frame` animates the placeholder.
    pub fn render(&self, width: u16, typing_frame: usize) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        let base_style = self.get_base_style();

        self.render_header(&mut lines, base_style);

        if self.message.is_placeholder() {
            self.render_typing(&mut lines, base_style, typing_frame);
        } else {
            self.render_content(&mut lines, width, base_style);
        }

        self.render_footer(&mut lines, base_style);

        lines
    }

    fn from_user(&self) -> bool {
        self.message.sender == Sender::User
    }

    fn indent(&self) -> &'static str {
        if self.from_user() {
            "  "
        } else {
            ""
        }
    }

    fn get_base_style(&self) -> Style {
        let style = Style::default().fg(if self.from_user() {
            Color::Rgb(255, 223, 128)
        } else {
            Color::Rgb(144, 238, 144)
        });

        // Still streaming
        if self.message.timestamp.is_none() {
            style.add_modifier(Modifier::DIM)
        } else {
            style
        }
    }

    fn render_header(&self, lines: &mut Vec<Line<'static>>, style: Style) {
        let avatar = if self.from_user() { USER_AVATAR } else { BOT_AVATAR };
        let time = self
            .message
            .timestamp
            .clone()
            .unwrap_or_else(|| "…".to_string());

        lines.push(Line::from(vec![
            Span::styled(self.indent().to_string(), style),
            Span::styled("┌─".to_string(), style),
            Span::styled(format!("{} ", avatar), style),
            Span::styled(time, style.add_modifier(Modifier::DIM)),
        ]));
    }

    fn render_content(&self, lines: &mut Vec<Line<'static>>, width: u16, style: Style) {
        let indent = self.indent();
        let wrap_width = (width as usize)
            .saturating_sub(indent.len() + 2)
            .max(1);

        let mut text = self.message.text.clone();
        if self.message.timestamp.is_none() {
            text.push('▍');
        }

        for wrapped_line in wrap(&text, wrap_width) {
            lines.push(Line::from(vec![
                Span::styled(indent.to_string(), style),
                Span::styled("│ ".to_string(), style),
                Span::styled(wrapped_line.into_owned(), style),
            ]));
        }
    }

    fn render_typing(&self, lines: &mut Vec<Line<'static>>, style: Style, frame: usize) {
        let dots = TYPING_FRAMES[frame % TYPING_FRAMES.len()];
        lines.push(Line::from(vec![
            Span::styled(self.indent().to_string(), style),
            Span::styled("│ ".to_string(), style),
            Span::styled(dots.to_string(), Style::default().fg(Color::DarkGray)),
        ]));
    }

    fn render_footer(&self, lines: &mut Vec<Line<'static>>, style: Style) {
        lines.push(Line::from(vec![
            Span::styled(self.indent().to_string(), style),
            Span::styled("╰─".to_string(), style),
        ]));
    }
}
