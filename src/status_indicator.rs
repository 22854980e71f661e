use crate::models::{ConnectionStatus, SessionState};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

#[derive(Debug)]
pub struct StatusIndicator {
    thinking: bool,
    streaming_mode: bool,
    connection: ConnectionStatus,
    spinner_idx: usize,
}

impl Default for StatusIndicator {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusIndicator {
    pub fn new() -> Self {
        Self {
            thinking: false,
            streaming_mode: true,
            connection: ConnectionStatus::Online,
            spinner_idx: 0,
        }
    }

    pub fn sync(&mut self, state: &SessionState, connection: ConnectionStatus) {
        self.thinking = state.is_processing;
        self.streaming_mode = state.is_streaming_mode;
        self.connection = connection;
    }

    pub fn is_thinking(&self) -> bool {
        self.thinking
    }

    pub fn update_spinner(&mut self) {
        self.spinner_idx = self.spinner_idx.wrapping_add(1);
    }

    pub fn frame(&self) -> usize {
        self.spinner_idx
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let spinner_frames = ["◐", "◓", "◑", "◒"];
        let thinking_indicator = if self.thinking {
            spinner_frames[self.spinner_idx % spinner_frames.len()]
        } else {
            " "
        };
        let status_text = if self.thinking {
            "Waiting for answer..."
        } else {
            ""
        };

        let left = Line::from(vec![
            Span::styled(thinking_indicator, Style::default().fg(Color::Gray)),
            Span::raw(" "),
            Span::styled(status_text, Style::default().fg(Color::DarkGray)),
        ]);

        let connection_color = match self.connection {
            ConnectionStatus::Online => Color::Rgb(16, 185, 129),
            ConnectionStatus::Offline => Color::Rgb(239, 68, 68),
        };
        let right = Line::from(vec![
            Span::styled(
                if self.streaming_mode { "streaming " } else { "buffered " },
                Style::default().fg(Color::DarkGray),
            ),
            Span::styled("● ", Style::default().fg(connection_color)),
            Span::styled(self.connection.label(), Style::default().fg(connection_color)),
        ]);

        let halves = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(1), Constraint::Length(20)])
            .split(area);

        frame.render_widget(Paragraph::new(left).alignment(Alignment::Left), halves[0]);
        frame.render_widget(Paragraph::new(right).alignment(Alignment::Right), halves[1]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_follows_session() {
        let mut indicator = StatusIndicator::new();
        let state = SessionState {
            draft_input: String::new(),
            is_streaming_mode: false,
            is_processing: true,
        };

        indicator.sync(&state, ConnectionStatus::Offline);

        assert!(indicator.thinking);
        assert!(!indicator.streaming_mode);
        assert_eq!(indicator.connection, ConnectionStatus::Offline);
    }
}
