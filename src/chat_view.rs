use crate::chat_message::ChatMessage;
use crate::message_list::MessageList;
use crate::models::SessionState;
use crate::status_indicator::StatusIndicator;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

const MAX_INPUT_LINES: usize = 5;

fn clamp_u16(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}

pub fn draw_chat(
    f: &mut Frame,
    messages: &mut MessageList,
    state: &SessionState,
    status: &StatusIndicator,
) {
    let size = f.area();
    let input_lines = state.draft_input.split('\n').count().clamp(1, MAX_INPUT_LINES);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(
            [
                Constraint::Min(1),
                Constraint::Length(1),
                Constraint::Length(input_lines as u16 + 2),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(size);

    draw_messages(f, messages, status.frame(), chunks[0]);
    status.render(f, chunks[1]);
    draw_input(f, state, chunks[2]);
    draw_footer(f, state, chunks[3]);
}

fn draw_messages(f: &mut Frame, messages: &mut MessageList, typing_frame: usize, area: Rect) {
    let mut lines = Vec::new();
    for message in messages.messages() {
        if !lines.is_empty() {
            lines.push(Line::from(""));
        }
        lines.extend(ChatMessage::new(message).render(area.width, typing_frame));
    }

    let total_lines = clamp_u16(lines.len());
    let max_scroll = total_lines.saturating_sub(area.height);
    messages.clamp_scroll(max_scroll);
    let top = max_scroll - messages.scroll_back();

    f.render_widget(Paragraph::new(lines).scroll((top, 0)), area);
}

fn draw_input(f: &mut Frame, state: &SessionState, area: Rect) {
    let separator = "─".repeat(area.width as usize);
    let separator_style = Style::default().fg(Color::DarkGray);

    f.render_widget(
        Paragraph::new(Line::from(Span::styled(separator.clone(), separator_style))),
        Rect { height: 1, ..area },
    );
    f.render_widget(
        Paragraph::new(Line::from(Span::styled(separator, separator_style))),
        Rect {
            y: area.y + area.height.saturating_sub(1),
            height: 1,
            ..area
        },
    );

    let draft_lines: Vec<&str> = state.draft_input.split('\n').collect();
    let visible = &draft_lines[draft_lines.len().saturating_sub(MAX_INPUT_LINES)..];

    let prefix_style = if state.is_processing {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::Yellow)
    };
    let lines: Vec<Line> = visible
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let prefix = if i == 0 { "→ " } else { "  " };
            Line::from(vec![
                Span::styled(prefix, prefix_style),
                Span::styled(*text, Style::default().fg(Color::White)),
            ])
        })
        .collect();

    let body = Rect {
        y: area.y + 1,
        height: area.height.saturating_sub(2),
        ..area
    };

    // Keep the end of the last line, where the cursor is, in view.
    let last = visible.last().copied().unwrap_or_default();
    let visible_width = body.width.saturating_sub(2);
    let text_width = clamp_u16(last.width());
    let scroll_offset = text_width.saturating_sub(visible_width);

    f.render_widget(Paragraph::new(lines).scroll((0, scroll_offset)), body);

    let cursor_x = body
        .x
        .saturating_add(2)
        .saturating_add(text_width - scroll_offset);
    let cursor_y = body
        .y
        .saturating_add(clamp_u16(visible.len()).saturating_sub(1));
    f.set_cursor_position((cursor_x, cursor_y));
}

fn draw_footer(f: &mut Frame, state: &SessionState, area: Rect) {
    let send_style = if state.can_send() {
        Style::default()
            .fg(Color::LightCyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::DIM)
    };

    let footer = Paragraph::new(Line::from(vec![
        Span::styled("Enter send", send_style),
        Span::styled(
            " · Shift/Alt+Enter newline · Ctrl+S stream mode · Ctrl+L clear · Esc quit",
            Style::default().fg(Color::LightCyan),
        ),
    ]))
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true });

    f.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message_list::MessageListView;
    use crate::models::Sender;
    use ratatui::{backend::TestBackend, Terminal};

    fn screen(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let width = buffer.area.width as usize;
        buffer
            .content()
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_draw_shows_messages_and_draft() {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        let mut list = MessageList::new();
        list.append_message(Sender::Bot, "Welcome aboard");
        list.append_message(Sender::User, "hello");
        let state = SessionState {
            draft_input: "next question".to_string(),
            ..SessionState::new(true)
        };
        let status = StatusIndicator::new();

        terminal
            .draw(|f| draw_chat(f, &mut list, &state, &status))
            .unwrap();

        let screen = screen(&terminal);
        assert!(screen.contains("Welcome aboard"));
        assert!(screen.contains("hello"));
        assert!(screen.contains("→ next question"));
        assert!(screen.contains("Online"));
    }

    #[test]
    fn test_draw_follows_bottom_and_clamps_scroll() {
        let mut terminal = Terminal::new(TestBackend::new(60, 16)).unwrap();
        let mut list = MessageList::new();
        for i in 0..20 {
            list.append_message(Sender::Bot, &format!("message number {}", i));
        }
        list.scroll_up(10_000);
        let state = SessionState::new(false);
        let status = StatusIndicator::new();

        terminal
            .draw(|f| draw_chat(f, &mut list, &state, &status))
            .unwrap();
        assert!(screen(&terminal).contains("message number 0"));
        assert!(list.scroll_back() < 10_000);

        list.scroll_to_bottom();
        terminal
            .draw(|f| draw_chat(f, &mut list, &state, &status))
            .unwrap();
        let screen = screen(&terminal);
        assert!(screen.contains("message number 19"));
        assert!(!screen
            .lines()
            .any(|row| row.trim_end().ends_with("message number 0")));
    }

    #[test]
    fn test_very_wide_draft_keeps_cursor_on_screen() {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        let mut list = MessageList::new();
        let state = SessionState {
            draft_input: "x".repeat(70_000),
            ..SessionState::new(true)
        };
        let status = StatusIndicator::new();

        terminal
            .draw(|f| draw_chat(f, &mut list, &state, &status))
            .unwrap();

        let cursor = terminal.get_cursor_position().unwrap();
        assert!(cursor.x < 80);
        assert!(cursor.y < 24);
    }

    #[test]
    fn test_clamp_u16_saturates() {
        assert_eq!(clamp_u16(12), 12);
        assert_eq!(clamp_u16(70_000), u16::MAX);
    }
}
