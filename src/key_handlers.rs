use crate::controller::ChatEvent;
use crate::models::SessionState;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

const SCROLL_STEP: u16 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    Chat(ChatEvent),
    ScrollUp(u16),
    ScrollDown(u16),
    Quit,
}

/// Maps a key press on the chat screen to what it should do.
pub fn handle_chat_input(key: KeyEvent, state: &SessionState) -> Option<KeyAction> {
    if key.kind == KeyEventKind::Release {
        return None;
    }

    let edited = |draft: String| Some(KeyAction::Chat(ChatEvent::InputChanged(draft)));

    match key.code {
        KeyCode::Esc => Some(KeyAction::Quit),
        KeyCode::Enter
            if key
                .modifiers
                .intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) =>
        {
            edited(format!("{}\n", state.draft_input))
        }
        KeyCode::Enter => Some(KeyAction::Chat(ChatEvent::SubmitRequested)),
        KeyCode::Backspace => {
            let mut draft = state.draft_input.clone();
            draft.pop()?;
            edited(draft)
        }
        KeyCode::PageUp => Some(KeyAction::ScrollUp(SCROLL_STEP)),
        KeyCode::PageDown => Some(KeyAction::ScrollDown(SCROLL_STEP)),
        KeyCode::Char(c) if key.modifiers.contains(KeyModifiers::CONTROL) => match c {
            'c' => Some(KeyAction::Quit),
            's' => Some(KeyAction::Chat(ChatEvent::StreamingToggled(
                !state.is_streaming_mode,
            ))),
            'l' => Some(KeyAction::Chat(ChatEvent::ResetRequested)),
            'u' => Some(KeyAction::ScrollUp(SCROLL_STEP)),
            'd' => Some(KeyAction::ScrollDown(SCROLL_STEP)),
            _ => None,
        },
        KeyCode::Char(c) => edited(format!("{}{}", state.draft_input, c)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    fn state(draft: &str) -> SessionState {
        SessionState {
            draft_input: draft.to_string(),
            ..SessionState::new(true)
        }
    }

    #[test]
    fn test_typing_appends_to_draft() {
        assert_eq!(
            handle_chat_input(key(KeyCode::Char('é'), KeyModifiers::NONE), &state("caf")),
            Some(KeyAction::Chat(ChatEvent::InputChanged("café".to_string())))
        );
        assert_eq!(
            handle_chat_input(key(KeyCode::Char('H'), KeyModifiers::SHIFT), &state("")),
            Some(KeyAction::Chat(ChatEvent::InputChanged("H".to_string())))
        );
    }

    #[test]
    fn test_backspace_removes_whole_char() {
        assert_eq!(
            handle_chat_input(key(KeyCode::Backspace, KeyModifiers::NONE), &state("ж🤖")),
            Some(KeyAction::Chat(ChatEvent::InputChanged("ж".to_string())))
        );
        assert_eq!(
            handle_chat_input(key(KeyCode::Backspace, KeyModifiers::NONE), &state("")),
            None
        );
    }

    #[test]
    fn test_enter_submits_and_shift_enter_breaks_line() {
        assert_eq!(
            handle_chat_input(key(KeyCode::Enter, KeyModifiers::NONE), &state("hi")),
            Some(KeyAction::Chat(ChatEvent::SubmitRequested))
        );
        assert_eq!(
            handle_chat_input(key(KeyCode::Enter, KeyModifiers::SHIFT), &state("hi")),
            Some(KeyAction::Chat(ChatEvent::InputChanged("hi\n".to_string())))
        );
        assert_eq!(
            handle_chat_input(key(KeyCode::Enter, KeyModifiers::ALT), &state("hi")),
            Some(KeyAction::Chat(ChatEvent::InputChanged("hi\n".to_string())))
        );
    }

    #[test]
    fn test_control_shortcuts() {
        let s = state("draft");
        assert_eq!(
            handle_chat_input(key(KeyCode::Char('s'), KeyModifiers::CONTROL), &s),
            Some(KeyAction::Chat(ChatEvent::StreamingToggled(false)))
        );
        assert_eq!(
            handle_chat_input(key(KeyCode::Char('l'), KeyModifiers::CONTROL), &s),
            Some(KeyAction::Chat(ChatEvent::ResetRequested))
        );
        assert_eq!(
            handle_chat_input(key(KeyCode::Char('c'), KeyModifiers::CONTROL), &s),
            Some(KeyAction::Quit)
        );
        assert_eq!(
            handle_chat_input(key(KeyCode::Char('x'), KeyModifiers::CONTROL), &s),
            None
        );
        assert_eq!(
            handle_chat_input(key(KeyCode::Esc, KeyModifiers::NONE), &s),
            Some(KeyAction::Quit)
        );
    }

    #[test]
    fn test_key_release_is_ignored() {
        let mut release = key(KeyCode::Enter, KeyModifiers::NONE);
        release.kind = KeyEventKind::Release;
        assert_eq!(handle_chat_input(release, &state("hi")), None);
    }
}
