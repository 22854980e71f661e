use crate::{
    api::AnswerService,
    chat_view::draw_chat,
    config::{persist_streaming, Config},
    controller::{AnswerEvent, ChatController, ChatEvent},
    errors::AskchatResult,
    key_handlers::{handle_chat_input, KeyAction},
    message_list::MessageList,
    status_indicator::StatusIndicator,
};
use crossterm::{
    event::{
        Event, EventStream, KeyEvent, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
        PushKeyboardEnhancementFlags,
    },
    cursor::Show,
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use futures::StreamExt;
use log::{info, warn};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{io, sync::Arc, time::Duration};
use tokio::sync::mpsc::{self, UnboundedReceiver};

const TICK: Duration = Duration::from_millis(120);

pub struct App<S: AnswerService> {
    pub controller: ChatController<S, MessageList>,
    answers: UnboundedReceiver<AnswerEvent>,
    status: StatusIndicator,
    /// Write the streaming toggle back to the config file.
    persist_settings: bool,
    should_quit: bool,
}

impl<S: AnswerService> App<S> {
    pub fn new(service: Arc<S>, config: &Config) -> Self {
        let (tx, answers) = mpsc::unbounded_channel();
        let controller = ChatController::new(
            service,
            MessageList::new(),
            &config.welcome_message,
            config.streaming,
            tx,
        );

        let mut app = Self {
            controller,
            answers,
            status: StatusIndicator::new(),
            persist_settings: false,
            should_quit: false,
        };
        app.sync_status();
        app
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        let Some(action) = handle_chat_input(key, self.controller.state()) else {
            return;
        };

        match action {
            KeyAction::Chat(event) => {
                if let ChatEvent::StreamingToggled(enabled) = event {
                    self.save_streaming_choice(enabled);
                }
                self.controller.dispatch(event);
            }
            KeyAction::ScrollUp(lines) => self.controller.view_mut().scroll_up(lines),
            KeyAction::ScrollDown(lines) => self.controller.view_mut().scroll_down(lines),
            KeyAction::Quit => self.should_quit = true,
        }
        self.sync_status();
    }

    pub fn apply_answer(&mut self, event: AnswerEvent) {
        self.controller.apply(event);
        self.sync_status();
    }

    pub fn tick(&mut self) {
        self.status.update_spinner();
    }

    pub fn draw(&mut self, f: &mut Frame) {
        let state = self.controller.state().clone();
        draw_chat(f, self.controller.view_mut(), &state, &self.status);
    }

    fn sync_status(&mut self) {
        self.status
            .sync(self.controller.state(), self.controller.connection());
    }

    fn save_streaming_choice(&self, enabled: bool) {
        if !self.persist_settings {
            return;
        }
        if let Err(e) = persist_streaming(enabled) {
            warn!("Failed to save streaming mode: {}", e);
        }
    }
}

/// Puts the terminal back the way the shell expects it when dropped, so an
/// early `?` in `run_ui` does not leave raw mode behind.
struct TerminalGuard {
    alternate_screen: bool,
    keyboard_enhanced: bool,
}

impl TerminalGuard {
    fn enter() -> AskchatResult<Self> {
        enable_raw_mode()?;
        Ok(Self {
            alternate_screen: false,
            keyboard_enhanced: false,
        })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let mut stdout = io::stdout();
        if self.keyboard_enhanced {
            if let Err(e) = execute!(stdout, PopKeyboardEnhancementFlags) {
                warn!("Failed to pop keyboard enhancement flags: {}", e);
            }
        }
        if self.alternate_screen {
            if let Err(e) = execute!(stdout, LeaveAlternateScreen, Show) {
                warn!("Failed to leave alternate screen: {}", e);
            }
        }
        if let Err(e) = disable_raw_mode() {
            warn!("Failed to disable raw mode: {}", e);
        }
    }
}

/// Runs the terminal UI until the user quits.
pub async fn run_ui<S: AnswerService>(service: Arc<S>, config: &Config) -> AskchatResult<()> {
    let mut app = App::new(service, config);
    app.persist_settings = true;

    let mut guard = TerminalGuard::enter()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    guard.alternate_screen = true;
    // Lets terminals that support it report Shift+Enter distinctly.
    if matches!(supports_keyboard_enhancement(), Ok(true)) {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
        )?;
        guard.keyboard_enhanced = true;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    info!("chat UI started");
    let res = run_app(&mut terminal, &mut app).await;
    drop(guard);
    info!("chat UI stopped");

    res
}

async fn run_app<B: Backend, S: AnswerService>(
    terminal: &mut Terminal<B>,
    app: &mut App<S>,
) -> AskchatResult<()> {
    let mut keys = EventStream::new();
    let mut ticker = tokio::time::interval(TICK);

    loop {
        terminal.draw(|f| app.draw(f))?;
        if app.should_quit() {
            return Ok(());
        }

        tokio::select! {
            event = keys.next() => match event {
                Some(Ok(Event::Key(key))) => app.handle_key(key),
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => return Ok(()),
            },
            Some(answer) = app.answers.recv() => app.apply_answer(answer),
            _ = ticker.tick() => app.tick(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::HttpAnswerService;
    use crossterm::event::{KeyCode, KeyModifiers};
    use wiremock::{
        matchers::{method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    fn type_text<S: AnswerService>(app: &mut App<S>, text: &str) {
        for c in text.chars() {
            app.handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE));
        }
    }

    async fn drain<S: AnswerService>(app: &mut App<S>) {
        while app.controller.state().is_processing {
            match app.answers.recv().await {
                Some(event) => app.apply_answer(event),
                None => break,
            }
        }
    }

    #[tokio::test]
    async fn test_keyboard_round_trip() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ask"))
            .and(query_param("question", "hello"))
            .respond_with(ResponseTemplate::new(200).set_body_string("hi there"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let config = Config {
            base_url: mock_server.uri(),
            ..Config::default()
        };
        let service = Arc::new(HttpAnswerService::new(&config.base_url).unwrap());
        let mut app = App::new(service, &config);

        app.handle_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL));
        assert!(!app.controller.state().is_streaming_mode);

        type_text(&mut app, "hello");
        app.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
        assert!(app.status.is_thinking());
        drain(&mut app).await;

        let messages = app.controller.view().messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].text, "hello");
        assert_eq!(messages[2].text, "hi there");
        assert!(!app.status.is_thinking());
    }

    #[test]
    fn test_quit_keys() {
        let service = Arc::new(HttpAnswerService::new("http://127.0.0.1:9").unwrap());
        let mut app = App::new(service, &Config::default());
        assert!(!app.should_quit());

        app.handle_key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE));
        assert!(app.should_quit());
    }
}
