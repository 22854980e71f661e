//! Chat session controller.
//!
//! The controller owns the input state and talks to an [`AnswerService`] and a
//! [`MessageListView`]. Requests run on their own tokio task and report back
//! through [`AnswerEvent`]s, which the UI task feeds into
//! [`ChatController::apply`]. All state changes therefore happen on the UI
//! task, and the `is_processing` flag is enough to keep a single request in
//! flight.

use crate::{
    api::AnswerService,
    constants::APOLOGY_MESSAGE,
    decoder::Utf8StreamDecoder,
    errors::AskchatError,
    message_list::MessageListView,
    models::{ConnectionStatus, MessageHandle, Sender, SessionState},
};
use futures::StreamExt;
use log::{debug, error, warn};
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

/// User-side events routed to the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    InputChanged(String),
    SubmitRequested,
    StreamingToggled(bool),
    ResetRequested,
}

/// Progress of the in-flight request, produced by the request task.
#[derive(Debug)]
pub enum AnswerEvent {
    /// Full answer from the buffered path.
    Answer(String),
    /// The streamed response is open; chunks follow.
    StreamOpened,
    Chunk(Vec<u8>),
    StreamEnded,
    Failed(AskchatError),
}

/// Where a submission is. `Done` and `Failed` only last until the controller
/// has cleaned up, after which it is back to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Sending,
    Buffered,
    Streaming,
    Done,
    Failed,
}

struct StreamingReply {
    handle: MessageHandle,
    decoder: Utf8StreamDecoder,
    received_text: bool,
}

pub struct ChatController<S, V> {
    service: Arc<S>,
    view: V,
    state: SessionState,
    phase: Phase,
    last_outcome: Option<Phase>,
    connection: ConnectionStatus,
    welcome: MessageHandle,
    placeholder: Option<MessageHandle>,
    reply: Option<StreamingReply>,
    events: UnboundedSender<AnswerEvent>,
}

impl<S: AnswerService, V: MessageListView> ChatController<S, V> {
    /// Creates the controller and shows the welcome message.
    pub fn new(
        service: Arc<S>,
        mut view: V,
        welcome_message: &str,
        streaming: bool,
        events: UnboundedSender<AnswerEvent>,
    ) -> Self {
        let welcome = view.append_message(Sender::Bot, welcome_message);
        view.focus_input();

        Self {
            service,
            view,
            state: SessionState::new(streaming),
            phase: Phase::Idle,
            last_outcome: None,
            connection: ConnectionStatus::Online,
            welcome,
            placeholder: None,
            reply: None,
            events,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// `Done` or `Failed` for the most recent finished submission.
    pub fn last_outcome(&self) -> Option<Phase> {
        self.last_outcome
    }

    pub fn connection(&self) -> ConnectionStatus {
        self.connection
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn dispatch(&mut self, event: ChatEvent) {
        match event {
            ChatEvent::InputChanged(text) => self.state.draft_input = text,
            ChatEvent::SubmitRequested => {
                self.submit();
            }
            ChatEvent::StreamingToggled(enabled) => self.set_streaming_mode(enabled),
            ChatEvent::ResetRequested => self.reset(),
        }
    }

    /// Sends the current draft. Returns false, with no side effects, when the
    /// draft is blank or a request is already in flight.
    pub fn submit(&mut self) -> bool {
        let question = self.state.draft_input.trim().to_string();
        if question.is_empty() || self.state.is_processing {
            return false;
        }

        self.view.append_message(Sender::User, &question);
        self.state.draft_input.clear();
        self.state.is_processing = true;
        self.phase = Phase::Sending;
        self.placeholder = Some(self.view.append_placeholder());
        self.view.scroll_to_bottom();

        debug!(
            "submitting question ({} mode)",
            if self.state.is_streaming_mode { "streaming" } else { "buffered" }
        );
        self.spawn_request(question);
        true
    }

    pub fn set_streaming_mode(&mut self, enabled: bool) {
        self.state.is_streaming_mode = enabled;
    }

    /// Removes everything but the welcome message and refreshes its time.
    pub fn reset(&mut self) {
        self.view.clear_all_except(self.welcome);
        self.view.restamp(self.welcome);
    }

    fn spawn_request(&self, question: String) {
        let service = Arc::clone(&self.service);
        let events = self.events.clone();
        let streaming = self.state.is_streaming_mode;

        tokio::spawn(async move {
            if streaming {
                stream_answer(service.as_ref(), &question, &events).await;
            } else {
                fetch_answer(service.as_ref(), &question, &events).await;
            }
        });
    }

    /// Applies one event from the request task.
    pub fn apply(&mut self, event: AnswerEvent) {
        match (self.phase, event) {
            (Phase::Sending, AnswerEvent::Answer(answer)) => {
                self.phase = Phase::Buffered;
                self.connection = ConnectionStatus::Online;
                self.remove_placeholder();
                self.view.append_message(Sender::Bot, &answer);
                self.finish(Phase::Done);
            }
            (Phase::Sending, AnswerEvent::StreamOpened) => {
                self.phase = Phase::Streaming;
                self.connection = ConnectionStatus::Online;
                self.reply = Some(StreamingReply {
                    handle: self.view.begin_message(Sender::Bot),
                    decoder: Utf8StreamDecoder::new(),
                    received_text: false,
                });
                self.view.scroll_to_bottom();
            }
            (Phase::Streaming, AnswerEvent::Chunk(bytes)) => {
                if let Some(reply) = self.reply.as_mut() {
                    let text = reply.decoder.decode(&bytes);
                    if !text.is_empty() {
                        reply.received_text = true;
                        self.view.append_chunk(reply.handle, &text);
                    }
                }
                self.view.scroll_to_bottom();
            }
            (Phase::Streaming, AnswerEvent::StreamEnded) => {
                if let Some(reply) = self.reply.take() {
                    self.close_reply(reply, true);
                }
                self.finish(Phase::Done);
            }
            (Phase::Sending | Phase::Streaming, AnswerEvent::Failed(err)) => self.fail(err),
            (phase, event) => warn!("ignoring {:?} while {:?}", event, phase),
        }
    }

    /// Applies events until the in-flight request, if any, has finished.
    pub async fn settle(&mut self, events: &mut UnboundedReceiver<AnswerEvent>) {
        while self.state.is_processing {
            match events.recv().await {
                Some(event) => self.apply(event),
                None => {
                    self.apply(AnswerEvent::Failed(AskchatError::transport_error(
                        "request task went away",
                    )));
                }
            }
        }
    }

    fn fail(&mut self, err: AskchatError) {
        error!("Chat error: {}", err);
        if err.is_connectivity() {
            self.connection = ConnectionStatus::Offline;
        }

        if let Some(reply) = self.reply.take() {
            self.close_reply(reply, false);
        }
        self.view.append_message(Sender::Bot, APOLOGY_MESSAGE);
        self.finish(Phase::Failed);
    }

    /// Flushes the decoder into the streamed message and stamps it. An
    /// interrupted reply that never received any text is dropped instead.
    fn close_reply(&mut self, mut reply: StreamingReply, completed: bool) {
        let tail = reply.decoder.finish();
        if !tail.is_empty() {
            reply.received_text = true;
            self.view.append_chunk(reply.handle, &tail);
        }

        if completed || reply.received_text {
            self.view.finalize(reply.handle);
        } else {
            self.view.remove(reply.handle);
        }
    }

    fn finish(&mut self, outcome: Phase) {
        debug!("submission finished: {:?}", outcome);
        self.phase = outcome;
        self.last_outcome = Some(outcome);

        self.remove_placeholder();
        self.state.is_processing = false;
        self.view.scroll_to_bottom();
        self.view.focus_input();
        self.phase = Phase::Idle;
    }

    fn remove_placeholder(&mut self) {
        if let Some(placeholder) = self.placeholder.take() {
            self.view.remove(placeholder);
        }
    }
}

async fn fetch_answer<S: AnswerService + ?Sized>(
    service: &S,
    question: &str,
    events: &UnboundedSender<AnswerEvent>,
) {
    let event = match service.ask(question).await {
        Ok(answer) => AnswerEvent::Answer(answer),
        Err(err) => AnswerEvent::Failed(err),
    };
    // A closed channel means the UI is gone; nobody is left to tell.
    let _ = events.send(event);
}

async fn stream_answer<S: AnswerService + ?Sized>(
    service: &S,
    question: &str,
    events: &UnboundedSender<AnswerEvent>,
) {
    let mut stream = match service.ask_stream(question).await {
        Ok(stream) => stream,
        Err(err) => {
            let _ = events.send(AnswerEvent::Failed(err));
            return;
        }
    };

    if events.send(AnswerEvent::StreamOpened).is_err() {
        return;
    }

    while let Some(chunk) = stream.next().await {
        let event = match chunk {
            Ok(bytes) => AnswerEvent::Chunk(bytes),
            Err(err) => {
                let _ = events.send(AnswerEvent::Failed(err));
                return;
            }
        };
        if events.send(event).is_err() {
            return;
        }
    }

    let _ = events.send(AnswerEvent::StreamEnded);
}
