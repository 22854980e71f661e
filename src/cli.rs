// src/cli.rs

use crate::{
    api::AnswerService,
    config::Config,
    controller::{ChatController, ChatEvent, Phase},
    plain_view::PlainView,
};
use std::{io::Write, sync::Arc};
use tokio::sync::mpsc;

/// Command line: `askchat [--stream | --no-stream] [question...]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub streaming: Option<bool>,
    /// Asked once without the terminal UI when present.
    pub question: Option<String>,
}

impl CliArgs {
    pub fn parse<I: IntoIterator<Item = String>>(args: I) -> Self {
        let mut streaming = None;
        let mut words = Vec::new();

        for arg in args {
            match arg.as_str() {
                "--stream" => streaming = Some(true),
                "--no-stream" => streaming = Some(false),
                _ => words.push(arg),
            }
        }

        let question = Some(words.join(" ")).filter(|q| !q.trim().is_empty());
        Self { streaming, question }
    }
}

/// Runs a single submission through the controller and prints the transcript.
/// Returns whether the answer arrived.
pub async fn run_once<S: AnswerService, W: Write>(
    service: Arc<S>,
    config: &Config,
    question: &str,
    out: W,
) -> bool {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut controller = ChatController::new(
        service,
        PlainView::new(out),
        &config.welcome_message,
        config.streaming,
        tx,
    );

    controller.dispatch(ChatEvent::InputChanged(question.to_string()));
    controller.dispatch(ChatEvent::SubmitRequested);
    controller.settle(&mut rx).await;

    controller.last_outcome() == Some(Phase::Done)
}
