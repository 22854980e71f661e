use crate::constants::{BOT_AVATAR, USER_AVATAR};
use crate::message_list::{current_time, MessageListView};
use crate::models::{MessageHandle, Sender};
use log::warn;
use std::io::Write;

/// Prints the conversation as a plain transcript, streaming text as it
/// arrives. Used when the client runs a single question without the terminal
/// UI.
pub struct PlainView<W: Write> {
    out: W,
    next_handle: u64,
    /// The message currently being written, if its line is still open.
    open: Option<MessageHandle>,
}

impl<W: Write> PlainView<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            next_handle: 0,
            open: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn next(&mut self) -> MessageHandle {
        let handle = MessageHandle(self.next_handle);
        self.next_handle += 1;
        handle
    }

    fn write(&mut self, text: &str) {
        let result = self
            .out
            .write_all(text.as_bytes())
            .and_then(|_| self.out.flush());
        if let Err(e) = result {
            warn!("Failed to write transcript: {}", e);
        }
    }

    fn close_open_line(&mut self) {
        if self.open.take().is_some() {
            self.write("\n");
        }
    }
}

fn avatar(sender: Sender) -> &'static str {
    match sender {
        Sender::User => USER_AVATAR,
        Sender::Bot => BOT_AVATAR,
    }
}

impl<W: Write> MessageListView for PlainView<W> {
    fn append_message(&mut self, sender: Sender, text: &str) -> MessageHandle {
        let handle = self.begin_message(sender);
        self.append_chunk(handle, text);
        self.finalize(handle);
        handle
    }

    fn begin_message(&mut self, sender: Sender) -> MessageHandle {
        self.close_open_line();
        let handle = self.next();
        self.write(&format!("{} ", avatar(sender)));
        self.open = Some(handle);
        handle
    }

    fn append_placeholder(&mut self) -> MessageHandle {
        self.next()
    }

    fn append_chunk(&mut self, handle: MessageHandle, text: &str) {
        if self.open == Some(handle) {
            self.write(text);
        }
    }

    fn finalize(&mut self, handle: MessageHandle) {
        if self.open == Some(handle) {
            self.open = None;
            self.write(&format!("  [{}]\n", current_time()));
        }
    }

    fn restamp(&mut self, _handle: MessageHandle) {}

    fn remove(&mut self, handle: MessageHandle) {
        if self.open == Some(handle) {
            self.close_open_line();
        }
    }

    fn clear_all_except(&mut self, _keep: MessageHandle) {
        self.close_open_line();
        self.write("--- cleared ---\n");
    }
}
