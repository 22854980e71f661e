use crate::constants::TIME_FORMAT;
use crate::models::{Message, MessageHandle, MessageKind, Sender};
use chrono::Local;
use log::debug;

/// Where the controller puts messages.
///
/// Operations on a handle that is no longer in the list are ignored.
pub trait MessageListView {
    /// Appends a finished message, timestamp included.
    fn append_message(&mut self, sender: Sender, text: &str) -> MessageHandle;

    /// Appends an empty message that grows through `append_chunk` and gets its
    /// timestamp from `finalize`.
    fn begin_message(&mut self, sender: Sender) -> MessageHandle;

    fn append_placeholder(&mut self) -> MessageHandle;

    fn append_chunk(&mut self, handle: MessageHandle, text: &str);

    /// Attaches the timestamp. A second call leaves the first timestamp alone.
    fn finalize(&mut self, handle: MessageHandle);

    /// Replaces the timestamp with the current time.
    fn restamp(&mut self, handle: MessageHandle);

    fn remove(&mut self, handle: MessageHandle);

    fn clear_all_except(&mut self, keep: MessageHandle);

    fn scroll_to_bottom(&mut self) {}

    fn focus_input(&mut self) {}
}

pub type Clock = Box<dyn Fn() -> String + Send>;

pub fn current_time() -> String {
    Local::now().format(TIME_FORMAT).to_string()
}

/// In-memory message list backing the terminal chat screen.
pub struct MessageList {
    messages: Vec<Message>,
    next_handle: u64,
    clock: Clock,
    /// Lines scrolled back from the bottom; 0 follows new content.
    scroll_back: u16,
}

impl Default for MessageList {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageList {
    pub fn new() -> Self {
        Self::with_clock(Box::new(current_time))
    }

    pub fn with_clock(clock: Clock) -> Self {
        Self {
            messages: Vec::new(),
            next_handle: 0,
            clock,
            scroll_back: 0,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn get(&self, handle: MessageHandle) -> Option<&Message> {
        self.messages.iter().find(|m| m.handle == handle)
    }

    pub fn has_placeholder(&self) -> bool {
        self.messages.iter().any(Message::is_placeholder)
    }

    pub fn scroll_back(&self) -> u16 {
        self.scroll_back
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll_back = self.scroll_back.saturating_add(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll_back = self.scroll_back.saturating_sub(lines);
    }

    /// Caps the scroll-back at what the rendered content allows.
    pub fn clamp_scroll(&mut self, max: u16) {
        self.scroll_back = self.scroll_back.min(max);
    }

    fn push(
        &mut self,
        sender: Sender,
        kind: MessageKind,
        text: String,
        timestamp: Option<String>,
    ) -> MessageHandle {
        let handle = MessageHandle(self.next_handle);
        self.next_handle += 1;
        self.messages.push(Message {
            handle,
            sender,
            kind,
            text,
            timestamp,
        });
        handle
    }

    fn get_mut(&mut self, handle: MessageHandle) -> Option<&mut Message> {
        let found = self.messages.iter_mut().find(|m| m.handle == handle);
        if found.is_none() {
            debug!("message {:?} is gone, ignoring update", handle);
        }
        found
    }
}

impl MessageListView for MessageList {
    fn append_message(&mut self, sender: Sender, text: &str) -> MessageHandle {
        let timestamp = Some((self.clock)());
        self.push(sender, MessageKind::Text, text.to_string(), timestamp)
    }

    fn begin_message(&mut self, sender: Sender) -> MessageHandle {
        self.push(sender, MessageKind::Text, String::new(), None)
    }

    fn append_placeholder(&mut self) -> MessageHandle {
        self.push(Sender::Bot, MessageKind::Placeholder, String::new(), None)
    }

    fn append_chunk(&mut self, handle: MessageHandle, text: &str) {
        if let Some(message) = self.get_mut(handle) {
            message.text.push_str(text);
        }
    }

    fn finalize(&mut self, handle: MessageHandle) {
        let now = (self.clock)();
        if let Some(message) = self.get_mut(handle) {
            if message.timestamp.is_none() {
                message.timestamp = Some(now);
            }
        }
    }

    fn restamp(&mut self, handle: MessageHandle) {
        let now = (self.clock)();
        if let Some(message) = self.get_mut(handle) {
            message.timestamp = Some(now);
        }
    }

    fn remove(&mut self, handle: MessageHandle) {
        self.messages.retain(|m| m.handle != handle);
    }

    fn clear_all_except(&mut self, keep: MessageHandle) {
        self.messages.retain(|m| m.handle == keep);
        self.scroll_back = 0;
    }

    fn scroll_to_bottom(&mut self) {
        self.scroll_back = 0;
    }
}
