// Answer service endpoints
pub const ASK_PATH: &str = "/ask";
pub const ASK_STREAM_PATH: &str = "/ask-stream";
pub const QUESTION_PARAM: &str = "question";

// Defaults
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_WELCOME_MESSAGE: &str = "Hello! I'm your AI assistant. Ask me anything.";
pub const DEFAULT_LOG_FILE: &str = "askchat.log";
pub const DEFAULT_LOG_LEVEL: &str = "info";

// User-facing text
pub const APOLOGY_MESSAGE: &str = "Sorry, an error occurred. Please try again.";

/// Local wall-clock format attached to every finished message.
pub const TIME_FORMAT: &str = "%H:%M";

// UI
pub const USER_AVATAR: &str = "👤";
pub const BOT_AVATAR: &str = "🤖";
pub const TYPING_FRAMES: [&str; 3] = ["●○○", "○●○", "○○●"];
