/// Base address used when no configuration overrides it.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Path of the filter endpoint, relative to the base address.
pub const FILTER_PATH: &str = "/api/filter";

/// Path of the chat endpoint, relative to the base address.
pub const CHAT_PATH: &str = "/chat";

/// Path of the welcome endpoint used for reachability checks.
pub const WELCOME_PATH: &str = "/";

/// Caller identity sent with every chat message unless configured otherwise.
pub const DEFAULT_CHAT_USER_ID: &str = "default";

/// Shown when the backend reports failure without a message.
pub const FILTER_LOGICAL_FALLBACK: &str = "An error occurred";

/// Shown when the filter request itself fails and the backend sent no message.
pub const FILTER_TRANSPORT_FALLBACK: &str = "Failed to fetch data";

/// Bot message appended when a chat exchange fails for any reason.
pub const CHAT_FAILURE_TEXT: &str = "Error: failed to get response";
