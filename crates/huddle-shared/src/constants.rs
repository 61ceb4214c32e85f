/// Application name
pub const APP_NAME: &str = "Huddle";

/// Maximum number of messages returned by a history query.
pub const HISTORY_PAGE_LIMIT: u32 = 50;

/// Content placed in a soft-deleted message body.
pub const TOMBSTONE_TEXT: &str = "This message has been deleted";

/// Capacity of each session's outbound event queue. A session that falls
/// this far behind starts losing events (at-most-once delivery).
pub const OUTBOUND_QUEUE_CAPACITY: usize = 256;

/// Maximum inbound WebSocket frame size in bytes (64 KiB).
pub const MAX_FRAME_SIZE: usize = 65_536;

/// Maximum length of a message or comment body in characters.
pub const MAX_CONTENT_LEN: usize = 4_096;

/// Default HTTP listen port.
pub const DEFAULT_HTTP_PORT: u16 = 8080;
