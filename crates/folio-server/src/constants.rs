use std::time::Duration;

// --- Pagination ---

/// Default page size for portfolio and project listings.
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

/// Maximum page size for portfolio and project listings.
pub const MAX_PAGE_LIMIT: u32 = 50;

// --- Validation limits ---

/// Maximum decoded size of an uploaded image.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Required MIME prefix for uploaded images.
pub const IMAGE_MIME_PREFIX: &str = "image/";

/// Maximum allowed length of a comment (in characters).
pub const MAX_COMMENT_LENGTH: usize = 2000;

/// Maximum allowed length of a contact message (in characters).
pub const MAX_CONTACT_MESSAGE_LENGTH: usize = 5000;

/// Maximum allowed length of a chat message (in characters).
pub const MAX_CHAT_MESSAGE_LENGTH: usize = 2000;

// --- Chat ---

/// Number of prior conversation turns forwarded upstream.
pub const CHAT_HISTORY_TURNS: usize = 10;

/// Upper bound on one chat-completion round trip
pub const CHAT_TIMEOUT: Duration = Duration::from_secs(30);

/// Reply sent when the chat upstream is unavailable.
pub const CHAT_APOLOGY: &str =
    "Sorry, I'm having trouble responding right now. Please try again later.";

/// Assistant persona sent as the system turn.
pub const CHAT_SYSTEM_PROMPT: &str = "You are the assistant on a personal portfolio website. \
Answer questions about the site owner's projects, writing and experience concisely and politely. \
If you do not know something, say so and suggest using the contact form.";

// --- Server defaults ---

/// Default request body limit; image uploads arrive as Base64 JSON.
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// Default lifetime of an issued bearer token (24 hours).
pub const DEFAULT_JWT_EXPIRATION_SECS: i64 = 24 * 60 * 60;
