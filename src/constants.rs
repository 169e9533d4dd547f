/// Application-wide constants
/// All magic numbers and constant values should be defined here

/// Cooldown after starting a new thread (10 minutes)
pub const NEW_THREAD_COOLDOWN_MS: u64 = 600_000;

/// Cooldown after replying to a thread (60 seconds)
pub const REPLY_COOLDOWN_MS: u64 = 60_000;

/// Prefix for persisted cooldown record keys
pub const STORAGE_KEY_PREFIX: &str = "postform_last_";

/// Countdown re-poll interval in milliseconds
pub const COUNTDOWN_TICK_MS: u64 = 1_000;

/// Maximum comment length in characters
pub const MAX_CONTENT_LEN: usize = 280;

/// Maximum author name length
pub const MAX_AUTHOR_LEN: usize = 12;

/// Maximum tripcode password length
pub const MAX_TRIPCODE_PASSWORD_LEN: usize = 12;

/// Maximum subject length (new threads only)
pub const MAX_SUBJECT_LEN: usize = 50;

/// Maximum image attachment size in bytes (5 MB)
pub const MAX_IMAGE_SIZE: usize = 5 * 1024 * 1024;
