//! Process exit codes, kept stable for scripting.

pub const SUCCESS: u8 = 0;
pub const GENERAL_ERROR: u8 = 1;
/// Security key missing, malformed, or wrong.
pub const KEY_INVALID: u8 = 2;
/// Destination or descriptor file not found.
pub const NOT_FOUND: u8 = 4;
/// Interrupted (mirrors 128 + SIGINT).
pub const CANCELLED: u8 = 130;
