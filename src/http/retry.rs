//! Retry policy for the reqwest-backed transport.

use reqwest::StatusCode;

/// Maximum number of attempts for a single GET.
pub const MAX_RETRIES: usize = 3;

/// Delay between retry attempts in milliseconds.
pub const RETRY_DELAY_MS: u64 = 1000;

/// Server errors may succeed on retry; 4xx responses never will.
pub fn is_retryable_status(status: u16) -> bool {
    StatusCode::from_u16(status)
        .map(|s| s.is_server_error())
        .unwrap_or(false)
}
