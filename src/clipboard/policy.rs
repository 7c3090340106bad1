//! Payload size policy.

use tracing::{debug, warn};

use crate::clipboard::error::{ClipboardError, Result};

/// Largest payload exchanged in either direction
pub const MAX_CLIPBOARD_BYTES: usize = 512 * 1024;

/// Check a payload length against the size policy.
///
/// Empty payloads and payloads above [`MAX_CLIPBOARD_BYTES`] are dropped
/// whole, never truncated.
pub fn check_size(len: usize) -> Result<()> {
    if len == 0 {
        debug!("Discarding empty clipboard (max: {})", MAX_CLIPBOARD_BYTES);
        return Err(ClipboardError::EmptyPayload);
    }
    if len > MAX_CLIPBOARD_BYTES {
        warn!(
            "Discarded clipboard of size {} (max: {})",
            len, MAX_CLIPBOARD_BYTES
        );
        return Err(ClipboardError::DataSizeExceeded(len, MAX_CLIPBOARD_BYTES));
    }
    Ok(())
}

/// Whether a payload of `len` bytes may be transferred
pub fn is_acceptable(len: usize) -> bool {
    check_size(len).is_ok()
}
