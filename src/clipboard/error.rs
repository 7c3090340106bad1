//! Clipboard Error Types
//!
//! Error handling for the clipboard mediation module. Every failure here is
//! local to one operation: callers log it and degrade to "no data", nothing
//! propagates as fatal.

use thiserror::Error;

use crate::clipboard::formats::{ClipboardType, Selection};

/// Result type for clipboard operations
pub type Result<T> = std::result::Result<T, ClipboardError>;

/// Clipboard module error types
#[derive(Error, Debug)]
pub enum ClipboardError {
    /// Feature flag for this direction is off
    #[error("Clipboard sharing {0} is disabled")]
    Disabled(&'static str),

    /// Required side does not own the clipboard
    #[error("Clipboard not owned by {expected} (current owner: {actual})")]
    NotOwner {
        /// Owner required by the operation
        expected: &'static str,
        /// Owner at the time of the call
        actual: &'static str,
    },

    /// Selection other than the main clipboard
    #[error("Unsupported selection: {0:?}")]
    UnsupportedSelection(Selection),

    /// Clipboard type other than UTF-8 text
    #[error("Unsupported clipboard type: {0:?}")]
    UnsupportedType(ClipboardType),

    /// Line-ending conversion failed
    #[error("Line-ending conversion failed: {0}")]
    Transcode(String),

    /// Text is not valid UTF-8
    #[error("Invalid UTF-8 data")]
    InvalidUtf8,

    /// Payload is empty
    #[error("Empty clipboard payload")]
    EmptyPayload,

    /// Data size exceeds limit
    #[error("Data size {0} exceeds maximum allowed {1}")]
    DataSizeExceeded(usize, usize),

    /// Mailbox wait elapsed
    #[error("Transfer timeout after {0}ms")]
    TransferTimeout(u64),

    /// Local OS clipboard open/read/write failed
    #[error("Host clipboard error: {0}")]
    Platform(String),

    /// Remote session rejected or could not carry a request
    #[error("Session error: {0}")]
    Session(String),

    /// Event loop is gone
    #[error("Event loop unavailable")]
    EventLoopClosed,
}

/// Error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorType {
    /// Feature flag off
    DisabledFeature,
    /// Wrong clipboard owner
    NotOwner,
    /// Unsupported type or selection
    Unsupported,
    /// Transcoding or encoding failure
    Transcoding,
    /// Mailbox deadline elapsed
    Timeout,
    /// Empty or oversize payload
    PayloadSize,
    /// Local OS clipboard failure
    Platform,
    /// Session or event loop failure
    Session,
}

/// Classify error for logging and status mapping
pub fn classify_error(error: &ClipboardError) -> ErrorType {
    match error {
        ClipboardError::Disabled(_) => ErrorType::DisabledFeature,

        ClipboardError::NotOwner { .. } => ErrorType::NotOwner,

        ClipboardError::UnsupportedSelection(_) | ClipboardError::UnsupportedType(_) => {
            ErrorType::Unsupported
        }

        ClipboardError::Transcode(_) | ClipboardError::InvalidUtf8 => ErrorType::Transcoding,

        ClipboardError::TransferTimeout(_) => ErrorType::Timeout,

        ClipboardError::EmptyPayload | ClipboardError::DataSizeExceeded(_, _) => {
            ErrorType::PayloadSize
        }

        ClipboardError::Platform(_) => ErrorType::Platform,

        ClipboardError::Session(_) | ClipboardError::EventLoopClosed => ErrorType::Session,
    }
}

impl ClipboardError {
    /// Returns true if the caller should treat this as "no data available"
    pub fn is_no_data(&self) -> bool {
        matches!(
            classify_error(self),
            ErrorType::Transcoding | ErrorType::Timeout | ErrorType::PayloadSize
        )
    }
}
