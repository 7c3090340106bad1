//! Clipboard Format Types
//!
//! Wire identifiers shared with the guest agent protocol (selections,
//! clipboard types, agent capabilities) and the owned payload type that
//! moves between threads.

use bytes::Bytes;

use crate::clipboard::error::{ClipboardError, Result};

/// Clipboard namespace
///
/// Values match the agent protocol selection identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Selection {
    /// Main clipboard (the only one mediated)
    Clipboard,
    /// X11-style primary selection
    Primary,
    /// X11-style secondary selection
    Secondary,
    /// Identifier not known to this crate
    Unknown(u32),
}

impl Selection {
    /// Protocol identifier
    pub fn id(self) -> u32 {
        match self {
            Selection::Clipboard => 0,
            Selection::Primary => 1,
            Selection::Secondary => 2,
            Selection::Unknown(id) => id,
        }
    }

    /// Whether this selection is mediated
    pub fn is_supported(self) -> bool {
        self == Selection::Clipboard
    }
}

impl From<u32> for Selection {
    fn from(id: u32) -> Self {
        match id {
            0 => Selection::Clipboard,
            1 => Selection::Primary,
            2 => Selection::Secondary,
            other => Selection::Unknown(other),
        }
    }
}

/// Clipboard content type announced or delivered by the agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClipboardType {
    /// No data (reply to a request the guest could not satisfy)
    None,
    /// UTF-8 text
    Utf8Text,
    /// PNG image
    ImagePng,
    /// BMP image
    ImageBmp,
    /// TIFF image
    ImageTiff,
    /// JPEG image
    ImageJpg,
    /// Identifier not known to this crate
    Unknown(u32),
}

impl ClipboardType {
    /// Protocol identifier
    pub fn id(self) -> u32 {
        match self {
            ClipboardType::None => 0,
            ClipboardType::Utf8Text => 1,
            ClipboardType::ImagePng => 2,
            ClipboardType::ImageBmp => 3,
            ClipboardType::ImageTiff => 4,
            ClipboardType::ImageJpg => 5,
            ClipboardType::Unknown(id) => id,
        }
    }
}

impl From<u32> for ClipboardType {
    fn from(id: u32) -> Self {
        match id {
            0 => ClipboardType::None,
            1 => ClipboardType::Utf8Text,
            2 => ClipboardType::ImagePng,
            3 => ClipboardType::ImageBmp,
            4 => ClipboardType::ImageTiff,
            5 => ClipboardType::ImageJpg,
            other => ClipboardType::Unknown(other),
        }
    }
}

/// Types advertised when the host grabs the guest clipboard
pub const ADVERTISED_TYPES: &[ClipboardType] = &[ClipboardType::Utf8Text];

/// Agent capability bits queried through the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentCapability {
    /// Guest agent uses LF line endings
    GuestLineEndLf,
    /// Guest agent uses CRLF line endings
    GuestLineEndCrlf,
}

impl AgentCapability {
    /// Protocol capability bit
    pub fn bit(self) -> u32 {
        match self {
            AgentCapability::GuestLineEndLf => 8,
            AgentCapability::GuestLineEndCrlf => 9,
        }
    }
}

/// Text line-ending convention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LineEnding {
    /// `\n`
    Lf,
    /// `\r\n`
    #[default]
    Crlf,
}

impl LineEnding {
    /// Convention of the current build target's native clipboard
    pub fn native() -> Self {
        if cfg!(windows) {
            LineEnding::Crlf
        } else {
            LineEnding::Lf
        }
    }
}

/// Payload format tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadFormat {
    /// UTF-8 text
    Text,
}

impl PayloadFormat {
    /// Agent clipboard type carrying this format
    pub fn clipboard_type(self) -> ClipboardType {
        match self {
            PayloadFormat::Text => ClipboardType::Utf8Text,
        }
    }
}

/// Owned clipboard payload
///
/// The buffer always carries a NUL byte past the logical length so it can be
/// handed to C-string consumers unchanged. Payloads are moved, never cloned.
#[derive(PartialEq, Eq)]
pub struct ClipboardPayload {
    data: Bytes,
    len: usize,
    format: PayloadFormat,
}

impl ClipboardPayload {
    /// Build a text payload from bytes without a terminator
    pub fn text(bytes: impl Into<Vec<u8>>) -> Self {
        let mut buf = bytes.into();
        let len = buf.len();
        buf.push(0);
        Self {
            data: Bytes::from(buf),
            len,
            format: PayloadFormat::Text,
        }
    }

    /// Wrap a buffer whose last byte is already the NUL terminator
    pub(crate) fn from_nul_terminated(buf: Vec<u8>) -> Self {
        debug_assert_eq!(buf.last(), Some(&0));
        let len = buf.len().saturating_sub(1);
        Self {
            data: Bytes::from(buf),
            len,
            format: PayloadFormat::Text,
        }
    }

    /// Logical length in bytes (terminator excluded)
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the logical content is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Format tag
    pub fn format(&self) -> PayloadFormat {
        self.format
    }

    /// Logical content
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Content including the NUL terminator
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        &self.data[..]
    }

    /// Content as UTF-8 text
    pub fn as_str(&self) -> Result<&str> {
        std::str::from_utf8(self.as_bytes()).map_err(|_| ClipboardError::InvalidUtf8)
    }

    /// Consume into an owned string
    pub fn into_string(self) -> Result<String> {
        self.as_str().map(str::to_owned)
    }
}

impl std::fmt::Debug for ClipboardPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ClipboardPayload({:?}, {} bytes)", self.format, self.len)
    }
}
