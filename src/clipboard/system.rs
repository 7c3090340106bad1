//! OS clipboard through arboard
//!
//! Opens a fresh handle per call; arboard handles are not shareable across
//! threads on every platform.

use tracing::debug;

use crate::clipboard::error::{ClipboardError, Result};
use crate::clipboard::formats::LineEnding;
use crate::clipboard::host::HostClipboard;

/// [`HostClipboard`] backed by the desktop clipboard
#[derive(Debug, Default)]
pub struct SystemClipboard;

impl SystemClipboard {
    /// Check the clipboard can be opened
    pub fn new() -> Result<Self> {
        open()?;
        Ok(Self)
    }
}

fn open() -> Result<arboard::Clipboard> {
    arboard::Clipboard::new()
        .map_err(|e| ClipboardError::Platform(format!("cannot open clipboard: {}", e)))
}

impl HostClipboard for SystemClipboard {
    fn read_text(&self) -> Result<Option<String>> {
        match open()?.get_text() {
            Ok(text) => Ok(Some(text)),
            Err(arboard::Error::ContentNotAvailable) => {
                debug!("System clipboard holds no text");
                Ok(None)
            }
            Err(e) => Err(ClipboardError::Platform(e.to_string())),
        }
    }

    fn write_text(&self, text: &str) -> Result<()> {
        open()?
            .set_text(text.to_owned())
            .map_err(|e| ClipboardError::Platform(e.to_string()))
    }

    fn line_ending(&self) -> LineEnding {
        LineEnding::native()
    }
}
