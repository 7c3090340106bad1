//! Host Clipboard Bridge
//!
//! Connects the local OS clipboard to the controller. The platform side
//! delivers [`PlatformEvent`]s on its own thread; the bridge answers them,
//! blocking that thread while the guest produces data for a render.
//!
//! # Render Flow
//!
//! ```text
//! Platform thread (render request)
//!   ├─> begin_render()           guest must own the clipboard, stale slot dropped
//!   ├─> schedule_guest_request() session.request_data() runs on the event loop
//!   ├─> wait_guest_delivery()    blocks up to the render deadline
//!   └─> write_text()             converted text goes to the local clipboard
//! ```
//!
//! The platform thread never calls the session directly; a foreign local
//! copy schedules its grab through the controller as well.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::clipboard::error::{ClipboardError, Result};
use crate::clipboard::formats::{ClipboardType, LineEnding};
use crate::clipboard::mailbox::DEFAULT_RENDER_TIMEOUT;
use crate::clipboard::manager::{ClipboardController, GuestDelivery};

/// Local OS clipboard
pub trait HostClipboard: Send + Sync {
    /// Current text content, `None` when the clipboard holds no text
    fn read_text(&self) -> Result<Option<String>>;

    /// Replace the clipboard content with `text`
    fn write_text(&self, text: &str) -> Result<()>;

    /// Promise text for delayed rendering after the guest grabbed.
    ///
    /// Platforms without delayed rendering leave this as a no-op.
    fn offer_guest_text(&self) -> Result<()> {
        Ok(())
    }

    /// Line-ending convention of text on this clipboard
    fn line_ending(&self) -> LineEnding {
        LineEnding::Crlf
    }
}

/// In-process clipboard, used by `simulate` and tests
#[derive(Debug)]
pub struct MemoryClipboard {
    text: Mutex<Option<String>>,
    offered: Mutex<bool>,
    line_ending: LineEnding,
}

impl MemoryClipboard {
    /// Empty clipboard using `line_ending`
    pub fn new(line_ending: LineEnding) -> Self {
        Self {
            text: Mutex::new(None),
            offered: Mutex::new(false),
            line_ending,
        }
    }

    /// Clipboard already holding `text`
    pub fn with_text(line_ending: LineEnding, text: impl Into<String>) -> Self {
        let clipboard = Self::new(line_ending);
        clipboard.set_text(text);
        clipboard
    }

    /// A local application copies `text`
    pub fn set_text(&self, text: impl Into<String>) {
        *self.text.lock() = Some(text.into());
        *self.offered.lock() = false;
    }

    /// Empty the clipboard
    pub fn clear(&self) {
        *self.text.lock() = None;
    }

    /// Current text
    pub fn text(&self) -> Option<String> {
        self.text.lock().clone()
    }

    /// Whether guest text is promised and not yet rendered
    pub fn is_offered(&self) -> bool {
        *self.offered.lock()
    }
}

impl HostClipboard for MemoryClipboard {
    fn read_text(&self) -> Result<Option<String>> {
        Ok(self.text())
    }

    fn write_text(&self, text: &str) -> Result<()> {
        *self.text.lock() = Some(text.to_string());
        *self.offered.lock() = false;
        Ok(())
    }

    fn offer_guest_text(&self) -> Result<()> {
        *self.text.lock() = None;
        *self.offered.lock() = true;
        Ok(())
    }

    fn line_ending(&self) -> LineEnding {
        self.line_ending
    }
}

/// Notifications from the local clipboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformEvent {
    /// A local application pastes a promised format
    RenderRequested(ClipboardType),
    /// The platform wants every promised format rendered now
    RenderAllRequested,
    /// Local clipboard content changed
    LocalOwnershipChanged {
        /// The change came from this process
        by_self: bool,
    },
}

/// Platform-side endpoint of the controller
pub struct HostClipboardBridge {
    controller: Arc<ClipboardController>,
    render_timeout: Duration,
}

impl HostClipboardBridge {
    /// Bridge with the default ten second render deadline
    pub fn new(controller: Arc<ClipboardController>) -> Self {
        Self {
            controller,
            render_timeout: DEFAULT_RENDER_TIMEOUT,
        }
    }

    /// Override the render deadline
    pub fn with_render_timeout(mut self, render_timeout: Duration) -> Self {
        self.render_timeout = render_timeout;
        self
    }

    /// Render deadline in effect
    pub fn render_timeout(&self) -> Duration {
        self.render_timeout
    }

    /// Controller behind this bridge
    pub fn controller(&self) -> &Arc<ClipboardController> {
        &self.controller
    }

    /// Dispatch one platform event. Runs on the platform thread.
    pub fn handle_event(&self, event: PlatformEvent) -> Result<()> {
        debug!("Platform clipboard event: {:?}", event);
        match event {
            PlatformEvent::RenderRequested(ClipboardType::Utf8Text) => self.render_text(),
            PlatformEvent::RenderRequested(other) => {
                warn!("Render of {:?} requested, only text is offered", other);
                Err(ClipboardError::UnsupportedType(other))
            }
            PlatformEvent::RenderAllRequested => self.render_text(),
            PlatformEvent::LocalOwnershipChanged { by_self: true } => {
                debug!("Local clipboard change is our own, ignoring");
                Ok(())
            }
            PlatformEvent::LocalOwnershipChanged { by_self: false } => {
                self.controller.local_ownership_changed().map(|_| ())
            }
        }
    }

    /// Fetch guest text and place it on the host clipboard.
    ///
    /// Blocks the calling thread up to the render deadline. On timeout the
    /// render is abandoned and the host clipboard left untouched.
    pub fn render_text(&self) -> Result<()> {
        self.controller.begin_render()?;
        self.controller.schedule_guest_request()?;

        match self.controller.wait_guest_delivery(self.render_timeout) {
            Some(GuestDelivery::Text(payload)) => {
                let text = payload.as_str()?;
                self.controller.host().write_text(text)?;
                info!("Rendered {} bytes of guest clipboard", payload.len());
                Ok(())
            }
            Some(GuestDelivery::NoData) => {
                debug!("Guest delivered no clipboard data");
                Ok(())
            }
            None => {
                let ms = timeout_millis(self.render_timeout);
                warn!("Timed out after {}ms waiting for guest clipboard", ms);
                Err(ClipboardError::TransferTimeout(ms))
            }
        }
    }
}

/// Whole milliseconds in `timeout`, saturating at `u64::MAX`
fn timeout_millis(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)
}
