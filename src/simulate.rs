//! Loopback session
//!
//! A guest agent played in-process, for the `simulate` command and for
//! exercising the controller without a remote session. Requests from the
//! controller arrive on the event-loop thread and are answered there
//! synchronously.

use anyhow::{Context, Result};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::{Arc, Weak};
use tracing::{debug, info};

use crate::clipboard::{
    AgentCapability, ClipboardController, ClipboardType, GuestSession,
    HostClipboardBridge, LineEnding, MemoryClipboard, PlatformEvent, Selection, ThreadEventLoop,
};
use crate::config::ClipboardConfig;

/// In-process guest agent
#[derive(Debug)]
pub struct LoopbackGuest {
    line_ending: LineEnding,
    clipboard: Mutex<Option<String>>,
    received: Mutex<Option<Vec<u8>>>,
    host_grabbed: Mutex<bool>,
    controller: Mutex<Weak<ClipboardController>>,
}

impl LoopbackGuest {
    /// Guest using `line_ending` for its own text
    pub fn new(line_ending: LineEnding) -> Self {
        Self {
            line_ending,
            clipboard: Mutex::new(None),
            received: Mutex::new(None),
            host_grabbed: Mutex::new(false),
            controller: Mutex::new(Weak::new()),
        }
    }

    /// Route guest answers to `controller`
    pub fn attach(&self, controller: &Arc<ClipboardController>) {
        *self.controller.lock() = Arc::downgrade(controller);
    }

    /// A guest application copies `text` and the agent grabs
    pub fn copy(&self, text: impl Into<String>) -> bool {
        *self.clipboard.lock() = Some(text.into());
        let controller = self.controller.lock().upgrade();
        match controller {
            Some(controller) => {
                controller.on_guest_grab(Selection::Clipboard, &[ClipboardType::Utf8Text])
            }
            None => false,
        }
    }

    /// A guest application pastes; returns what the host sent
    pub fn paste(&self) -> Option<Vec<u8>> {
        let controller = self.controller.lock().upgrade()?;
        if !controller.on_guest_requests_data(Selection::Clipboard, ClipboardType::Utf8Text) {
            return None;
        }
        self.received.lock().take()
    }

    /// Whether the host currently holds the guest clipboard
    pub fn host_grabbed(&self) -> bool {
        *self.host_grabbed.lock()
    }
}

impl GuestSession for LoopbackGuest {
    fn grab(&self, selection: Selection, types: &[ClipboardType]) -> crate::clipboard::Result<()> {
        debug!("Loopback guest: host grabbed {:?} with {:?}", selection, types);
        *self.host_grabbed.lock() = true;
        Ok(())
    }

    fn release(&self, selection: Selection) -> crate::clipboard::Result<()> {
        debug!("Loopback guest: host released {:?}", selection);
        *self.host_grabbed.lock() = false;
        Ok(())
    }

    fn request_data(
        &self,
        selection: Selection,
        clipboard_type: ClipboardType,
    ) -> crate::clipboard::Result<()> {
        let Some(controller) = self.controller.lock().upgrade() else {
            return Err(crate::clipboard::ClipboardError::Session(
                "loopback guest detached".to_string(),
            ));
        };

        let text = self.clipboard.lock().clone();
        match text {
            Some(text) => {
                let mut data = text.into_bytes();
                data.push(0);
                controller.on_guest_data_received(selection, clipboard_type, &data);
            }
            None => controller.on_guest_data_received(selection, ClipboardType::None, &[]),
        }
        Ok(())
    }

    fn notify_data(
        &self,
        _selection: Selection,
        _clipboard_type: ClipboardType,
        data: &[u8],
    ) -> crate::clipboard::Result<()> {
        *self.received.lock() = Some(data.to_vec());
        Ok(())
    }

    fn test_agent_capability(&self, capability: AgentCapability) -> bool {
        match capability {
            AgentCapability::GuestLineEndCrlf => self.line_ending == LineEnding::Crlf,
            AgentCapability::GuestLineEndLf => self.line_ending == LineEnding::Lf,
        }
    }
}

/// Outcome of one simulated copy/paste cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulationReport {
    /// Text the guest pasted after the host copied
    pub guest_received: Option<String>,
    /// Text the host clipboard held after the guest copied and the host pasted
    pub host_rendered: Option<String>,
    /// Owner at the end of the cycle
    pub final_owner: String,
}

/// Run host→guest then guest→host through a real event loop and bridge
pub fn run_simulation(
    config: &ClipboardConfig,
    host_line_ending: LineEnding,
    guest_line_ending: LineEnding,
    host_text: &str,
    guest_text: &str,
) -> Result<SimulationReport> {
    let event_loop =
        Arc::new(ThreadEventLoop::spawn("clipboard-loop").context("Failed to start event loop")?);
    let host = Arc::new(MemoryClipboard::new(host_line_ending));
    let guest = Arc::new(LoopbackGuest::new(guest_line_ending));

    let controller = Arc::new(ClipboardController::new(
        config.feature_flags(),
        guest.clone(),
        host.clone(),
        event_loop,
    ));
    guest.attach(&controller);
    controller.session_connected();

    let bridge =
        HostClipboardBridge::new(controller.clone()).with_render_timeout(config.render_timeout());

    info!("Host copies {} bytes", host_text.len());
    host.set_text(host_text);
    controller.grab_guest_clipboard().context("Host grab failed")?;
    let guest_received = guest
        .paste()
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned());

    info!("Guest copies {} bytes", guest_text.len());
    guest.copy(guest_text);
    let render = bridge.handle_event(PlatformEvent::RenderRequested(ClipboardType::Utf8Text));
    let host_rendered = match render {
        Ok(()) => host.text(),
        Err(e) => {
            info!("Host paste produced nothing: {}", e);
            None
        }
    };

    let final_owner = controller.owner();
    controller.shutdown();

    Ok(SimulationReport {
        guest_received,
        host_rendered,
        final_owner: final_owner.to_string(),
    })
}
