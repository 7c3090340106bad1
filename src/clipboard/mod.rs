//! Clipboard Mediation Module
//!
//! Shares plain text between a remote guest session and the local host
//! clipboard, one direction at a time, with ownership negotiated over the
//! session's agent channel.
//!
//! # Architecture
//!
//! - [`SyncManager`] - Ownership state machine (`None` / guest / host)
//! - [`ClipboardController`] - Public operations and session callbacks
//! - [`HostClipboardBridge`] - Answers local render requests on the platform thread
//! - [`Mailbox`] - Timed single-slot handoff from event loop to platform thread
//! - [`line_ending`] - LF ↔ CRLF transcoding
//! - [`policy`] - Payload size limit
//!
//! # Data Flow
//!
//! ```text
//! Guest agent            Session                Controller                Host clipboard
//! ━━━━━━━━━━━            ━━━━━━━                ━━━━━━━━━━                ━━━━━━━━━━━━━━
//!
//! Copy in guest
//!   └─> grab ─────────> on_guest_grab ───────> GuestOwns ──────────────> promise text
//!
//! Paste on host <──── write_text <── Mailbox <── on_guest_data_received <── data
//!
//! Copy on host ──────────────────────────────> grab_guest_clipboard ────> session.grab
//! Paste in guest ───> on_guest_requests_data ─> read_text ─> transcode ─> session.notify_data
//! ```
//!
//! # Features
//!
//! - **Per-direction switches**: host→guest and guest→host enabled separately
//! - **Line endings**: converted between host and guest conventions
//! - **Size limit**: payloads over 512 KiB are refused
//! - **Bounded renders**: a local paste waits at most the render deadline

pub mod error;
pub mod formats;
pub mod host;
pub mod line_ending;
pub mod mailbox;
pub mod manager;
pub mod policy;
pub mod session;
pub mod sync;

#[cfg(feature = "system-clipboard")]
pub mod system;

pub use error::{classify_error, ClipboardError, ErrorType, Result};
pub use formats::{
    AgentCapability, ClipboardPayload, ClipboardType, LineEnding, PayloadFormat, Selection,
    ADVERTISED_TYPES,
};
pub use host::{HostClipboard, HostClipboardBridge, MemoryClipboard, PlatformEvent};
pub use mailbox::{Mailbox, DEFAULT_RENDER_TIMEOUT};
pub use manager::{ClipboardController, GuestDelivery};
pub use policy::MAX_CLIPBOARD_BYTES;
pub use session::{EventLoop, GuestCapabilities, GuestSession, Job, ThreadEventLoop};
pub use sync::{ClipboardOwner, FeatureFlags, SyncManager};

#[cfg(feature = "system-clipboard")]
pub use system::SystemClipboard;
