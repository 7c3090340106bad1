//! # guest-clipboard
//!
//! Clipboard mediation between a remote guest session and the local host
//! clipboard.
//!
//! The crate sits between two external parties it does not implement:
//! - the remote-session protocol engine, seen through [`clipboard::GuestSession`]
//! - the local OS clipboard, seen through [`clipboard::HostClipboard`]
//!
//! # Architecture
//!
//! ```text
//! guest-clipboard
//!   ├─> ClipboardController (ownership, session callbacks, public operations)
//!   │     ├─> SyncManager (None / GuestOwns / HostOwns)
//!   │     ├─> line_ending (LF ↔ CRLF)
//!   │     └─> policy (512 KiB limit)
//!   ├─> HostClipboardBridge (platform render requests)
//!   │     └─> Mailbox (timed handoff from the event loop)
//!   └─> EventLoop (every outgoing session call runs here)
//! ```
//!
//! # Data Flow
//!
//! **Host → Guest:** host copy → grab → guest request → read host text → transcode → notify
//!
//! **Guest → Host:** guest grab → local paste → request → guest data → transcode → Mailbox → host

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Clipboard ownership, transfer and host bridging
pub mod clipboard;

/// Configuration loading and validation
pub mod config;

/// Logging setup
pub mod logging;

/// In-process guest agent for simulation
pub mod simulate;
