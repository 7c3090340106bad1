//! Clipboard Ownership State Machine
//!
//! Tracks which side currently owns the shared clipboard and gates every
//! other operation on it.
//!
//! ```text
//!                 grab_by_host()
//!        ┌───────────────────────────────┐
//!        │                               v
//!   ┌─────────┐  grab_by_guest()   ┌───────────┐
//!   │  None   │ ─────────────────> │ GuestOwns │
//!   └─────────┘ <───────────────── └───────────┘
//!     ^     │   release_by_guest()       │
//!     │     │ grab_by_host()             │ grab_by_host()
//!     │     v                            v
//!     │  ┌──────────┐ <──────────────────┘
//!     └──│ HostOwns │
//!        └──────────┘  release_by_host()
//! ```
//!
//! The manager holds no locks itself; [`ClipboardController`] keeps it behind
//! a single mutex together with the feature flags it checks.
//!
//! [`ClipboardController`]: crate::clipboard::ClipboardController

use tracing::debug;

use crate::clipboard::error::{ClipboardError, Result};
use crate::clipboard::formats::ClipboardType;

/// Clipboard ownership
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ClipboardOwner {
    /// Nobody holds the shared clipboard
    #[default]
    None,
    /// The remote guest holds it
    Guest,
    /// The local host holds it
    Host,
}

impl ClipboardOwner {
    /// Short name for logs and errors
    pub fn as_str(self) -> &'static str {
        match self {
            ClipboardOwner::None => "none",
            ClipboardOwner::Guest => "guest",
            ClipboardOwner::Host => "host",
        }
    }
}

impl std::fmt::Display for ClipboardOwner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-direction enable flags, fixed at initialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeatureFlags {
    /// Host clipboard may be offered to the guest
    pub to_guest_enabled: bool,
    /// Guest clipboard may be delivered to the host
    pub to_client_enabled: bool,
}

impl FeatureFlags {
    /// Both directions enabled
    pub fn bidirectional() -> Self {
        Self {
            to_guest_enabled: true,
            to_client_enabled: true,
        }
    }

    /// Fail with [`ClipboardError::Disabled`] unless host→guest is on
    pub fn require_to_guest(&self) -> Result<()> {
        if self.to_guest_enabled {
            Ok(())
        } else {
            debug!("Clipboard to guest disabled, doing nothing");
            Err(ClipboardError::Disabled("to guest"))
        }
    }

    /// Fail with [`ClipboardError::Disabled`] unless guest→host is on
    pub fn require_to_client(&self) -> Result<()> {
        if self.to_client_enabled {
            Ok(())
        } else {
            debug!("Clipboard to client disabled, doing nothing");
            Err(ClipboardError::Disabled("to client"))
        }
    }
}

/// Ownership state plus the flags and one-shot data flag it gates
#[derive(Debug)]
pub struct SyncManager {
    owner: ClipboardOwner,
    flags: FeatureFlags,
    /// Set when guest text arrives, cleared when the embedder polls it
    pending_guest_data: bool,
}

impl SyncManager {
    /// Create a manager in the `None` state
    pub fn new(flags: FeatureFlags) -> Self {
        Self {
            owner: ClipboardOwner::None,
            flags,
            pending_guest_data: false,
        }
    }

    /// Current owner
    pub fn owner(&self) -> ClipboardOwner {
        self.owner
    }

    /// Feature flags
    pub fn flags(&self) -> FeatureFlags {
        self.flags
    }

    /// Host takes the clipboard from any state.
    ///
    /// Returns the previous owner so a failed session call can roll back
    /// through [`restore`](Self::restore).
    pub fn grab_by_host(&mut self) -> Result<ClipboardOwner> {
        self.flags.require_to_guest()?;
        let previous = self.owner;
        self.owner = ClipboardOwner::Host;
        debug!("Clipboard owner: {} -> host", previous);
        Ok(previous)
    }

    /// Host gives the clipboard up.
    ///
    /// # Returns
    ///
    /// - `Ok(true)` - Was `HostOwns`, now `None`; forward the release
    /// - `Ok(false)` - Host did not own it; nothing to forward
    pub fn release_by_host(&mut self) -> Result<bool> {
        self.flags.require_to_guest()?;
        if self.owner != ClipboardOwner::Host {
            debug!("Host does not own clipboard ({}), release is a no-op", self.owner);
            return Ok(false);
        }
        self.owner = ClipboardOwner::None;
        debug!("Clipboard owner: host -> none");
        Ok(true)
    }

    /// Guest announced ownership with the given types.
    ///
    /// Only takes effect when UTF-8 text is among `types`.
    pub fn grab_by_guest(&mut self, types: &[ClipboardType]) -> Result<bool> {
        self.flags.require_to_client()?;
        if !types.contains(&ClipboardType::Utf8Text) {
            debug!("Guest grabbed only unsupported types {:?}, not taking ownership", types);
            return Ok(false);
        }
        debug!("Clipboard owner: {} -> guest", self.owner);
        self.owner = ClipboardOwner::Guest;
        Ok(true)
    }

    /// Guest released the clipboard
    pub fn release_by_guest(&mut self) -> Result<bool> {
        self.flags.require_to_client()?;
        if self.owner != ClipboardOwner::Guest {
            debug!("Guest already does not own clipboard ({})", self.owner);
            return Ok(false);
        }
        self.owner = ClipboardOwner::None;
        debug!("Clipboard owner: guest -> none");
        Ok(true)
    }

    /// A different local application took the host clipboard
    pub fn local_ownership_lost(&mut self) {
        if self.owner == ClipboardOwner::Guest {
            debug!("Local application replaced guest clipboard content");
            self.owner = ClipboardOwner::None;
        }
    }

    /// Put back an owner recorded before a failed transition
    pub fn restore(&mut self, owner: ClipboardOwner) {
        debug!("Clipboard owner restored: {} -> {}", self.owner, owner);
        self.owner = owner;
    }

    /// Fail with [`ClipboardError::NotOwner`] unless `expected` owns it
    pub fn require_owner(&self, expected: ClipboardOwner) -> Result<()> {
        if self.owner == expected {
            Ok(())
        } else {
            Err(ClipboardError::NotOwner {
                expected: expected.as_str(),
                actual: self.owner.as_str(),
            })
        }
    }

    /// Record that guest text arrived
    pub fn mark_guest_data(&mut self) {
        self.pending_guest_data = true;
    }

    /// Read and clear the guest-data flag
    pub fn take_guest_data_flag(&mut self) -> bool {
        std::mem::take(&mut self.pending_guest_data)
    }

    /// Back to `None` with no pending data (session teardown)
    pub fn reset(&mut self) {
        self.owner = ClipboardOwner::None;
        self.pending_guest_data = false;
    }
}

impl Default for SyncManager {
    fn default() -> Self {
        Self::new(FeatureFlags::default())
    }
}
