//! Clipboard Controller
//!
//! Owns the ownership state, the guest→host mailbox and the two external
//! collaborators (remote session, host clipboard). It is both the public
//! surface the embedding application drives and the target of the remote
//! session's clipboard callbacks.
//!
//! # Data Flow
//!
//! ```text
//! Guest agent             Session              ClipboardController            Host clipboard
//! ━━━━━━━━━━━             ━━━━━━━              ━━━━━━━━━━━━━━━━━━━            ━━━━━━━━━━━━━━
//!
//! Copy in guest
//!   └─> grab ──────────> on_guest_grab() ─────> SyncManager: GuestOwns ──────> offer_guest_text()
//!
//! Paste on host (render request, see HostClipboardBridge)
//!                        request_data() <───── schedule_guest_request() (event loop)
//!   data ──────────────> on_guest_data_received()
//!                                                ├─> transcode guest → host
//!                                                └─> Mailbox::push ──────────> write_text()
//!
//! Paste in guest
//!   request ───────────> on_guest_requests_data()
//!                                                ├─> read_text() <─────────── host text
//!                                                ├─> transcode host → guest
//!                                                ├─> size policy
//!                        notify_data() <─────────┘
//! ```
//!
//! # Threading
//!
//! Outgoing session calls (`grab`, `release`, `request_data`) run as jobs on
//! the [`EventLoop`], whichever thread asked for them. The ownership
//! transition is applied at once under the state lock; a job whose session
//! call fails rolls it back, unless the owner moved on in the meantime.
//! `notify_data` answers a guest request and runs on the session's own
//! callback thread.
//!
//! # Locking
//!
//! The state mutex and the mailbox mutex are never held while calling the
//! session or the host clipboard; both may call back into this controller.
//! The mailbox may be locked while the state mutex is held, never the
//! other way round.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::clipboard::error::{classify_error, ClipboardError, ErrorType, Result};
use crate::clipboard::formats::{ClipboardPayload, ClipboardType, Selection, ADVERTISED_TYPES};
use crate::clipboard::host::HostClipboard;
use crate::clipboard::line_ending;
use crate::clipboard::mailbox::Mailbox;
use crate::clipboard::policy;
use crate::clipboard::session::{EventLoop, GuestCapabilities, GuestSession};
use crate::clipboard::sync::{ClipboardOwner, FeatureFlags, SyncManager};

/// What the guest delivered in answer to a request
#[derive(Debug, PartialEq, Eq)]
pub enum GuestDelivery {
    /// Text converted to the host convention
    Text(ClipboardPayload),
    /// Guest had nothing to give, or its data was rejected
    NoData,
}

/// Clipboard mediation between one remote session and the host clipboard
pub struct ClipboardController {
    /// Ownership state and feature flags
    state: Arc<Mutex<SyncManager>>,

    /// Guest → host handoff
    mailbox: Arc<Mailbox<GuestDelivery>>,

    /// Remote session main channel
    session: Arc<dyn GuestSession>,

    /// Local OS clipboard
    host: Arc<dyn HostClipboard>,

    /// Thread that owns outgoing session calls
    event_loop: Arc<dyn EventLoop>,
}

impl std::fmt::Debug for ClipboardController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClipboardController")
            .field("state", &*self.state.lock())
            .field("pending_delivery", &self.mailbox.has_pending())
            .finish()
    }
}

impl ClipboardController {
    /// Create a controller in the `None` state.
    ///
    /// Session calls made by the controller are scheduled on `event_loop`.
    pub fn new(
        flags: FeatureFlags,
        session: Arc<dyn GuestSession>,
        host: Arc<dyn HostClipboard>,
        event_loop: Arc<dyn EventLoop>,
    ) -> Self {
        info!(
            "Clipboard initialized (to guest: {}, to client: {})",
            flags.to_guest_enabled, flags.to_client_enabled
        );
        Self {
            state: Arc::new(Mutex::new(SyncManager::new(flags))),
            mailbox: Arc::new(Mailbox::new()),
            session,
            host,
            event_loop,
        }
    }

    /// Current owner
    pub fn owner(&self) -> ClipboardOwner {
        self.state.lock().owner()
    }

    /// Feature flags
    pub fn flags(&self) -> FeatureFlags {
        self.state.lock().flags()
    }

    /// Host clipboard adapter
    pub fn host(&self) -> &Arc<dyn HostClipboard> {
        &self.host
    }

    // =========================================================================
    // Embedder operations
    // =========================================================================

    /// Take ownership of the guest clipboard, advertising UTF-8 text.
    ///
    /// The owner becomes `Host` immediately; the session grab follows on
    /// the event loop.
    ///
    /// # Returns
    ///
    /// - `Ok(true)` - Grab scheduled, host owns the clipboard
    /// - `Ok(false)` - Host→guest sharing disabled, nothing done
    /// - `Err(_)` - Event loop gone, previous owner restored
    pub fn grab_guest_clipboard(&self) -> Result<bool> {
        debug!("Grabbing guest clipboard");
        let transition = self.state.lock().grab_by_host();
        let previous = match transition {
            Ok(previous) => previous,
            Err(ClipboardError::Disabled(_)) => return Ok(false),
            Err(e) => return Err(e),
        };

        let session = self.session.clone();
        let state = self.state.clone();
        let scheduled = self.event_loop.schedule(Box::new(move || {
            if let Err(e) = session.grab(Selection::Clipboard, ADVERTISED_TYPES) {
                warn!("Session rejected clipboard grab: {}", e);
                rollback(&state, ClipboardOwner::Host, previous);
            }
        }));

        if let Err(e) = scheduled {
            warn!("Cannot schedule clipboard grab: {}", e);
            rollback(&self.state, ClipboardOwner::Host, previous);
            return Err(e);
        }
        Ok(true)
    }

    /// Give up ownership of the guest clipboard.
    ///
    /// # Returns
    ///
    /// - `Ok(true)` - Release scheduled, owner is now `None`
    /// - `Ok(false)` - Sharing disabled or host did not own it
    /// - `Err(_)` - Event loop gone, host still owns the clipboard
    pub fn release_guest_clipboard(&self) -> Result<bool> {
        debug!("Releasing guest clipboard");
        let transition = self.state.lock().release_by_host();
        match transition {
            Ok(true) => {}
            Ok(false) | Err(ClipboardError::Disabled(_)) => return Ok(false),
            Err(e) => return Err(e),
        }

        let session = self.session.clone();
        let state = self.state.clone();
        let scheduled = self.event_loop.schedule(Box::new(move || {
            if let Err(e) = session.release(Selection::Clipboard) {
                warn!("Session rejected clipboard release: {}", e);
                rollback(&state, ClipboardOwner::None, ClipboardOwner::Host);
            }
        }));

        if let Err(e) = scheduled {
            warn!("Cannot schedule clipboard release: {}", e);
            rollback(&self.state, ClipboardOwner::None, ClipboardOwner::Host);
            return Err(e);
        }
        Ok(true)
    }

    /// Ask the guest for its clipboard content.
    ///
    /// The answer arrives later through [`on_guest_data_received`]; poll
    /// [`is_clipboard_data_available`] and collect it with
    /// [`take_guest_clipboard_text`].
    ///
    /// Returns `Ok(false)` when the guest does not own the clipboard.
    ///
    /// [`on_guest_data_received`]: Self::on_guest_data_received
    /// [`is_clipboard_data_available`]: Self::is_clipboard_data_available
    /// [`take_guest_clipboard_text`]: Self::take_guest_clipboard_text
    pub fn request_guest_clipboard_data(&self) -> Result<bool> {
        {
            let state = self.state.lock();
            if state.flags().require_to_client().is_err() {
                return Ok(false);
            }
            if state.owner() != ClipboardOwner::Guest {
                debug!("Guest has not grabbed the clipboard ({}), not requesting", state.owner());
                return Ok(false);
            }
        }
        self.schedule_guest_request()?;
        Ok(true)
    }

    /// One-shot "new guest data arrived" flag, cleared by this call
    pub fn is_clipboard_data_available(&self) -> bool {
        self.state.lock().take_guest_data_flag()
    }

    /// Take guest text delivered since the last request, without blocking
    pub fn take_guest_clipboard_text(&self) -> Option<String> {
        match self.mailbox.try_pop()? {
            GuestDelivery::Text(payload) => match payload.into_string() {
                Ok(text) => Some(text),
                Err(e) => {
                    warn!("Dropping guest clipboard text: {}", e);
                    None
                }
            },
            GuestDelivery::NoData => None,
        }
    }

    // =========================================================================
    // Session callbacks
    // =========================================================================

    /// Guest asks for the host clipboard content.
    ///
    /// Returns whether the request was handled; `false` tells the session
    /// to answer the guest with "no data".
    pub fn on_guest_requests_data(
        &self,
        selection: Selection,
        clipboard_type: ClipboardType,
    ) -> bool {
        debug!("Guest requests clipboard data ({:?}, {:?})", selection, clipboard_type);
        let (flags, owner) = {
            let state = self.state.lock();
            (state.flags(), state.owner())
        };

        if flags.require_to_guest().is_err() {
            return true;
        }
        if !selection.is_supported() {
            warn!("Discarded clipboard request of unsupported selection {:?}", selection);
            return false;
        }
        if owner != ClipboardOwner::Host {
            debug!("Host does not hold the clipboard ({}), not sending it", owner);
            return false;
        }
        if clipboard_type != ClipboardType::Utf8Text {
            warn!("Guest requested unsupported clipboard type {:?}", clipboard_type);
            return false;
        }

        let payload = match self.host_text_for_guest() {
            Ok(payload) => payload,
            Err(e) => {
                log_refusal(&e);
                return false;
            }
        };

        match self.session.notify_data(
            Selection::Clipboard,
            ClipboardType::Utf8Text,
            payload.as_bytes(),
        ) {
            Ok(()) => {
                debug!("Sent {} bytes of host clipboard to guest", payload.len());
                true
            }
            Err(e) => {
                warn!("Failed to send clipboard to guest: {}", e);
                false
            }
        }
    }

    /// Guest delivers clipboard content requested earlier
    pub fn on_guest_data_received(
        &self,
        selection: Selection,
        clipboard_type: ClipboardType,
        data: &[u8],
    ) {
        debug!("Guest clipboard data: {:?}, {} bytes", clipboard_type, data.len());
        if self.flags().require_to_client().is_err() {
            return;
        }
        if !selection.is_supported() {
            warn!("Ignoring clipboard data for unsupported selection {:?}", selection);
            return;
        }

        match clipboard_type {
            ClipboardType::None => {
                debug!("Guest has no clipboard data");
                self.mailbox.push(GuestDelivery::NoData);
            }
            ClipboardType::Utf8Text => match self.guest_text_for_host(data) {
                Ok(payload) => {
                    // Flag and slot change together for pollers and renders
                    let mut state = self.state.lock();
                    self.mailbox.push(GuestDelivery::Text(payload));
                    state.mark_guest_data();
                }
                Err(e) => {
                    log_refusal(&e);
                    self.mailbox.push(GuestDelivery::NoData);
                }
            },
            other => {
                warn!("Ignoring clipboard of unexpected type {:?} from guest", other);
            }
        }
    }

    /// Guest took its clipboard with the given types
    pub fn on_guest_grab(&self, selection: Selection, types: &[ClipboardType]) -> bool {
        debug!("Guest grabbed clipboard ({:?}, {:?})", selection, types);
        if self.flags().require_to_client().is_err() {
            return true;
        }
        if !selection.is_supported() {
            warn!("Discarded clipboard grab of unsupported selection {:?}", selection);
            return false;
        }

        let transition = self.state.lock().grab_by_guest(types);
        match transition {
            Ok(true) => {
                // Promise text to the local clipboard; content is rendered on demand
                if let Err(e) = self.host.offer_guest_text() {
                    error!("Failed to announce guest clipboard locally: {}", e);
                }
            }
            Ok(false) => {}
            Err(e) => debug!("Guest grab not applied: {}", e),
        }
        true
    }

    /// Guest released its clipboard
    pub fn on_guest_release(&self, selection: Selection) -> bool {
        debug!("Guest released clipboard ({:?})", selection);
        if self.flags().require_to_client().is_err() {
            return true;
        }
        if !selection.is_supported() {
            warn!("Discarded clipboard release of unsupported selection {:?}", selection);
            return false;
        }

        if let Err(e) = self.state.lock().release_by_guest() {
            debug!("Guest release not applied: {}", e);
        }
        true
    }

    // =========================================================================
    // Session lifecycle
    // =========================================================================

    /// New session attached; re-arms the mailbox after a shutdown
    pub fn session_connected(&self) {
        info!("Clipboard session connected");
        self.state.lock().reset();
        self.mailbox.reopen();
    }

    /// Session gone; ownership back to `None`, pending data dropped
    pub fn session_disconnected(&self) {
        info!("Clipboard session disconnected, resetting ownership");
        self.state.lock().reset();
        self.mailbox.clear();
    }

    /// Disconnect and wake any render blocked on the mailbox
    pub fn shutdown(&self) {
        self.session_disconnected();
        self.mailbox.close();
    }

    // =========================================================================
    // Host bridge plumbing
    // =========================================================================

    /// A different local application took the host clipboard
    pub(crate) fn local_ownership_changed(&self) -> Result<bool> {
        debug!("Another application grabbed the host clipboard, grabbing guest clipboard");
        self.state.lock().local_ownership_lost();
        self.grab_guest_clipboard()
    }

    /// Check a render may proceed and drop any stale delivery
    pub(crate) fn begin_render(&self) -> Result<()> {
        let mut state = self.state.lock();
        state.flags().require_to_client()?;
        state.require_owner(ClipboardOwner::Guest)?;
        // Flag and slot are dropped together, like they are set
        state.take_guest_data_flag();
        self.mailbox.clear();
        Ok(())
    }

    /// Queue a text request to the guest on the event loop. If the session
    /// call fails a `NoData` is pushed so a waiting render does not sit out
    /// its deadline.
    pub(crate) fn schedule_guest_request(&self) -> Result<()> {
        let session = self.session.clone();
        let mailbox = self.mailbox.clone();
        self.event_loop.schedule(Box::new(move || {
            if let Err(e) = session.request_data(Selection::Clipboard, ClipboardType::Utf8Text) {
                warn!("Failed to request clipboard from guest: {}", e);
                mailbox.push(GuestDelivery::NoData);
            }
        }))
    }

    /// Block the calling (platform) thread until the guest answers
    pub(crate) fn wait_guest_delivery(&self, timeout: Duration) -> Option<GuestDelivery> {
        let delivery = self.mailbox.pop_timeout(timeout)?;
        if matches!(delivery, GuestDelivery::Text(_)) {
            // Consumed by the render; nothing left for the pull API
            self.state.lock().take_guest_data_flag();
        }
        Some(delivery)
    }

    // =========================================================================
    // Conversions
    // =========================================================================

    /// Read host text and shape it for the guest
    fn host_text_for_guest(&self) -> Result<ClipboardPayload> {
        let text = match self.host.read_text()? {
            Some(text) => text,
            None => {
                debug!("No supported clipboard format available on host");
                return Err(ClipboardError::EmptyPayload);
            }
        };

        let caps = GuestCapabilities::probe(self.session.as_ref());
        let payload = line_ending::convert(
            line_ending::until_nul(text.as_bytes()),
            self.host.line_ending(),
            caps.line_ending(),
        )?;
        policy::check_size(payload.len())?;
        Ok(payload)
    }

    /// Shape guest text for the host clipboard
    fn guest_text_for_host(&self, data: &[u8]) -> Result<ClipboardPayload> {
        let text = line_ending::until_nul(data);
        policy::check_size(text.len())?;

        let caps = GuestCapabilities::probe(self.session.as_ref());
        let payload = line_ending::convert(text, caps.line_ending(), self.host.line_ending())?;
        payload.as_str()?;
        Ok(payload)
    }
}

/// Undo a transition whose session call failed, if nothing moved the owner
/// away from `applied` since
fn rollback(state: &Mutex<SyncManager>, applied: ClipboardOwner, previous: ClipboardOwner) {
    let mut state = state.lock();
    if state.owner() == applied {
        state.restore(previous);
    } else {
        debug!("Owner changed to {} meanwhile, keeping it", state.owner());
    }
}

/// Log why a transfer was refused, at the level its kind deserves
fn log_refusal(error: &ClipboardError) {
    match classify_error(error) {
        ErrorType::DisabledFeature | ErrorType::NotOwner => debug!("Clipboard transfer refused: {}", error),
        ErrorType::Platform => error!("Clipboard transfer failed: {}", error),
        // Size policy already logged the offending size
        ErrorType::PayloadSize => {}
        _ => warn!("Clipboard transfer refused: {}", error),
    }
}
