//! End-to-end clipboard flows through the controller, the host bridge and a
//! real event-loop thread, against a scripted guest session.

use guest_clipboard::clipboard::{
    AgentCapability, ClipboardController, ClipboardError, ClipboardOwner, ClipboardType,
    FeatureFlags, GuestSession, HostClipboardBridge, LineEnding, MemoryClipboard, PlatformEvent,
    Result, Selection, ThreadEventLoop, MAX_CLIPBOARD_BYTES,
};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::thread;
use std::time::{Duration, Instant};

/// How the scripted guest answers a data request
#[derive(Clone)]
enum Answer {
    /// Deliver these bytes after the delay, from a separate thread
    Text(Vec<u8>, Duration),
    /// Never answer
    Silent,
}

struct ScriptedGuest {
    crlf: bool,
    answer: Mutex<Answer>,
    calls: Mutex<Vec<String>>,
    call_threads: Mutex<Vec<Option<String>>>,
    notified: Mutex<Option<Vec<u8>>>,
    controller: Mutex<Weak<ClipboardController>>,
}

impl ScriptedGuest {
    fn new(crlf: bool, answer: Answer) -> Arc<Self> {
        Arc::new(Self {
            crlf,
            answer: Mutex::new(answer),
            calls: Mutex::new(Vec::new()),
            call_threads: Mutex::new(Vec::new()),
            notified: Mutex::new(None),
            controller: Mutex::new(Weak::new()),
        })
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn record(&self, call: &str) {
        self.calls.lock().push(call.to_string());
        self.call_threads
            .lock()
            .push(thread::current().name().map(str::to_owned));
    }

    /// Block until the event loop has made `count` session calls
    fn wait_for_calls(&self, count: usize) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while self.calls.lock().len() < count {
            assert!(Instant::now() < deadline, "session calls never ran: {:?}", self.calls());
            thread::sleep(Duration::from_millis(5));
        }
    }
}

impl GuestSession for ScriptedGuest {
    fn grab(&self, _selection: Selection, _types: &[ClipboardType]) -> Result<()> {
        self.record("grab");
        Ok(())
    }

    fn release(&self, _selection: Selection) -> Result<()> {
        self.record("release");
        Ok(())
    }

    fn request_data(&self, selection: Selection, clipboard_type: ClipboardType) -> Result<()> {
        self.record("request");
        let answer = self.answer.lock().clone();
        if let Answer::Text(bytes, delay) = answer {
            let controller = self.controller.lock().clone();
            thread::spawn(move || {
                thread::sleep(delay);
                if let Some(controller) = controller.upgrade() {
                    controller.on_guest_data_received(selection, clipboard_type, &bytes);
                }
            });
        }
        Ok(())
    }

    fn notify_data(
        &self,
        _selection: Selection,
        _clipboard_type: ClipboardType,
        data: &[u8],
    ) -> Result<()> {
        self.calls.lock().push("notify".to_string());
        *self.notified.lock() = Some(data.to_vec());
        Ok(())
    }

    fn test_agent_capability(&self, capability: AgentCapability) -> bool {
        capability == AgentCapability::GuestLineEndCrlf && self.crlf
    }
}

struct Harness {
    guest: Arc<ScriptedGuest>,
    host: Arc<MemoryClipboard>,
    controller: Arc<ClipboardController>,
    bridge: HostClipboardBridge,
}

fn harness(guest: Arc<ScriptedGuest>, host: MemoryClipboard, render_timeout: Duration) -> Harness {
    let host = Arc::new(host);
    let event_loop = Arc::new(ThreadEventLoop::spawn("test-clipboard-loop").unwrap());
    let controller = Arc::new(ClipboardController::new(
        FeatureFlags::bidirectional(),
        guest.clone(),
        host.clone(),
        event_loop,
    ));
    *guest.controller.lock() = Arc::downgrade(&controller);

    let bridge = HostClipboardBridge::new(controller.clone()).with_render_timeout(render_timeout);

    Harness {
        guest,
        host,
        controller,
        bridge,
    }
}

#[test]
fn test_render_delivers_converted_guest_text() {
    let guest = ScriptedGuest::new(
        false,
        Answer::Text(b"one\ntwo\0".to_vec(), Duration::from_millis(50)),
    );
    let h = harness(guest, MemoryClipboard::new(LineEnding::Crlf), Duration::from_secs(5));

    assert!(h
        .controller
        .on_guest_grab(Selection::Clipboard, &[ClipboardType::Utf8Text]));
    assert!(h.host.is_offered());

    h.bridge
        .handle_event(PlatformEvent::RenderRequested(ClipboardType::Utf8Text))
        .unwrap();

    assert_eq!(h.host.text().as_deref(), Some("one\r\ntwo"));
    assert_eq!(h.guest.calls(), vec!["request"]);
    assert_eq!(h.controller.owner(), ClipboardOwner::Guest);
    // Consumed by the render
    assert!(!h.controller.is_clipboard_data_available());
}

#[test]
fn test_render_all_behaves_like_text_render() {
    let guest = ScriptedGuest::new(true, Answer::Text(b"a\r\nb".to_vec(), Duration::ZERO));
    let h = harness(guest, MemoryClipboard::new(LineEnding::Lf), Duration::from_secs(5));
    h.controller
        .on_guest_grab(Selection::Clipboard, &[ClipboardType::Utf8Text]);

    h.bridge.handle_event(PlatformEvent::RenderAllRequested).unwrap();

    assert_eq!(h.host.text().as_deref(), Some("a\nb"));
}

#[test]
fn test_render_timeout_then_late_data_is_discarded() {
    let guest = ScriptedGuest::new(false, Answer::Silent);
    let h = harness(guest, MemoryClipboard::new(LineEnding::Crlf), Duration::from_millis(100));
    h.controller
        .on_guest_grab(Selection::Clipboard, &[ClipboardType::Utf8Text]);

    let start = Instant::now();
    let result = h.bridge.render_text();
    assert!(matches!(result, Err(ClipboardError::TransferTimeout(100))));
    assert!(start.elapsed() >= Duration::from_millis(100));
    assert_eq!(h.host.text(), None);

    // Answer to the abandoned request arrives late
    h.controller
        .on_guest_data_received(Selection::Clipboard, ClipboardType::Utf8Text, b"stale");

    // Next render must not pick the stale answer up
    *h.guest.answer.lock() = Answer::Text(b"fresh".to_vec(), Duration::from_millis(20));
    h.bridge.render_text().unwrap();
    assert_eq!(h.host.text().as_deref(), Some("fresh"));
}

#[test]
fn test_shutdown_wakes_blocked_render() {
    let guest = ScriptedGuest::new(false, Answer::Silent);
    let h = harness(guest, MemoryClipboard::new(LineEnding::Crlf), Duration::from_secs(10));
    h.controller
        .on_guest_grab(Selection::Clipboard, &[ClipboardType::Utf8Text]);

    let controller = h.controller.clone();
    let stopper = thread::spawn(move || {
        thread::sleep(Duration::from_millis(100));
        controller.shutdown();
    });

    let start = Instant::now();
    let result = h.bridge.render_text();
    stopper.join().unwrap();

    assert!(result.is_err());
    assert!(start.elapsed() < Duration::from_secs(5));
    assert_eq!(h.controller.owner(), ClipboardOwner::None);

    // A new session re-arms the mailbox
    h.controller.session_connected();
    h.controller
        .on_guest_data_received(Selection::Clipboard, ClipboardType::Utf8Text, b"after");
    assert_eq!(h.controller.take_guest_clipboard_text().as_deref(), Some("after"));
}

#[test]
fn test_host_to_guest_size_boundary() {
    let guest = ScriptedGuest::new(true, Answer::Silent);
    let h = harness(
        guest,
        MemoryClipboard::with_text(LineEnding::Crlf, "x".repeat(MAX_CLIPBOARD_BYTES)),
        Duration::from_secs(1),
    );

    h.controller.grab_guest_clipboard().unwrap();
    h.guest.wait_for_calls(1);
    assert!(h
        .controller
        .on_guest_requests_data(Selection::Clipboard, ClipboardType::Utf8Text));
    assert_eq!(
        h.guest.notified.lock().as_ref().map(Vec::len),
        Some(MAX_CLIPBOARD_BYTES)
    );

    h.host.set_text("x".repeat(MAX_CLIPBOARD_BYTES + 1));
    *h.guest.notified.lock() = None;
    assert!(!h
        .controller
        .on_guest_requests_data(Selection::Clipboard, ClipboardType::Utf8Text));
    assert_eq!(*h.guest.notified.lock(), None);
    assert_eq!(h.guest.calls(), vec!["grab", "notify"]);
}

#[test]
fn test_oversize_guest_text_unblocks_render_with_no_data() {
    let oversize = vec![b'y'; MAX_CLIPBOARD_BYTES + 1];
    let guest = ScriptedGuest::new(false, Answer::Text(oversize, Duration::from_millis(20)));
    let h = harness(guest, MemoryClipboard::new(LineEnding::Crlf), Duration::from_secs(5));
    h.controller
        .on_guest_grab(Selection::Clipboard, &[ClipboardType::Utf8Text]);

    let start = Instant::now();
    h.bridge.render_text().unwrap();

    assert!(start.elapsed() < Duration::from_secs(5));
    assert_eq!(h.host.text(), None);
}

#[test]
fn test_pull_api_round_trip() {
    let guest = ScriptedGuest::new(false, Answer::Text(b"pulled\n".to_vec(), Duration::ZERO));
    let h = harness(guest, MemoryClipboard::new(LineEnding::Lf), Duration::from_secs(1));

    assert!(!h.controller.request_guest_clipboard_data().unwrap());
    h.controller
        .on_guest_grab(Selection::Clipboard, &[ClipboardType::Utf8Text]);
    assert!(h.controller.request_guest_clipboard_data().unwrap());

    let deadline = Instant::now() + Duration::from_secs(5);
    while !h.controller.is_clipboard_data_available() {
        assert!(Instant::now() < deadline, "guest data never arrived");
        thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(h.controller.take_guest_clipboard_text().as_deref(), Some("pulled\n"));
}

#[test]
fn test_foreign_copy_takes_guest_clipboard() {
    let guest = ScriptedGuest::new(false, Answer::Silent);
    let h = harness(guest, MemoryClipboard::new(LineEnding::Crlf), Duration::from_secs(1));
    h.controller
        .on_guest_grab(Selection::Clipboard, &[ClipboardType::Utf8Text]);

    h.host.set_text("from another app");
    h.bridge
        .handle_event(PlatformEvent::LocalOwnershipChanged { by_self: false })
        .unwrap();

    assert_eq!(h.controller.owner(), ClipboardOwner::Host);
    h.guest.wait_for_calls(1);
    assert_eq!(h.guest.calls(), vec!["grab"]);

    assert!(h
        .controller
        .on_guest_requests_data(Selection::Clipboard, ClipboardType::Utf8Text));
    assert_eq!(
        h.guest.notified.lock().as_deref(),
        Some(b"from another app".as_slice())
    );
}

#[test]
fn test_session_calls_run_on_event_loop_thread() {
    let guest = ScriptedGuest::new(false, Answer::Text(b"x".to_vec(), Duration::ZERO));
    let h = harness(guest, MemoryClipboard::with_text(LineEnding::Crlf, "y"), Duration::from_secs(1));

    let controller = h.controller.clone();
    thread::Builder::new()
        .name("embedder".to_string())
        .spawn(move || {
            controller.grab_guest_clipboard().unwrap();
            controller.release_guest_clipboard().unwrap();
            controller.on_guest_grab(Selection::Clipboard, &[ClipboardType::Utf8Text]);
            controller.request_guest_clipboard_data().unwrap();
        })
        .unwrap()
        .join()
        .unwrap();

    h.guest.wait_for_calls(3);
    assert_eq!(h.guest.calls(), vec!["grab", "release", "request"]);
    assert!(h
        .guest
        .call_threads
        .lock()
        .iter()
        .all(|name| name.as_deref() == Some("test-clipboard-loop")));
}
