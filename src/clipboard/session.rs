//! Remote Session and Event Loop Seams
//!
//! The remote-session protocol engine and the event loop it runs under are
//! external. This module defines the two traits the clipboard code needs from
//! them, plus [`ThreadEventLoop`], a dedicated-thread event loop for
//! embedders that do not bring their own.
//!
//! # Threading
//!
//! ```text
//! Platform / embedder thread      Event-loop thread (ThreadEventLoop)
//! ━━━━━━━━━━━━━━━━━━━━━━━━━━      ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//! grab / release / render
//!   ├─> schedule(job) ──Job────> run job
//!   │                               └─> session.grab() / release() / request_data()
//!   └─> mailbox.pop_timeout()       (render only)
//! ```
//!
//! Jobs run one at a time in submission order, so session calls made through
//! the loop never overlap.

use crossbeam_channel::{unbounded, Sender};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

use crate::clipboard::error::{ClipboardError, Result};
use crate::clipboard::formats::{AgentCapability, ClipboardType, LineEnding, Selection};

/// Operations consumed from the remote session.
///
/// Implementations forward to the session's main channel. `grab`,
/// `release` and `request_data` are only called from the event-loop thread;
/// `notify_data` and `test_agent_capability` are called from inside the
/// session's own clipboard callbacks.
#[cfg_attr(test, mockall::automock)]
pub trait GuestSession: Send + Sync {
    /// Announce that the host owns `selection` with the given types
    fn grab(&self, selection: Selection, types: &[ClipboardType]) -> Result<()>;

    /// Give up `selection`
    fn release(&self, selection: Selection) -> Result<()>;

    /// Ask the guest for the content of `selection`
    fn request_data(&self, selection: Selection, clipboard_type: ClipboardType) -> Result<()>;

    /// Answer a guest request with `data`
    fn notify_data(
        &self,
        selection: Selection,
        clipboard_type: ClipboardType,
        data: &[u8],
    ) -> Result<()>;

    /// Whether the guest agent announced `capability`
    fn test_agent_capability(&self, capability: AgentCapability) -> bool;
}

/// Guest agent properties relevant to text transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GuestCapabilities {
    /// Guest text uses `\r\n`
    pub line_ending_is_crlf: bool,
}

impl GuestCapabilities {
    /// Query the session's negotiated agent capabilities
    pub fn probe(session: &dyn GuestSession) -> Self {
        Self {
            line_ending_is_crlf: session.test_agent_capability(AgentCapability::GuestLineEndCrlf),
        }
    }

    /// Guest line-ending convention
    pub fn line_ending(&self) -> LineEnding {
        if self.line_ending_is_crlf {
            LineEnding::Crlf
        } else {
            LineEnding::Lf
        }
    }
}

/// Unit of work for the event loop
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Schedules work onto the event-loop thread
pub trait EventLoop: Send + Sync {
    /// Queue `job`; it runs later on the event-loop thread
    fn schedule(&self, job: Job) -> Result<()>;
}

/// Commands sent to the event-loop thread
enum EventLoopCommand {
    /// Run a job
    Run(Job),
    /// Stop the thread
    Shutdown,
}

/// Event loop on a dedicated thread fed by a crossbeam channel
pub struct ThreadEventLoop {
    command_tx: Sender<EventLoopCommand>,
    thread_handle: Option<JoinHandle<()>>,
}

impl ThreadEventLoop {
    /// Spawn the loop thread
    pub fn spawn(name: &str) -> Result<Self> {
        let (command_tx, command_rx) = unbounded::<EventLoopCommand>();
        let thread_name = name.to_string();

        let thread_handle = thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                debug!("Event loop '{}' started", thread_name);
                while let Ok(command) = command_rx.recv() {
                    match command {
                        EventLoopCommand::Run(job) => job(),
                        EventLoopCommand::Shutdown => break,
                    }
                }
                debug!("Event loop '{}' stopped", thread_name);
            })
            .map_err(|e| ClipboardError::Platform(format!("cannot spawn event loop: {}", e)))?;

        info!("Event loop '{}' spawned", name);

        Ok(Self {
            command_tx,
            thread_handle: Some(thread_handle),
        })
    }

    /// Stop the loop after already-queued jobs and join the thread
    pub fn shutdown(&mut self) {
        if let Some(handle) = self.thread_handle.take() {
            let _ = self.command_tx.send(EventLoopCommand::Shutdown);
            if handle.join().is_err() {
                warn!("Event loop thread panicked");
            }
        }
    }
}

impl EventLoop for ThreadEventLoop {
    fn schedule(&self, job: Job) -> Result<()> {
        if self.thread_handle.is_none() {
            return Err(ClipboardError::EventLoopClosed);
        }
        self.command_tx
            .send(EventLoopCommand::Run(job))
            .map_err(|_| ClipboardError::EventLoopClosed)
    }
}

impl Drop for ThreadEventLoop {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_capabilities_probe() {
        let mut session = MockGuestSession::new();
        session
            .expect_test_agent_capability()
            .withf(|cap| *cap == AgentCapability::GuestLineEndCrlf)
            .return_const(true);

        let caps = GuestCapabilities::probe(&session);
        assert!(caps.line_ending_is_crlf);
        assert_eq!(caps.line_ending(), LineEnding::Crlf);
        assert_eq!(GuestCapabilities::default().line_ending(), LineEnding::Lf);
    }

    #[test]
    fn test_jobs_run_in_order_on_loop_thread() {
        let event_loop = ThreadEventLoop::spawn("test-loop").unwrap();
        let (tx, rx) = crossbeam_channel::unbounded();

        for i in 0..5 {
            let tx = tx.clone();
            event_loop
                .schedule(Box::new(move || {
                    let name = thread::current().name().map(str::to_owned);
                    tx.send((i, name)).unwrap();
                }))
                .unwrap();
        }

        for expected in 0..5 {
            let (i, name) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
            assert_eq!(i, expected);
            assert_eq!(name.as_deref(), Some("test-loop"));
        }
    }

    #[test]
    fn test_shutdown_drains_and_rejects() {
        let mut event_loop = ThreadEventLoop::spawn("drain-loop").unwrap();
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let counter = counter.clone();
            event_loop
                .schedule(Box::new(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                }))
                .unwrap();
        }
        event_loop.shutdown();

        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert!(matches!(
            event_loop.schedule(Box::new(|| {})),
            Err(ClipboardError::EventLoopClosed)
        ));
    }
}
