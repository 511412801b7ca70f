pub mod machine;

use std::sync::Arc;

use flume::Receiver;
use ndef_types::Tag;

use crate::native::NativeReply;

pub use machine::{SessionError, SessionMachine, SessionState, SessionTrigger};

/// What an open scan session reports to the application
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Enum)]
pub enum SessionEvent {
    /// A tag was detected and read while the session was open
    Tag { tag: Tag },
    /// The session was closed externally or reading failed, relayed verbatim
    Error { message: String },
}

/// Handle to a scan session started with `begin_scan_session`
///
/// Dropping the handle stops delivery of further session events, ending the
/// native session is still done through `end_session`
#[derive(Debug)]
pub struct ScanSession {
    reply: Arc<NativeReply>,
    events: Receiver<SessionEvent>,
}

impl ScanSession {
    pub(crate) fn new(reply: Arc<NativeReply>, events: Receiver<SessionEvent>) -> Self {
        Self { reply, events }
    }

    /// Wait for the next session event, `None` once the session is closed and drained
    pub async fn next_event(&self) -> Option<SessionEvent> {
        self.events.recv_async().await.ok()
    }

    /// Blocking form of `next_event`, for callers on their own thread
    pub fn wait_next_event(&self) -> Option<SessionEvent> {
        self.events.recv().ok()
    }

    pub fn try_next_event(&self) -> Option<SessionEvent> {
        self.events.try_recv().ok()
    }

    /// Wait for the next detected tag, session errors come back as `Err`
    pub async fn next_tag(&self) -> Option<Result<Tag, String>> {
        match self.next_event().await? {
            SessionEvent::Tag { tag } => Some(Ok(tag)),
            SessionEvent::Error { message } => Some(Err(message)),
        }
    }

    pub fn is_open(&self) -> bool {
        self.reply.is_open()
    }

    pub fn close(&self) {
        self.reply.close();
    }
}

impl Drop for ScanSession {
    fn drop(&mut self) {
        self.reply.close();
    }
}
