//! The boundary to the native NFC plugin
//!
//! Every operation is a name-dispatched call with a positional JSON argument
//! list. The native side answers through the [`NativeReply`] handed to it,
//! either once, or repeatedly for persistent listeners.

use std::{fmt, sync::Arc};

use parking_lot::{Mutex, RwLock};
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Outcome reported by the native side, `Ok` carries the JSON payload text
pub type ReplyResult = Result<String, String>;

type Handler = Box<dyn Fn(ReplyResult) + Send + Sync + 'static>;

/// Implemented by the host platform (Kotlin/Swift), or by the simulator
#[uniffi::export(callback_interface)]
pub trait NativePlugin: Send + Sync + fmt::Debug + 'static {
    /// Start the native operation, the answer goes to `reply`
    ///
    /// Must not block, the reply may be answered before or after returning
    fn exec(&self, call: NativeCall, reply: Arc<NativeReply>);
}

#[derive(
    Debug,
    Copy,
    Clone,
    Hash,
    PartialEq,
    Eq,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
    strum::EnumIter,
    uniffi::Enum,
)]
#[strum(serialize_all = "camelCase")]
pub enum NativeMethod {
    Status,
    AskForPermission,
    ShowSettings,
    Write,
    SetMimeTypeFilter,
    SetTagListener,
    SetNdefListener,
    SetStateChangeListener,
    BeginNfc,
    HandleLaunchNfcIntent,
    BeginScanSession,
    EndSession,
    StartNfcMonitoring,
}

impl NativeMethod {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct NativeCall {
    pub service: String,
    pub method: String,
    /// JSON text of the positional argument array
    pub args: String,
}

impl NativeCall {
    pub fn new(
        service: impl Into<String>,
        method: NativeMethod,
        args: &[serde_json::Value],
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            service: service.into(),
            method: method.to_string(),
            args: serde_json::to_string(args)?,
        })
    }

    /// The known method this call targets, `None` for names outside the fixed set
    pub fn native_method(&self) -> Option<NativeMethod> {
        self.method.parse().ok()
    }

    pub fn args_value(&self) -> Result<Vec<serde_json::Value>, serde_json::Error> {
        serde_json::from_str(&self.args)
    }
}

enum ReplyKind {
    /// Caller passed no callbacks
    Discard,

    /// Resolves a single awaiting call, later answers are ignored
    Once(Mutex<Option<oneshot::Sender<ReplyResult>>>),

    /// Invoked for every answer until unregistered
    Persistent(RwLock<Option<Handler>>),
}

/// Callback handle given to the native side with each call
#[derive(uniffi::Object)]
pub struct NativeReply {
    method: NativeMethod,
    kind: ReplyKind,
}

impl NativeReply {
    pub(crate) fn once(method: NativeMethod) -> (Arc<Self>, oneshot::Receiver<ReplyResult>) {
        let (sender, receiver) = oneshot::channel();
        let reply = Self {
            method,
            kind: ReplyKind::Once(Mutex::new(Some(sender))),
        };

        (Arc::new(reply), receiver)
    }

    pub(crate) fn persistent(
        method: NativeMethod,
        handler: impl Fn(ReplyResult) + Send + Sync + 'static,
    ) -> Arc<Self> {
        let handler: Handler = Box::new(handler);
        Arc::new(Self {
            method,
            kind: ReplyKind::Persistent(RwLock::new(Some(handler))),
        })
    }

    pub(crate) fn discard(method: NativeMethod) -> Arc<Self> {
        Arc::new(Self {
            method,
            kind: ReplyKind::Discard,
        })
    }

    fn deliver(&self, result: ReplyResult) {
        match &self.kind {
            ReplyKind::Discard => {
                debug!("ignoring {} answer, no callback registered", self.method);
            }

            ReplyKind::Once(sender) => {
                let Some(sender) = sender.lock().take() else {
                    warn!("{} already answered, ignoring", self.method);
                    return;
                };

                if sender.send(result).is_err() {
                    debug!("{} caller went away before the answer", self.method);
                }
            }

            // handler must not close this reply, it runs under the read lock
            ReplyKind::Persistent(handler) => match handler.read().as_ref() {
                Some(handler) => handler(result),
                None => debug!("{} listener unregistered, dropping answer", self.method),
            },
        }
    }
}

#[uniffi::export]
impl NativeReply {
    pub fn method(&self) -> NativeMethod {
        self.method
    }

    /// Answer with a JSON payload, an empty string means no payload
    pub fn success(&self, payload: String) {
        self.deliver(Ok(payload));
    }

    pub fn error(&self, message: String) {
        self.deliver(Err(message));
    }

    /// Stop delivering answers, dropping the handler
    ///
    /// Hosts call this when a persistent listener or session is finished
    pub fn close(&self) {
        match &self.kind {
            ReplyKind::Discard => {}
            ReplyKind::Once(sender) => drop(sender.lock().take()),
            ReplyKind::Persistent(handler) => drop(handler.write().take()),
        }
    }

    /// Whether an answer would still reach anyone
    pub fn is_open(&self) -> bool {
        match &self.kind {
            ReplyKind::Discard => false,
            ReplyKind::Once(sender) => sender.lock().as_ref().is_some_and(|s| !s.is_closed()),
            ReplyKind::Persistent(handler) => handler.read().is_some(),
        }
    }

    /// Persistent replies may be answered any number of times
    pub fn is_persistent(&self) -> bool {
        matches!(self.kind, ReplyKind::Persistent(_))
    }
}

impl fmt::Debug for NativeReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            ReplyKind::Discard => "discard",
            ReplyKind::Once(_) => "once",
            ReplyKind::Persistent(_) => "persistent",
        };

        f.debug_struct("NativeReply")
            .field("method", &self.method)
            .field("kind", &kind)
            .finish()
    }
}
