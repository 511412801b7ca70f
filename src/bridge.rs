//! Application facing NFC bridge
//!
//! Every operation converts its arguments to the transport form, forwards
//! them to the native plugin and converts the answer back. Native failures
//! are relayed unchanged, nothing is retried.

use std::{
    str::FromStr as _,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use flume::Receiver;
use ndef_types::{NdefRecord, NfcStatus, Tag, WireRecord, WireTag};
use parking_lot::Mutex;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;
use tap::TapOptional as _;
use tracing::{debug, info, warn};

use crate::{
    config::{BridgeConfig, BridgeMode},
    error::{BridgeError, Result, TransportResultExt as _},
    event::{BridgeEvent, EventBus},
    native::{NativeCall, NativeMethod, NativePlugin, NativeReply, ReplyResult},
    session::{ScanSession, SessionEvent},
};

type Method = NativeMethod;

pub struct NfcBridge {
    native: Box<dyn NativePlugin>,
    config: BridgeConfig,
    events: EventBus,

    /// Persistent native listeners, registered once by `initialize`
    listeners: Mutex<Vec<Arc<NativeReply>>>,

    /// Reply of the open scan session, closed when the session ends
    session: Mutex<Option<Arc<NativeReply>>>,
    initialized: AtomicBool,
}

/// Native permission answers are either a boolean or `1`/`0`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PermissionAnswer {
    Flag(bool),
    Code(i64),
}

impl NfcBridge {
    pub fn new(native: Box<dyn NativePlugin>, config: BridgeConfig) -> Self {
        Self {
            native,
            config,
            events: EventBus::new(),
            listeners: Mutex::new(Vec::new()),
            session: Mutex::new(None),
            initialized: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn mode(&self) -> BridgeMode {
        self.config.mode
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe(&self) -> Receiver<BridgeEvent> {
        self.events.subscribe()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Register the persistent native listeners, call once the host is ready
    ///
    /// Later calls do nothing, listeners live until `shutdown`
    pub fn initialize(&self) -> Result<()> {
        if self.initialized.swap(true, Ordering::SeqCst) {
            debug!("bridge already initialized");
            return Ok(());
        }

        info!("initializing nfc bridge in {} mode", self.config.mode);

        if let Some(method) = self.config.mode.tag_listener_method() {
            let events = self.events.clone();
            let reply = NativeReply::persistent(method, move |result| {
                if let Some(event) = tag_event(method, result) {
                    events.dispatch(event);
                }
            });

            self.register_listener(method, reply)?;
        }

        let events = self.events.clone();
        let reply = NativeReply::persistent(Method::SetStateChangeListener, move |result| {
            if let Some(status) = state_change(result) {
                events.dispatch(BridgeEvent::StateChange { status });
            }
        });

        self.register_listener(Method::SetStateChangeListener, reply)
    }

    /// The application is ready for events
    ///
    /// Dispatches `DeviceReady`, gives listeners a chance to attach, then
    /// starts native dispatch so a launch-time tag arrives after readiness
    pub async fn device_ready(&self) -> Result<()> {
        // listeners must be in place before any launch intent is replayed
        self.initialize()?;

        self.events.dispatch(BridgeEvent::DeviceReady);

        tokio::task::yield_now().await;
        let delay = self.config.launch_intent_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        match self.config.mode {
            BridgeMode::ScanSession => {
                let method = Method::StartNfcMonitoring;
                self.exec(method, &[], NativeReply::discard(method))?;
            }

            BridgeMode::TagListener | BridgeMode::NdefListener => {
                for method in [Method::BeginNfc, Method::HandleLaunchNfcIntent] {
                    self.exec(method, &[], NativeReply::discard(method))?;
                }
            }
        }

        Ok(())
    }

    /// Unregister the persistent listeners, later native events are ignored
    pub fn shutdown(&self) {
        let listeners = std::mem::take(&mut *self.listeners.lock());
        for listener in &listeners {
            listener.close();
        }

        self.initialized.store(false, Ordering::SeqCst);
        info!("nfc bridge shut down, {} listeners removed", listeners.len());
    }

    pub async fn status(&self) -> Result<NfcStatus> {
        let payload = self.call(Method::Status, &[]).await?;
        decode_status(&payload).ok_or_else(|| BridgeError::malformed(Method::Status, payload))
    }

    /// Ask for NFC permission, may show a system prompt
    pub async fn ask_for_permission(&self) -> Result<bool> {
        let answer: PermissionAnswer = self.call_decode(Method::AskForPermission, &[]).await?;

        Ok(match answer {
            PermissionAnswer::Flag(granted) => granted,
            PermissionAnswer::Code(code) => code != 0,
        })
    }

    /// Open the system NFC settings screen
    pub async fn show_settings(&self) -> Result<()> {
        self.call(Method::ShowSettings, &[]).await.map(drop)
    }

    /// Write records to a tag, `id` and `payload` go over the wire as integer arrays
    pub async fn write(&self, records: &[NdefRecord]) -> Result<()> {
        let records = records.iter().map(WireRecord::from).collect::<Vec<_>>();
        let args = [serde_json::to_value(records)?];

        self.call(Method::Write, &args).await.map(drop)
    }

    /// Start a scan session, tags and session errors arrive on the returned handle
    pub fn begin_scan_session(&self) -> Result<ScanSession> {
        let method = Method::BeginScanSession;
        self.require_mode(method, BridgeMode::ScanSession)?;

        let (sender, receiver) = flume::unbounded();
        let reply = NativeReply::persistent(method, move |result| {
            let event = session_event(result);
            if sender.send(event).is_err() {
                debug!("scan session handle dropped");
            }
        });

        // a new session replaces the previous one
        if let Some(previous) = self.session.lock().replace(reply.clone()) {
            previous.close();
        }

        self.exec(method, &[], reply.clone())?;
        Ok(ScanSession::new(reply, receiver))
    }

    /// End the current scan session, succeeds even when no session is open
    ///
    /// Once native confirms, the session handle stops receiving events
    pub async fn end_session(&self) -> Result<()> {
        self.require_mode(Method::EndSession, BridgeMode::ScanSession)?;
        self.call(Method::EndSession, &[]).await?;

        if let Some(session) = self.session.lock().take() {
            session.close();
        }

        Ok(())
    }

    /// Only tags carrying one of these mime types produce listener events
    pub async fn set_mime_type_filter(&self, mime_types: &[String]) -> Result<()> {
        let method = Method::SetMimeTypeFilter;
        if !self.config.mode.is_listener() {
            return Err(self.unsupported(method));
        }

        let args = [serde_json::to_value(mime_types)?];
        self.call(method, &args).await.map(drop)
    }
}

// private
impl NfcBridge {
    fn register_listener(&self, method: NativeMethod, reply: Arc<NativeReply>) -> Result<()> {
        self.exec(method, &[], reply.clone())?;
        self.listeners.lock().push(reply);
        Ok(())
    }

    fn exec(&self, method: NativeMethod, args: &[Value], reply: Arc<NativeReply>) -> Result<()> {
        let call = NativeCall::new(&self.config.service, method, args)?;
        debug!("exec {}.{} {}", call.service, call.method, call.args);

        self.native.exec(call, reply);
        Ok(())
    }

    /// One-shot call, resolves with the raw payload or the native error
    async fn call(&self, method: NativeMethod, args: &[Value]) -> Result<String> {
        let (reply, receiver) = NativeReply::once(method);
        self.exec(method, args, reply)?;

        match receiver.await {
            Ok(Ok(payload)) => Ok(payload),
            Ok(Err(message)) => {
                debug!("{method} failed: {message}");
                Err(BridgeError::Native(message))
            }
            Err(_) => Err(BridgeError::ReplyDropped { method }),
        }
    }

    async fn call_decode<T: DeserializeOwned>(&self, method: NativeMethod, args: &[Value]) -> Result<T> {
        let payload = self.call(method, args).await?;
        decode(method, &payload)
    }

    fn require_mode(&self, method: NativeMethod, mode: BridgeMode) -> Result<()> {
        if self.config.mode == mode {
            return Ok(());
        }

        Err(self.unsupported(method))
    }

    fn unsupported(&self, method: NativeMethod) -> BridgeError {
        BridgeError::Unsupported {
            method,
            mode: self.config.mode,
        }
    }
}

impl std::fmt::Debug for NfcBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NfcBridge")
            .field("config", &self.config)
            .field("initialized", &self.is_initialized())
            .field("listeners", &self.listeners.lock().len())
            .field("session_open", &self.session.lock().as_ref().is_some_and(|s| s.is_open()))
            .finish()
    }
}

fn decode<T: DeserializeOwned>(method: NativeMethod, payload: &str) -> Result<T> {
    let payload = match payload.trim() {
        "" => "null",
        payload => payload,
    };

    serde_json::from_str(payload).map_err(|error| BridgeError::malformed(method, error))
}

/// Accepts a JSON string or the bare status name
fn decode_status(payload: &str) -> Option<NfcStatus> {
    serde_json::from_str(payload)
        .ok()
        .or_else(|| NfcStatus::from_str(payload.trim()).ok())
}

fn decode_tag(method: NativeMethod, payload: &str) -> Result<Tag> {
    WireTag::from_json(payload).for_method(method).map(Tag::from)
}

fn tag_event(method: NativeMethod, result: ReplyResult) -> Option<BridgeEvent> {
    let payload = match result {
        Ok(payload) => payload,
        Err(message) => {
            warn!("{method} listener reported an error: {message}");
            return None;
        }
    };

    let tag = match decode_tag(method, &payload) {
        Ok(tag) => tag,
        Err(error) => {
            warn!("dropping tag event: {error}");
            return None;
        }
    };

    match method {
        Method::SetNdefListener => Some(BridgeEvent::Ndef { tag }),
        _ => Some(BridgeEvent::Tag { tag }),
    }
}

fn state_change(result: ReplyResult) -> Option<NfcStatus> {
    match result {
        Ok(payload) => decode_status(&payload)
            .tap_none(|| warn!("dropping state change event, unknown status {payload:?}")),
        Err(message) => {
            warn!("state change listener reported an error: {message}");
            None
        }
    }
}

fn session_event(result: ReplyResult) -> SessionEvent {
    match result.map(|payload| decode_tag(Method::BeginScanSession, &payload)) {
        Ok(Ok(tag)) => SessionEvent::Tag { tag },
        Ok(Err(error)) => SessionEvent::Error {
            message: error.to_string(),
        },
        Err(message) => SessionEvent::Error { message },
    }
}
