//! In-process stand-in for the native NFC plugin
//!
//! Answers every native method the way a phone would, tags are brought into
//! the field with [`SimulatedPlatform::present_tag`]. Used by the tests and
//! by hosts running without NFC hardware.

pub mod tag;

use std::sync::Arc;

use ndef_macros::impl_default_for;
use ndef_types::{NdefRecord, NfcStatus, WireRecord, WireTag, format_tag_serial};
use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    config::DEFAULT_SERVICE,
    native::{NativeCall, NativeMethod, NativePlugin, NativeReply, ReplyResult},
    session::{SessionMachine, SessionState, SessionTrigger},
};

pub use tag::SimTag;

pub const NOT_WRITABLE: &str = "NDEF tag is not writable.";
pub const NOT_NDEF: &str = "This tag does not support NDEF.";
pub const TAG_LOST: &str = "Failed to write NDEF: Tag was lost.";
pub const WRITE_CANCELLED: &str = "Write cancelled, the session ended.";
const NFC_UNAVAILABLE: &str = "NFC is not available.";
const INVALID_WRITE_DATA: &str = "Invalid JSON data provided for writing.";
const INVALID_MIME_FILTER: &str = "Invalid mime type filter.";

/// Work collected under the lock, carried out once it is released
#[derive(Debug)]
enum Delivery {
    Answer(Arc<NativeReply>, ReplyResult),
    Close(Arc<NativeReply>),
}

type Outbox = Vec<Delivery>;

#[derive(Debug, Clone)]
pub struct SimulatedPlatform(Arc<Mutex<Platform>>);

#[derive(Debug)]
struct Platform {
    service: String,
    hardware: bool,
    enabled: bool,
    /// Last status the state change listener saw
    reported_status: NfcStatus,
    permission_granted: bool,
    settings_opened: u32,

    /// Tags reach the listener only after `beginNfc` or `startNfcMonitoring`
    dispatching: bool,
    mime_filter: Vec<String>,
    launch_tag: Option<SimTag>,

    /// Tag currently in range
    field: Option<SimTag>,

    session: SessionMachine,
    session_reply: Option<Arc<NativeReply>>,
    pending_write: Option<(Vec<NdefRecord>, Arc<NativeReply>)>,

    tag_listener: Option<Arc<NativeReply>>,
    state_listener: Option<Arc<NativeReply>>,
    calls: Vec<NativeMethod>,
}

impl_default_for!(SimulatedPlatform);

impl SimulatedPlatform {
    /// A phone with NFC hardware switched on and permission granted
    pub fn new() -> Self {
        Self(Arc::new(Mutex::new(Platform::new())))
    }

    pub fn without_hardware(self) -> Self {
        self.configure(|platform| {
            platform.hardware = false;
            platform.enabled = false;
        })
    }

    pub fn with_nfc_disabled(self) -> Self {
        self.configure(|platform| platform.enabled = false)
    }

    pub fn with_permission_denied(self) -> Self {
        self.configure(|platform| platform.permission_granted = false)
    }

    pub fn with_service(self, service: impl Into<String>) -> Self {
        let service = service.into();
        self.configure(|platform| platform.service = service)
    }

    /// The tag that launched the app, replayed by `handleLaunchNfcIntent`
    pub fn with_launch_tag(self, tag: SimTag) -> Self {
        self.configure(|platform| platform.launch_tag = Some(tag))
    }

    fn configure(self, configure: impl FnOnce(&mut Platform)) -> Self {
        {
            let mut platform = self.0.lock();
            configure(&mut platform);
            platform.reported_status = platform.status();
        }

        self
    }

    /// Bring a tag into range
    pub fn present_tag(&self, tag: SimTag) {
        let outbox = self.0.lock().present_tag(tag);
        deliver(outbox);
    }

    /// Take the tag out of range, an open session keeps its state
    pub fn remove_tag(&self) -> Option<SimTag> {
        self.0.lock().field.take()
    }

    /// The OS closed the session, e.g. a timeout or the user cancelled the sheet
    pub fn close_session_externally(&self, message: impl Into<String>) {
        let outbox = self.0.lock().close_session_externally(message.into());
        deliver(outbox);
    }

    /// Switch NFC on or off in the system settings
    pub fn set_enabled(&self, enabled: bool) {
        let outbox = self.0.lock().set_enabled(enabled);
        deliver(outbox);
    }

    pub fn set_permission(&self, granted: bool) {
        self.0.lock().permission_granted = granted;
    }

    pub fn status(&self) -> NfcStatus {
        self.0.lock().status()
    }

    pub fn session_state(&self) -> SessionState {
        self.0.lock().session.state()
    }

    /// The tag in range, including anything written to it
    pub fn field(&self) -> Option<SimTag> {
        self.0.lock().field.clone()
    }

    pub fn mime_filter(&self) -> Vec<String> {
        self.0.lock().mime_filter.clone()
    }

    pub fn settings_opened(&self) -> u32 {
        self.0.lock().settings_opened
    }

    /// Every native method called so far, in order
    pub fn calls(&self) -> Vec<NativeMethod> {
        self.0.lock().calls.clone()
    }
}

impl NativePlugin for SimulatedPlatform {
    fn exec(&self, call: NativeCall, reply: Arc<NativeReply>) {
        let outbox = self.0.lock().exec(call, reply);
        deliver(outbox);
    }
}

fn deliver(outbox: Outbox) {
    for delivery in outbox {
        match delivery {
            Delivery::Answer(reply, Ok(payload)) => reply.success(payload),
            Delivery::Answer(reply, Err(message)) => reply.error(message),
            Delivery::Close(reply) => reply.close(),
        }
    }
}

fn answer(reply: Arc<NativeReply>, result: ReplyResult) -> Outbox {
    vec![Delivery::Answer(reply, result)]
}

fn status_payload(status: NfcStatus) -> ReplyResult {
    serde_json::to_string(&status).map_err(|error| error.to_string())
}

fn tag_payload(tag: &SimTag) -> ReplyResult {
    serde_json::to_string(&WireTag::from(&tag.tag())).map_err(|error| error.to_string())
}

impl Platform {
    fn new() -> Self {
        Self {
            service: DEFAULT_SERVICE.to_string(),
            hardware: true,
            enabled: true,
            reported_status: NfcStatus::NfcOk,
            permission_granted: true,
            settings_opened: 0,
            dispatching: false,
            mime_filter: Vec::new(),
            launch_tag: None,
            field: None,
            session: SessionMachine::new(),
            session_reply: None,
            pending_write: None,
            tag_listener: None,
            state_listener: None,
            calls: Vec::new(),
        }
    }

    fn status(&self) -> NfcStatus {
        match (self.hardware, self.enabled) {
            (false, _) => NfcStatus::NoNfc,
            (true, false) => NfcStatus::NfcDisabled,
            (true, true) => NfcStatus::NfcOk,
        }
    }

    fn exec(&mut self, call: NativeCall, reply: Arc<NativeReply>) -> Outbox {
        use NativeMethod as M;

        if call.service != self.service {
            return answer(reply, Err(format!("Class not found: {}", call.service)));
        }

        let Some(method) = call.native_method() else {
            return answer(reply, Err(format!("Invalid action: {}", call.method)));
        };

        let args = match call.args_value() {
            Ok(args) => args,
            Err(error) => return answer(reply, Err(format!("Invalid arguments: {error}"))),
        };

        debug!("simulating {method}");
        self.calls.push(method);

        match method {
            M::Status => answer(reply, status_payload(self.status())),

            M::AskForPermission => {
                let granted = if self.permission_granted { "1" } else { "0" };
                answer(reply, Ok(granted.to_string()))
            }

            M::ShowSettings => {
                self.settings_opened += 1;
                answer(reply, Ok(String::new()))
            }

            M::SetMimeTypeFilter => self.set_mime_type_filter(args, reply),

            M::SetTagListener | M::SetNdefListener => {
                self.tag_listener = Some(reply);
                Outbox::new()
            }

            M::SetStateChangeListener => {
                self.state_listener = Some(reply);
                Outbox::new()
            }

            M::BeginNfc | M::StartNfcMonitoring => {
                self.dispatching = true;
                Outbox::new()
            }

            M::HandleLaunchNfcIntent => match self.launch_tag.take() {
                Some(tag) => {
                    info!("replaying launch tag {}", format_tag_serial(&tag.uid));
                    self.field = Some(tag.clone());
                    self.notify_listener(&tag)
                }
                None => Outbox::new(),
            },

            M::BeginScanSession => self.begin_session(reply),
            M::Write => self.write(args, reply),
            M::EndSession => self.end_session(reply),
        }
    }

    fn set_mime_type_filter(&mut self, args: Vec<Value>, reply: Arc<NativeReply>) -> Outbox {
        let filter = args.into_iter().next().map(serde_json::from_value::<Vec<String>>);

        match filter {
            Some(Ok(filter)) => {
                self.mime_filter = filter;
                answer(reply, Ok(String::new()))
            }
            _ => answer(reply, Err(INVALID_MIME_FILTER.to_string())),
        }
    }

    fn begin_session(&mut self, reply: Arc<NativeReply>) -> Outbox {
        if !self.status().is_enabled() {
            return answer(reply, Err(NFC_UNAVAILABLE.to_string()));
        }

        let mut outbox = self.cancel_pending_write();
        outbox.extend(self.close_session_reply());

        self.apply(SessionTrigger::Begin);
        self.session_reply = Some(reply);

        outbox
    }

    fn write(&mut self, args: Vec<Value>, reply: Arc<NativeReply>) -> Outbox {
        let records = match args.into_iter().next().map(WireRecord::list_from_json) {
            Some(Ok(records)) => records.into_iter().map(NdefRecord::from).collect::<Vec<_>>(),
            _ => return answer(reply, Err(INVALID_WRITE_DATA.to_string())),
        };

        match self.apply(SessionTrigger::WriteRequested) {
            // tag from the current session is still connected, reuse it
            Some(SessionState::Writing) => self.finish_write(&records, reply),

            Some(_) => {
                debug!("no tag in range, write waits for the next tag");
                let outbox = self.cancel_pending_write();
                self.pending_write = Some((records, reply));
                outbox
            }

            None => answer(reply, Err("A write is already in progress.".to_string())),
        }
    }

    fn finish_write(&mut self, records: &[NdefRecord], reply: Arc<NativeReply>) -> Outbox {
        let result = self.write_to_field(records);
        if let Err(message) = &result {
            warn!("write failed: {message}");
        }

        self.apply(SessionTrigger::WriteFinished);

        let mut outbox = answer(reply, result);
        outbox.extend(self.close_session_reply());
        outbox
    }

    fn write_to_field(&mut self, records: &[NdefRecord]) -> ReplyResult {
        let Some(target) = self.field.as_mut() else {
            return Err(TAG_LOST.to_string());
        };

        if !target.ndef {
            return Err(NOT_NDEF.to_string());
        }

        if !target.writable {
            return Err(NOT_WRITABLE.to_string());
        }

        let size = tag::message_len(records);
        if size > target.capacity {
            return Err(format!(
                "Failed to write NDEF: message is {size} bytes, tag capacity is {} bytes.",
                target.capacity
            ));
        }

        info!("wrote {} records to {}", records.len(), format_tag_serial(&target.uid));
        target.records = records.to_vec();

        Ok(String::new())
    }

    fn end_session(&mut self, reply: Arc<NativeReply>) -> Outbox {
        self.apply(SessionTrigger::End);

        let mut outbox = self.cancel_pending_write();
        outbox.extend(self.close_session_reply());
        outbox.extend(answer(reply, Ok(String::new())));
        outbox
    }

    fn present_tag(&mut self, tag: SimTag) -> Outbox {
        if !self.status().is_enabled() {
            debug!("nfc is off, ignoring tag {}", format_tag_serial(&tag.uid));
            return Outbox::new();
        }

        info!("tag {} entered the field", format_tag_serial(&tag.uid));
        self.field = Some(tag.clone());

        let mut outbox = Outbox::new();
        if self.dispatching {
            outbox.extend(self.notify_listener(&tag));
        }

        if !self.session.state().is_active() {
            return outbox;
        }

        match self.apply(SessionTrigger::TagDetected) {
            Some(SessionState::Writing) => {
                if let Some((records, reply)) = self.pending_write.take() {
                    outbox.extend(self.finish_write(&records, reply));
                }
            }

            Some(_) if !tag.ndef => {
                outbox.extend(self.close_session_externally(NOT_NDEF.to_string()));
            }

            Some(_) => {
                if let Some(reply) = &self.session_reply {
                    outbox.push(Delivery::Answer(reply.clone(), tag_payload(&tag)));
                }
            }

            None => {}
        }

        outbox
    }

    fn notify_listener(&self, tag: &SimTag) -> Outbox {
        let Some(listener) = &self.tag_listener else {
            debug!("no tag listener registered");
            return Outbox::new();
        };

        if !tag.matches_mime_filter(&self.mime_filter) {
            debug!("tag {} filtered out by mime type", format_tag_serial(&tag.uid));
            return Outbox::new();
        }

        answer(listener.clone(), tag_payload(tag))
    }

    fn close_session_externally(&mut self, message: String) -> Outbox {
        if !self.session.state().is_active() {
            debug!("no active session to close");
            return Outbox::new();
        }

        info!("session closed externally: {message}");
        self.apply(SessionTrigger::ClosedExternally);

        let mut outbox = Outbox::new();
        if let Some((_, reply)) = self.pending_write.take() {
            outbox.push(Delivery::Answer(reply, Err(message.clone())));
        }

        if let Some(reply) = &self.session_reply {
            outbox.push(Delivery::Answer(reply.clone(), Err(message)));
        }

        outbox.extend(self.close_session_reply());
        outbox
    }

    fn set_enabled(&mut self, enabled: bool) -> Outbox {
        if !self.hardware {
            warn!("no nfc hardware, cannot change the enabled state");
            return Outbox::new();
        }

        self.enabled = enabled;

        let status = self.status();
        if status == self.reported_status {
            return Outbox::new();
        }

        self.reported_status = status;
        match &self.state_listener {
            Some(listener) => answer(listener.clone(), status_payload(status)),
            None => Outbox::new(),
        }
    }

    fn cancel_pending_write(&mut self) -> Outbox {
        match self.pending_write.take() {
            Some((_, reply)) => answer(reply, Err(WRITE_CANCELLED.to_string())),
            None => Outbox::new(),
        }
    }

    fn close_session_reply(&mut self) -> Outbox {
        self.session_reply.take().map(Delivery::Close).into_iter().collect()
    }

    fn apply(&mut self, trigger: SessionTrigger) -> Option<SessionState> {
        match self.session.apply(trigger) {
            Ok(state) => Some(state),
            Err(error) => {
                warn!("{error}");
                None
            }
        }
    }
}
