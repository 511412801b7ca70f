//! What Kotlin and Swift hosts see of the bridge

use std::sync::Arc;

use derive_more::{Deref, From};
use ndef_types::{NdefRecord, NfcStatus, Tag};
use tracing::debug;

use crate::{
    bridge::NfcBridge,
    config::BridgeConfig,
    error::BridgeError,
    event::BridgeEvent,
    native::NativePlugin,
    session::SessionEvent,
    simulator::SimulatedPlatform,
};

#[uniffi::export(callback_interface)]
pub trait BridgeEventListener: Send + Sync + std::fmt::Debug + 'static {
    fn on_event(&self, event: BridgeEvent);
}

#[uniffi::export(callback_interface)]
pub trait ScanSessionHandler: Send + Sync + std::fmt::Debug + 'static {
    fn on_tag(&self, tag: Tag);

    /// The session failed or was closed externally, the message is the native one
    fn on_error(&self, message: String);
}

#[derive(Debug, Deref, From, uniffi::Object)]
pub struct FfiNfcBridge(Arc<NfcBridge>);

#[uniffi::export(async_runtime = "tokio")]
impl FfiNfcBridge {
    #[uniffi::constructor]
    pub fn new(native: Box<dyn NativePlugin>, config: BridgeConfig) -> Arc<Self> {
        Arc::new(Self(Arc::new(NfcBridge::new(native, config))))
    }

    /// Bridge backed by the simulated platform, for hosts without NFC hardware
    #[uniffi::constructor]
    pub fn simulated(config: BridgeConfig) -> Arc<Self> {
        Self::new(Box::new(SimulatedPlatform::new()), config)
    }

    pub fn config(&self) -> BridgeConfig {
        self.0.config().clone()
    }

    /// Forward every bridge event to `listener`, on its own thread
    pub fn add_listener(&self, listener: Box<dyn BridgeEventListener>) {
        let events = self.0.subscribe();

        std::thread::spawn(move || {
            while let Ok(event) = events.recv() {
                listener.on_event(event);
            }
        });
    }

    pub fn initialize(&self) -> Result<(), BridgeError> {
        self.0.initialize()
    }

    pub async fn device_ready(&self) -> Result<(), BridgeError> {
        self.0.device_ready().await
    }

    pub fn shutdown(&self) {
        self.0.shutdown()
    }

    pub async fn status(&self) -> Result<NfcStatus, BridgeError> {
        self.0.status().await
    }

    pub async fn ask_for_permission(&self) -> Result<bool, BridgeError> {
        self.0.ask_for_permission().await
    }

    pub async fn show_settings(&self) -> Result<(), BridgeError> {
        self.0.show_settings().await
    }

    pub async fn write(&self, records: Vec<NdefRecord>) -> Result<(), BridgeError> {
        self.0.write(&records).await
    }

    /// Start a scan session, tags and errors go to `handler` until the session closes
    pub fn begin_scan_session(
        &self,
        handler: Box<dyn ScanSessionHandler>,
    ) -> Result<(), BridgeError> {
        let session = self.0.begin_scan_session()?;

        std::thread::spawn(move || {
            while let Some(event) = session.wait_next_event() {
                match event {
                    SessionEvent::Tag { tag } => handler.on_tag(tag),
                    SessionEvent::Error { message } => handler.on_error(message),
                }
            }

            debug!("scan session closed, handler released");
        });

        Ok(())
    }

    pub async fn end_session(&self) -> Result<(), BridgeError> {
        self.0.end_session().await
    }

    pub async fn set_mime_type_filter(&self, mime_types: Vec<String>) -> Result<(), BridgeError> {
        self.0.set_mime_type_filter(&mime_types).await
    }
}

#[uniffi::export]
fn init_logging() {
    crate::logging::init();
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use flume::{Receiver, RecvTimeoutError, Sender};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        config::BridgeMode,
        native::{NativeMethod, recording::RecordingPlugin},
        simulator::{NOT_WRITABLE, SimTag},
    };

    const TIMEOUT: Duration = Duration::from_secs(2);

    #[derive(Debug)]
    struct ChannelListener(Sender<BridgeEvent>);

    impl BridgeEventListener for ChannelListener {
        fn on_event(&self, event: BridgeEvent) {
            let _ = self.0.send(event);
        }
    }

    #[derive(Debug)]
    struct ChannelHandler(Sender<Result<Tag, String>>);

    impl ScanSessionHandler for ChannelHandler {
        fn on_tag(&self, tag: Tag) {
            let _ = self.0.send(Ok(tag));
        }

        fn on_error(&self, message: String) {
            let _ = self.0.send(Err(message));
        }
    }

    fn ffi_bridge(platform: &SimulatedPlatform, mode: BridgeMode) -> FfiNfcBridge {
        let bridge = NfcBridge::new(Box::new(platform.clone()), BridgeConfig::new(mode));
        FfiNfcBridge::from(Arc::new(bridge))
    }

    fn next<T>(receiver: &Receiver<T>) -> T {
        receiver.recv_timeout(TIMEOUT).expect("callback within timeout")
    }

    #[tokio::test]
    async fn test_listener_receives_events_in_order() {
        let launch = SimTag::new([4, 2], vec![NdefRecord::mime("text/plain", b"hi".to_vec())]);
        let platform = SimulatedPlatform::new().with_launch_tag(launch.clone());
        let bridge = ffi_bridge(&platform, BridgeMode::TagListener);

        let (sender, receiver) = flume::unbounded();
        bridge.add_listener(Box::new(ChannelListener(sender)));
        bridge.device_ready().await.unwrap();

        assert_eq!(next(&receiver), BridgeEvent::DeviceReady);
        assert_eq!(next(&receiver), BridgeEvent::Tag { tag: launch.tag() });
    }

    #[tokio::test]
    async fn test_scan_session_handler() {
        let platform = SimulatedPlatform::new();
        let bridge = ffi_bridge(&platform, BridgeMode::ScanSession);

        let (sender, receiver) = flume::unbounded();
        bridge.begin_scan_session(Box::new(ChannelHandler(sender))).unwrap();

        let tag = SimTag::blank([1, 2, 3]).read_only();
        platform.present_tag(tag.clone());
        assert_eq!(next(&receiver), Ok(tag.tag()));

        let error = bridge.write(vec![NdefRecord::empty()]).await.unwrap_err();
        assert_eq!(error.to_string(), NOT_WRITABLE);

        // the failed write closed the session, so the pump thread lets go of the handler
        assert!(receiver.recv_timeout(TIMEOUT).is_err());
    }

    #[tokio::test]
    async fn test_end_session_releases_handler() {
        let native = RecordingPlugin::new();
        native.answer(NativeMethod::EndSession, Ok(String::new()));

        let bridge = NfcBridge::new(Box::new(native.clone()), BridgeConfig::new(BridgeMode::ScanSession));
        let bridge = FfiNfcBridge::from(Arc::new(bridge));

        let (sender, receiver) = flume::unbounded();
        bridge.begin_scan_session(Box::new(ChannelHandler(sender))).unwrap();
        bridge.end_session().await.unwrap();

        // the pump thread exits and drops the handler with its sender
        assert!(matches!(
            receiver.recv_timeout(TIMEOUT),
            Err(RecvTimeoutError::Disconnected)
        ));
    }

    #[test]
    fn test_host_can_close_session_reply() {
        let native = RecordingPlugin::new();
        let bridge = NfcBridge::new(Box::new(native.clone()), BridgeConfig::new(BridgeMode::ScanSession));
        let bridge = FfiNfcBridge::from(Arc::new(bridge));

        let (sender, receiver) = flume::unbounded();
        bridge.begin_scan_session(Box::new(ChannelHandler(sender))).unwrap();

        let reply = native.last_reply(NativeMethod::BeginScanSession).unwrap();
        reply.error("Session invalidated".into());
        reply.close();

        assert_eq!(next(&receiver), Err("Session invalidated".to_string()));
        assert!(matches!(
            receiver.recv_timeout(TIMEOUT),
            Err(RecvTimeoutError::Disconnected)
        ));
    }

    #[tokio::test]
    async fn test_simulated_bridge() {
        let bridge = FfiNfcBridge::simulated(BridgeConfig::default());
        assert_eq!(bridge.status().await.unwrap(), NfcStatus::NfcOk);
        assert!(bridge.ask_for_permission().await.unwrap());
        assert_eq!(bridge.config(), BridgeConfig::default());
    }
}
