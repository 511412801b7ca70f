pub mod bridge;
pub mod config;
pub mod error;
pub mod event;
pub mod ffi;
pub mod native;
pub mod session;
pub mod simulator;

pub(crate) mod logging;

pub use bridge::NfcBridge;
pub use config::{BridgeConfig, BridgeMode};
pub use error::BridgeError;
pub use event::{BridgeEvent, EventBus};
pub use native::{NativeCall, NativeMethod, NativePlugin, NativeReply};
pub use session::{ScanSession, SessionEvent, SessionState};
pub use simulator::{SimTag, SimulatedPlatform};

pub use ndef_types::{NdefRecord, NfcStatus, Tag, Tnf};

uniffi::setup_scaffolding!();
