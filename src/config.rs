//! Bridge configuration
//!
//! Hosts pass a [`BridgeConfig`] when creating the bridge, either built in
//! code, parsed from JSON or read from the environment.

use std::{str::FromStr, time::Duration};

use ndef_macros::display_as_str;
use serde::{Deserialize, Serialize};

use crate::native::NativeMethod;

pub const DEFAULT_SERVICE: &str = "NfcPlugin";

const ENV_MODE: &str = "NDEF_BRIDGE_MODE";
const ENV_SERVICE: &str = "NDEF_BRIDGE_SERVICE";
const ENV_LAUNCH_DELAY: &str = "NDEF_BRIDGE_LAUNCH_DELAY_MS";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, uniffi::Error)]
#[uniffi(flat_error)]
pub enum ConfigError {
    #[error("unable to parse config: {0}")]
    Parse(String),

    #[error("unknown bridge mode {0:?}, expected scan-session, tag-listener or ndef-listener")]
    UnknownMode(String),

    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

/// How tags reach the application, the variants are mutually exclusive
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, Default, Serialize, Deserialize, uniffi::Enum)]
#[serde(rename_all = "kebab-case")]
pub enum BridgeMode {
    /// Tags are delivered to the callbacks of an explicit scan session
    ScanSession,

    /// A persistent tag listener dispatches `ndef-tag` events
    #[default]
    TagListener,

    /// A persistent ndef listener dispatches `ndef` events
    NdefListener,
}

impl BridgeMode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            BridgeMode::ScanSession => "scan-session",
            BridgeMode::TagListener => "tag-listener",
            BridgeMode::NdefListener => "ndef-listener",
        }
    }

    pub const fn is_listener(&self) -> bool {
        !matches!(self, BridgeMode::ScanSession)
    }

    /// The persistent native listener carrying tags, none in session mode
    pub const fn tag_listener_method(&self) -> Option<NativeMethod> {
        match self {
            BridgeMode::ScanSession => None,
            BridgeMode::TagListener => Some(NativeMethod::SetTagListener),
            BridgeMode::NdefListener => Some(NativeMethod::SetNdefListener),
        }
    }
}

display_as_str!(BridgeMode);

impl FromStr for BridgeMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "scan-session" | "session" => Ok(BridgeMode::ScanSession),
            "tag-listener" | "tag" => Ok(BridgeMode::TagListener),
            "ndef-listener" | "ndef" => Ok(BridgeMode::NdefListener),
            _ => Err(ConfigError::UnknownMode(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, uniffi::Record)]
#[serde(rename_all = "camelCase", default)]
pub struct BridgeConfig {
    /// Name of the native plugin every call is addressed to
    pub service: String,
    pub mode: BridgeMode,
    /// Extra wait after the application is ready, before the launch intent is replayed
    pub launch_intent_delay_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            service: DEFAULT_SERVICE.to_string(),
            mode: BridgeMode::default(),
            launch_intent_delay_ms: 0,
        }
    }
}

impl BridgeConfig {
    pub fn new(mode: BridgeMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|error| ConfigError::Parse(error.to_string()))
    }

    /// Default config with overrides from `NDEF_BRIDGE_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(mode) = lookup(ENV_MODE) {
            config.mode = mode.parse()?;
        }

        if let Some(service) = lookup(ENV_SERVICE) {
            if service.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: ENV_SERVICE,
                    value: service,
                });
            }

            config.service = service;
        }

        if let Some(delay) = lookup(ENV_LAUNCH_DELAY) {
            config.launch_intent_delay_ms = delay
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue {
                    key: ENV_LAUNCH_DELAY,
                    value: delay,
                })?;
        }

        Ok(config)
    }

    pub fn launch_intent_delay(&self) -> Duration {
        Duration::from_millis(self.launch_intent_delay_ms)
    }
}

mod ffi {
    use super::*;

    #[uniffi::export]
    fn bridge_config_default() -> BridgeConfig {
        BridgeConfig::default()
    }

    #[uniffi::export]
    fn bridge_config_from_json(json: String) -> Result<BridgeConfig, ConfigError> {
        BridgeConfig::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::default();
        assert_eq!(config.service, "NfcPlugin");
        assert_eq!(config.mode, BridgeMode::TagListener);
        assert_eq!(config.launch_intent_delay(), Duration::ZERO);
    }

    #[test]
    fn test_from_json_fills_missing_fields() {
        let config = BridgeConfig::from_json(r#"{"mode": "scan-session"}"#).unwrap();
        assert_eq!(config.mode, BridgeMode::ScanSession);
        assert_eq!(config.service, DEFAULT_SERVICE);

        let config =
            BridgeConfig::from_json(r#"{"service": "Nfc", "launchIntentDelayMs": 25}"#).unwrap();
        assert_eq!(config.service, "Nfc");
        assert_eq!(config.launch_intent_delay_ms, 25);

        assert!(BridgeConfig::from_json(r#"{"mode": "polling"}"#).is_err());
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("scan_session".parse::<BridgeMode>().unwrap(), BridgeMode::ScanSession);
        assert_eq!("NDEF-LISTENER".parse::<BridgeMode>().unwrap(), BridgeMode::NdefListener);
        assert_eq!("tag".parse::<BridgeMode>().unwrap(), BridgeMode::TagListener);
        assert!(matches!(
            "hce".parse::<BridgeMode>(),
            Err(ConfigError::UnknownMode(_))
        ));
    }

    #[test]
    fn test_from_lookup_overrides() {
        let env = HashMap::from([
            (ENV_MODE, "ndef-listener"),
            (ENV_SERVICE, "CustomNfc"),
            (ENV_LAUNCH_DELAY, "10"),
        ]);

        let config = BridgeConfig::from_lookup(|key| env.get(key).map(|v| v.to_string())).unwrap();
        assert_eq!(config.mode, BridgeMode::NdefListener);
        assert_eq!(config.service, "CustomNfc");
        assert_eq!(config.launch_intent_delay_ms, 10);
    }

    #[test]
    fn test_from_lookup_rejects_bad_delay() {
        let error = BridgeConfig::from_lookup(|key| {
            (key == ENV_LAUNCH_DELAY).then(|| "soon".to_string())
        })
        .unwrap_err();

        assert_eq!(
            error,
            ConfigError::InvalidValue {
                key: ENV_LAUNCH_DELAY,
                value: "soon".to_string()
            }
        );
    }
}
