use serde::{Deserialize, Serialize};

/// NFC availability as reported by the native layer
#[derive(
    Debug,
    Copy,
    Clone,
    Hash,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
    uniffi::Enum,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum NfcStatus {
    /// Device has no NFC hardware
    NoNfc,
    NfcOk,
    NfcDisabled,
}

impl NfcStatus {
    pub fn is_enabled(&self) -> bool {
        matches!(self, NfcStatus::NfcOk)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr as _;

    use super::*;

    #[test]
    fn test_wire_names() {
        assert_eq!(serde_json::to_string(&NfcStatus::NoNfc).unwrap(), "\"NO_NFC\"");
        assert_eq!(NfcStatus::NfcDisabled.to_string(), "NFC_DISABLED");
        assert_eq!(NfcStatus::from_str("NFC_OK").unwrap(), NfcStatus::NfcOk);
        assert!(serde_json::from_str::<NfcStatus>("\"NFC_ON\"").is_err());
    }
}
