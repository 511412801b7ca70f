use crate::NdefRecord;

/// A detected NFC tag and the NDEF records it carries, in on-tag order
#[derive(Debug, Clone, PartialEq, Eq, Hash, uniffi::Record)]
pub struct Tag {
    pub tag_serial: String,
    pub ndef_records: Vec<NdefRecord>,
}

impl Tag {
    pub fn new(tag_serial: impl Into<String>, ndef_records: Vec<NdefRecord>) -> Self {
        Self {
            tag_serial: tag_serial.into(),
            ndef_records,
        }
    }

    pub fn from_uid(uid: &[u8], ndef_records: Vec<NdefRecord>) -> Self {
        Self::new(format_tag_serial(uid), ndef_records)
    }

    pub fn mime_types(&self) -> impl Iterator<Item = &str> {
        self.ndef_records
            .iter()
            .filter_map(|record| record.mime_type.as_deref())
    }
}

/// Formats a tag uid as colon separated upper-case hex, `04:A2:1F`
pub fn format_tag_serial(uid: &[u8]) -> String {
    uid.iter()
        .map(|byte| hex::encode_upper([*byte]))
        .collect::<Vec<_>>()
        .join(":")
}
