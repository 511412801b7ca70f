use crate::Tnf;

const SHORT_RECORD_MAX_PAYLOAD: usize = u8::MAX as usize;

/// One record of an NDEF message, with raw byte fields
#[derive(Debug, Clone, PartialEq, Eq, Hash, uniffi::Record)]
pub struct NdefRecord {
    /// May be empty, never absent
    pub id: Vec<u8>,
    pub tnf: Tnf,
    /// Only meaningful when `tnf` is [`Tnf::Media`]
    pub mime_type: Option<String>,
    /// May be empty, never absent
    pub payload: Vec<u8>,
}

impl NdefRecord {
    pub fn new(
        tnf: Tnf,
        mime_type: Option<String>,
        id: impl Into<Vec<u8>>,
        payload: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            id: id.into(),
            tnf,
            mime_type,
            payload: payload.into(),
        }
    }

    /// A media record without an id
    pub fn mime(mime_type: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self::new(Tnf::Media, Some(mime_type.into()), crate::unset(), payload)
    }

    pub fn empty() -> Self {
        Self::new(Tnf::Empty, None, crate::unset(), crate::unset())
    }

    /// The type field as written to the tag, the utf-8 bytes of the mime type
    pub fn type_bytes(&self) -> &[u8] {
        self.mime_type.as_deref().map(str::as_bytes).unwrap_or_default()
    }

    pub fn is_short_record(&self) -> bool {
        self.payload.len() <= SHORT_RECORD_MAX_PAYLOAD
    }

    /// Number of bytes this record takes up inside an NDEF message
    pub fn encoded_len(&self) -> usize {
        // header byte and type length
        let mut len = 2;

        len += if self.is_short_record() { 1 } else { 4 };

        if !self.id.is_empty() {
            len += 1;
        }

        len + self.type_bytes().len() + self.id.len() + self.payload.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoded_len_short_record() {
        let record = NdefRecord::mime("text/plain", b"Hello".to_vec());
        // header, type len, payload len, "text/plain", "Hello"
        assert_eq!(record.encoded_len(), 3 + 10 + 5);
    }

    #[test]
    fn test_encoded_len_with_id_and_long_payload() {
        let record = NdefRecord::new(Tnf::Unknown, None, vec![1, 2, 3], vec![0; 300]);
        assert!(!record.is_short_record());
        assert_eq!(record.encoded_len(), 2 + 4 + 1 + 3 + 300);
    }

    #[test]
    fn test_empty_record() {
        let record = NdefRecord::empty();
        assert_eq!(record.tnf, Tnf::Empty);
        assert!(record.id.is_empty());
        assert!(record.payload.is_empty());
        assert_eq!(record.type_bytes(), b"");
        assert_eq!(record.encoded_len(), 3);
    }
}
