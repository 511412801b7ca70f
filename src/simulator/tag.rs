use ndef_types::{NdefRecord, Tag};

/// Default capacity, an NTAG215 user memory area
pub const DEFAULT_CAPACITY: usize = 504;

/// A physical tag that can be brought into the simulated field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimTag {
    pub uid: Vec<u8>,
    pub records: Vec<NdefRecord>,
    pub writable: bool,
    /// Bytes available for the NDEF message
    pub capacity: usize,
    /// Tags without NDEF support can be detected but not read or written
    pub ndef: bool,
}

impl SimTag {
    pub fn new(uid: impl Into<Vec<u8>>, records: Vec<NdefRecord>) -> Self {
        Self {
            uid: uid.into(),
            records,
            writable: true,
            capacity: DEFAULT_CAPACITY,
            ndef: true,
        }
    }

    pub fn blank(uid: impl Into<Vec<u8>>) -> Self {
        Self::new(uid, Vec::new())
    }

    pub fn read_only(mut self) -> Self {
        self.writable = false;
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn without_ndef(mut self) -> Self {
        self.ndef = false;
        self
    }

    /// What the native layer reports when reading the tag
    pub fn tag(&self) -> Tag {
        Tag::from_uid(&self.uid, self.records.clone())
    }

    pub fn matches_mime_filter(&self, filter: &[String]) -> bool {
        if filter.is_empty() {
            return true;
        }

        self.records
            .iter()
            .filter_map(|record| record.mime_type.as_deref())
            .any(|mime_type| filter.iter().any(|allowed| allowed == mime_type))
    }
}

/// Size of an NDEF message holding these records
pub fn message_len(records: &[NdefRecord]) -> usize {
    records.iter().map(NdefRecord::encoded_len).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_filter() {
        let tag = SimTag::new([1, 2], vec![NdefRecord::mime("text/plain", b"x".to_vec())]);

        assert!(tag.matches_mime_filter(&[]));
        assert!(tag.matches_mime_filter(&["image/png".into(), "text/plain".into()]));
        assert!(!tag.matches_mime_filter(&["application/json".into()]));
        assert!(!SimTag::blank([1]).matches_mime_filter(&["text/plain".into()]));
    }

    #[test]
    fn test_reported_tag() {
        let tag = SimTag::new([0x04, 0xa2], vec![NdefRecord::empty()]).tag();
        assert_eq!(tag.tag_serial, "04:A2");
        assert_eq!(tag.ndef_records, vec![NdefRecord::empty()]);
    }
}
