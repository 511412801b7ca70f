use serde::{Deserialize, Serialize};

/// Type Name Format of an NDEF record
///
/// Values outside the eight defined formats are kept as `Other` so they pass
/// through unchanged, validating them is left to the native layer
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, Serialize, Deserialize, uniffi::Enum)]
#[serde(from = "u8", into = "u8")]
pub enum Tnf {
    Empty,
    WellKnown,
    Media,
    Uri,
    ExternalType,
    Unknown,
    Unchanged,
    Reserved,
    Other(u8),
}

impl Tnf {
    pub const EMPTY: u8 = 0x00;
    pub const WELL_KNOWN: u8 = 0x01;
    pub const MEDIA: u8 = 0x02;
    pub const URI: u8 = 0x03;
    pub const EXTERNAL_TYPE: u8 = 0x04;
    pub const UNKNOWN: u8 = 0x05;
    pub const UNCHANGED: u8 = 0x06;
    pub const RESERVED: u8 = 0x07;

    pub const ALL: [Tnf; 8] = [
        Tnf::Empty,
        Tnf::WellKnown,
        Tnf::Media,
        Tnf::Uri,
        Tnf::ExternalType,
        Tnf::Unknown,
        Tnf::Unchanged,
        Tnf::Reserved,
    ];

    pub const fn value(&self) -> u8 {
        match self {
            Tnf::Empty => Self::EMPTY,
            Tnf::WellKnown => Self::WELL_KNOWN,
            Tnf::Media => Self::MEDIA,
            Tnf::Uri => Self::URI,
            Tnf::ExternalType => Self::EXTERNAL_TYPE,
            Tnf::Unknown => Self::UNKNOWN,
            Tnf::Unchanged => Self::UNCHANGED,
            Tnf::Reserved => Self::RESERVED,
            Tnf::Other(value) => *value,
        }
    }

    /// True for the eight formats defined by the NFC Forum
    pub const fn is_defined(&self) -> bool {
        self.value() <= Self::RESERVED
    }
}

impl From<u8> for Tnf {
    fn from(value: u8) -> Self {
        match value {
            Self::EMPTY => Tnf::Empty,
            Self::WELL_KNOWN => Tnf::WellKnown,
            Self::MEDIA => Tnf::Media,
            Self::URI => Tnf::Uri,
            Self::EXTERNAL_TYPE => Tnf::ExternalType,
            Self::UNKNOWN => Tnf::Unknown,
            Self::UNCHANGED => Tnf::Unchanged,
            Self::RESERVED => Tnf::Reserved,
            other => Tnf::Other(other),
        }
    }
}

impl From<Tnf> for u8 {
    fn from(tnf: Tnf) -> Self {
        tnf.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defined_values_are_not_remapped() {
        for (expected, tnf) in Tnf::ALL.iter().enumerate() {
            assert_eq!(tnf.value() as usize, expected);
            assert_eq!(Tnf::from(expected as u8), *tnf);
            assert!(tnf.is_defined());
        }
    }

    #[test]
    fn test_out_of_range_values_pass_through() {
        let tnf = Tnf::from(0x0B);
        assert_eq!(tnf, Tnf::Other(0x0B));
        assert_eq!(u8::from(tnf), 0x0B);
        assert!(!tnf.is_defined());
    }

    #[test]
    fn test_serializes_as_integer() {
        assert_eq!(serde_json::to_string(&Tnf::Media).unwrap(), "2");
        assert_eq!(serde_json::from_str::<Tnf>("4").unwrap(), Tnf::ExternalType);
        assert_eq!(serde_json::from_str::<Tnf>("200").unwrap(), Tnf::Other(200));
        assert!(serde_json::from_str::<Tnf>("300").is_err());
    }
}
