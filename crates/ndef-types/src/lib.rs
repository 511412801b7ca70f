//! NDEF data types shared by the bridge and the native layer, and the
//! conversion between raw bytes and the integer arrays used on the wire.

pub mod record;
pub mod status;
pub mod tag;
pub mod tnf;
pub mod transport;

pub use record::NdefRecord;
pub use status::NfcStatus;
pub use tag::{Tag, format_tag_serial};
pub use tnf::Tnf;
pub use transport::{TransportError, WireRecord, WireTag};

/// The canonical "no data" value for an optional `id` or `payload`
///
/// Records never carry absent byte fields, an empty buffer is used instead
pub fn unset() -> Vec<u8> {
    Vec::new()
}

mod ffi {
    use crate::Tnf;

    #[uniffi::export]
    fn ndef_unset() -> Vec<u8> {
        crate::unset()
    }

    #[uniffi::export]
    fn tnf_values() -> Vec<Tnf> {
        Tnf::ALL.to_vec()
    }

    #[uniffi::export]
    fn tnf_to_u8(tnf: Tnf) -> u8 {
        tnf.value()
    }

    #[uniffi::export]
    fn tnf_from_u8(value: u8) -> Tnf {
        Tnf::from(value)
    }

    #[uniffi::export]
    fn tag_serial_from_uid(uid: Vec<u8>) -> String {
        crate::format_tag_serial(&uid)
    }
}

uniffi::setup_scaffolding!();
