use num_enum::{FromPrimitive, IntoPrimitive, TryFromPrimitive};
use strum_macros::Display;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Three-byte SysEx manufacturer ID, compared verbatim on every
/// inbound message and written into every outbound one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ManufacturerId([u8; 3]);

impl ManufacturerId {
    pub const fn new(bytes: [u8; 3]) -> Self {
        Self(bytes)
    }

    pub const fn bytes(&self) -> [u8; 3] {
        self.0
    }
}

impl From<[u8; 3]> for ManufacturerId {
    fn from(bytes: [u8; 3]) -> Self {
        Self(bytes)
    }
}

/// Status byte of a message: `Request` on the way in, the outcome of
/// the request on the way out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum Status {
    Request = 0x00,
    Ack = 0x01,
    ErrorStatus = 0x02,
    ErrorConnection = 0x03,
    ErrorWish = 0x04,
    ErrorAmount = 0x05,
    ErrorBlock = 0x06,
    ErrorSection = 0x07,
    ErrorPart = 0x08,
    ErrorIndex = 0x09,
    ErrorNewValue = 0x0A,
    ErrorMessageLength = 0x0B,
    ErrorWrite = 0x0C,
    ErrorNotSupported = 0x0D,
    ErrorRead = 0x0E,
}

/// Operation kind of a standard request. Unknown bytes are preserved
/// so the engine can report `ErrorWish` with full knowledge of what
/// the peer sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, FromPrimitive)]
#[repr(u8)]
pub enum Wish {
    Get = 0x00,
    Set = 0x01,
    Backup = 0x02,

    #[num_enum(catch_all)]
    Unknown(u8),
}

/// Cardinality of a standard request: one parameter or a whole section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, FromPrimitive)]
#[repr(u8)]
pub enum Amount {
    Single = 0x00,
    All = 0x01,

    #[num_enum(catch_all)]
    Unknown(u8),
}

/// Reserved request IDs carried in the special (8-byte) form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum SpecialRequest {
    ConnClose = 0x00,
    ConnOpen = 0x01,
    BytesPerValue = 0x02,
    ParamsPerMessage = 0x03,
    ConnOpenSilent = 0x04,
    ConnSilentDisable = 0x05,
}

/// Registration for a host-defined request, matched against the ID
/// byte of the special form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CustomRequest {
    pub request_id: u16,
    /// When set, the request is rejected with `ErrorConnection` unless
    /// the connection is open.
    pub requires_open_connection: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_raw_values() {
        assert_eq!(u8::from(Status::Request), 0x00);
        assert_eq!(u8::from(Status::Ack), 0x01);
        assert_eq!(u8::from(Status::ErrorRead), 0x0E);
        assert_eq!(Status::try_from(0x0Bu8).unwrap(), Status::ErrorMessageLength);
        assert!(Status::try_from(0x0Fu8).is_err());
    }

    #[test]
    fn wish_preserves_unknown_bytes() {
        assert_eq!(Wish::from(0x01u8), Wish::Set);
        assert_eq!(Wish::from(0x05u8), Wish::Unknown(0x05));
        assert_eq!(Amount::from(0x07u8), Amount::Unknown(0x07));
    }

    #[test]
    fn special_request_ids() {
        assert_eq!(
            SpecialRequest::try_from(0x03u8).unwrap(),
            SpecialRequest::ParamsPerMessage
        );
        assert!(SpecialRequest::try_from(0x06u8).is_err());
    }
}
