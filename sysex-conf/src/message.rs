//! Inbound message decoding.
//!
//! The decoder performs structural checks only: framing, manufacturer
//! ID, 7-bit payload discipline, the status byte, and form
//! classification. Everything semantic (layout bounds, value ranges,
//! exact lengths) is left to the engine so the specific error status
//! can be reported in the right order.

use bytes::Bytes;
use thiserror::Error;

use crate::codec::merge14;
use crate::constants::{
    AMOUNT_BYTE, BLOCK_BYTE, BYTES_PER_VALUE, ID_BYTE_1, ID_BYTE_2, ID_BYTE_3, INDEX_BYTE,
    PART_BYTE, SECTION_BYTE, SPECIAL_REQ_MSG_SIZE, START_BYTE, STATUS_BYTE, STD_REQ_BARE_MSG_SIZE,
    SYSEX_END, SYSEX_START, WISH_BYTE,
};
use crate::packet::{Amount, ManufacturerId, SpecialRequest, Status, Wish};

/// Structural rejection of an inbound buffer.
///
/// `NotSysEx` and `ForeignId` are dropped without a response; the
/// remaining variants carry the part byte to echo into the error
/// response (0 when the message was too short to hold one).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("missing SysEx framing bytes")]
    NotSysEx,

    #[error("manufacturer id does not match")]
    ForeignId,

    #[error("message too short for any request form")]
    TooShort { part: u8 },

    #[error("payload byte {value:#04x} has the high bit set")]
    HighBitSet { part: u8, value: u8 },

    #[error("status byte {status:#04x} is not a request")]
    NotARequest { part: u8, status: u8 },
}

/// A structurally decoded standard request.
///
/// `index` and `new_value` are merged from the payload when the bytes
/// are present; the engine re-checks the payload length against the
/// decoded form before trusting either.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedMessage {
    pub wish: Wish,
    pub amount: Amount,
    pub block: u8,
    pub section: u8,
    pub part: u8,
    pub index: u16,
    pub new_value: u16,
    /// Bytes between the section byte and the terminator.
    pub payload: Bytes,
}

/// Which request form the inbound buffer carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestClass {
    /// 8-byte form carrying a reserved request ID.
    Special(SpecialRequest),
    /// Standard read/write form.
    Standard(DecodedMessage),
    /// 8-byte form whose ID byte is not reserved; resolved against the
    /// installed custom-request set by the engine.
    Unrecognized(u8),
}

/// Decoder output: the classification plus the part byte to echo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub part: u8,
    pub class: RequestClass,
}

/// Structurally decode one inbound buffer.
pub fn decode(bytes: &Bytes, manufacturer_id: ManufacturerId) -> Result<Request, DecodeError> {
    let len = bytes.len();

    // Framing first: traffic that is not a SysEx message never draws a
    // reply, no matter how short it is
    if len < 2 || bytes[START_BYTE] != SYSEX_START || bytes[len - 1] != SYSEX_END {
        return Err(DecodeError::NotSysEx);
    }

    if len < SPECIAL_REQ_MSG_SIZE {
        return Err(DecodeError::TooShort { part: 0 });
    }

    let id = manufacturer_id.bytes();
    if bytes[ID_BYTE_1] != id[0] || bytes[ID_BYTE_2] != id[1] || bytes[ID_BYTE_3] != id[2] {
        return Err(DecodeError::ForeignId);
    }

    // The part byte participates in the scan below; mask it so error
    // responses stay 7-bit clean even when it is the offender
    let part = bytes[PART_BYTE] & 0x7F;

    if let Some(&value) = bytes[STATUS_BYTE..len - 1].iter().find(|b| **b & 0x80 != 0) {
        return Err(DecodeError::HighBitSet { part, value });
    }

    if bytes[STATUS_BYTE] != u8::from(Status::Request) {
        return Err(DecodeError::NotARequest {
            part,
            status: bytes[STATUS_BYTE],
        });
    }

    if len == SPECIAL_REQ_MSG_SIZE {
        let class = match SpecialRequest::try_from(bytes[WISH_BYTE]) {
            Ok(special) => RequestClass::Special(special),
            Err(_) => RequestClass::Unrecognized(bytes[WISH_BYTE]),
        };
        return Ok(Request { part, class });
    }

    if len < STD_REQ_BARE_MSG_SIZE {
        return Err(DecodeError::TooShort { part });
    }

    let payload = bytes.slice(INDEX_BYTE..len - 1);
    let index = if payload.len() >= BYTES_PER_VALUE {
        merge14(payload[0], payload[1])
    } else {
        0
    };
    let new_value = if payload.len() >= 2 * BYTES_PER_VALUE {
        merge14(payload[2], payload[3])
    } else {
        0
    };

    Ok(Request {
        part,
        class: RequestClass::Standard(DecodedMessage {
            wish: Wish::from(bytes[WISH_BYTE]),
            amount: Amount::from(bytes[AMOUNT_BYTE]),
            block: bytes[BLOCK_BYTE],
            section: bytes[SECTION_BYTE],
            part,
            index,
            new_value,
            payload,
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MFR: ManufacturerId = ManufacturerId::new([0x00, 0x53, 0x43]);

    fn decode_slice(raw: &[u8]) -> Result<Request, DecodeError> {
        decode(&Bytes::copy_from_slice(raw), MFR)
    }

    #[test]
    fn classifies_special_requests() {
        let request = decode_slice(&[0xF0, 0x00, 0x53, 0x43, 0x00, 0x00, 0x01, 0xF7]).unwrap();
        assert_eq!(request.part, 0);
        assert_eq!(request.class, RequestClass::Special(SpecialRequest::ConnOpen));
    }

    #[test]
    fn unreserved_id_byte_is_unrecognized() {
        let request = decode_slice(&[0xF0, 0x00, 0x53, 0x43, 0x00, 0x00, 0x36, 0xF7]).unwrap();
        assert_eq!(request.class, RequestClass::Unrecognized(0x36));
    }

    #[test]
    fn decodes_a_get_single_request() {
        let request = decode_slice(&[
            0xF0, 0x00, 0x53, 0x43, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x05, 0xF7,
        ])
        .unwrap();
        match request.class {
            RequestClass::Standard(message) => {
                assert_eq!(message.wish, Wish::Get);
                assert_eq!(message.amount, Amount::Single);
                assert_eq!(message.block, 0);
                assert_eq!(message.section, 1);
                assert_eq!(message.index, 5);
                assert_eq!(message.payload.len(), 2);
            }
            other => panic!("expected standard classification, got {other:?}"),
        }
    }

    #[test]
    fn unknown_wish_bytes_are_preserved() {
        let request = decode_slice(&[
            0xF0, 0x00, 0x53, 0x43, 0x00, 0x00, 0x05, 0x00, 0x00, 0x00, 0xF7,
        ])
        .unwrap();
        match request.class {
            RequestClass::Standard(message) => assert_eq!(message.wish, Wish::Unknown(0x05)),
            other => panic!("expected standard classification, got {other:?}"),
        }
    }

    #[test]
    fn drops_foreign_and_unframed_buffers() {
        assert_eq!(
            decode_slice(&[0xF0, 0x00, 0x20, 0x6B, 0x00, 0x00, 0x01, 0xF7]),
            Err(DecodeError::ForeignId)
        );
        assert_eq!(
            decode_slice(&[0xF1, 0x00, 0x53, 0x43, 0x00, 0x00, 0x01, 0xF7]),
            Err(DecodeError::NotSysEx)
        );
        assert_eq!(
            decode_slice(&[0xF0, 0x00, 0x53, 0x43, 0x00, 0x00, 0x01, 0xF0]),
            Err(DecodeError::NotSysEx)
        );
        // Short unframed traffic is dropped too, not reported
        assert_eq!(decode_slice(&[0x90, 0x40, 0x7F]), Err(DecodeError::NotSysEx));
        assert_eq!(decode_slice(&[]), Err(DecodeError::NotSysEx));
    }

    #[test]
    fn rejects_short_and_truncated_buffers() {
        assert_eq!(decode_slice(&[0xF0, 0xF7]), Err(DecodeError::TooShort { part: 0 }));
        // Nine bytes: framed, ours, but not a complete standard header
        assert_eq!(
            decode_slice(&[0xF0, 0x00, 0x53, 0x43, 0x00, 0x02, 0x00, 0x00, 0xF7]),
            Err(DecodeError::TooShort { part: 2 })
        );
    }

    #[test]
    fn rejects_high_bit_and_non_request_status() {
        assert_eq!(
            decode_slice(&[0xF0, 0x00, 0x53, 0x43, 0x00, 0x00, 0x00, 0x00, 0x00, 0x80, 0xF7]),
            Err(DecodeError::HighBitSet { part: 0, value: 0x80 })
        );
        assert_eq!(
            decode_slice(&[0xF0, 0x00, 0x53, 0x43, 0x01, 0x00, 0x01, 0xF7]),
            Err(DecodeError::NotARequest { part: 0, status: 0x01 })
        );
    }
}
