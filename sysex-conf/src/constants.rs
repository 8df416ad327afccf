// Wire constants for the SysEx configuration protocol

/// First byte of every SysEx message
pub const SYSEX_START: u8 = 0xF0;

/// Last byte of every SysEx message
pub const SYSEX_END: u8 = 0xF7;

/// Maximum number of parameter values carried in one message part
pub const PARAMS_PER_MESSAGE: u16 = 32;

/// Wire size of one 14-bit value (two 7-bit bytes, high first)
pub const BYTES_PER_VALUE: usize = 2;

/// Part value requesting every part plus a trailing terminator message
pub const PART_ALL: u8 = 0x7F;

// Fixed byte offsets within a message. The manufacturer ID occupies
// offsets 1..=3; everything after the status byte is 7-bit payload.

/// Offset of the start byte (0xF0)
pub const START_BYTE: usize = 0;
/// Offset of the first manufacturer ID byte
pub const ID_BYTE_1: usize = 1;
/// Offset of the second manufacturer ID byte
pub const ID_BYTE_2: usize = 2;
/// Offset of the third manufacturer ID byte
pub const ID_BYTE_3: usize = 3;
/// Offset of the status byte (request on the way in, outcome on the way out)
pub const STATUS_BYTE: usize = 4;
/// Offset of the part byte (0..126, or 0x7F for "all parts")
pub const PART_BYTE: usize = 5;
/// Offset of the wish byte; also the request ID slot in the special form
pub const WISH_BYTE: usize = 6;
/// Offset of the amount byte
pub const AMOUNT_BYTE: usize = 7;
/// Offset of the block byte
pub const BLOCK_BYTE: usize = 8;
/// Offset of the section byte
pub const SECTION_BYTE: usize = 9;
/// Offset of the first index byte; values follow in the set forms
pub const INDEX_BYTE: usize = 10;

/// Total size of a special-form request: frame through the wish byte
/// (carrying the request ID) plus the terminator
pub const SPECIAL_REQ_MSG_SIZE: usize = WISH_BYTE + 2;

/// Smallest standard request that still carries a payload field:
/// header, index, one value, terminator (the set/single form)
pub const STD_REQ_MIN_MSG_SIZE: usize = INDEX_BYTE + 2 * BYTES_PER_VALUE + 1;

/// Smallest structurally complete standard request: header through the
/// section byte plus the terminator (the get/all form)
pub const STD_REQ_BARE_MSG_SIZE: usize = SECTION_BYTE + 2;

/// Capacity of the response buffer; no message ever exceeds this
pub const MAX_MESSAGE_SIZE: usize =
    STD_REQ_MIN_MSG_SIZE + PARAMS_PER_MESSAGE as usize * BYTES_PER_VALUE;
