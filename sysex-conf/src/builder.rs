//! Outbound message assembly.
//!
//! The builder owns a single fixed-capacity buffer which is rewritten
//! for every response. `begin` lays down the frame header, `append14`
//! adds encoded values, `finish` terminates the frame and hands back
//! the finished bytes.

use crate::codec::split14;
use crate::constants::{MAX_MESSAGE_SIZE, SYSEX_END, SYSEX_START};
use crate::error::SysExError;
use crate::packet::{ManufacturerId, Status};

#[derive(Debug)]
pub struct ResponseBuilder {
    buffer: [u8; MAX_MESSAGE_SIZE],
    cursor: usize,
    manufacturer_id: ManufacturerId,
}

impl ResponseBuilder {
    pub fn new(manufacturer_id: ManufacturerId) -> Self {
        Self {
            buffer: [0; MAX_MESSAGE_SIZE],
            cursor: 0,
            manufacturer_id,
        }
    }

    /// Start a new message: start byte, manufacturer ID, status and
    /// part. Discards whatever the buffer held before.
    pub fn begin(&mut self, status: Status, part: u8) {
        let id = self.manufacturer_id.bytes();
        self.buffer[0] = SYSEX_START;
        self.buffer[1] = id[0];
        self.buffer[2] = id[1];
        self.buffer[3] = id[2];
        self.buffer[4] = status.into();
        self.buffer[5] = part;
        self.cursor = 6;
    }

    /// Encode one 14-bit value into the payload. Fails when fewer than
    /// three bytes remain: two for the value, one reserved for the
    /// terminator.
    pub fn append14(&mut self, value: u16) -> Result<(), SysExError> {
        if self.cursor + 3 > MAX_MESSAGE_SIZE {
            return Err(SysExError::BufferFull);
        }
        let (high, low) = split14(value);
        self.buffer[self.cursor] = high;
        self.buffer[self.cursor + 1] = low;
        self.cursor += 2;
        Ok(())
    }

    /// Terminate the frame and return the finished message.
    pub fn finish(&mut self) -> &[u8] {
        self.buffer[self.cursor] = SYSEX_END;
        self.cursor += 1;
        &self.buffer[..self.cursor]
    }
}

/// Append-only view of the response handed to custom-request handlers.
///
/// Borrowing the builder exclusively for the duration of the handler
/// call keeps the handler from touching the frame header or
/// terminator; appending values is the only thing it can do.
#[derive(Debug)]
pub struct CustomResponse<'a> {
    builder: &'a mut ResponseBuilder,
}

impl<'a> CustomResponse<'a> {
    pub(crate) fn new(builder: &'a mut ResponseBuilder) -> Self {
        Self { builder }
    }

    /// Append one 14-bit value to the outbound payload.
    pub fn append(&mut self, value: u16) -> Result<(), SysExError> {
        self.builder.append14(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::PARAMS_PER_MESSAGE;

    fn builder() -> ResponseBuilder {
        ResponseBuilder::new(ManufacturerId::new([0x00, 0x53, 0x43]))
    }

    #[test]
    fn frames_a_response() {
        let mut builder = builder();
        builder.begin(Status::Ack, 0x02);
        builder.append14(300).unwrap();
        let frame = builder.finish();
        assert_eq!(frame, &[0xF0, 0x00, 0x53, 0x43, 0x01, 0x02, 0x02, 0x2C, 0xF7]);
    }

    #[test]
    fn begin_discards_previous_contents() {
        let mut builder = builder();
        builder.begin(Status::Ack, 0);
        builder.append14(1).unwrap();
        builder.begin(Status::ErrorWish, 1);
        assert_eq!(builder.finish(), &[0xF0, 0x00, 0x53, 0x43, 0x04, 0x01, 0xF7]);
    }

    #[test]
    fn append_reserves_room_for_the_terminator() {
        let mut builder = builder();
        builder.begin(Status::Ack, 0);
        // Header (6) + 36 values (72) + terminator = MAX_MESSAGE_SIZE
        for _ in 0..36 {
            builder.append14(0x3FFF).unwrap();
        }
        assert_eq!(builder.append14(0), Err(SysExError::BufferFull));
        let frame = builder.finish();
        assert_eq!(frame.len(), MAX_MESSAGE_SIZE);
        assert_eq!(frame[frame.len() - 1], 0xF7);
    }

    #[test]
    fn a_full_part_fits_with_room_to_spare() {
        let mut builder = builder();
        builder.begin(Status::Ack, 0);
        for _ in 0..PARAMS_PER_MESSAGE {
            builder.append14(0x3FFF).unwrap();
        }
        assert!(builder.finish().len() <= MAX_MESSAGE_SIZE);
    }
}
