//! The protocol engine: connection state, request validation and
//! dispatch, and response transmission.
//!
//! `handle_message` is the single entry point for inbound data. It
//! runs to completion, calling the data handler synchronously for
//! every parameter touched and handing each finished response to the
//! handler's transmit hook before returning. The host must serialize
//! calls into it.

use bytes::Bytes;
use tracing::{debug, trace};

use crate::builder::{CustomResponse, ResponseBuilder};
use crate::codec::merge14;
use crate::constants::{BYTES_PER_VALUE, PARAMS_PER_MESSAGE, PART_ALL};
use crate::error::SysExError;
use crate::handler::{AccessError, DataHandler};
use crate::layout::{Block, Layout, Section};
use crate::message::{decode, DecodeError, DecodedMessage, Request, RequestClass};
use crate::packet::{Amount, CustomRequest, ManufacturerId, SpecialRequest, Status, Wish};

/// What kind of response is about to leave the engine; silent mode
/// suppresses some of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResponseClass {
    /// Success response carrying payload data
    Data,
    /// Success response with an empty payload
    EmptyAck,
    /// Successful custom-handler reply, transmitted even when empty
    CustomReply,
    /// Request validation failure
    ProtocolError,
    /// Backend failure on a read path
    ReadError,
    /// Backend failure on a write path
    WriteError,
    /// Host-initiated message from `send_custom`
    Unsolicited,
}

/// Configuration protocol engine over SysEx-framed messages.
pub struct SysExConf<H> {
    handler: H,
    manufacturer_id: ManufacturerId,
    layout: Layout,
    custom_requests: Vec<CustomRequest>,
    builder: ResponseBuilder,
    connection_open: bool,
    silent: bool,
}

impl<H: DataHandler> SysExConf<H> {
    /// Create an engine with no layout installed. Until
    /// [`install_layout`](Self::install_layout) succeeds, every
    /// standard request is rejected.
    pub fn new(handler: H, manufacturer_id: ManufacturerId) -> Self {
        Self {
            handler,
            manufacturer_id,
            layout: Layout::default(),
            custom_requests: Vec::new(),
            builder: ResponseBuilder::new(manufacturer_id),
            connection_open: false,
            silent: false,
        }
    }

    /// Close the connection and leave silent mode. The installed
    /// layout and custom requests are retained.
    pub fn reset(&mut self) {
        self.connection_open = false;
        self.silent = false;
    }

    /// Validate and install the parameter layout.
    pub fn install_layout(&mut self, blocks: Vec<Block>) -> Result<(), SysExError> {
        self.layout = Layout::new(blocks)?;
        Ok(())
    }

    /// Validate and install the custom-request set. IDs reserved for
    /// special requests are rejected.
    pub fn install_custom_requests(
        &mut self,
        requests: Vec<CustomRequest>,
    ) -> Result<(), SysExError> {
        let reserved_max = u8::from(SpecialRequest::ConnSilentDisable) as u16;
        if let Some(request) = requests.iter().find(|r| r.request_id <= reserved_max) {
            return Err(SysExError::ReservedRequestId(request.request_id));
        }
        self.custom_requests = requests;
        Ok(())
    }

    pub fn is_connection_open(&self) -> bool {
        self.connection_open
    }

    pub fn is_silent(&self) -> bool {
        self.silent
    }

    pub fn set_silent(&mut self, silent: bool) {
        self.silent = silent;
    }

    pub fn block_count(&self) -> usize {
        self.layout.block_count()
    }

    pub fn section_count(&self, block: u8) -> usize {
        self.layout.section_count(block)
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// Process one inbound buffer. Emits at most one response, except
    /// for the multi-part get-all forms which emit one message per
    /// part (plus the terminator for a sentinel request).
    pub fn handle_message(&mut self, raw: &[u8]) {
        trace!("inbound {} bytes: {:02X?}", raw.len(), raw);
        let bytes = Bytes::copy_from_slice(raw);

        let result = match decode(&bytes, self.manufacturer_id) {
            Err(error @ (DecodeError::NotSysEx | DecodeError::ForeignId)) => {
                trace!("dropped inbound buffer: {error}");
                Ok(())
            }
            Err(DecodeError::TooShort { part }) => {
                self.respond(Status::ErrorMessageLength, part, ResponseClass::ProtocolError)
            }
            Err(DecodeError::HighBitSet { part, .. } | DecodeError::NotARequest { part, .. }) => {
                self.respond(Status::ErrorStatus, part, ResponseClass::ProtocolError)
            }
            Ok(Request { part, class }) => match class {
                RequestClass::Special(special) => self.process_special(special, part),
                RequestClass::Unrecognized(id) => self.process_custom(id, part),
                RequestClass::Standard(message) => self.process_standard(message),
            },
        };

        // The response buffer is sized for the largest legal response,
        // so this only trips on an engine bug
        if let Err(error) = result {
            debug!("response assembly failed: {error}");
        }
    }

    /// Synthesize an unsolicited outbound message carrying `values`,
    /// framed with status `ack` when requested, else `request`.
    pub fn send_custom(&mut self, values: &[u16], ack: bool) -> Result<(), SysExError> {
        let status = if ack { Status::Ack } else { Status::Request };
        self.builder.begin(status, 0);
        for &value in values {
            self.builder.append14(value)?;
        }
        self.dispatch(ResponseClass::Unsolicited);
        Ok(())
    }

    fn process_special(&mut self, special: SpecialRequest, part: u8) -> Result<(), SysExError> {
        debug!("special request: {special}");

        // connOpen, connOpenSilent and the two queries are accepted in
        // any connection state; the rest need an open connection
        if !self.connection_open
            && matches!(
                special,
                SpecialRequest::ConnClose | SpecialRequest::ConnSilentDisable
            )
        {
            return self.respond(Status::ErrorConnection, part, ResponseClass::ProtocolError);
        }

        match special {
            SpecialRequest::ConnOpen => {
                self.connection_open = true;
                self.silent = false;
                self.respond(Status::Ack, part, ResponseClass::EmptyAck)
            }
            SpecialRequest::ConnOpenSilent => {
                self.connection_open = true;
                self.silent = true;
                self.respond(Status::Ack, part, ResponseClass::EmptyAck)
            }
            SpecialRequest::ConnClose => {
                self.connection_open = false;
                self.silent = false;
                self.respond(Status::Ack, part, ResponseClass::EmptyAck)
            }
            SpecialRequest::ConnSilentDisable => {
                self.silent = false;
                self.respond(Status::Ack, part, ResponseClass::EmptyAck)
            }
            SpecialRequest::BytesPerValue => {
                self.respond_value(Status::Ack, part, BYTES_PER_VALUE as u16)
            }
            SpecialRequest::ParamsPerMessage => {
                self.respond_value(Status::Ack, part, PARAMS_PER_MESSAGE)
            }
        }
    }

    fn process_custom(&mut self, id: u8, part: u8) -> Result<(), SysExError> {
        let entry = self
            .custom_requests
            .iter()
            .find(|r| r.request_id == id as u16)
            .copied();

        let Some(entry) = entry else {
            // Gating precedes wish validation: while closed, an
            // unknown ID is indistinguishable from a gated one
            let status = if self.connection_open {
                Status::ErrorWish
            } else {
                Status::ErrorConnection
            };
            return self.respond(status, part, ResponseClass::ProtocolError);
        };

        if entry.requires_open_connection && !self.connection_open {
            return self.respond(Status::ErrorConnection, part, ResponseClass::ProtocolError);
        }

        debug!("custom request: {:#04x}", entry.request_id);
        self.builder.begin(Status::Ack, part);
        let outcome = {
            let mut response = CustomResponse::new(&mut self.builder);
            self.handler.custom(entry.request_id, &mut response)
        };
        match outcome {
            Ok(()) => {
                self.dispatch(ResponseClass::CustomReply);
                Ok(())
            }
            Err(AccessError::Failed) => {
                self.respond(Status::ErrorRead, part, ResponseClass::ReadError)
            }
            Err(AccessError::NotSupported) => {
                self.respond(Status::ErrorNotSupported, part, ResponseClass::ReadError)
            }
        }
    }

    fn process_standard(&mut self, message: DecodedMessage) -> Result<(), SysExError> {
        let part = message.part;

        if !self.connection_open {
            return self.respond(Status::ErrorConnection, part, ResponseClass::ProtocolError);
        }

        let wish = message.wish;
        if matches!(wish, Wish::Unknown(_)) {
            return self.respond(Status::ErrorWish, part, ResponseClass::ProtocolError);
        }
        let amount = message.amount;
        if matches!(amount, Amount::Unknown(_)) {
            return self.respond(Status::ErrorAmount, part, ResponseClass::ProtocolError);
        }

        // Single forms carry an index, set/single a value on top of it
        let min_payload = match (wish, amount) {
            (Wish::Set, Amount::Single) => 2 * BYTES_PER_VALUE,
            (_, Amount::Single) => BYTES_PER_VALUE,
            _ => 0,
        };
        if message.payload.len() < min_payload {
            return self.respond(Status::ErrorMessageLength, part, ResponseClass::ProtocolError);
        }

        if message.block as usize >= self.layout.block_count() {
            return self.respond(Status::ErrorBlock, part, ResponseClass::ProtocolError);
        }
        let Some(section) = self.layout.section(message.block, message.section).copied() else {
            return self.respond(Status::ErrorSection, part, ResponseClass::ProtocolError);
        };

        // The sentinel is only meaningful where no residue computation
        // depends on it
        let part_valid = if part == PART_ALL {
            !(wish == Wish::Set && amount == Amount::All)
        } else {
            part < section.part_count()
        };
        if !part_valid {
            return self.respond(Status::ErrorPart, part, ResponseClass::ProtocolError);
        }

        if amount == Amount::Single && message.index >= section.parameter_count() {
            return self.respond(Status::ErrorIndex, part, ResponseClass::ProtocolError);
        }

        let expected_payload = match (wish, amount) {
            (Wish::Set, Amount::Single) => 2 * BYTES_PER_VALUE,
            (_, Amount::Single) => BYTES_PER_VALUE,
            (Wish::Set, Amount::All) => section.values_in_part(part) as usize * BYTES_PER_VALUE,
            _ => 0,
        };
        if message.payload.len() != expected_payload {
            return self.respond(Status::ErrorMessageLength, part, ResponseClass::ProtocolError);
        }

        match (wish, amount) {
            (Wish::Set, Amount::Single) => {
                if message.new_value < section.value_min() || message.new_value > section.value_max()
                {
                    return self.respond(Status::ErrorNewValue, part, ResponseClass::ProtocolError);
                }
            }
            (Wish::Set, Amount::All) => {
                for chunk in message.payload.chunks_exact(BYTES_PER_VALUE) {
                    let value = merge14(chunk[0], chunk[1]);
                    if value < section.value_min() || value > section.value_max() {
                        return self.respond(
                            Status::ErrorNewValue,
                            part,
                            ResponseClass::ProtocolError,
                        );
                    }
                }
            }
            _ => {}
        }

        debug!(
            "standard request: wish={:?} amount={:?} block={} section={} part={}",
            wish, amount, message.block, message.section, part
        );

        match (wish, amount) {
            (Wish::Get, Amount::Single) => self.get_single(&message, Status::Ack),
            (Wish::Backup, Amount::Single) => self.get_single(&message, Status::Request),
            (Wish::Get, Amount::All) => self.get_all(&message, &section, Status::Ack),
            (Wish::Backup, Amount::All) => self.get_all(&message, &section, Status::Request),
            (Wish::Set, Amount::Single) => self.set_single(&message),
            (Wish::Set, Amount::All) => self.set_all(&message),
            // Unknown wish and amount were rejected above
            _ => Ok(()),
        }
    }

    fn get_single(&mut self, message: &DecodedMessage, status: Status) -> Result<(), SysExError> {
        match self
            .handler
            .get(message.block, message.section, message.index)
        {
            Ok(value) => {
                self.builder.begin(status, message.part);
                self.builder.append14(value)?;
                self.dispatch(ResponseClass::Data);
                Ok(())
            }
            Err(AccessError::Failed) => {
                self.respond(Status::ErrorRead, message.part, ResponseClass::ReadError)
            }
            Err(AccessError::NotSupported) => self.respond(
                Status::ErrorNotSupported,
                message.part,
                ResponseClass::ReadError,
            ),
        }
    }

    /// Emit every part of the section in ascending order; `status`
    /// differentiates get (`ack`) from backup (`request`). A sentinel
    /// request gets a trailing empty ack after the final part.
    fn get_all(
        &mut self,
        message: &DecodedMessage,
        section: &Section,
        status: Status,
    ) -> Result<(), SysExError> {
        for part_index in 0..section.part_count() {
            self.builder.begin(status, part_index);
            let start = part_index as u16 * PARAMS_PER_MESSAGE;
            let end = start + section.values_in_part(part_index);
            for index in start..end {
                match self.handler.get(message.block, message.section, index) {
                    Ok(value) => self.builder.append14(value)?,
                    Err(AccessError::Failed) => {
                        return self.respond(
                            Status::ErrorRead,
                            part_index,
                            ResponseClass::ReadError,
                        );
                    }
                    Err(AccessError::NotSupported) => {
                        return self.respond(
                            Status::ErrorNotSupported,
                            part_index,
                            ResponseClass::ReadError,
                        );
                    }
                }
            }
            self.dispatch(ResponseClass::Data);
        }

        if message.part == PART_ALL {
            return self.respond(Status::Ack, PART_ALL, ResponseClass::EmptyAck);
        }
        Ok(())
    }

    fn set_single(&mut self, message: &DecodedMessage) -> Result<(), SysExError> {
        match self.handler.set(
            message.block,
            message.section,
            message.index,
            message.new_value,
        ) {
            Ok(()) => self.respond(Status::Ack, message.part, ResponseClass::EmptyAck),
            Err(AccessError::Failed) => {
                self.respond(Status::ErrorWrite, message.part, ResponseClass::WriteError)
            }
            Err(AccessError::NotSupported) => self.respond(
                Status::ErrorNotSupported,
                message.part,
                ResponseClass::WriteError,
            ),
        }
    }

    fn set_all(&mut self, message: &DecodedMessage) -> Result<(), SysExError> {
        let start = message.part as u16 * PARAMS_PER_MESSAGE;
        for (offset, chunk) in message.payload.chunks_exact(BYTES_PER_VALUE).enumerate() {
            let value = merge14(chunk[0], chunk[1]);
            match self
                .handler
                .set(message.block, message.section, start + offset as u16, value)
            {
                Ok(()) => {}
                Err(AccessError::Failed) => {
                    return self.respond(
                        Status::ErrorWrite,
                        message.part,
                        ResponseClass::WriteError,
                    );
                }
                Err(AccessError::NotSupported) => {
                    return self.respond(
                        Status::ErrorNotSupported,
                        message.part,
                        ResponseClass::WriteError,
                    );
                }
            }
        }
        self.respond(Status::Ack, message.part, ResponseClass::EmptyAck)
    }

    /// Build and dispatch an empty-payload response.
    fn respond(&mut self, status: Status, part: u8, class: ResponseClass) -> Result<(), SysExError> {
        self.builder.begin(status, part);
        self.dispatch(class);
        Ok(())
    }

    /// Build and dispatch a response carrying a single value.
    fn respond_value(&mut self, status: Status, part: u8, value: u16) -> Result<(), SysExError> {
        self.builder.begin(status, part);
        self.builder.append14(value)?;
        self.dispatch(ResponseClass::Data);
        Ok(())
    }

    /// Finish the pending response and hand it to the transmit hook,
    /// unless silent mode suppresses this class of message.
    fn dispatch(&mut self, class: ResponseClass) {
        if !self.transmit_allowed(class) {
            debug!("silent mode: suppressed {:?} response", class);
            return;
        }
        let frame = self.builder.finish();
        trace!("outbound {} bytes: {:02X?}", frame.len(), frame);
        self.handler.transmit(frame);
    }

    /// Silent mode keeps responses the peer cannot do without: data it
    /// asked for, custom replies, read-path failures, and anything the
    /// host sends on its own. Empty acks and the remaining errors are
    /// suppressed.
    fn transmit_allowed(&self, class: ResponseClass) -> bool {
        if !self.silent {
            return true;
        }
        matches!(
            class,
            ResponseClass::Data
                | ResponseClass::CustomReply
                | ResponseClass::ReadError
                | ResponseClass::Unsolicited
        )
    }
}
