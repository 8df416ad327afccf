use thiserror::Error;

use crate::builder::CustomResponse;

/// Why a data-handler call did not produce a value.
///
/// The engine maps these onto wire statuses per operation: `Failed`
/// becomes `ErrorRead` or `ErrorWrite`, `NotSupported` becomes
/// `ErrorNotSupported`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessError {
    #[error("parameter access failed")]
    Failed,

    #[error("operation not supported")]
    NotSupported,
}

/// Storage and transport supplied by the host.
///
/// The engine performs all protocol validation before calling in; a
/// handler only ever sees addresses inside the installed layout and
/// values inside the section's range. Calls are synchronous upcalls
/// made while `handle_message` runs.
pub trait DataHandler {
    /// Read one parameter.
    fn get(&mut self, block: u8, section: u8, index: u16) -> Result<u16, AccessError>;

    /// Write one parameter.
    fn set(&mut self, block: u8, section: u8, index: u16, value: u16) -> Result<(), AccessError>;

    /// Service a host-defined request, appending any reply values
    /// through the capability.
    fn custom(
        &mut self,
        request_id: u16,
        response: &mut CustomResponse<'_>,
    ) -> Result<(), AccessError>;

    /// Deliver one complete framed message to the peer. Infallible
    /// from the engine's perspective.
    fn transmit(&mut self, frame: &[u8]);
}
