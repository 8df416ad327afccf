use thiserror::Error;

/// The primary error type for the `sysex-conf` library.
///
/// Protocol-level failures are not Rust errors; they are reported to
/// the peer as status bytes in the response. This type covers what can
/// go wrong on the host side of the API: installing a malformed layout
/// or custom-request set, and overflowing the response buffer.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SysExError {
    #[error("layout must contain at least one block with at least one section")]
    EmptyLayout,

    #[error("section declares zero parameters")]
    EmptySection,

    #[error("invalid value range: min {min} exceeds max {max}")]
    InvalidValueRange { min: u16, max: u16 },

    #[error("section with {0} parameters exceeds the addressable part range")]
    SectionTooLarge(u16),

    #[error("custom request id {0:#06x} collides with a reserved special request id")]
    ReservedRequestId(u16),

    #[error("response buffer full")]
    BufferFull,
}
