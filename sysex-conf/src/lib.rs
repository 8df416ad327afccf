pub mod builder;
pub mod codec;
pub mod constants;
pub mod engine;
pub mod error;
pub mod handler;
pub mod layout;
pub mod message;
pub mod packet;

// Re-export the engine and the types a host needs to wire it up
pub use builder::CustomResponse;
pub use engine::SysExConf;
pub use error::SysExError;
pub use handler::{AccessError, DataHandler};
pub use layout::{Block, Layout, Section};
pub use packet::{Amount, CustomRequest, ManufacturerId, SpecialRequest, Status, Wish};
