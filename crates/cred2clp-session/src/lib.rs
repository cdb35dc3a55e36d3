//! Register translation and session management for the C-RED2 adapter.
//!
//! This is the "just works" layer. An [`Engine`] matches probe templates
//! against the adapter identity, opens sessions with non-zero handles, and
//! turns each register read or write into one exchange with the camera shell:
//!
//! ```text
//! read 0x1000   ->  "fps raw\n"       <-  "600.0\r\nfli-cli>"  ->  600.0f32 LE
//! write 0x1000  ->  "set fps 600.000000\n"
//! ```
//!
//! Selector registers live in the session and never touch the device.

pub mod dispatch;
pub mod engine;
pub mod error;
pub mod identity;
pub mod registers;
pub mod session;
pub mod table;
pub mod value;
pub mod vocab;

pub use dispatch::{resolve_read, resolve_write, Dispatcher, WriteEffect};
pub use engine::{Engine, EngineConfig, ProbeResult};
pub use error::{EngineError, ErrorKind, Operation, Result};
pub use identity::{matches, DeviceIdentity, DRIVER_FILE_NAME};
pub use registers::{
    lookup, lookup_name, Access, ReadRule, RegisterDescriptor, RegisterKind, WriteRule, REGISTERS,
};
pub use session::{Selector, SelectorState, Session, SessionHandle};
pub use table::SessionTable;
pub use value::RegisterValue;
pub use vocab::BoolSpelling;
