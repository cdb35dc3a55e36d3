//! Register access for First Light Imaging C-RED2 cameras over their serial
//! `fli-cli>` shell.
//!
//! The same engine backs two front ends: the CLProtocol C library
//! (`cred2clp-ffi`) that GenICam hosts load, and the `cred2clp` command-line
//! tool for working with a camera on a local serial port.
//!
//! # Crate Structure
//!
//! - [`transport`]: serial transport abstraction (host `ISerial`, local ports)
//! - [`frame`]: register value codec and prompt-delimited command exchange
//! - [`description`]: the GenApi register description document and XML IDs
//! - [`session`]: register map, sessions and the adapter engine

/// Re-export transport types.
pub mod transport {
    pub use cred2clp_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use cred2clp_frame::*;
}

/// Re-export description types.
pub mod description {
    pub use cred2clp_description::*;
}

/// Re-export session and engine types.
pub mod session {
    pub use cred2clp_session::*;
}
