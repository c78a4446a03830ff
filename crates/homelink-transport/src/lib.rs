//! Transport implementations for homelink.
//!
//! This crate provides concrete implementations of the
//! [`Transport`](homelink_core::Transport) trait and the hex-framed
//! [`Bridge`](homelink_core::Bridge) that device codecs talk to:
//!
//! - [`TcpTransport`]: TCP connections to serial-to-IP bridges such as the
//!   Global Caché iTach IP2SL
//! - [`SerialTransport`]: devices wired directly to a local RS-232 port
//! - [`HexBridge`]: decodes hex-framed commands, writes them through any
//!   transport and collects the raw reply
//!
//! # Example
//!
//! ```no_run
//! use homelink_core::Bridge;
//! use homelink_transport::HexBridge;
//! use std::time::Duration;
//!
//! # async fn example() -> homelink_core::Result<()> {
//! let mut bridge = HexBridge::connect("192.168.1.50:4999", Duration::from_secs(1)).await?;
//!
//! // "*Z1STATUS?\r"
//! let reply = bridge.send_and_receive("2a5a315354415455533f0d").await?;
//! # Ok(())
//! # }
//! ```

pub mod bridge;
pub mod serial;
pub mod tcp;

pub use bridge::HexBridge;
pub use serial::{SerialConfig, SerialTransport};
pub use tcp::TcpTransport;

use homelink_core::Error;

/// Map a mid-session I/O error to the appropriate [`Error`] variant.
///
/// Errors that mean the peer went away become [`Error::ConnectionLost`];
/// everything else is passed through as [`Error::Io`].
pub(crate) fn map_io_error(e: std::io::Error) -> Error {
    use std::io::ErrorKind;
    match e.kind() {
        ErrorKind::ConnectionReset
        | ErrorKind::BrokenPipe
        | ErrorKind::NotConnected
        | ErrorKind::ConnectionAborted => Error::ConnectionLost,
        _ => Error::Io(e),
    }
}
