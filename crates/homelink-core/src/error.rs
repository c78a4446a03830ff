//! Error types for homelink.
//!
//! All fallible operations across the workspace return [`Result<T>`], which
//! uses [`Error`] as the error type. Transport-layer, protocol-layer, and
//! entity-layer failures are all captured here.

/// The error type for all homelink operations.
///
/// Variants separate the failure modes a host needs to tell apart: a device
/// that did not answer, a device that answered with something unusable, and
/// a caller that asked for something out of range.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A transport-level error (serial port, TCP socket, HTTP request).
    #[error("transport error: {0}")]
    Transport(String),

    /// A protocol-level error (malformed status line, unexpected JSON body).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Timed out waiting for a response from the device or bridge.
    #[error("timeout waiting for response")]
    Timeout,

    /// An invalid parameter was passed to a device command.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// No connection to the device has been established.
    #[error("not connected")]
    NotConnected,

    /// The connection to the device was lost unexpectedly.
    #[error("connection lost")]
    ConnectionLost,

    /// The device answered, but not with a status this adapter recognizes.
    ///
    /// Hosts should show the entity as unavailable rather than off.
    #[error("status unavailable: {0}")]
    Unavailable(String),

    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;
