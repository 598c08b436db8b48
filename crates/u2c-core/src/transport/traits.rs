//! USB transport layer abstraction.
//!
//! The core calls outward through exactly two capabilities: one blocking
//! bulk write and one blocking bulk read, each bounded by a deadline.
//! Different implementations (nusb, mock) plug in behind the trait.

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("device not found: VID={vid:04X} PID={pid:04X}")]
    DeviceNotFound { vid: u16, pid: u16 },

    #[error("failed to open device: {0}")]
    OpenFailed(String),

    #[error("failed to claim interface {interface}: {message}")]
    ClaimInterfaceFailed { interface: u8, message: String },

    #[error("bulk {direction} endpoint not found")]
    EndpointNotFound { direction: &'static str },

    #[error("write failed: {0}")]
    WriteFailed(String),

    #[error("short write: {written} of {expected} bytes")]
    ShortWrite { written: usize, expected: usize },

    #[error("read failed: {0}")]
    ReadFailed(String),

    #[error("device disconnected")]
    Disconnected,

    #[error("timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Blocking bulk pipe pair to the bridge controller.
pub trait UsbTransport {
    /// Perform one bulk OUT write of `data`, bounded by `timeout`.
    fn write(&mut self, data: &[u8], timeout: Duration) -> Result<usize, TransportError>;

    /// Perform one bulk IN read into `buf`, bounded by `timeout`.
    /// Returns the number of bytes received.
    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, TransportError>;
}
