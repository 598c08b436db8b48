//! Error taxonomy surfaced to callers of the bridge core.

use thiserror::Error;

use crate::transport::TransportError;

/// Errors produced while encoding, transferring, or decoding a transaction.
#[derive(Error, Debug)]
pub enum I2cError {
    /// Rejected before any I/O was issued: an empty transaction, a
    /// zero-length transfer, or a message too large to encode.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The underlying bulk write or read reported an I/O error.
    #[error("transport failure: {0}")]
    Transport(TransportError),

    /// A bulk call missed its deadline, or the controller timed out
    /// waiting on the bus.
    #[error("transfer timed out")]
    Timeout,

    /// No acknowledge for the address phase; nothing answers at this
    /// address.
    #[error("no device at the addressed location")]
    NoDevice,

    /// The peripheral acknowledged its address but refused data.
    #[error("device rejected data")]
    Rejected,

    /// A block-read length prefix was zero or exceeded the maximum block
    /// size.
    #[error("protocol violation: {0}")]
    ProtocolViolation(&'static str),

    /// The controller returned a status byte outside the known set.
    #[error("unexpected controller status 0x{0:02X}")]
    UnexpectedStatus(u8),
}

impl From<TransportError> for I2cError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout { .. } => I2cError::Timeout,
            other => I2cError::Transport(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_timeout_folds_into_timeout() {
        let err: I2cError = TransportError::Timeout { timeout_ms: 100 }.into();
        assert!(matches!(err, I2cError::Timeout));

        let err: I2cError = TransportError::Disconnected.into();
        assert!(matches!(err, I2cError::Transport(_)));
    }
}
