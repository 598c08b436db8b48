//! Response frame decoding.
//!
//! Every frame the controller returns carries its status in the trailing
//! byte; the bytes before it are payload.

use super::constants::{
    RESP_BAD_ADDRESS, RESP_DATA_ERROR, RESP_FAILED, RESP_NACK, RESP_NOT_IMPLEMENTED, RESP_OK,
    RESP_TIMEOUT,
};
use crate::error::I2cError;
use crate::transport::TransportError;

/// Controller status, parsed from the trailing byte of a response frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Failed,
    BadAddress,
    DataError,
    NotImplemented,
    Nack,
    Timeout,
    Unknown(u8),
}

impl Status {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            RESP_OK => Self::Ok,
            RESP_FAILED => Self::Failed,
            RESP_BAD_ADDRESS => Self::BadAddress,
            RESP_DATA_ERROR => Self::DataError,
            RESP_NOT_IMPLEMENTED => Self::NotImplemented,
            RESP_NACK => Self::Nack,
            RESP_TIMEOUT => Self::Timeout,
            other => Self::Unknown(other),
        }
    }
}

/// Which acknowledgment a pending frame reports on.
///
/// Assigned at encode time and carried alongside the expected frame; the
/// decoder never infers the phase from a frame's position in the response
/// sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyPhase {
    /// The frame acknowledges the address byte alone (zero-data probe).
    Address,
    /// The frame reports on a data transfer.
    Data,
}

/// Classify one raw frame and strip the status byte off the payload.
pub fn decode_frame(frame: &[u8], phase: ReplyPhase) -> Result<&[u8], I2cError> {
    let (&status, payload) = frame.split_last().ok_or_else(|| {
        I2cError::Transport(TransportError::ReadFailed("empty response frame".into()))
    })?;

    match Status::from_byte(status) {
        Status::Ok => Ok(payload),
        Status::Nack => match phase {
            ReplyPhase::Address => Err(I2cError::NoDevice),
            ReplyPhase::Data => Err(I2cError::Rejected),
        },
        Status::Timeout => Err(I2cError::Timeout),
        _ => Err(I2cError::UnexpectedStatus(status)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_strips_exactly_one_byte() {
        let frame = [0x11, 0x22, 0x33, RESP_OK];
        let payload = decode_frame(&frame, ReplyPhase::Data).unwrap();
        assert_eq!(payload, [0x11, 0x22, 0x33]);
    }

    #[test]
    fn status_only_frame_has_empty_payload() {
        let payload = decode_frame(&[RESP_OK], ReplyPhase::Address).unwrap();
        assert!(payload.is_empty());
    }

    #[test]
    fn timeout_discards_preceding_bytes() {
        let frame = [0xDE, 0xAD, RESP_TIMEOUT];
        assert!(matches!(
            decode_frame(&frame, ReplyPhase::Data),
            Err(I2cError::Timeout)
        ));
    }

    #[test]
    fn nack_classification_follows_phase() {
        assert!(matches!(
            decode_frame(&[RESP_NACK], ReplyPhase::Address),
            Err(I2cError::NoDevice)
        ));
        assert!(matches!(
            decode_frame(&[RESP_NACK], ReplyPhase::Data),
            Err(I2cError::Rejected)
        ));
    }

    #[test]
    fn other_statuses_are_unexpected() {
        for status in [
            RESP_FAILED,
            RESP_BAD_ADDRESS,
            RESP_DATA_ERROR,
            RESP_NOT_IMPLEMENTED,
            0x42,
        ] {
            assert!(matches!(
                decode_frame(&[status], ReplyPhase::Data),
                Err(I2cError::UnexpectedStatus(s)) if s == status
            ));
        }
    }

    #[test]
    fn empty_frame_is_a_transport_error() {
        assert!(matches!(
            decode_frame(&[], ReplyPhase::Data),
            Err(I2cError::Transport(_))
        ));
    }

    #[test]
    fn status_parsing() {
        assert_eq!(Status::from_byte(RESP_OK), Status::Ok);
        assert_eq!(Status::from_byte(RESP_NACK), Status::Nack);
        assert_eq!(Status::from_byte(RESP_TIMEOUT), Status::Timeout);
        assert_eq!(Status::from_byte(0x7E), Status::Unknown(0x7E));
    }
}
