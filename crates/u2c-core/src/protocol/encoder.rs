//! Opcode stream encoding.
//!
//! Pure functions mapping one bus operation to the command block the
//! controller consumes. No I/O happens here; anything that cannot be
//! encoded is rejected up front.

use super::constants::{
    CMD_I2C_STREAM, ENCODED_MAX, STM_END, STM_IN, STM_MAX, STM_OUT, STM_SET, STM_STA, STM_STO,
};
use crate::config::SpeedGrade;
use crate::error::I2cError;

/// One encoded command block, sized for the worst case.
#[derive(Debug, Clone, Copy)]
pub struct EncodedCmd {
    bytes: [u8; ENCODED_MAX],
    len: usize,
}

impl EncodedCmd {
    fn empty() -> Self {
        Self {
            bytes: [0; ENCODED_MAX],
            len: 0,
        }
    }

    fn push(&mut self, byte: u8) {
        self.bytes[self.len] = byte;
        self.len += 1;
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

fn check_address(address: u8) -> Result<(), I2cError> {
    if address > 0x7F {
        return Err(I2cError::InvalidArgument("address exceeds 7 bits"));
    }
    Ok(())
}

/// Encode a write of `data` to the peripheral at `address`.
///
/// Produces `data.len() + 6` bytes: stream marker, start, send directive
/// with the count in the low bits, address with the write bit clear, the
/// payload, stop, terminator.
pub fn encode_write(address: u8, data: &[u8]) -> Result<EncodedCmd, I2cError> {
    check_address(address)?;
    if data.is_empty() {
        return Err(I2cError::InvalidArgument("zero-length write"));
    }
    if data.len() > STM_MAX {
        return Err(I2cError::InvalidArgument("write exceeds per-frame maximum"));
    }

    let mut cmd = EncodedCmd::empty();
    cmd.push(CMD_I2C_STREAM);
    cmd.push(STM_STA);
    cmd.push(STM_OUT | data.len() as u8);
    cmd.push(address << 1);
    for &byte in data {
        cmd.push(byte);
    }
    cmd.push(STM_STO);
    cmd.push(STM_END);
    Ok(cmd)
}

/// Encode a read of `len` bytes from the peripheral at `address`.
///
/// Always 7 bytes; the requested count rides in the receive directive.
pub fn encode_read(address: u8, len: usize) -> Result<EncodedCmd, I2cError> {
    check_address(address)?;
    if len == 0 {
        return Err(I2cError::InvalidArgument("zero-length read"));
    }
    if len > STM_MAX {
        return Err(I2cError::InvalidArgument("read exceeds per-frame maximum"));
    }

    let mut cmd = EncodedCmd::empty();
    cmd.push(CMD_I2C_STREAM);
    cmd.push(STM_STA);
    cmd.push(STM_OUT | 1);
    cmd.push((address << 1) | 1);
    cmd.push(STM_IN | len as u8);
    cmd.push(STM_STO);
    cmd.push(STM_END);
    Ok(cmd)
}

/// Encode a zero-data address probe.
///
/// The peripheral's acknowledge (or the lack of it) is the only information
/// exchanged; the resulting frame carries a status byte and nothing else.
pub fn encode_probe(address: u8) -> Result<EncodedCmd, I2cError> {
    check_address(address)?;

    let mut cmd = EncodedCmd::empty();
    cmd.push(CMD_I2C_STREAM);
    cmd.push(STM_STA);
    cmd.push(STM_OUT | 1);
    cmd.push(address << 1);
    cmd.push(STM_STO);
    cmd.push(STM_END);
    Ok(cmd)
}

/// Encode a standalone start condition.
pub fn encode_start() -> EncodedCmd {
    let mut cmd = EncodedCmd::empty();
    cmd.push(CMD_I2C_STREAM);
    cmd.push(STM_STA);
    cmd.push(STM_END);
    cmd
}

/// Encode a standalone stop condition.
pub fn encode_stop() -> EncodedCmd {
    let mut cmd = EncodedCmd::empty();
    cmd.push(CMD_I2C_STREAM);
    cmd.push(STM_STO);
    cmd.push(STM_END);
    cmd
}

/// Encode a bus speed change. The 2-bit grade rides in the low bits of the
/// speed-set opcode.
pub fn encode_set_speed(grade: SpeedGrade) -> EncodedCmd {
    let mut cmd = EncodedCmd::empty();
    cmd.push(CMD_I2C_STREAM);
    cmd.push(STM_SET | (grade.bits() & 0x03));
    cmd.push(STM_END);
    cmd
}
