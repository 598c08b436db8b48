//! I2C message model.

/// One logical bus operation within a transaction.
///
/// The caller owns the payload buffers for the duration of the transfer;
/// read payloads are written back in place once the response frames arrive.
pub enum I2cMessage<'a> {
    /// Write `data` to the peripheral at `address`.
    Write { address: u8, data: &'a [u8] },
    /// Read `buffer.len()` bytes from the peripheral at `address`.
    Read {
        address: u8,
        buffer: &'a mut [u8],
        /// The first received byte announces how many further bytes follow
        /// (block-read mode). The prefix itself lands in `buffer[0]`.
        length_prefixed: bool,
    },
}

impl I2cMessage<'_> {
    /// 7-bit peripheral address.
    pub fn address(&self) -> u8 {
        match self {
            Self::Write { address, .. } | Self::Read { address, .. } => *address,
        }
    }

    pub fn is_read(&self) -> bool {
        matches!(self, Self::Read { .. })
    }
}
