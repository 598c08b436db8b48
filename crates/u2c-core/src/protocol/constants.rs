//! Wire constants for the CH341 bridge controller.
//!
//! Opcode values follow the WinChipHead vendor protocol for the CH341/CH341A
//! I2C stream interface.

// ============================================================================
// Device Identification
// ============================================================================

/// WinChipHead (WCH) vendor ID.
pub const CH341_VENDOR_ID: u16 = 0x1A86;
/// CH341 in memory/I2C mode.
pub const CH341_PRODUCT_ID: u16 = 0x5512;

// ============================================================================
// I2C Stream Opcodes (Host -> Controller)
// ============================================================================

/// Identifies an I2C stream command block.
pub const CMD_I2C_STREAM: u8 = 0xAA;

/// Emit a start condition on the bus.
pub const STM_STA: u8 = 0x74;
/// Emit a stop condition on the bus.
pub const STM_STO: u8 = 0x75;
/// Send N bytes; N carried in the low six bits.
pub const STM_OUT: u8 = 0x80;
/// Receive N bytes; N carried in the low six bits.
pub const STM_IN: u8 = 0xC0;
/// Set the bus speed; 2-bit grade carried in the low bits.
pub const STM_SET: u8 = 0x60;
/// Terminates a stream command block.
pub const STM_END: u8 = 0x00;

/// Largest byte count one OUT/IN directive can carry.
/// min(0x3F directive field, 32-byte controller packet).
pub const STM_MAX: usize = 32;

// ============================================================================
// Buffers and Timing
// ============================================================================

/// Output (command) buffer capacity.
pub const OUTBUF_LEN: usize = 128;
/// Forced-flush threshold: capacity minus a safety margin.
pub const FLUSH_LEN: usize = OUTBUF_LEN - 4;
/// Input buffer capacity; upper bound on one response frame.
pub const INBUF_LEN: usize = 256;

/// Per-call bulk transfer deadline.
pub const USB_TIMEOUT_MS: u64 = 100;

/// Worst-case encoded size of a single command block (full write payload).
pub const ENCODED_MAX: usize = STM_MAX + 6;

/// Largest length a block-read prefix byte may announce.
pub const BLOCK_MAX: usize = 32;

// ============================================================================
// Response Status Bytes (Controller -> Host, trailing byte of each frame)
// ============================================================================

/// Command completed.
pub const RESP_OK: u8 = 0x00;
/// Generic failure.
pub const RESP_FAILED: u8 = 0x01;
/// Bad address parameter.
pub const RESP_BAD_ADDRESS: u8 = 0x04;
/// Data error.
pub const RESP_DATA_ERROR: u8 = 0x05;
/// Command not implemented by this firmware.
pub const RESP_NOT_IMPLEMENTED: u8 = 0x06;
/// Peripheral did not acknowledge.
pub const RESP_NACK: u8 = 0x07;
/// Controller timed out waiting on the bus.
pub const RESP_TIMEOUT: u8 = 0x09;

// ============================================================================
// Bus Scan Range
// ============================================================================

/// First 7-bit address probed by a bus scan.
pub const SCAN_FIRST_ADDR: u8 = 0x03;
/// Last 7-bit address probed by a bus scan.
pub const SCAN_LAST_ADDR: u8 = 0x77;
