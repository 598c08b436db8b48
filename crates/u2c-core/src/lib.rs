//! u2c-core: USB-I2C bridge protocol core for the CH341 controller.
//!
//! The host issues ordinary I2C transactions (ordered lists of read/write
//! messages addressed to bus peripherals); the CH341 bridge understands only
//! a proprietary opcode stream carried over two USB bulk endpoints. This
//! crate is the translation layer between the two: it encodes messages into
//! command blocks, batches them into bounded transfers, and decodes the
//! controller's response frames back into per-message status and payload.
//!
//! # Architecture
//!
//! The crate is organized into layers:
//!
//! - **Protocol**: opcode constants, command encoding, response decoding
//! - **Buffer**: fixed-capacity command accumulation between flushes
//! - **Transport**: USB communication abstraction (nusb, mock)
//! - **Session**: per-device orchestrator for transactions
//! - **Config**: speed grade selection and session settings
//!
//! # Example
//!
//! ```no_run
//! use u2c_core::{BridgeConfig, BridgeSession, NusbTransport};
//!
//! let transport = NusbTransport::open().expect("no bridge attached");
//! let mut session = BridgeSession::open(transport, &BridgeConfig::default())
//!     .expect("session init failed");
//!
//! let mut id = [0u8; 2];
//! session.write_read(0x50, &[0x00], &mut id).expect("transfer failed");
//! ```

mod buffer;
pub mod config;
pub mod error;
pub mod message;
pub mod protocol;
pub mod session;
pub mod transport;

// Re-exports for convenience
pub use config::{BridgeConfig, SpeedGrade};
pub use error::I2cError;
pub use message::I2cMessage;
pub use protocol::{ReplyPhase, Status};
pub use session::BridgeSession;
pub use transport::{MockTransport, NusbTransport, TransportError, UsbTransport};
