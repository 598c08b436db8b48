//! Protocol module - CH341 I2C stream definitions.

pub mod constants;
pub mod encoder;
pub mod reply;

pub use constants::*;
pub use encoder::{
    EncodedCmd, encode_probe, encode_read, encode_set_speed, encode_start, encode_stop,
    encode_write,
};
pub use reply::{ReplyPhase, Status, decode_frame};
