//! Fixed-capacity command accumulation between flushes.

use crate::protocol::{EncodedCmd, FLUSH_LEN, OUTBUF_LEN, ReplyPhase};

/// Where a decoded payload lands.
#[derive(Debug, Clone, Copy)]
pub(crate) enum ReplySink {
    /// Discard the payload; only the status matters.
    Discard,
    /// Copy into the transaction's message `index`, starting at `offset`.
    Message { index: usize, offset: usize },
}

/// One bulk IN frame the controller owes us after the next flush.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PendingReply {
    pub phase: ReplyPhase,
    /// Payload bytes expected ahead of the status byte.
    pub expect: usize,
    pub sink: ReplySink,
}

/// The smallest reply-bearing block is six bytes, so this bounds the reply
/// table for a full buffer.
const MAX_REPLIES: usize = OUTBUF_LEN / 6 + 1;

/// Session-owned accumulator for encoded command blocks.
///
/// Length never exceeds capacity: the session flushes first when a block
/// does not fit. `reset` clears length, command count and the reply table
/// in one step, tied to the transfer whether it succeeded or not.
pub(crate) struct CommandBuffer {
    bytes: [u8; OUTBUF_LEN],
    len: usize,
    /// Logical command blocks enqueued since the last flush.
    commands: usize,
    replies: [PendingReply; MAX_REPLIES],
    reply_count: usize,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self {
            bytes: [0; OUTBUF_LEN],
            len: 0,
            commands: 0,
            replies: [PendingReply {
                phase: ReplyPhase::Data,
                expect: 0,
                sink: ReplySink::Discard,
            }; MAX_REPLIES],
            reply_count: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn commands(&self) -> usize {
        self.commands
    }

    /// True when nothing is staged for transfer.
    pub fn is_empty(&self) -> bool {
        self.len == 0 || self.commands == 0
    }

    pub fn remaining(&self) -> usize {
        OUTBUF_LEN - self.len
    }

    /// True once the buffer has grown within the safety margin of capacity.
    pub fn wants_flush(&self) -> bool {
        self.len >= FLUSH_LEN
    }

    /// True if `cmd` can be appended without flushing first.
    pub fn fits(&self, cmd: &EncodedCmd) -> bool {
        cmd.len() <= self.remaining()
    }

    /// Append an encoded block. The caller must have flushed if it does
    /// not fit.
    pub fn append(&mut self, cmd: &EncodedCmd, reply: Option<PendingReply>) {
        debug_assert!(self.fits(cmd));
        let src = cmd.as_bytes();
        self.bytes[self.len..self.len + src.len()].copy_from_slice(src);
        self.len += src.len();
        self.commands += 1;
        if let Some(reply) = reply {
            debug_assert!(self.reply_count < MAX_REPLIES);
            self.replies[self.reply_count] = reply;
            self.reply_count += 1;
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    pub fn replies(&self) -> &[PendingReply] {
        &self.replies[..self.reply_count]
    }

    /// Total payload bytes expected across the upcoming response frames.
    pub fn expected_bytes(&self) -> usize {
        self.replies().iter().map(|r| r.expect).sum()
    }

    /// Clear length, command count and the reply table in one step.
    pub fn reset(&mut self) {
        self.len = 0;
        self.commands = 0;
        self.reply_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{encode_read, encode_write};

    #[test]
    fn append_accounts_bytes_and_commands() {
        let mut buffer = CommandBuffer::new();
        assert!(buffer.is_empty());

        let cmd = encode_write(0x50, &[0x10]).unwrap();
        buffer.append(&cmd, None);
        assert_eq!(buffer.len(), 7);
        assert_eq!(buffer.commands(), 1);
        assert_eq!(buffer.remaining(), OUTBUF_LEN - 7);
        assert!(!buffer.is_empty());
        assert!(!buffer.wants_flush());
    }

    #[test]
    fn reply_table_bookkeeping() {
        let mut buffer = CommandBuffer::new();
        let cmd = encode_read(0x50, 4).unwrap();
        buffer.append(
            &cmd,
            Some(PendingReply {
                phase: ReplyPhase::Data,
                expect: 4,
                sink: ReplySink::Message {
                    index: 0,
                    offset: 0,
                },
            }),
        );
        buffer.append(
            &cmd,
            Some(PendingReply {
                phase: ReplyPhase::Data,
                expect: 4,
                sink: ReplySink::Message {
                    index: 1,
                    offset: 0,
                },
            }),
        );
        assert_eq!(buffer.replies().len(), 2);
        assert_eq!(buffer.expected_bytes(), 8);
    }

    #[test]
    fn wants_flush_at_threshold() {
        let mut buffer = CommandBuffer::new();
        let cmd = encode_write(0x50, &[0u8; 32]).unwrap(); // 38 bytes each
        for _ in 0..3 {
            buffer.append(&cmd, None);
            assert!(!buffer.wants_flush());
        }
        // 114 staged; a 10-byte block crosses the 124-byte threshold.
        let small = encode_write(0x50, &[0u8; 4]).unwrap();
        assert!(buffer.fits(&small));
        buffer.append(&small, None);
        assert!(buffer.wants_flush());
    }

    #[test]
    fn reset_clears_everything() {
        let mut buffer = CommandBuffer::new();
        let cmd = encode_read(0x50, 1).unwrap();
        buffer.append(
            &cmd,
            Some(PendingReply {
                phase: ReplyPhase::Data,
                expect: 1,
                sink: ReplySink::Discard,
            }),
        );
        buffer.reset();
        assert!(buffer.is_empty());
        assert_eq!(buffer.len(), 0);
        assert_eq!(buffer.commands(), 0);
        assert!(buffer.replies().is_empty());
    }
}
