//! Bridge session - long-lived owner of one attached controller and the
//! orchestrator for I2C transactions.

use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use crate::buffer::{CommandBuffer, PendingReply, ReplySink};
use crate::config::{BridgeConfig, SpeedGrade};
use crate::error::I2cError;
use crate::message::I2cMessage;
use crate::protocol::{
    BLOCK_MAX, EncodedCmd, INBUF_LEN, ReplyPhase, SCAN_FIRST_ADDR, SCAN_LAST_ADDR, USB_TIMEOUT_MS,
    decode_frame, encode_probe, encode_read, encode_set_speed, encode_start, encode_stop,
    encode_write,
};
use crate::transport::{TransportError, UsbTransport};

/// Reads attempted when draining stale frames at session open.
const DRAIN_ATTEMPTS: usize = 10;

/// Long-lived owner of one attached bridge.
///
/// A session carries one transaction at a time; exclusive use is enforced
/// through `&mut self`. The command and frame buffers are fixed-capacity
/// and reused across transactions.
pub struct BridgeSession<T: UsbTransport> {
    transport: T,
    buffer: CommandBuffer,
    /// Reusable frame buffer for bulk IN reads.
    ibuf: [u8; INBUF_LEN],
    timeout: Duration,
    speed: SpeedGrade,
}

impl<T: UsbTransport> BridgeSession<T> {
    /// Open a session over `transport`: apply the configured speed grade,
    /// then drain any response frames a previous user left queued in the
    /// controller.
    pub fn open(transport: T, config: &BridgeConfig) -> Result<Self, I2cError> {
        let speed = config.speed_grade();
        let mut session = Self {
            transport,
            buffer: CommandBuffer::new(),
            ibuf: [0; INBUF_LEN],
            timeout: Duration::from_millis(config.timeout_ms.unwrap_or(USB_TIMEOUT_MS)),
            speed,
        };
        session.configure_speed(speed)?;
        session.drain_input();
        info!(speed = ?session.speed, "Bridge session open");
        Ok(session)
    }

    /// Currently configured bus speed grade.
    pub fn speed(&self) -> SpeedGrade {
        self.speed
    }

    /// Reprogram the controller's bus speed.
    pub fn configure_speed(&mut self, grade: SpeedGrade) -> Result<(), I2cError> {
        self.enqueue(&mut [], &encode_set_speed(grade), None)?;
        self.flush(&mut [])?;
        self.speed = grade;
        debug!(speed = ?grade, "Bus speed configured");
        Ok(())
    }

    /// Release the underlying transport.
    pub fn close(self) -> T {
        self.transport
    }

    /// Perform one I2C transaction: an ordered list of messages between a
    /// single start and stop condition.
    ///
    /// Returns the number of messages completed. The first error
    /// encountered is the transaction result; the stop condition is still
    /// emitted and all pending response frames are still drained.
    #[instrument(skip(self, msgs), fields(count = msgs.len()))]
    pub fn transfer(&mut self, msgs: &mut [I2cMessage<'_>]) -> Result<usize, I2cError> {
        if msgs.is_empty() {
            return Err(I2cError::InvalidArgument("empty transaction"));
        }

        // The start block rides in the buffer with the first message.
        let mut result = self.enqueue(msgs, &encode_start(), None);

        if result.is_ok() {
            for index in 0..msgs.len() {
                if let Err(e) = self.process_message(msgs, index) {
                    result = Err(e);
                    break;
                }
            }
        }

        // Always release the bus. A stop failure after an earlier error is
        // discarded; after success it becomes the transaction result.
        let stop_result = self
            .enqueue(msgs, &encode_stop(), None)
            .and_then(|()| self.flush(msgs));
        result.and(stop_result).map(|()| msgs.len())
    }

    /// Write `data` to the peripheral at `address`.
    pub fn write(&mut self, address: u8, data: &[u8]) -> Result<(), I2cError> {
        let mut msgs = [I2cMessage::Write { address, data }];
        self.transfer(&mut msgs).map(|_| ())
    }

    /// Fill `buffer` from the peripheral at `address`.
    pub fn read(&mut self, address: u8, buffer: &mut [u8]) -> Result<(), I2cError> {
        let mut msgs = [I2cMessage::Read {
            address,
            buffer,
            length_prefixed: false,
        }];
        self.transfer(&mut msgs).map(|_| ())
    }

    /// Write then read within a single transaction (register access idiom).
    pub fn write_read(
        &mut self,
        address: u8,
        data: &[u8],
        buffer: &mut [u8],
    ) -> Result<(), I2cError> {
        let mut msgs = [
            I2cMessage::Write { address, data },
            I2cMessage::Read {
                address,
                buffer,
                length_prefixed: false,
            },
        ];
        self.transfer(&mut msgs).map(|_| ())
    }

    /// Address a peripheral without transferring data. Returns whether
    /// anything acknowledged at `address`.
    pub fn probe(&mut self, address: u8) -> Result<bool, I2cError> {
        let cmd = encode_probe(address)?;
        self.enqueue(
            &mut [],
            &cmd,
            Some(PendingReply {
                phase: ReplyPhase::Address,
                expect: 0,
                sink: ReplySink::Discard,
            }),
        )?;
        match self.flush(&mut []) {
            Ok(()) => Ok(true),
            Err(I2cError::NoDevice) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Probe every assignable address and report the ones that acknowledge.
    pub fn scan(&mut self) -> Result<Vec<u8>, I2cError> {
        let mut found = Vec::new();
        for address in SCAN_FIRST_ADDR..=SCAN_LAST_ADDR {
            if self.probe(address)? {
                debug!(address = %format!("0x{:02X}", address), "Peripheral acknowledged");
                found.push(address);
            }
        }
        Ok(found)
    }

    fn process_message(
        &mut self,
        msgs: &mut [I2cMessage<'_>],
        index: usize,
    ) -> Result<(), I2cError> {
        if matches!(
            &msgs[index],
            I2cMessage::Read {
                length_prefixed: true,
                ..
            }
        ) {
            return self.process_block_read(msgs, index);
        }

        let (cmd, reply) = match &msgs[index] {
            I2cMessage::Write { address, data } => (encode_write(*address, data)?, None),
            I2cMessage::Read {
                address, buffer, ..
            } => {
                let len = buffer.len();
                (
                    encode_read(*address, len)?,
                    Some(PendingReply {
                        phase: ReplyPhase::Data,
                        expect: len,
                        sink: ReplySink::Message { index, offset: 0 },
                    }),
                )
            }
        };
        self.enqueue(msgs, &cmd, reply)
    }

    /// Block read: the first byte the peripheral returns announces how many
    /// further bytes follow, so the prefix has to come back before the rest
    /// can be requested.
    fn process_block_read(
        &mut self,
        msgs: &mut [I2cMessage<'_>],
        index: usize,
    ) -> Result<(), I2cError> {
        let address = msgs[index].address();

        let cmd = encode_read(address, 1)?;
        self.enqueue(
            msgs,
            &cmd,
            Some(PendingReply {
                phase: ReplyPhase::Data,
                expect: 1,
                sink: ReplySink::Message { index, offset: 0 },
            }),
        )?;
        self.flush(msgs)?;

        let remaining = match &msgs[index] {
            I2cMessage::Read { buffer, .. } => {
                let prefix = buffer[0] as usize;
                if prefix == 0 || prefix > BLOCK_MAX {
                    return Err(I2cError::ProtocolViolation(
                        "block length prefix out of range",
                    ));
                }
                if buffer.len() < 1 + prefix {
                    return Err(I2cError::InvalidArgument(
                        "buffer too small for announced block",
                    ));
                }
                prefix
            }
            I2cMessage::Write { .. } => return Err(I2cError::InvalidArgument("not a block read")),
        };

        let cmd = encode_read(address, remaining)?;
        self.enqueue(
            msgs,
            &cmd,
            Some(PendingReply {
                phase: ReplyPhase::Data,
                expect: remaining,
                sink: ReplySink::Message { index, offset: 1 },
            }),
        )
    }

    /// Append an encoded block, flushing first when it does not fit and
    /// afterwards when the buffer crosses the forced-flush threshold.
    fn enqueue(
        &mut self,
        msgs: &mut [I2cMessage<'_>],
        cmd: &EncodedCmd,
        reply: Option<PendingReply>,
    ) -> Result<(), I2cError> {
        if !self.buffer.fits(cmd) {
            self.flush(msgs)?;
        }
        self.buffer.append(cmd, reply);
        if self.buffer.wants_flush() {
            self.flush(msgs)?;
        }
        Ok(())
    }

    /// Hand the accumulated buffer to the transport: one bulk OUT write,
    /// then one bulk IN read per pending reply. Every expected read is
    /// attempted even after a failure so the controller's queue stays in
    /// step; the first failure is the result. The buffer is reset
    /// unconditionally.
    fn flush(&mut self, msgs: &mut [I2cMessage<'_>]) -> Result<(), I2cError> {
        if self.buffer.is_empty() {
            return Err(I2cError::InvalidArgument("nothing to flush"));
        }

        debug!(
            olen = self.buffer.len(),
            commands = self.buffer.commands(),
            frames = self.buffer.replies().len(),
            expect = self.buffer.expected_bytes(),
            "Flushing command buffer"
        );

        let mut first_err: Option<I2cError> = self
            .transport
            .write(self.buffer.as_bytes(), self.timeout)
            .err()
            .map(I2cError::from);

        for reply in self.buffer.replies() {
            let read = self.transport.read(&mut self.ibuf, self.timeout);
            if first_err.is_some() {
                // Already failed; this read only drains the queue.
                continue;
            }
            let n = match read {
                Ok(n) => n,
                Err(e) => {
                    first_err = Some(e.into());
                    continue;
                }
            };
            match decode_frame(&self.ibuf[..n], reply.phase) {
                Ok(payload) => {
                    if payload.len() < reply.expect {
                        first_err = Some(I2cError::Transport(TransportError::ReadFailed(
                            format!("short frame: {} of {} bytes", payload.len(), reply.expect),
                        )));
                        continue;
                    }
                    if let ReplySink::Message { index, offset } = reply.sink
                        && let I2cMessage::Read { buffer, .. } = &mut msgs[index]
                    {
                        buffer[offset..offset + reply.expect]
                            .copy_from_slice(&payload[..reply.expect]);
                    }
                }
                Err(e) => first_err = Some(e),
            }
        }

        self.buffer.reset();
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Drain response frames a previous user left queued in the controller.
    /// If stale frames are never retrieved the controller eventually stops
    /// responding.
    fn drain_input(&mut self) {
        for _ in 0..DRAIN_ATTEMPTS {
            match self.transport.read(&mut self.ibuf, self.timeout) {
                Ok(0) | Err(_) => return,
                Ok(n) => debug!(bytes = n, "Discarded stale frame"),
            }
        }
        warn!("controller input queue still not empty after {DRAIN_ATTEMPTS} reads");
    }
}
