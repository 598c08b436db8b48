//! Mock USB transport for testing.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::traits::{TransportError, UsbTransport};

struct MockState {
    /// Frames returned by successive reads.
    frame_queue: VecDeque<Vec<u8>>,
    /// Captured writes.
    write_log: Vec<Vec<u8>>,
    /// Bulk reads issued so far, whether or not a frame was available.
    reads_issued: usize,
    /// Whether the device is "connected".
    connected: bool,
    /// Fail the next write with an injected I/O error.
    fail_next_write: bool,
}

/// Mock transport for unit testing the session orchestration.
///
/// Clones share state, so a test can keep a handle for inspection while
/// the session owns the transport.
#[derive(Clone)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                frame_queue: VecDeque::new(),
                write_log: Vec::new(),
                reads_issued: 0,
                connected: true,
                fail_next_write: false,
            })),
        }
    }

    /// Queue a response frame: payload followed by the given status byte.
    pub fn queue_frame(&self, payload: &[u8], status: u8) {
        let mut frame = payload.to_vec();
        frame.push(status);
        self.state.lock().unwrap().frame_queue.push_back(frame);
    }

    /// Queue a raw frame without appending a status byte.
    pub fn queue_raw(&self, frame: &[u8]) {
        self.state
            .lock()
            .unwrap()
            .frame_queue
            .push_back(frame.to_vec());
    }

    /// Get all captured writes.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.state.lock().unwrap().write_log.clone()
    }

    /// Clear captured writes.
    pub fn clear_writes(&self) {
        self.state.lock().unwrap().write_log.clear();
    }

    /// Number of bulk reads issued so far.
    pub fn reads_issued(&self) -> usize {
        self.state.lock().unwrap().reads_issued
    }

    /// Simulate device disconnect.
    pub fn disconnect(&self) {
        self.state.lock().unwrap().connected = false;
    }

    /// Fail the next write with an injected I/O error.
    pub fn fail_next_write(&self) {
        self.state.lock().unwrap().fail_next_write = true;
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl UsbTransport for MockTransport {
    fn write(&mut self, data: &[u8], _timeout: Duration) -> Result<usize, TransportError> {
        let mut state = self.state.lock().unwrap();
        if !state.connected {
            return Err(TransportError::Disconnected);
        }
        if state.fail_next_write {
            state.fail_next_write = false;
            return Err(TransportError::WriteFailed("injected failure".into()));
        }
        state.write_log.push(data.to_vec());
        Ok(data.len())
    }

    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, TransportError> {
        let mut state = self.state.lock().unwrap();
        state.reads_issued += 1;
        if !state.connected {
            return Err(TransportError::Disconnected);
        }
        match state.frame_queue.pop_front() {
            Some(frame) => {
                let n = frame.len().min(buf.len());
                buf[..n].copy_from_slice(&frame[..n]);
                Ok(n)
            }
            None => Err(TransportError::Timeout {
                timeout_ms: timeout.as_millis() as u64,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::constants::{RESP_NACK, RESP_OK};

    const TIMEOUT: Duration = Duration::from_millis(100);

    #[test]
    fn frames_come_back_in_order() {
        let mock = MockTransport::new();
        mock.queue_frame(&[0x11], RESP_OK);
        mock.queue_frame(&[], RESP_NACK);

        let mut handle = mock.clone();
        let mut buf = [0u8; 8];

        let n = handle.read(&mut buf, TIMEOUT).unwrap();
        assert_eq!(&buf[..n], [0x11, RESP_OK]);

        let n = handle.read(&mut buf, TIMEOUT).unwrap();
        assert_eq!(&buf[..n], [RESP_NACK]);

        // Queue is empty now
        assert!(matches!(
            handle.read(&mut buf, TIMEOUT),
            Err(TransportError::Timeout { .. })
        ));
        assert_eq!(mock.reads_issued(), 3);
    }

    #[test]
    fn writes_are_captured() {
        let mock = MockTransport::new();
        let mut handle = mock.clone();
        handle.write(b"hello", TIMEOUT).unwrap();
        handle.write(b"world", TIMEOUT).unwrap();

        let writes = mock.writes();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0], b"hello");
        assert_eq!(writes[1], b"world");
    }

    #[test]
    fn disconnect_fails_both_directions() {
        let mock = MockTransport::new();
        let mut handle = mock.clone();
        mock.disconnect();

        let mut buf = [0u8; 4];
        assert!(matches!(
            handle.write(b"x", TIMEOUT),
            Err(TransportError::Disconnected)
        ));
        assert!(matches!(
            handle.read(&mut buf, TIMEOUT),
            Err(TransportError::Disconnected)
        ));
    }

    #[test]
    fn injected_write_failure_fires_once() {
        let mock = MockTransport::new();
        let mut handle = mock.clone();
        mock.fail_next_write();

        assert!(handle.write(b"x", TIMEOUT).is_err());
        assert!(handle.write(b"x", TIMEOUT).is_ok());
    }
}
