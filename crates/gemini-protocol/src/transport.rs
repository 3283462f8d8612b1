//! MIDI transport interface.
//!
//! The protocol needs only three things from a MIDI backend: send one SysEx
//! message, wait a bounded time for one SysEx message, and find the module's
//! port by name. Backends implement [`Transport`] (and [`Connect`] if they can
//! open ports by name).

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

/// A MIDI connection that carries SysEx messages.
pub trait Transport {
    /// Send one SysEx message. `message` is the frame body; the backend adds
    /// the SysEx start/end status bytes if it needs them.
    fn send_sysex(&mut self, message: &[u8]) -> io::Result<()>;

    /// Block for the next SysEx message.
    ///
    /// Returns `Ok(None)` if nothing arrived within `timeout`.
    fn receive_sysex(&mut self, timeout: Duration) -> io::Result<Option<Vec<u8>>>;
}

/// A transport that can open a port by name.
pub trait Connect: Transport + Sized {
    /// Open the input/output port pair whose name contains `port_name`.
    fn connect(port_name: &str) -> io::Result<Self>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn send_sysex(&mut self, message: &[u8]) -> io::Result<()> {
        (**self).send_sysex(message)
    }

    fn receive_sysex(&mut self, timeout: Duration) -> io::Result<Option<Vec<u8>>> {
        (**self).receive_sysex(timeout)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send_sysex(&mut self, message: &[u8]) -> io::Result<()> {
        (**self).send_sysex(message)
    }

    fn receive_sysex(&mut self, timeout: Duration) -> io::Result<Option<Vec<u8>>> {
        (**self).receive_sysex(timeout)
    }
}

/// In-memory transport that records sent messages and replays queued replies.
///
/// Useful for exercising the protocol without hardware. An empty reply queue
/// behaves like a timeout.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    sent: Vec<Vec<u8>>,
    replies: VecDeque<Vec<u8>>,
}

impl MemoryTransport {
    /// Create an empty transport.
    pub fn new() -> Self {
        MemoryTransport::default()
    }

    /// Queue a message to be returned by a later `receive_sysex`.
    pub fn push_reply(&mut self, message: Vec<u8>) {
        self.replies.push_back(message);
    }

    /// Messages sent so far, oldest first.
    pub fn sent(&self) -> &[Vec<u8>] {
        &self.sent
    }

    /// Take the messages sent so far, leaving the log empty.
    pub fn take_sent(&mut self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.sent)
    }

    /// Number of replies not yet received.
    pub fn pending_replies(&self) -> usize {
        self.replies.len()
    }
}

impl Transport for MemoryTransport {
    fn send_sysex(&mut self, message: &[u8]) -> io::Result<()> {
        self.sent.push(message.to_vec());
        Ok(())
    }

    fn receive_sysex(&mut self, _timeout: Duration) -> io::Result<Option<Vec<u8>>> {
        Ok(self.replies.pop_front())
    }
}
