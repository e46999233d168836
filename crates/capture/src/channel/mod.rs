//! The capture channel: request/consume handshake with the system debug
//! broker over one shared 4096-byte buffer and two named events.
//!
//! The protocol is strict one-message-at-a-time handoff. The consumer
//! signals "buffer ready" exactly once, blocks on "data ready", then reads
//! the buffer and loops. There is no queue on either side: a producer that
//! fires while the consumer is still busy overwrites the buffer, and
//! messages are lost under load. That is the drop policy of the OS
//! mechanism, accepted here rather than papered over with buffering.

#[cfg(windows)]
mod dbwin;

#[cfg(windows)]
pub use dbwin::DbwinTransport;

use crate::{
    Error, filter::ProcessFilterSet, format::parse_structured_line, printer::LinePrinter,
    stats::CaptureStats,
};
use std::{borrow::Cow, fmt, mem, sync::Arc};
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Total size of the shared section, fixed by the OS convention.
pub const BUFFER_SIZE: usize = 4096;

/// Bytes available for payload text after the leading pid field.
pub const PAYLOAD_CAPACITY: usize = BUFFER_SIZE - mem::size_of::<u32>();

/// One message as laid out by the debug broker in the shared section: the
/// sender's pid followed by NUL-terminated or buffer-bound text. Field
/// order and total size must match the convention byte for byte, since
/// arbitrary producers on the machine write this layout.
#[repr(C)]
#[derive(Clone)]
pub struct RawDebugMessage {
    pid: u32,
    payload: [u8; PAYLOAD_CAPACITY],
}

impl RawDebugMessage {
    /// Build a message the way a producer would, truncating `text` to the
    /// payload capacity.
    pub fn new(pid: u32, text: &str) -> Self {
        let mut payload = [0u8; PAYLOAD_CAPACITY];
        let bytes = text.as_bytes();
        let len = bytes.len().min(PAYLOAD_CAPACITY);
        payload[..len].copy_from_slice(&bytes[..len]);
        Self { pid, payload }
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Payload text up to the first NUL, or the full capacity when the
    /// producer filled the buffer without terminating it. Non-UTF-8 bytes
    /// are replaced lossily.
    pub fn text(&self) -> Cow<'_, str> {
        let end = self
            .payload
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(PAYLOAD_CAPACITY);
        String::from_utf8_lossy(&self.payload[..end])
    }
}

impl fmt::Debug for RawDebugMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawDebugMessage")
            .field("pid", &self.pid)
            .field("text", &self.text())
            .finish()
    }
}

/// Result of waiting for the producer side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// A message is sitting in the shared buffer.
    Ready,
    /// The transport is gone. The live Win32 transport never reports this;
    /// scripted transports use it to end the loop deterministically.
    Closed,
}

/// The OS face of the capture channel.
pub trait DebugTransport {
    /// Tell the producer side the shared buffer may be overwritten.
    fn signal_buffer_ready(&mut self) -> Result<(), Error>;

    /// Block until a producer has filled the shared buffer. No timeout is
    /// applied: absence of debug output is the normal idle state.
    fn wait_data_ready(&mut self) -> Result<WaitOutcome, Error>;

    /// Copy the message currently in the shared buffer.
    fn read_message(&mut self) -> RawDebugMessage;
}

/// Create-or-attach to the system-wide `DBWIN` objects.
#[cfg(windows)]
pub fn open_system_transport() -> Result<Box<dyn DebugTransport + Send>, Error> {
    Ok(Box::new(DbwinTransport::open()?))
}

#[cfg(not(windows))]
pub fn open_system_transport() -> Result<Box<dyn DebugTransport + Send>, Error> {
    Err(Error::UnsupportedPlatform)
}

/// Owns the transport handles and runs the receive handshake.
pub struct CaptureChannel {
    transport: Box<dyn DebugTransport + Send>,
    stats: Arc<CaptureStats>,
}

impl CaptureChannel {
    pub fn new(transport: Box<dyn DebugTransport + Send>) -> Self {
        Self {
            transport,
            stats: Arc::new(CaptureStats::default()),
        }
    }

    /// Handle to the channel's diagnostics counters.
    pub fn stats(&self) -> Arc<CaptureStats> {
        Arc::clone(&self.stats)
    }

    /// Run the handshake until `cancel` fires or the transport closes.
    ///
    /// Each round: re-arm "buffer ready" once, block on "data ready", copy
    /// the message, check the sender against `filter`, and either print the
    /// parsed line or count the drop. Blocking; run on a dedicated thread.
    /// The token is only checked between messages — the indefinite wait is
    /// interrupted by the next message or process exit, nothing else.
    pub fn receive_loop(
        &mut self,
        filter: &ProcessFilterSet,
        printer: &mut dyn LinePrinter,
        cancel: &CancellationToken,
    ) -> Result<(), Error> {
        while !cancel.is_cancelled() {
            self.transport.signal_buffer_ready()?;
            match self.transport.wait_data_ready()? {
                WaitOutcome::Ready => {}
                WaitOutcome::Closed => break,
            }

            let message = self.transport.read_message();
            self.stats.record_received();

            if !filter.contains(message.pid()) {
                self.stats.record_filtered_out();
                continue;
            }

            match parse_structured_line(&message.text()) {
                Ok(line) => {
                    printer.print(&line)?;
                    self.stats.record_printed();
                }
                Err(err) => {
                    self.stats.record_parse_failure();
                    trace!(?err, pid = message.pid(), "dropped undecodable message");
                }
            }
        }
        Ok(())
    }
}
