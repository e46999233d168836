//! Core of the debug-output listener: the capture channel that speaks the
//! `DBWIN_*` handshake with the system debug broker, the process filter it
//! consults for every message, and the log-line parser/formatter.
//!
//! The OS-facing edges (process enumeration, the Win32 transport, console
//! output) sit behind traits so the loops can be driven in tests without a
//! live broker.

pub mod channel;
pub mod directory;
mod error;
pub mod filter;
pub mod format;
pub mod printer;
pub mod stats;

pub use channel::{CaptureChannel, DebugTransport, RawDebugMessage, WaitOutcome};
pub use directory::{ProcessDirectory, ProcessRecord, SystemProcessDirectory};
pub use error::Error;
pub use filter::ProcessFilterSet;
pub use format::ParsedLogLine;
pub use printer::LinePrinter;
pub use stats::CaptureStats;
