use std::io;

/// Represents all possible errors that can occur in this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The OS rejected creation of the shared buffer or one of the named
    /// events. Fatal: the channel cannot operate without them.
    #[error("Failed to set up debug capture channel: {0}")]
    OsResource(#[source] io::Error),

    /// The debug broadcast broker only exists on Windows.
    #[error("Debug output capture is only supported on Windows")]
    UnsupportedPlatform,

    /// The 19-character timestamp prefix did not match `YYYY-MM-DDTHH:MM:SS`.
    ///
    /// Recoverable: the offending log line is dropped whole, never printed
    /// with a partial timestamp.
    #[error("Malformed timestamp prefix: {0:?}")]
    MalformedTimestamp(String),

    /// The raw line did not have the expected comma-delimited shape.
    ///
    /// Recoverable: the line is dropped and the capture loop continues.
    #[error("Log line does not match the expected structure")]
    UnparseableLine,

    /// A process directory snapshot could not be taken. Recoverable: that
    /// refresh cycle is skipped and the previous filter set stays active.
    #[error("Failed to query the process directory: {0}")]
    DirectoryQuery(String),

    /// Error occurred while writing a formatted line to the output sink.
    #[error("Failed to write output line: {0}")]
    OutputWrite(#[from] io::Error),
}
