use crate::format::ParsedLogLine;
use std::io;

/// Sink for accepted, fully formatted log lines.
///
/// The capture loop owns exactly one printer; a write failure is fatal for
/// the loop (the output stream is the whole point of the tool).
pub trait LinePrinter {
    fn print(&mut self, line: &ParsedLogLine) -> io::Result<()>;
}

/// Printer that collects rendered lines in memory. Backs tests and
/// embedders that want lines without a console.
#[derive(Debug, Default)]
pub struct MemoryPrinter {
    lines: Vec<String>,
}

impl MemoryPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl LinePrinter for MemoryPrinter {
    fn print(&mut self, line: &ParsedLogLine) -> io::Result<()> {
        self.lines.push(line.to_string());
        Ok(())
    }
}
