use capture::{LinePrinter, ParsedLogLine};
use std::io::{self, BufWriter, Stdout, Write};

/// Line printer writing to standard output, flushed per line so the stream
/// stays live when piped.
pub struct StdoutPrinter {
    out: BufWriter<Stdout>,
}

impl StdoutPrinter {
    pub fn new() -> Self {
        Self {
            out: BufWriter::new(io::stdout()),
        }
    }
}

impl Default for StdoutPrinter {
    fn default() -> Self {
        Self::new()
    }
}

impl LinePrinter for StdoutPrinter {
    fn print(&mut self, line: &ParsedLogLine) -> io::Result<()> {
        writeln!(self.out, "{line}")?;
        self.out.flush()
    }
}
