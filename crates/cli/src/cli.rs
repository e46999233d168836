use clap::Parser;
use clap_verbosity_flag::{Verbosity, WarnLevel};

/// dbwintail: tail debug output from chosen Windows processes
///
/// Attaches to the system-wide debug-output channel and prints the
/// structured log lines emitted by the named executables, with timestamps
/// converted to local time. Runs in the foreground until interrupted.
#[derive(Debug, Parser, Clone)]
#[command(about, long_about, version)]
pub(crate) struct Cli {
    /// Executable names to capture, full filename with extension
    /// (e.g. `myapp.exe`). Matching is exact and case-sensitive.
    ///
    /// With no names given the filter stays empty and nothing is printed.
    pub(crate) process_names: Vec<String>,

    #[command(flatten)]
    pub(crate) verbosity: Verbosity<WarnLevel>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_names_are_collected_in_order() {
        let cli = Cli::parse_from(["dbwintail", "app.exe", "worker.exe"]);
        assert_eq!(cli.process_names, ["app.exe", "worker.exe"]);
    }

    #[test]
    fn zero_names_is_allowed() {
        let cli = Cli::parse_from(["dbwintail"]);
        assert!(cli.process_names.is_empty());
    }
}
