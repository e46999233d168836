use crate::Error;
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System};

/// One live process as reported by the OS process directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessRecord {
    pub pid: u32,
    /// Executable filename, extension included (e.g. `myapp.exe`).
    pub name: String,
}

/// Source of `(pid, executable-name)` snapshots for the filter refresh loop.
///
/// Implementations travel into the spawned refresh task, hence `Send`.
pub trait ProcessDirectory: Send {
    fn snapshot(&mut self) -> Result<Vec<ProcessRecord>, Error>;
}

/// Directory backed by the live system process table.
#[derive(Debug, Default)]
pub struct SystemProcessDirectory {
    system: System,
}

impl SystemProcessDirectory {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }
}

impl ProcessDirectory for SystemProcessDirectory {
    fn snapshot(&mut self) -> Result<Vec<ProcessRecord>, Error> {
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing(),
        );
        let records = self
            .system
            .processes()
            .iter()
            .map(|(pid, process)| ProcessRecord {
                pid: pid.as_u32(),
                name: process.name().to_string_lossy().into_owned(),
            })
            .collect();
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reports_this_process() {
        let mut directory = SystemProcessDirectory::new();
        let records = directory.snapshot().unwrap();
        let me = std::process::id();
        assert!(records.iter().any(|r| r.pid == me));
    }
}
