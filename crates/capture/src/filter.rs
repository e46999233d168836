use crate::directory::ProcessDirectory;
use parking_lot::Mutex;
use std::{collections::BTreeSet, sync::Arc, time::Duration};
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// How often the filter set is rebuilt from the process directory.
pub const REFRESH_INTERVAL: Duration = Duration::from_millis(500);

/// Shared set of process ids whose debug output should be surfaced.
///
/// Cloning hands out another handle to the same set. A single lock covers
/// both access patterns: the refresh task replaces the whole set, the
/// capture loop probes membership. A reader never observes a
/// partially-replaced set.
///
/// The OS recycles pids, so a stale entry may match a freshly spawned
/// unrelated process for up to one refresh interval. Known imprecision of
/// the underlying mechanism, inherited as-is.
#[derive(Debug, Clone, Default)]
pub struct ProcessFilterSet(Arc<Mutex<BTreeSet<u32>>>);

impl ProcessFilterSet {
    /// New empty filter: nothing matches until the first refresh.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, pid: u32) -> bool {
        self.0.lock().contains(&pid)
    }

    /// Swap in a complete replacement set. No incremental merging.
    pub fn replace(&self, pids: BTreeSet<u32>) {
        *self.0.lock() = pids;
    }

    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.lock().is_empty()
    }

    /// Copy of the current set, mostly for diagnostics.
    pub fn snapshot(&self) -> BTreeSet<u32> {
        self.0.lock().clone()
    }

    /// Periodically rebuild the set from `directory`.
    ///
    /// Every 500ms the live process list is matched against `names`
    /// (exact, case-sensitive, full filename) and the result replaces the
    /// set wholesale. A failed snapshot leaves the previous set active for
    /// that cycle; the fixed cadence is the retry mechanism. Runs until
    /// `cancel` fires.
    pub async fn refresh_loop(
        &self,
        names: &[String],
        directory: &mut dyn ProcessDirectory,
        cancel: &CancellationToken,
    ) {
        let mut interval = time::interval(REFRESH_INTERVAL);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = interval.tick() => {}
            }

            match directory.snapshot() {
                Ok(processes) => {
                    let matched: BTreeSet<u32> = processes
                        .iter()
                        .filter(|process| names.iter().any(|name| *name == process.name))
                        .map(|process| process.pid)
                        .collect();
                    trace!(matched = matched.len(), "rebuilt process filter");
                    self.replace(matched);
                }
                Err(err) => debug!(?err, "process directory snapshot failed; keeping previous filter"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::ProcessRecord;
    use crate::Error;
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;

    #[test]
    fn replace_swaps_the_whole_set() {
        let filter = ProcessFilterSet::new();
        filter.replace([1, 2].into());
        assert!(filter.contains(1));

        filter.replace([3].into());
        assert!(!filter.contains(1));
        assert!(!filter.contains(2));
        assert!(filter.contains(3));
        assert_eq!(filter.len(), 1);
    }

    #[test]
    fn readers_never_observe_a_mixed_set() {
        let filter = ProcessFilterSet::new();
        let set_a: BTreeSet<u32> = [1, 2, 3].into();
        let set_b: BTreeSet<u32> = [4, 5, 6].into();
        filter.replace(set_a.clone());

        std::thread::scope(|scope| {
            let writer = {
                let filter = filter.clone();
                let (set_a, set_b) = (set_a.clone(), set_b.clone());
                scope.spawn(move || {
                    for round in 0..1000 {
                        let next = if round % 2 == 0 { &set_b } else { &set_a };
                        filter.replace(next.clone());
                    }
                })
            };

            for _ in 0..1000 {
                let seen = filter.snapshot();
                assert!(seen == set_a || seen == set_b, "mixed set observed: {seen:?}");
            }
            writer.join().unwrap();
        });
    }

    /// Plays back a fixed snapshot script, recording the filter contents at
    /// each call, and cancels the loop when the script runs out.
    struct ScriptedDirectory {
        script: VecDeque<Result<Vec<ProcessRecord>, Error>>,
        observed: Vec<BTreeSet<u32>>,
        filter: ProcessFilterSet,
        cancel: CancellationToken,
    }

    impl ProcessDirectory for ScriptedDirectory {
        fn snapshot(&mut self) -> Result<Vec<ProcessRecord>, Error> {
            self.observed.push(self.filter.snapshot());
            match self.script.pop_front() {
                Some(response) => response,
                None => {
                    self.cancel.cancel();
                    Err(Error::DirectoryQuery("script exhausted".into()))
                }
            }
        }
    }

    fn record(pid: u32, name: &str) -> ProcessRecord {
        ProcessRecord {
            pid,
            name: name.to_owned(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_replaces_matches_and_tolerates_failures() {
        let filter = ProcessFilterSet::new();
        let cancel = CancellationToken::new();
        let names = vec!["app.exe".to_owned()];

        let mut directory = ScriptedDirectory {
            script: VecDeque::from([
                Ok(vec![record(1, "app.exe"), record(2, "other.exe")]),
                Err(Error::DirectoryQuery("snapshot unavailable".into())),
                Ok(vec![record(3, "app.exe"), record(4, "App.exe")]),
            ]),
            observed: Vec::new(),
            filter: filter.clone(),
            cancel: cancel.clone(),
        };

        filter.refresh_loop(&names, &mut directory, &cancel).await;

        // cycle 1 built {1}; the failed cycle 2 left it untouched; cycle 3
        // replaced it with {3} (case-sensitive, so pid 4 is out).
        assert_eq!(directory.observed[1], [1].into());
        assert_eq!(directory.observed[2], [1].into());
        assert_eq!(filter.snapshot(), [3].into());
    }

    // Mirrors how the driver runs the loop: directory and filter moved into
    // a spawned task, which requires the loop's future to be Send.
    #[tokio::test(start_paused = true)]
    async fn refresh_loop_runs_on_a_spawned_task() {
        let filter = ProcessFilterSet::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let task = tokio::spawn({
            let filter = filter.clone();
            let cancel = cancel.clone();
            async move {
                let mut directory = ScriptedDirectory {
                    script: VecDeque::new(),
                    observed: Vec::new(),
                    filter: filter.clone(),
                    cancel: cancel.clone(),
                };
                filter.refresh_loop(&[], &mut directory, &cancel).await;
            }
        });
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_exits_on_cancellation() {
        let filter = ProcessFilterSet::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut directory = ScriptedDirectory {
            script: VecDeque::new(),
            observed: Vec::new(),
            filter: filter.clone(),
            cancel: cancel.clone(),
        };

        filter.refresh_loop(&[], &mut directory, &cancel).await;
        assert!(directory.observed.is_empty());
    }
}
