//! Fan-out of file tasks across threads and fan-in of their outcomes.
//!
//! Every path gets one task. Tasks report on a completion channel and the
//! caller blocks until it has received one report per path, in whatever
//! order they arrive. Files are independent; within a file, rules and
//! procedures run strictly in declared order.

use crate::engine::errors::{ConfigurationError, TaskError};
use crate::engine::Engine;
use crate::persist;
use crossbeam_channel::{unbounded, Sender};
use std::io;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

/// How file tasks are scheduled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Concurrency {
    /// One thread per file, all started at once. Files the OS will not
    /// give a thread to are processed on the calling thread.
    #[default]
    Unbounded,
    /// A fixed number of worker threads pulling files from a queue.
    Bounded(NonZeroUsize),
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub concurrency: Concurrency,
    /// Compute changes without writing them.
    pub dry_run: bool,
}

/// Totals of one run.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Files a task reported on.
    pub visited: usize,
    /// Files whose content changed (and, unless dry-running, was written).
    pub modified: usize,
    /// Per-file failures, in completion order.
    pub failures: Vec<TaskError>,
}

impl RunSummary {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

enum Outcome {
    Unchanged,
    Modified,
    Failed(TaskError),
    Aborted,
}

/// Called with `(path, original, modified)` for every changed file, before
/// it is written.
pub type ChangeHook<'a> = &'a (dyn Fn(&Path, &[u8], &[u8]) + Sync);

impl Engine {
    /// Process every path and write back the files that changed.
    ///
    /// Per-file read, write and procedure failures are collected in the
    /// summary. A configuration error raised by any task stops further
    /// writes and is returned once every task has reported.
    pub fn run(
        &self,
        paths: &[PathBuf],
        options: &RunOptions,
    ) -> Result<RunSummary, ConfigurationError> {
        self.run_with(paths, options, &|_, _, _| {})
    }

    pub fn run_with(
        &self,
        paths: &[PathBuf],
        options: &RunOptions,
        on_change: ChangeHook<'_>,
    ) -> Result<RunSummary, ConfigurationError> {
        self.dispatch(paths, options, on_change, &persist::write_atomic, usize::MAX)
    }

    /// Fan out over `paths`, writing changes with `write`.
    ///
    /// In unbounded mode at most `spawn_limit` threads are started. When that
    /// limit is hit, or the OS refuses another thread, the remaining paths
    /// are processed on the calling thread, so every path still reports once.
    pub(crate) fn dispatch<W>(
        &self,
        paths: &[PathBuf],
        options: &RunOptions,
        on_change: ChangeHook<'_>,
        write: &W,
        spawn_limit: usize,
    ) -> Result<RunSummary, ConfigurationError>
    where
        W: Fn(&Path, &[u8]) -> io::Result<()> + Sync,
    {
        let abort = AtomicBool::new(false);
        let (done_tx, done_rx) = unbounded::<Outcome>();

        thread::scope(|scope| {
            match options.concurrency {
                Concurrency::Unbounded => {
                    for (index, path) in paths.iter().enumerate() {
                        let done = done_tx.clone();
                        let abort = &abort;
                        let spawned = if index < spawn_limit {
                            thread::Builder::new()
                                .spawn_scoped(scope, move || {
                                    report(&done, self.visit(path, options, abort, on_change, write));
                                })
                                .map(drop)
                        } else {
                            Err(io::Error::new(
                                io::ErrorKind::WouldBlock,
                                format!("thread limit of {spawn_limit} reached"),
                            ))
                        };

                        if let Err(err) = spawned {
                            tracing::warn!(
                                remaining = paths.len() - index,
                                "cannot start another file task thread ({err}), finishing on the current thread"
                            );
                            for path in &paths[index..] {
                                report(&done_tx, self.visit(path, options, abort, on_change, write));
                            }
                            break;
                        }
                    }
                }
                Concurrency::Bounded(workers) => {
                    let (work_tx, work_rx) = unbounded::<&PathBuf>();
                    for path in paths {
                        // The receiver is alive until the workers below exit.
                        let _ = work_tx.send(path);
                    }
                    drop(work_tx);

                    for _ in 0..workers.get().min(paths.len()) {
                        let done = done_tx.clone();
                        let work = work_rx.clone();
                        let abort = &abort;
                        let spawned = thread::Builder::new().spawn_scoped(scope, move || {
                            for path in work.iter() {
                                report(&done, self.visit(path, options, abort, on_change, write));
                            }
                        });

                        if let Err(err) = spawned {
                            tracing::warn!("cannot start another worker ({err}), draining the queue on the current thread");
                            for path in work_rx.iter() {
                                report(&done_tx, self.visit(path, options, abort, on_change, write));
                            }
                            break;
                        }
                    }
                }
            }
            drop(done_tx);

            let mut summary = RunSummary::default();
            let mut fatal = None;
            for _ in 0..paths.len() {
                let Ok(outcome) = done_rx.recv() else {
                    break;
                };
                summary.visited += 1;
                match outcome {
                    Outcome::Unchanged | Outcome::Aborted => {}
                    Outcome::Modified => summary.modified += 1,
                    Outcome::Failed(TaskError::Configuration(err)) => {
                        if fatal.is_none() {
                            fatal = Some(err);
                        }
                    }
                    Outcome::Failed(err) => {
                        tracing::error!("{err}");
                        summary.failures.push(err);
                    }
                }
            }

            match fatal {
                Some(err) => Err(err),
                None => {
                    tracing::info!(
                        visited = summary.visited,
                        modified = summary.modified,
                        failed = summary.failed(),
                        "run complete"
                    );
                    Ok(summary)
                }
            }
        })
    }

    fn visit<W>(
        &self,
        path: &Path,
        options: &RunOptions,
        abort: &AtomicBool,
        on_change: ChangeHook<'_>,
        write: &W,
    ) -> Outcome
    where
        W: Fn(&Path, &[u8]) -> io::Result<()> + Sync,
    {
        if abort.load(Ordering::Acquire) {
            return Outcome::Aborted;
        }

        let task = match self.process_file(path) {
            Ok(task) => task,
            Err(err) => {
                if err.is_fatal() {
                    abort.store(true, Ordering::Release);
                }
                return Outcome::Failed(err);
            }
        };

        let Some((original, modified)) = task.into_content().filter(|(o, m)| o != m) else {
            tracing::trace!(path = %path.display(), "no update");
            return Outcome::Unchanged;
        };

        if abort.load(Ordering::Acquire) {
            return Outcome::Aborted;
        }

        on_change(path, &original, &modified);

        if !options.dry_run {
            if let Err(source) = write(path, &modified) {
                return Outcome::Failed(TaskError::Write {
                    path: path.to_path_buf(),
                    source,
                });
            }
        }

        tracing::info!(path = %path.display(), "updated file");
        Outcome::Modified
    }
}

fn report(done: &Sender<Outcome>, outcome: Outcome) {
    // The receiver outlives every task inside the scope.
    let _ = done.send(outcome);
}
