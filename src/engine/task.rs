//! Per-file orchestration: select rules, gate them, run their procedures.

use crate::engine::errors::TaskError;
use crate::engine::{conditions, procedures, Engine};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A file and its content before and after the rules ran.
///
/// The file is read only when a first rule selects it. When no rule does,
/// both buffers stay absent and the file is never touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTask {
    path: PathBuf,
    original: Option<Vec<u8>>,
    working: Vec<u8>,
}

impl FileTask {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            original: None,
            working: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Content as read from disk, if any rule selected the file.
    pub fn original(&self) -> Option<&[u8]> {
        self.original.as_deref()
    }

    /// Content after every applicable procedure ran.
    pub fn working(&self) -> Option<&[u8]> {
        self.original.as_ref().map(|_| self.working.as_slice())
    }

    /// Whether the final content differs from what was read, byte for byte.
    pub fn changed(&self) -> bool {
        self.original
            .as_deref()
            .is_some_and(|original| original != self.working.as_slice())
    }

    pub fn into_content(self) -> Option<(Vec<u8>, Vec<u8>)> {
        let working = self.working;
        self.original.map(|original| (original, working))
    }
}

impl Engine {
    /// Run every rule over the file at `path`, in declared order.
    pub fn process_file(&self, path: &Path) -> Result<FileTask, TaskError> {
        self.process_with(path, |path| fs::read(path))
    }

    /// Like [`Engine::process_file`], with the read supplied by the caller.
    ///
    /// `read` is invoked at most once, for the first rule whose filter
    /// selects the file.
    pub fn process_with<R>(&self, path: &Path, read: R) -> Result<FileTask, TaskError>
    where
        R: FnOnce(&Path) -> io::Result<Vec<u8>>,
    {
        let span = tracing::debug_span!("file", path = %path.display());
        let _guard = span.enter();

        let mut task = FileTask::new(path);
        let mut read = Some(read);

        for rule in &self.rules {
            if !rule.filter.matches_path(path) {
                continue;
            }

            if let Some(read) = read.take() {
                let content = read(path).map_err(|source| TaskError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                task.working = content.clone();
                task.original = Some(content);
            }

            if !conditions::evaluate(&rule.preconditions, path, &task.working) {
                tracing::trace!(rule = rule.index, "preconditions not met, rule skipped");
                continue;
            }

            tracing::trace!(rule = rule.index, "applying transformation");
            let working = std::mem::take(&mut task.working);
            task.working = procedures::apply(&rule.procedures, working)
                .map_err(|err| TaskError::from_pipeline(err, path))?;
        }

        Ok(task)
    }
}
