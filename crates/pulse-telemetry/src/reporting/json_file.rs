// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


//! Reporter that keeps a JSON document of the registry on disk.

use crate::metrics::MetricsRegistry;
use crate::reporting::scheduled::{ScheduledReporter, SnapshotSink};
use pulse_core::{MetricsError, MetricsResult, MetricsSnapshot, ReporterKind};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

/// Mode applied to the report file before it is moved into place.
#[cfg(unix)]
const REPORT_FILE_MODE: u32 = 0o644;

/// Writes each snapshot to a file, atomically replacing the previous one.
///
/// The document is first written to a temporary file in the target's
/// directory and then renamed over the target, so readers only ever see a
/// complete document.
#[derive(Debug)]
pub struct JsonFileSink {
    path: PathBuf,
    tmp_path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileSink {
    /// Creates a sink for `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "report.json".to_string());
        let tmp_path = path.with_file_name(format!(".{}.{}.tmp", file_name, std::process::id()));
        Self {
            path,
            tmp_path,
            write_lock: Mutex::new(()),
        }
    }

    /// Returns the report file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn failure(&self, action: &str, e: impl std::fmt::Display) -> MetricsError {
        MetricsError::SinkWriteFailure {
            reporter: ReporterKind::JsonFile.to_string(),
            message: format!("{action} {}: {e}", self.path.display()),
        }
    }

    fn write_tmp(&self, document: &str) -> MetricsResult<()> {
        let mut file =
            fs::File::create(&self.tmp_path).map_err(|e| self.failure("cannot create temp file for", e))?;
        file.write_all(document.as_bytes())
            .map_err(|e| self.failure("cannot write temp file for", e))?;
        file.sync_all()
            .map_err(|e| self.failure("cannot flush temp file for", e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.tmp_path, fs::Permissions::from_mode(REPORT_FILE_MODE))
                .map_err(|e| self.failure("cannot set permissions on temp file for", e))?;
        }
        Ok(())
    }
}

impl SnapshotSink for JsonFileSink {
    fn write(&self, snapshot: &MetricsSnapshot) -> MetricsResult<()> {
        let document = snapshot
            .to_json_pretty()
            .map_err(|e| self.failure("cannot serialize report for", e))?;

        // Ticks and on-demand reports share the temp file.
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| MetricsError::Poisoned("JSON report lock poisoned".to_string()))?;

        if let Err(e) = self.write_tmp(&document) {
            let _ = fs::remove_file(&self.tmp_path);
            return Err(e);
        }
        if let Err(e) = fs::rename(&self.tmp_path, &self.path) {
            let _ = fs::remove_file(&self.tmp_path);
            return Err(self.failure("cannot move report into", e));
        }
        log::trace!("Wrote metrics report to {}", self.path.display());
        Ok(())
    }
}

/// Periodically overwrites a JSON file with the registry's snapshot.
pub type JsonFileReporter = ScheduledReporter<JsonFileSink>;

impl JsonFileReporter {
    /// Creates a stopped reporter writing `registry` to `path` every `interval`.
    pub fn new(registry: MetricsRegistry, path: impl Into<PathBuf>, interval: Duration) -> Self {
        Self::with_sink(
            ReporterKind::JsonFile,
            registry,
            JsonFileSink::new(path),
            interval,
        )
    }
}
