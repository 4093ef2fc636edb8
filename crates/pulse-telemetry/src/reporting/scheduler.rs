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


//! Background tick thread shared by the periodic reporters.

use crossbeam_channel::{RecvTimeoutError, Sender};
use pulse_core::{MetricsError, MetricsResult};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

/// Runs `f`, logging instead of propagating a panic. Returns `false` if `f`
/// panicked.
pub(crate) fn run_guarded(name: &str, f: impl FnOnce()) -> bool {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(()) => true,
        Err(payload) => {
            log::error!(
                "{name} reporter tick panicked: {}",
                panic_message(payload.as_ref())
            );
            false
        }
    }
}

/// Runs a tick function on a dedicated thread at a fixed interval.
///
/// The thread sleeps on a stop channel with a deadline, so [`stop`] wakes it
/// immediately instead of waiting out the interval. A tick already in
/// progress is allowed to finish before `stop` returns. A panicking tick is
/// logged and the next one runs on schedule.
///
/// [`stop`]: ReportScheduler::stop
#[derive(Debug)]
pub struct ReportScheduler {
    name: String,
    interval: Duration,
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl ReportScheduler {
    /// Creates a stopped scheduler. `name` is used for the thread name and logs.
    pub fn new(name: impl Into<String>, interval: Duration) -> Self {
        Self {
            name: name.into(),
            interval,
            stop_tx: None,
            handle: None,
        }
    }

    /// Returns the tick interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns `true` while the tick thread is alive.
    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Spawns the tick thread. Does nothing if it is already running.
    pub fn start<F>(&mut self, tick: F) -> MetricsResult<()>
    where
        F: Fn() + Send + 'static,
    {
        if self.is_running() {
            return Ok(());
        }
        if self.interval.is_zero() {
            return Err(MetricsError::InvalidConfiguration(format!(
                "reporter '{}' needs a non-zero interval",
                self.name
            )));
        }

        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);
        let interval = self.interval;
        let name = self.name.clone();

        let handle = thread::Builder::new()
            .name(format!("pulse-{}", self.name.to_lowercase()))
            .spawn(move || {
                log::debug!("{name} reporter thread started ({interval:?} interval).");
                let mut deadline = Instant::now() + interval;
                loop {
                    match stop_rx.recv_deadline(deadline) {
                        Err(RecvTimeoutError::Timeout) => {
                            run_guarded(&name, &tick);
                            deadline += interval;
                            let now = Instant::now();
                            if deadline <= now {
                                // A slow tick; skip the missed slots.
                                deadline = now + interval;
                            }
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                log::debug!("{name} reporter thread stopped.");
            })
            .map_err(|e| MetricsError::ReporterStart {
                reporter: self.name.clone(),
                message: e.to_string(),
            })?;

        self.stop_tx = Some(stop_tx);
        self.handle = Some(handle);
        Ok(())
    }

    /// Signals the tick thread and waits for it to exit.
    pub fn stop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("{} reporter thread panicked.", self.name);
            }
        }
    }
}

impl Drop for ReportScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
