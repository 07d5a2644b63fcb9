//! Bounded-concurrency execution of capture jobs.

use std::sync::Arc;
use std::time::{Duration, Instant};

use engine_logging::engine_debug;
use log::Level;

use crate::capture::launch;
use crate::control::{StopToken, Stopped};
use crate::queue::JobReceiver;
use crate::registry::ProcessRegistry;
use crate::shared::Shared;
use crate::sink::{report, EventSink};
use crate::{EngineEvent, ExitOutcome, Pid, StreamJob};

pub const DEFAULT_TICK: Duration = Duration::from_millis(200);

pub struct Supervisor {
    shared: Shared,
    jobs: JobReceiver,
    sink: Arc<dyn EventSink>,
    token: StopToken,
    registry: ProcessRegistry,
    tick: Duration,
}

impl Supervisor {
    pub fn new(
        shared: Shared,
        jobs: JobReceiver,
        sink: Arc<dyn EventSink>,
        token: StopToken,
    ) -> Self {
        Self {
            registry: ProcessRegistry::new(shared.clone()),
            shared,
            jobs,
            sink,
            token,
            tick: DEFAULT_TICK,
        }
    }

    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    pub fn run(mut self) {
        self.sink.emit(EngineEvent::SupervisorRunning(true));
        report(self.sink.as_ref(), Level::Info, "Recorder started.");

        // Only ever returns once the stop token is observed.
        let _ = self.run_loop();
        self.shutdown();

        report(self.sink.as_ref(), Level::Info, "Recorder stopped.");
        self.sink.emit(EngineEvent::SupervisorRunning(false));
    }

    fn run_loop(&mut self) -> Result<(), Stopped> {
        loop {
            self.token.check()?;
            self.run_cycle();
            self.token.sleep(self.tick)?;
        }
    }

    /// Reap, start, service stop requests, drain logs.
    pub fn run_cycle(&mut self) {
        self.reap_finished();
        self.start_queued();
        self.service_stop_requests();
        self.drain_logs();
    }

    pub fn running_count(&self) -> usize {
        self.registry.len()
    }

    fn reap_finished(&mut self) {
        for pid in self.registry.pids() {
            let Some(process) = self.registry.find_mut(pid) else {
                continue;
            };
            match process.poll_exit() {
                Ok(Some((outcome, code))) => self.finish(pid, outcome, code),
                Ok(None) => {}
                Err(err) => engine_debug!("Exit check of process {pid} failed: {err}"),
            }
        }
    }

    fn start_queued(&mut self) {
        loop {
            let settings = self.shared.settings();
            if !settings.has_free_slot(self.registry.len()) {
                return;
            }
            let Some(job) = self.jobs.try_pop() else {
                return;
            };
            self.start_job(job);
        }
    }

    fn start_job(&mut self, job: StreamJob) {
        let settings = self.shared.settings();
        report(
            self.sink.as_ref(),
            Level::Info,
            format!("Recording {} started.", job.channel),
        );
        match launch(&job, &settings) {
            Ok(process) => {
                let pid = process.pid();
                self.registry.insert(process);
                self.sink.emit(EngineEvent::ProcessStarted {
                    channel: job.channel,
                    pid,
                    title: job.title,
                });
            }
            Err(err) => {
                self.shared.lock().unmark_queued(&job.channel);
                report(
                    self.sink.as_ref(),
                    Level::Error,
                    format!("Failed to start recording {}: {err}", job.channel),
                );
                self.sink.emit(EngineEvent::JobDropped {
                    channel: job.channel,
                });
            }
        }
    }

    fn service_stop_requests(&mut self) {
        let requests = self.shared.lock().take_stop_requests();
        for pid in requests {
            let Some(process) = self.registry.find_mut(pid) else {
                report(
                    self.sink.as_ref(),
                    Level::Warn,
                    format!("No running recording with process id {pid}."),
                );
                continue;
            };
            report(
                self.sink.as_ref(),
                Level::Info,
                format!("Stopping process {pid}..."),
            );
            if let Err(err) = process.interrupt() {
                report(
                    self.sink.as_ref(),
                    Level::Warn,
                    format!("Could not interrupt process {pid}: {err}"),
                );
            }
        }
    }

    fn drain_logs(&mut self) {
        let mut lines = Vec::new();
        for process in self.registry.iter_mut() {
            match process.next_log_line() {
                Ok(Some(line)) => lines.push((process.pid(), line)),
                Ok(None) => {}
                Err(err) => engine_debug!("Reading log of process {} failed: {err}", process.pid()),
            }
        }
        for (pid, line) in lines {
            self.sink.emit(EngineEvent::ProcessLog { pid, line });
        }
    }

    /// Final drain, outcome event, removal from the registry.
    fn finish(&mut self, pid: Pid, outcome: ExitOutcome, code: Option<i32>) {
        let Some(mut process) = self.registry.release(pid) else {
            return;
        };
        match process.drain_log() {
            Ok(lines) => {
                for line in lines {
                    self.sink.emit(EngineEvent::ProcessLog { pid, line });
                }
            }
            Err(err) => engine_debug!("Final log drain of process {pid} failed: {err}"),
        }

        let channel = process.channel();
        match outcome {
            ExitOutcome::Finished => report(
                self.sink.as_ref(),
                Level::Info,
                format!("Recording {channel} finished."),
            ),
            ExitOutcome::Failed => report(
                self.sink.as_ref(),
                Level::Warn,
                format!(
                    "Recording {channel} stopped with an error code: {}!",
                    describe_code(code)
                ),
            ),
        }
        self.sink.emit(outcome.event(pid));
    }

    /// Interrupts every capture, waits against one shared deadline, kills
    /// the stragglers and discards jobs that never started.
    pub fn shutdown(&mut self) {
        let pids = self.registry.pids();
        for pid in &pids {
            if let Some(process) = self.registry.find_mut(*pid) {
                if let Err(err) = process.interrupt() {
                    engine_debug!("Interrupt of process {pid} skipped: {err}");
                }
            }
        }

        let deadline = Instant::now() + self.shared.settings().termination_timeout;
        for pid in pids {
            let Some(process) = self.registry.find_mut(pid) else {
                continue;
            };
            match process.wait_until(deadline) {
                Ok(Some((outcome, code))) => self.finish(pid, outcome, code),
                Ok(None) | Err(_) => {
                    if let Err(err) = process.kill() {
                        engine_debug!("Kill of process {pid} failed: {err}");
                    }
                    report(
                        self.sink.as_ref(),
                        Level::Warn,
                        format!(
                            "Recording[{pid}] of channel {} has been killed!",
                            process.channel()
                        ),
                    );
                    self.finish(pid, ExitOutcome::Failed, None);
                }
            }
        }

        let discarded = self.jobs.drain();
        if !discarded.is_empty() {
            let mut state = self.shared.lock();
            for job in &discarded {
                state.unmark_queued(&job.channel);
            }
            drop(state);
            report(
                self.sink.as_ref(),
                Level::Warn,
                format!("Discarded {} queued recording(s).", discarded.len()),
            );
            for job in discarded {
                self.sink.emit(EngineEvent::JobDropped {
                    channel: job.channel,
                });
            }
        }
    }
}

fn describe_code(code: Option<i32>) -> String {
    code.map_or_else(|| "signal".to_string(), |code| code.to_string())
}
