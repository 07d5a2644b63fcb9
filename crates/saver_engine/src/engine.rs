use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use engine_logging::{engine_info, engine_warn};

use crate::control::{ScanTrigger, StopToken};
use crate::queue::job_queue;
use crate::resolver::{StreamResolver, YtDlpResolver};
use crate::scanner::Scanner;
use crate::shared::Shared;
use crate::sink::EventSink;
use crate::supervisor::{Supervisor, DEFAULT_TICK};
use crate::{ChannelConfig, EngineError, Pid, Quality, RecorderSettings};

struct RunHandles {
    token: StopToken,
    scanner: JoinHandle<()>,
    supervisor: JoinHandle<()>,
}

impl RunHandles {
    fn is_finished(&self) -> bool {
        self.scanner.is_finished() && self.supervisor.is_finished()
    }
}

/// Control-layer façade over the scanner and supervisor threads.
pub struct Recorder {
    shared: Shared,
    resolver: Arc<dyn StreamResolver>,
    sink: Arc<dyn EventSink>,
    trigger: ScanTrigger,
    tick: Duration,
    run: Option<RunHandles>,
}

impl Recorder {
    pub fn new(settings: RecorderSettings, sink: Arc<dyn EventSink>) -> Self {
        Self::with_resolver(settings, Arc::new(YtDlpResolver::new()), sink)
    }

    pub fn with_resolver(
        settings: RecorderSettings,
        resolver: Arc<dyn StreamResolver>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            shared: Shared::new(settings),
            resolver,
            sink,
            trigger: ScanTrigger::new(),
            tick: DEFAULT_TICK,
            run: None,
        }
    }

    /// Supervisor cycle period; shorter ticks make tests faster.
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    pub fn settings(&self) -> RecorderSettings {
        self.shared.settings()
    }

    /// Takes effect on the next iteration of each loop.
    pub fn update_settings(&self, settings: RecorderSettings) {
        self.shared.lock().settings = settings;
    }

    pub fn add_channel(&self, config: ChannelConfig) -> Result<(), EngineError> {
        let name = config.name.clone();
        self.shared.lock().channels.insert(config)?;
        engine_info!("Channel {name} added.");
        Ok(())
    }

    pub fn update_channel(
        &self,
        name: &str,
        alias: Option<String>,
        quality: Quality,
    ) -> Result<(), EngineError> {
        self.shared.lock().channels.update(name, alias, quality)
    }

    /// Refused with `ChannelBusy` while the channel is queued or recording.
    pub fn remove_channel(&self, name: &str) -> Result<ChannelConfig, EngineError> {
        let removed = self.shared.lock().remove_channel(name)?;
        engine_info!("Channel {name} removed.");
        Ok(removed)
    }

    pub fn channels(&self) -> Vec<ChannelConfig> {
        self.shared.lock().channels.iter().cloned().collect()
    }

    pub fn active_recordings(&self) -> Vec<(Pid, String)> {
        self.shared.lock().active()
    }

    /// Spawns both loops. A previous run must have fully stopped first.
    pub fn start(&mut self) -> Result<(), EngineError> {
        if let Some(run) = &self.run {
            if !run.is_finished() {
                return Err(EngineError::AlreadyRunning);
            }
        }
        self.reap_run();

        let token = StopToken::new();
        let (jobs_tx, jobs_rx) = job_queue();
        self.shared.lock().take_stop_requests();
        self.trigger.take();

        let scanner = Scanner::new(
            self.shared.clone(),
            Arc::clone(&self.resolver),
            jobs_tx,
            Arc::clone(&self.sink),
            token.clone(),
            self.trigger.clone(),
        );
        let supervisor = Supervisor::new(
            self.shared.clone(),
            jobs_rx,
            Arc::clone(&self.sink),
            token.clone(),
        )
        .with_tick(self.tick);

        let scanner = thread::Builder::new()
            .name("channel-scanner".into())
            .spawn(move || scanner.run())?;
        let supervisor = match thread::Builder::new()
            .name("capture-supervisor".into())
            .spawn(move || supervisor.run())
        {
            Ok(handle) => handle,
            Err(err) => {
                token.cancel();
                if scanner.join().is_err() {
                    engine_warn!("Scanner thread panicked.");
                }
                return Err(err.into());
            }
        };

        self.run = Some(RunHandles {
            token,
            scanner,
            supervisor,
        });
        Ok(())
    }

    /// Requests a full stop without waiting for it.
    pub fn stop(&self) {
        if let Some(run) = &self.run {
            run.token.cancel();
        }
    }

    /// Asks the supervisor to interrupt one capture process.
    pub fn stop_process(&self, pid: Pid) {
        self.shared.lock().request_stop(pid);
    }

    /// Cuts the scanner's wait short.
    pub fn scan_now(&self) {
        self.trigger.request();
    }

    pub fn is_running(&self) -> bool {
        self.run.as_ref().is_some_and(|run| !run.is_finished())
    }

    /// Blocks until both loops have exited.
    pub fn wait_stopped(&mut self) {
        self.reap_run();
    }

    fn reap_run(&mut self) {
        let Some(run) = self.run.take() else {
            return;
        };
        if run.scanner.join().is_err() {
            engine_warn!("Scanner thread panicked.");
        }
        if run.supervisor.join().is_err() {
            engine_warn!("Supervisor thread panicked.");
        }
        // A job pushed after the supervisor drained its queue has nowhere to go.
        let mut state = self.shared.lock();
        for channel in state.queued() {
            state.unmark_queued(&channel);
        }
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        self.stop();
        self.reap_run();
    }
}
