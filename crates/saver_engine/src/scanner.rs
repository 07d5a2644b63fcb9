//! Periodic liveness polling of tracked channels.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Once};
use std::time::Duration;

use engine_logging::engine_error;
use log::Level;

use crate::control::{ScanTrigger, StopToken, Stopped};
use crate::queue::JobSender;
use crate::resolver::{LiveStream, Resolution, ResolveError, ResolveRequest, StreamResolver};
use crate::shared::Shared;
use crate::sink::{report, EventSink};
use crate::{EngineEvent, Quality, StreamJob};

const WAIT_SLICE: Duration = Duration::from_millis(100);
const SLICES_PER_SECOND: u32 = 10;

thread_local! {
    static TRACE_PANICS: Cell<bool> = const { Cell::new(false) };
    static LAST_PANIC: RefCell<Option<PanicTrace>> = const { RefCell::new(None) };
}

static TRACE_HOOK: Once = Once::new();

/// Where a resolver call panicked and the stack at that point.
struct PanicTrace {
    location: String,
    backtrace: String,
}

/// Last observation per channel. Both fields change only on an edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanState {
    /// `None` until the first successful observation.
    pub live: Option<bool>,
    pub schedule_warned: bool,
}

pub struct Scanner {
    shared: Shared,
    resolver: Arc<dyn StreamResolver>,
    jobs: JobSender,
    sink: Arc<dyn EventSink>,
    token: StopToken,
    trigger: ScanTrigger,
    states: HashMap<String, ScanState>,
}

impl Scanner {
    pub fn new(
        shared: Shared,
        resolver: Arc<dyn StreamResolver>,
        jobs: JobSender,
        sink: Arc<dyn EventSink>,
        token: StopToken,
        trigger: ScanTrigger,
    ) -> Self {
        Self {
            shared,
            resolver,
            jobs,
            sink,
            token,
            trigger,
            states: HashMap::new(),
        }
    }

    pub fn run(mut self) {
        self.sink.emit(EngineEvent::ScannerRunning(true));
        report(self.sink.as_ref(), Level::Info, "Scanning channels started.");

        // Only ever returns once the stop token is observed.
        let _ = self.run_loop();

        report(self.sink.as_ref(), Level::Info, "Scanning channels stopped.");
        self.sink.emit(EngineEvent::ScannerRunning(false));
    }

    fn run_loop(&mut self) -> Result<(), Stopped> {
        loop {
            self.token.check()?;
            self.scan_pass()?;
            self.wait_for_next_pass()?;
        }
    }

    /// One pass over a snapshot of the channel list.
    pub fn scan_pass(&mut self) -> Result<(), Stopped> {
        self.trigger.take();
        let names = self.shared.lock().channels.names();
        for name in names {
            self.token.check()?;
            self.check_channel(&name);
        }
        self.token.check()
    }

    pub fn scan_state(&self, channel: &str) -> Option<ScanState> {
        self.states.get(channel).copied()
    }

    fn check_channel(&mut self, name: &str) {
        let lookup = {
            let state = self.shared.lock();
            state.channels.get(name).map(|config| {
                let request = ResolveRequest {
                    live_url: state.settings.live_url(name),
                    command: state.settings.ytdlp_command.clone(),
                    cookies_from_browser: state.settings.cookies_browser().map(str::to_string),
                };
                (request, config.quality)
            })
        };
        // Removed since the snapshot was taken.
        let Some((request, quality)) = lookup else {
            return;
        };

        match resolve_traced(self.resolver.as_ref(), &request) {
            Ok(Ok(resolution)) => self.observe(name, resolution, quality),
            Ok(Err(err)) => report(
                self.sink.as_ref(),
                Level::Error,
                format!("<yt-dlp> {name}: {err}"),
            ),
            Err((message, trace)) => {
                let location = trace
                    .as_ref()
                    .map(|t| format!(" at {}", t.location))
                    .unwrap_or_default();
                report(
                    self.sink.as_ref(),
                    Level::Error,
                    format!("Unexpected failure while checking {name}{location}: {message}"),
                );
                if let Some(trace) = trace {
                    engine_error!("Backtrace of the failed check of {name}:\n{}", trace.backtrace);
                }
            }
        }
    }

    fn observe(&mut self, name: &str, resolution: Resolution, quality: Quality) {
        match resolution {
            Resolution::Live(stream) => {
                let state = self.states.entry(name.to_string()).or_default();
                state.schedule_warned = false;
                if state.live != Some(true) {
                    state.live = Some(true);
                    report(
                        self.sink.as_ref(),
                        Level::Info,
                        format!("Channel {name} is online."),
                    );
                    self.sink.emit(EngineEvent::ChannelLive {
                        channel: name.to_string(),
                    });
                }
                self.enqueue(name, stream, quality);
            }
            Resolution::NotLive => {
                self.states
                    .entry(name.to_string())
                    .or_default()
                    .schedule_warned = false;
                self.mark_offline(name);
            }
            Resolution::Scheduled { starts_in } => {
                let state = self.states.entry(name.to_string()).or_default();
                if !state.schedule_warned {
                    state.schedule_warned = true;
                    report(
                        self.sink.as_ref(),
                        Level::Warn,
                        format!("{name} stream in {starts_in}."),
                    );
                }
                self.mark_offline(name);
            }
        }
    }

    fn mark_offline(&mut self, name: &str) {
        let state = self.states.entry(name.to_string()).or_default();
        let was_live = state.live == Some(true);
        state.live = Some(false);
        if was_live {
            report(
                self.sink.as_ref(),
                Level::Info,
                format!("Channel {name} is offline."),
            );
            self.sink.emit(EngineEvent::ChannelOffline {
                channel: name.to_string(),
            });
        }
    }

    fn enqueue(&self, name: &str, stream: LiveStream, quality: Quality) {
        if !self.shared.lock().try_mark_queued(name) {
            return;
        }
        let job = StreamJob {
            channel: name.to_string(),
            manifest_url: stream.manifest_url,
            page_url: stream.page_url,
            title: stream.title,
            quality_args: quality.capture_args(),
        };
        // Announced before the push so it always precedes the supervisor's start event.
        self.sink.emit(EngineEvent::JobQueued {
            channel: name.to_string(),
        });
        match self.jobs.push(job) {
            Ok(()) => report(
                self.sink.as_ref(),
                Level::Info,
                format!("Recording {name} added to queue."),
            ),
            Err(job) => {
                self.shared.lock().unmark_queued(&job.channel);
                report(
                    self.sink.as_ref(),
                    Level::Warn,
                    format!("Recorder is gone; recording {name} was not queued."),
                );
                self.sink.emit(EngineEvent::JobDropped {
                    channel: job.channel,
                });
            }
        }
    }

    /// Counts down the scan interval one second at a time; "scan now" cuts it short.
    fn wait_for_next_pass(&self) -> Result<(), Stopped> {
        let interval = self.shared.settings().scan_interval;
        let mut remaining = interval.as_secs().max(1);
        while remaining > 0 {
            self.sink.emit(EngineEvent::NextScanIn { seconds: remaining });
            for _ in 0..SLICES_PER_SECOND {
                if self.trigger.is_requested() {
                    self.sink.emit(EngineEvent::NextScanIn { seconds: 0 });
                    return Ok(());
                }
                self.token.sleep(WAIT_SLICE)?;
            }
            remaining -= 1;
        }
        self.sink.emit(EngineEvent::NextScanIn { seconds: 0 });
        Ok(())
    }
}

type TracedPanic = (String, Option<PanicTrace>);

/// Runs one resolver call, turning a panic into its message plus the trace
/// recorded by the hook.
fn resolve_traced(
    resolver: &dyn StreamResolver,
    request: &ResolveRequest,
) -> Result<Result<Resolution, ResolveError>, TracedPanic> {
    install_trace_hook();
    TRACE_PANICS.with(|flag| flag.set(true));
    let result = panic::catch_unwind(AssertUnwindSafe(|| resolver.resolve(request)));
    TRACE_PANICS.with(|flag| flag.set(false));
    result.map_err(|payload| {
        let trace = LAST_PANIC.with(|slot| slot.borrow_mut().take());
        (panic_message(payload.as_ref()), trace)
    })
}

/// Chains onto the existing hook; panics inside traced resolver calls are
/// recorded for the scanner's report instead of being printed.
fn install_trace_hook() {
    TRACE_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if !TRACE_PANICS.with(Cell::get) {
                previous(info);
                return;
            }
            let location = info
                .location()
                .map(|l| format!("{}:{}", l.file(), l.line()))
                .unwrap_or_else(|| "unknown location".to_string());
            let backtrace = Backtrace::force_capture().to_string();
            LAST_PANIC.with(|slot| {
                *slot.borrow_mut() = Some(PanicTrace {
                    location,
                    backtrace,
                })
            });
        }));
    });
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "unknown panic".to_string()
    }
}
