use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::thread;
use std::time::{Duration, Instant};

use log::Level;
use pretty_assertions::assert_eq;
use saver_engine::{
    job_queue, ChannelConfig, EngineEvent, EventSink, JobReceiver, LiveStream, Quality,
    RecorderSettings, Resolution, ResolveError, ResolveRequest, ScanState, ScanTrigger, Scanner,
    Shared, StopToken, Stopped, StreamResolver,
};

static INIT: Once = Once::new();

fn init_logging() {
    INIT.call_once(engine_logging::initialize_for_tests);
}

#[derive(Default)]
struct TestSink {
    events: Mutex<Vec<EngineEvent>>,
}

impl TestSink {
    fn take(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }

    /// Everything except free-text log lines and countdown ticks.
    fn take_state_events(&self) -> Vec<EngineEvent> {
        self.take()
            .into_iter()
            .filter(|e| !matches!(e, EngineEvent::Log { .. } | EngineEvent::NextScanIn { .. }))
            .collect()
    }

    fn logs(&self) -> Vec<(Level, String)> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                EngineEvent::Log { level, message } => Some((*level, message.clone())),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for TestSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

enum Step {
    Live,
    NotLive,
    Scheduled(&'static str),
    Fail,
    Panic,
}

/// Replays a per-channel script; an exhausted script repeats its last step as "not live".
#[derive(Default)]
struct ScriptedResolver {
    scripts: Mutex<HashMap<String, VecDeque<Step>>>,
    calls: AtomicUsize,
}

impl ScriptedResolver {
    fn script(self, channel: &str, steps: Vec<Step>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(channel.to_string(), steps.into());
        self
    }
}

impl StreamResolver for ScriptedResolver {
    fn resolve(&self, request: &ResolveRequest) -> Result<Resolution, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let channel = request
            .live_url
            .trim_start_matches("https://www.youtube.com/@")
            .trim_end_matches("/live")
            .to_string();
        let step = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&channel)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Step::NotLive);
        match step {
            Step::Live => Ok(Resolution::Live(LiveStream {
                manifest_url: format!("https://manifest.example/{channel}.m3u8"),
                title: format!("{channel} live"),
                page_url: format!("https://www.youtube.com/watch?v={channel}"),
            })),
            Step::NotLive => Ok(Resolution::NotLive),
            Step::Scheduled(text) => Ok(Resolution::Scheduled {
                starts_in: text.to_string(),
            }),
            Step::Fail => Err(ResolveError::ToolFailed {
                code: Some(1),
                message: "ERROR: network unreachable".to_string(),
            }),
            Step::Panic => panic!("resolver blew up"),
        }
    }
}

struct Fixture {
    shared: Shared,
    sink: Arc<TestSink>,
    jobs: JobReceiver,
    token: StopToken,
    trigger: ScanTrigger,
    scanner: Scanner,
}

fn fixture(channels: &[&str], resolver: Arc<ScriptedResolver>) -> Fixture {
    init_logging();
    let shared = Shared::new(RecorderSettings::default());
    for name in channels {
        shared
            .lock()
            .channels
            .insert(ChannelConfig::new(*name).with_quality(Quality::P1080))
            .unwrap();
    }
    let sink = Arc::new(TestSink::default());
    let (tx, jobs) = job_queue();
    let token = StopToken::new();
    let trigger = ScanTrigger::new();
    let scanner = Scanner::new(
        shared.clone(),
        resolver,
        tx,
        sink.clone(),
        token.clone(),
        trigger.clone(),
    );
    Fixture {
        shared,
        sink,
        jobs,
        token,
        trigger,
        scanner,
    }
}

fn live(channel: &str) -> EngineEvent {
    EngineEvent::ChannelLive {
        channel: channel.to_string(),
    }
}

fn queued(channel: &str) -> EngineEvent {
    EngineEvent::JobQueued {
        channel: channel.to_string(),
    }
}

fn dropped(channel: &str) -> EngineEvent {
    EngineEvent::JobDropped {
        channel: channel.to_string(),
    }
}

fn offline(channel: &str) -> EngineEvent {
    EngineEvent::ChannelOffline {
        channel: channel.to_string(),
    }
}

#[test]
fn live_channel_is_announced_and_queued_once() {
    let resolver = Arc::new(ScriptedResolver::default().script("alpha", vec![Step::Live, Step::Live]));
    let mut fx = fixture(&["alpha"], resolver);

    fx.scanner.scan_pass().unwrap();
    assert_eq!(fx.sink.take_state_events(), vec![live("alpha"), queued("alpha")]);

    // Still live and still queued: no repeat announcement, no second job.
    fx.scanner.scan_pass().unwrap();
    assert_eq!(fx.sink.take_state_events(), Vec::<EngineEvent>::new());

    let jobs = fx.jobs.drain();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].channel, "alpha");
    assert_eq!(jobs[0].manifest_url, "https://manifest.example/alpha.m3u8");
    assert_eq!(jobs[0].title, "alpha live");
    assert_eq!(jobs[0].quality_args, Quality::P1080.capture_args());
}

#[test]
fn channel_is_requeued_after_its_capture_ends() {
    let resolver = Arc::new(ScriptedResolver::default().script("alpha", vec![Step::Live, Step::Live]));
    let mut fx = fixture(&["alpha"], resolver);

    fx.scanner.scan_pass().unwrap();
    assert_eq!(fx.jobs.drain().len(), 1);
    fx.shared.lock().unmark_queued("alpha");

    fx.scanner.scan_pass().unwrap();
    assert_eq!(fx.jobs.drain().len(), 1);
    // Liveness did not change, so only the queue event repeats.
    assert_eq!(fx.sink.take_state_events(), vec![live("alpha"), queued("alpha"), queued("alpha")]);
}

#[test]
fn offline_fires_only_on_live_to_offline_edge() {
    let resolver = Arc::new(ScriptedResolver::default().script(
        "alpha",
        vec![Step::NotLive, Step::Live, Step::NotLive, Step::NotLive],
    ));
    let mut fx = fixture(&["alpha"], resolver);

    fx.scanner.scan_pass().unwrap();
    assert_eq!(fx.sink.take_state_events(), Vec::<EngineEvent>::new());
    assert_eq!(
        fx.scanner.scan_state("alpha"),
        Some(ScanState {
            live: Some(false),
            schedule_warned: false
        })
    );

    for _ in 0..3 {
        fx.scanner.scan_pass().unwrap();
    }
    assert_eq!(
        fx.sink.take_state_events(),
        vec![live("alpha"), queued("alpha"), offline("alpha")]
    );
}

#[test]
fn scheduled_warning_is_logged_once_until_a_plain_observation() {
    let resolver = Arc::new(ScriptedResolver::default().script(
        "alpha",
        vec![
            Step::Scheduled("3 hours"),
            Step::Scheduled("2 hours"),
            Step::NotLive,
            Step::Scheduled("1 hour"),
        ],
    ));
    let mut fx = fixture(&["alpha"], resolver);

    for _ in 0..4 {
        fx.scanner.scan_pass().unwrap();
    }

    let warnings: Vec<String> = fx
        .sink
        .logs()
        .into_iter()
        .filter(|(level, _)| *level == Level::Warn)
        .map(|(_, message)| message)
        .collect();
    assert_eq!(
        warnings,
        vec![
            "alpha stream in 3 hours.".to_string(),
            "alpha stream in 1 hour.".to_string()
        ]
    );
    assert!(fx.jobs.drain().is_empty());
}

#[test]
fn resolution_error_leaves_state_untouched() {
    let resolver = Arc::new(ScriptedResolver::default().script(
        "alpha",
        vec![Step::Live, Step::Fail, Step::Live],
    ));
    let mut fx = fixture(&["alpha"], resolver);

    fx.scanner.scan_pass().unwrap();
    let before = fx.scanner.scan_state("alpha");
    fx.sink.take();

    fx.scanner.scan_pass().unwrap();
    assert_eq!(fx.scanner.scan_state("alpha"), before);
    let events = fx.sink.take();
    assert!(events.iter().all(|e| matches!(e, EngineEvent::Log { level: Level::Error, .. })));
    assert_eq!(events.len(), 1);

    // Back to live without an offline edge in between: no new announcement.
    fx.scanner.scan_pass().unwrap();
    assert_eq!(fx.sink.take_state_events(), Vec::<EngineEvent>::new());
}

#[test]
fn failure_on_one_channel_does_not_abort_the_pass() {
    let resolver = Arc::new(
        ScriptedResolver::default()
            .script("alpha", vec![Step::Panic])
            .script("beta", vec![Step::Live]),
    );
    let mut fx = fixture(&["alpha", "beta"], resolver);

    fx.scanner.scan_pass().unwrap();

    let jobs = fx.jobs.drain();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].channel, "beta");
    let errors: Vec<String> = fx
        .sink
        .logs()
        .into_iter()
        .filter(|(level, _)| *level == Level::Error)
        .map(|(_, message)| message)
        .collect();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("Unexpected failure while checking alpha at "));
    assert!(errors[0].contains("tests/scanner.rs:"));
    assert!(errors[0].ends_with(": resolver blew up"));
}

/// Deletes the channel while its check is in flight, then reports it live.
struct RemovesChannelMidCheck {
    shared: Shared,
}

impl StreamResolver for RemovesChannelMidCheck {
    fn resolve(&self, _request: &ResolveRequest) -> Result<Resolution, ResolveError> {
        self.shared.lock().remove_channel("alpha").unwrap();
        Ok(Resolution::Live(LiveStream {
            manifest_url: "https://manifest.example/alpha.m3u8".to_string(),
            title: "alpha live".to_string(),
            page_url: "https://www.youtube.com/watch?v=alpha".to_string(),
        }))
    }
}

#[test]
fn channel_removed_during_its_check_is_not_queued() {
    init_logging();
    let shared = Shared::new(RecorderSettings::default());
    shared
        .lock()
        .channels
        .insert(ChannelConfig::new("alpha"))
        .unwrap();
    let sink = Arc::new(TestSink::default());
    let (tx, jobs) = job_queue();
    let mut scanner = Scanner::new(
        shared.clone(),
        Arc::new(RemovesChannelMidCheck {
            shared: shared.clone(),
        }),
        tx,
        sink.clone(),
        StopToken::new(),
        ScanTrigger::new(),
    );

    scanner.scan_pass().unwrap();

    assert!(!shared.lock().channels.contains("alpha"));
    assert!(shared.lock().queued().is_empty());
    assert!(jobs.drain().is_empty());
    assert!(!sink
        .take_state_events()
        .iter()
        .any(|e| matches!(e, EngineEvent::JobQueued { .. })));
}

#[test]
fn rejected_push_is_followed_by_a_dropped_event() {
    let resolver = Arc::new(ScriptedResolver::default().script("alpha", vec![Step::Live]));
    let Fixture {
        shared,
        sink,
        jobs,
        mut scanner,
        ..
    } = fixture(&["alpha"], resolver);
    drop(jobs);

    scanner.scan_pass().unwrap();

    assert_eq!(
        sink.take_state_events(),
        vec![live("alpha"), queued("alpha"), dropped("alpha")]
    );
    assert!(!shared.lock().is_busy("alpha"));
}

#[test]
fn cancelled_pass_stops_before_resolving() {
    let resolver = Arc::new(ScriptedResolver::default().script("alpha", vec![Step::Live]));
    let mut fx = fixture(&["alpha"], resolver.clone());

    fx.token.cancel();
    assert_eq!(fx.scanner.scan_pass(), Err(Stopped));
    assert_eq!(resolver.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn scan_now_cuts_the_wait_short() {
    let resolver = Arc::new(ScriptedResolver::default());
    let fx = fixture(&["alpha"], resolver.clone());
    let Fixture {
        shared,
        sink,
        token,
        trigger,
        scanner,
        ..
    } = fx;
    shared.lock().settings.scan_interval = Duration::from_secs(300);

    let handle = thread::spawn(move || scanner.run());

    wait_for(|| resolver.calls.load(Ordering::SeqCst) == 1);
    trigger.request();
    wait_for(|| resolver.calls.load(Ordering::SeqCst) == 2);

    token.cancel();
    handle.join().unwrap();

    let events = sink.take();
    assert_eq!(events.first(), Some(&EngineEvent::ScannerRunning(true)));
    assert_eq!(events.last(), Some(&EngineEvent::ScannerRunning(false)));
    assert!(events.contains(&EngineEvent::NextScanIn { seconds: 300 }));
}

fn wait_for(condition: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        thread::sleep(Duration::from_millis(10));
    }
}
