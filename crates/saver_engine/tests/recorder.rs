#![cfg(unix)]

use std::fs;
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Once};
use std::time::{Duration, Instant};

use saver_engine::{
    ChannelConfig, ChannelEventSink, EngineError, EngineEvent, LiveStream, Quality, Recorder,
    RecorderSettings, Resolution, ResolveError, ResolveRequest, StreamResolver,
};
use tempfile::TempDir;

static INIT: Once = Once::new();

fn init_logging() {
    INIT.call_once(engine_logging::initialize_for_tests);
}

const CAPTURE: &str =
    "trap 'echo bye; exit 0' INT\necho \"capturing $1\"\nwhile :; do sleep 0.05; done\n";

/// Every channel is always live.
struct AlwaysLive;

impl StreamResolver for AlwaysLive {
    fn resolve(&self, request: &ResolveRequest) -> Result<Resolution, ResolveError> {
        Ok(Resolution::Live(LiveStream {
            manifest_url: format!("{}/manifest.m3u8", request.live_url),
            title: "Live now".to_string(),
            page_url: request.live_url.clone(),
        }))
    }
}

fn recorder(temp: &TempDir) -> (Recorder, Receiver<EngineEvent>) {
    init_logging();
    let script = temp.path().join("capture.sh");
    fs::write(&script, CAPTURE).unwrap();
    let settings = RecorderSettings {
        records_dir: temp.path().join("records"),
        ytdlp_command: format!("sh {}", script.display()),
        termination_timeout: Duration::from_secs(5),
        ..RecorderSettings::default()
    };
    let (sink, events) = ChannelEventSink::pair();
    let recorder = Recorder::with_resolver(settings, Arc::new(AlwaysLive), sink)
        .with_tick(Duration::from_millis(20));
    (recorder, events)
}

/// Collects events until `done` matches one, failing after a generous timeout.
fn collect_until(
    events: &Receiver<EngineEvent>,
    seen: &mut Vec<EngineEvent>,
    done: impl Fn(&EngineEvent) -> bool,
) {
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        let left = deadline.saturating_duration_since(Instant::now());
        let event = events
            .recv_timeout(left)
            .expect("event did not arrive in time");
        let finished = done(&event);
        seen.push(event);
        if finished {
            return;
        }
    }
}

#[test]
fn live_channel_is_captured_and_stopped_cleanly() {
    let temp = TempDir::new().unwrap();
    let (mut recorder, events) = recorder(&temp);
    recorder
        .add_channel(ChannelConfig::new("alpha").with_quality(Quality::P720))
        .unwrap();

    recorder.start().unwrap();
    assert!(matches!(recorder.start(), Err(EngineError::AlreadyRunning)));

    let manifest = "https://www.youtube.com/@alpha/live/manifest.m3u8";
    let mut seen = Vec::new();
    collect_until(&events, &mut seen, |e| {
        matches!(e, EngineEvent::ProcessLog { line, .. } if line == &format!("capturing {manifest}"))
    });

    let queued_at = seen
        .iter()
        .position(|e| matches!(e, EngineEvent::JobQueued { channel } if channel == "alpha"))
        .unwrap();
    let started_at = seen
        .iter()
        .position(|e| matches!(e, EngineEvent::ProcessStarted { channel, .. } if channel == "alpha"))
        .unwrap();
    assert!(queued_at < started_at);
    assert!(matches!(
        &seen[started_at],
        EngineEvent::ProcessStarted { title, .. } if title == "Live now"
    ));
    assert_eq!(recorder.active_recordings().len(), 1);

    // Busy channels cannot be removed.
    assert!(matches!(
        recorder.remove_channel("alpha"),
        Err(EngineError::ChannelBusy(_))
    ));

    recorder.stop();
    recorder.wait_stopped();
    assert!(!recorder.is_running());
    seen.extend(events.try_iter());

    assert!(seen.contains(&EngineEvent::ScannerRunning(false)));
    assert!(seen.contains(&EngineEvent::SupervisorRunning(false)));
    assert!(seen
        .iter()
        .any(|e| matches!(e, EngineEvent::ProcessFinished { .. })));
    assert!(recorder.active_recordings().is_empty());
    assert!(recorder.remove_channel("alpha").is_ok());
}

#[test]
fn recorder_can_be_restarted_after_a_stop() {
    let temp = TempDir::new().unwrap();
    let (mut recorder, events) = recorder(&temp);

    recorder.start().unwrap();
    let mut seen = Vec::new();
    collect_until(&events, &mut seen, |e| *e == EngineEvent::SupervisorRunning(true));
    recorder.stop();
    recorder.wait_stopped();

    recorder.start().unwrap();
    assert!(recorder.is_running());
    recorder.stop();
    recorder.wait_stopped();
    assert!(!recorder.is_running());
}

#[test]
fn channel_edits_are_validated() {
    let temp = TempDir::new().unwrap();
    let (recorder, _events) = recorder(&temp);

    assert!(matches!(
        recorder.add_channel(ChannelConfig::new("bad name")),
        Err(EngineError::InvalidChannelName(_))
    ));
    recorder.add_channel(ChannelConfig::new("alpha")).unwrap();
    assert!(matches!(
        recorder.add_channel(ChannelConfig::new("alpha")),
        Err(EngineError::ChannelExists(_))
    ));

    recorder
        .update_channel("alpha", Some("  Alpha TV ".to_string()), Quality::P480)
        .unwrap();
    let channels = recorder.channels();
    assert_eq!(channels[0].display_name(), "Alpha TV");
    assert_eq!(channels[0].quality, Quality::P480);

    assert!(matches!(
        recorder.update_channel("ghost", None, Quality::Maximum),
        Err(EngineError::UnknownChannel(_))
    ));
}

#[test]
fn raising_the_ceiling_while_running_starts_the_waiting_job() {
    let temp = TempDir::new().unwrap();
    let (mut recorder, events) = recorder(&temp);
    recorder.update_settings(RecorderSettings {
        max_downloads: 1,
        ..recorder.settings()
    });
    recorder.add_channel(ChannelConfig::new("alpha")).unwrap();
    recorder.add_channel(ChannelConfig::new("beta")).unwrap();

    recorder.start().unwrap();
    let mut seen = Vec::new();
    collect_until(&events, &mut seen, |e| {
        matches!(e, EngineEvent::ProcessStarted { channel, .. } if channel == "alpha")
    });
    if !seen
        .iter()
        .any(|e| matches!(e, EngineEvent::JobQueued { channel } if channel == "beta"))
    {
        collect_until(&events, &mut seen, |e| {
            matches!(e, EngineEvent::JobQueued { channel } if channel == "beta")
        });
    }
    assert_eq!(recorder.active_recordings().len(), 1);

    recorder.update_settings(RecorderSettings {
        max_downloads: 2,
        ..recorder.settings()
    });
    collect_until(&events, &mut seen, |e| {
        matches!(e, EngineEvent::ProcessStarted { channel, .. } if channel == "beta")
    });
    assert_eq!(recorder.settings().max_downloads, 2);
    assert_eq!(recorder.active_recordings().len(), 2);

    recorder.stop();
    recorder.wait_stopped();
    assert!(recorder.active_recordings().is_empty());
}
