use std::sync::mpsc::Sender;
use std::thread;

use engine_logging::{engine_info, engine_warn};
use saver_core::{ChannelSnapshot, Effect, Msg, NoticeLevel};
use saver_engine::{
    probe_remux_tool, probe_tool, ChannelConfig, ChannelEventSink, EngineEvent, Quality, Recorder,
    RecorderSettings,
};

use super::app::AppInput;

pub struct EffectRunner {
    recorder: Recorder,
    tx: Sender<AppInput>,
}

impl EffectRunner {
    pub fn new(settings: RecorderSettings, tx: Sender<AppInput>) -> Self {
        let (sink, events) = ChannelEventSink::pair();
        let recorder = Recorder::new(settings, sink);

        let event_tx = tx.clone();
        thread::spawn(move || {
            for event in events {
                if event_tx.send(AppInput::Msg(map_event(event))).is_err() {
                    return;
                }
            }
        });

        Self { recorder, tx }
    }

    pub fn settings(&self) -> RecorderSettings {
        self.recorder.settings()
    }

    /// Registers persisted channels with the engine, returning the accepted ones.
    pub fn restore_channels(&self, channels: Vec<ChannelSnapshot>) -> Vec<ChannelSnapshot> {
        channels
            .into_iter()
            .filter(|channel| match self.add(channel) {
                Ok(()) => true,
                Err(message) => {
                    engine_warn!("Skipping saved channel {}: {}", channel.name, message);
                    false
                }
            })
            .map(canonical)
            .collect()
    }

    pub fn enqueue(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::AddChannel {
                    name,
                    alias,
                    quality,
                } => {
                    let snapshot = ChannelSnapshot {
                        name,
                        alias,
                        quality,
                    };
                    match self.add(&snapshot) {
                        Ok(()) => self.send(Msg::ChannelSaved(canonical(snapshot))),
                        Err(message) => self.reject(message),
                    }
                }
                Effect::RemoveChannel { name } => match self.recorder.remove_channel(&name) {
                    Ok(_) => self.send(Msg::ChannelRemoved { name }),
                    Err(err) => self.reject(err.to_string()),
                },
                Effect::UpdateChannel {
                    name,
                    alias,
                    quality,
                } => {
                    let result = parse_quality(&quality).and_then(|q| {
                        self.recorder
                            .update_channel(&name, alias.clone(), q)
                            .map_err(|err| err.to_string())
                    });
                    match result {
                        Ok(()) => self.send(Msg::ChannelSaved(canonical(ChannelSnapshot {
                            name,
                            alias,
                            quality,
                        }))),
                        Err(message) => self.reject(message),
                    }
                }
                Effect::Start => self.start(),
                Effect::Stop => {
                    engine_info!("Stop requested");
                    self.recorder.stop();
                }
                Effect::StopProcess { pid } => self.recorder.stop_process(pid),
                Effect::ScanNow => self.recorder.scan_now(),
            }
        }
    }

    /// Requests a full stop and blocks until every capture is resolved.
    pub fn shutdown(&mut self) {
        self.recorder.stop();
        self.recorder.wait_stopped();
    }

    fn start(&mut self) {
        let settings = self.recorder.settings();
        let missing = if !probe_tool(&settings.ytdlp_command) {
            Some(format!("yt-dlp is not available: {}", settings.ytdlp_command))
        } else if !probe_remux_tool(&settings.ffmpeg_path) {
            Some(format!("ffmpeg is not available: {}", settings.ffmpeg_path))
        } else {
            None
        };
        if let Some(message) = missing {
            self.reject(message);
            self.send(Msg::EngineStopped);
            return;
        }

        if let Err(err) = self.recorder.start() {
            self.reject(err.to_string());
            if !self.recorder.is_running() {
                self.send(Msg::EngineStopped);
            }
        }
    }

    fn add(&self, channel: &ChannelSnapshot) -> Result<(), String> {
        let quality = parse_quality(&channel.quality)?;
        let mut config = ChannelConfig::new(channel.name.clone()).with_quality(quality);
        if let Some(alias) = &channel.alias {
            config = config.with_alias(alias.clone());
        }
        self.recorder
            .add_channel(config)
            .map_err(|err| err.to_string())
    }

    fn reject(&self, message: String) {
        engine_warn!("{message}");
        self.send(Msg::CommandRejected { message });
    }

    fn send(&self, msg: Msg) {
        let _ = self.tx.send(AppInput::Msg(msg));
    }
}

fn parse_quality(key: &str) -> Result<Quality, String> {
    key.parse::<Quality>().map_err(|err| err.to_string())
}

/// Stores the quality under its canonical key so `best` and `Maximum` persist alike.
fn canonical(mut snapshot: ChannelSnapshot) -> ChannelSnapshot {
    if let Ok(quality) = snapshot.quality.parse::<Quality>() {
        snapshot.quality = quality.key().to_string();
    }
    snapshot
}

fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::ChannelLive { channel } => Msg::ChannelLive { channel },
        EngineEvent::ChannelOffline { channel } => Msg::ChannelOffline { channel },
        EngineEvent::JobQueued { channel } => Msg::RecordingQueued { channel },
        EngineEvent::JobDropped { channel } => Msg::RecordingDropped { channel },
        EngineEvent::ProcessStarted {
            channel,
            pid,
            title,
        } => Msg::RecordingStarted {
            channel,
            pid,
            title,
        },
        EngineEvent::ProcessLog { pid, line } => Msg::RecordingLog { pid, line },
        EngineEvent::ProcessFinished { pid } => Msg::RecordingFinished { pid },
        EngineEvent::ProcessFailed { pid } => Msg::RecordingFailed { pid },
        EngineEvent::NextScanIn { seconds } => Msg::NextScanIn { seconds },
        EngineEvent::ScannerRunning(running) => Msg::ScannerRunning(running),
        EngineEvent::SupervisorRunning(running) => Msg::SupervisorRunning(running),
        EngineEvent::Log { level, message } => Msg::Notice {
            level: map_level(level),
            message,
        },
    }
}

fn map_level(level: log::Level) -> NoticeLevel {
    match level {
        log::Level::Error => NoticeLevel::Error,
        log::Level::Warn => NoticeLevel::Warn,
        log::Level::Info => NoticeLevel::Info,
        log::Level::Debug | log::Level::Trace => NoticeLevel::Debug,
    }
}
