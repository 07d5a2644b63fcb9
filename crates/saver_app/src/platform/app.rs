use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use engine_logging::engine_info;
use saver_core::{update, AppState, ChannelSnapshot, Msg};

use super::console::{self, Command, HELP};
use super::effects::EffectRunner;
use super::logging::{self, LogDestination};
use super::persistence::{self, LoadedSettings};
use super::render;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct AppOptions {
    pub settings_path: PathBuf,
    pub log: LogDestination,
    pub autostart: bool,
}

/// Everything the app loop reacts to, from the console or the engine.
#[derive(Debug)]
pub(crate) enum AppInput {
    Msg(Msg),
    Command(Command),
    Invalid(String),
}

pub fn run_app(options: AppOptions) -> anyhow::Result<()> {
    logging::initialize(options.log);

    let loaded = persistence::load_settings(&options.settings_path);
    let (tx, rx) = mpsc::channel::<AppInput>();

    let runner = EffectRunner::new(loaded.recorder.clone(), tx.clone());
    let channels = runner.restore_channels(loaded.channels);

    let mut app = App {
        state: AppState::new(),
        runner,
        settings_path: options.settings_path,
        last_summary: String::new(),
    };
    app.dispatch(Msg::RestoreChannels(channels));
    app.dispatch(Msg::HideFinishedToggled(loaded.hide_finished));

    console::spawn_reader(tx)?;
    println!("{HELP}");

    if options.autostart {
        app.dispatch(Msg::StartClicked);
    }

    loop {
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(AppInput::Msg(msg)) => app.dispatch(msg),
            Ok(AppInput::Command(Command::Msg(msg))) => app.dispatch(msg),
            Ok(AppInput::Command(Command::List)) => print!("{}", render::table(&app.state.view())),
            Ok(AppInput::Command(Command::Help)) => println!("{HELP}"),
            Ok(AppInput::Command(Command::Quit)) => break,
            Ok(AppInput::Invalid(message)) => println!("{message} (try `help`)"),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    engine_info!("Shutting down; waiting for recordings to stop");
    app.runner.shutdown();
    while let Ok(input) = rx.try_recv() {
        if let AppInput::Msg(msg) = input {
            app.dispatch(msg);
        }
    }
    app.save();
    Ok(())
}

struct App {
    state: AppState,
    runner: EffectRunner,
    settings_path: PathBuf,
    last_summary: String,
}

impl App {
    fn dispatch(&mut self, msg: Msg) {
        let before = self.persisted_view();
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        let dirty = state.consume_dirty();
        self.state = state;

        if self.persisted_view() != before {
            self.save();
        }
        self.runner.enqueue(effects);

        if dirty {
            let summary = render::summary(&self.state.view());
            if summary != self.last_summary {
                println!("{}", render::stamp(&summary));
                self.last_summary = summary;
            }
        }
    }

    fn persisted_view(&self) -> (Vec<ChannelSnapshot>, bool) {
        (self.state.channels_snapshot(), self.state.hide_finished())
    }

    fn save(&self) {
        persistence::save_settings(
            &self.settings_path,
            &LoadedSettings {
                recorder: self.runner.settings(),
                channels: self.state.channels_snapshot(),
                hide_finished: self.state.hide_finished(),
            },
        );
    }
}
