use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use engine_logging::{engine_error, engine_info, engine_warn};
use saver_core::ChannelSnapshot;
use saver_engine::{
    write_atomically, RecorderSettings, DEFAULT_FFMPEG, DEFAULT_RECORDS_DIR, DEFAULT_SCAN_INTERVAL,
    DEFAULT_YTDLP,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct PersistedChannel {
    name: String,
    #[serde(default)]
    alias: Option<String>,
    #[serde(default = "default_quality")]
    quality: String,
}

fn default_quality() -> String {
    "maximum".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
struct PersistedSettings {
    records_dir: String,
    ffmpeg_path: String,
    ytdlp_command: String,
    max_downloads: usize,
    scan_interval_secs: u64,
    termination_timeout_secs: u64,
    cookies_from_browser: Option<String>,
    user_agent: Option<String>,
    hide_finished: bool,
    channels: Vec<PersistedChannel>,
}

impl Default for PersistedSettings {
    fn default() -> Self {
        let recorder = RecorderSettings::default();
        Self {
            records_dir: recorder.records_dir.to_string_lossy().into_owned(),
            ffmpeg_path: recorder.ffmpeg_path,
            ytdlp_command: recorder.ytdlp_command,
            max_downloads: recorder.max_downloads,
            scan_interval_secs: recorder.scan_interval.as_secs(),
            termination_timeout_secs: recorder.termination_timeout.as_secs(),
            cookies_from_browser: None,
            user_agent: None,
            hide_finished: false,
            channels: Vec::new(),
        }
    }
}

/// Everything the app restores at startup.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct LoadedSettings {
    pub(crate) recorder: RecorderSettings,
    pub(crate) channels: Vec<ChannelSnapshot>,
    pub(crate) hide_finished: bool,
}

pub(crate) fn load_settings(path: &Path) -> LoadedSettings {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            engine_info!("No settings at {:?}; writing defaults", path);
            let loaded = LoadedSettings::default();
            save_settings(path, &loaded);
            return loaded;
        }
        Err(err) => {
            engine_warn!("Failed to read settings from {:?}: {}", path, err);
            return LoadedSettings::default();
        }
    };

    let persisted: PersistedSettings = match ron::from_str(&content) {
        Ok(settings) => settings,
        Err(err) => {
            engine_warn!("Failed to parse settings from {:?}: {}", path, err);
            return LoadedSettings::default();
        }
    };

    engine_info!("Loaded settings from {:?}", path);
    validate(persisted)
}

/// Blank paths and a zero scan interval fall back to defaults.
fn validate(persisted: PersistedSettings) -> LoadedSettings {
    let records_dir = non_blank(persisted.records_dir, "records_dir", DEFAULT_RECORDS_DIR);
    let ffmpeg_path = non_blank(persisted.ffmpeg_path, "ffmpeg_path", DEFAULT_FFMPEG);
    let ytdlp_command = non_blank(persisted.ytdlp_command, "ytdlp_command", DEFAULT_YTDLP);
    let scan_interval = if persisted.scan_interval_secs == 0 {
        engine_warn!("scan_interval_secs must be positive; using the default");
        DEFAULT_SCAN_INTERVAL
    } else {
        Duration::from_secs(persisted.scan_interval_secs)
    };

    let recorder = RecorderSettings {
        records_dir: PathBuf::from(records_dir),
        ffmpeg_path,
        ytdlp_command,
        max_downloads: persisted.max_downloads,
        scan_interval,
        termination_timeout: Duration::from_secs(persisted.termination_timeout_secs),
        cookies_from_browser: persisted
            .cookies_from_browser
            .filter(|browser| !browser.trim().is_empty()),
        user_agent: persisted
            .user_agent
            .filter(|agent| !agent.trim().is_empty()),
        ..RecorderSettings::default()
    };
    let channels = persisted
        .channels
        .into_iter()
        .map(|channel| ChannelSnapshot {
            name: channel.name,
            alias: channel.alias,
            quality: channel.quality,
        })
        .collect();

    LoadedSettings {
        recorder,
        channels,
        hide_finished: persisted.hide_finished,
    }
}

fn non_blank(value: String, field: &str, fallback: &str) -> String {
    if value.trim().is_empty() {
        engine_warn!("{field} is empty; using {fallback:?}");
        fallback.to_string()
    } else {
        value
    }
}

pub(crate) fn save_settings(path: &Path, settings: &LoadedSettings) {
    let recorder = &settings.recorder;
    let persisted = PersistedSettings {
        records_dir: recorder.records_dir.to_string_lossy().into_owned(),
        ffmpeg_path: recorder.ffmpeg_path.clone(),
        ytdlp_command: recorder.ytdlp_command.clone(),
        max_downloads: recorder.max_downloads,
        scan_interval_secs: recorder.scan_interval.as_secs(),
        termination_timeout_secs: recorder.termination_timeout.as_secs(),
        cookies_from_browser: recorder.cookies_from_browser.clone(),
        user_agent: recorder.user_agent.clone(),
        hide_finished: settings.hide_finished,
        channels: settings
            .channels
            .iter()
            .map(|channel| PersistedChannel {
                name: channel.name.clone(),
                alias: channel.alias.clone(),
                quality: channel.quality.clone(),
            })
            .collect(),
    };

    let pretty = ron::ser::PrettyConfig::new();
    let content = match ron::ser::to_string_pretty(&persisted, pretty) {
        Ok(text) => text,
        Err(err) => {
            engine_error!("Failed to serialize settings: {}", err);
            return;
        }
    };

    if let Err(err) = write_atomically(path, &content) {
        engine_error!("Failed to write settings to {:?}: {}", path, err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.ron");

        let loaded = load_settings(&path);
        assert_eq!(loaded, LoadedSettings::default());
        assert!(path.is_file());
    }

    #[test]
    fn saved_settings_load_back() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.ron");
        let settings = LoadedSettings {
            recorder: RecorderSettings {
                max_downloads: 0,
                termination_timeout: Duration::ZERO,
                cookies_from_browser: Some("firefox".to_string()),
                user_agent: Some("Mozilla/5.0 (X11; Linux x86_64) Firefox/128.0".to_string()),
                ..RecorderSettings::default()
            },
            channels: vec![ChannelSnapshot {
                name: "alpha".to_string(),
                alias: Some("Alpha TV".to_string()),
                quality: "720p".to_string(),
            }],
            hide_finished: true,
        };

        save_settings(&path, &settings);
        assert_eq!(load_settings(&path), settings);
    }

    #[test]
    fn blank_fields_fall_back_to_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.ron");
        fs::write(
            &path,
            "(records_dir: \"  \", ytdlp_command: \"\", scan_interval_secs: 0, max_downloads: 4)",
        )
        .unwrap();

        let loaded = load_settings(&path);
        assert_eq!(loaded.recorder.records_dir, PathBuf::from(DEFAULT_RECORDS_DIR));
        assert_eq!(loaded.recorder.ytdlp_command, DEFAULT_YTDLP);
        assert_eq!(loaded.recorder.scan_interval, DEFAULT_SCAN_INTERVAL);
        assert_eq!(loaded.recorder.max_downloads, 4);
    }

    #[test]
    fn unparsable_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.ron");
        fs::write(&path, "not ron at all {").unwrap();

        assert_eq!(load_settings(&path), LoadedSettings::default());
    }
}
