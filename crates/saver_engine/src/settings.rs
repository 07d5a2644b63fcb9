use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_RECORDS_DIR: &str = "records";
pub const DEFAULT_FFMPEG: &str = "ffmpeg";
pub const DEFAULT_YTDLP: &str = "yt-dlp";
pub const DEFAULT_MAX_DOWNLOADS: usize = 2;
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(300);
pub const DEFAULT_TERMINATION_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_LIVE_URL_TEMPLATE: &str = "https://www.youtube.com/@{}/live";

/// Live-updatable tunables read by both loops at the point of use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecorderSettings {
    pub records_dir: PathBuf,
    /// Remux tool handed to the capture tool via `--ffmpeg-location`.
    pub ffmpeg_path: String,
    /// Resolver/capture command line; split on whitespace so `python -m yt_dlp` works.
    pub ytdlp_command: String,
    /// Concurrency ceiling for capture processes; zero means unlimited.
    pub max_downloads: usize,
    pub scan_interval: Duration,
    pub termination_timeout: Duration,
    pub cookies_from_browser: Option<String>,
    /// Browser user agent sent along with browser cookies.
    pub user_agent: Option<String>,
    /// Channel page template; `{}` is replaced by the channel name.
    pub live_url_template: String,
}

impl Default for RecorderSettings {
    fn default() -> Self {
        Self {
            records_dir: PathBuf::from(DEFAULT_RECORDS_DIR),
            ffmpeg_path: DEFAULT_FFMPEG.to_string(),
            ytdlp_command: DEFAULT_YTDLP.to_string(),
            max_downloads: DEFAULT_MAX_DOWNLOADS,
            scan_interval: DEFAULT_SCAN_INTERVAL,
            termination_timeout: DEFAULT_TERMINATION_TIMEOUT,
            cookies_from_browser: None,
            user_agent: None,
            live_url_template: DEFAULT_LIVE_URL_TEMPLATE.to_string(),
        }
    }
}

impl RecorderSettings {
    pub fn has_free_slot(&self, running: usize) -> bool {
        self.max_downloads == 0 || running < self.max_downloads
    }

    pub fn live_url(&self, channel: &str) -> String {
        self.live_url_template.replace("{}", channel)
    }

    pub fn cookies_browser(&self) -> Option<&str> {
        self.cookies_from_browser
            .as_deref()
            .map(str::trim)
            .filter(|browser| !browser.is_empty())
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent
            .as_deref()
            .map(str::trim)
            .filter(|agent| !agent.is_empty())
    }
}
