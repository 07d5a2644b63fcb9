//! Resolution of a channel's canonical live URL into a playable stream.

use std::io;
use std::process::Stdio;

use serde::Deserialize;
use thiserror::Error;

use crate::cmd::{command, split_command};

const SCHEDULED_MARKER: &str = "live event will begin in ";
const NOT_LIVE_MARKERS: &[&str] = &[
    "not currently live",
    "is not live",
    "has no live",
    "this live event has ended",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveStream {
    pub manifest_url: String,
    pub title: String,
    pub page_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Live(LiveStream),
    NotLive,
    /// Premiere announced; `starts_in` is the tool's own wording, e.g. "3 hours".
    Scheduled { starts_in: String },
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("resolver command is empty")]
    EmptyCommand,
    #[error("invalid live url {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("resolver exited with {code:?}: {message}")]
    ToolFailed { code: Option<i32>, message: String },
    #[error("malformed resolver output: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("live stream without a manifest url")]
    MissingManifest,
}

/// Everything a resolver needs for one lookup, read from settings at call time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveRequest {
    pub live_url: String,
    pub command: String,
    pub cookies_from_browser: Option<String>,
}

/// Synchronous black-box lookup; implementations rely on the tool's own retries.
pub trait StreamResolver: Send + Sync {
    fn resolve(&self, request: &ResolveRequest) -> Result<Resolution, ResolveError>;
}

/// Resolver backed by `yt-dlp --dump-single-json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct YtDlpResolver;

impl YtDlpResolver {
    pub fn new() -> Self {
        Self
    }

    fn args(request: &ResolveRequest) -> Vec<String> {
        let mut args = vec![
            "--dump-single-json".to_string(),
            "--no-warnings".to_string(),
            "--socket-timeout".to_string(),
            "10".to_string(),
            "--retries".to_string(),
            "10".to_string(),
        ];
        if let Some(browser) = request.cookies_from_browser.as_deref() {
            args.push("--cookies-from-browser".to_string());
            args.push(browser.to_string());
        }
        args.push(request.live_url.clone());
        args
    }
}

impl StreamResolver for YtDlpResolver {
    fn resolve(&self, request: &ResolveRequest) -> Result<Resolution, ResolveError> {
        url::Url::parse(&request.live_url).map_err(|source| ResolveError::InvalidUrl {
            url: request.live_url.clone(),
            source,
        })?;
        let (program, leading) =
            split_command(&request.command).ok_or(ResolveError::EmptyCommand)?;

        let output = command(&program)
            .args(&leading)
            .args(Self::args(request))
            .stdin(Stdio::null())
            .output()
            .map_err(|source| ResolveError::Spawn {
                program: program.clone(),
                source,
            })?;

        classify_output(
            output.status.success(),
            output.status.code(),
            &String::from_utf8_lossy(&output.stdout),
            &String::from_utf8_lossy(&output.stderr),
            &request.live_url,
        )
    }
}

#[derive(Debug, Deserialize)]
struct InfoJson {
    #[serde(default)]
    is_live: Option<bool>,
    #[serde(default)]
    live_status: Option<String>,
    #[serde(default)]
    manifest_url: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    webpage_url: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

impl InfoJson {
    fn is_live(&self) -> bool {
        self.is_live == Some(true) || self.live_status.as_deref() == Some("is_live")
    }
}

/// Classifies one resolver run from its exit state and captured output.
pub fn classify_output(
    success: bool,
    code: Option<i32>,
    stdout: &str,
    stderr: &str,
    live_url: &str,
) -> Result<Resolution, ResolveError> {
    if !success {
        if let Some(starts_in) = scheduled_start(stderr) {
            return Ok(Resolution::Scheduled { starts_in });
        }
        let lowered = stderr.to_ascii_lowercase();
        if NOT_LIVE_MARKERS.iter().any(|m| lowered.contains(m)) {
            return Ok(Resolution::NotLive);
        }
        return Err(ResolveError::ToolFailed {
            code,
            message: last_error_line(stderr),
        });
    }

    let info: InfoJson = serde_json::from_str(stdout.trim())?;
    if !info.is_live() {
        return Ok(Resolution::NotLive);
    }
    let page_url = info
        .webpage_url
        .clone()
        .unwrap_or_else(|| live_url.to_string());
    let manifest_url = info
        .manifest_url
        .or(info.url)
        .or(info.webpage_url)
        .filter(|u| !u.trim().is_empty())
        .ok_or(ResolveError::MissingManifest)?;
    Ok(Resolution::Live(LiveStream {
        manifest_url,
        title: info.title.unwrap_or_default(),
        page_url,
    }))
}

fn scheduled_start(stderr: &str) -> Option<String> {
    let start = stderr.find(SCHEDULED_MARKER)? + SCHEDULED_MARKER.len();
    let rest = stderr[start..].lines().next().unwrap_or_default();
    let text = rest.trim().trim_end_matches('.').trim();
    Some(text.to_string())
}

fn last_error_line(stderr: &str) -> String {
    let mut lines = stderr.lines().map(str::trim).filter(|l| !l.is_empty());
    let fallback = lines.clone().last();
    lines
        .filter(|l| l.starts_with("ERROR"))
        .last()
        .or(fallback)
        .unwrap_or("no diagnostic output")
        .to_string()
}
