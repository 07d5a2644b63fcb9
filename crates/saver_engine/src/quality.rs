use std::fmt;
use std::str::FromStr;

use thiserror::Error;

const BEST_VIDEO_AUDIO: &str = "bestvideo*+bestaudio/best";

/// Per-channel recording quality selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Quality {
    #[default]
    Maximum,
    P2160,
    P1440,
    P1080,
    P720,
    P480,
    P360,
    P240,
    P144,
}

pub const AVAILABLE_QUALITIES: &[Quality] = &[
    Quality::Maximum,
    Quality::P2160,
    Quality::P1440,
    Quality::P1080,
    Quality::P720,
    Quality::P480,
    Quality::P360,
    Quality::P240,
    Quality::P144,
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown recording quality: {0:?}")]
pub struct UnknownQuality(pub String);

impl Quality {
    pub fn key(self) -> &'static str {
        match self {
            Quality::Maximum => "maximum",
            Quality::P2160 => "2160p",
            Quality::P1440 => "1440p",
            Quality::P1080 => "1080p",
            Quality::P720 => "720p",
            Quality::P480 => "480p",
            Quality::P360 => "360p",
            Quality::P240 => "240p",
            Quality::P144 => "144p",
        }
    }

    pub fn height(self) -> Option<u32> {
        match self {
            Quality::Maximum => None,
            Quality::P2160 => Some(2160),
            Quality::P1440 => Some(1440),
            Quality::P1080 => Some(1080),
            Quality::P720 => Some(720),
            Quality::P480 => Some(480),
            Quality::P360 => Some(360),
            Quality::P240 => Some(240),
            Quality::P144 => Some(144),
        }
    }

    /// Capture-tool arguments for this quality.
    ///
    /// A height sorts formats by resolution so the closest available one
    /// wins when the exact height is not offered.
    pub fn capture_args(self) -> Vec<String> {
        let mut args = vec!["-f".to_string(), BEST_VIDEO_AUDIO.to_string()];
        if let Some(height) = self.height() {
            args.push("-S".to_string());
            args.push(format!("res:{height}"));
        }
        args
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Quality {
    type Err = UnknownQuality;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        if wanted.eq_ignore_ascii_case("best") {
            return Ok(Quality::Maximum);
        }
        AVAILABLE_QUALITIES
            .iter()
            .copied()
            .find(|quality| quality.key().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownQuality(s.to_string()))
    }
}
