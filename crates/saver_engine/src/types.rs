use std::process::ExitStatus;

use log::Level;

/// Operating-system identifier of a running capture process.
pub type Pid = u32;

/// One unit of "start capturing this now-live channel" work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamJob {
    pub channel: String,
    pub manifest_url: String,
    /// Canonical watch page of the broadcast, kept for diagnostics.
    pub page_url: String,
    pub title: String,
    pub quality_args: Vec<String>,
}

/// Events consumed by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    ChannelLive {
        channel: String,
    },
    ChannelOffline {
        channel: String,
    },
    JobQueued {
        channel: String,
    },
    /// A queued job was discarded before its capture started.
    JobDropped {
        channel: String,
    },
    ProcessStarted {
        channel: String,
        pid: Pid,
        title: String,
    },
    ProcessLog {
        pid: Pid,
        line: String,
    },
    ProcessFinished {
        pid: Pid,
    },
    ProcessFailed {
        pid: Pid,
    },
    /// Seconds left before the scanner starts its next pass.
    NextScanIn {
        seconds: u64,
    },
    ScannerRunning(bool),
    SupervisorRunning(bool),
    Log {
        level: Level,
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    Finished,
    Failed,
}

impl ExitOutcome {
    /// Only a clean zero exit counts as success; signals and non-zero codes fail.
    pub fn from_status(status: ExitStatus) -> Self {
        match status.code() {
            Some(0) => ExitOutcome::Finished,
            _ => ExitOutcome::Failed,
        }
    }

    pub fn event(self, pid: Pid) -> EngineEvent {
        match self {
            ExitOutcome::Finished => EngineEvent::ProcessFinished { pid },
            ExitOutcome::Failed => EngineEvent::ProcessFailed { pid },
        }
    }
}
