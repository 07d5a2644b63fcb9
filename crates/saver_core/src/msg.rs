use crate::{ChannelSnapshot, NoticeLevel, Pid};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User asked to track a channel; `input` may be a name, `@name` or a channel url.
    AddChannel {
        input: String,
        alias: Option<String>,
        quality: String,
    },
    RemoveChannel {
        name: String,
    },
    EditChannel {
        name: String,
        alias: Option<String>,
        quality: String,
    },
    StartClicked,
    StopClicked,
    /// Stop a single capture by its process id.
    StopProcessClicked {
        pid: Pid,
    },
    ScanNowClicked,
    HideFinishedToggled(bool),
    /// Channels loaded from the settings file at startup.
    RestoreChannels(Vec<ChannelSnapshot>),

    /// The engine accepted a channel add or edit.
    ChannelSaved(ChannelSnapshot),
    ChannelRemoved {
        name: String,
    },
    ChannelLive {
        channel: String,
    },
    ChannelOffline {
        channel: String,
    },
    RecordingQueued {
        channel: String,
    },
    /// A queued recording was discarded before it started.
    RecordingDropped {
        channel: String,
    },
    RecordingStarted {
        channel: String,
        pid: Pid,
        title: String,
    },
    RecordingLog {
        pid: Pid,
        line: String,
    },
    RecordingFinished {
        pid: Pid,
    },
    RecordingFailed {
        pid: Pid,
    },
    NextScanIn {
        seconds: u64,
    },
    ScannerRunning(bool),
    SupervisorRunning(bool),
    /// The engine could not be started or has fully stopped.
    EngineStopped,
    /// The engine refused an effect; `message` is shown to the operator.
    CommandRejected {
        message: String,
    },
    Notice {
        level: NoticeLevel,
        message: String,
    },
    NoOp,
}
