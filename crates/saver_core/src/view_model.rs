use crate::{ChannelStatus, NoticeLevel, Pid, ProcessOutcome, SessionState};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub session: SessionState,
    /// Sorted by channel name.
    pub channels: Vec<ChannelRowView>,
    /// In start order; finished rows are left out while `hide_finished` is set.
    pub processes: Vec<ProcessRowView>,
    pub notices: Vec<NoticeView>,
    pub hide_finished: bool,
    pub next_scan_in: Option<u64>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRowView {
    pub name: String,
    pub display_name: String,
    pub quality: String,
    pub status: ChannelStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessRowView {
    pub pid: Pid,
    pub channel: String,
    pub title: String,
    pub outcome: ProcessOutcome,
    pub last_line: Option<String>,
    pub log_lines: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeView {
    pub level: NoticeLevel,
    pub message: String,
}
