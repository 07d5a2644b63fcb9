use std::collections::VecDeque;

use crate::view_model::{AppViewModel, ChannelRowView, NoticeView, ProcessRowView};

pub type Pid = u32;

pub const MAX_LOG_LINES: usize = 500;
pub const MAX_NOTICES: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Running,
    Stopping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelStatus {
    #[default]
    Unknown,
    Offline,
    Live,
    Queued,
    Recording,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    Running,
    Finished,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NoticeLevel {
    Error,
    Warn,
    Info,
    Debug,
}

/// Persistable part of a channel row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSnapshot {
    pub name: String,
    pub alias: Option<String>,
    pub quality: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ChannelRow {
    pub(crate) name: String,
    pub(crate) alias: Option<String>,
    pub(crate) quality: String,
    pub(crate) status: ChannelStatus,
    /// Last liveness reported by the scanner, independent of capture state.
    pub(crate) live: bool,
}

impl ChannelRow {
    fn settled_status(&self) -> ChannelStatus {
        if self.live {
            ChannelStatus::Live
        } else {
            ChannelStatus::Offline
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ProcessRow {
    pub(crate) pid: Pid,
    pub(crate) channel: String,
    pub(crate) title: String,
    pub(crate) outcome: ProcessOutcome,
    pub(crate) log: VecDeque<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Notice {
    pub(crate) level: NoticeLevel,
    pub(crate) message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    session: SessionState,
    channels: Vec<ChannelRow>,
    processes: Vec<ProcessRow>,
    notices: VecDeque<Notice>,
    hide_finished: bool,
    next_scan_in: Option<u64>,
    scanner_running: bool,
    supervisor_running: bool,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> SessionState {
        self.session
    }

    pub fn hide_finished(&self) -> bool {
        self.hide_finished
    }

    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn channel_status(&self, name: &str) -> Option<ChannelStatus> {
        self.channel(name).map(|row| row.status)
    }

    pub fn has_channel(&self, name: &str) -> bool {
        self.channel(name).is_some()
    }

    pub fn channels_snapshot(&self) -> Vec<ChannelSnapshot> {
        self.channels
            .iter()
            .map(|row| ChannelSnapshot {
                name: row.name.clone(),
                alias: row.alias.clone(),
                quality: row.quality.clone(),
            })
            .collect()
    }

    pub fn view(&self) -> AppViewModel {
        let channels = self
            .channels
            .iter()
            .map(|row| ChannelRowView {
                name: row.name.clone(),
                display_name: row.alias.clone().unwrap_or_else(|| row.name.clone()),
                quality: row.quality.clone(),
                status: row.status,
            })
            .collect();
        let processes = self
            .processes
            .iter()
            .filter(|p| !(self.hide_finished && p.outcome != ProcessOutcome::Running))
            .map(|p| ProcessRowView {
                pid: p.pid,
                channel: p.channel.clone(),
                title: p.title.clone(),
                outcome: p.outcome,
                last_line: p.log.back().cloned(),
                log_lines: p.log.len(),
            })
            .collect();
        let notices = self
            .notices
            .iter()
            .map(|n| NoticeView {
                level: n.level,
                message: n.message.clone(),
            })
            .collect();
        AppViewModel {
            session: self.session,
            channels,
            processes,
            notices,
            hide_finished: self.hide_finished,
            next_scan_in: self.next_scan_in,
            dirty: self.dirty,
        }
    }

    /// Retained output of one capture, oldest first.
    pub fn process_log(&self, pid: Pid) -> Option<Vec<String>> {
        self.process(pid).map(|p| p.log.iter().cloned().collect())
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn set_session(&mut self, session: SessionState) {
        if self.session != session {
            self.session = session;
            if session == SessionState::Idle {
                self.next_scan_in = None;
            }
            self.mark_dirty();
        }
    }

    pub(crate) fn set_hide_finished(&mut self, hide: bool) {
        if self.hide_finished != hide {
            self.hide_finished = hide;
            self.mark_dirty();
        }
    }

    pub(crate) fn set_next_scan_in(&mut self, seconds: u64) {
        if self.next_scan_in != Some(seconds) {
            self.next_scan_in = Some(seconds);
            self.mark_dirty();
        }
    }

    /// Returns `true` once both loops have reported they are down.
    pub(crate) fn set_loop_running(&mut self, scanner: Option<bool>, supervisor: Option<bool>) -> bool {
        if let Some(running) = scanner {
            self.scanner_running = running;
        }
        if let Some(running) = supervisor {
            self.supervisor_running = running;
        }
        !self.scanner_running && !self.supervisor_running
    }

    pub(crate) fn channel(&self, name: &str) -> Option<&ChannelRow> {
        self.channels.iter().find(|row| row.name == name)
    }

    fn channel_mut(&mut self, name: &str) -> Option<&mut ChannelRow> {
        self.channels.iter_mut().find(|row| row.name == name)
    }

    fn process(&self, pid: Pid) -> Option<&ProcessRow> {
        self.processes.iter().rev().find(|p| p.pid == pid)
    }

    fn process_mut(&mut self, pid: Pid) -> Option<&mut ProcessRow> {
        self.processes.iter_mut().rev().find(|p| p.pid == pid)
    }

    pub(crate) fn upsert_channel(&mut self, snapshot: ChannelSnapshot) {
        match self.channel_mut(&snapshot.name) {
            Some(row) => {
                row.alias = snapshot.alias;
                row.quality = snapshot.quality;
            }
            None => {
                self.channels.push(ChannelRow {
                    name: snapshot.name,
                    alias: snapshot.alias,
                    quality: snapshot.quality,
                    status: ChannelStatus::Unknown,
                    live: false,
                });
                self.channels.sort_by(|a, b| a.name.cmp(&b.name));
            }
        }
        self.mark_dirty();
    }

    pub(crate) fn remove_channel_row(&mut self, name: &str) {
        let before = self.channels.len();
        self.channels.retain(|row| row.name != name);
        if self.channels.len() != before {
            self.mark_dirty();
        }
    }

    pub(crate) fn apply_liveness(&mut self, name: &str, live: bool) {
        if let Some(row) = self.channel_mut(name) {
            row.live = live;
            if !matches!(row.status, ChannelStatus::Queued | ChannelStatus::Recording) {
                row.status = row.settled_status();
            }
            self.mark_dirty();
        }
    }

    pub(crate) fn apply_queued(&mut self, name: &str) {
        if let Some(row) = self.channel_mut(name) {
            row.status = ChannelStatus::Queued;
            self.mark_dirty();
        }
    }

    pub(crate) fn apply_dropped(&mut self, name: &str) {
        if let Some(row) = self.channel_mut(name) {
            if row.status == ChannelStatus::Queued {
                row.status = row.settled_status();
                self.mark_dirty();
            }
        }
    }

    pub(crate) fn apply_started(&mut self, channel: String, pid: Pid, title: String) {
        if let Some(row) = self.channel_mut(&channel) {
            row.status = ChannelStatus::Recording;
        }
        // The OS may hand out a finished capture's pid again.
        self.processes.retain(|p| p.pid != pid);
        self.processes.push(ProcessRow {
            pid,
            channel,
            title,
            outcome: ProcessOutcome::Running,
            log: VecDeque::new(),
        });
        self.mark_dirty();
    }

    pub(crate) fn apply_log(&mut self, pid: Pid, line: String) {
        if let Some(process) = self.process_mut(pid) {
            if process.log.len() == MAX_LOG_LINES {
                process.log.pop_front();
            }
            process.log.push_back(line);
            self.mark_dirty();
        }
    }

    pub(crate) fn apply_exit(&mut self, pid: Pid, outcome: ProcessOutcome) {
        let Some(process) = self.process_mut(pid) else {
            return;
        };
        process.outcome = outcome;
        let channel = process.channel.clone();
        if let Some(row) = self.channel_mut(&channel) {
            if row.status == ChannelStatus::Recording {
                row.status = match outcome {
                    ProcessOutcome::Failed => ChannelStatus::Failed,
                    _ => row.settled_status(),
                };
            }
        }
        self.mark_dirty();
    }

    /// Channels left queued when the recorder goes down never started.
    pub(crate) fn settle_queued(&mut self) {
        for row in &mut self.channels {
            if row.status == ChannelStatus::Queued {
                row.status = row.settled_status();
            }
        }
    }

    pub(crate) fn push_notice(&mut self, level: NoticeLevel, message: String) {
        if self.notices.len() == MAX_NOTICES {
            self.notices.pop_front();
        }
        self.notices.push_back(Notice { level, message });
        self.mark_dirty();
    }
}
