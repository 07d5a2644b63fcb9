//! Plain-text rendering of the view model.

use std::fmt::Write;

use chrono::Local;
use saver_core::{AppViewModel, ChannelStatus, ProcessOutcome, SessionState};

fn session_label(session: SessionState) -> &'static str {
    match session {
        SessionState::Idle => "idle",
        SessionState::Running => "running",
        SessionState::Stopping => "stopping",
    }
}

fn status_label(status: ChannelStatus) -> &'static str {
    match status {
        ChannelStatus::Unknown => "unknown",
        ChannelStatus::Offline => "offline",
        ChannelStatus::Live => "live",
        ChannelStatus::Queued => "queued",
        ChannelStatus::Recording => "recording",
        ChannelStatus::Failed => "failed",
    }
}

fn outcome_label(outcome: ProcessOutcome) -> &'static str {
    match outcome {
        ProcessOutcome::Running => "running",
        ProcessOutcome::Finished => "finished",
        ProcessOutcome::Failed => "failed",
    }
}

/// One-line status; printed only when it differs from the previous one.
pub fn summary(view: &AppViewModel) -> String {
    let channels = view
        .channels
        .iter()
        .map(|row| format!("{} [{}]", row.display_name, status_label(row.status)))
        .collect::<Vec<_>>()
        .join(", ");
    let running = view
        .processes
        .iter()
        .filter(|p| p.outcome == ProcessOutcome::Running)
        .count();
    format!(
        "{} | channels: {} | recording: {}",
        session_label(view.session),
        if channels.is_empty() { "none".to_string() } else { channels },
        running
    )
}

pub fn stamp(line: &str) -> String {
    format!("[{}] {}", Local::now().format("%H:%M:%S"), line)
}

/// Full listing for the `list` command.
pub fn table(view: &AppViewModel) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "session: {}", session_label(view.session));
    if let Some(seconds) = view.next_scan_in {
        let _ = writeln!(out, "next scan in {seconds}s");
    }

    let _ = writeln!(out, "channels:");
    if view.channels.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for row in &view.channels {
        let _ = writeln!(
            out,
            "  {:<24} {:<8} {:<10} {}",
            row.name,
            row.quality,
            status_label(row.status),
            if row.display_name != row.name {
                row.display_name.as_str()
            } else {
                ""
            }
        );
    }

    let _ = writeln!(
        out,
        "recordings{}:",
        if view.hide_finished { " (finished hidden)" } else { "" }
    );
    if view.processes.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for process in &view.processes {
        let _ = writeln!(
            out,
            "  {:>7} {:<24} {:<9} {}",
            process.pid,
            process.channel,
            outcome_label(process.outcome),
            process.title
        );
        if let Some(line) = &process.last_line {
            let _ = writeln!(out, "          > {line}");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use saver_core::{update, AppState, ChannelSnapshot, Msg};

    fn view_with_recording() -> AppViewModel {
        let (state, _) = update(
            AppState::new(),
            Msg::RestoreChannels(vec![ChannelSnapshot {
                name: "alpha".to_string(),
                alias: Some("Alpha TV".to_string()),
                quality: "720p".to_string(),
            }]),
        );
        let (state, _) = update(
            state,
            Msg::RecordingStarted {
                channel: "alpha".to_string(),
                pid: 42,
                title: "Morning show".to_string(),
            },
        );
        state.view()
    }

    #[test]
    fn summary_lists_channels_and_running_count() {
        assert_eq!(
            summary(&view_with_recording()),
            "idle | channels: Alpha TV [recording] | recording: 1"
        );
        assert_eq!(
            summary(&AppViewModel::default()),
            "idle | channels: none | recording: 0"
        );
    }

    #[test]
    fn table_shows_processes() {
        let table = table(&view_with_recording());
        assert!(table.contains("alpha"));
        assert!(table.contains("Morning show"));
        assert!(table.contains("recording"));
    }
}
