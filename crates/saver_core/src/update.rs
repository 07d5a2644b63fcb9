use crate::{
    parse_channel_input, AppState, ChannelStatus, Effect, Msg, NoticeLevel, ProcessOutcome,
    SessionState,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::AddChannel {
            input,
            alias,
            quality,
        } => match parse_channel_input(&input) {
            Ok(name) if state.has_channel(&name) => {
                state.push_notice(
                    NoticeLevel::Warn,
                    format!("Channel {name} is already tracked."),
                );
                Vec::new()
            }
            Ok(name) => vec![Effect::AddChannel {
                name,
                alias: clean_alias(alias),
                quality,
            }],
            Err(err) => {
                state.push_notice(NoticeLevel::Warn, err.to_string());
                Vec::new()
            }
        },
        Msg::RemoveChannel { name } => match state.channel_status(&name) {
            None => {
                state.push_notice(NoticeLevel::Warn, format!("Unknown channel {name}."));
                Vec::new()
            }
            Some(ChannelStatus::Queued | ChannelStatus::Recording) => {
                state.push_notice(
                    NoticeLevel::Warn,
                    format!("Channel {name} is recording; stop it before removing."),
                );
                Vec::new()
            }
            Some(_) => vec![Effect::RemoveChannel { name }],
        },
        Msg::EditChannel {
            name,
            alias,
            quality,
        } => {
            if state.has_channel(&name) {
                vec![Effect::UpdateChannel {
                    name,
                    alias: clean_alias(alias),
                    quality,
                }]
            } else {
                state.push_notice(NoticeLevel::Warn, format!("Unknown channel {name}."));
                Vec::new()
            }
        }
        Msg::StartClicked => {
            if state.session() == SessionState::Idle {
                state.set_session(SessionState::Running);
                vec![Effect::Start]
            } else {
                Vec::new()
            }
        }
        Msg::StopClicked => {
            if state.session() == SessionState::Running {
                state.set_session(SessionState::Stopping);
                vec![Effect::Stop]
            } else {
                Vec::new()
            }
        }
        Msg::StopProcessClicked { pid } => {
            if state.session() == SessionState::Running {
                vec![Effect::StopProcess { pid }]
            } else {
                Vec::new()
            }
        }
        Msg::ScanNowClicked => {
            if state.session() == SessionState::Running {
                vec![Effect::ScanNow]
            } else {
                Vec::new()
            }
        }
        Msg::HideFinishedToggled(hide) => {
            state.set_hide_finished(hide);
            Vec::new()
        }
        Msg::RestoreChannels(channels) => {
            for channel in channels {
                state.upsert_channel(channel);
            }
            Vec::new()
        }
        Msg::ChannelSaved(snapshot) => {
            state.upsert_channel(snapshot);
            Vec::new()
        }
        Msg::ChannelRemoved { name } => {
            state.remove_channel_row(&name);
            Vec::new()
        }
        Msg::ChannelLive { channel } => {
            state.apply_liveness(&channel, true);
            Vec::new()
        }
        Msg::ChannelOffline { channel } => {
            state.apply_liveness(&channel, false);
            Vec::new()
        }
        Msg::RecordingQueued { channel } => {
            state.apply_queued(&channel);
            Vec::new()
        }
        Msg::RecordingDropped { channel } => {
            state.apply_dropped(&channel);
            Vec::new()
        }
        Msg::RecordingStarted {
            channel,
            pid,
            title,
        } => {
            state.apply_started(channel, pid, title);
            Vec::new()
        }
        Msg::RecordingLog { pid, line } => {
            state.apply_log(pid, line);
            Vec::new()
        }
        Msg::RecordingFinished { pid } => {
            state.apply_exit(pid, ProcessOutcome::Finished);
            Vec::new()
        }
        Msg::RecordingFailed { pid } => {
            state.apply_exit(pid, ProcessOutcome::Failed);
            Vec::new()
        }
        Msg::NextScanIn { seconds } => {
            if state.session() == SessionState::Running {
                state.set_next_scan_in(seconds);
            }
            Vec::new()
        }
        Msg::ScannerRunning(running) => {
            if state.set_loop_running(Some(running), None) && !running {
                stop_session(&mut state);
            }
            Vec::new()
        }
        Msg::SupervisorRunning(running) => {
            if state.set_loop_running(None, Some(running)) && !running {
                stop_session(&mut state);
            }
            Vec::new()
        }
        Msg::EngineStopped => {
            state.set_loop_running(Some(false), Some(false));
            stop_session(&mut state);
            Vec::new()
        }
        Msg::CommandRejected { message } => {
            state.push_notice(NoticeLevel::Error, message);
            Vec::new()
        }
        Msg::Notice { level, message } => {
            state.push_notice(level, message);
            Vec::new()
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn stop_session(state: &mut AppState) {
    state.settle_queued();
    state.set_session(SessionState::Idle);
    state.mark_dirty();
}

fn clean_alias(alias: Option<String>) -> Option<String> {
    alias
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
}
