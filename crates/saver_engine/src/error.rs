use std::io;

use thiserror::Error;

use crate::storage::PersistError;

/// Refusals and failures of control-layer commands.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid channel name: {0:?}")]
    InvalidChannelName(String),

    #[error("channel is already tracked: {0}")]
    ChannelExists(String),

    #[error("unknown channel: {0}")]
    UnknownChannel(String),

    #[error("channel {0} has an active or queued recording")]
    ChannelBusy(String),

    #[error("recorder is already running")]
    AlreadyRunning,

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Failure to start a capture process for a dequeued job.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("capture command is empty")]
    EmptyCommand,

    #[error("target directory unavailable: {0}")]
    TargetDir(#[from] PersistError),

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
