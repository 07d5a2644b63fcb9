//! Stream saver core: pure state machine and view-model helpers.
mod channel_input;
mod effect;
mod msg;
mod state;
mod update;
mod view_model;

pub use channel_input::{parse_channel_input, ChannelInputError};
pub use effect::Effect;
pub use msg::Msg;
pub use state::{
    AppState, ChannelSnapshot, ChannelStatus, NoticeLevel, Pid, ProcessOutcome, SessionState,
    MAX_LOG_LINES, MAX_NOTICES,
};
pub use update::update;
pub use view_model::{AppViewModel, ChannelRowView, NoticeView, ProcessRowView};
