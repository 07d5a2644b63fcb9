use crate::Pid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    AddChannel {
        name: String,
        alias: Option<String>,
        quality: String,
    },
    RemoveChannel {
        name: String,
    },
    UpdateChannel {
        name: String,
        alias: Option<String>,
        quality: String,
    },
    Start,
    Stop,
    StopProcess {
        pid: Pid,
    },
    ScanNow,
}
