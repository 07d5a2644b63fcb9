//! Stream saver engine: channel scanning, capture process supervision and
//! the thread plumbing between them.
mod capture;
mod channels;
mod cmd;
mod control;
mod engine;
mod error;
mod process;
mod quality;
mod queue;
mod registry;
mod resolver;
mod scanner;
mod settings;
mod shared;
mod sink;
mod storage;
mod supervisor;
mod tailer;
mod tools;
mod types;

pub use capture::{capture_args, launch, MERGE_FORMAT, OUTPUT_TEMPLATE};
pub use channels::{validate_channel_name, ChannelConfig, ChannelRegistry};
pub use control::{ScanTrigger, StopToken, Stopped};
pub use engine::Recorder;
pub use error::{EngineError, LaunchError};
pub use process::CaptureProcess;
pub use quality::{Quality, UnknownQuality, AVAILABLE_QUALITIES};
pub use queue::{job_queue, JobReceiver, JobSender};
pub use registry::ProcessRegistry;
pub use resolver::{
    classify_output, LiveStream, Resolution, ResolveError, ResolveRequest, StreamResolver,
    YtDlpResolver,
};
pub use scanner::{ScanState, Scanner};
pub use settings::{
    RecorderSettings, DEFAULT_FFMPEG, DEFAULT_LIVE_URL_TEMPLATE, DEFAULT_MAX_DOWNLOADS,
    DEFAULT_RECORDS_DIR, DEFAULT_SCAN_INTERVAL, DEFAULT_TERMINATION_TIMEOUT, DEFAULT_YTDLP,
};
pub use shared::{Shared, SharedState};
pub use sink::{report, ChannelEventSink, EventSink};
pub use storage::{channel_dir_name, ensure_channel_dir, ensure_dir, write_atomically, PersistError};
pub use supervisor::{Supervisor, DEFAULT_TICK};
pub use tailer::LogTailer;
pub use tools::{probe_remux_tool, probe_tool};
pub use types::{EngineEvent, ExitOutcome, Pid, StreamJob};
