//! Command-line construction and launching of capture processes.

use std::path::Path;
use std::process::Stdio;

use engine_logging::engine_debug;

use crate::cmd::{command, split_command};
use crate::process::CaptureProcess;
use crate::storage::ensure_channel_dir;
use crate::tailer::LogTailer;
use crate::{LaunchError, RecorderSettings, StreamJob};

pub const OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";
pub const MERGE_FORMAT: &str = "mp4/mkv";

/// Capture-tool arguments for `job`, excluding the program and its leading args.
pub fn capture_args(job: &StreamJob, settings: &RecorderSettings, target_dir: &Path) -> Vec<String> {
    let mut args: Vec<String> = vec![
        job.manifest_url.clone(),
        "-P".into(),
        target_dir.to_string_lossy().into_owned(),
        "-o".into(),
        OUTPUT_TEMPLATE.into(),
        "--ffmpeg-location".into(),
        settings.ffmpeg_path.clone(),
        "--live-from-start".into(),
        "--no-part".into(),
        "--socket-timeout".into(),
        "10".into(),
        "--retries".into(),
        "10".into(),
        "--retry-sleep".into(),
        "5".into(),
        "--no-progress".into(),
    ];
    args.extend(job.quality_args.iter().cloned());
    args.extend([
        "--merge-output-format".to_string(),
        MERGE_FORMAT.to_string(),
        "--hls-use-mpegts".to_string(),
    ]);
    if let Some(browser) = settings.cookies_browser() {
        args.push("--cookies-from-browser".to_string());
        args.push(browser.to_string());
        if let Some(agent) = settings.user_agent() {
            args.push("--user-agent".to_string());
            args.push(agent.to_string());
        }
    }
    args
}

/// Spawns the capture tool for `job` with combined output going to a fresh log buffer.
pub fn launch(job: &StreamJob, settings: &RecorderSettings) -> Result<CaptureProcess, LaunchError> {
    let (program, leading) =
        split_command(&settings.ytdlp_command).ok_or(LaunchError::EmptyCommand)?;
    let target_dir = ensure_channel_dir(&settings.records_dir, &job.channel)?;

    let tailer = LogTailer::new()?;
    let stdout = tailer.writer()?;
    let stderr = stdout.try_clone()?;

    let args = capture_args(job, settings, &target_dir);
    engine_debug!("Launching {program} {} {}", leading.join(" "), args.join(" "));

    let mut cmd = command(&program);
    cmd.args(&leading)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::from(stdout))
        .stderr(Stdio::from(stderr));
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }

    let child = cmd
        .spawn()
        .map_err(|source| LaunchError::Spawn {
            program: program.clone(),
            source,
        })?;

    Ok(CaptureProcess::new(child, job, tailer))
}
