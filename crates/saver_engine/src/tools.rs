//! Startup probes for the external tools the recorder depends on.

use std::path::Path;
use std::process::Stdio;

use engine_logging::engine_debug;

use crate::cmd::{command, split_command};

/// Whether `line` names a runnable tool: it must answer `--help` with exit code zero.
pub fn probe_tool(line: &str) -> bool {
    let Some((program, args)) = split_command(line) else {
        return false;
    };
    if looks_like_path(&program) && !Path::new(&program).is_file() {
        return false;
    }
    let status = command(&program)
        .args(&args)
        .arg("--help")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    match status {
        Ok(status) => status.success(),
        Err(err) => {
            engine_debug!("Probe of {line} failed: {err}");
            false
        }
    }
}

/// The remux tool may be configured as a directory holding the binary.
pub fn probe_remux_tool(location: &str) -> bool {
    let path = Path::new(location);
    if path.is_dir() {
        let binary = if cfg!(windows) { "ffmpeg.exe" } else { "ffmpeg" };
        let candidate = path.join(binary);
        return candidate.is_file() && probe_tool(&candidate.to_string_lossy());
    }
    probe_tool(location)
}

fn looks_like_path(program: &str) -> bool {
    program.contains('/') || program.contains('\\')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_or_missing_tool_is_rejected() {
        assert!(!probe_tool(""));
        assert!(!probe_tool("/definitely/not/here/yt-dlp"));
        assert!(!probe_remux_tool("/definitely/not/here"));
    }
}
