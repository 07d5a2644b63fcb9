use std::io;
use std::process::Child;
use std::thread;
use std::time::{Duration, Instant};

#[cfg(windows)]
use crate::cmd::command;
use crate::tailer::LogTailer;
use crate::{ExitOutcome, Pid, StreamJob};

const WAIT_POLL: Duration = Duration::from_millis(25);

/// A running capture tool plus the cursor into its output buffer.
///
/// On unix the tool leads its own process group, so signals reach the
/// remux helpers it spawns as well.
#[derive(Debug)]
pub struct CaptureProcess {
    child: Child,
    pid: Pid,
    channel: String,
    tailer: LogTailer,
}

impl CaptureProcess {
    pub fn new(child: Child, job: &StreamJob, tailer: LogTailer) -> Self {
        Self {
            pid: child.id(),
            child,
            channel: job.channel.clone(),
            tailer,
        }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Non-blocking exit check.
    pub fn poll_exit(&mut self) -> io::Result<Option<(ExitOutcome, Option<i32>)>> {
        Ok(self
            .child
            .try_wait()?
            .map(|status| (ExitOutcome::from_status(status), status.code())))
    }

    /// Asks the tool to finish up by sending SIGINT to its process group,
    /// the same way a terminal Ctrl-C would.
    #[cfg(unix)]
    pub fn interrupt(&self) -> io::Result<()> {
        self.signal_group(libc::SIGINT)
    }

    #[cfg(not(unix))]
    pub fn interrupt(&self) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "interrupt signal not supported on this platform",
        ))
    }

    /// Polls for exit until `deadline`; `None` means still running.
    pub fn wait_until(&mut self, deadline: Instant) -> io::Result<Option<(ExitOutcome, Option<i32>)>> {
        loop {
            if let Some(exit) = self.poll_exit()? {
                return Ok(Some(exit));
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            thread::sleep(WAIT_POLL.min(deadline - now));
        }
    }

    /// Forcibly kills the tool together with everything it spawned, then reaps it.
    pub fn kill(&mut self) -> io::Result<()> {
        self.kill_tree();
        match self.child.kill() {
            Ok(()) => {}
            // Already exited between the last poll and now.
            Err(err) if err.kind() == io::ErrorKind::InvalidInput => {}
            Err(err) => return Err(err),
        }
        self.child.wait().map(|_| ())
    }

    #[cfg(unix)]
    fn signal_group(&self, signal: libc::c_int) -> io::Result<()> {
        let pid = libc::pid_t::try_from(self.pid)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"))?;
        // SAFETY: kill(2) has no memory-safety preconditions.
        let rc = unsafe { libc::kill(-pid, signal) };
        if rc == 0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }

    #[cfg(unix)]
    fn kill_tree(&self) {
        // ESRCH just means the whole group is already gone.
        let _ = self.signal_group(libc::SIGKILL);
    }

    #[cfg(windows)]
    fn kill_tree(&self) {
        let _ = command("taskkill")
            .args(["/PID", &self.pid.to_string(), "/T", "/F"])
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status();
    }

    #[cfg(not(any(unix, windows)))]
    fn kill_tree(&self) {}

    pub fn next_log_line(&mut self) -> io::Result<Option<String>> {
        self.tailer.next_line()
    }

    pub fn drain_log(&mut self) -> io::Result<Vec<String>> {
        self.tailer.drain_remaining()
    }
}
