//! Unbounded FIFO hand-off of stream jobs from the scanner to the supervisor.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use crate::StreamJob;

pub fn job_queue() -> (JobSender, JobReceiver) {
    let (tx, rx) = mpsc::channel();
    (JobSender { tx }, JobReceiver { rx })
}

#[derive(Debug, Clone)]
pub struct JobSender {
    tx: Sender<StreamJob>,
}

impl JobSender {
    /// Hands the job back when the receiving side is gone.
    pub fn push(&self, job: StreamJob) -> Result<(), StreamJob> {
        self.tx.send(job).map_err(|err| err.0)
    }
}

#[derive(Debug)]
pub struct JobReceiver {
    rx: Receiver<StreamJob>,
}

impl JobReceiver {
    pub fn try_pop(&self) -> Option<StreamJob> {
        match self.rx.try_recv() {
            Ok(job) => Some(job),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Removes every job currently waiting.
    pub fn drain(&self) -> Vec<StreamJob> {
        std::iter::from_fn(|| self.try_pop()).collect()
    }
}
