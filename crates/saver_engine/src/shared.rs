//! State shared between the control layer, the scanner and the supervisor.
//!
//! Everything lives behind one mutex. Callers hold the guard only for a read
//! or a write, never across resolver calls or process waits.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{ChannelConfig, ChannelRegistry, EngineError, Pid, RecorderSettings};

#[derive(Debug, Default)]
pub struct SharedState {
    pub channels: ChannelRegistry,
    pub settings: RecorderSettings,
    active: BTreeMap<Pid, String>,
    queued: BTreeSet<String>,
    stop_requests: Vec<Pid>,
}

impl SharedState {
    pub fn new(settings: RecorderSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// A channel is busy while it has a queued job or a running capture.
    pub fn is_busy(&self, channel: &str) -> bool {
        self.queued.contains(channel) || self.active.values().any(|c| c == channel)
    }

    /// Marks `channel` as queued unless it is already busy or no longer tracked.
    pub fn try_mark_queued(&mut self, channel: &str) -> bool {
        if !self.channels.contains(channel) || self.is_busy(channel) {
            return false;
        }
        self.queued.insert(channel.to_string());
        true
    }

    pub fn unmark_queued(&mut self, channel: &str) {
        self.queued.remove(channel);
    }

    /// Moves a channel from the queued set to the running set.
    pub fn mark_active(&mut self, pid: Pid, channel: &str) {
        self.queued.remove(channel);
        self.active.insert(pid, channel.to_string());
    }

    pub fn unmark_active(&mut self, pid: Pid) -> Option<String> {
        self.active.remove(&pid)
    }

    pub fn active(&self) -> Vec<(Pid, String)> {
        self.active
            .iter()
            .map(|(pid, channel)| (*pid, channel.clone()))
            .collect()
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn queued(&self) -> Vec<String> {
        self.queued.iter().cloned().collect()
    }

    pub fn remove_channel(&mut self, name: &str) -> Result<ChannelConfig, EngineError> {
        if !self.channels.contains(name) {
            return Err(EngineError::UnknownChannel(name.to_string()));
        }
        if self.is_busy(name) {
            return Err(EngineError::ChannelBusy(name.to_string()));
        }
        self.channels.remove(name)
    }

    pub fn request_stop(&mut self, pid: Pid) {
        if !self.stop_requests.contains(&pid) {
            self.stop_requests.push(pid);
        }
    }

    pub fn take_stop_requests(&mut self) -> Vec<Pid> {
        std::mem::take(&mut self.stop_requests)
    }
}

/// Cloneable handle to the single shared lock.
#[derive(Debug, Clone, Default)]
pub struct Shared {
    inner: Arc<Mutex<SharedState>>,
}

impl Shared {
    pub fn new(settings: RecorderSettings) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SharedState::new(settings))),
        }
    }

    /// Locks the shared state; a poisoned lock is recovered since every
    /// write leaves the state consistent.
    pub fn lock(&self) -> MutexGuard<'_, SharedState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn settings(&self) -> RecorderSettings {
        self.lock().settings.clone()
    }
}
