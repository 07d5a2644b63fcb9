use std::collections::BTreeMap;

use crate::process::CaptureProcess;
use crate::shared::Shared;
use crate::Pid;

/// Running capture processes, owned by the supervisor thread.
///
/// Every insert and release is mirrored into the shared active set so the
/// scanner and the control layer can see which channels are busy.
#[derive(Debug)]
pub struct ProcessRegistry {
    shared: Shared,
    processes: BTreeMap<Pid, CaptureProcess>,
}

impl ProcessRegistry {
    pub fn new(shared: Shared) -> Self {
        Self {
            shared,
            processes: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, process: CaptureProcess) {
        self.shared
            .lock()
            .mark_active(process.pid(), process.channel());
        self.processes.insert(process.pid(), process);
    }

    pub fn release(&mut self, pid: Pid) -> Option<CaptureProcess> {
        self.shared.lock().unmark_active(pid);
        self.processes.remove(&pid)
    }

    pub fn find_mut(&mut self, pid: Pid) -> Option<&mut CaptureProcess> {
        self.processes.get_mut(&pid)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut CaptureProcess> {
        self.processes.values_mut()
    }

    pub fn pids(&self) -> Vec<Pid> {
        self.processes.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }
}
