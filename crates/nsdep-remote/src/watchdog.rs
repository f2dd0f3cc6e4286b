//! Parent-process watchdog for the service host.

use std::time::Duration;
use sysinfo::{Pid, ProcessesToUpdate, System};

/// Default interval between liveness checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Answers whether a process is still running.
pub trait ProcessProbe: Send {
    /// True if a process with `pid` exists.
    fn is_alive(&mut self, pid: u32) -> bool;
}

/// Probe backed by the OS process table.
pub struct SysinfoProbe {
    system: System,
}

impl SysinfoProbe {
    /// Creates a probe with an empty process snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessProbe for SysinfoProbe {
    fn is_alive(&mut self, pid: u32) -> bool {
        let pid = Pid::from_u32(pid);
        self.system
            .refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
        self.system.process(pid).is_some()
    }
}

/// Blocks until the parent process terminates.
pub struct ParentWatchdog<P> {
    parent_pid: u32,
    probe: P,
    poll_interval: Duration,
}

impl ParentWatchdog<SysinfoProbe> {
    /// Watchdog for `parent_pid` using the OS process table.
    #[must_use]
    pub fn for_parent(parent_pid: u32) -> Self {
        Self::new(parent_pid, SysinfoProbe::new())
    }
}

impl<P: ProcessProbe> ParentWatchdog<P> {
    /// Watchdog for `parent_pid` using a custom probe.
    #[must_use]
    pub fn new(parent_pid: u32, probe: P) -> Self {
        Self {
            parent_pid,
            probe,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Sets the interval between liveness checks.
    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// The process being watched.
    #[must_use]
    pub fn parent_pid(&self) -> u32 {
        self.parent_pid
    }

    /// Returns once the parent is gone. Returns immediately if it never existed.
    pub fn wait_for_exit(mut self) {
        while self.probe.is_alive(self.parent_pid) {
            std::thread::sleep(self.poll_interval);
        }
        tracing::info!(parent_pid = self.parent_pid, "Parent process exited");
    }
}
