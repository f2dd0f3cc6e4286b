//! Launching the out-of-process analyzer.

use crate::address::{ServiceAddress, SOCKET_DIR_VAR};
use nsdep_core::TraceSink;

use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// File name of the service host executable.
pub const SERVICE_HOST_NAME: &str = "nsdep-service-host";

/// Outcome of an activation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationStatus {
    /// A service was already reachable; nothing was launched.
    AlreadyRunning,
    /// A new service process was started.
    Launched,
    /// Launching failed. Details went to the trace sink.
    Failed,
}

/// Makes the analyzer service for one caller reachable.
///
/// Activation never fails with an error: problems are reported to the trace
/// sink and the next service call simply fails again.
pub trait ServiceActivator: Send + Sync {
    /// Starts the service unless one is already reachable.
    fn activate(&self, trace: &dyn TraceSink) -> ActivationStatus;
}

/// Spawns the service host executable bound to the caller's process id.
#[derive(Debug, Clone)]
pub struct ProcessActivator {
    host_executable: PathBuf,
    address: ServiceAddress,
}

impl ProcessActivator {
    /// Activator launching `host_executable` for `address`.
    #[must_use]
    pub fn new(host_executable: impl Into<PathBuf>, address: ServiceAddress) -> Self {
        Self {
            host_executable: host_executable.into(),
            address,
        }
    }

    /// Activator launching the host that sits next to the current executable.
    #[must_use]
    pub fn beside_current_exe(address: ServiceAddress) -> Self {
        Self::new(default_host_executable(), address)
    }

    /// The executable this activator starts.
    #[must_use]
    pub fn host_executable(&self) -> &Path {
        &self.host_executable
    }

    fn is_reachable(&self) -> bool {
        UnixStream::connect(self.address.channel_address()).is_ok()
    }
}

impl ServiceActivator for ProcessActivator {
    fn activate(&self, trace: &dyn TraceSink) -> ActivationStatus {
        if self.is_reachable() {
            trace.trace(&format!("Analyzer service already running at {}", self.address));
            return ActivationStatus::AlreadyRunning;
        }

        let owner = self.address.owner_pid().to_string();
        trace.trace(&format!(
            "Starting {} with parameter {owner}",
            self.host_executable.display()
        ));

        let spawned = Command::new(&self.host_executable)
            .arg(&owner)
            .env(SOCKET_DIR_VAR, self.address.dir())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        match spawned {
            Ok(mut child) => {
                tracing::info!(pid = child.id(), address = %self.address, "Launched analyzer service");
                // Reap the host when it exits so it does not linger as a zombie.
                std::thread::spawn(move || {
                    let _ = child.wait();
                });
                ActivationStatus::Launched
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to launch analyzer service");
                trace.trace(&format!("Activating analyzer service failed: {e}"));
                ActivationStatus::Failed
            }
        }
    }
}

/// `<dir of current exe>/nsdep-service-host`, or the bare name for `PATH`
/// lookup when the current executable cannot be located.
#[must_use]
pub fn default_host_executable() -> PathBuf {
    let file_name = format!("{SERVICE_HOST_NAME}{}", std::env::consts::EXE_SUFFIX);
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(&file_name)))
        .unwrap_or_else(|| PathBuf::from(file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::net::UnixListener;
    use std::sync::Mutex;

    #[test]
    fn reachable_service_is_not_relaunched() {
        let dir = tempfile::tempdir().unwrap();
        let address = ServiceAddress::in_dir(dir.path(), 7);
        let _listener = UnixListener::bind(address.channel_address()).unwrap();

        let activator = ProcessActivator::new(dir.path().join("does-not-exist"), address);
        assert_eq!(activator.activate(&|_: &str| {}), ActivationStatus::AlreadyRunning);
    }

    #[test]
    fn spawn_failure_is_traced_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        let address = ServiceAddress::in_dir(dir.path(), 8);
        let activator = ProcessActivator::new(dir.path().join("does-not-exist"), address);

        let traces = Mutex::new(Vec::new());
        let sink = |m: &str| traces.lock().unwrap().push(m.to_string());

        assert_eq!(activator.activate(&sink), ActivationStatus::Failed);
        let traces = traces.lock().unwrap();
        assert!(traces[0].starts_with("Starting "));
        assert!(traces[0].ends_with("with parameter 8"));
        assert!(traces[1].starts_with("Activating analyzer service failed"));
    }

    #[test]
    fn default_host_is_named_after_service() {
        let path = default_host_executable();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(SERVICE_HOST_NAME));
    }
}
