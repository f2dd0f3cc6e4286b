//! Channel addresses bound to the owning process.

use std::path::{Path, PathBuf};

/// Environment variable overriding the directory that holds service sockets.
pub const SOCKET_DIR_VAR: &str = "NSDEP_SOCKET_DIR";

/// Address of the analyzer service owned by one caller process.
///
/// Every caller gets its own socket, so concurrent callers (two editor
/// instances, parallel builds) never talk to each other's service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceAddress {
    channel_address: PathBuf,
    owner_pid: u32,
}

impl ServiceAddress {
    /// Address for `owner_pid` in the default socket directory.
    #[must_use]
    pub fn for_owner(owner_pid: u32) -> Self {
        Self::in_dir(&socket_dir(), owner_pid)
    }

    /// Address for the current process.
    #[must_use]
    pub fn current_process() -> Self {
        Self::for_owner(std::process::id())
    }

    /// Address for `owner_pid` with the socket placed in `dir`.
    #[must_use]
    pub fn in_dir(dir: &Path, owner_pid: u32) -> Self {
        Self {
            channel_address: dir.join(format!("nsdep-{owner_pid}.sock")),
            owner_pid,
        }
    }

    /// Socket path of the channel.
    #[must_use]
    pub fn channel_address(&self) -> &Path {
        &self.channel_address
    }

    /// Process id the service is bound to.
    #[must_use]
    pub fn owner_pid(&self) -> u32 {
        self.owner_pid
    }

    /// Directory that holds the socket.
    #[must_use]
    pub fn dir(&self) -> &Path {
        self.channel_address.parent().unwrap_or_else(|| Path::new("."))
    }
}

impl std::fmt::Display for ServiceAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (owner {})", self.channel_address.display(), self.owner_pid)
    }
}

/// Resolution: `$NSDEP_SOCKET_DIR` > system temp dir.
fn socket_dir() -> PathBuf {
    std::env::var_os(SOCKET_DIR_VAR).map_or_else(std::env::temp_dir, PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_is_keyed_by_owner() {
        let dir = Path::new("/tmp/nsdep-test");
        let a = ServiceAddress::in_dir(dir, 100);
        let b = ServiceAddress::in_dir(dir, 200);
        assert_ne!(a.channel_address(), b.channel_address());
        assert_eq!(a.channel_address(), Path::new("/tmp/nsdep-test/nsdep-100.sock"));
        assert_eq!(a.owner_pid(), 100);
        assert_eq!(a.dir(), dir);
    }

    #[test]
    fn current_process_uses_own_pid() {
        assert_eq!(ServiceAddress::current_process().owner_pid(), std::process::id());
    }
}
