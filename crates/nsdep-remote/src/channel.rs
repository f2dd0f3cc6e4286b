//! Request/response channel to the service host.

use crate::address::ServiceAddress;
use crate::protocol::{read_frame, write_frame, AnalyzeRequest, AnalyzeResponse, RemoteMessage};

use std::io::{self, BufReader};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use thiserror::Error;

/// A channel-level failure. Always treated as transient by the client.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// No service is listening at the address.
    #[error("cannot connect to {path}: {source}")]
    Connect {
        /// Socket path.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
    /// The exchange failed after connecting.
    #[error("channel I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// Sends one analysis request and returns the host's full message sequence.
///
/// Implementations must not return a partial sequence; anything short of a
/// complete response is a [`ChannelError`].
pub trait AnalyzerChannel: Send + Sync {
    /// Performs one blocking request/response exchange.
    ///
    /// # Errors
    ///
    /// Returns a [`ChannelError`] if the service is unreachable or the
    /// exchange is cut short.
    fn invoke(&self, request: &AnalyzeRequest) -> Result<Vec<RemoteMessage>, ChannelError>;
}

/// Channel over the Unix domain socket at a [`ServiceAddress`].
#[derive(Debug, Clone)]
pub struct UnixSocketChannel {
    address: ServiceAddress,
}

impl UnixSocketChannel {
    /// Creates a channel to `address`. No connection is made until `invoke`.
    #[must_use]
    pub fn new(address: ServiceAddress) -> Self {
        Self { address }
    }

    /// The address this channel talks to.
    #[must_use]
    pub fn address(&self) -> &ServiceAddress {
        &self.address
    }
}

impl AnalyzerChannel for UnixSocketChannel {
    fn invoke(&self, request: &AnalyzeRequest) -> Result<Vec<RemoteMessage>, ChannelError> {
        let path = self.address.channel_address();
        let mut stream = UnixStream::connect(path).map_err(|e| ChannelError::Connect {
            path: path.to_path_buf(),
            source: e,
        })?;

        write_frame(&mut stream, request)?;
        stream.shutdown(std::net::Shutdown::Write)?;

        let mut reader = BufReader::new(stream);
        let response: AnalyzeResponse = read_frame(&mut reader)?;
        Ok(response.messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_socket_is_connect_error() {
        let dir = tempfile::tempdir().unwrap();
        let channel = UnixSocketChannel::new(ServiceAddress::in_dir(dir.path(), 1));
        let request = AnalyzeRequest {
            config: nsdep_core::AnalyzerConfig::default(),
            source_files: vec![],
            referenced_assemblies: vec![],
        };
        let err = channel.invoke(&request).unwrap_err();
        assert!(matches!(err, ChannelError::Connect { .. }));
    }
}
