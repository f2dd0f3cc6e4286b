//! # nsdep-remote
//!
//! Out-of-process dependency analysis.
//!
//! The analyzer runs in a separate, lazily started service process bound to
//! the caller's process id. This crate provides both sides:
//!
//! - [`RemoteAnalyzerClient`] invokes the service, activating it and backing
//!   off according to the configured retry schedule when it is unreachable
//! - [`ProcessActivator`] launches the service host for a caller
//! - [`ServiceHost`] serves analysis requests and exits with its parent
//! - [`RemoteMessage`] and friends define the wire protocol
//!
//! ## Example
//!
//! ```ignore
//! use nsdep_remote::{AnalysisOutcome, RemoteAnalyzerClient};
//!
//! let client = RemoteAnalyzerClient::builder(config).build();
//! match client.analyze_project(&sources, &[])? {
//!     AnalysisOutcome::Violations(v) => report(v),
//!     AnalysisOutcome::ToolDisabled => {}
//! }
//! ```
//!
//! Only Unix domain sockets are supported as the channel transport.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod activator;
mod address;
mod channel;
mod client;
mod host;
mod protocol;
mod settings;
mod watchdog;

pub use activator::{
    default_host_executable, ActivationStatus, ProcessActivator, ServiceActivator,
    SERVICE_HOST_NAME,
};
pub use address::{ServiceAddress, SOCKET_DIR_VAR};
pub use channel::{AnalyzerChannel, ChannelError, UnixSocketChannel};
pub use client::{
    AnalysisOutcome, ClientError, RemoteAnalyzerClient, RemoteAnalyzerClientBuilder, Sleeper,
    ThreadSleeper,
};
pub use host::{HostError, ServiceHost, DEFAULT_READ_TIMEOUT};
pub use protocol::{read_frame, write_frame, AnalyzeRequest, AnalyzeResponse, RemoteMessage};
pub use settings::{KillSwitch, KILL_SWITCH_VAR};
pub use watchdog::{ParentWatchdog, ProcessProbe, SysinfoProbe, DEFAULT_POLL_INTERVAL};
