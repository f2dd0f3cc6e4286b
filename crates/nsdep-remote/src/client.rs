//! Remote analysis client with activation-on-failure and backoff.

use crate::activator::{ProcessActivator, ServiceActivator};
use crate::address::ServiceAddress;
use crate::channel::{AnalyzerChannel, ChannelError, UnixSocketChannel};
use crate::protocol::{AnalyzeRequest, RemoteMessage};
use crate::settings::KillSwitch;

use nsdep_core::{AnalyzerConfig, TraceSink, TracingSink, TypeDependency};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

const COMMUNICATION_ERROR_MESSAGE: &str = "Unable to communicate with the analyzer service.";

/// Terminal failures of an analysis call.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The host sent a message outside the agreed variant set. Never retried.
    #[error("protocol violation: unexpected message from analyzer service ({detail})")]
    Protocol {
        /// What was received.
        detail: String,
    },

    /// The service ran the analysis and it failed. Never retried.
    #[error("analyzer service failed to analyze the project: {message}")]
    Analysis {
        /// Failure reported by the service.
        message: String,
    },

    /// Every scheduled retry failed.
    #[error("Unable to communicate with the analyzer service. All retries failed.")]
    RetriesExhausted {
        /// Number of retries performed.
        retries: usize,
        /// The last channel failure.
        #[source]
        source: ChannelError,
    },
}

/// Result of a completed analysis call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisOutcome {
    /// Illegal dependencies found by one analysis pass (possibly none).
    Violations(Vec<TypeDependency>),
    /// Analysis was skipped because tooling is disabled.
    ToolDisabled,
}

impl AnalysisOutcome {
    /// The violations, empty when analysis was skipped.
    #[must_use]
    pub fn violations(&self) -> &[TypeDependency] {
        match self {
            Self::Violations(v) => v,
            Self::ToolDisabled => &[],
        }
    }

    /// True if analysis was skipped.
    #[must_use]
    pub fn is_tool_disabled(&self) -> bool {
        matches!(self, Self::ToolDisabled)
    }
}

/// Suspends the calling thread between retries.
pub trait Sleeper: Send + Sync {
    /// Blocks for `duration`.
    fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by [`std::thread::sleep`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Builder for [`RemoteAnalyzerClient`].
pub struct RemoteAnalyzerClientBuilder {
    config: AnalyzerConfig,
    address: ServiceAddress,
    channel: Option<Box<dyn AnalyzerChannel>>,
    activator: Option<Box<dyn ServiceActivator>>,
    kill_switch: KillSwitch,
    sleeper: Box<dyn Sleeper>,
    trace: Arc<dyn TraceSink>,
}

impl RemoteAnalyzerClientBuilder {
    fn new(config: AnalyzerConfig) -> Self {
        Self {
            config,
            address: ServiceAddress::current_process(),
            channel: None,
            activator: None,
            kill_switch: KillSwitch::from_env(),
            sleeper: Box::new(ThreadSleeper),
            trace: Arc::new(TracingSink),
        }
    }

    /// Sets the service address used by the default channel and activator.
    #[must_use]
    pub fn address(mut self, address: ServiceAddress) -> Self {
        self.address = address;
        self
    }

    /// Replaces the socket channel.
    #[must_use]
    pub fn channel(mut self, channel: impl AnalyzerChannel + 'static) -> Self {
        self.channel = Some(Box::new(channel));
        self
    }

    /// Replaces the process activator.
    #[must_use]
    pub fn activator(mut self, activator: impl ServiceActivator + 'static) -> Self {
        self.activator = Some(Box::new(activator));
        self
    }

    /// Sets the kill switch (default: `NSDEP_DISABLED` environment variable).
    #[must_use]
    pub fn kill_switch(mut self, kill_switch: KillSwitch) -> Self {
        self.kill_switch = kill_switch;
        self
    }

    /// Replaces the backoff sleeper.
    #[must_use]
    pub fn sleeper(mut self, sleeper: impl Sleeper + 'static) -> Self {
        self.sleeper = Box::new(sleeper);
        self
    }

    /// Sets the trace sink (default: `tracing` at debug level).
    #[must_use]
    pub fn trace(mut self, trace: Arc<dyn TraceSink>) -> Self {
        self.trace = trace;
        self
    }

    /// Builds the client.
    #[must_use]
    pub fn build(self) -> RemoteAnalyzerClient {
        let address = self.address;
        let channel = self
            .channel
            .unwrap_or_else(|| Box::new(UnixSocketChannel::new(address.clone())));
        let activator = self
            .activator
            .unwrap_or_else(|| Box::new(ProcessActivator::beside_current_exe(address)));
        RemoteAnalyzerClient {
            config: self.config,
            channel,
            activator,
            kill_switch: self.kill_switch,
            sleeper: self.sleeper,
            trace: self.trace,
        }
    }
}

/// Runs project analysis in the out-of-process service.
///
/// Calls are blocking; one client issues one request at a time.
pub struct RemoteAnalyzerClient {
    config: AnalyzerConfig,
    channel: Box<dyn AnalyzerChannel>,
    activator: Box<dyn ServiceActivator>,
    kill_switch: KillSwitch,
    sleeper: Box<dyn Sleeper>,
    trace: Arc<dyn TraceSink>,
}

impl RemoteAnalyzerClient {
    /// Creates a builder for the given project config.
    #[must_use]
    pub fn builder(config: AnalyzerConfig) -> RemoteAnalyzerClientBuilder {
        RemoteAnalyzerClientBuilder::new(config)
    }

    /// Analyzes a project and returns its illegal dependencies.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Protocol`] on an unexpected message,
    /// [`ClientError::Analysis`] when the service reports a failed pass, and
    /// [`ClientError::RetriesExhausted`] when the service stays unreachable.
    pub fn analyze_project(
        &self,
        source_files: &[PathBuf],
        referenced_assemblies: &[PathBuf],
    ) -> Result<AnalysisOutcome, ClientError> {
        if self.kill_switch.is_engaged() {
            info!("Tooling disabled by kill switch; skipping analysis");
            return Ok(AnalysisOutcome::ToolDisabled);
        }

        let request = AnalyzeRequest {
            config: self.config.clone(),
            source_files: source_files.to_vec(),
            referenced_assemblies: referenced_assemblies.to_vec(),
        };

        let messages = self.invoke_with_retry(&request)?;
        self.unwrap_messages(messages)
    }

    fn invoke_with_retry(&self, request: &AnalyzeRequest) -> Result<Vec<RemoteMessage>, ClientError> {
        let schedule = self.config.retry_schedule();
        let mut retries = 0;

        loop {
            self.trace.trace("Calling analyzer service.");
            let error = match self.channel.invoke(request) {
                Ok(messages) => {
                    self.trace.trace("Calling analyzer service succeeded.");
                    return Ok(messages);
                }
                Err(e) => e,
            };

            let Some(delay) = schedule.delay(retries) else {
                warn!(retries, error = %error, "Analyzer service unreachable, giving up");
                return Err(ClientError::RetriesExhausted {
                    retries,
                    source: error,
                });
            };

            self.trace
                .trace(&format!("{COMMUNICATION_ERROR_MESSAGE} Error: {error}"));
            self.trace.trace(&format!(
                "Trying to activate analyzer service (attempt #{}).",
                retries + 1
            ));
            let status = self.activator.activate(self.trace.as_ref());
            debug!(?status, "Activation finished");

            self.trace
                .trace(&format!("Retrying service call after: {delay:?}."));
            self.sleeper.sleep(delay);
            retries += 1;
        }
    }

    fn unwrap_messages(&self, messages: Vec<RemoteMessage>) -> Result<AnalysisOutcome, ClientError> {
        let mut violations = Vec::new();
        for message in messages {
            match message {
                RemoteMessage::IllegalDependency(dependency) => violations.push(dependency),
                RemoteMessage::Trace { text } => self.trace.trace(&text),
                RemoteMessage::ToolDisabled => return Ok(AnalysisOutcome::ToolDisabled),
                RemoteMessage::AnalysisFailed { text } => {
                    return Err(ClientError::Analysis { message: text });
                }
                RemoteMessage::Unrecognized => {
                    return Err(ClientError::Protocol {
                        detail: "unrecognized message type".to_string(),
                    });
                }
            }
        }
        Ok(AnalysisOutcome::Violations(violations))
    }
}
