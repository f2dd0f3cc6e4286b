//! The out-of-process analyzer service.

use crate::address::ServiceAddress;
use crate::protocol::{read_frame, write_frame, AnalyzeRequest, AnalyzeResponse, RemoteMessage};
use crate::settings::KillSwitch;
use crate::watchdog::{ParentWatchdog, ProcessProbe};

use nsdep_core::{DependencyAnalyzer, TypeDependencyEnumerator};
use std::io::{self, BufReader};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::PathBuf;
use std::sync::{mpsc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

/// How long the host waits for a connected client to send its request.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from binding or running the host.
#[derive(Debug, Error)]
pub enum HostError {
    /// Another live service already owns the address.
    #[error("an analyzer service is already listening at {0}")]
    AddressInUse(PathBuf),

    /// Socket setup or I/O failed.
    #[error("service I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// Serves analysis requests on the channel owned by one caller process.
///
/// Requests are handled one at a time on the serving thread.
pub struct ServiceHost {
    address: ServiceAddress,
    listener: UnixListener,
    enumerator: Box<dyn TypeDependencyEnumerator>,
    kill_switch: KillSwitch,
    read_timeout: Duration,
}

impl ServiceHost {
    /// Binds the host to `address`.
    ///
    /// A stale socket file left behind by a dead host is removed first.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::AddressInUse`] if a live service answers at the
    /// address, or an I/O error if binding fails.
    pub fn bind(
        address: ServiceAddress,
        enumerator: Box<dyn TypeDependencyEnumerator>,
    ) -> Result<Self, HostError> {
        let path = address.channel_address();
        if path.exists() {
            if UnixStream::connect(path).is_ok() {
                return Err(HostError::AddressInUse(path.to_path_buf()));
            }
            std::fs::remove_file(path)?;
        }

        let listener = UnixListener::bind(path)?;
        info!(address = %address, "Analyzer service listening");

        Ok(Self {
            address,
            listener,
            enumerator,
            kill_switch: KillSwitch::from_env(),
            read_timeout: DEFAULT_READ_TIMEOUT,
        })
    }

    /// Sets the kill switch checked on every request.
    #[must_use]
    pub fn with_kill_switch(mut self, kill_switch: KillSwitch) -> Self {
        self.kill_switch = kill_switch;
        self
    }

    /// Sets how long a connection may stay silent before it is dropped.
    #[must_use]
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// The address this host is bound to.
    #[must_use]
    pub fn address(&self) -> &ServiceAddress {
        &self.address
    }

    /// Accepts and serves connections until the listener fails.
    ///
    /// Failures on a single connection are logged and do not stop the loop.
    ///
    /// # Errors
    ///
    /// Returns an error only if accepting connections fails.
    pub fn serve(&self) -> Result<(), HostError> {
        loop {
            self.serve_one()?;
        }
    }

    /// Accepts and serves exactly one connection.
    ///
    /// # Errors
    ///
    /// Returns an error if accepting the connection fails.
    pub fn serve_one(&self) -> Result<(), HostError> {
        let (stream, _addr) = self.listener.accept()?;
        if let Err(e) = self.handle_connection(&stream) {
            warn!(error = %e, "Analyzer connection failed");
        }
        Ok(())
    }

    /// Serves requests until the parent process exits, then removes the socket.
    ///
    /// If serving stops first, the socket is removed as well and the serving
    /// error is returned, so callers never wait on a host that cannot answer.
    ///
    /// # Errors
    ///
    /// Returns an error if a worker thread cannot be started or if accepting
    /// connections fails.
    pub fn run_until_parent_exits<P>(self, watchdog: ParentWatchdog<P>) -> Result<(), HostError>
    where
        P: ProcessProbe + 'static,
    {
        let socket = self.address.channel_address().to_path_buf();
        let (done_tx, done_rx) = mpsc::channel();

        let serve_tx = done_tx.clone();
        std::thread::Builder::new()
            .name("nsdep-service".to_string())
            .spawn(move || {
                let result = self.serve();
                let _ = serve_tx.send(result);
            })?;

        std::thread::Builder::new()
            .name("nsdep-watchdog".to_string())
            .spawn(move || {
                watchdog.wait_for_exit();
                let _ = done_tx.send(Ok(()));
            })?;

        let result = done_rx.recv().unwrap_or_else(|_| {
            Err(HostError::Io(io::Error::other(
                "service threads stopped without reporting",
            )))
        });
        if let Err(e) = &result {
            error!(error = %e, "Analyzer service stopped");
        }

        if let Err(e) = std::fs::remove_file(&socket) {
            warn!(error = %e, path = %socket.display(), "Failed to remove service socket");
        }
        result
    }

    fn handle_connection(&self, stream: &UnixStream) -> io::Result<()> {
        stream.set_read_timeout(Some(self.read_timeout))?;
        let mut reader = BufReader::new(stream);
        let request: AnalyzeRequest = read_frame(&mut reader)?;
        let response = AnalyzeResponse {
            messages: self.respond(&request),
        };
        let mut writer = stream;
        write_frame(&mut writer, &response)
    }

    /// Runs one analysis pass and returns the message sequence for it.
    #[must_use]
    pub fn respond(&self, request: &AnalyzeRequest) -> Vec<RemoteMessage> {
        if self.kill_switch.is_engaged() || !request.config.is_enabled {
            return vec![RemoteMessage::ToolDisabled];
        }

        let traces = Mutex::new(Vec::new());
        let sink = |text: &str| {
            if let Ok(mut traces) = traces.lock() {
                traces.push(RemoteMessage::trace(text));
            }
        };

        let analyzer = DependencyAnalyzer::new(&request.config, self.enumerator.as_ref());
        let result = analyzer.analyze_project(
            &request.source_files,
            &request.referenced_assemblies,
            &sink,
        );

        let mut messages = traces.into_inner().unwrap_or_default();
        match result {
            Ok(report) => {
                messages.extend(
                    report
                        .illegal_dependencies
                        .into_iter()
                        .map(RemoteMessage::IllegalDependency),
                );
            }
            Err(e) => {
                error!(error = %e, "Analysis failed");
                messages.push(RemoteMessage::AnalysisFailed {
                    text: e.to_string(),
                });
            }
        }
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{AnalyzerChannel, UnixSocketChannel};
    use nsdep_core::{
        AnalyzerConfig, EnumeratorError, RuleSpec, SourceSegment, TraceSink, TypeDependency,
    };
    use std::io::Write;

    struct Fixed(Vec<TypeDependency>);

    impl TypeDependencyEnumerator for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn enumerate(
            &self,
            _source_files: &[PathBuf],
            _referenced_assemblies: &[PathBuf],
            trace: &dyn TraceSink,
        ) -> Result<Vec<TypeDependency>, EnumeratorError> {
            trace.trace("enumerating");
            Ok(self.0.clone())
        }
    }

    /// Enumerator that always rejects its fact file.
    struct Garbled;

    impl TypeDependencyEnumerator for Garbled {
        fn name(&self) -> &'static str {
            "garbled"
        }

        fn enumerate(
            &self,
            _source_files: &[PathBuf],
            _referenced_assemblies: &[PathBuf],
            _trace: &dyn TraceSink,
        ) -> Result<Vec<TypeDependency>, EnumeratorError> {
            Err(EnumeratorError::InvalidFact {
                path: PathBuf::from("B.cs.deps.jsonl"),
                line: 2,
                message: "expected value".into(),
            })
        }
    }

    /// Reports the parent alive for a fixed number of checks.
    struct Countdown(usize);

    impl ProcessProbe for Countdown {
        fn is_alive(&mut self, _pid: u32) -> bool {
            if self.0 == 0 {
                return false;
            }
            self.0 -= 1;
            true
        }
    }

    fn request(config: AnalyzerConfig) -> AnalyzeRequest {
        AnalyzeRequest {
            config,
            source_files: vec![PathBuf::from("B.cs")],
            referenced_assemblies: vec![],
        }
    }

    fn scenario_config() -> AnalyzerConfig {
        AnalyzerConfig {
            allowed: vec![RuleSpec::Target("A.*".into())],
            disallowed: vec![RuleSpec::Target("A.Internal.*".into())],
            ..AnalyzerConfig::default()
        }
    }

    fn dep(to: &str, line: usize) -> TypeDependency {
        TypeDependency::new("A.B", to, SourceSegment::new(line, 1, 5))
    }

    fn illegal(messages: &[RemoteMessage]) -> Vec<&TypeDependency> {
        messages
            .iter()
            .filter_map(|m| match m {
                RemoteMessage::IllegalDependency(d) => Some(d),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn respond_reports_illegal_dependencies_and_traces() {
        let dir = tempfile::tempdir().unwrap();
        let host = ServiceHost::bind(
            ServiceAddress::in_dir(dir.path(), 11),
            Box::new(Fixed(vec![dep("A.Internal.X", 1), dep("A.C", 2), dep("Z", 3)])),
        )
        .unwrap()
        .with_kill_switch(KillSwitch::off());

        let messages = host.respond(&request(scenario_config()));
        assert_eq!(messages[0], RemoteMessage::trace("enumerating"));
        assert_eq!(illegal(&messages), vec![&dep("A.Internal.X", 1), &dep("Z", 3)]);
    }

    #[test]
    fn failed_analysis_is_reported_as_failure() {
        let dir = tempfile::tempdir().unwrap();
        let host = ServiceHost::bind(ServiceAddress::in_dir(dir.path(), 15), Box::new(Garbled))
            .unwrap()
            .with_kill_switch(KillSwitch::off());

        let messages = host.respond(&request(scenario_config()));
        assert!(illegal(&messages).is_empty());
        match messages.last() {
            Some(RemoteMessage::AnalysisFailed { text }) => {
                assert!(text.contains("B.cs.deps.jsonl"), "{text}");
            }
            other => panic!("expected AnalysisFailed, got {other:?}"),
        }
    }

    #[test]
    fn disabled_project_gets_tool_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let host = ServiceHost::bind(ServiceAddress::in_dir(dir.path(), 12), Box::new(Fixed(vec![])))
            .unwrap()
            .with_kill_switch(KillSwitch::off());

        let config = AnalyzerConfig {
            is_enabled: false,
            ..AnalyzerConfig::default()
        };
        assert_eq!(host.respond(&request(config)), vec![RemoteMessage::ToolDisabled]);
    }

    #[test]
    fn bind_refuses_live_address_and_replaces_stale_socket() {
        let dir = tempfile::tempdir().unwrap();
        let address = ServiceAddress::in_dir(dir.path(), 13);

        {
            let _first = ServiceHost::bind(address.clone(), Box::new(Fixed(vec![]))).unwrap();
            let second = ServiceHost::bind(address.clone(), Box::new(Fixed(vec![])));
            assert!(matches!(second, Err(HostError::AddressInUse(_))));
        }

        // The first listener is gone but its socket file remains.
        assert!(address.channel_address().exists());
        assert!(ServiceHost::bind(address, Box::new(Fixed(vec![]))).is_ok());
    }

    #[test]
    fn serves_a_request_over_the_socket() {
        let dir = tempfile::tempdir().unwrap();
        let address = ServiceAddress::in_dir(dir.path(), 14);
        let host = ServiceHost::bind(address.clone(), Box::new(Fixed(vec![dep("Z", 9)])))
            .unwrap()
            .with_kill_switch(KillSwitch::off());

        let server = std::thread::spawn(move || host.serve_one());
        let messages = UnixSocketChannel::new(address)
            .invoke(&request(scenario_config()))
            .unwrap();
        server.join().unwrap().unwrap();

        assert_eq!(illegal(&messages), vec![&dep("Z", 9)]);
    }

    #[test]
    fn returns_and_removes_socket_once_parent_exits() {
        let dir = tempfile::tempdir().unwrap();
        let address = ServiceAddress::in_dir(dir.path(), 16);
        let host = ServiceHost::bind(address.clone(), Box::new(Fixed(vec![]))).unwrap();
        assert!(address.channel_address().exists());

        let watchdog = ParentWatchdog::new(16, Countdown(3)).poll_interval(Duration::from_millis(1));
        host.run_until_parent_exits(watchdog).unwrap();

        assert!(!address.channel_address().exists());
    }

    #[test]
    fn stops_when_serving_fails_even_if_parent_lives() {
        let dir = tempfile::tempdir().unwrap();
        let address = ServiceAddress::in_dir(dir.path(), 17);
        let host = ServiceHost::bind(address.clone(), Box::new(Fixed(vec![]))).unwrap();
        // accept() now fails immediately with WouldBlock.
        host.listener.set_nonblocking(true).unwrap();

        let watchdog = ParentWatchdog::new(17, Countdown(usize::MAX))
            .poll_interval(Duration::from_millis(50));
        let result = host.run_until_parent_exits(watchdog);

        assert!(matches!(result, Err(HostError::Io(_))));
        assert!(!address.channel_address().exists());
    }

    #[test]
    fn silent_client_times_out_without_blocking_others() {
        let dir = tempfile::tempdir().unwrap();
        let address = ServiceAddress::in_dir(dir.path(), 18);
        let host = ServiceHost::bind(address.clone(), Box::new(Fixed(vec![dep("Z", 9)])))
            .unwrap()
            .with_kill_switch(KillSwitch::off())
            .with_read_timeout(Duration::from_millis(50));

        let server = std::thread::spawn(move || {
            host.serve_one()?;
            host.serve_one()
        });

        // Connected but never sends a complete frame.
        let mut silent = UnixStream::connect(address.channel_address()).unwrap();
        silent.write_all(b"{").unwrap();

        let messages = UnixSocketChannel::new(address)
            .invoke(&request(scenario_config()))
            .unwrap();
        server.join().unwrap().unwrap();
        drop(silent);

        assert_eq!(illegal(&messages), vec![&dep("Z", 9)]);
    }
}
