//! Wire protocol between the analysis client and the service host.
//!
//! Frames are newline-delimited JSON. A call is one [`AnalyzeRequest`] line
//! from the client followed by one [`AnalyzeResponse`] line from the host.

use nsdep_core::{AnalyzerConfig, TypeDependency};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

/// Request to analyze one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    /// Rules and limits for this analysis.
    pub config: AnalyzerConfig,
    /// Source files to analyze.
    pub source_files: Vec<PathBuf>,
    /// Referenced assemblies, passed through to the enumerator.
    #[serde(default)]
    pub referenced_assemblies: Vec<PathBuf>,
}

/// A message produced by the service host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RemoteMessage {
    /// Diagnostic text for the caller's trace sink.
    Trace {
        /// Trace line.
        text: String,
    },
    /// One dependency that violates the rules.
    IllegalDependency(TypeDependency),
    /// Analysis was skipped because tooling is disabled.
    ToolDisabled,
    /// The analysis pass failed; no violations are reported for the request.
    AnalysisFailed {
        /// Failure description.
        text: String,
    },
    /// Any tag this build does not know. Receiving it is a protocol violation.
    #[serde(other)]
    Unrecognized,
}

impl RemoteMessage {
    /// Shorthand for a trace message.
    #[must_use]
    pub fn trace(text: impl Into<String>) -> Self {
        Self::Trace { text: text.into() }
    }
}

/// The complete, ordered message sequence for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    /// Messages in production order.
    pub messages: Vec<RemoteMessage>,
}

/// Writes one frame and flushes.
///
/// # Errors
///
/// Returns error if serialization or the write fails.
pub fn write_frame<W: Write, T: Serialize>(writer: &mut W, frame: &T) -> io::Result<()> {
    serde_json::to_writer(&mut *writer, frame)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writer.write_all(b"\n")?;
    writer.flush()
}

/// Reads one frame.
///
/// # Errors
///
/// Returns `UnexpectedEof` if the peer closed before a full frame arrived,
/// or `InvalidData` if the frame is not valid JSON for `T`.
pub fn read_frame<R: BufRead, T: DeserializeOwned>(reader: &mut R) -> io::Result<T> {
    let mut line = String::new();
    let n = reader.read_line(&mut line)?;
    if n == 0 || !line.ends_with('\n') {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "connection closed before a complete frame",
        ));
    }
    serde_json::from_str(&line).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
