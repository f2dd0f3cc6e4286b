//! Diagnostic trace output.

/// Receives human-readable diagnostic trace text.
pub trait TraceSink: Send + Sync {
    /// Records one trace line.
    fn trace(&self, message: &str);
}

impl<F> TraceSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn trace(&self, message: &str) {
        self(message);
    }
}

/// Routes trace text to `tracing` at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TraceSink for TracingSink {
    fn trace(&self, message: &str) {
        tracing::debug!(target: "nsdep::trace", "{message}");
    }
}
