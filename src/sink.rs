//! Log sinks for intercepted records.
//!
//! [`RecordSink`] is the seam between the interceptor and whatever logging
//! backend a deployment uses. [`TracingSink`] is the default implementation
//! on top of the `tracing` crate; [`FanoutSink`] composes several sinks.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::types::{RequestRecord, ResponseRecord};

/// Destination for the records and auxiliary lines the interceptor emits.
///
/// Implementations own persistence, transport and timestamp formatting.
/// They must tolerate concurrent calls from independent invocations; the
/// interceptor itself holds no lock around emission.
pub trait RecordSink: Send + Sync + 'static {
    /// A request record, emitted once per invocation before the real call.
    fn emit_request(&self, record: &RequestRecord);
    /// A response record, emitted once per successful value-bearing call.
    fn emit_response(&self, record: &ResponseRecord);
    /// A debug-verbosity context detail line (URI, method, addresses,
    /// cookie block).
    fn emit_detail(&self, line: &str);
    /// A warning describing a record that was dropped because building it
    /// failed.
    fn emit_warning(&self, message: &str);
}

/// Default sink that writes records through the `tracing` crate.
///
/// Records go out at info level as their single-line rendered form, context
/// details at debug level, dropped-record notices at warn level.
///
/// # Examples
///
/// ```rust
/// use periscope::{InterceptConfig, Interceptor, TracingSink};
///
/// let interceptor = Interceptor::new(InterceptConfig::default(), TracingSink);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl RecordSink for TracingSink {
    fn emit_request(&self, record: &RequestRecord) {
        info!("{record}");
    }

    fn emit_response(&self, record: &ResponseRecord) {
        info!("{record}");
    }

    fn emit_detail(&self, line: &str) {
        debug!("{line}");
    }

    fn emit_warning(&self, message: &str) {
        warn!("{message}");
    }
}

/// A sink that forwards every emission to each of its inner sinks, in the
/// order they were added.
///
/// # Examples
///
/// ```rust
/// use periscope::{FanoutSink, TracingSink};
///
/// let sink = FanoutSink::new().with(TracingSink);
/// assert_eq!(sink.len(), 1);
/// ```
#[derive(Clone, Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn RecordSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sink to the fanout. Returns self for chaining.
    pub fn with<S: RecordSink>(mut self, sink: S) -> Self {
        self.sinks.push(Arc::new(sink));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }
}

impl RecordSink for FanoutSink {
    fn emit_request(&self, record: &RequestRecord) {
        for sink in &self.sinks {
            sink.emit_request(record);
        }
    }

    fn emit_response(&self, record: &ResponseRecord) {
        for sink in &self.sinks {
            sink.emit_response(record);
        }
    }

    fn emit_detail(&self, line: &str) {
        for sink in &self.sinks {
            sink.emit_detail(line);
        }
    }

    fn emit_warning(&self, message: &str) {
        for sink in &self.sinks {
            sink.emit_warning(message);
        }
    }
}
