//! # Periscope
//!
//! A fail-safe request/response logging interceptor for HTTP-style handler
//! invocations. Periscope wraps one handler call at a time: it builds a
//! structured request record from the handler's declared parameters and the
//! ambient request context, proceeds to the real call, builds a response
//! record with the elapsed time, and emits both to a pluggable sink. The
//! handler is never aware of any of this, and a failure in the logging path
//! never affects the call itself.
//!
//! ## Features
//!
//! - **Strictly observational**: the wrapped call's value or error passes
//!   through untouched; record-building failures surface only as a warning
//!   line on the sink
//! - **Registration-time metadata**: handler signatures are described once
//!   as a [`HandlerDescriptor`] instead of inspected per call
//! - **Explicit context**: the ambient request is a plain value, so tests
//!   can drive the interceptor with synthetic contexts
//! - **Pluggable sinks**: implement [`RecordSink`], or use the bundled
//!   [`TracingSink`] / [`FanoutSink`]
//!
//! ## Quick start
//!
//! ```rust
//! use std::convert::Infallible;
//!
//! use http::Method;
//! use periscope::{
//!     ArgValue, HandlerDescriptor, InterceptConfig, Interceptor, ParamSpec,
//!     RequestContext, TracingSink,
//! };
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let interceptor = Interceptor::new(InterceptConfig::default(), TracingSink);
//!
//! // Described once at registration time, reused for every invocation.
//! let descriptor = HandlerDescriptor::new("UserController", "get_user")
//!     .param(ParamSpec::new("String").path("id"));
//!
//! // Per invocation: the ambient request and the concrete argument values.
//! let ctx = RequestContext::new(Method::GET, "/users/42".parse().unwrap());
//! let args = [ArgValue::Json(json!("42"))];
//!
//! let user = interceptor
//!     .around(&descriptor, Some(&ctx), &args, async {
//!         // The real handler call.
//!         Ok::<_, Infallible>(json!({"id": "42", "name": "Ann"}))
//!     })
//!     .await
//!     .unwrap();
//! assert_eq!(user["name"], "Ann");
//! # }
//! ```
//!
//! ## Custom sinks
//!
//! Implement the [`RecordSink`] trait to route records anywhere:
//!
//! ```rust
//! use periscope::{RecordSink, RequestRecord, ResponseRecord};
//!
//! struct StderrSink;
//!
//! impl RecordSink for StderrSink {
//!     fn emit_request(&self, record: &RequestRecord) {
//!         eprintln!("{record}");
//!     }
//!     fn emit_response(&self, record: &ResponseRecord) {
//!         eprintln!("{record}");
//!     }
//!     fn emit_detail(&self, line: &str) {
//!         eprintln!("{line}");
//!     }
//!     fn emit_warning(&self, message: &str) {
//!         eprintln!("dropped record: {message}");
//!     }
//! }
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

pub mod types;
pub use types::{
    ArgValue, Binding, BuildError, HandlerDescriptor, ParamMap, ParamSpec, RequestRecord,
    ResponseRecord,
};

pub mod context;
pub use context::RequestContext;

pub mod sink;
pub use sink::{FanoutSink, RecordSink, TracingSink};

mod classify;
mod render;

/// Configuration for the interceptor.
///
/// # Examples
///
/// ```rust
/// use periscope::InterceptConfig;
///
/// // Default configuration captures both sides.
/// let config = InterceptConfig::default();
///
/// // Request records only.
/// let config = InterceptConfig {
///     capture_params: true,
///     capture_result: false,
/// };
/// ```
#[derive(Clone, Debug)]
pub struct InterceptConfig {
    /// Whether to classify and render handler arguments into the request
    /// record's params field.
    pub capture_params: bool,
    /// Whether to build response records at all.
    pub capture_result: bool,
}

impl Default for InterceptConfig {
    fn default() -> Self {
        Self {
            capture_params: true,
            capture_result: true,
        }
    }
}

/// Wraps handler invocations and emits request/response records.
///
/// One interceptor serves any number of handlers and any number of
/// concurrent invocations; it holds no per-invocation state. See the crate
/// docs for a full example.
#[derive(Clone)]
pub struct Interceptor {
    config: InterceptConfig,
    sink: Arc<dyn RecordSink>,
}

impl Interceptor {
    /// Create an interceptor emitting to the given sink.
    pub fn new<S: RecordSink>(config: InterceptConfig, sink: S) -> Self {
        Self {
            config,
            sink: Arc::new(sink),
        }
    }

    /// Wrap one handler invocation.
    ///
    /// Emits a request record (best-effort), awaits `call`, emits a
    /// response record (best-effort, only for value-bearing returns), and
    /// hands the call's outcome back untouched. An error from `call`
    /// propagates unchanged; no response record is built for it.
    ///
    /// `ctx` is the ambient request this invocation runs under, `None` for
    /// calls not triggered by a request. `args` must match the descriptor's
    /// declared parameters one-to-one.
    pub async fn around<T, E, Fut>(
        &self,
        descriptor: &HandlerDescriptor,
        ctx: Option<&RequestContext>,
        args: &[ArgValue],
        call: Fut,
    ) -> Result<T, E>
    where
        T: Serialize,
        Fut: Future<Output = Result<T, E>>,
    {
        let start = Instant::now();

        if let Err(err) = self.emit_request(descriptor, ctx, args) {
            self.sink
                .emit_warning(&format!("request record dropped: {err}"));
        }

        let value = call.await?;

        if descriptor.returns_value && self.config.capture_result {
            if let Err(err) = self.emit_response(descriptor, &value, start) {
                self.sink
                    .emit_warning(&format!("response record dropped: {err}"));
            }
        }

        Ok(value)
    }

    fn emit_request(
        &self,
        descriptor: &HandlerDescriptor,
        ctx: Option<&RequestContext>,
        args: &[ArgValue],
    ) -> Result<(), BuildError> {
        let ctx = ctx.ok_or(BuildError::MissingContext)?;
        ctx.emit_details(self.sink.as_ref());

        let params = if self.config.capture_params {
            classify::render_params(descriptor, ctx, args)?
        } else {
            None
        };
        let record = RequestRecord {
            uri: ctx.path().to_string(),
            method: ctx.method().to_string(),
            handler: descriptor.handler.clone(),
            method_name: descriptor.method_name.clone(),
            remote_addrs: ctx.remote_addr_candidates(),
            params,
        };
        self.sink.emit_request(&record);
        Ok(())
    }

    fn emit_response<T: Serialize>(
        &self,
        descriptor: &HandlerDescriptor,
        value: &T,
        start: Instant,
    ) -> Result<(), BuildError> {
        let record = ResponseRecord {
            handler: descriptor.handler.clone(),
            method_name: descriptor.method_name.clone(),
            result: render::render_result(value)?,
            elapsed_ms: start.elapsed().as_millis() as u64,
        };
        self.sink.emit_response(&record);
        Ok(())
    }
}
