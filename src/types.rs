//! Data types for intercepted handler invocations.
//!
//! This module contains the registration-time handler metadata
//! ([`HandlerDescriptor`], [`ParamSpec`], [`Binding`]), the per-invocation
//! argument categories ([`ArgValue`], [`ParamMap`]), and the log records
//! built by the interceptor ([`RequestRecord`], [`ResponseRecord`]).

use std::fmt;

use serde::Serialize;

/// How a handler parameter is bound to the incoming request.
///
/// A parameter holds exactly one resolved binding, decided when the
/// [`HandlerDescriptor`] is built. If registration code sets a binding more
/// than once, the last one set wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// No binding metadata; the parameter is labeled by its type name only.
    None,
    /// Bound to a URL path segment with the given name.
    Path(String),
    /// Bound to a query parameter with the given name.
    Query(String),
}

/// Declared metadata for a single handler parameter.
///
/// # Examples
///
/// ```rust
/// use periscope::{Binding, ParamSpec};
///
/// let spec = ParamSpec::new("String").path("id");
/// assert_eq!(spec.binding, Binding::Path("id".to_string()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    /// Declared type name, as it should appear in the log line.
    pub type_name: String,
    /// Resolved binding for this parameter.
    pub binding: Binding,
}

impl ParamSpec {
    /// Create an unbound parameter with the given declared type name.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            binding: Binding::None,
        }
    }

    /// Bind this parameter to a URL path segment. Replaces any earlier binding.
    pub fn path(mut self, name: impl Into<String>) -> Self {
        self.binding = Binding::Path(name.into());
        self
    }

    /// Bind this parameter to a query parameter. Replaces any earlier binding.
    pub fn query(mut self, name: impl Into<String>) -> Self {
        self.binding = Binding::Query(name.into());
        self
    }
}

/// Registration-time description of a handler: its identity, its declared
/// parameters in order, and whether its return type carries a value.
///
/// Built once per handler via the builder methods and reused across
/// invocations; the signature never changes between calls, so descriptors
/// are safe to keep in a `static` or `OnceLock`.
///
/// # Examples
///
/// ```rust
/// use periscope::{HandlerDescriptor, ParamSpec};
///
/// let desc = HandlerDescriptor::new("UserController", "get_user")
///     .param(ParamSpec::new("String").path("id"));
/// assert!(desc.returns_value);
/// assert_eq!(desc.params.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerDescriptor {
    /// Name of the type declaring the handler.
    pub handler: String,
    /// Name of the handler method.
    pub method_name: String,
    /// Declared parameters, in declaration order.
    pub params: Vec<ParamSpec>,
    /// Whether the declared return type carries a value. When `false`, no
    /// response record is ever built, even if the wrapped call yields one.
    pub returns_value: bool,
}

impl HandlerDescriptor {
    /// Start a descriptor for `handler::method_name` with no parameters and
    /// a value-bearing return type.
    pub fn new(handler: impl Into<String>, method_name: impl Into<String>) -> Self {
        Self {
            handler: handler.into(),
            method_name: method_name.into(),
            params: Vec::new(),
            returns_value: true,
        }
    }

    /// Append a declared parameter.
    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    /// Mark the handler's return type as carrying no value.
    pub fn no_return_value(mut self) -> Self {
        self.returns_value = false;
        self
    }
}

/// An ordered set of name/value pairs, used for context-like arguments that
/// expose the raw request parameters. Preserves insertion order, which is
/// the order the pairs are rendered in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamMap {
    pairs: Vec<(String, String)>,
}

impl ParamMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from an ordered sequence of pairs.
    pub fn from_pairs<N, V>(pairs: impl IntoIterator<Item = (N, V)>) -> Self
    where
        N: Into<String>,
        V: Into<String>,
    {
        Self {
            pairs: pairs
                .into_iter()
                .map(|(n, v)| (n.into(), v.into()))
                .collect(),
        }
    }

    /// Append a pair, keeping insertion order.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((name.into(), value.into()));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// One concrete argument value for an invocation, pre-sorted into the
/// category that decides how it is rendered.
///
/// The classifier matches the variants top-down in this order: context-like
/// parameter maps, the response-sink marker, the session marker, then any
/// serialized value. Adding a category is a new variant plus one match arm.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    /// A context-like value exposing the raw request parameters; rendered as
    /// one `name : value` line per pair, in insertion order.
    Params(ParamMap),
    /// The response-sink object. Not meaningfully serializable; rendered as
    /// a fixed placeholder token.
    ResponseSink,
    /// The server-side session object. Rendered as a fixed placeholder token.
    Session,
    /// Any other value, carried as its JSON form.
    Json(serde_json::Value),
}

impl ArgValue {
    /// Capture an arbitrary serializable value as an [`ArgValue::Json`].
    pub fn from_serialize<T: Serialize>(value: &T) -> Result<Self, BuildError> {
        Ok(Self::Json(serde_json::to_value(value)?))
    }
}

impl From<serde_json::Value> for ArgValue {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

/// Failure raised while building or rendering a log record.
///
/// These never escape the interceptor: they are caught at the point of
/// record construction and surfaced only as a warning line on the sink.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// No ambient request context was supplied for this invocation.
    #[error("no request context available")]
    MissingContext,
    /// The supplied argument values do not match the declared parameters.
    #[error("argument count mismatch: {expected} declared, {actual} supplied")]
    ArityMismatch { expected: usize, actual: usize },
    /// A value could not be serialized to its JSON form.
    #[error("value serialization failed: {0}")]
    Render(#[from] serde_json::Error),
}

/// The request-side log record, built once per invocation before the real
/// call proceeds and emitted at most once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestRecord {
    /// Request URI path.
    pub uri: String,
    /// HTTP method token.
    pub method: String,
    /// Name of the type declaring the handler.
    pub handler: String,
    /// Name of the handler method.
    pub method_name: String,
    /// Client address candidates, in order: proxy-aware resolution first,
    /// then the raw socket peer address.
    pub remote_addrs: Vec<String>,
    /// Rendered parameter fragments, or the raw query string for handlers
    /// with no declared parameters. Absent when there is nothing to render.
    pub params: Option<String>,
}

impl fmt::Display for RequestRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            ">>>> api request >>>> uri={} method={} handler={}::{} remote=[{}]",
            self.uri,
            self.method,
            self.handler,
            self.method_name,
            self.remote_addrs.join(", "),
        )?;
        if let Some(params) = &self.params {
            write!(f, " params={params}")?;
        }
        Ok(())
    }
}

/// The response-side log record, built only when the real call succeeds and
/// the handler's return type carries a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseRecord {
    /// Name of the type declaring the handler.
    pub handler: String,
    /// Name of the handler method.
    pub method_name: String,
    /// The returned value, rendered to its compact JSON form.
    pub result: String,
    /// Wall-clock milliseconds from interception entry to the real call
    /// returning.
    pub elapsed_ms: u64,
}

impl fmt::Display for ResponseRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            ">>>> api response >>>> handler={}::{} result={} elapsed_ms={}",
            self.handler, self.method_name, self.result, self.elapsed_ms,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_binding_set_wins() {
        let spec = ParamSpec::new("String").query("q").path("id");
        assert_eq!(spec.binding, Binding::Path("id".to_string()));

        let spec = ParamSpec::new("String").path("id").query("q");
        assert_eq!(spec.binding, Binding::Query("q".to_string()));
    }

    #[test]
    fn descriptor_defaults_to_value_bearing_return() {
        let desc = HandlerDescriptor::new("UserController", "get_user");
        assert!(desc.returns_value);
        assert!(desc.params.is_empty());

        let desc = desc.no_return_value();
        assert!(!desc.returns_value);
    }

    #[test]
    fn param_map_preserves_insertion_order() {
        let mut map = ParamMap::new();
        assert!(map.is_empty());

        map.insert("b", "2");
        map.insert("a", "1");
        let pairs: Vec<_> = map.iter().collect();
        assert_eq!(pairs, vec![("b", "2"), ("a", "1")]);
        assert_eq!(map.len(), 2);
        assert!(!map.is_empty());
    }

    #[test]
    fn request_record_display_includes_marker_and_fields() {
        let record = RequestRecord {
            uri: "/users/42".to_string(),
            method: "GET".to_string(),
            handler: "UserController".to_string(),
            method_name: "get_user".to_string(),
            remote_addrs: vec!["10.0.0.1".to_string(), "127.0.0.1".to_string()],
            params: Some("[PathBinding] String id:42".to_string()),
        };
        let line = record.to_string();
        assert!(line.starts_with(">>>> api request >>>>"));
        assert!(line.contains("uri=/users/42"));
        assert!(line.contains("method=GET"));
        assert!(line.contains("handler=UserController::get_user"));
        assert!(line.contains("remote=[10.0.0.1, 127.0.0.1]"));
        assert!(line.contains("params=[PathBinding] String id:42"));
    }

    #[test]
    fn response_record_display_includes_marker_and_fields() {
        let record = ResponseRecord {
            handler: "UserController".to_string(),
            method_name: "get_user".to_string(),
            result: r#"{"id":"42"}"#.to_string(),
            elapsed_ms: 7,
        };
        let line = record.to_string();
        assert!(line.starts_with(">>>> api response >>>>"));
        assert!(line.contains(r#"result={"id":"42"}"#));
        assert!(line.contains("elapsed_ms=7"));
    }

    #[test]
    fn arg_value_from_serialize_captures_json_form() {
        #[derive(Serialize)]
        struct User {
            id: String,
        }
        let arg = ArgValue::from_serialize(&User {
            id: "42".to_string(),
        })
        .unwrap();
        assert_eq!(arg, ArgValue::Json(serde_json::json!({"id": "42"})));
    }
}
