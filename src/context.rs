//! Ambient request context and identity extraction.
//!
//! [`RequestContext`] carries the request-level facts the interceptor logs
//! independently of the handler's own arguments: URI, method, client
//! address candidates and cookies. It is always passed explicitly into the
//! interceptor, never read from global state, so tests can build synthetic
//! contexts directly.

use std::net::{IpAddr, SocketAddr};

use http::header::{HeaderMap, HeaderName, HeaderValue, COOKIE};
use http::{Method, Uri};

use crate::sink::RecordSink;

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REAL_IP: &str = "x-real-ip";

/// Fallback used for an address candidate that cannot be determined.
const UNKNOWN_ADDR: &str = "unknown";

/// The ambient HTTP request a handler invocation runs under.
///
/// # Examples
///
/// Building a synthetic context:
///
/// ```rust
/// use http::Method;
/// use periscope::RequestContext;
///
/// let ctx = RequestContext::new(Method::GET, "/users/42?full=1".parse().unwrap());
/// assert_eq!(ctx.path(), "/users/42");
/// assert_eq!(ctx.query_string(), Some("full=1"));
/// ```
#[derive(Debug, Clone)]
pub struct RequestContext {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    peer_addr: Option<SocketAddr>,
}

impl RequestContext {
    /// Create a context with the given method and URI and no headers.
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            headers: HeaderMap::new(),
            peer_addr: None,
        }
    }

    /// Build a context from the parts of an incoming `http` request, plus
    /// the socket peer address when the transport knows it.
    pub fn from_parts(parts: &http::request::Parts, peer_addr: Option<SocketAddr>) -> Self {
        Self {
            method: parts.method.clone(),
            uri: parts.uri.clone(),
            headers: parts.headers.clone(),
            peer_addr,
        }
    }

    /// Attach a header. Replaces nothing; headers accumulate like on the wire.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Attach the socket peer address.
    pub fn with_peer_addr(mut self, addr: SocketAddr) -> Self {
        self.peer_addr = Some(addr);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// URI path, without the query component.
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Raw query string, undecoded, without the leading `?`.
    pub fn query_string(&self) -> Option<&str> {
        self.uri.query()
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }

    /// Proxy-aware client address: the first hop of `X-Forwarded-For` when
    /// it parses as an IP address, then `X-Real-IP`.
    pub fn forwarded_addr(&self) -> Option<IpAddr> {
        if let Some(forwarded) = self.header_str(X_FORWARDED_FOR) {
            if let Some(first_hop) = forwarded.split(',').next() {
                if let Ok(ip) = first_hop.trim().parse() {
                    return Some(ip);
                }
            }
        }
        self.header_str(X_REAL_IP)
            .and_then(|v| v.trim().parse().ok())
    }

    /// The two client-address candidates, in order: proxy-aware resolution,
    /// then the raw socket peer address. Either falls back to `unknown`.
    pub fn remote_addr_candidates(&self) -> Vec<String> {
        let forwarded = self
            .forwarded_addr()
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| UNKNOWN_ADDR.to_string());
        let peer = self
            .peer_addr
            .map(|addr| addr.to_string())
            .unwrap_or_else(|| UNKNOWN_ADDR.to_string());
        vec![forwarded, peer]
    }

    /// Cookie name/value pairs from all `Cookie` headers, in wire order.
    pub fn cookies(&self) -> Vec<(String, String)> {
        self.headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|header| header.split(';'))
            .filter_map(|pair| {
                let pair = pair.trim();
                let (name, value) = pair.split_once('=')?;
                Some((name.to_string(), value.to_string()))
            })
            .collect()
    }

    /// Emit the identity fields as debug-level detail lines, and the cookie
    /// block only when cookies exist.
    pub(crate) fn emit_details(&self, sink: &dyn RecordSink) {
        sink.emit_detail(&format!("uri: {}", self.uri));
        sink.emit_detail(&format!("method: {}", self.method));
        let candidates = self.remote_addr_candidates();
        sink.emit_detail(&format!("remote address (forwarded): {}", candidates[0]));
        sink.emit_detail(&format!("remote address (socket): {}", candidates[1]));

        let cookies = self.cookies();
        if !cookies.is_empty() {
            let mut block = String::from("request cookies :");
            for (name, value) in &cookies {
                block.push_str("\n\tcookie [ ");
                block.push_str(name);
                block.push_str(" ] = ");
                block.push_str(value);
            }
            sink.emit_detail(&block);
        }
    }

    fn header_str(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

#[cfg(test)]
mod tests {
    use http::header::{HeaderName, HeaderValue, COOKIE};

    use super::*;
    use crate::sink::FanoutSink;

    fn ctx(uri: &str) -> RequestContext {
        RequestContext::new(Method::GET, uri.parse().unwrap())
    }

    fn header(name: &str) -> HeaderName {
        name.parse().unwrap()
    }

    #[test]
    fn query_string_is_raw_and_undecoded() {
        let with_query = ctx("/list?a=1&b=%20x");
        assert_eq!(with_query.path(), "/list");
        assert_eq!(with_query.query_string(), Some("a=1&b=%20x"));
        assert_eq!(ctx("/list").query_string(), None);
    }

    #[test]
    fn forwarded_addr_prefers_first_forwarded_hop() {
        let proxied = ctx("/")
            .with_header(
                header("x-forwarded-for"),
                HeaderValue::from_static("10.0.0.1, 192.168.0.1"),
            )
            .with_header(header("x-real-ip"), HeaderValue::from_static("172.16.0.1"));
        assert_eq!(proxied.forwarded_addr(), Some("10.0.0.1".parse().unwrap()));
    }

    #[test]
    fn forwarded_addr_falls_back_to_real_ip_when_chain_is_garbage() {
        let proxied = ctx("/")
            .with_header(
                header("x-forwarded-for"),
                HeaderValue::from_static("not-an-ip"),
            )
            .with_header(header("x-real-ip"), HeaderValue::from_static("172.16.0.1"));
        assert_eq!(proxied.forwarded_addr(), Some("172.16.0.1".parse().unwrap()));
        assert_eq!(ctx("/").forwarded_addr(), None);
    }

    #[test]
    fn remote_addr_candidates_are_ordered_with_unknown_fallbacks() {
        let full = ctx("/")
            .with_header(header("x-forwarded-for"), HeaderValue::from_static("10.0.0.1"))
            .with_peer_addr("127.0.0.1:5000".parse().unwrap());
        assert_eq!(
            full.remote_addr_candidates(),
            vec!["10.0.0.1".to_string(), "127.0.0.1:5000".to_string()]
        );

        assert_eq!(
            ctx("/").remote_addr_candidates(),
            vec!["unknown".to_string(), "unknown".to_string()]
        );
    }

    #[test]
    fn cookies_parse_name_value_pairs_in_order() {
        let with_cookies =
            ctx("/").with_header(COOKIE, HeaderValue::from_static("sid=abc; theme=dark"));
        assert_eq!(
            with_cookies.cookies(),
            vec![
                ("sid".to_string(), "abc".to_string()),
                ("theme".to_string(), "dark".to_string()),
            ]
        );
        assert!(ctx("/").cookies().is_empty());
    }

    #[test]
    fn from_parts_carries_method_uri_and_headers() {
        let (parts, _) = http::Request::builder()
            .method(Method::POST)
            .uri("/echo?x=1")
            .header(COOKIE, "sid=abc")
            .body(())
            .unwrap()
            .into_parts();
        let ctx = RequestContext::from_parts(&parts, Some("127.0.0.1:5000".parse().unwrap()));
        assert_eq!(ctx.method(), &Method::POST);
        assert_eq!(ctx.uri(), &"/echo?x=1".parse::<http::Uri>().unwrap());
        assert_eq!(ctx.path(), "/echo");
        assert_eq!(ctx.query_string(), Some("x=1"));
        assert_eq!(ctx.cookies().len(), 1);
        assert_eq!(ctx.peer_addr(), Some("127.0.0.1:5000".parse().unwrap()));
    }

    #[test]
    fn emit_details_does_not_panic_on_minimal_context() {
        // Empty fanout sink discards everything.
        ctx("/").emit_details(&FanoutSink::new());
    }
}
