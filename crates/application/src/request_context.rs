use std::net::SocketAddr;

use http::HeaderMap;
use http::header::USER_AGENT;

/// Client address recorded when no source yields one.
pub const UNKNOWN_CLIENT_IP: &str = "unknown";

const FORWARDED_FOR: &str = "x-forwarded-for";
const REAL_IP: &str = "x-real-ip";
const CORRELATION_ID: &str = "x-correlation-id";
const REQUEST_ID: &str = "x-request-id";

/// Request attributes supplied by the HTTP layer at an audit call site.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Client IP already resolved by the framework, if any.
    pub ip: Option<String>,
    /// Peer socket address.
    pub remote_addr: Option<SocketAddr>,
    /// Request headers.
    pub headers: HeaderMap,
    /// Session identifier.
    pub session_id: Option<String>,
    /// Authenticated user.
    pub user_id: Option<String>,
    /// Explicit correlation id; falls back to request headers.
    pub correlation_id: Option<String>,
}

impl RequestContext {
    /// Creates a context from request headers.
    #[must_use]
    pub fn from_headers(headers: HeaderMap) -> Self {
        Self {
            headers,
            ..Self::default()
        }
    }

    /// Sets the peer socket address.
    #[must_use]
    pub fn with_remote_addr(mut self, remote_addr: SocketAddr) -> Self {
        self.remote_addr = Some(remote_addr);
        self
    }

    /// Sets the session identifier.
    #[must_use]
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Sets the authenticated user.
    #[must_use]
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Resolves the client address.
    ///
    /// Order: framework IP, first `X-Forwarded-For` hop, `X-Real-IP`, peer
    /// address, then [`UNKNOWN_CLIENT_IP`].
    #[must_use]
    pub fn client_ip(&self) -> String {
        non_empty(self.ip.as_deref())
            .or_else(|| {
                self.header(FORWARDED_FOR)
                    .and_then(|value| non_empty(value.split(',').next()))
            })
            .or_else(|| self.header(REAL_IP).and_then(|value| non_empty(Some(value))))
            .map(str::to_owned)
            .or_else(|| self.remote_addr.map(|address| address.ip().to_string()))
            .unwrap_or_else(|| UNKNOWN_CLIENT_IP.to_owned())
    }

    /// Returns the `User-Agent` header.
    #[must_use]
    pub fn user_agent(&self) -> Option<String> {
        self.headers
            .get(USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| non_empty(Some(value)))
            .map(str::to_owned)
    }

    /// Returns the explicit correlation id, else `X-Correlation-ID`, else
    /// `X-Request-ID`.
    #[must_use]
    pub fn correlation_id(&self) -> Option<String> {
        self.correlation_id.clone().or_else(|| {
            self.header(CORRELATION_ID)
                .or_else(|| self.header(REQUEST_ID))
                .and_then(|value| non_empty(Some(value)))
                .map(str::to_owned)
        })
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name)
            .and_then(|value| value.to_str().ok())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use http::{HeaderMap, HeaderValue};

    use super::{RequestContext, UNKNOWN_CLIENT_IP};

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.insert(*name, HeaderValue::from_static(value));
        }
        headers
    }

    #[test]
    fn framework_ip_wins() {
        let mut context = RequestContext::from_headers(headers(&[("x-forwarded-for", "1.1.1.1")]));
        context.ip = Some("9.9.9.9".to_owned());
        assert_eq!(context.client_ip(), "9.9.9.9");
    }

    #[test]
    fn forwarded_for_uses_first_hop() {
        let context = RequestContext::from_headers(headers(&[
            ("x-forwarded-for", " 203.0.113.7 , 10.0.0.1"),
            ("x-real-ip", "10.0.0.2"),
        ]));
        assert_eq!(context.client_ip(), "203.0.113.7");
    }

    #[test]
    fn real_ip_then_socket_then_unknown() {
        let context = RequestContext::from_headers(headers(&[("x-real-ip", "10.0.0.2")]));
        assert_eq!(context.client_ip(), "10.0.0.2");

        let address: Result<SocketAddr, _> = "192.0.2.4:4431".parse();
        assert!(address.is_ok());
        if let Ok(address) = address {
            let context = RequestContext::default().with_remote_addr(address);
            assert_eq!(context.client_ip(), "192.0.2.4");
        }

        assert_eq!(RequestContext::default().client_ip(), UNKNOWN_CLIENT_IP);
    }

    #[test]
    fn user_agent_and_correlation_come_from_headers() {
        let context = RequestContext::from_headers(headers(&[
            ("user-agent", "curl/8.0"),
            ("x-request-id", "req-42"),
        ]));
        assert_eq!(context.user_agent().as_deref(), Some("curl/8.0"));
        assert_eq!(context.correlation_id().as_deref(), Some("req-42"));

        let mut explicit = context.clone();
        explicit.correlation_id = Some("corr-1".to_owned());
        assert_eq!(explicit.correlation_id().as_deref(), Some("corr-1"));
    }
}
