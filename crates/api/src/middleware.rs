use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::{debug, warn};

use safeaid_infra::{AccountService, ServiceError};

use crate::app::errors::ApiError;
use crate::context::{AuthContext, ClientIp};
use crate::rate_limit::ClientRateLimiter;

#[derive(Clone)]
pub struct AuthState {
    pub accounts: AccountService,
}

/// Verify the bearer token, load the account and attach an [`AuthContext`].
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = match extract_bearer(req.headers()) {
        Bearer::Missing => return Err(ApiError::unauthenticated("No token")),
        Bearer::Malformed => return Err(ApiError::unauthenticated("Invalid token")),
        Bearer::Token(t) => t,
    };

    let user = state
        .accounts
        .authenticate(token, Utc::now())
        .await
        .map_err(|e| match e {
            ServiceError::Token(_) | ServiceError::InactiveAccount => {
                debug!(error = %e, "bearer token rejected");
                ApiError::unauthenticated("Invalid token")
            }
            other => ApiError::from(other),
        })?;

    req.extensions_mut().insert(AuthContext::new(user.id, user.role));
    Ok(next.run(req).await)
}

enum Bearer<'a> {
    Missing,
    Malformed,
    Token(&'a str),
}

fn extract_bearer(headers: &HeaderMap) -> Bearer<'_> {
    let Some(header) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Bearer::Missing;
    };
    let Ok(header) = header.to_str() else {
        return Bearer::Malformed;
    };

    let header = header.trim();
    if header.is_empty() || header.eq_ignore_ascii_case("bearer") {
        return Bearer::Missing;
    }
    match header.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Bearer::Token(token.trim())
        }
        _ => Bearer::Malformed,
    }
}

/// Proxy addresses whose forwarding headers are believed.
#[derive(Debug, Clone, Default)]
pub struct TrustedProxies(Arc<[IpAddr]>);

impl TrustedProxies {
    pub fn new(addrs: &[IpAddr]) -> Self {
        Self(addrs.into())
    }

    fn contains(&self, ip: &IpAddr) -> bool {
        self.0.contains(ip)
    }
}

/// Resolve the client address.
///
/// The socket peer address is the client unless the peer is a trusted proxy.
/// Behind a trusted proxy:
/// 1. the right-most `X-Forwarded-For` entry that is not itself a trusted proxy
/// 2. `X-Real-IP`
/// 3. the proxy's own address
pub async fn extract_client_ip(
    State(trusted): State<TrustedProxies>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    mut req: Request,
    next: Next,
) -> Response {
    let ip = client_ip(req.headers(), connect_info.map(|ConnectInfo(addr)| addr), &trusted);
    req.extensions_mut().insert(ClientIp(ip));
    next.run(req).await
}

fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>, trusted: &TrustedProxies) -> IpAddr {
    let Some(peer) = peer.map(|a| a.ip()) else {
        return IpAddr::V4(Ipv4Addr::UNSPECIFIED);
    };
    if !trusted.contains(&peer) {
        return peer;
    }

    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    let forwarded = header("x-forwarded-for").and_then(|list| {
        list.rsplit(',')
            .filter_map(|s| s.trim().parse::<IpAddr>().ok())
            .find(|ip| !trusted.contains(ip))
    });

    forwarded
        .or_else(|| header("x-real-ip").and_then(|s| s.trim().parse().ok()))
        .unwrap_or(peer)
}

/// Reject the request with 429 once the client's allowance is spent.
pub async fn rate_limit(
    State(limiter): State<ClientRateLimiter>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let ip = req
        .extensions()
        .get::<ClientIp>()
        .map(|c| c.0)
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    if let Err(retry_after_secs) = limiter.check(ip) {
        warn!(client_ip = %ip, path = %req.uri().path(), "rate limit exceeded");
        return Err(ApiError::TooManyRequests { retry_after_secs });
    }
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut h = HeaderMap::new();
        for (k, v) in pairs {
            h.insert(*k, HeaderValue::from_static(v));
        }
        h
    }

    #[test]
    fn bearer_parsing() {
        assert!(matches!(extract_bearer(&headers(&[])), Bearer::Missing));
        assert!(matches!(extract_bearer(&headers(&[("authorization", "Bearer ")])), Bearer::Missing));
        assert!(matches!(
            extract_bearer(&headers(&[("authorization", "Basic abc")])),
            Bearer::Malformed
        ));
        assert!(matches!(
            extract_bearer(&headers(&[("authorization", "Bearer abc.def")])),
            Bearer::Token("abc.def")
        ));
    }

    fn peer() -> SocketAddr {
        "192.168.1.1:5000".parse().unwrap()
    }

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn forwarding_headers_are_ignored_from_untrusted_peers() {
        let h = headers(&[("x-forwarded-for", "203.0.113.7"), ("x-real-ip", "198.51.100.2")]);
        assert_eq!(client_ip(&h, Some(peer()), &TrustedProxies::default()), peer().ip());

        let other_proxy = TrustedProxies::new(&[ip("10.0.0.1")]);
        assert_eq!(client_ip(&h, Some(peer()), &other_proxy), peer().ip());
    }

    #[test]
    fn trusted_proxy_forwards_the_nearest_untrusted_hop() {
        let trusted = TrustedProxies::new(&[peer().ip(), ip("10.0.0.1")]);

        // The left-most entry is whatever the caller sent; only the hops the
        // proxies appended count.
        let h = headers(&[("x-forwarded-for", "1.2.3.4, 203.0.113.7, 10.0.0.1")]);
        assert_eq!(client_ip(&h, Some(peer()), &trusted), ip("203.0.113.7"));

        let h = headers(&[("x-real-ip", "198.51.100.2")]);
        assert_eq!(client_ip(&h, Some(peer()), &trusted), ip("198.51.100.2"));

        assert_eq!(client_ip(&headers(&[]), Some(peer()), &trusted), peer().ip());
    }

    #[test]
    fn garbage_forwarded_for_falls_through() {
        let trusted = TrustedProxies::new(&[peer().ip()]);
        let h = headers(&[("x-forwarded-for", "not-an-ip")]);
        assert_eq!(client_ip(&h, Some(peer()), &trusted), peer().ip());
        assert_eq!(client_ip(&h, None, &trusted), IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    }
}
