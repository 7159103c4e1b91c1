use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::HeaderMap;
use axum::http::request::Parts;
use std::borrow::Cow;
use std::convert::Infallible;
use std::net::SocketAddr;

// Peer string used when the server was not started with connect info
const UNKNOWN_PEER: &str = "unknown";

/// Derive the rate limit key for a request.
///
/// First match wins: the first `X-Forwarded-For` entry, then `X-Real-IP`,
/// then the peer address without its port. Header values are trusted as-is,
/// so a client that talks to us directly can pick its own key.
pub fn derive_key(forwarded_for: Option<&str>, real_ip: Option<&str>, peer: &str) -> String {
    if let Some(fwd) = forwarded_for.filter(|v| !v.is_empty()) {
        let first = fwd.split(',').next().unwrap_or(fwd);
        return first.trim().to_string();
    }

    if let Some(ip) = real_ip.filter(|v| !v.is_empty()) {
        return ip.trim().to_string();
    }

    match split_host(peer) {
        Some(host) => host.to_string(),
        None => peer.to_string(),
    }
}

// "host:port" -> "host", "[::1]:80" -> "::1"
// None for anything without a port or with a bare ipv6 address
fn split_host(addr: &str) -> Option<&str> {
    if let Some(rest) = addr.strip_prefix('[') {
        let (host, tail) = rest.split_once(']')?;
        tail.strip_prefix(':')?;
        return Some(host);
    }

    let (host, _port) = addr.rsplit_once(':')?;
    if host.contains(':') {
        return None;
    }
    Some(host)
}

// a present header always counts, even with non-ascii bytes in it
fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<Cow<'a, str>> {
    headers.get(name).map(|v| String::from_utf8_lossy(v.as_bytes()))
}

// Extractor so handlers can take the key directly
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientKey(pub String);

impl<S> FromRequestParts<S> for ClientKey
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.to_string())
            .unwrap_or_else(|| UNKNOWN_PEER.to_string());

        let forwarded_for = header_str(&parts.headers, "x-forwarded-for");
        let real_ip = header_str(&parts.headers, "x-real-ip");
        let key = derive_key(forwarded_for.as_deref(), real_ip.as_deref(), &peer);
        Ok(ClientKey(key))
    }
}
