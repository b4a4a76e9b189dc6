//! Request types used throughout the chain.

use bytes::Bytes;
use http::{HeaderMap, Method, Uri, Version};
use std::net::SocketAddr;

/// The HTTP request type used in the chain.
///
/// This is a standard `http::Request` with a fully collected `Bytes` body.
pub type Request = http::Request<Bytes>;

/// Transport-level peer address, stored as a request extension by adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteAddr(pub SocketAddr);

/// Returns the transport-level peer address, if an adapter recorded one.
#[must_use]
pub fn remote_addr(request: &Request) -> Option<SocketAddr> {
    request.extensions().get::<RemoteAddr>().map(|addr| addr.0)
}

/// The parts of a request that survive handing the request onward.
///
/// Units that pass ownership of the [`Request`] to the next stage keep a
/// head when they need to describe the request afterwards.
#[derive(Debug, Clone)]
pub struct RequestHead {
    /// Request method.
    pub method: Method,
    /// Request URI as received.
    pub uri: Uri,
    /// Protocol version.
    pub version: Version,
    /// Request headers.
    pub headers: HeaderMap,
    /// Transport-level peer address.
    pub remote_addr: Option<SocketAddr>,
}

impl RequestHead {
    /// Copies the head out of a request.
    #[must_use]
    pub fn from_request(request: &Request) -> Self {
        Self {
            method: request.method().clone(),
            uri: request.uri().clone(),
            version: request.version(),
            headers: request.headers().clone(),
            remote_addr: remote_addr(request),
        }
    }
}
