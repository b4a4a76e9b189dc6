//! Client address resolution.
//!
//! Behind a proxy the transport peer is the proxy, not the client. [`RealIp`]
//! resolves the originating address from forwarding headers and binds it to
//! the context, where [`real_ip`] reads it back.
//!
//! ## Resolution order
//!
//! 1. `X-Real-IP`, trimmed
//! 2. The first comma-separated entry of `X-Forwarded-For`, trimmed
//! 3. The transport peer address recorded by the server adapter
//!
//! Headers are taken at face value. Deploy behind a proxy that overwrites
//! them.

use strand_core::{remote_addr, BoxFuture, Context, ContextKey, Request, ResponseWriter, Result};

use crate::middleware::{Middleware, Next};

/// Single-value forwarding header.
pub const X_REAL_IP: &str = "x-real-ip";

/// Comma-separated forwarding chain header.
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

struct RealIpKey;

impl ContextKey for RealIpKey {
    type Value = String;
}

/// Returns the resolved client address, or `""` if [`RealIp`] did not run.
#[must_use]
pub fn real_ip(ctx: &Context) -> &str {
    ctx.get::<RealIpKey>().map_or("", String::as_str)
}

/// Resolves the client address of `request`.
///
/// Returns an empty string when neither header nor peer address is known.
#[must_use]
pub fn client_ip(request: &Request) -> String {
    let header = |name: &str| {
        request
            .headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    if let Some(ip) = header(X_REAL_IP) {
        return ip.to_string();
    }

    if let Some(first) = header(X_FORWARDED_FOR)
        .and_then(|chain| chain.split(',').next())
        .map(str::trim)
        .filter(|first| !first.is_empty())
    {
        return first.to_string();
    }

    remote_addr(request).map_or_else(String::new, |addr| addr.to_string())
}

/// Binds the resolved client address to the context.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealIp;

impl Middleware for RealIp {
    fn name(&self) -> &'static str {
        "real_ip"
    }

    fn process<'a>(
        &'a self,
        ctx: Context,
        writer: &'a mut dyn ResponseWriter,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<()>> {
        let ip = client_ip(&request);
        next.run(ctx.with::<RealIpKey>(ip), writer, request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use strand_core::RemoteAddr;

    fn request(headers: &[(&str, &str)], peer: Option<&str>) -> Request {
        let mut builder = http::Request::builder().uri("/");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let mut request = builder.body(Bytes::new()).unwrap();
        if let Some(peer) = peer {
            request
                .extensions_mut()
                .insert(RemoteAddr(peer.parse().unwrap()));
        }
        request
    }

    #[test]
    fn test_real_ip_header_wins() {
        let req = request(
            &[(X_REAL_IP, " 1.2.3.4 "), (X_FORWARDED_FOR, "5.6.7.8")],
            Some("9.9.9.9:80"),
        );
        assert_eq!(client_ip(&req), "1.2.3.4");
    }

    #[test]
    fn test_first_forwarded_entry() {
        let req = request(&[(X_FORWARDED_FOR, " 5.6.7.8 , 10.0.0.1")], None);
        assert_eq!(client_ip(&req), "5.6.7.8");
    }

    #[test]
    fn test_falls_back_to_peer() {
        let req = request(&[], Some("9.9.9.9:80"));
        assert_eq!(client_ip(&req), "9.9.9.9:80");
    }

    #[test]
    fn test_nothing_known() {
        assert_eq!(client_ip(&request(&[], None)), "");
    }

    #[test]
    fn test_accessor_without_unit() {
        assert_eq!(real_ip(&Context::new()), "");
    }
}
