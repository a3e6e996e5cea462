//! Reject requests whose host resolves to a non-public address, and confirm
//! the hostname resolves at all. Follows the common resolver-based SSRF
//! guard pattern, narrowed to one check: private/loopback/link-local.

use crate::errors::RenderError;
use std::net::IpAddr;
use url::Url;

/// Resolve `url`'s host and reject if every resolved address is private,
/// loopback, or link-local, or if resolution fails outright.
pub async fn check_host(url: &Url) -> Result<(), RenderError> {
    let host = url.host_str().ok_or_else(|| RenderError::InvalidUrl("missing host".to_string()))?;
    let port = url.port_or_known_default().unwrap_or(80);

    let addrs = tokio::net::lookup_host((host, port))
        .await
        .map_err(|e| RenderError::DomainNotFound(format!("{host}: {e}")))?
        .collect::<Vec<_>>();

    if addrs.is_empty() {
        return Err(RenderError::DomainNotFound(format!("{host}: no addresses returned")));
    }

    if addrs.iter().all(|a| is_blocked_address(a.ip())) {
        return Err(RenderError::SsrfBlocked);
    }

    Ok(())
}

fn is_blocked_address(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast()
        }
        IpAddr::V6(v6) => {
            v6.is_loopback()
                || v6.is_unspecified()
                || is_unique_local(&v6)
                || (v6.segments()[0] & 0xffc0) == 0xfe80
        }
    }
}

/// IPv6 unique local addresses, `fc00::/7` — `Ipv6Addr::is_unique_local` is
/// nightly-only as of this writing, so it's reimplemented here.
fn is_unique_local(v6: &std::net::Ipv6Addr) -> bool {
    (v6.segments()[0] & 0xfe00) == 0xfc00
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn blocks_loopback_and_private_v4() {
        assert!(is_blocked_address(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))));
        assert!(is_blocked_address(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1))));
        assert!(is_blocked_address(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1))));
        assert!(is_blocked_address(IpAddr::V4(Ipv4Addr::new(169, 254, 1, 1))));
    }

    #[test]
    fn allows_public_v4() {
        assert!(!is_blocked_address(IpAddr::V4(Ipv4Addr::new(93, 184, 216, 34))));
    }
}
