//! Source URL safety checks
//!
//! Image sources are fetched server-side, so a `url` must not reach loopback,
//! private or link-local addresses unless private sources are explicitly
//! allowed. Checks run in two passes: [`check_literal`] looks only at the URL
//! (used again for each redirect hop) and [`check_url`] also resolves the
//! host and checks every address it resolves to.

use reqwest::Url;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use tokio::net::lookup_host;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UnsafeUrl {
    #[error("URL scheme must be http or https, got '{0}'")]
    Scheme(String),

    #[error("URL has no host")]
    NoHost,

    #[error("host '{0}' is not in the source allowlist")]
    NotAllowlisted(String),

    #[error("private or internal address {0} is not allowed")]
    PrivateAddress(IpAddr),

    #[error("internal hostname '{0}' is not allowed")]
    InternalHost(String),

    #[error("host '{host}' resolves to private address {ip}")]
    ResolvesToPrivate { host: String, ip: IpAddr },
}

/// Which sources may be fetched
#[derive(Debug, Clone, Default)]
pub struct SourcePolicy {
    pub allow_private: bool,
    /// Hosts (and their subdomains) that may be fetched; `None` allows any public host
    pub allowlist: Option<Vec<String>>,
}

fn host_of(url: &Url) -> Result<String, UnsafeUrl> {
    let host = url.host_str().ok_or(UnsafeUrl::NoHost)?;
    Ok(host
        .trim_start_matches('[')
        .trim_end_matches(']')
        .to_ascii_lowercase())
}

/// Checks that need no network access.
pub fn check_literal(url: &Url, policy: &SourcePolicy) -> Result<(), UnsafeUrl> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UnsafeUrl::Scheme(url.scheme().to_string()));
    }
    let host = host_of(url)?;

    if let Some(allowlist) = &policy.allowlist {
        let allowed = allowlist.iter().any(|entry| {
            let entry = entry.to_ascii_lowercase();
            host == entry || host.ends_with(&format!(".{}", entry))
        });
        if !allowed {
            return Err(UnsafeUrl::NotAllowlisted(host));
        }
    }

    if policy.allow_private {
        return Ok(());
    }

    if let Ok(ip) = host.parse::<IpAddr>() {
        if is_private_ip(&ip) {
            return Err(UnsafeUrl::PrivateAddress(ip));
        }
    } else if is_internal_hostname(&host) {
        return Err(UnsafeUrl::InternalHost(host));
    }

    Ok(())
}

/// Full check including DNS resolution of the host.
///
/// A failed lookup is not an error here; the fetch itself will fail.
pub async fn check_url(url: &Url, policy: &SourcePolicy) -> Result<(), UnsafeUrl> {
    check_literal(url, policy)?;
    if policy.allow_private {
        return Ok(());
    }

    let host = host_of(url)?;
    if host.parse::<IpAddr>().is_ok() {
        return Ok(());
    }

    let port = url.port_or_known_default().unwrap_or(80);
    match lookup_host((host.clone().as_str(), port)).await {
        Ok(addrs) => {
            for addr in addrs {
                let ip = addr.ip();
                if is_private_ip(&ip) {
                    return Err(UnsafeUrl::ResolvesToPrivate { host, ip });
                }
            }
        }
        Err(e) => {
            tracing::warn!(host = %host, error = %e, "Could not resolve source host");
        }
    }

    Ok(())
}

fn is_internal_hostname(host: &str) -> bool {
    host == "localhost"
        || host.ends_with(".localhost")
        || host.ends_with(".local")
        || host.ends_with(".internal")
        || host.ends_with(".corp")
        || host.ends_with(".home.arpa")
}

/// Loopback, private, link-local, multicast, unspecified and reserved ranges
/// for both address families. IPv4-mapped IPv6 addresses are checked as IPv4.
pub fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_private_v4(v4),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => is_private_v4(&v4),
            None => is_private_v6(v6),
        },
    }
}

fn is_private_v4(ip: &Ipv4Addr) -> bool {
    let [a, b, ..] = ip.octets();
    ip.is_private()
        || ip.is_loopback()
        || ip.is_link_local()
        || ip.is_multicast()
        || ip.is_broadcast()
        || a == 0
        // 100.64.0.0/10 carrier-grade NAT
        || (a == 100 && (64..=127).contains(&b))
}

fn is_private_v6(ip: &Ipv6Addr) -> bool {
    let first = ip.segments()[0];
    ip.is_loopback()
        || ip.is_unspecified()
        || ip.is_multicast()
        || first & 0xffc0 == 0xfe80 // fe80::/10
        || first & 0xfe00 == 0xfc00 // fc00::/7
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn strict() -> SourcePolicy {
        SourcePolicy::default()
    }

    #[test]
    fn test_rejects_non_http_schemes() {
        for raw in ["file:///etc/passwd", "ftp://example.com/a.png", "gopher://example.com"] {
            assert!(matches!(
                check_literal(&url(raw), &strict()),
                Err(UnsafeUrl::Scheme(_))
            ));
        }
    }

    #[test]
    fn test_rejects_private_literals() {
        for raw in [
            "http://127.0.0.1/a.png",
            "http://10.0.0.1/a.png",
            "http://172.16.0.1/a.png",
            "http://192.168.1.1/a.png",
            "http://169.254.169.254/latest",
            "http://0.0.0.0/a.png",
            "http://[::1]/a.png",
            "http://[fd00::1]/a.png",
            "http://[::ffff:10.0.0.1]/a.png",
        ] {
            assert!(
                matches!(
                    check_literal(&url(raw), &strict()),
                    Err(UnsafeUrl::PrivateAddress(_))
                ),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn test_rejects_internal_hostnames() {
        for raw in [
            "http://localhost:3000/a.png",
            "http://printer.local/a.png",
            "http://db.internal/a.png",
            "http://intranet.corp/a.png",
        ] {
            assert!(matches!(
                check_literal(&url(raw), &strict()),
                Err(UnsafeUrl::InternalHost(_))
            ));
        }
    }

    #[test]
    fn test_public_literal_passes() {
        assert!(check_literal(&url("https://8.8.8.8/a.png"), &strict()).is_ok());
        assert!(check_literal(&url("https://cdn.example.com/a.png"), &strict()).is_ok());
    }

    #[test]
    fn test_allowlist_matches_host_and_subdomains() {
        let policy = SourcePolicy {
            allow_private: false,
            allowlist: Some(vec!["example.com".to_string()]),
        };
        assert!(check_literal(&url("https://example.com/a.png"), &policy).is_ok());
        assert!(check_literal(&url("https://img.Example.com/a.png"), &policy).is_ok());
        assert_eq!(
            check_literal(&url("https://badexample.com/a.png"), &policy),
            Err(UnsafeUrl::NotAllowlisted("badexample.com".to_string()))
        );
    }

    #[tokio::test]
    async fn test_allow_private_skips_address_checks() {
        let policy = SourcePolicy {
            allow_private: true,
            allowlist: None,
        };
        assert!(check_url(&url("http://127.0.0.1:8080/a.png"), &policy).await.is_ok());
        assert!(check_url(&url("http://localhost/a.png"), &policy).await.is_ok());
    }

    #[tokio::test]
    async fn test_check_url_rejects_private_literal() {
        assert!(check_url(&url("http://10.1.2.3/a.png"), &strict()).await.is_err());
    }

    #[test]
    fn test_is_private_ip() {
        assert!(is_private_ip(&IpAddr::V4(Ipv4Addr::new(100, 64, 0, 1))));
        assert!(is_private_ip(&IpAddr::V4(Ipv4Addr::new(224, 0, 0, 1))));
        assert!(!is_private_ip(&IpAddr::V4(Ipv4Addr::new(1, 1, 1, 1))));
        assert!(is_private_ip(&IpAddr::V6(Ipv6Addr::UNSPECIFIED)));
        assert!(is_private_ip(&IpAddr::V6(Ipv6Addr::new(0xfe80, 0, 0, 0, 0, 0, 0, 1))));
        assert!(!is_private_ip(&IpAddr::V6(Ipv6Addr::new(
            0x2606, 0x4700, 0, 0, 0, 0, 0, 0x1111
        ))));
    }
}
