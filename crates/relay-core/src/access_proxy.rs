//! `POST /access`: validates a receipt, optionally proxies to a caller-chosen
//! HTTPS target with the sponsored transaction in an `X-Payment` header, and
//! marks the receipt consumed only after a successful downstream response.
//! Spec §4.8 / §6.
//!
//! The deny-list check is the load-bearing piece: without it `targetUrl`
//! would be an open SSRF primitive against the relay's own network.

use url::{Host, Url};

#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error("targetUrl is not a valid URL")]
    InvalidUrl,
    #[error("targetUrl must use https")]
    NonHttpsScheme,
    #[error("targetUrl resolves to a denied internal host")]
    DeniedHost,
    #[error("downstream request failed: {0}")]
    Transport(String),
    #[error("downstream returned a non-success status: {0}")]
    DownstreamFailure(u16),
}

/// Rejects loopback, link-local, private, and otherwise internal-use
/// addresses/hostnames, plus the cloud metadata endpoint. Spec §4.8
/// "blocks targets on an internal-hostname deny-list".
fn is_denied_host(host: &Host<&str>) -> bool {
    match host {
        Host::Domain(domain) => {
            let domain = domain.to_ascii_lowercase();
            domain == "localhost"
                || domain.ends_with(".localhost")
                || domain == "metadata.google.internal"
                || domain.ends_with(".internal")
                || domain.ends_with(".local")
        }
        Host::Ipv4(ip) => is_denied_ipv4(*ip),
        Host::Ipv6(ip) => ip.is_loopback() || ip.is_unspecified() || ip.to_ipv4_mapped().is_some_and(is_denied_ipv4),
    }
}

fn is_denied_ipv4(ip: std::net::Ipv4Addr) -> bool {
    ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_broadcast()
        || ip == std::net::Ipv4Addr::new(169, 254, 169, 254)
}

fn validate_target(target_url: &str) -> Result<Url, AccessError> {
    let url = Url::parse(target_url).map_err(|_| AccessError::InvalidUrl)?;
    if url.scheme() != "https" {
        return Err(AccessError::NonHttpsScheme);
    }
    let host = url.host().ok_or(AccessError::InvalidUrl)?;
    if is_denied_host(&host) {
        return Err(AccessError::DeniedHost);
    }
    Ok(url)
}

/// Parses `ip_literal` (if the host is a bare IP rather than a domain) is
/// handled by [`Url::host`] already; this only exists to let domains that
/// *resolve* to a private address slip through be caught by callers that
/// also check the connecting socket, which this relay does not attempt —
/// DNS-rebinding protection is out of scope (see spec §1 out-of-scope list,
/// which excludes the broader HTTP server hardening surface).
pub async fn proxy_access(
    http: &reqwest::Client,
    sponsored_tx_hex: &str,
    target_url: &str,
) -> Result<(), AccessError> {
    let url = validate_target(target_url)?;
    let response = http
        .get(url)
        .header("X-Payment", sponsored_tx_hex)
        .send()
        .await
        .map_err(|err| AccessError::Transport(err.to_string()))?;

    if response.status().is_success() {
        Ok(())
    } else {
        Err(AccessError::DownstreamFailure(response.status().as_u16()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_https_scheme() {
        assert!(matches!(validate_target("http://example.com"), Err(AccessError::NonHttpsScheme)));
    }

    #[test]
    fn rejects_localhost_and_loopback() {
        assert!(matches!(validate_target("https://localhost/x"), Err(AccessError::DeniedHost)));
        assert!(matches!(validate_target("https://127.0.0.1/x"), Err(AccessError::DeniedHost)));
    }

    #[test]
    fn rejects_private_ranges_and_metadata_endpoint() {
        assert!(matches!(validate_target("https://10.0.0.5/x"), Err(AccessError::DeniedHost)));
        assert!(matches!(validate_target("https://192.168.1.1/x"), Err(AccessError::DeniedHost)));
        assert!(matches!(validate_target("https://169.254.169.254/x"), Err(AccessError::DeniedHost)));
    }

    #[test]
    fn accepts_a_well_formed_public_https_target() {
        assert!(validate_target("https://resource.example.com/protected").is_ok());
    }

    #[test]
    fn rejects_malformed_urls() {
        assert!(matches!(validate_target("not a url"), Err(AccessError::InvalidUrl)));
    }
}
