//! TLD routing: which registry server answers for a given domain.
//!
//! Maps a TLD (or multi-label registry suffix) to either an RDAP base URL
//! or a legacy WHOIS server descriptor. The tables are immutable statics,
//! safe for concurrent reads across lookups. A wildcard convention
//! (`"*.uk"`) covers multi-label suffixes under one parent.

use crate::types::{LegacyServerSpec, RegistryRoute};
use crate::utils::{last_label, suffix_chain, url_host};
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::time::Duration;

/// Public best-effort RDAP aggregator, used when no route is known.
pub const AGGREGATOR_BASE_URL: &str = "https://rdap.org";

lazy_static! {
    /// TLD → RDAP base URL. Thin documents are fetched at
    /// `<base>/<domain|ip>/<target>`.
    static ref RDAP_ENDPOINTS: HashMap<&'static str, &'static str> = HashMap::from([
        // Popular gTLDs
        ("com", "https://rdap.verisign.com/com/v1"),
        ("net", "https://rdap.verisign.com/net/v1"),
        ("org", "https://rdap.publicinterestregistry.org/rdap"),
        ("info", "https://rdap.identitydigital.services/rdap"),
        ("biz", "https://rdap.nic.biz"),
        // Google TLDs
        ("app", "https://pubapi.registry.google/rdap"),
        ("dev", "https://pubapi.registry.google/rdap"),
        ("page", "https://pubapi.registry.google/rdap"),
        // CentralNic managed gTLDs
        ("xyz", "https://rdap.centralnic.com/xyz"),
        ("tech", "https://rdap.centralnic.com/tech"),
        ("online", "https://rdap.centralnic.com/online"),
        ("site", "https://rdap.centralnic.com/site"),
        // Identity Digital managed TLDs
        ("ai", "https://rdap.identitydigital.services/rdap"),
        ("io", "https://rdap.identitydigital.services/rdap"),
        ("me", "https://rdap.identitydigital.services/rdap"),
        ("zone", "https://rdap.identitydigital.services/rdap"),
        // ccTLDs with working RDAP endpoints
        ("us", "https://rdap.nic.us"),
        ("uk", "https://rdap.nominet.uk"),
        ("de", "https://rdap.denic.de"),
        ("ca", "https://rdap.ca.fury.ca/rdap"),
        ("au", "https://rdap.cctld.au/rdap"),
        ("fr", "https://rdap.nic.fr"),
        ("nl", "https://rdap.sidn.nl"),
        ("br", "https://rdap.registro.br"),
        ("ar", "https://rdap.nic.ar"),
        ("is", "https://rdap.isnic.is"),
        ("si", "https://rdap.register.si"),
        ("id", "https://rdap.pandi.id/rdap"),
        ("tv", "https://rdap.nic.tv"),
        ("cc", "https://tld-rdap.verisign.com/cc/v1"),
    ]);

    /// TLD → legacy WHOIS server. Consulted only when no live RDAP
    /// endpoint exists for the TLD. Wildcard keys cover multi-label
    /// suffixes (`"*.uk"` matches `co.uk`, `org.uk`, ...).
    static ref LEGACY_SERVERS: HashMap<&'static str, LegacyServerSpec> = HashMap::from([
        ("jp", LegacyServerSpec::with_template("whois.jprs.jp", "{domain}/e")),
        ("ch", LegacyServerSpec::host("whois.nic.ch")),
        ("li", LegacyServerSpec::host("whois.nic.li")),
        ("it", LegacyServerSpec::host("whois.nic.it")),
        ("es", LegacyServerSpec::host("whois.nic.es")),
        ("eu", LegacyServerSpec::host("whois.eu")),
        ("ru", LegacyServerSpec::host("whois.tcinet.ru")),
        ("cl", LegacyServerSpec::host("whois.nic.cl")),
        ("kr", LegacyServerSpec::with_template("whois.kr", "{domain}/E")),
        ("co", LegacyServerSpec::host("whois.nic.co")),
        ("mx", LegacyServerSpec::host("whois.mx")),
        ("cn", LegacyServerSpec::host("whois.cnnic.cn")),
        ("*.uk", LegacyServerSpec::host("whois.nic.uk")),
        ("*.br", LegacyServerSpec::host("whois.registro.br")),
        // Registries that only publish legacy data through an HTTP page
        ("gr", LegacyServerSpec::with_mirror(
            "grweb.ics.forth.gr",
            "https://grweb.ics.forth.gr/public/whois?lang=en&domainName={domain}",
        )),
    ]);
}

/// Map a domain's registry suffix to a route.
///
/// Tries every suffix of the domain longest-first against the RDAP table
/// and the legacy table (exact key, then `*.parent` wildcard)
/// independently; a registry may carry both, and the caller prefers RDAP
/// while its host is live. A domain whose registry runs neither yields an
/// empty route, not an error.
pub fn route_for(domain: &str) -> RegistryRoute {
    let suffixes = suffix_chain(domain);
    let mut route = RegistryRoute::default();

    for suffix in &suffixes {
        if let Some(base) = RDAP_ENDPOINTS.get(*suffix) {
            route.base_url = Some((*base).to_string());
            break;
        }
    }

    for suffix in &suffixes {
        if let Some(spec) = LEGACY_SERVERS.get(*suffix) {
            route.legacy = Some(spec.clone());
            break;
        }
        if suffix.contains('.') {
            let wildcard = format!("*.{}", last_label(suffix));
            if let Some(spec) = LEGACY_SERVERS.get(wildcard.as_str()) {
                route.legacy = Some(spec.clone());
                break;
            }
        }
    }

    route
}

/// Verify an RDAP base URL points at a host that still resolves.
///
/// Routing tables rot; a decommissioned RDAP host must be treated as no
/// route rather than a hard failure mid-lookup. Resolution failure or an
/// empty address set both count as dead.
pub async fn rdap_url_is_live(base_url: &str, timeout: Duration) -> bool {
    let Some(host) = url_host(base_url) else {
        return false;
    };

    let lookup = tokio::time::timeout(timeout, tokio::net::lookup_host((host, 443))).await;
    match lookup {
        Ok(Ok(mut addrs)) => addrs.next().is_some(),
        Ok(Err(e)) => {
            tracing::debug!(host, error = %e, "RDAP host failed forward DNS, treating as dead");
            false
        }
        Err(_) => {
            tracing::debug!(host, "RDAP host DNS lookup timed out, treating as dead");
            false
        }
    }
}

/// Compose the thin-document URL for a target under a base URL.
pub fn thin_url(base_url: &str, segment: &str, target: &str) -> String {
    format!("{}/{}/{}", base_url.trim_end_matches('/'), segment, target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rdap_route_for_common_tld() {
        let route = route_for("example.com");
        assert!(route.base_url.as_deref().unwrap().contains("verisign"));
        assert!(route.legacy.is_none());
    }

    #[test]
    fn test_legacy_route_with_template() {
        let route = route_for("example.jp");
        let spec = route.legacy.unwrap();
        assert_eq!(spec.host, "whois.jprs.jp");
        assert_eq!(spec.query_line("example.jp"), "example.jp/e\r\n");
    }

    #[test]
    fn test_route_carries_legacy_fallback_behind_rdap() {
        // Registries with both servers route to both; a dead RDAP host
        // then still leaves a reachable legacy path.
        let route = route_for("example.co.uk");
        assert!(route.base_url.as_deref().unwrap().contains("nominet"));
        assert_eq!(route.legacy.unwrap().host, "whois.nic.uk");

        let route = route_for("example.net.br");
        assert!(route.base_url.is_some());
        assert_eq!(route.legacy.unwrap().host, "whois.registro.br");
    }

    #[test]
    fn test_wildcard_legacy_match() {
        // Drop to the legacy table only: pick a suffix with no RDAP anywhere
        let route = route_for("example.ltd.cn");
        assert_eq!(route.legacy.unwrap().host, "whois.cnnic.cn");
    }

    #[test]
    fn test_unknown_tld_yields_empty_route() {
        let route = route_for("example.zzunknown");
        assert!(route.base_url.is_none());
        assert!(route.legacy.is_none());
    }

    #[test]
    fn test_http_mirror_route() {
        let spec = route_for("example.gr").legacy.unwrap();
        assert!(spec.http_mirror_url.unwrap().contains("{domain}"));
    }

    #[test]
    fn test_thin_url_composition() {
        assert_eq!(
            thin_url("https://rdap.verisign.com/com/v1/", "domain", "example.com"),
            "https://rdap.verisign.com/com/v1/domain/example.com"
        );
    }

    #[test]
    fn test_all_rdap_endpoints_are_https() {
        for (tld, endpoint) in RDAP_ENDPOINTS.iter() {
            assert!(
                endpoint.starts_with("https://"),
                "Endpoint for '{}' must use HTTPS: {}",
                tld,
                endpoint
            );
            assert!(
                !endpoint.ends_with('/'),
                "Endpoint for '{}' must not carry a trailing slash: {}",
                tld,
                endpoint
            );
        }
    }

    #[tokio::test]
    async fn test_dead_host_is_not_live() {
        assert!(
            !rdap_url_is_live(
                "https://rdap.invalid-host-that-does-not-exist.zz",
                Duration::from_secs(2)
            )
            .await
        );
    }
}
