//! Core data types for registration-data resolution.
//!
//! This module defines the data model shared across the resolver: the
//! validated lookup target, the per-TLD routing outcome, and the canonical
//! output record every lookup produces.

use crate::error::ResolveError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default legacy WHOIS port (RFC 3912).
pub const LEGACY_WHOIS_PORT: u16 = 43;

/// Maximum length of a lookup target (RFC 1035 name limit).
pub const MAX_TARGET_LEN: usize = 253;

/// What kind of thing a lookup target is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetKind {
    /// A domain name (contains at least one non-digit, non-dot character)
    #[serde(rename = "domain")]
    Domain,

    /// An IP literal (digits and dots only)
    #[serde(rename = "ip")]
    Ip,
}

impl TargetKind {
    /// The RDAP path segment for this kind of target.
    pub fn rdap_segment(&self) -> &'static str {
        match self {
            TargetKind::Domain => "domain",
            TargetKind::Ip => "ip",
        }
    }
}

/// A validated domain name or IP literal.
///
/// Produced once by input sanitization and immutable thereafter:
/// non-empty, trimmed, lower-cased, at most [`MAX_TARGET_LEN`] characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupTarget {
    name: String,
    kind: TargetKind,
}

impl LookupTarget {
    /// Validate and normalize a raw target string.
    ///
    /// Mixed case and surrounding whitespace are normalized away; an empty
    /// or oversized input is rejected with `InvalidTarget`.
    pub fn parse(raw: &str) -> Result<Self, ResolveError> {
        let name = raw.trim().to_lowercase();

        if name.is_empty() {
            return Err(ResolveError::invalid_target(raw, "target cannot be empty"));
        }
        if name.chars().count() > MAX_TARGET_LEN {
            return Err(ResolveError::invalid_target(
                raw,
                format!("target exceeds {} characters", MAX_TARGET_LEN),
            ));
        }

        // Anything carrying a non-digit/non-dot character is a domain name;
        // otherwise it is treated as an IP literal.
        let kind = if name.chars().any(|c| !c.is_ascii_digit() && c != '.') {
            TargetKind::Domain
        } else {
            TargetKind::Ip
        };

        Ok(Self { name, kind })
    }

    /// The normalized target string.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this target is a domain or an IP literal.
    pub fn kind(&self) -> TargetKind {
        self.kind
    }
}

impl std::fmt::Display for LookupTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Descriptor for a legacy WHOIS (port 43) server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyServerSpec {
    /// Server hostname
    pub host: String,

    /// TCP port, 43 unless the registry runs a nonstandard one
    pub port: u16,

    /// Query line template with a `{domain}` placeholder.
    /// Absent means the canonical `"<domain>\r\n"` line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_template: Option<String>,

    /// Some registries only publish legacy data through an HTTP page;
    /// when set, the payload is scraped from this URL instead of port 43.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_mirror_url: Option<String>,
}

impl LegacyServerSpec {
    /// A plain port-43 server with the default query line.
    pub fn host<H: Into<String>>(host: H) -> Self {
        Self {
            host: host.into(),
            port: LEGACY_WHOIS_PORT,
            query_template: None,
            http_mirror_url: None,
        }
    }

    /// A port-43 server with a registry-specific query template.
    pub fn with_template<H: Into<String>, T: Into<String>>(host: H, template: T) -> Self {
        Self {
            host: host.into(),
            port: LEGACY_WHOIS_PORT,
            query_template: Some(template.into()),
            http_mirror_url: None,
        }
    }

    /// A registry whose legacy data is fetched through an HTTP mirror page.
    pub fn with_mirror<H: Into<String>, U: Into<String>>(host: H, url: U) -> Self {
        Self {
            host: host.into(),
            port: LEGACY_WHOIS_PORT,
            query_template: None,
            http_mirror_url: Some(url.into()),
        }
    }

    /// The query line sent for `domain`, template-substituted when configured.
    pub fn query_line(&self, domain: &str) -> String {
        match &self.query_template {
            Some(template) => format!("{}\r\n", template.replace("{domain}", domain)),
            None => format!("{}\r\n", domain),
        }
    }
}

/// Outcome of mapping a TLD to a registry server.
///
/// A registry may carry both an RDAP endpoint and a legacy server; the
/// resolver prefers RDAP while its host is live. Both fields are empty
/// when no server is known for the TLD.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryRoute {
    /// RDAP base URL, queried at `<base>/<domain|ip>/<target>`
    pub base_url: Option<String>,

    /// Legacy WHOIS server descriptor
    pub legacy: Option<LegacyServerSpec>,
}

/// Canonical registrar identity: IANA-style numeric ID plus display name.
///
/// An unresolvable ID stays at 0; an unresolvable name stays `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrarIdentity {
    pub id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// One status present on only one side of the thin/thick pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusDelta {
    /// Canonical status name
    pub status: String,
    /// Present in the thin (registry) document
    pub thin: bool,
    /// Present in the thick (registrar) document
    pub thick: bool,
}

/// The three canonical lifecycle timestamps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyTimestamps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires: Option<DateTime<Utc>>,
}

/// Network identity extracted from an RDAP IP document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpIdentity {
    /// Allocated range as "start - end"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,

    /// CIDR blocks covering the allocation
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub cidrs: Vec<String>,

    /// Handle of the parent allocation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_handle: Option<String>,
}

impl IpIdentity {
    /// Whether anything at all was extracted.
    pub fn is_empty(&self) -> bool {
        self.range.is_none() && self.cidrs.is_empty() && self.parent_handle.is_none()
    }
}

/// The canonical output record of a lookup.
///
/// Every lookup — success, not-found, or failure — resolves to one of these;
/// nothing escapes the resolver as an error. `found == false` implies the
/// record carries only `status_code`/`error` context, never partial data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalRecord {
    /// The target that was looked up
    pub target: String,

    /// Whether a registry record was found
    pub found: bool,

    /// HTTP-style status code (200 on success, 400/404/405/500 on failure)
    pub status_code: u16,

    /// Failure or not-found context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Sponsoring registrar identity
    #[serde(skip_serializing_if = "RegistrarIdentity::is_unknown", default)]
    pub registrar: RegistrarIdentity,

    /// Reseller name, when a reseller entity was present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reseller: Option<String>,

    /// Canonical status list, duplicates removed
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub status: Vec<String>,

    /// Statuses present on only one side of the thin/thick pair
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub status_delta: Vec<StatusDelta>,

    /// Nameservers, lower-cased and sorted
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub nameservers: Vec<String>,

    /// Created / updated / expires timestamps
    #[serde(default)]
    pub ts: KeyTimestamps,

    /// Server that answered (legacy path only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,

    /// Network identity (IP targets only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<IpIdentity>,
}

impl RegistrarIdentity {
    /// serde helper: skip serializing a fully-unknown registrar.
    pub fn is_unknown(&self) -> bool {
        self.id == 0 && self.name.is_none()
    }
}

impl CanonicalRecord {
    /// An empty record for a target, ready to be populated by an engine.
    pub fn empty(target: &str) -> Self {
        Self {
            target: target.to_string(),
            found: false,
            status_code: 0,
            error: None,
            registrar: RegistrarIdentity::default(),
            reseller: None,
            status: Vec::new(),
            status_delta: Vec::new(),
            nameservers: Vec::new(),
            ts: KeyTimestamps::default(),
            server: None,
            identity: None,
        }
    }

    /// A found record with status 200, fields still to be filled in.
    pub fn found(target: &str) -> Self {
        let mut record = Self::empty(target);
        record.found = true;
        record.status_code = 200;
        record
    }

    /// A not-found / failed record carrying only status and error context.
    pub fn failure(target: &str, status_code: u16, error: impl Into<String>) -> Self {
        let mut record = Self::empty(target);
        record.status_code = status_code;
        record.error = Some(error.into());
        record
    }

    /// Convert a resolver error into its failed-record form.
    pub fn from_error(target: &str, err: &ResolveError) -> Self {
        Self::failure(target, err.status_code(), err.to_string())
    }
}

/// Policy for the third-party mirror scrape step of the legacy path.
///
/// Some registries rate-limit or block raw port-43 traffic, which the scrape
/// works around at a latency cost. Configurable rather than hard-coded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ScrapePolicy {
    /// Try the third-party mirror before falling back to the raw socket
    #[default]
    #[serde(rename = "attempt")]
    Attempt,

    /// Go straight to the raw socket
    #[serde(rename = "skip")]
    Skip,
}

/// Configuration options for resolution.
#[derive(Debug, Clone)]
pub struct ResolveConfig {
    /// Skip the thick (registrar) RDAP fetch
    pub thin_only: bool,

    /// Caller-supplied RDAP server, overriding the routing table.
    /// With an override set, a failed thin fetch is not treated as final.
    pub override_server: Option<String>,

    /// Timeout for each RDAP HTTP request
    pub rdap_timeout: Duration,

    /// Timeout for the legacy socket (connect + read)
    pub legacy_timeout: Duration,

    /// Whether to try a third-party mirror before the raw socket
    pub scrape_policy: ScrapePolicy,

    /// Maximum concurrent lookups in `resolve_many` / `resolve_stream`
    pub concurrency: usize,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            thin_only: false,
            override_server: None,
            rdap_timeout: Duration::from_secs(10),
            legacy_timeout: Duration::from_secs(5),
            scrape_policy: ScrapePolicy::default(),
            concurrency: 8,
        }
    }
}

impl ResolveConfig {
    /// Skip the thick RDAP fetch.
    pub fn with_thin_only(mut self, thin_only: bool) -> Self {
        self.thin_only = thin_only;
        self
    }

    /// Use a caller-supplied RDAP server instead of the routing table.
    pub fn with_override_server<S: Into<String>>(mut self, server: S) -> Self {
        self.override_server = Some(server.into());
        self
    }

    /// Set the RDAP request timeout.
    pub fn with_rdap_timeout(mut self, timeout: Duration) -> Self {
        self.rdap_timeout = timeout;
        self
    }

    /// Set the legacy socket timeout.
    pub fn with_legacy_timeout(mut self, timeout: Duration) -> Self {
        self.legacy_timeout = timeout;
        self
    }

    /// Set the third-party scrape policy.
    pub fn with_scrape_policy(mut self, policy: ScrapePolicy) -> Self {
        self.scrape_policy = policy;
        self
    }

    /// Set the multi-target concurrency cap (clamped to 1..=64).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(1, 64);
        self
    }
}
