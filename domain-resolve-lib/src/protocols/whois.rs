//! Legacy WHOIS (port 43) text extraction engine.
//!
//! The fully self-contained fallback path for registries without RDAP:
//! acquire the free-text reply (HTTP mirror page, third-party mirror
//! scrape, or raw TCP socket, in that order), detect the dozen phrasings
//! of "no match", then turn the unstructured text into the canonical
//! record through per-TLD override parsers and a generic chain of
//! label-pattern alternatives per field.
//!
//! Legacy servers agree on nothing — label spelling, casing, punctuation,
//! date order — so every pattern list here is ordered by priority and the
//! first match wins.

use crate::error::ResolveError;
use crate::normalize::{
    canonical_status, normalize_nameservers, parse_timestamp, reformat_legacy_date,
};
use crate::registrars::RegistrarTable;
use crate::types::{CanonicalRecord, LegacyServerSpec, LookupTarget, ScrapePolicy};
use crate::utils::suffix_chain;
use lazy_static::lazy_static;
use regex::Regex;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// "No record" phrasings, matched case-insensitively at line start
/// (a leading `%` banner marker is tolerated).
const NOT_FOUND_PHRASES: &[&str] = &[
    "no match",
    "not found",
    "no data found",
    "no entries found",
    "no object found",
    "domain not found",
    "the queried object does not exist",
    "object does not exist",
    "no such domain",
    "nothing found",
    "no information available",
    "status: available",
    "status: free",
    "available for registration",
    "this domain name has not been registered",
];

/// Third-party public WHOIS mirror, scraped when raw port-43 access is
/// rate-limited or blocked.
const PUBLIC_MIRROR_URL: &str = "https://www.whois.com/whois/{domain}";

/// A per-TLD override parser: may fully or partially populate the record
/// from the raw reply; the generic chain fills whatever it leaves empty.
pub type OverrideParser = fn(&str, &mut CanonicalRecord);

/// Registered override parsers. Keys are exact TLD suffixes or `*.parent`
/// wildcards; selection is exact match, then wildcard over the parent,
/// then suffix-of-key.
const OVERRIDE_PARSERS: &[(&str, OverrideParser)] = &[
    ("jp", parse_jp),
    ("br", parse_br),
    ("*.uk", parse_uk),
];

/// Select the override parser for a TLD suffix, if any.
fn parser_for(tld: &str) -> Option<OverrideParser> {
    // exact
    if let Some((_, parser)) = OVERRIDE_PARSERS.iter().find(|(key, _)| *key == tld) {
        return Some(*parser);
    }
    // wildcard over the parent suffix
    if let Some((_, tail)) = tld.split_once('.') {
        let wildcard = format!("*.{}", tail);
        if let Some((_, parser)) = OVERRIDE_PARSERS.iter().find(|(key, _)| *key == wildcard) {
            return Some(*parser);
        }
    }
    // tld is a suffix of a registered key
    OVERRIDE_PARSERS
        .iter()
        .find(|(key, _)| !key.starts_with('*') && key.ends_with(&format!(".{}", tld)))
        .map(|(_, parser)| *parser)
}

/// Client for the legacy acquisition chain.
#[derive(Clone)]
pub struct LegacyClient {
    http_client: reqwest::Client,
    timeout: Duration,
    scrape_policy: ScrapePolicy,
}

impl LegacyClient {
    /// Create a client with the given socket timeout and scrape policy.
    pub fn new(timeout: Duration, scrape_policy: ScrapePolicy) -> Result<Self, ResolveError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout + Duration::from_secs(2))
            .build()
            .map_err(|e| {
                ResolveError::transport_with_source(
                    "Failed to create legacy HTTP client",
                    e.to_string(),
                )
            })?;

        Ok(Self {
            http_client,
            timeout,
            scrape_policy,
        })
    }

    /// Run the full legacy path for a target.
    ///
    /// Never returns an error: acquisition failures, "no match" replies,
    /// and missing server configuration all resolve into the record's
    /// `found`/`status_code`/`error` fields.
    pub async fn lookup(
        &self,
        target: &LookupTarget,
        spec: Option<&LegacyServerSpec>,
        table: &RegistrarTable,
    ) -> CanonicalRecord {
        let Some(spec) = spec else {
            return CanonicalRecord::failure(
                target.name(),
                405,
                "No legacy WHOIS server configured for this TLD",
            );
        };

        let reply = match self.acquire(target.name(), spec).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::debug!(target = target.name(), error = %e, "legacy acquisition failed");
                return CanonicalRecord::failure(target.name(), 500, e.to_string());
            }
        };

        if let Some(phrase) = detect_not_found(&reply) {
            return CanonicalRecord::failure(target.name(), 404, phrase);
        }

        let mut record = CanonicalRecord::found(target.name());
        record.server = Some(spec.host.clone());

        let tld = suffix_chain(target.name())
            .first()
            .copied()
            .unwrap_or("")
            .to_string();
        if let Some(parser) = parser_for(&tld) {
            tracing::debug!(target = target.name(), tld, "running override parser");
            parser(&reply, &mut record);
        }

        extract_generic(&reply, &mut record, table);
        record
    }

    /// Acquire the raw reply: configured HTTP mirror, else third-party
    /// scrape (policy permitting), else the raw socket. Failures are not
    /// retried.
    async fn acquire(&self, domain: &str, spec: &LegacyServerSpec) -> Result<String, ResolveError> {
        if let Some(mirror) = &spec.http_mirror_url {
            let url = mirror.replace("{domain}", domain);
            let page = self.fetch_page(&url).await?;
            return scrape_payload(&page).ok_or_else(|| {
                ResolveError::parse(format!("No WHOIS payload in mirror page {}", url))
            });
        }

        if self.scrape_policy == ScrapePolicy::Attempt {
            let url = PUBLIC_MIRROR_URL.replace("{domain}", domain);
            if let Ok(page) = self.fetch_page(&url).await {
                if let Some(payload) = scrape_payload(&page) {
                    if !payload.trim().is_empty() {
                        tracing::debug!(domain, "using third-party mirror payload");
                        return Ok(payload);
                    }
                }
            }
        }

        self.query_socket(domain, spec).await
    }

    async fn fetch_page(&self, url: &str) -> Result<String, ResolveError> {
        let response = self.http_client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(ResolveError::transport(format!(
                "Mirror page {} returned HTTP {}",
                url,
                response.status()
            )));
        }
        Ok(response.text().await?)
    }

    /// The raw port-43 exchange: one query line, read until the server
    /// closes the connection. The socket is closed on every exit path;
    /// the timeout bounds connect, write, and read individually.
    async fn query_socket(
        &self,
        domain: &str,
        spec: &LegacyServerSpec,
    ) -> Result<String, ResolveError> {
        let address = (spec.host.as_str(), spec.port);
        tracing::debug!(host = %spec.host, port = spec.port, "opening legacy WHOIS socket");

        let mut stream = tokio::time::timeout(self.timeout, TcpStream::connect(address))
            .await
            .map_err(|_| ResolveError::timeout("WHOIS connect", self.timeout))?
            .map_err(|e| {
                ResolveError::transport_with_source(
                    format!("Connect to {}:{} failed", spec.host, spec.port),
                    e.to_string(),
                )
            })?;

        let line = spec.query_line(domain);
        tokio::time::timeout(self.timeout, stream.write_all(line.as_bytes()))
            .await
            .map_err(|_| ResolveError::timeout("WHOIS write", self.timeout))?
            .map_err(|e| {
                ResolveError::transport_with_source("WHOIS query write failed", e.to_string())
            })?;

        let mut buf = Vec::new();
        tokio::time::timeout(self.timeout, stream.read_to_end(&mut buf))
            .await
            .map_err(|_| ResolveError::timeout("WHOIS read", self.timeout))?
            .map_err(|e| {
                ResolveError::transport_with_source("WHOIS read failed", e.to_string())
            })?;

        Ok(clean_reply(&String::from_utf8_lossy(&buf)))
    }
}

/// Strip carriage returns and leading indentation from every line.
fn clean_reply(raw: &str) -> String {
    raw.lines()
        .map(|line| line.trim_start().trim_end_matches('\r'))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Pull the WHOIS payload out of a mirror page's `<pre>` container.
fn scrape_payload(html: &str) -> Option<String> {
    let open = html.find("<pre")?;
    let body_start = html[open..].find('>')? + open + 1;
    let body_end = html[body_start..].find("</pre>")? + body_start;

    let text = html[body_start..body_end]
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");

    let cleaned = clean_reply(&text);
    if cleaned.trim().is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Scan a reply for a "no record" line, before any field extraction.
fn detect_not_found(reply: &str) -> Option<&'static str> {
    lazy_static! {
        // RIPE-style replies prefix the phrase with a numbered banner,
        // e.g. "%ERROR:101: no entries found"
        static ref RE_ERROR_BANNER: Regex = Regex::new(r"^error:\d+:\s*").unwrap();
    }

    for line in reply.lines() {
        let line = line.trim_start_matches(['%', ' ', '\t']).to_lowercase();
        let line = RE_ERROR_BANNER.replace(&line, "");
        if line.is_empty() {
            continue;
        }
        for phrase in NOT_FOUND_PHRASES {
            if line.starts_with(phrase) {
                return Some(phrase);
            }
        }
    }
    None
}

lazy_static! {
    /// Registrar name labels, priority order.
    static ref RE_REGISTRAR: Vec<Regex> = compile(&[
        r"(?im)^registrar\s*:[ \t]*(.+)$",
        r"(?im)^sponsoring registrar\s*:[ \t]*(.+)$",
        r"(?im)^registrar name\s*:[ \t]*(.+)$",
        r"(?im)^registrar organization\s*:[ \t]*(.+)$",
        r"(?im)^\[registrar\][ \t]*(.+)$",
    ]);

    static ref RE_IANA_ID: Vec<Regex> = compile(&[
        r"(?im)^(?:sponsoring )?registrar iana id\s*:[ \t]*(\d+)",
    ]);

    static ref RE_RESELLER: Vec<Regex> = compile(&[
        r"(?im)^reseller(?: name)?\s*:[ \t]*(.+)$",
    ]);

    static ref RE_CREATED: Vec<Regex> = compile(&[
        r"(?im)^creation date\s*:[ \t]*(.+)$",
        r"(?im)^created(?: on| date)?\s*\.*:[ \t]*(.+)$",
        r"(?im)^registered(?: on)?\s*:[ \t]*(.+)$",
        r"(?im)^registration (?:time|date)\s*:[ \t]*(.+)$",
        r"(?im)^record created\s*:[ \t]*(.+)$",
        r"(?im)^\[created on\][ \t]*(.+)$",
    ]);

    static ref RE_UPDATED: Vec<Regex> = compile(&[
        r"(?im)^updated date\s*:[ \t]*(.+)$",
        r"(?im)^last[- ]updated\s*:[ \t]*(.+)$",
        r"(?im)^last modified\s*:[ \t]*(.+)$",
        r"(?im)^modified\s*:[ \t]*(.+)$",
        r"(?im)^changed\s*:[ \t]*(.+)$",
        r"(?im)^\[last updated?\][ \t]*(.+)$",
    ]);

    static ref RE_EXPIRES: Vec<Regex> = compile(&[
        r"(?im)^registry expiry date\s*:[ \t]*(.+)$",
        r"(?im)^expir(?:y|ation) date\s*\.*:[ \t]*(.+)$",
        r"(?im)^expires?(?: on)?\s*\.*:[ \t]*(.+)$",
        r"(?im)^paid-till\s*:[ \t]*(.+)$",
        r"(?im)^renewal date\s*:[ \t]*(.+)$",
        r"(?im)^\[expires on\][ \t]*(.+)$",
    ]);

    /// Status labels; every match contributes a line.
    static ref RE_STATUS: Vec<Regex> = compile(&[
        r"(?im)^(?:domain )?status\s*:[ \t]*(.+)$",
        r"(?im)^\[(?:state|status)\][ \t]*(.+)$",
    ]);

    /// Single-line nameserver labels; every match contributes a host.
    static ref RE_NAMESERVER: Vec<Regex> = compile(&[
        r"(?im)^(?:name server|nameserver|nserver|hostname)\s*\.*:[ \t]*(\S+)",
        r"(?im)^dns\d*\s*:[ \t]*(\S+)",
        r"(?im)^\[name server\][ \t]*(\S+)",
    ]);

    /// Headers opening a multi-line nameserver block.
    static ref RE_NS_BLOCK: Regex =
        Regex::new(r"(?im)^(?:name servers|dns servers|nameservers)\s*:[ \t]*$").unwrap();
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("static pattern must compile"))
        .collect()
}

/// First capture across an ordered pattern list.
fn first_match(patterns: &[Regex], reply: &str) -> Option<String> {
    patterns.iter().find_map(|re| {
        re.captures(reply)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|s| !s.is_empty())
    })
}

/// All captures of the first pattern that matches anything.
fn all_matches(patterns: &[Regex], reply: &str) -> Vec<String> {
    for re in patterns {
        let found: Vec<String> = re
            .captures_iter(reply)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str().trim().to_string()))
            .filter(|s| !s.is_empty())
            .collect();
        if !found.is_empty() {
            return found;
        }
    }
    Vec::new()
}

/// Hostname lines following a "Name servers:" style block header,
/// terminated by a blank line or the next labelled field.
fn nameserver_block(reply: &str) -> Vec<String> {
    let Some(header) = RE_NS_BLOCK.find(reply) else {
        return Vec::new();
    };

    reply[header.end()..]
        .lines()
        .skip(1)
        .take_while(|line| {
            let line = line.trim();
            !line.is_empty() && !line.contains(':')
        })
        .filter_map(|line| line.split_whitespace().next())
        .filter(|host| host.contains('.'))
        .map(str::to_string)
        .collect()
}

/// Generic label-pattern fallback extraction.
///
/// Applied only to fields the override parser left empty; each field tries
/// its alternatives in fixed priority order and stops at the first match.
fn extract_generic(reply: &str, record: &mut CanonicalRecord, table: &RegistrarTable) {
    if record.registrar.is_unknown() {
        let iana_id = first_match(&RE_IANA_ID, reply).and_then(|id| id.parse::<u32>().ok());
        let name = first_match(&RE_REGISTRAR, reply);

        record.registrar = match (iana_id, name) {
            (Some(id), name) => {
                let mut identity = table.identity_for(id);
                if identity.name.is_none() {
                    identity.name = name;
                }
                identity
            }
            (None, Some(name)) => table.match_name(&name),
            (None, None) => Default::default(),
        };
    }

    if record.reseller.is_none() {
        record.reseller = first_match(&RE_RESELLER, reply);
    }

    if record.ts.created.is_none() {
        record.ts.created = first_match(&RE_CREATED, reply)
            .map(|d| reformat_legacy_date(&d))
            .and_then(|d| parse_timestamp(&d));
    }
    if record.ts.updated.is_none() {
        record.ts.updated = first_match(&RE_UPDATED, reply)
            .map(|d| reformat_legacy_date(&d))
            .and_then(|d| parse_timestamp(&d));
    }
    if record.ts.expires.is_none() {
        record.ts.expires = first_match(&RE_EXPIRES, reply)
            .map(|d| reformat_legacy_date(&d))
            .and_then(|d| parse_timestamp(&d));
    }

    if record.status.is_empty() {
        for raw in all_matches(&RE_STATUS, reply) {
            let canonical = canonical_status(&raw);
            if !canonical.is_empty() && !record.status.contains(&canonical) {
                record.status.push(canonical);
            }
        }
    }

    if record.nameservers.is_empty() {
        let mut hosts = all_matches(&RE_NAMESERVER, reply);
        if hosts.is_empty() {
            hosts = nameserver_block(reply);
        }
        record.nameservers = normalize_nameservers(hosts);
    }
}

/// `.jp` (JPRS) override: bracketed Japanese-registry-style labels, with
/// repeated `[Name Server]` lines.
fn parse_jp(reply: &str, record: &mut CanonicalRecord) {
    lazy_static! {
        static ref RE_JP_NS: Regex = Regex::new(r"(?im)^\[name server\][ \t]*(\S+)").unwrap();
        static ref RE_JP_CREATED: Regex =
            Regex::new(r"(?im)^\[(?:created on|registration date)\][ \t]*(.+)$").unwrap();
        static ref RE_JP_EXPIRES: Regex = Regex::new(r"(?im)^\[expires on\][ \t]*(.+)$").unwrap();
        static ref RE_JP_UPDATED: Regex =
            Regex::new(r"(?im)^\[last updated?\][ \t]*(.+)$").unwrap();
        static ref RE_JP_STATE: Regex = Regex::new(r"(?im)^\[(?:state|status)\][ \t]*(.+)$").unwrap();
    }

    let hosts: Vec<String> = RE_JP_NS
        .captures_iter(reply)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .collect();
    record.nameservers = normalize_nameservers(hosts);

    let date_of = |re: &Regex| {
        re.captures(reply)
            .and_then(|caps| caps.get(1))
            .map(|m| reformat_legacy_date(m.as_str().trim()))
            .and_then(|d| parse_timestamp(&d))
    };
    record.ts.created = date_of(&RE_JP_CREATED);
    record.ts.expires = date_of(&RE_JP_EXPIRES);
    record.ts.updated = date_of(&RE_JP_UPDATED);

    if let Some(state) = RE_JP_STATE
        .captures(reply)
        .and_then(|caps| caps.get(1))
        .map(|m| canonical_status(m.as_str()))
    {
        if !state.is_empty() {
            record.status.push(state);
        }
    }
}

/// `.br` (registro.br) override: `nserver:` lines, compact dates with a
/// trailing provider tag.
fn parse_br(reply: &str, record: &mut CanonicalRecord) {
    lazy_static! {
        static ref RE_BR_NS: Regex = Regex::new(r"(?im)^nserver\s*:[ \t]*(\S+)").unwrap();
        static ref RE_BR_CREATED: Regex = Regex::new(r"(?im)^created\s*:[ \t]*(\S+)").unwrap();
        static ref RE_BR_CHANGED: Regex = Regex::new(r"(?im)^changed\s*:[ \t]*(\S+)").unwrap();
        static ref RE_BR_EXPIRES: Regex = Regex::new(r"(?im)^expires\s*:[ \t]*(\S+)").unwrap();
    }

    let hosts: Vec<String> = RE_BR_NS
        .captures_iter(reply)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .collect();
    record.nameservers = normalize_nameservers(hosts);

    // "created: 20000101 #123456" carries a handle after the date
    let date_of = |re: &Regex| {
        re.captures(reply)
            .and_then(|caps| caps.get(1))
            .map(|m| reformat_legacy_date(m.as_str().split('#').next().unwrap_or("").trim()))
            .and_then(|d| parse_timestamp(&d))
    };
    record.ts.created = date_of(&RE_BR_CREATED);
    record.ts.updated = date_of(&RE_BR_CHANGED);
    record.ts.expires = date_of(&RE_BR_EXPIRES);
}

/// `*.uk` (Nominet) override: the registrar name sits on the line after a
/// bare "Registrar:" header, with a trailing `[Tag = ...]` marker.
fn parse_uk(reply: &str, record: &mut CanonicalRecord) {
    let mut lines = reply.lines().peekable();
    while let Some(line) = lines.next() {
        if line.trim().eq_ignore_ascii_case("registrar:") {
            if let Some(next) = lines.peek() {
                let name = next.split('[').next().unwrap_or("").trim();
                if !name.is_empty() {
                    record.registrar.name = Some(name.to_string());
                }
            }
            break;
        }
    }

    lazy_static! {
        static ref RE_UK_REGISTERED: Regex =
            Regex::new(r"(?im)^registered on\s*:[ \t]*(.+)$").unwrap();
        static ref RE_UK_EXPIRY: Regex = Regex::new(r"(?im)^expiry date\s*:[ \t]*(.+)$").unwrap();
        static ref RE_UK_UPDATED: Regex =
            Regex::new(r"(?im)^last updated\s*:[ \t]*(.+)$").unwrap();
    }

    let date_of = |re: &Regex| {
        re.captures(reply)
            .and_then(|caps| caps.get(1))
            .map(|m| reformat_legacy_date(m.as_str().trim()))
            .and_then(|d| parse_timestamp(&d))
    };
    record.ts.created = date_of(&RE_UK_REGISTERED);
    record.ts.expires = date_of(&RE_UK_EXPIRY);
    record.ts.updated = date_of(&RE_UK_UPDATED);

    record.nameservers = normalize_nameservers(nameserver_block(reply));
}
