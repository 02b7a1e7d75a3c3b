//! Shared normalizers for status vocabularies, nameservers, and timestamps.
//!
//! Registries disagree on everything: status spelling, date formats, even
//! whether a list is a list. Everything that crosses the output contract
//! goes through this module so the rest of the resolver only ever sees one
//! canonical form.

use crate::types::KeyTimestamps;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

lazy_static! {
    /// Synonym table keyed by status token with casing, spaces, hyphens, and
    /// underscores removed. Values are the canonical EPP-style names.
    static ref STATUS_SYNONYMS: HashMap<&'static str, &'static str> = HashMap::from([
        ("ok", "ok"),
        ("active", "ok"),
        ("connect", "ok"),
        ("registered", "ok"),
        ("inactive", "inactive"),
        ("hold", "hold"),
        ("clienthold", "clientHold"),
        ("serverhold", "serverHold"),
        ("clientdeleteprohibited", "clientDeleteProhibited"),
        ("serverdeleteprohibited", "serverDeleteProhibited"),
        ("clientrenewprohibited", "clientRenewProhibited"),
        ("serverrenewprohibited", "serverRenewProhibited"),
        ("clienttransferprohibited", "clientTransferProhibited"),
        ("servertransferprohibited", "serverTransferProhibited"),
        ("clientupdateprohibited", "clientUpdateProhibited"),
        ("serverupdateprohibited", "serverUpdateProhibited"),
        ("addperiod", "addPeriod"),
        ("autorenewperiod", "autoRenewPeriod"),
        ("renewperiod", "renewPeriod"),
        ("transferperiod", "transferPeriod"),
        ("redemptionperiod", "redemptionPeriod"),
        ("pendingcreate", "pendingCreate"),
        ("pendingdelete", "pendingDelete"),
        ("pendingrenew", "pendingRenew"),
        ("pendingrestore", "pendingRestore"),
        ("pendingtransfer", "pendingTransfer"),
        ("pendingupdate", "pendingUpdate"),
    ]);
}

/// Canonicalize a free-form status token.
///
/// Legacy servers often append the matching ICANN EPP URL after the status
/// name; that tail is dropped before lookup. Unrecognized tokens pass
/// through lower-cased and trimmed.
pub fn canonical_status(raw: &str) -> String {
    let mut token = raw.trim();

    // "clientTransferProhibited https://icann.org/epp#clientTransferProhibited"
    if let Some(pos) = token.find(|c: char| c.is_whitespace()) {
        let (head, tail) = token.split_at(pos);
        let tail = tail.trim();
        if tail.starts_with("http://") || tail.starts_with("https://") || tail.starts_with('(') {
            token = head;
        }
    }

    let key: String = token
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .collect::<String>()
        .to_lowercase();

    match STATUS_SYNONYMS.get(key.as_str()) {
        Some(canonical) => (*canonical).to_string(),
        None => token.trim().to_lowercase(),
    }
}

/// Flatten a possibly-nested nameserver structure into a string list.
///
/// Tolerates arrays, objects-of-values, and plain strings at any depth;
/// falsy entries are dropped.
pub fn flatten_nameservers(value: &serde_json::Value) -> Vec<String> {
    let mut out = Vec::new();
    collect_strings(value, &mut out);
    normalize_nameservers(out)
}

fn collect_strings(value: &serde_json::Value, out: &mut Vec<String>) {
    match value {
        serde_json::Value::String(s) => {
            if !s.trim().is_empty() {
                out.push(s.trim().to_string());
            }
        }
        serde_json::Value::Array(items) => {
            for item in items {
                collect_strings(item, out);
            }
        }
        serde_json::Value::Object(map) => {
            for item in map.values() {
                collect_strings(item, out);
            }
        }
        _ => {}
    }
}

/// Lower-case, drop empties, and sort a nameserver list lexicographically.
pub fn normalize_nameservers(hosts: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = hosts
        .into_iter()
        .map(|h| h.trim().to_lowercase())
        .filter(|h| !h.is_empty())
        .collect();
    out.sort();
    out
}

/// RDAP event actions mapped onto the three canonical timestamp fields.
const EVENT_ACTIONS: &[(&str, TimestampField)] = &[
    ("registration", TimestampField::Created),
    ("last changed", TimestampField::Updated),
    ("expiration", TimestampField::Expires),
    ("expiration date", TimestampField::Expires),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimestampField {
    Created,
    Updated,
    Expires,
}

/// Extract the canonical timestamps from a concatenated RDAP event list.
///
/// First valid match per field wins, so callers concatenate the preferred
/// document's events first. An event whose date fails to parse is skipped
/// rather than blocking later events for the same field.
pub fn timestamps_from_events(events: &[serde_json::Value]) -> KeyTimestamps {
    let mut ts = KeyTimestamps::default();

    for event in events {
        let action = event.get("eventAction").and_then(|a| a.as_str());
        let date = event.get("eventDate").and_then(|d| d.as_str());
        let (Some(action), Some(date)) = (action, date) else {
            continue;
        };

        let Some(&(_, field)) = EVENT_ACTIONS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(action))
        else {
            continue;
        };

        let slot = match field {
            TimestampField::Created => &mut ts.created,
            TimestampField::Updated => &mut ts.updated,
            TimestampField::Expires => &mut ts.expires,
        };
        if slot.is_none() {
            *slot = parse_timestamp(date);
        }
    }

    ts
}

lazy_static! {
    static ref RE_ISO_PREFIX: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}").unwrap();
    static ref RE_DMY: Regex = Regex::new(r"^(\d{1,2})([./-])(\d{1,2})([./-])(\d{4})$").unwrap();
    static ref RE_COMPACT: Regex = Regex::new(r"^(\d{4})(\d{2})(\d{2})$").unwrap();
}

/// Rewrite known non-ISO legacy date forms before generic parsing.
///
/// ISO input passes through unchanged; Chilean time abbreviations get their
/// fixed UTC offsets; day-first dates are reordered; compact `YYYYMMDD` is
/// hyphenated. Anything unrecognized passes through untouched and may still
/// fail generic parsing, which yields a null timestamp rather than an error.
pub fn reformat_legacy_date(raw: &str) -> String {
    let text = raw.trim();

    if RE_ISO_PREFIX.is_match(text) {
        // Chilean registries append a local-time abbreviation
        if let Some(stripped) = text.strip_suffix(" CLST") {
            return format!("{} -0300", stripped);
        }
        if let Some(stripped) = text.strip_suffix(" CLT") {
            return format!("{} -0400", stripped);
        }
        return text.to_string();
    }

    if let Some(caps) = RE_DMY.captures(text) {
        // mismatched separators ("31.12-2019") are left for generic parsing
        if caps[2] == caps[4] {
            return format!("{}-{:0>2}-{:0>2}", &caps[5], &caps[3], &caps[1]);
        }
    }

    if let Some(caps) = RE_COMPACT.captures(text) {
        return format!("{}-{}-{}", &caps[1], &caps[2], &caps[3]);
    }

    text.to_string()
}

/// Parse a date string into a UTC timestamp, trying the formats seen across
/// RDAP and legacy replies. Returns `None` for anything unparseable; a bad
/// date never aborts a lookup.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let mut text = raw.trim().to_string();
    if text.is_empty() {
        return None;
    }

    // Some registrars emit "2020-01-01T00:00:00+0000Z"; the trailing Z is
    // redundant and trips strict parsers.
    if text.ends_with("+0000Z") {
        text.truncate(text.len() - 1);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(&text) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in [
        "%Y-%m-%dT%H:%M:%S%z",
        "%Y-%m-%d %H:%M:%S %z",
        "%Y-%m-%d %H:%M:%S%z",
    ] {
        if let Ok(dt) = DateTime::parse_from_str(&text, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    for format in [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&text, format) {
            return Some(Utc.from_utc_datetime(&dt));
        }
    }

    for format in ["%Y-%m-%d", "%Y/%m/%d", "%d-%b-%Y", "%d %b %Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(&text, format) {
            return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
        }
    }

    None
}
