//! RDAP fetch and merge engine.
//!
//! Fetches the thin (registry) and thick (registrar) RDAP documents,
//! repairs the array/object ambiguities some servers emit, walks the
//! entity/vcard structures for registrar and reseller identity, and
//! computes the thin/thick status delta.
//!
//! RDAP is nominally structured, but servers disagree on enough details
//! (arrays serialized as numeric-keyed objects, `publicIds` vs `publicIDs`,
//! registrar identity hidden in four different places) that most of this
//! module is tolerance code. Every quirk handled here was observed in a
//! real registry response.

use crate::error::ResolveError;
use crate::normalize::{
    canonical_status, flatten_nameservers, parse_timestamp, timestamps_from_events,
};
use crate::registrars::RegistrarTable;
use crate::types::{CanonicalRecord, IpIdentity, RegistrarIdentity, StatusDelta};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::time::Duration;

/// Public-identifier types recognized as registrar IDs, in precedence order.
const REGISTRAR_ID_TYPES: &[&str] = &[
    "PANDI Registrar ID",
    "IANA Registrar ID",
    "IANA RegistrarID",
    "Registry Identifier",
];

/// TLDs that list the authoritative contact under a "technical" role
/// instead of "registrar".
const TECHNICAL_ROLE_TLDS: &[&str] = &["is"];

/// One entity classified as a registrar, with ranking metadata.
#[derive(Debug, Clone, Default)]
pub struct RegistrarCandidate {
    /// Resolved identity (id 0 when only a name was found)
    pub identity: RegistrarIdentity,
    /// Contact email found on the entity or its sub-entities
    pub email: Option<String>,
    /// Email from an abuse-tagged sub-entity, when present
    pub abuse_email: Option<String>,
    /// Most recent "registration" event on the entity itself
    pub registration: Option<DateTime<Utc>>,
}

/// HTTP client for RDAP documents.
#[derive(Clone)]
pub struct RdapClient {
    http_client: reqwest::Client,
    timeout: Duration,
}

impl RdapClient {
    /// Create a client with the given per-request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, ResolveError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout + Duration::from_secs(2))
            .build()
            .map_err(|e| {
                ResolveError::transport_with_source(
                    "Failed to create RDAP HTTP client",
                    e.to_string(),
                )
            })?;

        Ok(Self {
            http_client,
            timeout,
        })
    }

    /// Fetch and repair one RDAP document.
    ///
    /// Any HTTP status in [200, 400) with a body lacking an `errorCode`
    /// field is a valid document. A body carrying `errorCode` is an error
    /// dressed as a 200 and is rejected with that code.
    pub async fn fetch_document(&self, url: &str, target: &str) -> Result<Value, ResolveError> {
        tracing::debug!(url, "fetching RDAP document");

        let request = self.http_client.get(url).send();
        let response = tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| ResolveError::timeout("RDAP request", self.timeout))?
            .map_err(|e| ResolveError::rdap(target, format!("Request failed: {}", e)))?;

        let status = response.status();
        if !(status.as_u16() >= 200 && status.as_u16() < 400) {
            return Err(ResolveError::rdap_with_status(
                target,
                status
                    .canonical_reason()
                    .unwrap_or("RDAP server error")
                    .to_string(),
                status.as_u16(),
            ));
        }

        let mut doc: Value = response
            .json()
            .await
            .map_err(|e| ResolveError::rdap(target, format!("Failed to parse JSON: {}", e)))?;

        if let Some(code) = doc.get("errorCode").and_then(|c| c.as_u64()) {
            let title = doc
                .get("title")
                .and_then(|t| t.as_str())
                .unwrap_or("RDAP error response");
            return Err(ResolveError::rdap_with_status(
                target,
                title.to_string(),
                code as u16,
            ));
        }

        repair_document(&mut doc);
        Ok(doc)
    }
}

/// Repair "array confusion": RDAP arrays serialized as objects with
/// numeric string keys.
///
/// Triggered when the document advertises conformance through a
/// numerically-keyed `rdapConformance` — the telltale that the server (or a
/// proxy in front of it) re-encoded every array this way. Normalized once,
/// right after parsing, so nothing downstream branches on it.
pub fn repair_document(doc: &mut Value) {
    let confused = doc
        .get("rdapConformance")
        .and_then(|c| c.as_object())
        .map(|o| o.contains_key("0"))
        .unwrap_or(false);

    if confused {
        restore_arrays(doc);
    }
}

/// Recursively convert every object-with-numeric-keys into an ordered
/// sequence, preserving numeric key order.
fn restore_arrays(value: &mut Value) {
    if let Value::Object(map) = value {
        let numeric = !map.is_empty() && map.keys().all(|k| k.parse::<usize>().is_ok());
        if numeric {
            let mut keyed: Vec<(usize, Value)> = map
                .iter_mut()
                .map(|(k, v)| (k.parse::<usize>().unwrap_or(usize::MAX), v.take()))
                .collect();
            keyed.sort_by_key(|(k, _)| *k);
            *value = Value::Array(keyed.into_iter().map(|(_, v)| v).collect());
        }
    }

    match value {
        Value::Array(items) => {
            for item in items {
                restore_arrays(item);
            }
        }
        Value::Object(map) => {
            for item in map.values_mut() {
                restore_arrays(item);
            }
        }
        _ => {}
    }
}

/// Depth-first search for the first node some extractor accepts.
///
/// The entity/vcard shapes vary too much for typed traversal; this is the
/// one generic walk every extraction below is built on.
pub fn find_first<'a, T>(value: &'a Value, extract: &dyn Fn(&'a Value) -> Option<T>) -> Option<T> {
    if let Some(found) = extract(value) {
        return Some(found);
    }
    match value {
        Value::Array(items) => items.iter().find_map(|item| find_first(item, extract)),
        Value::Object(map) => map.values().find_map(|item| find_first(item, extract)),
        _ => None,
    }
}

/// Flatten a document's entities into one list.
///
/// Tolerates `entities` being absent, an array, or an object-of-values,
/// plus the legacy singular `entity` field some servers still emit.
pub fn collect_entities(doc: &Value) -> Vec<&Value> {
    let mut out = Vec::new();

    match doc.get("entities") {
        Some(Value::Array(items)) => out.extend(items.iter()),
        Some(Value::Object(map)) => out.extend(map.values()),
        _ => {}
    }
    if let Some(entity) = doc.get("entity") {
        out.push(entity);
    }

    out
}

/// An entity's roles as strings, tolerating array or object form.
fn entity_roles(entity: &Value) -> Vec<&str> {
    match entity.get("roles") {
        Some(Value::Array(items)) => items.iter().filter_map(|r| r.as_str()).collect(),
        Some(Value::Object(map)) => map.values().filter_map(|r| r.as_str()).collect(),
        _ => Vec::new(),
    }
}

/// The vcard entry list of an entity (`vcardArray[1]`).
fn vcard_entries(entity: &Value) -> Option<&Vec<Value>> {
    entity
        .get("vcardArray")
        .and_then(|v| v.as_array())
        .and_then(|a| a.get(1))
        .and_then(|a| a.as_array())
}

/// The text value of the first vcard entry with the given key.
fn vcard_text<'a>(entity: &'a Value, key: &str) -> Option<&'a str> {
    let entries = vcard_entries(entity)?;
    for entry in entries {
        let fields = entry.as_array()?;
        if fields.first().and_then(|f| f.as_str()) == Some(key) {
            // value lives at index 3; org values occasionally arrive as a
            // one-element array
            return match fields.get(3) {
                Some(Value::String(s)) => Some(s.as_str()),
                Some(Value::Array(items)) => items.first().and_then(|v| v.as_str()),
                _ => None,
            };
        }
    }
    None
}

/// The registrar display name on a contact card: `fn`, else `org`.
fn vcard_display_name(entity: &Value) -> Option<&str> {
    vcard_text(entity, "fn")
        .filter(|s| !s.is_empty())
        .or_else(|| vcard_text(entity, "org"))
}

/// The entity's public-identifier list, tolerating the mis-cased
/// `publicIDs` spelling and both array and single-object forms.
fn public_ids(entity: &Value) -> Vec<&Value> {
    let field = entity
        .get("publicIds")
        .or_else(|| entity.get("publicIDs"));
    match field {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(obj @ Value::Object(_)) => vec![obj],
        _ => Vec::new(),
    }
}

/// Numeric registrar ID from an entity's public identifiers, trying the
/// recognized identifier types in precedence order.
fn registrar_id_from_public_ids(entity: &Value) -> Option<u32> {
    let ids = public_ids(entity);
    for id_type in REGISTRAR_ID_TYPES {
        for entry in &ids {
            let matches = entry
                .get("type")
                .and_then(|t| t.as_str())
                .map(|t| t.eq_ignore_ascii_case(id_type))
                .unwrap_or(false);
            if matches {
                if let Some(id) = entry
                    .get("identifier")
                    .and_then(|i| i.as_str())
                    .and_then(|i| i.trim().parse::<u32>().ok())
                {
                    return Some(id);
                }
            }
        }
    }
    None
}

/// First email on the entity or its sub-entities; abuse email from a
/// sub-entity tagged with the "abuse" role.
fn entity_emails(entity: &Value) -> (Option<String>, Option<String>) {
    let email_of = |node: &Value| vcard_text(node, "email").map(str::to_string);

    let email = find_first(entity, &|node| email_of(node));

    let abuse = find_first(entity, &|node| {
        if entity_roles(node).iter().any(|r| *r == "abuse") {
            email_of(node)
        } else {
            None
        }
    });

    (email, abuse)
}

/// Most recent "registration" event date on the entity itself.
fn entity_registration_date(entity: &Value) -> Option<DateTime<Utc>> {
    let events = match entity.get("events") {
        Some(Value::Array(items)) => items.iter().collect::<Vec<_>>(),
        Some(Value::Object(map)) => map.values().collect(),
        _ => return None,
    };

    events
        .into_iter()
        .filter(|e| {
            e.get("eventAction").and_then(|a| a.as_str()) == Some("registration")
        })
        .filter_map(|e| e.get("eventDate").and_then(|d| d.as_str()))
        .filter_map(parse_timestamp)
        .max()
}

/// Classify one entity as a registrar candidate, applying the four
/// extraction heuristics in fixed precedence order. First match wins:
///
/// a. public-identifier list with a recognized registrar ID type;
/// b. `.ca`-style literal "registrar" marker at a fixed vcard position;
/// c. `.si`-style bare contact card (`fn`, no public identifiers);
/// d. `.ar`-style bare handle.
///
/// The order is a fixed, tested contract; a TLD covered by none of the
/// four yields no candidate rather than a guess.
fn candidate_from_entity(entity: &Value, table: &RegistrarTable) -> Option<RegistrarCandidate> {
    let identity = extract_identity(entity, table)?;
    let (email, abuse_email) = entity_emails(entity);

    Some(RegistrarCandidate {
        identity,
        email,
        abuse_email,
        registration: entity_registration_date(entity),
    })
}

fn extract_identity(entity: &Value, table: &RegistrarTable) -> Option<RegistrarIdentity> {
    // (a) recognized public identifier
    if let Some(id) = registrar_id_from_public_ids(entity) {
        let mut identity = table.identity_for(id);
        if identity.name.is_none() {
            identity.name = vcard_display_name(entity).map(str::to_string);
        }
        return Some(identity);
    }

    // (b) .ca-style: vcard entry 1 carries the literal "registrar" marker,
    // entry 2 carries the name
    if let Some(entries) = vcard_entries(entity) {
        let marker = entries
            .get(1)
            .and_then(|e| e.as_array())
            .and_then(|f| f.get(3))
            .and_then(|v| v.as_str());
        if marker == Some("registrar") {
            let name = entries
                .get(2)
                .and_then(|e| e.as_array())
                .and_then(|f| f.get(3))
                .and_then(|v| v.as_str());
            return Some(RegistrarIdentity {
                id: 0,
                name: name.map(str::to_string),
            });
        }
    }

    // (c) .si-style: contact card with fn but no public identifiers
    if public_ids(entity).is_empty() {
        if let Some(name) = vcard_text(entity, "fn").filter(|s| !s.is_empty()) {
            let handle = entity.get("handle").and_then(|h| h.as_str()).unwrap_or("");
            if let Ok(id) = handle.parse::<u32>() {
                let mut identity = table.identity_for(id);
                if identity.name.is_none() {
                    identity.name = Some(name.to_string());
                }
                return Some(identity);
            }
            return Some(RegistrarIdentity {
                id: 0,
                name: Some(name.to_string()),
            });
        }
    }

    // (d) .ar-style: nothing but a handle
    if let Some(handle) = entity
        .get("handle")
        .and_then(|h| h.as_str())
        .filter(|h| !h.is_empty())
    {
        return Some(RegistrarIdentity {
            id: 0,
            name: Some(handle.to_string()),
        });
    }

    None
}

/// Gather every registrar candidate from one document.
///
/// "registrar"-role entities always qualify; for TLDs known to file the
/// authoritative contact under "technical" (`.is` style), those entities
/// are added as additional candidates.
pub fn registrar_candidates(
    doc: &Value,
    tld: &str,
    table: &RegistrarTable,
) -> Vec<RegistrarCandidate> {
    let technical_counts = TECHNICAL_ROLE_TLDS.contains(&tld);
    let mut candidates = Vec::new();

    for entity in collect_entities(doc) {
        let roles = entity_roles(entity);
        let is_registrar = roles.iter().any(|r| *r == "registrar");
        let is_technical = technical_counts && roles.iter().any(|r| *r == "technical");
        if !is_registrar && !is_technical {
            continue;
        }
        if let Some(candidate) = candidate_from_entity(entity, table) {
            candidates.push(candidate);
        }
    }

    candidates
}

/// First reseller name in the document: a "reseller"-role entity with a
/// contact card.
pub fn reseller_name(doc: &Value) -> Option<String> {
    collect_entities(doc).into_iter().find_map(|entity| {
        if entity_roles(entity).iter().any(|r| *r == "reseller") {
            vcard_display_name(entity).map(str::to_string)
        } else {
            None
        }
    })
}

/// The document's normalized status list, duplicates removed, order kept.
pub fn document_statuses(doc: &Value) -> Vec<String> {
    let raw: Vec<&str> = match doc.get("status") {
        Some(Value::Array(items)) => items.iter().filter_map(|s| s.as_str()).collect(),
        Some(Value::Object(map)) => map.values().filter_map(|s| s.as_str()).collect(),
        _ => Vec::new(),
    };

    let mut out: Vec<String> = Vec::new();
    for status in raw {
        let canonical = canonical_status(status);
        if !canonical.is_empty() && !out.contains(&canonical) {
            out.push(canonical);
        }
    }
    out
}

/// A status name with its `client`/`server` prefix stripped, for the
/// presence-equivalence comparison (`clientHold` ≡ `serverHold`).
fn status_stem(status: &str) -> String {
    let stem = status
        .strip_prefix("client")
        .or_else(|| status.strip_prefix("server"))
        .unwrap_or(status);
    stem.to_lowercase()
}

fn side_has_status(side: &[String], status: &str) -> bool {
    let stem = status_stem(status);
    side.iter().any(|s| status_stem(s) == stem)
}

/// Union of thin and thick statuses plus the per-status presence delta.
///
/// A status counts as present on a side if that side carries it under
/// either prefix of the client/server pair; only genuine one-sided
/// statuses produce a delta entry.
pub fn reconcile_statuses(
    thin: &[String],
    thick: &[String],
) -> (Vec<String>, Vec<StatusDelta>) {
    let mut union: Vec<String> = Vec::new();
    for status in thin.iter().chain(thick.iter()) {
        if !union.contains(status) {
            union.push(status.clone());
        }
    }

    let mut delta = Vec::new();
    for status in &union {
        let in_thin = side_has_status(thin, status);
        let in_thick = side_has_status(thick, status);
        if in_thin != in_thick {
            delta.push(StatusDelta {
                status: status.clone(),
                thin: in_thin,
                thick: in_thick,
            });
        }
    }

    (union, delta)
}

/// Nameserver host names of a document (`ldhName` per nameserver object,
/// bare strings tolerated), flattened and normalized.
pub fn document_nameservers(doc: &Value) -> Vec<String> {
    let Some(field) = doc.get("nameservers") else {
        return Vec::new();
    };

    let nodes: Vec<&Value> = match field {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => map.values().collect(),
        _ => Vec::new(),
    };

    let hosts: Vec<Value> = nodes
        .into_iter()
        .filter_map(|node| match node {
            Value::String(s) => Some(Value::String(s.clone())),
            obj => obj.get("ldhName").cloned(),
        })
        .collect();

    flatten_nameservers(&Value::Array(hosts))
}

/// A document's events as a flat list, tolerating object form.
fn document_events(doc: &Value) -> Vec<Value> {
    match doc.get("events") {
        Some(Value::Array(items)) => items.clone(),
        Some(Value::Object(map)) => map.values().cloned().collect(),
        _ => Vec::new(),
    }
}

/// Derive the thick (registrar) document URL from a thin document's links:
/// a `related` link of RDAP media type that is not the self link.
pub fn thick_url_from_links(doc: &Value) -> Option<String> {
    let links = match doc.get("links") {
        Some(Value::Array(items)) => items.iter().collect::<Vec<_>>(),
        Some(Value::Object(map)) => map.values().collect(),
        _ => return None,
    };

    let self_href = links.iter().find_map(|link| {
        if link.get("rel").and_then(|r| r.as_str()) == Some("self") {
            link.get("href").and_then(|h| h.as_str())
        } else {
            None
        }
    });

    links.iter().find_map(|link| {
        let rel = link.get("rel").and_then(|r| r.as_str())?;
        let media = link.get("type").and_then(|t| t.as_str()).unwrap_or("");
        let href = link.get("href").and_then(|h| h.as_str())?;
        if rel == "related" && media.contains("rdap") && Some(href) != self_href {
            Some(href.to_string())
        } else {
            None
        }
    })
}

/// Merge the thin and thick documents into the output record.
///
/// Mutates registrar, reseller, status, status delta, nameservers, and
/// timestamps. Thick values win where both sides speak: its candidates
/// rank first on ties, its nameservers are preferred, and its events are
/// concatenated first so the first-valid-match rule favors them.
pub fn merge_documents(
    thin: &Value,
    thick: Option<&Value>,
    tld: &str,
    table: &RegistrarTable,
    record: &mut CanonicalRecord,
) {
    let empty = Value::Null;
    let thick_doc = thick.unwrap_or(&empty);

    // Registrar: latest registration event wins, missing dates rank last,
    // thick before thin on ties.
    let mut candidates = registrar_candidates(thick_doc, tld, table);
    candidates.extend(registrar_candidates(thin, tld, table));
    candidates.sort_by(|a, b| b.registration.cmp(&a.registration));
    if let Some(best) = candidates.into_iter().next() {
        record.registrar = best.identity;
    }

    record.reseller = reseller_name(thick_doc).or_else(|| reseller_name(thin));

    let thin_status = document_statuses(thin);
    let thick_status = document_statuses(thick_doc);
    let (status, delta) = reconcile_statuses(&thin_status, &thick_status);
    record.status = status;
    record.status_delta = delta;

    let thick_ns = document_nameservers(thick_doc);
    record.nameservers = if !thick_ns.is_empty() {
        thick_ns
    } else {
        document_nameservers(thin)
    };

    let mut events = document_events(thick_doc);
    events.extend(document_events(thin));
    record.ts = timestamps_from_events(&events);
}

/// IP-specific parsing of a thin document: network range, CIDR blocks,
/// and the parent allocation handle.
pub fn extract_ip_identity(doc: &Value) -> IpIdentity {
    let mut identity = IpIdentity::default();

    let start = doc.get("startAddress").and_then(|v| v.as_str());
    let end = doc.get("endAddress").and_then(|v| v.as_str());
    if let (Some(start), Some(end)) = (start, end) {
        identity.range = Some(format!("{} - {}", start, end));
    }

    if let Some(Value::Array(cidrs)) = doc.get("cidr0_cidrs") {
        for cidr in cidrs {
            let prefix = cidr
                .get("v4prefix")
                .or_else(|| cidr.get("v6prefix"))
                .and_then(|p| p.as_str());
            let length = cidr.get("length").and_then(|l| l.as_u64());
            if let (Some(prefix), Some(length)) = (prefix, length) {
                identity.cidrs.push(format!("{}/{}", prefix, length));
            }
        }
    }

    identity.parent_handle = doc
        .get("parentHandle")
        .and_then(|v| v.as_str())
        .map(str::to_string);

    identity
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table() -> RegistrarTable {
        RegistrarTable::builtin()
    }

    #[test]
    fn test_repair_array_confusion() {
        let mut confused = json!({
            "rdapConformance": {"0": "rdap_level_0"},
            "entities": {
                "0": {"handle": "first"},
                "1": {"handle": "second"},
            },
            "status": {"0": "active"},
        });
        repair_document(&mut confused);

        let entities = collect_entities(&confused);
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0]["handle"], "first");
        assert_eq!(entities[1]["handle"], "second");
        assert_eq!(document_statuses(&confused), vec!["ok"]);
    }

    #[test]
    fn test_repair_leaves_clean_documents_alone() {
        let mut clean = json!({
            "rdapConformance": ["rdap_level_0"],
            "handle": {"0": "looks numeric but must survive"},
        });
        let before = clean.clone();
        repair_document(&mut clean);
        assert_eq!(clean, before);
    }

    #[test]
    fn test_collect_entities_tolerates_shapes() {
        let doc = json!({
            "entities": [{"handle": "a"}],
            "entity": {"handle": "b"},
        });
        assert_eq!(collect_entities(&doc).len(), 2);

        let none = json!({});
        assert!(collect_entities(&none).is_empty());
    }

    #[test]
    fn test_registrar_via_public_identifier() {
        let doc = json!({
            "entities": [{
                "roles": ["registrar"],
                "publicIds": [{"type": "IANA Registrar ID", "identifier": "146"}],
                "vcardArray": ["vcard", [["fn", {}, "text", "Ignored"]]],
            }]
        });
        let candidates = registrar_candidates(&doc, "com", &table());
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].identity.id, 146);
        assert_eq!(candidates[0].identity.name.as_deref(), Some("GoDaddy.com, LLC"));
    }

    #[test]
    fn test_registrar_public_id_miscased_and_single_object() {
        let doc = json!({
            "entities": [{
                "roles": ["registrar"],
                "publicIDs": {"type": "IANA RegistrarID", "identifier": "1068"},
            }]
        });
        let candidates = registrar_candidates(&doc, "com", &table());
        assert_eq!(candidates[0].identity.id, 1068);
    }

    #[test]
    fn test_registrar_unknown_id_falls_back_to_vcard_name() {
        let doc = json!({
            "entities": [{
                "roles": ["registrar"],
                "publicIds": [{"type": "Registry Identifier", "identifier": "424242"}],
                "vcardArray": ["vcard", [["fn", {}, "text", "Obscure Registry Co"]]],
            }]
        });
        let candidates = registrar_candidates(&doc, "com", &table());
        assert_eq!(candidates[0].identity.id, 424242);
        assert_eq!(candidates[0].identity.name.as_deref(), Some("Obscure Registry Co"));
    }

    #[test]
    fn test_registrar_ca_style_marker() {
        let doc = json!({
            "entities": [{
                "roles": ["registrar"],
                "vcardArray": ["vcard", [
                    ["version", {}, "text", "4.0"],
                    ["kind", {}, "text", "registrar"],
                    ["fn", {}, "text", "Northern Names Inc"],
                ]],
            }]
        });
        let candidates = registrar_candidates(&doc, "ca", &table());
        assert_eq!(candidates[0].identity.id, 0);
        assert_eq!(candidates[0].identity.name.as_deref(), Some("Northern Names Inc"));
    }

    #[test]
    fn test_registrar_si_style_numeric_handle() {
        let doc = json!({
            "entities": [{
                "roles": ["registrar"],
                "handle": "146",
                "vcardArray": ["vcard", [
                    ["version", {}, "text", "4.0"],
                    ["adr", {}, "text", ""],
                    ["fn", {}, "text", "Some Local Name"],
                ]],
            }]
        });
        let candidates = registrar_candidates(&doc, "si", &table());
        assert_eq!(candidates[0].identity.id, 146);
        assert_eq!(candidates[0].identity.name.as_deref(), Some("GoDaddy.com, LLC"));
    }

    #[test]
    fn test_registrar_ar_style_bare_handle() {
        let doc = json!({
            "entities": [{
                "roles": ["registrar"],
                "handle": "nicar-registrar-77",
            }]
        });
        let candidates = registrar_candidates(&doc, "ar", &table());
        assert_eq!(candidates[0].identity.id, 0);
        assert_eq!(
            candidates[0].identity.name.as_deref(),
            Some("nicar-registrar-77")
        );
    }

    #[test]
    fn test_technical_role_counts_only_for_is() {
        let doc = json!({
            "entities": [{
                "roles": ["technical"],
                "handle": "tech-handle",
            }]
        });
        assert_eq!(registrar_candidates(&doc, "is", &table()).len(), 1);
        assert!(registrar_candidates(&doc, "com", &table()).is_empty());
    }

    #[test]
    fn test_entity_email_and_abuse_email() {
        let doc = json!({
            "entities": [{
                "roles": ["registrar"],
                "handle": "r1",
                "vcardArray": ["vcard", [["email", {}, "text", "info@registrar.example"]]],
                "entities": [{
                    "roles": ["abuse"],
                    "vcardArray": ["vcard", [["email", {}, "text", "abuse@registrar.example"]]],
                }],
            }]
        });
        let candidates = registrar_candidates(&doc, "com", &table());
        assert_eq!(candidates[0].email.as_deref(), Some("info@registrar.example"));
        assert_eq!(
            candidates[0].abuse_email.as_deref(),
            Some("abuse@registrar.example")
        );
    }

    #[test]
    fn test_candidate_ranking_latest_registration_wins() {
        let thin = json!({
            "entities": [{
                "roles": ["registrar"],
                "handle": "old-registrar",
                "events": [{"eventAction": "registration", "eventDate": "2015-01-01T00:00:00Z"}],
            }]
        });
        let thick = json!({
            "entities": [{
                "roles": ["registrar"],
                "handle": "new-registrar",
                "events": [{"eventAction": "registration", "eventDate": "2022-01-01T00:00:00Z"}],
            }]
        });
        let mut record = CanonicalRecord::found("example.com");
        merge_documents(&thin, Some(&thick), "com", &table(), &mut record);
        assert_eq!(record.registrar.name.as_deref(), Some("new-registrar"));
    }

    #[test]
    fn test_status_delta_client_server_equivalence() {
        let (union, delta) = reconcile_statuses(
            &["clientHold".to_string()],
            &["serverHold".to_string()],
        );
        assert_eq!(union, vec!["clientHold", "serverHold"]);
        assert!(delta.is_empty(), "hold prefix swap must not produce a delta");
    }

    #[test]
    fn test_status_delta_one_sided() {
        let (union, delta) = reconcile_statuses(&["ok".to_string()], &[]);
        assert_eq!(union, vec!["ok"]);
        assert_eq!(
            delta,
            vec![StatusDelta {
                status: "ok".to_string(),
                thin: true,
                thick: false,
            }]
        );
    }

    #[test]
    fn test_merge_prefers_thick_nameservers_and_events() {
        let thin = json!({
            "nameservers": [{"ldhName": "NS-THIN.EXAMPLE.COM"}],
            "events": [{"eventAction": "expiration", "eventDate": "2024-01-01T00:00:00Z"}],
        });
        let thick = json!({
            "nameservers": [{"ldhName": "NS2.EXAMPLE.COM"}, {"ldhName": "NS1.EXAMPLE.COM"}],
            "events": [{"eventAction": "expiration", "eventDate": "2025-01-01T00:00:00Z"}],
        });
        let mut record = CanonicalRecord::found("example.com");
        merge_documents(&thin, Some(&thick), "com", &table(), &mut record);
        assert_eq!(record.nameservers, vec!["ns1.example.com", "ns2.example.com"]);
        assert_eq!(
            record.ts.expires.unwrap().format("%Y").to_string(),
            "2025"
        );
    }

    #[test]
    fn test_merge_without_thick_uses_thin() {
        let thin = json!({
            "status": ["active"],
            "nameservers": [{"ldhName": "ns1.example.org"}],
            "events": [{"eventAction": "registration", "eventDate": "2019-05-05T00:00:00Z"}],
        });
        let mut record = CanonicalRecord::found("example.org");
        merge_documents(&thin, None, "org", &table(), &mut record);
        assert_eq!(record.status, vec!["ok"]);
        assert_eq!(record.nameservers, vec!["ns1.example.org"]);
        assert_eq!(record.ts.created.unwrap().format("%Y").to_string(), "2019");
        // statuses only on the thin side still produce a delta
        assert_eq!(record.status_delta.len(), 1);
    }

    #[test]
    fn test_reseller_extraction() {
        let doc = json!({
            "entities": [{
                "roles": ["reseller"],
                "vcardArray": ["vcard", [["fn", {}, "text", "Resell Co"]]],
            }]
        });
        assert_eq!(reseller_name(&doc).as_deref(), Some("Resell Co"));
    }

    #[test]
    fn test_thick_url_from_links_skips_self() {
        let doc = json!({
            "links": [
                {
                    "rel": "self",
                    "type": "application/rdap+json",
                    "href": "https://rdap.verisign.com/com/v1/domain/example.com"
                },
                {
                    "rel": "related",
                    "type": "application/rdap+json",
                    "href": "https://rdap.godaddy.com/v1/domain/example.com"
                },
            ]
        });
        assert_eq!(
            thick_url_from_links(&doc).as_deref(),
            Some("https://rdap.godaddy.com/v1/domain/example.com")
        );
    }

    #[test]
    fn test_thick_url_ignores_non_rdap_related() {
        let doc = json!({
            "links": [
                {"rel": "related", "type": "text/html", "href": "https://registrar.example"},
            ]
        });
        assert!(thick_url_from_links(&doc).is_none());
    }

    #[test]
    fn test_extract_ip_identity() {
        let doc = json!({
            "startAddress": "192.0.2.0",
            "endAddress": "192.0.2.255",
            "parentHandle": "NET-192-0-0-0-1",
            "cidr0_cidrs": [{"v4prefix": "192.0.2.0", "length": 24}],
        });
        let identity = extract_ip_identity(&doc);
        assert_eq!(identity.range.as_deref(), Some("192.0.2.0 - 192.0.2.255"));
        assert_eq!(identity.cidrs, vec!["192.0.2.0/24"]);
        assert_eq!(identity.parent_handle.as_deref(), Some("NET-192-0-0-0-1"));
    }
}
