//! Registrar identity resolution.
//!
//! Registries identify registrars two different ways: a numeric IANA-style
//! ID, or a free-text name whose spelling drifts per registry. This module
//! unifies both against an injected ID→name table, producing the canonical
//! `{id, name}` pair. Resolution failure is never an error; the ID simply
//! stays at 0.

use crate::types::RegistrarIdentity;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

/// Read-only ID→name table of accredited registrars.
///
/// Safe for concurrent reads; the resolver never mutates it.
#[derive(Debug, Clone, Default)]
pub struct RegistrarTable {
    entries: HashMap<u32, String>,
}

impl RegistrarTable {
    /// Build a table from explicit entries.
    pub fn new(entries: HashMap<u32, String>) -> Self {
        Self { entries }
    }

    /// The built-in table of well-known IANA registrar IDs.
    pub fn builtin() -> Self {
        Self::new(
            BUILTIN_REGISTRARS
                .iter()
                .map(|(id, name)| (*id, (*name).to_string()))
                .collect(),
        )
    }

    /// Look up a registrar name by numeric ID.
    pub fn name_for(&self, id: u32) -> Option<&str> {
        self.entries.get(&id).map(String::as_str)
    }

    /// Resolve a numeric ID into a full identity.
    ///
    /// An unknown ID keeps the number but leaves the name unset.
    pub fn identity_for(&self, id: u32) -> RegistrarIdentity {
        RegistrarIdentity {
            id,
            name: self.name_for(id).map(String::from),
        }
    }

    /// Match a free-text registrar name against the table.
    ///
    /// Tries, in order:
    /// 1. exact string match against a table entry;
    /// 2. word-boundary, case-insensitive substring match of the
    ///    (regex-escaped) extracted name against each entry;
    /// 3. the same substring match using only the portion of the extracted
    ///    name before its first comma.
    ///
    /// Returns the unknown identity (id 0, extracted name kept) when nothing
    /// matches.
    pub fn match_name(&self, extracted: &str) -> RegistrarIdentity {
        let extracted = extracted.trim();
        if extracted.is_empty() {
            return RegistrarIdentity::default();
        }

        if let Some((id, name)) = self
            .entries
            .iter()
            .find(|(_, name)| name.as_str() == extracted)
        {
            return RegistrarIdentity {
                id: *id,
                name: Some(name.clone()),
            };
        }

        if let Some(identity) = self.substring_match(extracted) {
            return identity;
        }

        // Registrar names frequently carry a legal-form suffix after a comma
        // ("GoDaddy.com, LLC"); retry on the part before it.
        if let Some((head, _)) = extracted.split_once(',') {
            if let Some(identity) = self.substring_match(head.trim()) {
                return identity;
            }
        }

        RegistrarIdentity {
            id: 0,
            name: Some(extracted.to_string()),
        }
    }

    fn substring_match(&self, needle: &str) -> Option<RegistrarIdentity> {
        if needle.is_empty() {
            return None;
        }
        let pattern = format!(r"(?i)\b{}\b", regex::escape(needle));
        let re = Regex::new(&pattern).ok()?;

        self.entries
            .iter()
            .find(|(_, name)| re.is_match(name))
            .map(|(id, name)| RegistrarIdentity {
                id: *id,
                name: Some(name.clone()),
            })
    }
}

lazy_static! {
    /// Well-known IANA registrar IDs shipped with the crate.
    static ref BUILTIN_REGISTRARS: Vec<(u32, &'static str)> = vec![
        (2, "Network Solutions, LLC"),
        (9, "Register.com, Inc."),
        (48, "eNom, LLC"),
        (69, "Tucows Domains Inc."),
        (81, "Gandi SAS"),
        (83, "1&1 IONOS SE"),
        (106, "Ascio Technologies, Inc."),
        (120, "Xin Net Technology Corporation"),
        (146, "GoDaddy.com, LLC"),
        (151, "PSI-USA, Inc."),
        (226, "Deutsche Telekom AG"),
        (269, "Key-Systems GmbH"),
        (292, "MarkMonitor Inc."),
        (299, "CSC Corporate Domains, Inc."),
        (303, "PDR Ltd. d/b/a PublicDomainRegistry.com"),
        (433, "OVH sas"),
        (468, "Moniker Online Services LLC"),
        (472, "Dynadot Inc."),
        (609, "Sav.com, LLC"),
        (625, "Name.com, Inc."),
        (895, "Squarespace Domains II LLC"),
        (940, "Instra Corporation Pty Ltd"),
        (955, "Launchpad.com Inc."),
        (1068, "NameCheap, Inc."),
        (1086, "Domain.com, LLC"),
        (1328, "RegistryGate GmbH"),
        (1387, "1API GmbH"),
        (1441, "TurnCommerce, Inc. DBA NameBright.com"),
        (1479, "Namesilo, LLC"),
        (1556, "Chengdu West Dimension Digital Technology Co., Ltd."),
        (1599, "Alibaba Cloud Computing Ltd. d/b/a HiChina"),
        (1861, "Porkbun LLC"),
        (1910, "Cloudflare, Inc."),
        (3806, "Hostinger operations, UAB"),
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        let table = RegistrarTable::builtin();
        let identity = table.match_name("GoDaddy.com, LLC");
        assert_eq!(identity.id, 146);
        assert_eq!(identity.name.as_deref(), Some("GoDaddy.com, LLC"));
    }

    #[test]
    fn test_substring_match_with_suffix() {
        let table = RegistrarTable::builtin();
        // Legacy replies append the registrar URL after the name
        let identity = table.match_name("GoDaddy.com, LLC (http://www.godaddy.com)");
        assert_eq!(identity.id, 146);
    }

    #[test]
    fn test_before_comma_retry() {
        let table = RegistrarTable::builtin();
        // "GoDaddy.com" alone must still hit the "GoDaddy.com, LLC" entry
        let identity = table.match_name("GoDaddy.com");
        assert_eq!(identity.id, 146);
    }

    #[test]
    fn test_no_match_keeps_name_id_zero() {
        let table = RegistrarTable::builtin();
        let identity = table.match_name("Totally Unknown Registrar Ltd");
        assert_eq!(identity.id, 0);
        assert_eq!(
            identity.name.as_deref(),
            Some("Totally Unknown Registrar Ltd")
        );
    }

    #[test]
    fn test_empty_name_is_unknown() {
        let table = RegistrarTable::builtin();
        let identity = table.match_name("   ");
        assert_eq!(identity.id, 0);
        assert!(identity.name.is_none());
    }

    #[test]
    fn test_identity_for_unknown_id() {
        let table = RegistrarTable::builtin();
        let identity = table.identity_for(999999);
        assert_eq!(identity.id, 999999);
        assert!(identity.name.is_none());

        let known = table.identity_for(1068);
        assert_eq!(known.name.as_deref(), Some("NameCheap, Inc."));
    }

    #[test]
    fn test_regex_metacharacters_in_extracted_name() {
        let table = RegistrarTable::builtin();
        // Metacharacters must be escaped, never interpreted
        let identity = table.match_name("We*rd [Registrar) Ltd");
        assert_eq!(identity.id, 0);
    }
}
