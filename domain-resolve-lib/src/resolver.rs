//! Main resolver implementation.
//!
//! This module provides the primary `DomainResolver` struct that
//! orchestrates registration-data lookups: routing each target to RDAP or
//! legacy WHOIS, driving the thin/thick fetch sequence, and assembling the
//! canonical output record from whichever engine ran.

use crate::protocols::rdap::{extract_ip_identity, thick_url_from_links};
use crate::protocols::{
    merge_documents, rdap_url_is_live, route_for, thin_url, LegacyClient, RdapClient,
    AGGREGATOR_BASE_URL,
};
use crate::registrars::RegistrarTable;
use crate::types::{CanonicalRecord, LookupTarget, ResolveConfig, TargetKind};
use crate::utils::last_label;
use futures::stream::{Stream, StreamExt};
use serde_json::Value;
use std::pin::Pin;

/// Top-level resolver coordinating registration-data lookups.
///
/// The `DomainResolver` handles all aspects of a lookup:
/// - Routing (RDAP vs legacy WHOIS per TLD)
/// - The thin/thick RDAP fetch sequence
/// - Legacy acquisition and text extraction
/// - Registrar identity resolution
///
/// Every lookup yields a [`CanonicalRecord`]; failures are folded into the
/// record's `status_code`/`error` fields, never raised to the caller.
///
/// # Example
///
/// ```rust,no_run
/// use domain_resolve_lib::DomainResolver;
///
/// #[tokio::main]
/// async fn main() {
///     let resolver = DomainResolver::new();
///     let record = resolver.resolve("example.com").await;
///     println!("{}: found={}", record.target, record.found);
/// }
/// ```
pub struct DomainResolver {
    /// Configuration settings for this resolver instance
    config: ResolveConfig,
    /// RDAP client for the structured path
    rdap: RdapClient,
    /// Legacy WHOIS client for the free-text fallback path
    legacy: LegacyClient,
    /// Read-only ID→name registrar table
    registrars: RegistrarTable,
}

impl DomainResolver {
    /// Create a resolver with default configuration and the built-in
    /// registrar table.
    pub fn new() -> Self {
        Self::with_config(ResolveConfig::default())
    }

    /// Create a resolver with custom configuration.
    ///
    /// # Example
    ///
    /// ```rust
    /// use domain_resolve_lib::{DomainResolver, ResolveConfig};
    /// use std::time::Duration;
    ///
    /// let config = ResolveConfig::default()
    ///     .with_thin_only(true)
    ///     .with_rdap_timeout(Duration::from_secs(5));
    /// let resolver = DomainResolver::with_config(config);
    /// ```
    pub fn with_config(config: ResolveConfig) -> Self {
        let rdap = RdapClient::with_timeout(config.rdap_timeout)
            .expect("Failed to create RDAP client");
        let legacy = LegacyClient::new(config.legacy_timeout, config.scrape_policy)
            .expect("Failed to create legacy WHOIS client");

        Self {
            config,
            rdap,
            legacy,
            registrars: RegistrarTable::builtin(),
        }
    }

    /// Replace the built-in registrar table.
    pub fn with_registrar_table(mut self, table: RegistrarTable) -> Self {
        self.registrars = table;
        self
    }

    /// Resolve registration data for a single target.
    ///
    /// The target may be a domain name or an IP literal. This never fails:
    /// invalid input, routing gaps, network errors, and not-found replies
    /// all come back as a record with `found == false` and an appropriate
    /// `status_code`.
    pub async fn resolve(&self, raw: &str) -> CanonicalRecord {
        match self.resolve_inner(raw).await {
            Ok(record) => record,
            Err(e) => CanonicalRecord::from_error(raw.trim(), &e),
        }
    }

    /// Resolve many targets concurrently, preserving input order.
    ///
    /// Concurrency is capped by the configured limit; each element is an
    /// independent record, so one target's failure never affects another.
    pub async fn resolve_many(&self, targets: &[String]) -> Vec<CanonicalRecord> {
        futures::stream::iter(targets)
            .map(|target| self.resolve(target))
            .buffered(self.config.concurrency)
            .collect()
            .await
    }

    /// Resolve many targets and yield records as they complete.
    ///
    /// Completion order is arrival order, not input order; use
    /// [`resolve_many`](Self::resolve_many) when order matters.
    pub fn resolve_stream<'a>(
        &'a self,
        targets: &'a [String],
    ) -> Pin<Box<dyn Stream<Item = CanonicalRecord> + Send + 'a>> {
        let stream = futures::stream::iter(targets)
            .map(|target| self.resolve(target))
            .buffer_unordered(self.config.concurrency);
        Box::pin(stream)
    }

    async fn resolve_inner(&self, raw: &str) -> Result<CanonicalRecord, crate::ResolveError> {
        let target = LookupTarget::parse(raw)?;
        tracing::debug!(target = target.name(), kind = ?target.kind(), "resolving");

        // IP literals have no TLD to route on; the aggregator handles them.
        if target.kind() == TargetKind::Ip {
            return self.resolve_rdap(&target, AGGREGATOR_BASE_URL).await;
        }

        let route = route_for(target.name());

        if let Some(base) = &route.base_url {
            if rdap_url_is_live(base, self.config.rdap_timeout).await {
                return self.resolve_rdap(&target, base).await;
            }
            tracing::debug!(target = target.name(), base, "routed RDAP host is dead");
        }

        if route.legacy.is_some() {
            return Ok(self
                .legacy
                .lookup(&target, route.legacy.as_ref(), &self.registrars)
                .await);
        }

        tracing::debug!(target = target.name(), "no route, using aggregator");
        self.resolve_rdap(&target, AGGREGATOR_BASE_URL).await
    }

    /// The RDAP path: thin fetch, optional thick fetch, merge.
    async fn resolve_rdap(
        &self,
        target: &LookupTarget,
        base_url: &str,
    ) -> Result<CanonicalRecord, crate::ResolveError> {
        let segment = target.kind().rdap_segment();
        let url = thin_url(base_url, segment, target.name());

        // A failed thin fetch is final unless an override server remains to
        // be tried for the thick document.
        let thin = match self.rdap.fetch_document(&url, target.name()).await {
            Ok(doc) => Some(doc),
            Err(e) if self.config.override_server.is_some() => {
                tracing::debug!(target = target.name(), error = %e, "thin fetch failed, override pending");
                None
            }
            Err(e) => return Ok(CanonicalRecord::from_error(target.name(), &e)),
        };

        let thick = if self.config.thin_only {
            None
        } else {
            let thick_url = thin
                .as_ref()
                .and_then(thick_url_from_links)
                .or_else(|| {
                    self.config
                        .override_server
                        .as_deref()
                        .map(|server| thin_url(&ensure_scheme(server), segment, target.name()))
                });

            match thick_url {
                // Thick failures degrade silently to a thin-only merge
                Some(url) => self.rdap.fetch_document(&url, target.name()).await.ok(),
                None => None,
            }
        };

        if thin.is_none() && thick.is_none() {
            return Ok(CanonicalRecord::failure(
                target.name(),
                500,
                "No RDAP document obtained from routed or override server",
            ));
        }

        let mut record = CanonicalRecord::found(target.name());
        let thin_doc = thin.unwrap_or(Value::Null);
        merge_documents(
            &thin_doc,
            thick.as_ref(),
            last_label(target.name()),
            &self.registrars,
            &mut record,
        );

        if target.kind() == TargetKind::Ip {
            let identity = extract_ip_identity(&thin_doc);
            if !identity.is_empty() {
                record.identity = Some(identity);
            }
        }

        Ok(record)
    }
}

impl Default for DomainResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Accept an override server given with or without a scheme.
fn ensure_scheme(server: &str) -> String {
    if server.starts_with("http://") || server.starts_with("https://") {
        server.trim_end_matches('/').to_string()
    } else {
        format!("https://{}", server.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_scheme() {
        assert_eq!(ensure_scheme("rdap.example.net"), "https://rdap.example.net");
        assert_eq!(
            ensure_scheme("https://rdap.example.net/"),
            "https://rdap.example.net"
        );
        assert_eq!(
            ensure_scheme("http://rdap.example.net"),
            "http://rdap.example.net"
        );
    }

    #[tokio::test]
    async fn test_invalid_target_becomes_400_record() {
        let resolver = DomainResolver::new();
        let record = resolver.resolve("   ").await;
        assert!(!record.found);
        assert_eq!(record.status_code, 400);
        assert!(record.error.is_some());
    }

    #[tokio::test]
    async fn test_oversized_target_becomes_400_record() {
        let resolver = DomainResolver::new();
        let long = format!("{}.com", "a".repeat(300));
        let record = resolver.resolve(&long).await;
        assert_eq!(record.status_code, 400);
    }

    #[tokio::test]
    async fn test_resolve_many_preserves_order_and_isolation() {
        let resolver = DomainResolver::new();
        let targets = vec!["   ".to_string(), "".to_string()];
        let records = resolver.resolve_many(&targets).await;
        assert_eq!(records.len(), 2);
        for record in records {
            assert!(!record.found);
            assert_eq!(record.status_code, 400);
        }
    }
}
