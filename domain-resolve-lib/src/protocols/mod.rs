//! Protocol implementations for registration-data resolution.
//!
//! This module contains the two acquisition engines — RDAP and legacy
//! WHOIS — plus the static TLD routing tables that decide which one
//! answers for a given target.

/// RDAP (Registration Data Access Protocol) fetch and merge engine
pub mod rdap;

/// Legacy WHOIS (port 43) text extraction engine
pub mod whois;

/// TLD → server routing tables
pub mod routing;

// Re-export commonly used functions and types
pub use rdap::{merge_documents, repair_document, RdapClient};
pub use routing::{rdap_url_is_live, route_for, thin_url, AGGREGATOR_BASE_URL};
pub use whois::LegacyClient;
