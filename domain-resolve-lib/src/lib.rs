//! # Domain Resolve Library
//!
//! A robust library for resolving domain registration data over RDAP and
//! legacy WHOIS (port 43).
//!
//! Every lookup produces a [`CanonicalRecord`] with a unified shape —
//! registrar identity, reseller, statuses, nameservers, lifecycle
//! timestamps — whether the data came from a structured RDAP document
//! pair or a free-text legacy reply. Failures never escape as errors;
//! they are folded into the record's `status_code`/`error` fields.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use domain_resolve_lib::DomainResolver;
//!
//! #[tokio::main]
//! async fn main() {
//!     let resolver = DomainResolver::new();
//!     let record = resolver.resolve("example.com").await;
//!
//!     println!(
//!         "{}: found={} registrar={:?}",
//!         record.target, record.found, record.registrar.name
//!     );
//! }
//! ```
//!
//! ## Features
//!
//! - **RDAP first**: thin (registry) and thick (registrar) documents,
//!   merged with thick-wins precedence
//! - **Legacy WHOIS fallback**: per-TLD override parsers plus a generic
//!   label-pattern extraction chain
//! - **Registrar identity**: numeric IANA-style IDs and free-text names
//!   unified against one table
//! - **Concurrent lookups**: `resolve_many` / `resolve_stream` with a
//!   configurable concurrency cap

// Re-export main public API types and functions
// This makes them available as domain_resolve_lib::TypeName
pub use config::{
    load_env_config, parse_timeout_string, ConfigManager, DefaultsConfig, EnvConfig, FileConfig,
    OutputConfig,
};
pub use error::ResolveError;
pub use registrars::RegistrarTable;
pub use resolver::DomainResolver;
pub use types::{
    CanonicalRecord, IpIdentity, KeyTimestamps, LegacyServerSpec, LookupTarget, RegistrarIdentity,
    RegistryRoute, ResolveConfig, ScrapePolicy, StatusDelta, TargetKind,
};

// Normalizers are public: callers post-processing their own registry data
// can reuse them directly.
pub use normalize::{
    canonical_status, normalize_nameservers, parse_timestamp, reformat_legacy_date,
};

// Internal modules - these are not part of the public API
mod config;
mod error;
mod normalize;
mod protocols;
mod registrars;
mod resolver;
mod types;
mod utils;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, ResolveError>;

// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
