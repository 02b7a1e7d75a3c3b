//! Error handling for registration-data resolution.
//!
//! This module defines the error type covering every way a lookup can fail,
//! from malformed input to upstream servers that answer with garbage.
//! Each variant maps onto the status code carried by a failed
//! [`CanonicalRecord`](crate::types::CanonicalRecord), so the resolver can
//! turn any error into a well-formed output record instead of propagating it.

use std::fmt;

/// Main error type for registration-data lookups.
#[derive(Debug, Clone)]
pub enum ResolveError {
    /// Malformed or oversized lookup target
    InvalidTarget {
        target: String,
        reason: String,
    },

    /// No RDAP endpoint and no legacy WHOIS server configured for the TLD
    NoServerConfigured {
        tld: String,
    },

    /// Explicit "no match" signal from an RDAP HTTP status or legacy text pattern
    NotFound {
        target: String,
        message: String,
    },

    /// DNS, HTTP, or raw-socket failure, message preserved from the underlying error
    Transport {
        message: String,
        source: Option<String>,
    },

    /// RDAP server answered with a non-success status
    Rdap {
        target: String,
        message: String,
        status_code: Option<u16>,
    },

    /// A network operation exceeded its deadline
    Timeout {
        operation: String,
        duration: std::time::Duration,
    },

    /// Response body could not be parsed
    Parse {
        message: String,
    },

    /// Configuration errors (invalid settings, unreadable config files)
    Config {
        message: String,
    },

    /// Generic internal errors that don't fit other categories
    Internal {
        message: String,
    },
}

impl ResolveError {
    /// Create a new invalid-target error.
    pub fn invalid_target<T: Into<String>, R: Into<String>>(target: T, reason: R) -> Self {
        Self::InvalidTarget {
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// Create a new no-server-configured error.
    pub fn no_server<T: Into<String>>(tld: T) -> Self {
        Self::NoServerConfigured { tld: tld.into() }
    }

    /// Create a new not-found error.
    pub fn not_found<T: Into<String>, M: Into<String>>(target: T, message: M) -> Self {
        Self::NotFound {
            target: target.into(),
            message: message.into(),
        }
    }

    /// Create a new transport error.
    pub fn transport<M: Into<String>>(message: M) -> Self {
        Self::Transport {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new transport error with source information.
    pub fn transport_with_source<M: Into<String>, S: Into<String>>(message: M, source: S) -> Self {
        Self::Transport {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a new RDAP error.
    pub fn rdap<T: Into<String>, M: Into<String>>(target: T, message: M) -> Self {
        Self::Rdap {
            target: target.into(),
            message: message.into(),
            status_code: None,
        }
    }

    /// Create a new RDAP error with HTTP status code.
    pub fn rdap_with_status<T: Into<String>, M: Into<String>>(
        target: T,
        message: M,
        status_code: u16,
    ) -> Self {
        Self::Rdap {
            target: target.into(),
            message: message.into(),
            status_code: Some(status_code),
        }
    }

    /// Create a new timeout error.
    pub fn timeout<O: Into<String>>(operation: O, duration: std::time::Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a new parse error.
    pub fn parse<M: Into<String>>(message: M) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new internal error.
    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// The HTTP-style status code a failed record carries for this error.
    ///
    /// - `InvalidTarget` → 400
    /// - `NotFound` → 404
    /// - `NoServerConfigured` → 405
    /// - everything else → 500
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidTarget { .. } => 400,
            Self::NotFound { .. } => 404,
            Self::NoServerConfigured { .. } => 405,
            Self::Rdap {
                status_code: Some(code),
                ..
            } => *code,
            _ => 500,
        }
    }
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTarget { target, reason } => {
                write!(f, "Invalid target '{}': {}", target, reason)
            }
            Self::NoServerConfigured { tld } => {
                write!(f, "No RDAP or WHOIS server configured for TLD '{}'", tld)
            }
            Self::NotFound { target, message } => {
                write!(f, "No record for '{}': {}", target, message)
            }
            Self::Transport { message, source } => {
                if let Some(source) = source {
                    write!(f, "Transport error: {} (source: {})", message, source)
                } else {
                    write!(f, "Transport error: {}", message)
                }
            }
            Self::Rdap {
                target,
                message,
                status_code,
            } => {
                if let Some(code) = status_code {
                    write!(f, "RDAP error for '{}' (HTTP {}): {}", target, code, message)
                } else {
                    write!(f, "RDAP error for '{}': {}", target, message)
                }
            }
            Self::Timeout {
                operation,
                duration,
            } => {
                write!(f, "Timeout after {:?} during: {}", duration, operation)
            }
            Self::Parse { message } => {
                write!(f, "Parse error: {}", message)
            }
            Self::Config { message } => {
                write!(f, "Configuration error: {}", message)
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for ResolveError {}

// From conversions for the transport and parsing layers
impl From<reqwest::Error> for ResolveError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::timeout("HTTP request", std::time::Duration::from_secs(30))
        } else if err.is_connect() {
            Self::transport_with_source("Connection failed", err.to_string())
        } else {
            Self::transport_with_source("HTTP request failed", err.to_string())
        }
    }
}

impl From<serde_json::Error> for ResolveError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse {
            message: format!("JSON parsing failed: {}", err),
        }
    }
}

impl From<std::io::Error> for ResolveError {
    fn from(err: std::io::Error) -> Self {
        Self::Transport {
            message: format!("I/O error: {}", err),
            source: None,
        }
    }
}

impl From<regex::Error> for ResolveError {
    fn from(err: regex::Error) -> Self {
        Self::Internal {
            message: format!("Regex error: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_match_taxonomy() {
        assert_eq!(ResolveError::invalid_target("x", "bad").status_code(), 400);
        assert_eq!(ResolveError::not_found("x", "no match").status_code(), 404);
        assert_eq!(ResolveError::no_server("zz").status_code(), 405);
        assert_eq!(ResolveError::transport("refused").status_code(), 500);
        assert_eq!(ResolveError::parse("bad json").status_code(), 500);
        assert_eq!(
            ResolveError::rdap_with_status("x", "teapot", 418).status_code(),
            418
        );
    }

    #[test]
    fn test_display_includes_context() {
        let err = ResolveError::invalid_target("big..name", "too long");
        assert!(err.to_string().contains("big..name"));

        let err = ResolveError::transport_with_source("DNS failed", "no addresses");
        let text = err.to_string();
        assert!(text.contains("DNS failed"));
        assert!(text.contains("no addresses"));
    }
}
