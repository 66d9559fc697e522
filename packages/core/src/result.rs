//! The outcome of one submission and its caller-facing rendering.

use std::fmt;

/// What happened to the optional triple-store mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripleStoreOutcome {
    NotAttempted,
    Stored,
    Failed,
}

impl TripleStoreOutcome {
    pub fn from_attempt(stored: bool) -> Self {
        if stored {
            TripleStoreOutcome::Stored
        } else {
            TripleStoreOutcome::Failed
        }
    }
}

/// The result of a successful submission.
///
/// Fields are private so a result cannot change once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionResult {
    location: String,
    servers: Vec<String>,
    triple_store: TripleStoreOutcome,
}

impl SubmissionResult {
    pub fn new(
        location: impl Into<String>,
        servers: Vec<String>,
        triple_store: TripleStoreOutcome,
    ) -> Self {
        Self {
            location: location.into(),
            servers,
            triple_store,
        }
    }

    /// The canonical (possibly rewritten) nanopublication URI.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Servers that accepted every unit of the bundle, in target order.
    pub fn servers(&self) -> &[String] {
        &self.servers
    }

    pub fn triple_store(&self) -> TripleStoreOutcome {
        self.triple_store
    }
}

/// Short plain-text summary returned as the response body.
///
/// ```text
/// Nanopublication URI: https://w3id.org/np/RA...
/// Published via servers:
/// - http://server-a:8080
/// - http://server-b:8080
///
/// + Nanopublication has been stored to triple-store
/// ```
impl fmt::Display for SubmissionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Nanopublication URI: {}", self.location)?;
        if !self.servers.is_empty() {
            write!(f, "\nPublished via servers:")?;
        }
        for server in &self.servers {
            write!(f, "\n- {server}")?;
        }
        match self.triple_store {
            TripleStoreOutcome::NotAttempted => Ok(()),
            TripleStoreOutcome::Stored => {
                write!(f, "\n\n+ Nanopublication has been stored to triple-store")
            }
            TripleStoreOutcome::Failed => {
                write!(f, "\n\n! Nanopublication could not be stored to triple-store")
            }
        }
    }
}
