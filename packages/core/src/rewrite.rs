//! Literal rewriting of reported nanopublication URIs.
//!
//! Deployments that publish through an internal host often want the URI
//! reported to the caller to point at a public host instead. A rule is
//! written as `OLD|NEW` and performs a plain substring replacement.

use std::fmt;

/// Separator between the two halves of a rewrite rule.
pub const REWRITE_SEPARATOR: char = '|';

/// A parsed `OLD|NEW` rewrite rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriRewrite {
    pub old: String,
    pub new: String,
}

impl UriRewrite {
    /// Parse `OLD|NEW`. Returns `None` when the separator is absent.
    ///
    /// Only the first `|` separates; any further `|` belongs to `NEW`.
    pub fn parse(rule: &str) -> Option<Self> {
        let (old, new) = rule.split_once(REWRITE_SEPARATOR)?;
        Some(Self {
            old: old.to_string(),
            new: new.to_string(),
        })
    }

    /// Pick the effective rule for a submission.
    ///
    /// The request-level rule wins when it contains the separator; otherwise
    /// the configured default is used if it does. With neither, no rewrite
    /// applies.
    pub fn resolve(request: Option<&str>, default: Option<&str>) -> Option<Self> {
        request
            .and_then(Self::parse)
            .or_else(|| default.and_then(Self::parse))
    }

    /// Apply the rule to `uri`. An empty `OLD` leaves the URI untouched.
    pub fn apply(&self, uri: &str) -> String {
        if self.old.is_empty() {
            return uri.to_string();
        }
        uri.replace(&self.old, &self.new)
    }
}

impl fmt::Display for UriRewrite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.old, REWRITE_SEPARATOR, self.new)
    }
}
