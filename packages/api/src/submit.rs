//! Per-submission overrides for `POST /submit`.

use serde::{Deserialize, Serialize};

/// Query parameters accepted by `POST /submit`.
///
/// Both are optional; absent values fall back to the service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmitQuery {
    /// Comma-separated list of target servers replacing the configured ones.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servers: Option<String>,

    /// `OLD|NEW` rule applied to the reported nanopublication URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri_replace: Option<String>,
}

impl SubmitQuery {
    /// The override server list, with blanks removed. Empty means "use the
    /// configured servers".
    pub fn server_list(&self) -> Vec<String> {
        self.servers
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_comma_separated_servers() {
        let q = SubmitQuery {
            servers: Some("http://a, http://b,,".into()),
            uri_replace: None,
        };
        assert_eq!(q.server_list(), vec!["http://a", "http://b"]);
    }

    #[test]
    fn missing_servers_is_empty() {
        assert!(SubmitQuery::default().server_list().is_empty());
    }
}
