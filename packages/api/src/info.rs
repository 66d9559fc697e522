//! Service information document — `GET /`.

use serde::{Deserialize, Serialize};

/// Build information about a running submission service.
///
/// ```json
/// {
///   "name": "Nanopublication Submission Service",
///   "packageVersion": "0.1.0",
///   "version": "unknown",
///   "builtAt": "unknown"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInfo {
    pub name: String,
    pub package_version: String,
    /// Deployment version, `"unknown"` when not stamped at build time.
    pub version: String,
    /// Build timestamp, `"unknown"` when not stamped at build time.
    pub built_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uses_camel_case_keys() {
        let info = ServiceInfo {
            name: "svc".into(),
            package_version: "1.0.0".into(),
            version: "unknown".into(),
            built_at: "unknown".into(),
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["packageVersion"], "1.0.0");
        assert_eq!(json["builtAt"], "unknown");
    }
}
