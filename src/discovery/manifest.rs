// src/discovery/manifest.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::errors::Result;

/// Decides whether manifest contents declare a named capability.
pub trait ManifestReader: Send + Sync + std::fmt::Debug {
    /// `Err` means the manifest could not be parsed at all.
    fn declares(&self, contents: &str, capability: &str) -> Result<bool>;
}

/// `package.json`: the capability is a non-empty `scripts.<name>` entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct PackageJsonManifest;

#[derive(Debug, Deserialize)]
struct PackageJson {
    #[serde(default)]
    scripts: BTreeMap<String, serde_json::Value>,
}

impl ManifestReader for PackageJsonManifest {
    fn declares(&self, contents: &str, capability: &str) -> Result<bool> {
        let manifest: PackageJson =
            serde_json::from_str(contents).map_err(anyhow::Error::from)?;

        Ok(manifest
            .scripts
            .get(capability)
            .and_then(|script| script.as_str())
            .is_some_and(|script| !script.trim().is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_script_is_detected() {
        let json = r#"{ "name": "shared", "scripts": { "build": "tsc", "verify": "npm run lint && npm test" } }"#;
        assert!(PackageJsonManifest.declares(json, "verify").unwrap());
    }

    #[test]
    fn missing_or_blank_script_is_not_a_capability() {
        assert!(!PackageJsonManifest
            .declares(r#"{ "scripts": { "test": "jest" } }"#, "verify")
            .unwrap());
        assert!(!PackageJsonManifest
            .declares(r#"{ "scripts": { "verify": "  " } }"#, "verify")
            .unwrap());
        assert!(!PackageJsonManifest
            .declares(r#"{ "name": "no-scripts" }"#, "verify")
            .unwrap());
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(PackageJsonManifest.declares("{ not json", "verify").is_err());
    }
}
