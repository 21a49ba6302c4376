use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::catalog::ShellSpec;

const RECEIPT_VERSION: u32 = 1;

/// Record of the last bootstrap that changed the venv (similar to a lockfile).
///
/// Activation never reads it back; only `status` does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Version of the receipt format
    version: u32,
    /// When the venv was last created or had its dependency installed
    pub bootstrapped_at: String,
    pub platform: String,
    /// Fingerprint of the shell spec that produced this receipt
    pub spec_fingerprint: String,
    pub dependency: DependencyReceipt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyReceipt {
    pub name: String,
    /// Pinned version from the manifest, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested: Option<String>,
    /// Version reported by the probe after bootstrap
    pub installed: String,
}

impl Receipt {
    pub fn new(spec: &ShellSpec, installed_version: &str) -> Self {
        Self {
            version: RECEIPT_VERSION,
            bootstrapped_at: chrono::Utc::now().to_rfc3339(),
            platform: spec.platform.to_string(),
            spec_fingerprint: spec.fingerprint(),
            dependency: DependencyReceipt {
                name: spec.dependency.name.clone(),
                requested: spec.dependency.version.clone(),
                installed: installed_version.to_string(),
            },
        }
    }

    /// Load a receipt if one exists.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read receipt from {:?}", path))?;

        let receipt = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse receipt from {:?}", path))?;
        Ok(Some(receipt))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create receipt directory {:?}", parent))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize receipt")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write receipt to {:?}", path))?;

        Ok(())
    }

    /// Differences between this receipt and the current spec. `live` is the
    /// version probed from the venv right now, preferred over the recorded one.
    pub fn drift(&self, spec: &ShellSpec, live: Option<&str>) -> Vec<String> {
        let mut drift = Vec::new();

        if self.spec_fingerprint != spec.fingerprint() {
            drift.push("shell spec changed since the environment was bootstrapped".to_string());
        }

        if self.dependency.name != spec.dependency.name {
            drift.push(format!(
                "dependency changed from '{}' to '{}'",
                self.dependency.name, spec.dependency.name
            ));
            if let Some(line) = live.and_then(|installed| pin_drift(spec, installed)) {
                drift.push(line);
            }
        } else if let Some(line) =
            pin_drift(spec, live.unwrap_or(&self.dependency.installed))
        {
            drift.push(line);
        }

        drift
    }
}

/// Report a pinned dependency whose installed version differs from the pin.
pub fn pin_drift(spec: &ShellSpec, installed: &str) -> Option<String> {
    let pinned = spec.dependency.version.as_deref()?;
    (pinned != installed).then(|| {
        format!(
            "'{}' is pinned to {} but {} is installed",
            spec.dependency.name, pinned, installed
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::manifest::Manifest;
    use crate::platform::Platform;
    use tempfile::TempDir;

    fn spec(manifest: &Manifest) -> ShellSpec {
        Catalog::builtin()
            .resolve(manifest, Path::new("/work/project"), Platform::X86_64Linux)
            .unwrap()
    }

    #[test]
    fn test_receipt_new() {
        let receipt = Receipt::new(&spec(&Manifest::default()), "0.1.5");
        assert_eq!(receipt.version, RECEIPT_VERSION);
        assert_eq!(receipt.platform, "x86_64-linux");
        assert_eq!(receipt.dependency.name, "skelo");
        assert_eq!(receipt.dependency.requested, None);
        assert_eq!(receipt.dependency.installed, "0.1.5");
        assert!(!receipt.bootstrapped_at.is_empty());
    }

    #[test]
    fn test_receipt_save_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".venv").join("devshell-receipt.toml");

        assert_eq!(Receipt::load(&path).unwrap(), None);

        let receipt = Receipt::new(&spec(&Manifest::default()), "0.1.5");
        receipt.save(&path).unwrap();

        let loaded = Receipt::load(&path).unwrap().unwrap();
        assert_eq!(loaded, receipt);
    }

    #[test]
    fn test_no_drift_for_same_spec() {
        let current = spec(&Manifest::default());
        let receipt = Receipt::new(&current, "0.1.5");
        assert!(receipt.drift(&current, None).is_empty());
    }

    #[test]
    fn test_drift_reports_spec_and_pin_changes() {
        let receipt = Receipt::new(&spec(&Manifest::default()), "0.1.5");

        let mut pinned = Manifest::default();
        pinned.dependency.version = Some("0.2.0".to_string());
        let drift = receipt.drift(&spec(&pinned), None);

        assert_eq!(drift.len(), 2);
        assert!(drift[0].contains("shell spec changed"));
        assert!(drift[1].contains("pinned to 0.2.0 but 0.1.5 is installed"));
    }

    #[test]
    fn test_drift_reports_dependency_swap() {
        let receipt = Receipt::new(&spec(&Manifest::default()), "0.1.5");

        let mut other = Manifest::default();
        other.dependency.name = "glicko2".to_string();
        let drift = receipt.drift(&spec(&other), None);

        assert!(drift
            .iter()
            .any(|line| line.contains("from 'skelo' to 'glicko2'")));
    }

    #[test]
    fn test_drift_prefers_live_version() {
        let mut pinned = Manifest::default();
        pinned.dependency.version = Some("0.2.0".to_string());
        let current = spec(&pinned);
        let receipt = Receipt::new(&current, "0.2.0");

        assert!(receipt.drift(&current, Some("0.2.0")).is_empty());

        let drift = receipt.drift(&current, Some("0.1.5"));
        assert_eq!(drift, vec!["'skelo' is pinned to 0.2.0 but 0.1.5 is installed"]);
    }

    #[test]
    fn test_pin_drift_without_receipt() {
        let mut pinned = Manifest::default();
        pinned.dependency.version = Some("0.2.0".to_string());

        assert_eq!(
            pin_drift(&spec(&pinned), "0.1.5").as_deref(),
            Some("'skelo' is pinned to 0.2.0 but 0.1.5 is installed")
        );
        assert_eq!(pin_drift(&spec(&pinned), "0.2.0"), None);
        assert_eq!(pin_drift(&spec(&Manifest::default()), "0.1.5"), None);
    }
}
