use anyhow::Result;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::BootstrapError;
use crate::manifest::{Dependency, Manifest, ToolSpecToml};
use crate::platform::Platform;

/// Position a tool occupies in the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolRole {
    Interpreter,
    Formatter,
}

impl fmt::Display for ToolRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolRole::Interpreter => write!(f, "interpreter"),
            ToolRole::Formatter => write!(f, "formatter"),
        }
    }
}

/// A tool pinned to a version for one platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolPin {
    pub role: ToolRole,
    pub name: String,
    pub version: String,
    /// Executable names to look up, most specific first.
    pub binaries: Vec<String>,
}

impl ToolPin {
    pub fn binary(&self) -> &str {
        self.binaries.first().map(String::as_str).unwrap_or(&self.name)
    }

    /// The pin as an installable package, e.g. `black==24.8.0`.
    pub fn package(&self) -> Dependency {
        let mut package = Dependency::new(&self.name);
        package.version = Some(self.version.clone());
        package
    }
}

/// The declared tool set of a shell for one platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShellSpec {
    pub platform: Platform,
    /// Interpreter first, then formatter.
    pub tools: Vec<ToolPin>,
    pub dependency: Dependency,
    pub venv_dir: PathBuf,
}

impl ShellSpec {
    pub fn interpreter(&self) -> Option<&ToolPin> {
        self.tool(ToolRole::Interpreter)
    }

    pub fn formatter(&self) -> Option<&ToolPin> {
        self.tool(ToolRole::Formatter)
    }

    fn tool(&self, role: ToolRole) -> Option<&ToolPin> {
        self.tools.iter().find(|tool| tool.role == role)
    }

    /// Hex SHA-256 of the spec, used to notice changes since the last bootstrap.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hash_field(&mut hasher, self.platform.as_str());
        for tool in &self.tools {
            hash_field(&mut hasher, &tool.role.to_string());
            hash_field(&mut hasher, &tool.name);
            hash_field(&mut hasher, &tool.version);
        }
        hash_field(&mut hasher, &self.dependency.requirement());
        hash_field(&mut hasher, &self.dependency.module);
        hash_field(&mut hasher, &self.venv_dir.to_string_lossy());
        hex::encode(hasher.finalize())
    }
}

/// Length-prefixed, so adjacent fields cannot run into each other.
fn hash_field(hasher: &mut Sha256, value: &str) {
    hasher.update((value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}

type BinaryNames = fn(&str) -> Vec<String>;

#[derive(Clone)]
struct CatalogEntry {
    role: ToolRole,
    default_version: &'static str,
    platforms: &'static [Platform],
    binaries: BinaryNames,
}

/// Tool-name to binary lookup for each supported platform.
#[derive(Clone)]
pub struct Catalog {
    entries: BTreeMap<&'static str, CatalogEntry>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn python_binaries(version: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut parts = version.split('.');
    if let (Some(major), Some(minor)) = (parts.next(), parts.next()) {
        names.push(format!("python{major}.{minor}"));
    }
    names.push("python3".to_string());
    names
}

fn black_binaries(_version: &str) -> Vec<String> {
    vec!["black".to_string()]
}

fn ruff_binaries(_version: &str) -> Vec<String> {
    vec!["ruff".to_string()]
}

impl Catalog {
    pub fn builtin() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(
            "python",
            CatalogEntry {
                role: ToolRole::Interpreter,
                default_version: "3.12",
                platforms: &Platform::ALL,
                binaries: python_binaries,
            },
        );
        entries.insert(
            "black",
            CatalogEntry {
                role: ToolRole::Formatter,
                default_version: "24.8.0",
                platforms: &Platform::ALL,
                binaries: black_binaries,
            },
        );
        entries.insert(
            "ruff",
            CatalogEntry {
                role: ToolRole::Formatter,
                default_version: "0.6.9",
                platforms: &Platform::ALL,
                binaries: ruff_binaries,
            },
        );
        Self { entries }
    }

    /// Role a catalog tool can fill, if the catalog knows it.
    pub fn role_of(&self, name: &str) -> Option<ToolRole> {
        self.entries.get(name).map(|entry| entry.role)
    }

    pub fn tool_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }

    fn pin(
        &self,
        role: ToolRole,
        spec: &ToolSpecToml,
        platform: Platform,
    ) -> Result<ToolPin, BootstrapError> {
        let unavailable = || BootstrapError::ToolUnavailable {
            name: spec.name.clone(),
            platform: platform.to_string(),
        };

        let entry = self.entries.get(spec.name.as_str()).ok_or_else(unavailable)?;
        if !entry.platforms.contains(&platform) {
            return Err(unavailable());
        }
        if entry.role != role {
            return Err(BootstrapError::RoleMismatch {
                name: spec.name.clone(),
                expected: role.to_string(),
                actual: entry.role.to_string(),
            });
        }

        let version = spec
            .version
            .clone()
            .unwrap_or_else(|| entry.default_version.to_string());

        Ok(ToolPin {
            role,
            name: spec.name.clone(),
            binaries: (entry.binaries)(&version),
            version,
        })
    }

    /// Resolve the shell for `platform`. Touches neither the filesystem nor
    /// the network.
    pub fn resolve(
        &self,
        manifest: &Manifest,
        project_root: &Path,
        platform: Platform,
    ) -> Result<ShellSpec> {
        let systems = manifest.supported_systems()?;
        if !systems.contains(&platform) {
            return Err(BootstrapError::UnsupportedPlatform {
                platform: platform.to_string(),
                supported: systems
                    .iter()
                    .map(|p| p.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            }
            .into());
        }

        let tools = vec![
            self.pin(ToolRole::Interpreter, &manifest.interpreter, platform)?,
            self.pin(ToolRole::Formatter, &manifest.formatter, platform)?,
        ];

        let spec = ShellSpec {
            platform,
            tools,
            dependency: manifest.dependency(),
            venv_dir: manifest.venv_dir(project_root)?,
        };
        debug!(platform = %platform, fingerprint = %spec.fingerprint(), "resolved shell spec");
        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn resolve(manifest: &Manifest, platform: Platform) -> Result<ShellSpec> {
        Catalog::builtin().resolve(manifest, Path::new("/work/project"), platform)
    }

    #[test]
    fn every_supported_platform_resolves_interpreter_and_formatter() {
        for platform in Platform::ALL {
            let spec = resolve(&Manifest::default(), platform).unwrap();
            let roles: Vec<ToolRole> = spec.tools.iter().map(|tool| tool.role).collect();
            assert_eq!(roles, vec![ToolRole::Interpreter, ToolRole::Formatter]);
            assert_eq!(spec.platform, platform);
            assert_eq!(spec.interpreter().unwrap().name, "python");
            assert_eq!(spec.formatter().unwrap().name, "black");
        }
    }

    #[test]
    fn platform_outside_manifest_systems_is_unsupported() {
        let manifest = Manifest {
            systems: vec!["x86_64-linux".to_string()],
            ..Manifest::default()
        };

        let err = resolve(&manifest, Platform::Aarch64Darwin).unwrap_err();
        match err.downcast_ref::<BootstrapError>() {
            Some(BootstrapError::UnsupportedPlatform {
                platform,
                supported,
            }) => {
                assert_eq!(platform, "aarch64-darwin");
                assert_eq!(supported, "x86_64-linux");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unknown_tool_is_unavailable() {
        let manifest = Manifest {
            formatter: ToolSpecToml {
                name: "autopep8".to_string(),
                version: None,
            },
            ..Manifest::default()
        };

        let err = resolve(&manifest, Platform::X86_64Linux).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BootstrapError>(),
            Some(BootstrapError::ToolUnavailable { name, .. }) if name == "autopep8"
        ));
    }

    #[test]
    fn swapped_roles_are_rejected() {
        let manifest = Manifest {
            interpreter: ToolSpecToml {
                name: "ruff".to_string(),
                version: None,
            },
            formatter: ToolSpecToml {
                name: "python".to_string(),
                version: None,
            },
            ..Manifest::default()
        };

        let err = resolve(&manifest, Platform::X86_64Linux).unwrap_err();
        match err.downcast_ref::<BootstrapError>() {
            Some(BootstrapError::RoleMismatch {
                name,
                expected,
                actual,
            }) => {
                assert_eq!(name, "ruff");
                assert_eq!(expected, "interpreter");
                assert_eq!(actual, "formatter");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn catalog_knows_tool_roles() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.role_of("python"), Some(ToolRole::Interpreter));
        assert_eq!(catalog.role_of("black"), Some(ToolRole::Formatter));
        assert_eq!(catalog.role_of("ruff"), Some(ToolRole::Formatter));
        assert_eq!(catalog.role_of("yapf"), None);
    }

    #[rstest]
    #[case("3.12", &["python3.12", "python3"])]
    #[case("3.11.9", &["python3.11", "python3"])]
    #[case("3", &["python3"])]
    fn python_binary_candidates(#[case] version: &str, #[case] expected: &[&str]) {
        assert_eq!(python_binaries(version), expected);
    }

    #[test]
    fn missing_version_uses_catalog_default() {
        let manifest = Manifest {
            formatter: ToolSpecToml {
                name: "ruff".to_string(),
                version: None,
            },
            ..Manifest::default()
        };

        let spec = resolve(&manifest, Platform::X86_64Linux).unwrap();
        let formatter = spec.formatter().unwrap();
        assert_eq!(formatter.version, "0.6.9");
        assert_eq!(formatter.binary(), "ruff");
    }

    #[test]
    fn fingerprint_tracks_spec_changes() {
        let base = resolve(&Manifest::default(), Platform::X86_64Linux).unwrap();
        let same = resolve(&Manifest::default(), Platform::X86_64Linux).unwrap();
        assert_eq!(base.fingerprint(), same.fingerprint());
        assert_eq!(base.fingerprint().len(), 64);

        let mut pinned = Manifest::default();
        pinned.dependency.version = Some("0.1.5".to_string());
        let changed = resolve(&pinned, Platform::X86_64Linux).unwrap();
        assert_ne!(base.fingerprint(), changed.fingerprint());
    }

    #[test]
    fn formatter_pin_is_an_exact_requirement() {
        let spec = resolve(&Manifest::default(), Platform::X86_64Linux).unwrap();
        let package = spec.formatter().unwrap().package();
        assert_eq!(package.module, "black");
        assert_eq!(package.requirement(), "black==24.8.0");
    }

    #[test]
    fn fingerprint_separates_adjacent_fields() {
        let base = resolve(&Manifest::default(), Platform::X86_64Linux).unwrap();
        let mut left = base.clone();
        let mut right = base.clone();
        left.tools[1].name = "py".to_string();
        left.tools[1].version = "thon".to_string();
        right.tools[1].name = "pyt".to_string();
        right.tools[1].version = "hon".to_string();

        assert_ne!(left.fingerprint(), right.fingerprint());
    }
}
