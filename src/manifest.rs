use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::catalog::Catalog;
use crate::platform::Platform;

pub const MANIFEST_FILE: &str = "devshell.toml";

const DEFAULT_VENV: &str = ".venv";
const DEFAULT_INTERPRETER: (&str, &str) = ("python", "3.12");
const DEFAULT_FORMATTER: (&str, &str) = ("black", "24.8.0");
const DEFAULT_DEPENDENCY: &str = "skelo";

/// A tool entry as written in `devshell.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSpecToml {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl ToolSpecToml {
    fn new(name: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            version: Some(version.to_string()),
        }
    }
}

/// The third-party package the shell makes importable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencySpec {
    pub name: String,
    /// Import name when it differs from the distribution name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl Default for DependencySpec {
    fn default() -> Self {
        Self {
            name: DEFAULT_DEPENDENCY.to_string(),
            module: None,
            version: None,
        }
    }
}

/// Resolved dependency: distribution name, import name and optional pin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    pub module: String,
    pub version: Option<String>,
}

impl Dependency {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            module: default_module(&name),
            name,
            version: None,
        }
    }

    /// Requirement string handed to the installer.
    pub fn requirement(&self) -> String {
        match &self.version {
            Some(version) => format!("{}=={}", self.name, version),
            None => self.name.clone(),
        }
    }
}

impl From<&DependencySpec> for Dependency {
    fn from(spec: &DependencySpec) -> Self {
        Self {
            name: spec.name.clone(),
            module: spec
                .module
                .clone()
                .unwrap_or_else(|| default_module(&spec.name)),
            version: spec.version.clone(),
        }
    }
}

fn default_module(name: &str) -> String {
    name.replace(['-', '.'], "_").to_ascii_lowercase()
}

/// Project manifest (`devshell.toml`). Every field is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Restricts the systems the shell resolves for. Empty means all supported.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub systems: Vec<String>,
    #[serde(default = "default_venv")]
    pub venv: String,
    #[serde(default = "default_interpreter")]
    pub interpreter: ToolSpecToml,
    #[serde(default = "default_formatter")]
    pub formatter: ToolSpecToml,
    #[serde(default)]
    pub dependency: DependencySpec,
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            systems: Vec::new(),
            venv: default_venv(),
            interpreter: default_interpreter(),
            formatter: default_formatter(),
            dependency: DependencySpec::default(),
        }
    }
}

fn default_venv() -> String {
    DEFAULT_VENV.to_string()
}

fn default_interpreter() -> ToolSpecToml {
    ToolSpecToml::new(DEFAULT_INTERPRETER.0, DEFAULT_INTERPRETER.1)
}

fn default_formatter() -> ToolSpecToml {
    ToolSpecToml::new(DEFAULT_FORMATTER.0, DEFAULT_FORMATTER.1)
}

impl Manifest {
    /// Load a manifest, falling back to defaults when the file is missing or empty.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest {:?}", path))?;

        if contents.trim().is_empty() {
            return Ok(Self::default());
        }

        toml::from_str(&contents).with_context(|| format!("Failed to parse manifest {:?}", path))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize manifest")?;
        fs::write(path, contents).with_context(|| format!("Failed to write manifest {:?}", path))?;
        Ok(())
    }

    /// Systems this project resolves for.
    pub fn supported_systems(&self) -> Result<Vec<Platform>> {
        if self.systems.is_empty() {
            return Ok(Platform::ALL.to_vec());
        }

        self.systems
            .iter()
            .map(|system| {
                system
                    .parse::<Platform>()
                    .with_context(|| format!("Invalid entry in `systems`: {system:?}"))
            })
            .collect()
    }

    /// Absolute venv directory, with `~` and `$VAR` expanded and relative
    /// paths anchored at the project root.
    pub fn venv_dir(&self, project_root: &Path) -> Result<PathBuf> {
        let expanded = shellexpand::full(&self.venv)
            .with_context(|| format!("Failed to expand venv path {:?}", self.venv))?;
        let path = PathBuf::from(expanded.as_ref());

        if path.is_absolute() {
            Ok(path)
        } else {
            Ok(project_root.join(path))
        }
    }

    pub fn dependency(&self) -> Dependency {
        Dependency::from(&self.dependency)
    }
}

/// A problem found while validating a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestIssue {
    pub source: PathBuf,
    pub field: Option<String>,
    pub message: String,
}

impl ManifestIssue {
    fn field(source: &Path, field: &str, message: impl Into<String>) -> Self {
        Self {
            source: source.to_path_buf(),
            field: Some(field.to_string()),
            message: message.into(),
        }
    }
}

fn distribution_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // PEP 508 project name.
    RE.get_or_init(|| {
        Regex::new(r"^(?i)([a-z0-9]|[a-z0-9][a-z0-9._-]*[a-z0-9])$").expect("valid regex")
    })
}

fn module_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$").expect("valid regex")
    })
}

fn version_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9]+(\.[0-9]+)*[A-Za-z0-9.+!-]*$").expect("valid regex"))
}

/// Validate a loaded manifest against the catalog.
pub fn validate_manifest(source: &Path, manifest: &Manifest, catalog: &Catalog) -> Vec<ManifestIssue> {
    let mut issues = Vec::new();

    for system in &manifest.systems {
        if system.parse::<Platform>().is_err() {
            issues.push(ManifestIssue::field(
                source,
                "systems",
                format!(
                    "unknown system '{system}' (supported: {})",
                    Platform::supported_list()
                ),
            ));
        }
    }

    for (field, tool) in [
        ("interpreter", &manifest.interpreter),
        ("formatter", &manifest.formatter),
    ] {
        match catalog.role_of(&tool.name) {
            None => issues.push(ManifestIssue::field(
                source,
                field,
                format!("tool '{}' is not in the package catalog", tool.name),
            )),
            Some(role) if role.to_string() != field => issues.push(ManifestIssue::field(
                source,
                field,
                format!("tool '{}' fills the {role} role, not the {field} role", tool.name),
            )),
            Some(_) => {}
        }
        if let Some(version) = &tool.version {
            if !version_re().is_match(version) {
                issues.push(ManifestIssue::field(
                    source,
                    field,
                    format!("invalid version '{version}'"),
                ));
            }
        }
    }

    if manifest.venv.trim().is_empty() {
        issues.push(ManifestIssue::field(source, "venv", "venv path is empty"));
    }

    let dependency = &manifest.dependency;
    if !distribution_name_re().is_match(&dependency.name) {
        issues.push(ManifestIssue::field(
            source,
            "dependency.name",
            format!("invalid package name '{}'", dependency.name),
        ));
    }
    if let Some(module) = &dependency.module {
        if !module_name_re().is_match(module) {
            issues.push(ManifestIssue::field(
                source,
                "dependency.module",
                format!("invalid module name '{module}'"),
            ));
        }
    }
    if let Some(version) = &dependency.version {
        if !version_re().is_match(version) {
            issues.push(ManifestIssue::field(
                source,
                "dependency.version",
                format!("invalid version '{version}'"),
            ));
        }
    }

    issues
}
