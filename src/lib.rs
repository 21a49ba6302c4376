// Public API
pub mod cli;
pub mod commands;

// Core domain types
mod bootstrap;
mod catalog;
mod environment;
mod error;
mod lock;
mod manifest;
mod platform;
mod project;
mod receipt;
pub mod toolchain;
mod ui;
mod venv;

// Re-export main types
pub use bootstrap::{ActivationReport, Bootstrapper};
pub use catalog::{Catalog, ShellSpec, ToolPin, ToolRole};
pub use environment::{ActivationEnv, EnvChange, Shell};
pub use error::BootstrapError;
pub use lock::InstallLock;
pub use manifest::{validate_manifest, Dependency, Manifest, ManifestIssue, MANIFEST_FILE};
pub use platform::Platform;
pub use project::{EnvironmentExport, Project, ProjectPath};
pub use receipt::Receipt;
pub use venv::VenvLayout;
