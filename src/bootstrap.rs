//! Shell resolution and the activation sequence.
//!
//! Activation runs four steps in order: ensure the venv exists, compute the
//! activation environment, make sure the dependency imports, then make sure
//! the pinned formatter is installed in the venv. Each existence check is
//! repeated under the install lock before anything is written, so concurrent
//! activations in one project serialize instead of racing. When every check
//! passes up front, the lock file is never opened.

use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, ShellSpec};
use crate::environment::ActivationEnv;
use crate::error::BootstrapError;
use crate::lock::InstallLock;
use crate::manifest::{Dependency, Manifest};
use crate::platform::Platform;
use crate::receipt::Receipt;
use crate::toolchain::Toolchain;
use crate::ui;
use crate::venv::VenvLayout;

/// Outcome of one activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationReport {
    pub created_venv: bool,
    /// Version installed during this activation, if an install happened.
    pub installed: Option<String>,
    /// Version of the dependency present once activation finished.
    pub present_version: String,
    /// Formatter version found in the venv, whether or not it matches the pin.
    pub formatter_version: String,
    pub formatter_installed: Option<String>,
    pub env: ActivationEnv,
}

impl ActivationReport {
    pub fn changed(&self) -> bool {
        self.created_venv || self.installed.is_some() || self.formatter_installed.is_some()
    }
}

/// Version present after a package step, and the version installed by it.
struct PackageOutcome {
    present: String,
    installed: Option<String>,
}

pub struct Bootstrapper<T: Toolchain> {
    catalog: Catalog,
    manifest: Manifest,
    project_root: PathBuf,
    toolchain: T,
}

impl<T: Toolchain> Bootstrapper<T> {
    pub fn new(manifest: Manifest, project_root: impl Into<PathBuf>, toolchain: T) -> Self {
        Self {
            catalog: Catalog::builtin(),
            manifest,
            project_root: project_root.into(),
            toolchain,
        }
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn toolchain(&self) -> &T {
        &self.toolchain
    }

    /// Look up pinned tools for `platform`.
    pub fn resolve(&self, platform: Platform) -> Result<ShellSpec> {
        self.catalog
            .resolve(&self.manifest, &self.project_root, platform)
    }

    /// Ensure the venv, dependency and formatter exist, and return the
    /// environment that activates them.
    pub fn activate(&self, spec: &ShellSpec) -> Result<ActivationReport> {
        let layout = VenvLayout::new(&spec.venv_dir);
        let mut lock: Option<InstallLock> = None;

        let created_venv = self.ensure_venv(spec, &layout, &mut lock)?;

        let env = ActivationEnv::for_venv(&layout);

        let dependency = self.ensure_package(&spec.dependency, &layout, &mut lock)?;

        let formatter_pin = spec
            .formatter()
            .ok_or_else(|| anyhow!("shell spec for {} has no formatter", spec.platform))?;
        let formatter = self.ensure_package(&formatter_pin.package(), &layout, &mut lock)?;
        if formatter.present != formatter_pin.version {
            warn!(
                "{} {} is installed in {:?}, but {} is pinned; leaving it in place",
                formatter_pin.name,
                formatter.present,
                layout.root(),
                formatter_pin.version
            );
        }

        let report = ActivationReport {
            created_venv,
            installed: dependency.installed,
            present_version: dependency.present,
            formatter_version: formatter.present,
            formatter_installed: formatter.installed,
            env,
        };

        if report.changed() {
            Receipt::new(spec, &report.present_version).save(&layout.receipt_path())?;
        }

        Ok(report)
    }

    fn ensure_venv(
        &self,
        spec: &ShellSpec,
        layout: &VenvLayout,
        lock: &mut Option<InstallLock>,
    ) -> Result<bool> {
        if layout.exists() {
            debug!(venv = ?layout.root(), "venv present");
            return Ok(false);
        }

        acquire(lock, layout)?;
        if layout.exists() {
            debug!(venv = ?layout.root(), "venv created by another activation");
            return Ok(false);
        }

        let interpreter = spec
            .interpreter()
            .ok_or_else(|| anyhow!("shell spec for {} has no interpreter", spec.platform))?;

        info!(venv = ?layout.root(), interpreter = %interpreter.binary(), "creating venv");
        let progress = ui::Progress::new("Creating", format!("{}", layout.root().display()));
        match self.toolchain.create_venv(interpreter, layout) {
            Ok(()) => {
                progress.success("Created", None);
                Ok(true)
            }
            Err(err) => {
                progress.fail("Failed", &err);
                Err(err.into())
            }
        }
    }

    /// Probe for `package`, installing it under the lock when it is missing.
    /// A package that is already present is never upgraded.
    fn ensure_package(
        &self,
        package: &Dependency,
        layout: &VenvLayout,
        lock: &mut Option<InstallLock>,
    ) -> Result<PackageOutcome> {
        if let Some(version) = self.toolchain.probe(layout, package)? {
            debug!(package = %package.name, %version, "package present");
            return Ok(PackageOutcome {
                present: version,
                installed: None,
            });
        }

        if acquire(lock, layout)? {
            if let Some(version) = self.toolchain.probe(layout, package)? {
                debug!(package = %package.name, %version, "package installed by another activation");
                return Ok(PackageOutcome {
                    present: version,
                    installed: None,
                });
            }
        }

        info!(requirement = %package.requirement(), "installing package");
        let progress = ui::Progress::new("Installing", package.requirement());
        if let Err(err) = self.toolchain.install(layout, package) {
            progress.fail("Failed", &err);
            return Err(err.into());
        }

        match self.toolchain.probe(layout, package)? {
            Some(version) => {
                progress.success("Installed", Some(format!("({version})")));
                Ok(PackageOutcome {
                    present: version.clone(),
                    installed: Some(version),
                })
            }
            None => {
                let err = BootstrapError::InstallerFailed {
                    package: package.requirement(),
                    detail: format!("module '{}' is still not importable", package.module),
                };
                progress.fail("Failed", &err);
                Err(err.into())
            }
        }
    }
}

/// Take the install lock unless this activation already holds it. Returns
/// whether it was taken now, in which case state may have changed while
/// waiting.
fn acquire(lock: &mut Option<InstallLock>, layout: &VenvLayout) -> Result<bool, BootstrapError> {
    if lock.is_some() {
        return Ok(false);
    }
    *lock = Some(InstallLock::acquire(&layout.lock_path())?);
    Ok(true)
}
