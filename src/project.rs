use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

use crate::bootstrap::Bootstrapper;
use crate::environment::{ActivationEnv, Shell};
use crate::manifest::{Manifest, MANIFEST_FILE};
use crate::platform::Platform;
use crate::toolchain::SystemToolchain;
use crate::venv::VenvLayout;

/// Activation script for a shell, plus whether the shell had to be defaulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentExport {
    pub shell: Shell,
    pub script: String,
    pub defaulted: bool,
}

/// Project paths
#[derive(Debug, Clone, Copy)]
pub enum ProjectPath {
    /// Project root: --dir or the current directory
    Root,
    /// Manifest: root/devshell.toml unless --manifest is given
    Manifest,
    /// Virtual environment: root/.venv unless the manifest says otherwise
    Venv,
}

/// Project - the directory a shell is bootstrapped for
#[derive(Debug)]
pub struct Project {
    root: PathBuf,
    manifest_path: PathBuf,
    manifest: Manifest,
    venv_dir: PathBuf,
}

impl Project {
    /// Open the project at `dir` (default: current directory), loading its
    /// manifest if present.
    pub fn open(dir: Option<&Path>, manifest: Option<&Path>) -> Result<Self> {
        let cwd = env::current_dir().context("Failed to determine current directory")?;
        let root = match dir {
            Some(dir) if dir.is_absolute() => dir.to_path_buf(),
            Some(dir) => cwd.join(dir),
            None => cwd.clone(),
        };

        let manifest_path = match manifest {
            Some(path) if path.is_absolute() => path.to_path_buf(),
            Some(path) => cwd.join(path),
            None => root.join(MANIFEST_FILE),
        };

        let manifest = Manifest::load(&manifest_path)?;
        let venv_dir = manifest.venv_dir(&root)?;

        Ok(Self {
            root,
            manifest_path,
            manifest,
            venv_dir,
        })
    }

    pub fn path(&self, path_type: ProjectPath) -> PathBuf {
        match path_type {
            ProjectPath::Root => self.root.clone(),
            ProjectPath::Manifest => self.manifest_path.clone(),
            ProjectPath::Venv => self.venv_dir.clone(),
        }
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn has_manifest(&self) -> bool {
        self.manifest_path.exists()
    }

    pub fn venv(&self) -> VenvLayout {
        VenvLayout::new(&self.venv_dir)
    }

    pub fn bootstrapper(&self) -> Bootstrapper<SystemToolchain> {
        Bootstrapper::new(self.manifest.clone(), &self.root, SystemToolchain::new())
    }

    /// Platform from the caller, or the host platform when none was given.
    pub fn platform(&self, requested: Option<&str>) -> Result<Platform> {
        match requested {
            Some(value) => value.parse().map_err(Into::into),
            None => Platform::current().context("Failed to detect host platform"),
        }
    }

    /// Pick a shell by name, falling back to `$SHELL` and then zsh.
    pub fn shell(&self, requested: Option<&str>) -> (Shell, bool) {
        match requested {
            Some(name) => match Shell::from_name(name) {
                Some(shell) => (shell, false),
                None => (Shell::Zsh, true),
            },
            None => (Shell::detect().unwrap_or(Shell::Zsh), false),
        }
    }

    /// Activation script without bootstrapping anything.
    pub fn environment_export(&self, requested_shell: Option<&str>) -> EnvironmentExport {
        let (shell, defaulted) = self.shell(requested_shell);
        let script = ActivationEnv::for_venv(&self.venv()).format_for_shell(shell);
        EnvironmentExport {
            shell,
            script,
            defaulted,
        }
    }
}
