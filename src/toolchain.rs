use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::{debug, warn};

use crate::catalog::ToolPin;
use crate::error::BootstrapError;
use crate::manifest::Dependency;
use crate::venv::VenvLayout;

/// Imports the module named by argv[1] and prints the installed version of
/// the distribution named by argv[2]. Exits non-zero when the import fails.
const PROBE_SCRIPT: &str = r#"import importlib, sys
importlib.import_module(sys.argv[1])
try:
    from importlib.metadata import version
    print(version(sys.argv[2]))
except Exception:
    print("unknown")
"#;

/// External collaborators of activation: the venv tool, the import probe and
/// the package installer. The dependency and the formatter pin both go
/// through `probe` and `install`.
pub trait Toolchain {
    fn create_venv(&self, interpreter: &ToolPin, venv: &VenvLayout) -> Result<(), BootstrapError>;

    /// Installed version when the dependency imports, `None` when it does not.
    fn probe(
        &self,
        venv: &VenvLayout,
        dependency: &Dependency,
    ) -> Result<Option<String>, BootstrapError>;

    fn install(&self, venv: &VenvLayout, dependency: &Dependency) -> Result<(), BootstrapError>;
}

/// Toolchain backed by the interpreter on `PATH` and pip inside the venv.
#[derive(Debug, Default, Clone)]
pub struct SystemToolchain;

impl SystemToolchain {
    pub fn new() -> Self {
        Self
    }

    fn locate_interpreter(&self, pin: &ToolPin) -> Result<PathBuf, BootstrapError> {
        for candidate in &pin.binaries {
            if let Ok(path) = which::which(candidate) {
                debug!(binary = %candidate, path = ?path, "found interpreter");
                return Ok(path);
            }
        }
        Err(BootstrapError::InterpreterNotFound {
            candidates: pin.binaries.clone(),
        })
    }

    fn check_interpreter_version(&self, path: &Path, pin: &ToolPin) {
        let reported = run(Command::new(path).arg("--version"))
            .ok()
            .filter(|output| output.status.success())
            .and_then(|output| {
                // Older interpreters print the version to stderr.
                let text = if output.stdout.is_empty() {
                    output.stderr
                } else {
                    output.stdout
                };
                parse_python_version(&String::from_utf8_lossy(&text))
            });

        match reported {
            Some(version) if version_matches(&pin.version, &version) => {}
            Some(version) => warn!(
                "interpreter {:?} reports {}, expected {} {}",
                path, version, pin.name, pin.version
            ),
            None => warn!("could not determine version of interpreter {:?}", path),
        }
    }
}

impl Toolchain for SystemToolchain {
    fn create_venv(&self, interpreter: &ToolPin, venv: &VenvLayout) -> Result<(), BootstrapError> {
        let python = self.locate_interpreter(interpreter)?;
        self.check_interpreter_version(&python, interpreter);

        if let Some(parent) = venv.root().parent() {
            fs::create_dir_all(parent).map_err(|err| BootstrapError::DirectoryCreation {
                path: parent.to_path_buf(),
                detail: err.to_string(),
            })?;
        }

        remove_dangling_links(&venv.bin_dir())?;

        let output = run(Command::new(&python).arg("-m").arg("venv").arg(venv.root()))?;
        if !output.status.success() {
            return Err(BootstrapError::DirectoryCreation {
                path: venv.root().to_path_buf(),
                detail: BootstrapError::tool_output(&output.stderr),
            });
        }
        Ok(())
    }

    fn probe(
        &self,
        venv: &VenvLayout,
        dependency: &Dependency,
    ) -> Result<Option<String>, BootstrapError> {
        let output = run(Command::new(venv.python())
            .arg("-c")
            .arg(PROBE_SCRIPT)
            .arg(&dependency.module)
            .arg(&dependency.name))?;

        if !output.status.success() {
            debug!(
                module = %dependency.module,
                stderr = %BootstrapError::tool_output(&output.stderr),
                "dependency not importable"
            );
            return Ok(None);
        }

        let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(Some(version))
    }

    fn install(&self, venv: &VenvLayout, dependency: &Dependency) -> Result<(), BootstrapError> {
        let requirement = dependency.requirement();
        let output = run(Command::new(venv.python())
            .args(["-m", "pip", "install", "--disable-pip-version-check"])
            .arg(&requirement))?;

        debug!(stdout = %String::from_utf8_lossy(&output.stdout), "pip install output");
        if !output.status.success() {
            return Err(BootstrapError::InstallerFailed {
                package: requirement,
                detail: BootstrapError::tool_output(&output.stderr),
            });
        }
        Ok(())
    }
}

/// `-m venv` leaves existing links alone, so links to a removed interpreter
/// have to go first.
fn remove_dangling_links(bin_dir: &Path) -> Result<(), BootstrapError> {
    let Ok(entries) = fs::read_dir(bin_dir) else {
        return Ok(());
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let is_link = fs::symlink_metadata(&path).is_ok_and(|meta| meta.file_type().is_symlink());
        if is_link && !path.exists() {
            debug!(path = ?path, "removing dangling interpreter link");
            fs::remove_file(&path).map_err(|err| BootstrapError::DirectoryCreation {
                path: path.clone(),
                detail: err.to_string(),
            })?;
        }
    }
    Ok(())
}

fn run(command: &mut Command) -> Result<Output, BootstrapError> {
    let program = command.get_program().to_string_lossy().into_owned();
    debug!(command = ?command, "running");
    command
        .output()
        .map_err(|source| BootstrapError::Spawn { program, source })
}

/// Extract `3.12.4` from `Python 3.12.4`.
fn parse_python_version(output: &str) -> Option<String> {
    output
        .split_whitespace()
        .find(|word| word.chars().next().is_some_and(|c| c.is_ascii_digit()))
        .map(str::to_string)
}

/// `3.12` matches `3.12.4` but not `3.1.2` or `3.120`.
fn version_matches(pinned: &str, reported: &str) -> bool {
    let pinned: Vec<&str> = pinned.split('.').collect();
    let reported: Vec<&str> = reported.split('.').collect();
    reported.len() >= pinned.len() && pinned.iter().zip(&reported).all(|(a, b)| a == b)
}
