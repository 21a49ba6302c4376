use std::path::{Path, PathBuf};

const CONFIG_MARKER: &str = "pyvenv.cfg";
const RECEIPT_FILE: &str = "devshell-receipt.toml";

/// On-disk layout of a project virtual environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VenvLayout {
    root: PathBuf,
}

impl VenvLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn bin_dir(&self) -> PathBuf {
        if cfg!(windows) {
            self.root.join("Scripts")
        } else {
            self.root.join("bin")
        }
    }

    pub fn python(&self) -> PathBuf {
        if cfg!(windows) {
            self.bin_dir().join("python.exe")
        } else {
            self.bin_dir().join("python")
        }
    }

    /// A venv counts as present when `pyvenv.cfg` exists and its interpreter
    /// resolves. A bare directory, or one whose `python` link dangles after a
    /// host upgrade, does not.
    pub fn exists(&self) -> bool {
        self.config_marker().is_file() && self.python().is_file()
    }

    pub fn config_marker(&self) -> PathBuf {
        self.root.join(CONFIG_MARKER)
    }

    pub fn receipt_path(&self) -> PathBuf {
        self.root.join(RECEIPT_FILE)
    }

    /// Sibling lock file, e.g. `.venv` -> `.venv.lock`.
    pub fn lock_path(&self) -> PathBuf {
        let name = self
            .root
            .file_name()
            .map(|name| name.to_string_lossy().trim_start_matches('.').to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "venv".to_string());
        let parent = self.root.parent().unwrap_or_else(|| Path::new("."));
        parent.join(format!(".{name}.lock"))
    }
}
