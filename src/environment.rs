use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::venv::VenvLayout;

/// Shell type for activation script generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shell {
    Zsh,
    Bash,
    Fish,
}

impl Shell {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "zsh" => Some(Shell::Zsh),
            "bash" => Some(Shell::Bash),
            "fish" => Some(Shell::Fish),
            _ => None,
        }
    }

    /// Detect from `$SHELL`, e.g. `/usr/bin/fish`.
    pub fn detect() -> Option<Self> {
        let shell = std::env::var("SHELL").ok()?;
        let name = Path::new(&shell).file_name()?.to_str()?;
        Self::from_name(name)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Shell::Zsh => "zsh",
            Shell::Bash => "bash",
            Shell::Fish => "fish",
        }
    }
}

/// One variable change applied on activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvChange {
    Set(String),
    PrependPath(PathBuf),
    Unset,
}

/// Environment changes that activate a venv.
///
/// Nothing here touches the current process; callers either render it as a
/// shell script or apply it to a child [`Command`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActivationEnv {
    vars: BTreeMap<String, EnvChange>,
}

impl ActivationEnv {
    pub fn for_venv(layout: &VenvLayout) -> Self {
        let mut vars = BTreeMap::new();
        vars.insert(
            "VIRTUAL_ENV".to_string(),
            EnvChange::Set(layout.root().display().to_string()),
        );
        vars.insert(
            "PATH".to_string(),
            EnvChange::PrependPath(layout.bin_dir()),
        );
        vars.insert("PYTHONHOME".to_string(), EnvChange::Unset);
        Self { vars }
    }

    pub fn get(&self, name: &str) -> Option<&EnvChange> {
        self.vars.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &EnvChange)> {
        self.vars.iter()
    }

    /// Concrete values for each variable, given the caller's current environment.
    pub fn resolve_against<F>(&self, lookup: F) -> Vec<(String, Option<OsString>)>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        self.vars
            .iter()
            .map(|(name, change)| {
                let value = match change {
                    EnvChange::Set(value) => Some(OsString::from(value)),
                    EnvChange::Unset => None,
                    EnvChange::PrependPath(dir) => {
                        let mut paths = vec![dir.clone()];
                        if let Some(existing) = lookup(name.as_str()) {
                            paths.extend(std::env::split_paths(&existing));
                        }
                        Some(std::env::join_paths(paths).unwrap_or_else(|_| dir.clone().into()))
                    }
                };
                (name.clone(), value)
            })
            .collect()
    }

    /// Apply to a child process, leaving this process untouched.
    pub fn apply_to(&self, command: &mut Command) {
        for (name, value) in self.resolve_against(|name| std::env::var_os(name)) {
            match value {
                Some(value) => {
                    command.env(name, value);
                }
                None => {
                    command.env_remove(name);
                }
            }
        }
    }

    /// Format the environment for the given shell
    pub fn format_for_shell(&self, shell: Shell) -> String {
        self.vars
            .iter()
            .map(|(name, change)| match shell {
                Shell::Zsh | Shell::Bash => format_posix(name, change),
                Shell::Fish => format_fish(name, change),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn format_posix(name: &str, change: &EnvChange) -> String {
    match change {
        EnvChange::Set(value) => format!("export {}={}", name, posix_quote(value)),
        EnvChange::PrependPath(dir) => format!(
            "export {}={}:\"${}\"",
            name,
            posix_quote(&dir.display().to_string()),
            name
        ),
        EnvChange::Unset => format!("unset {}", name),
    }
}

fn format_fish(name: &str, change: &EnvChange) -> String {
    match change {
        EnvChange::Set(value) => format!("set -gx {} {}", name, fish_quote(value)),
        EnvChange::PrependPath(dir) => format!(
            "set -gx {} {} ${}",
            name,
            fish_quote(&dir.display().to_string()),
            name
        ),
        EnvChange::Unset => format!("set -e {}", name),
    }
}

/// Single-quote for sh; an embedded `'` becomes `'\''`.
fn posix_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Single-quote for fish, which only treats `\\` and `\'` as escapes there.
fn fish_quote(value: &str) -> String {
    format!("'{}'", value.replace('\\', r"\\").replace('\'', r"\'"))
}
