use std::path::PathBuf;
use thiserror::Error;

/// Failures of the resolve/activate sequence.
///
/// None of these are recovered locally: each one aborts shell entry and
/// carries whatever diagnostic the underlying tool produced.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("platform '{platform}' is not supported (supported: {supported})")]
    UnsupportedPlatform { platform: String, supported: String },

    #[error("tool '{name}' is not available in the catalog for {platform}")]
    ToolUnavailable { name: String, platform: String },

    #[error("tool '{name}' is a {actual} but is declared as the {expected}")]
    RoleMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("no interpreter found on PATH (tried {})", .candidates.join(", "))]
    InterpreterNotFound { candidates: Vec<String> },

    #[error("failed to create environment directory {path:?}: {detail}")]
    DirectoryCreation { path: PathBuf, detail: String },

    #[error("installer failed for '{package}': {detail}")]
    InstallerFailed { package: String, detail: String },

    #[error("failed to lock {path:?}")]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to run {program}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl BootstrapError {
    /// Tail of a tool's stderr, trimmed for inclusion in an error message.
    pub(crate) fn tool_output(stderr: &[u8]) -> String {
        let text = String::from_utf8_lossy(stderr);
        let lines: Vec<&str> = text.trim_end().lines().collect();
        let start = lines.len().saturating_sub(20);
        lines[start..].join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_output_keeps_tail() {
        let raw: String = (0..30).map(|i| format!("line {i}\n")).collect();
        let output = BootstrapError::tool_output(raw.as_bytes());
        assert!(output.starts_with("line 10"));
        assert!(output.ends_with("line 29"));
    }

    #[test]
    fn test_unsupported_platform_message() {
        let err = BootstrapError::UnsupportedPlatform {
            platform: "riscv64-plan9".to_string(),
            supported: "x86_64-linux".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "platform 'riscv64-plan9' is not supported (supported: x86_64-linux)"
        );
    }
}
