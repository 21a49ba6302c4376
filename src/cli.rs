use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Development shell - pinned Python tools with a project virtual environment
///
/// devshell resolves a pinned interpreter and formatter for the current
/// platform, creates the project's virtual environment on first use, and
/// installs the project's dependency if it cannot be imported. Activation
/// scripts are printed to stdout for `eval`; status goes to stderr.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Project directory (defaults to the current directory)
    #[arg(short = 'C', long, global = true, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Manifest path (defaults to devshell.toml in the project directory)
    #[arg(long, global = true, value_name = "FILE")]
    pub manifest: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the pinned tool set for a platform
    Resolve {
        /// Platform identifier, e.g. x86_64-linux (detected if not specified)
        #[arg(short, long, value_name = "PLATFORM", env = "DEVSHELL_PLATFORM")]
        platform: Option<String>,

        /// Print the shell spec as JSON
        #[arg(long)]
        json: bool,
    },

    /// Bootstrap the environment and print its activation script
    ///
    /// Creates the virtual environment if missing and installs the dependency
    /// if it cannot be imported. Use as: eval "$(devshell activate)"
    Activate {
        /// Platform identifier, e.g. x86_64-linux (detected if not specified)
        #[arg(short, long, value_name = "PLATFORM", env = "DEVSHELL_PLATFORM")]
        platform: Option<String>,

        /// Shell type (auto-detects from $SHELL if not specified)
        #[arg(short, long, value_name = "SHELL")]
        shell: Option<String>,
    },

    /// Print the activation script without bootstrapping
    Env {
        /// Shell type (zsh, bash, fish; auto-detects from $SHELL)
        #[arg(short, long, value_name = "SHELL")]
        shell: Option<String>,
    },

    /// Bootstrap the environment and run a command (or $SHELL) inside it
    Enter {
        /// Platform identifier, e.g. x86_64-linux (detected if not specified)
        #[arg(short, long, value_name = "PLATFORM", env = "DEVSHELL_PLATFORM")]
        platform: Option<String>,

        /// Command and arguments to run instead of $SHELL
        #[arg(last = true, value_name = "COMMAND")]
        command: Vec<String>,
    },

    /// Show environment and dependency status
    Status {
        /// Platform identifier, e.g. x86_64-linux (detected if not specified)
        #[arg(short, long, value_name = "PLATFORM", env = "DEVSHELL_PLATFORM")]
        platform: Option<String>,
    },

    /// Validate the project manifest
    Check,
}
