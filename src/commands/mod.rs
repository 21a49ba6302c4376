use crate::cli::{Cli, Commands};
use crate::Project;
use anyhow::Result;

mod activate;
mod check;
mod enter;
mod env;
mod resolve;
mod status;

pub fn execute(cli: Cli) -> Result<()> {
    // The project is the root entry point for every command
    let project = Project::open(cli.dir.as_deref(), cli.manifest.as_deref())?;

    match cli.command {
        Commands::Resolve { platform, json } => resolve::execute(&project, platform, json),

        Commands::Activate { platform, shell } => activate::execute(&project, platform, shell),

        Commands::Env { shell } => env::execute(&project, shell),

        Commands::Enter { platform, command } => enter::execute(&project, platform, command),

        Commands::Status { platform } => status::execute(&project, platform),

        Commands::Check => check::execute(&project),
    }
}
