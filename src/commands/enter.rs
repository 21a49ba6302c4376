use crate::{ui, Project};
use anyhow::{Context, Result};
use std::process::Command;

const FALLBACK_SHELL: &str = "/bin/sh";

pub fn execute(project: &Project, platform: Option<String>, command: Vec<String>) -> Result<()> {
    let platform = project.platform(platform.as_deref())?;
    let bootstrapper = project.bootstrapper();
    let spec = bootstrapper.resolve(platform)?;
    let report = bootstrapper.activate(&spec)?;

    let (program, args) = match command.split_first() {
        Some((program, args)) => (program.clone(), args.to_vec()),
        None => (
            std::env::var("SHELL").unwrap_or_else(|_| FALLBACK_SHELL.to_string()),
            Vec::new(),
        ),
    };

    ui::status(
        "Entering",
        format!("{} ({})", spec.venv_dir.display(), spec.platform),
    );

    let mut child = Command::new(&program);
    child.args(&args).current_dir(project.path(crate::ProjectPath::Root));
    report.env.apply_to(&mut child);

    let status = child
        .status()
        .with_context(|| format!("Failed to run {program}"))?;

    if !status.success() {
        std::process::exit(status.code().unwrap_or(1));
    }
    Ok(())
}
