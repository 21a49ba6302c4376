use crate::{ui, Project};
use anyhow::Result;
use tracing::info;

pub fn execute(project: &Project, platform: Option<String>, shell: Option<String>) -> Result<()> {
    let (shell_kind, defaulted) = project.shell(shell.as_deref());
    if defaulted {
        ui::warn(format!(
            "Unknown shell '{}'; defaulting to {}.",
            shell.unwrap_or_default(),
            shell_kind.as_str()
        ));
    }

    let platform = project.platform(platform.as_deref())?;
    let bootstrapper = project.bootstrapper();
    let spec = bootstrapper.resolve(platform)?;
    let report = bootstrapper.activate(&spec)?;

    if report.changed() {
        ui::success(
            "Ready",
            format!(
                "{} {}, {} {} in {}",
                spec.dependency.name,
                report.present_version,
                spec.formatter().map(|tool| tool.name.as_str()).unwrap_or("formatter"),
                report.formatter_version,
                spec.venv_dir.display()
            ),
        );
    } else {
        info!(version = %report.present_version, "environment already bootstrapped");
    }

    println!("{}", report.env.format_for_shell(shell_kind));
    Ok(())
}
