use crate::{ui, Project};
use anyhow::Result;

pub fn execute(project: &Project, shell: Option<String>) -> Result<()> {
    let export = project.environment_export(shell.as_deref());
    if export.defaulted {
        ui::warn(format!(
            "Unknown shell '{}'; defaulting to {}.",
            shell.unwrap_or_default(),
            export.shell.as_str()
        ));
    }
    println!("{}", export.script);

    Ok(())
}
