use crate::Project;
use anyhow::{Context, Result};

pub fn execute(project: &Project, platform: Option<String>, json: bool) -> Result<()> {
    let platform = project.platform(platform.as_deref())?;
    let spec = project.bootstrapper().resolve(platform)?;

    if json {
        let rendered =
            serde_json::to_string_pretty(&spec).context("Failed to serialize shell spec")?;
        println!("{rendered}");
        return Ok(());
    }

    println!("platform    {}", spec.platform);
    for tool in &spec.tools {
        println!(
            "{:<11} {} {} ({})",
            tool.role.to_string(),
            tool.name,
            tool.version,
            tool.binary()
        );
    }
    println!("dependency  {}", spec.dependency.requirement());
    println!("venv        {}", spec.venv_dir.display());

    Ok(())
}
