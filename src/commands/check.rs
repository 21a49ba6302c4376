use crate::catalog::Catalog;
use crate::manifest::validate_manifest;
use crate::{ui, Project, ProjectPath};
use anyhow::Result;

pub fn execute(project: &Project) -> Result<()> {
    let manifest_path = project.path(ProjectPath::Manifest);

    if !project.has_manifest() {
        ui::info(format!(
            "No manifest at {}; validating built-in defaults.",
            manifest_path.display()
        ));
    }

    let catalog = Catalog::builtin();
    let issues = validate_manifest(&manifest_path, project.manifest(), &catalog);

    if issues.is_empty() {
        ui::success("Check", format!("{} is valid.", manifest_path.display()));
        Ok(())
    } else {
        for issue in &issues {
            let location = if let Some(field) = &issue.field {
                format!("{} ({field})", issue.source.display())
            } else {
                issue.source.display().to_string()
            };
            ui::error(format!("{location}: {}", issue.message));
        }
        let known: Vec<&str> = catalog.tool_names().collect();
        ui::info(format!("Catalog tools: {}", known.join(", ")));
        anyhow::bail!("Manifest validation failed ({} issue(s)).", issues.len());
    }
}
