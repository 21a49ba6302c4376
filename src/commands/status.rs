use crate::receipt::pin_drift;
use crate::toolchain::{SystemToolchain, Toolchain};
use crate::{ui, Project, Receipt};
use anyhow::Result;

pub fn execute(project: &Project, platform: Option<String>) -> Result<()> {
    let platform = project.platform(platform.as_deref())?;
    let spec = project.bootstrapper().resolve(platform)?;
    let venv = project.venv();

    if project.has_manifest() {
        ui::status("Manifest", project.path(crate::ProjectPath::Manifest).display());
    } else {
        ui::info("No devshell.toml found; using built-in defaults.");
    }

    for tool in &spec.tools {
        ui::status(
            &capitalize(&tool.role.to_string()),
            format!("{} {}", tool.name, tool.version),
        );
    }

    if !venv.exists() {
        ui::warn(format!(
            "No virtual environment at {}. Run 'devshell activate' to create it.",
            venv.root().display()
        ));
        return Ok(());
    }
    ui::success("Venv", venv.root().display());

    let toolchain = SystemToolchain::new();
    let live = toolchain.probe(&venv, &spec.dependency)?;
    match &live {
        Some(version) => ui::success("Dependency", format!("{} {}", spec.dependency.name, version)),
        None => ui::warn(format!(
            "{} is not importable. Run 'devshell activate' to install it.",
            spec.dependency.name
        )),
    }

    if let Some(formatter) = spec.formatter() {
        match toolchain.probe(&venv, &formatter.package())? {
            Some(version) if version == formatter.version => {
                ui::success("Formatter", format!("{} {}", formatter.name, version))
            }
            Some(version) => ui::warn(format!(
                "{} {} is installed but {} is pinned.",
                formatter.name, version, formatter.version
            )),
            None => ui::warn(format!(
                "{} is not installed in the venv. Run 'devshell activate' to install it.",
                formatter.name
            )),
        }
    }

    match Receipt::load(&venv.receipt_path())? {
        Some(receipt) => {
            ui::status("Bootstrapped", &receipt.bootstrapped_at);
            for line in receipt.drift(&spec, live.as_deref()) {
                ui::warn(line);
            }
        }
        None => {
            ui::info("No bootstrap receipt recorded.");
            if let Some(line) = live.as_deref().and_then(|version| pin_drift(&spec, version)) {
                ui::warn(line);
            }
        }
    }

    Ok(())
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
