use anyhow::Context;

use crate::context::find_project_root;

/// Load `.env` (project first, then the usual search) and the layered
/// configuration.
pub fn load_config() -> anyhow::Result<field_config::FieldConfig> {
    load_project_dotenv()?;
    field_config::FieldConfig::load().context("failed to load fieldops configuration")
}

fn load_project_dotenv() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().context("failed to determine current directory")?;

    if let Some(project_root) = find_project_root(&cwd) {
        let env_path = project_root.join(".env");
        if env_path.exists() {
            dotenvy::from_path(&env_path)
                .with_context(|| format!("failed to load dotenv file at {}", env_path.display()))?;
            return Ok(());
        }
    }

    dotenvy::dotenv().ok();
    Ok(())
}
