mod project_root;

use field_config::FieldConfig;
use field_net::SessionLayer;

pub use project_root::find_project_root;

/// Everything a command handler needs, built once per invocation.
pub struct AppContext {
    pub config: FieldConfig,
    pub layer: SessionLayer,
}

impl AppContext {
    pub fn init(config: FieldConfig) -> anyhow::Result<Self> {
        let layer = SessionLayer::from_config(&config)?;
        Ok(Self { config, layer })
    }
}
