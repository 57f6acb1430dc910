pub mod demo;
pub mod inspect;
pub mod run;

use clap::ArgMatches;
use markforge_core::config::RunConfig;
use markforge_core::error::{MppError, MppResult};
use markforge_core::scene::SceneDefinition;
use std::path::Path;
use tracing::info;

/// File values first, then whatever was typed on the command line.
pub fn resolve_config(
    file: Option<&Path>,
    cli: &RunConfig,
    matches: Option<&ArgMatches>,
) -> MppResult<RunConfig> {
    let Some(path) = file else {
        return Ok(cli.clone());
    };
    info!("⚙️  Loading config: {}", path.display());
    let mut config = RunConfig::load_from_file(path).map_err(MppError::Config)?;
    if let Some(m) = matches {
        config.merge_from_cli(cli, m);
    }
    Ok(config)
}

pub fn load_scene(path: &Path) -> MppResult<SceneDefinition> {
    info!("📂 Loading scene: {}", path.display());
    SceneDefinition::load_from_file(path).map_err(MppError::Validation)
}
