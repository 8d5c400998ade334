//! Helpers shared across commands.

use std::path::Path;

use anyhow::Result;
use savediff_core::{Buffer, CancelToken, Config, load_buffer};
use tracing::{info, warn};

/// Config file picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "savediff.toml";

/// Load the run configuration.
///
/// A missing file falls back to defaults with a warning; a file that exists
/// but does not parse is an error.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let (path, explicit) = match path {
        Some(path) => (path, true),
        None => (Path::new(DEFAULT_CONFIG_FILE), false),
    };

    if !path.exists() {
        if explicit {
            warn!("Config file {:?} not found, using defaults", path);
        }
        return Ok(Config::default());
    }

    let config = Config::load(path)?;
    info!("Loaded config from {:?}", path);
    Ok(config)
}

/// Load a save container (largest frame) or a raw decompressed buffer.
pub fn open_buffer(config: &Config, path: &Path) -> savediff_core::Result<Buffer> {
    load_buffer(path, &config.container, &CancelToken::new())
}

/// Map an error chain to the process exit code of the first core error in it.
pub fn exit_code(error: &anyhow::Error) -> u8 {
    error
        .chain()
        .find_map(|cause| cause.downcast_ref::<savediff_core::Error>())
        .map_or(1, savediff_core::Error::exit_code)
}
