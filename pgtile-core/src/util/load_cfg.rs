use crate::config::{Settings, WINDOW_MANAGER_NAME};
use crate::error::{Error, Result};
use std::path::PathBuf;

/// Reads `<config dir>/pgtile/pgtile.toml`, keys left out keep their defaults.
pub(crate) fn load_cfg() -> Result<Settings> {
    let file_path = find_cfg_dir()
        .ok_or(Error::ConfigDirFind)?
        .join(WINDOW_MANAGER_NAME)
        .join(format!("{WINDOW_MANAGER_NAME}.toml"));
    crate::debug!("Attempting config read at {file_path:?}");
    let content = std::fs::read_to_string(&file_path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::ConfigFileFind
        } else {
            e.into()
        }
    })?;
    Ok(toml::from_str(&content)?)
}

fn find_cfg_dir() -> Option<PathBuf> {
    std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("HOME")
                .map(|home| PathBuf::from(home).join(".config"))
                .ok()
        })
}
