//! Config file location.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};

/// Config file name inside the config directory.
const CONFIG_FILE: &str = "config.toml";

/// Resolves the config file path.
///
/// `--dir` wins; otherwise `$XDG_CONFIG_HOME/moviesearch/config.toml`, then
/// `~/.config/moviesearch/config.toml`.
///
/// # Errors
///
/// Returns an error if `dir` is `None` and neither `XDG_CONFIG_HOME` nor
/// `HOME` is usable.
pub fn resolve_config_path(dir: Option<&PathBuf>) -> Result<PathBuf> {
    let config_dir = match dir {
        Some(d) => d.clone(),
        None => default_config_dir(
            std::env::var_os("XDG_CONFIG_HOME"),
            std::env::var_os("HOME"),
        )?,
    };
    Ok(config_dir.join(CONFIG_FILE))
}

/// Picks the config directory. Relative `XDG_CONFIG_HOME` values are ignored.
fn default_config_dir(
    xdg_config_home: Option<OsString>,
    home: Option<OsString>,
) -> Result<PathBuf> {
    if let Some(xdg) = xdg_config_home
        .map(PathBuf::from)
        .filter(|p| p.is_absolute())
    {
        return Ok(xdg.join("moviesearch"));
    }
    let Some(home) = home.filter(|h| !h.is_empty()) else {
        bail!("cannot locate config directory: neither XDG_CONFIG_HOME nor HOME is set");
    };
    Ok(Path::new(&home).join(".config").join("moviesearch"))
}
