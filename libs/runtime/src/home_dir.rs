//! Application home directory resolution.
//!
//! Unix/macOS default: `$HOME/<subdir>`. Windows default: `%APPDATA%/<subdir>`.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HomeDirError {
    #[error("cannot determine the user's home directory")]
    NoHome,
    #[error("home_dir must be absolute after expansion, got '{0}'")]
    NotAbsolute(String),
    #[error("failed to create home_dir '{path}': {source}")]
    Create {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

fn platform_base() -> Option<PathBuf> {
    if cfg!(target_os = "windows") {
        dirs::config_dir()
    } else {
        dirs::home_dir()
    }
}

/// Expand a leading `~` against `home`.
pub fn expand_tilde(raw: &str, home: &Path) -> PathBuf {
    if raw == "~" {
        home.to_path_buf()
    } else if let Some(rest) = raw.strip_prefix("~/").or_else(|| raw.strip_prefix("~\\")) {
        home.join(rest)
    } else {
        PathBuf::from(raw)
    }
}

/// Resolve the configured home dir, or the platform default when `None`.
///
/// The result is always absolute. With `create` the directory is created.
pub fn resolve_home_dir(
    configured: Option<String>,
    default_subdir: &str,
    create: bool,
) -> Result<PathBuf, HomeDirError> {
    let resolved = match configured.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => {
            if raw.starts_with('~') {
                let home = dirs::home_dir().ok_or(HomeDirError::NoHome)?;
                expand_tilde(raw, &home)
            } else {
                PathBuf::from(raw)
            }
        }
        _ => platform_base()
            .ok_or(HomeDirError::NoHome)?
            .join(default_subdir),
    };

    if !resolved.is_absolute() {
        return Err(HomeDirError::NotAbsolute(
            resolved.to_string_lossy().to_string(),
        ));
    }

    if create {
        std::fs::create_dir_all(&resolved).map_err(|source| HomeDirError::Create {
            path: resolved.to_string_lossy().to_string(),
            source,
        })?;
    }

    Ok(resolved)
}
