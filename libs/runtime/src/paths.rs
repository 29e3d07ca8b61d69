use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};

/// Resolve the server home directory into an absolute path.
///
/// - `Some(path)`: a leading `~` expands to the user's home; relative paths are
///   anchored at the current working directory.
/// - `None`: `%APPDATA%/<default_subdir>` on Windows, `$HOME/<default_subdir>` elsewhere.
///
/// With `create = true` the directory is created if missing.
pub fn resolve_home_dir(
    configured: Option<String>,
    default_subdir: &str,
    create: bool,
) -> Result<PathBuf> {
    let resolved = match configured {
        Some(raw) => expand_user_path(raw.trim())?,
        None => platform_base_dir()?.join(default_subdir),
    };

    let absolute = if resolved.is_absolute() {
        resolved
    } else {
        std::env::current_dir()
            .context("cannot determine current directory")?
            .join(resolved)
    };

    if create {
        std::fs::create_dir_all(&absolute)
            .with_context(|| format!("cannot create home dir {}", absolute.display()))?;
    }
    Ok(absolute)
}

fn expand_user_path(raw: &str) -> Result<PathBuf> {
    if raw == "~" {
        return user_home();
    }
    if let Some(rest) = raw.strip_prefix("~/").or_else(|| raw.strip_prefix("~\\")) {
        return Ok(user_home()?.join(rest));
    }
    Ok(Path::new(raw).to_path_buf())
}

fn user_home() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| anyhow!("user home directory is not available"))
}

#[cfg(target_os = "windows")]
fn platform_base_dir() -> Result<PathBuf> {
    dirs::config_dir().ok_or_else(|| anyhow!("%APPDATA% is not available"))
}

#[cfg(not(target_os = "windows"))]
fn platform_base_dir() -> Result<PathBuf> {
    user_home()
}
