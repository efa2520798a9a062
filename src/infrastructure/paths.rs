//! Locations of on-disk state.
//!
//! Everything the core writes (the local store file and the rotating log)
//! lives under one data directory, resolved in this order:
//!
//! 1. `TODO_CORE_DATA_DIR`
//! 2. `$XDG_DATA_HOME/todo-core`
//! 3. `$HOME/.local/share/todo-core`
//! 4. `<temp dir>/todo-core`

use std::env;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "todo-core";

/// File name of the JSON local store inside the data directory.
pub const STORE_FILE: &str = "local.json";

/// File name of the log inside the data directory.
pub const LOG_FILE: &str = "todo-core.log";

/// Returns the default data directory.
///
/// # Examples
///
/// ```
/// use todo_core::infrastructure::get_data_dir;
///
/// let data_dir = get_data_dir();
/// assert!(data_dir.ends_with("todo-core") || std::env::var_os("TODO_CORE_DATA_DIR").is_some());
/// ```
#[must_use]
pub fn get_data_dir() -> PathBuf {
    if let Some(dir) = env::var_os("TODO_CORE_DATA_DIR").filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }
    if let Some(xdg) = env::var_os("XDG_DATA_HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(xdg).join(APP_DIR);
    }
    if let Some(home) = env::var_os("HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(home).join(".local").join("share").join(APP_DIR);
    }
    env::temp_dir().join(APP_DIR)
}

/// Uses `configured` when set (with `~` expanded), else [`get_data_dir`].
#[must_use]
pub fn resolve_data_dir(configured: Option<&Path>) -> PathBuf {
    configured.map_or_else(get_data_dir, |path| {
        path.to_str()
            .map_or_else(|| path.to_path_buf(), |s| PathBuf::from(expand_tilde(s)))
    })
}

/// Expands a leading `~` to `$HOME`. Paths without one, or a missing `$HOME`,
/// are returned unchanged.
///
/// # Examples
///
/// ```
/// use todo_core::infrastructure::expand_tilde;
///
/// assert_eq!(expand_tilde("/absolute/path"), "/absolute/path");
/// ```
#[must_use]
pub fn expand_tilde(path: &str) -> String {
    let Some(home) = env::var("HOME").ok().filter(|h| !h.is_empty()) else {
        return path.to_string();
    };
    if path == "~" {
        home
    } else if let Some(rest) = path.strip_prefix("~/") {
        format!("{}/{rest}", home.trim_end_matches('/'))
    } else {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_dir_wins() {
        let dir = resolve_data_dir(Some(Path::new("/srv/todo")));
        assert_eq!(dir, PathBuf::from("/srv/todo"));
    }

    #[test]
    fn non_tilde_paths_untouched() {
        assert_eq!(expand_tilde("relative/dir"), "relative/dir");
        assert_eq!(expand_tilde("/a/~/b"), "/a/~/b");
    }
}
