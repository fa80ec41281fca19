//! Small helpers shared across modules.

use std::path::PathBuf;

/// Joins `file_name` to `dir_path` with the platform separator.
///
/// Non UTF-8 characters are replaced, the data directory is chosen by the
/// operator so this never happens in practice.
///
/// # Examples
///
/// ```ignore
/// let path = get_path("/var/lib/profilebot", "templates.json");
/// assert_eq!(path, "/var/lib/profilebot/templates.json");
/// ```
pub fn get_path(dir_path: &str, file_name: &str) -> String {
    let path_buf: PathBuf = [dir_path, file_name].iter().collect();
    path_buf.to_string_lossy().into_owned()
}

/// Returns the local part of a Matrix user ID, `profilebot` for `@profilebot:example.com`.
pub fn localpart(user_id: &str) -> &str {
    let without_sigil = user_id.strip_prefix('@').unwrap_or(user_id);
    without_sigil
        .split_once(':')
        .map_or(without_sigil, |(localpart, _)| localpart)
}
