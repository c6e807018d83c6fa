use std::path::PathBuf;

use dirs_next::home_dir;

/// Expand a leading `~` to the home directory for configured file paths.
/// Paths without one are only trimmed.
pub fn expand_tilde(path: &str) -> PathBuf {
    let trimmed = path.trim();
    let home = || home_dir().unwrap_or_else(|| PathBuf::from("~"));
    match trimmed {
        "~" => home(),
        _ => match trimmed.strip_prefix("~/").or_else(|| trimmed.strip_prefix("~\\")) {
            Some(rest) => home().join(rest),
            None => PathBuf::from(trimmed),
        },
    }
}

/// Lexically clean a slash-separated path.
///
/// Follows the classic rules: collapse repeated separators, drop `.`
/// elements, resolve `name/..` pairs, drop `..` directly under the root, and
/// strip trailing separators. An empty result becomes `.` (or `/` when the
/// input was rooted). No filesystem access is performed.
///
/// ```rust
/// use runny_util::clean_path;
///
/// assert_eq!(clean_path("/home//user/./docs/"), "/home/user/docs");
/// assert_eq!(clean_path("a/b/../c"), "a/c");
/// assert_eq!(clean_path("/../etc"), "/etc");
/// assert_eq!(clean_path(""), ".");
/// ```
pub fn clean_path(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }

    let rooted = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.last().is_some_and(|last| *last != "..") {
                    segments.pop();
                } else if !rooted {
                    segments.push("..");
                }
            }
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    if rooted {
        format!("/{joined}")
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

/// Returns true when `path` is already in cleaned form and never climbs out
/// of its base through a `..` element.
pub fn is_clean_path(path: &str) -> bool {
    clean_path(path) == path && !path.split('/').any(|segment| segment == "..")
}
