//! Test identity: `<relative file path>:<md5(group#method)>`.
//!
//! The digest input deliberately excludes the file path, so moving a file changes only the prefix of the ID
//! while the digest keeps correlating history for the same group/method pair.

use std::path::{Component, Path};

/// Separator between the group and method names in the digest input.
pub const DIGEST_SEPARATOR: char = '#';

/// Compute the hex digest for a `(group, method)` pair.
///
/// ## Notes
/// - MD5 is used as a fixed-width fingerprint, not for security. 32 hex chars.
pub fn test_digest(group: &str, method: &str) -> String {
    format!("{:x}", md5::compute(format!("{group}{DIGEST_SEPARATOR}{method}")))
}

/// Compute the stable test ID for a test case whose file path is already relative to the project root.
///
/// ## Examples
/// ```rust
/// use selective_core::test_id;
/// let id = test_id("tests/math.rs", "math", "adds");
/// assert!(id.starts_with("tests/math.rs:"));
/// assert_eq!(id.len(), "tests/math.rs:".len() + 32);
/// ```
pub fn test_id(relative_path: &str, group: &str, method: &str) -> String {
    format!("{relative_path}:{}", test_digest(group, method))
}

/// Normalize `path` to a `/`-separated path relative to `root`.
///
/// ## Returns
/// - `Some(path)` for paths inside `root` (or already relative paths that stay inside it).
/// - `None` for absolute paths outside `root` and for relative paths escaping it via `..`. Callers drop
///   such test cases: an absolute path must never leak into a test ID.
pub fn normalize_path(path: &Path, root: &Path) -> Option<String> {
    let relative = if path.is_absolute() {
        path.strip_prefix(root).ok()?
    } else {
        path
    };

    let mut parts: Vec<&str> = Vec::new();
    for component in relative.components() {
        match component {
            Component::CurDir => {}
            Component::Normal(part) => parts.push(part.to_str()?),
            Component::ParentDir => {
                parts.pop()?;
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    if parts.is_empty() { None } else { Some(parts.join("/")) }
}

/// Return the file path prefix of a test ID (everything before the last `:`).
pub fn id_file_path(test_id: &str) -> &str {
    test_id.rsplit_once(':').map_or(test_id, |(path, _)| path)
}
