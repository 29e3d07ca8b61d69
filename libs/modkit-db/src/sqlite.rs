//! SQLite DSN helpers.

use std::path::{Path, PathBuf};

const MEMORY_DSN: &str = "sqlite::memory:";

/// `sqlite::memory:`, `sqlite://:memory:` or any DSN carrying `mode=memory`.
pub fn is_memory_dsn(dsn: &str) -> bool {
    let dsn = dsn.trim();
    if dsn.eq_ignore_ascii_case(MEMORY_DSN) || dsn.eq_ignore_ascii_case("sqlite://:memory:") {
        return true;
    }
    dsn.split_once('?').is_some_and(|(_, query)| {
        query
            .split('&')
            .any(|pair| pair.eq_ignore_ascii_case("mode=memory"))
    })
}

/// Rewrite a file DSN so its path is absolute, anchoring relative paths at
/// `base_dir`. In-memory DSNs are normalized to `sqlite::memory:`.
///
/// Backslashes become forward slashes so the result is a valid URL on Windows.
pub fn absolutize_dsn(dsn: &str, base_dir: &Path) -> Result<String, crate::DbError> {
    if is_memory_dsn(dsn) {
        return Ok(MEMORY_DSN.to_string());
    }
    let rest = dsn
        .trim()
        .strip_prefix("sqlite://")
        .or_else(|| dsn.trim().strip_prefix("sqlite:"))
        .ok_or_else(|| crate::DbError::UnsupportedDsn(dsn.to_string()))?;

    let (path_part, query) = match rest.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (rest, None),
    };
    if path_part.is_empty() {
        return Err(crate::DbError::UnsupportedDsn(dsn.to_string()));
    }

    let mut path = PathBuf::from(path_part);
    if path.is_relative() {
        path = base_dir.join(path);
    }

    let mut out = format!("sqlite://{}", path.to_string_lossy().replace('\\', "/"));
    if let Some(q) = query {
        out.push('?');
        out.push_str(q);
    }
    Ok(out)
}

/// Filesystem path of a file DSN, if it names one.
pub(crate) fn file_path(dsn: &str) -> Option<PathBuf> {
    if is_memory_dsn(dsn) {
        return None;
    }
    let rest = dsn
        .trim()
        .strip_prefix("sqlite://")
        .or_else(|| dsn.trim().strip_prefix("sqlite:"))?;
    let path = rest.split_once('?').map_or(rest, |(p, _)| p);
    (!path.is_empty()).then(|| PathBuf::from(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_forms_are_recognized() {
        assert!(is_memory_dsn("sqlite::memory:"));
        assert!(is_memory_dsn("sqlite://:memory:"));
        assert!(is_memory_dsn("sqlite://file.db?mode=memory&cache=shared"));
        assert!(!is_memory_dsn("sqlite://data/campus.db"));
    }

    #[test]
    fn relative_paths_are_anchored_at_base() {
        let base = Path::new("/srv/campus");
        let out = absolutize_dsn("sqlite://database/campus.db?mode=rwc", base).unwrap();
        assert_eq!(out, "sqlite:///srv/campus/database/campus.db?mode=rwc");
    }

    #[test]
    fn absolute_paths_are_kept() {
        let out = absolutize_dsn("sqlite:///var/lib/campus.db", Path::new("/ignored")).unwrap();
        assert_eq!(out, "sqlite:///var/lib/campus.db");
    }

    #[test]
    fn memory_is_normalized_and_foreign_schemes_rejected() {
        assert_eq!(
            absolutize_dsn("sqlite://:memory:", Path::new("/x")).unwrap(),
            "sqlite::memory:"
        );
        assert!(absolutize_dsn("postgres://localhost/db", Path::new("/x")).is_err());
        assert!(absolutize_dsn("sqlite://", Path::new("/x")).is_err());
    }

    #[test]
    fn file_path_strips_query() {
        assert_eq!(
            file_path("sqlite:///tmp/a.db?mode=rwc"),
            Some(PathBuf::from("/tmp/a.db"))
        );
        assert_eq!(file_path("sqlite::memory:"), None);
    }
}
