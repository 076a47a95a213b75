//! Path resolution module
//!
//! Maps a URL path (base prefix already stripped) to a filesystem path
//! under the configured root. Traversal attempts are rejected before any
//! filesystem I/O when they are visible syntactically; symlink escapes are
//! caught after canonicalization.

use crate::error::ServeError;
use crate::http::escape;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

/// A target that exists on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    /// Canonical absolute path, guaranteed to be under the root
    pub path: PathBuf,
    pub is_dir: bool,
}

/// Resolution outcome. Nonexistence is an ordinary outcome, not an error.
#[derive(Debug)]
pub enum Resolution {
    Found(ResolvedTarget),
    NotFound,
}

/// Resolve a raw URL path against the canonical root directory.
///
/// Steps: percent-decode, normalize `.`/`..` segments, join to the root,
/// canonicalize, verify the canonical result still lives under the root.
pub async fn resolve(root: &Path, raw_path: &str) -> Result<Resolution, ServeError> {
    let decoded = escape::percent_decode(raw_path).ok_or_else(|| {
        ServeError::BadRequest(format!("malformed percent-encoding in '{raw_path}'"))
    })?;
    if decoded.contains('\0') {
        return Err(ServeError::BadRequest("NUL byte in path".to_string()));
    }

    let segments = normalize_segments(&decoded)?;
    let mut candidate = root.to_path_buf();
    for segment in &segments {
        candidate.push(segment);
    }

    let canonical = match fs::canonicalize(&candidate).await {
        Ok(p) => p,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Resolution::NotFound),
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            return Err(ServeError::Forbidden(format!(
                "access denied for '{decoded}'"
            )));
        }
        Err(e) => return Err(e.into()),
    };

    // A symlink inside the root may still point anywhere on disk
    if !canonical.starts_with(root) {
        log::warn!(
            "Path traversal attempt blocked: {raw_path} -> {}",
            canonical.display()
        );
        return Err(ServeError::Forbidden(format!(
            "path '{decoded}' escapes the served directory"
        )));
    }

    let metadata = match fs::metadata(&canonical).await {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Resolution::NotFound),
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            return Err(ServeError::Forbidden(format!(
                "access denied for '{decoded}'"
            )));
        }
        Err(e) => return Err(e.into()),
    };

    Ok(Resolution::Found(ResolvedTarget {
        path: canonical,
        is_dir: metadata.is_dir(),
    }))
}

/// Collapse a decoded URL path into plain segments.
///
/// Empty and `.` segments disappear; `..` pops the previous segment. A
/// `..` with nothing left to pop would climb above the root, so it is
/// rejected here, before any filesystem access.
pub fn normalize_segments(path: &str) -> Result<Vec<&str>, ServeError> {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(ServeError::Forbidden(
                        "path climbs above the served directory".to_string(),
                    ));
                }
            }
            s => segments.push(s),
        }
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_plain() {
        assert_eq!(normalize_segments("/a/b.txt").unwrap(), vec!["a", "b.txt"]);
        assert_eq!(normalize_segments("/").unwrap(), Vec::<&str>::new());
    }

    #[test]
    fn test_normalize_dot_segments() {
        assert_eq!(normalize_segments("/a/./b").unwrap(), vec!["a", "b"]);
        assert_eq!(normalize_segments("/a//b").unwrap(), vec!["a", "b"]);
        assert_eq!(normalize_segments("/a/b/../c").unwrap(), vec!["a", "c"]);
        assert_eq!(normalize_segments("/a/..").unwrap(), Vec::<&str>::new());
    }

    #[test]
    fn test_normalize_rejects_escape() {
        assert!(matches!(
            normalize_segments("/.."),
            Err(ServeError::Forbidden(_))
        ));
        assert!(matches!(
            normalize_segments("/../etc/passwd"),
            Err(ServeError::Forbidden(_))
        ));
        assert!(matches!(
            normalize_segments("/a/../../etc"),
            Err(ServeError::Forbidden(_))
        ));
    }

    async fn test_root(name: &str) -> PathBuf {
        let root = std::env::temp_dir().join(format!(
            "staticserve-resolve-{}-{name}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&root).await;
        fs::create_dir_all(root.join("sub")).await.unwrap();
        fs::write(root.join("a.txt"), b"hi").await.unwrap();
        fs::write(root.join("sub/b.txt"), b"deep").await.unwrap();
        fs::canonicalize(&root).await.unwrap()
    }

    #[tokio::test]
    async fn test_resolve_file_and_dir() {
        let root = test_root("basics").await;

        match resolve(&root, "/a.txt").await.unwrap() {
            Resolution::Found(t) => {
                assert!(!t.is_dir);
                assert_eq!(t.path, root.join("a.txt"));
            }
            Resolution::NotFound => panic!("expected file"),
        }

        match resolve(&root, "/sub").await.unwrap() {
            Resolution::Found(t) => assert!(t.is_dir),
            Resolution::NotFound => panic!("expected directory"),
        }

        match resolve(&root, "/").await.unwrap() {
            Resolution::Found(t) => {
                assert!(t.is_dir);
                assert_eq!(t.path, root);
            }
            Resolution::NotFound => panic!("expected root"),
        }

        fs::remove_dir_all(&root).await.unwrap();
    }

    #[tokio::test]
    async fn test_resolve_missing_is_not_found() {
        let root = test_root("missing").await;
        assert!(matches!(
            resolve(&root, "/nope.txt").await.unwrap(),
            Resolution::NotFound
        ));
        fs::remove_dir_all(&root).await.unwrap();
    }

    #[tokio::test]
    async fn test_resolve_traversal_forbidden() {
        let root = test_root("traversal").await;
        assert!(matches!(
            resolve(&root, "/../etc/passwd").await,
            Err(ServeError::Forbidden(_))
        ));
        // Encoded form decodes to the same escape
        assert!(matches!(
            resolve(&root, "/%2e%2e/%2e%2e/etc/passwd").await,
            Err(ServeError::Forbidden(_))
        ));
        // Climbing inside the tree and back out again is fine
        assert!(matches!(
            resolve(&root, "/sub/../a.txt").await.unwrap(),
            Resolution::Found(_)
        ));
        fs::remove_dir_all(&root).await.unwrap();
    }

    #[tokio::test]
    async fn test_resolve_bad_encoding() {
        let root = test_root("encoding").await;
        assert!(matches!(
            resolve(&root, "/bad%zz").await,
            Err(ServeError::BadRequest(_))
        ));
        fs::remove_dir_all(&root).await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_resolve_symlink_escape_forbidden() {
        let root = test_root("symlink").await;
        let outside = std::env::temp_dir().join(format!(
            "staticserve-resolve-outside-{}",
            std::process::id()
        ));
        fs::write(&outside, b"secret").await.unwrap();
        tokio::fs::symlink(&outside, root.join("leak")).await.unwrap();

        assert!(matches!(
            resolve(&root, "/leak").await,
            Err(ServeError::Forbidden(_))
        ));

        fs::remove_file(&outside).await.unwrap();
        fs::remove_dir_all(&root).await.unwrap();
    }
}
