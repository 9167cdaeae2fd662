//! Cache path utilities - snapshots live under ~/.cache/repochat/graphs/

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Default cache root: ~/.cache/repochat on Unix, %LOCALAPPDATA%/repochat on Windows.
pub fn default_cache_root() -> PathBuf {
    let base = if cfg!(windows) {
        std::env::var("LOCALAPPDATA")
            .map(PathBuf::from)
            .unwrap_or_else(|_| dirs::cache_dir().unwrap_or_else(|| PathBuf::from(".")))
    } else {
        dirs::cache_dir().unwrap_or_else(|| {
            // Fallback to ~/.cache
            dirs::home_dir()
                .map(|h| h.join(".cache"))
                .unwrap_or_else(|| PathBuf::from("."))
        })
    };
    base.join("repochat")
}

/// Repository name as used for the graph's Repository node: the directory
/// name of the canonical path.
pub fn repo_name(repo_path: &Path) -> String {
    let canonical = repo_path
        .canonicalize()
        .unwrap_or_else(|_| repo_path.to_path_buf());
    canonical
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "repository".to_string())
}

/// Keep only characters that are safe in a file name on every platform.
pub fn sanitize_repo_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
        .take(40)
        .collect();
    if sanitized.is_empty() {
        "repo".to_string()
    } else {
        sanitized
    }
}

/// Snapshot file for a repository.
///
/// The sanitized directory name keeps the file recognizable; the hash of the
/// canonical path keeps two checkouts with the same name apart.
pub fn snapshot_path(cache_root: &Path, repo_path: &Path) -> PathBuf {
    let canonical = repo_path
        .canonicalize()
        .unwrap_or_else(|_| repo_path.to_path_buf());
    let digest = Sha256::digest(canonical.to_string_lossy().as_bytes());
    let hash: String = digest.iter().take(6).map(|b| format!("{b:02x}")).collect();

    cache_root.join("graphs").join(format!(
        "{}-{}.json",
        sanitize_repo_name(&repo_name(repo_path)),
        hash
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_repo_name() {
        assert_eq!(sanitize_repo_name("my-project"), "my-project");
        assert_eq!(sanitize_repo_name("../etc/passwd"), "etcpasswd");
        assert_eq!(sanitize_repo_name("a b.c"), "abc");
        assert_eq!(sanitize_repo_name("..."), "repo");
    }

    #[test]
    fn test_snapshot_path_deterministic() {
        let root = Path::new("/tmp/cache");
        let path = Path::new("/home/user/my-project");
        let first = snapshot_path(root, path);
        assert_eq!(first, snapshot_path(root, path));
        assert!(first.starts_with("/tmp/cache/graphs"));

        let file = first.file_name().unwrap().to_string_lossy().to_string();
        assert!(file.starts_with("my-project-"));
        assert!(file.ends_with(".json"));
        assert_eq!(file.len(), "my-project-".len() + 12 + ".json".len());
    }

    #[test]
    fn test_same_name_different_checkouts_do_not_collide() {
        let root = Path::new("/tmp/cache");
        assert_ne!(
            snapshot_path(root, Path::new("/a/project")),
            snapshot_path(root, Path::new("/b/project"))
        );
    }

    #[test]
    fn test_default_cache_root() {
        assert!(default_cache_root().ends_with("repochat"));
    }
}
