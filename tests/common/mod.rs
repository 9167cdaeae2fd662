//! Shared fixtures for the integration tests

#![allow(dead_code)]

use git2::{Oid, Repository, Signature, Time};
use std::path::Path;
use tempfile::TempDir;

pub const DAY: i64 = 86_400;
pub const JAN_1_2024: i64 = 1_704_067_200;

pub const ALICE: (&str, &str) = ("alice", "alice@x.com");
pub const BOB: (&str, &str) = ("bob", "bob@x.com");

pub fn commit_file(
    repo: &Repository,
    path: &str,
    content: &str,
    (name, email): (&str, &str),
    when: i64,
    message: &str,
) -> anyhow::Result<Oid> {
    let root = repo.workdir().expect("fixture repo has a workdir");
    if let Some(parent) = root.join(path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(root.join(path), content)?;
    let mut index = repo.index()?;
    index.add_path(Path::new(path))?;
    index.write()?;
    let tree = repo.find_tree(index.write_tree()?)?;

    let sig = Signature::new(name, email, &Time::new(when, 0))?;
    let parents = match repo.head() {
        Ok(head) => vec![head.peel_to_commit()?],
        Err(_) => vec![],
    };
    let parent_refs: Vec<&git2::Commit> = parents.iter().collect();
    Ok(repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)?)
}

pub fn numbered_lines(n: usize) -> String {
    (1..=n).map(|i| format!("line {i}\n")).collect()
}

/// alice adds file1.py, bob fixes it, alice adds src/file2.py; HEAD is
/// tagged v1.0.
pub fn three_commit_repo() -> anyhow::Result<TempDir> {
    let dir = tempfile::tempdir()?;
    let repo = Repository::init(dir.path())?;

    commit_file(&repo, "file1.py", &numbered_lines(10), ALICE, JAN_1_2024, "Add file1")?;
    let modified = numbered_lines(10).replacen("line 1\n", "changed 1\n", 1) + "line 11\n";
    commit_file(&repo, "file1.py", &modified, BOB, JAN_1_2024 + DAY, "Fix off-by-one in file1")?;
    let head = commit_file(
        &repo,
        "src/file2.py",
        &numbered_lines(5),
        ALICE,
        JAN_1_2024 + 2 * DAY,
        "Add file2",
    )?;

    let head_obj = repo.find_object(head, None)?;
    repo.tag_lightweight("v1.0", &head_obj, false)?;
    Ok(dir)
}

/// Environment lookup that only knows the cache directory, so tests never
/// pick up a developer's Neo4j or API keys.
pub fn isolated_env(cache_dir: &Path) -> impl Fn(&str) -> Option<String> {
    let cache = cache_dir.display().to_string();
    move |key| (key == "REPOCHAT_CACHE_DIR").then(|| cache.clone())
}
