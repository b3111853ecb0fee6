#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Run git in `dir`, panicking on failure, and return stdout
pub fn run_git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn configure_user(repo_path: &Path) {
    run_git(repo_path, &["config", "user.name", "Test User"]);
    run_git(repo_path, &["config", "user.email", "test@example.com"]);
    run_git(repo_path, &["config", "commit.gpgsign", "false"]);
}

/// Helper to create a test git repository on branch `main`
pub fn create_test_repo() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let repo_path = temp_dir.path().to_path_buf();

    run_git(&repo_path, &["init", "-q"]);
    run_git(&repo_path, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    configure_user(&repo_path);

    (temp_dir, repo_path)
}

/// Helper to create a commit
pub fn create_commit(repo_path: &Path, file: &str, content: &str, message: &str) {
    fs::write(repo_path.join(file), content).expect("Failed to write file");
    run_git(repo_path, &["add", file]);
    run_git(repo_path, &["commit", "-q", "-m", message]);
}

/// A bare "Gerrit" origin with two review refs and a local clone of it
///
/// - `refs/changes/00/100/1` rewrites `shared.txt` and conflicts with the
///   clone's local commit.
/// - `refs/changes/00/200/1` adds `feature.txt` and applies cleanly.
pub struct GerritOrigin {
    _temp: TempDir,
    pub origin: PathBuf,
    pub seed: PathBuf,
    pub work: PathBuf,
}

pub const CONFLICTING_CHANGE: u64 = 100;
pub const CLEAN_CHANGE: u64 = 200;

impl GerritOrigin {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let seed = temp.path().join("seed");
        let origin = temp.path().join("origin.git");
        let work = temp.path().join("work");
        fs::create_dir(&seed).unwrap();

        run_git(&seed, &["init", "-q"]);
        run_git(&seed, &["symbolic-ref", "HEAD", "refs/heads/main"]);
        configure_user(&seed);
        create_commit(&seed, "shared.txt", "base\n", "Initial commit");

        let temp_path = temp.path();
        run_git(temp_path, &["clone", "-q", "--bare", "seed", "origin.git"]);
        let origin_url = origin.to_string_lossy().into_owned();

        create_commit(
            &seed,
            "shared.txt",
            "from review\n",
            "Rewrite shared file\n\nChange-Id: I1000000000000000000000000000000000000100",
        );
        run_git(&seed, &["push", "-q", &origin_url, "HEAD:refs/changes/00/100/1"]);

        run_git(&seed, &["reset", "-q", "--hard", "HEAD~1"]);
        create_commit(
            &seed,
            "feature.txt",
            "feature\n",
            "Add feature file\n\nChange-Id: I2000000000000000000000000000000000000200",
        );
        run_git(&seed, &["push", "-q", &origin_url, "HEAD:refs/changes/00/200/1"]);

        run_git(temp_path, &["clone", "-q", "origin.git", "work"]);
        configure_user(&work);
        create_commit(&work, "shared.txt", "local edit\n", "Local change");

        Self {
            _temp: temp,
            origin,
            seed,
            work,
        }
    }

    /// Advance `main` on the origin with a commit touching `shared.txt`
    pub fn advance_main(&self) {
        let origin_url = self.origin.to_string_lossy().into_owned();
        run_git(&self.seed, &["reset", "-q", "--hard", "HEAD~1"]);
        create_commit(&self.seed, "shared.txt", "upstream\n", "Upstream change");
        run_git(&self.seed, &["push", "-q", &origin_url, "HEAD:refs/heads/main"]);
    }
}
