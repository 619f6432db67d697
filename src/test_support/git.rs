//! Git repository fixtures for tests.

use std::path::Path;

use git2::Repository;

/// Initialize a repository at `path` with a usable committer identity.
pub fn init_repo(path: &Path) -> Repository {
    let repo = Repository::init(path).unwrap();
    {
        let mut config = repo.config().unwrap();
        config.set_str("user.name", "test").unwrap();
        config.set_str("user.email", "test@example.com").unwrap();
    }
    repo
}

/// Write `name` in the work tree, stage it and commit. Returns the new
/// commit's full hex id.
pub fn commit_file(repo: &Repository, name: &str, content: &str, message: &str) -> String {
    let workdir = repo.workdir().unwrap();
    let file = workdir.join(name);
    if let Some(parent) = file.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&file, content).unwrap();

    let mut index = repo.index().unwrap();
    index.add_path(Path::new(name)).unwrap();
    index.write().unwrap();
    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();

    let signature = repo.signature().unwrap();
    let parent = repo.head().ok().and_then(|head| head.peel_to_commit().ok());
    let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

    let id = repo
        .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
        .unwrap();
    id.to_string()
}
