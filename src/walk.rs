//! Recursive file enumeration with composable filters.
//!
//! ```text
//! FileWalker::new("photos")?
//!     .filter_by_extension(&["png", "jpg"])
//!     .walk()          // lazy: yields paths as the tree is descended
//! ```
//!
//! Filters are AND-composed: a file is yielded only if every registered
//! filter accepts it. With no filters, every regular file is yielded.
//! Symlinks to files are yielded under the link's path; symlinked
//! directories are not descended and dangling links are skipped.
//! Traversal order follows the filesystem and is not stable across runs.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum WalkError {
    #[error("Directory not found or readable at {0}")]
    DirectoryNotFound(PathBuf),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

type PathFilter = Box<dyn Fn(&Path) -> bool>;

pub struct FileWalker {
    root: PathBuf,
    filters: Vec<PathFilter>,
}

impl FileWalker {
    /// Fails with [`WalkError::DirectoryNotFound`] unless `root` is a readable directory.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, WalkError> {
        let root = root.into();
        if !is_readable_dir(&root) {
            return Err(WalkError::DirectoryNotFound(root));
        }
        Ok(Self {
            root,
            filters: Vec::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn add_filter(mut self, filter: impl Fn(&Path) -> bool + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Accept files whose extension (without the dot) is one of `extensions`.
    /// Matching is case-sensitive.
    pub fn filter_by_extension(self, extensions: &[&str]) -> Self {
        let allowed: Vec<String> = extensions.iter().map(|e| e.to_string()).collect();
        self.add_filter(move |path| {
            path.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| allowed.iter().any(|a| a == ext))
        })
    }

    /// Consume the walker and descend the tree lazily.
    pub fn walk(self) -> Walk {
        Walk {
            inner: WalkDir::new(&self.root).into_iter(),
            filters: self.filters,
        }
    }
}

/// Lazy, non-restartable sequence of matching file paths.
pub struct Walk {
    inner: walkdir::IntoIter,
    filters: Vec<PathFilter>,
}

impl Walk {
    fn accepts(&self, path: &Path) -> bool {
        self.filters.iter().all(|f| f(path))
    }
}

impl Iterator for Walk {
    type Item = Result<PathBuf, WalkError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(e) => return Some(Err(e.into())),
            };
            if !is_file_entry(&entry) {
                continue;
            }
            if self.accepts(entry.path()) {
                return Some(Ok(entry.into_path()));
            }
        }
    }
}

fn is_file_entry(entry: &walkdir::DirEntry) -> bool {
    if entry.path_is_symlink() {
        // Follows the link; false when it dangles or targets a directory.
        return entry.path().is_file();
    }
    entry.file_type().is_file()
}

pub(crate) fn is_readable_dir(path: &Path) -> bool {
    path.is_dir() && fs::read_dir(path).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::write_file_tree;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    /// Ten files across nested directories, four of them `.ext1`.
    const TREE: &[&str] = &[
        "file0.ext1",
        "file0.ext2",
        "p1/file1.ext2",
        "p1/p11/file11.ext1",
        "p1/p11/file11.ext2",
        "p1/p12/file12.ext3",
        "p2/file2.ext1",
        "p2/p22/file22.ext1",
        "p2/p22/file22.ext2",
        "p2/p22/noext",
    ];

    fn collect(walker: FileWalker, root: &Path) -> BTreeSet<String> {
        walker
            .walk()
            .map(|p| {
                p.unwrap()
                    .strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn walks_every_file_recursively() {
        let tmp = TempDir::new().unwrap();
        write_file_tree(tmp.path(), TREE);

        let files = collect(FileWalker::new(tmp.path()).unwrap(), tmp.path());
        assert_eq!(files.len(), 10);
        assert!(files.contains("p2/p22/file22.ext2"));
        assert!(files.contains("p2/p22/noext"));
    }

    #[test]
    fn extension_filter_selects_subset() {
        let tmp = TempDir::new().unwrap();
        write_file_tree(tmp.path(), TREE);

        let walker = FileWalker::new(tmp.path())
            .unwrap()
            .filter_by_extension(&["ext1"]);
        let files = collect(walker, tmp.path());
        let expected: BTreeSet<String> = [
            "file0.ext1",
            "p1/p11/file11.ext1",
            "p2/file2.ext1",
            "p2/p22/file22.ext1",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        assert_eq!(files, expected);
    }

    #[test]
    fn extension_filter_is_case_sensitive() {
        let tmp = TempDir::new().unwrap();
        write_file_tree(tmp.path(), &["a.png", "b.PNG"]);

        let walker = FileWalker::new(tmp.path())
            .unwrap()
            .filter_by_extension(&["png"]);
        let files = collect(walker, tmp.path());
        assert_eq!(files.into_iter().collect::<Vec<_>>(), vec!["a.png"]);
    }

    #[test]
    fn filters_are_and_composed() {
        let tmp = TempDir::new().unwrap();
        write_file_tree(tmp.path(), TREE);

        let walker = FileWalker::new(tmp.path())
            .unwrap()
            .filter_by_extension(&["ext1", "ext2"])
            .add_filter(|p| p.components().any(|c| c.as_os_str() == "p2"));
        let files = collect(walker, tmp.path());
        assert_eq!(files.len(), 3);
        assert!(files.iter().all(|f| f.starts_with("p2/")));
    }

    #[test]
    fn walking_twice_yields_same_set() {
        let tmp = TempDir::new().unwrap();
        write_file_tree(tmp.path(), TREE);

        let first = collect(FileWalker::new(tmp.path()).unwrap(), tmp.path());
        let second = collect(FileWalker::new(tmp.path()).unwrap(), tmp.path());
        assert_eq!(first, second);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_files_are_yielded() {
        use std::os::unix::fs::symlink;

        let tmp = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        write_file_tree(tmp.path(), &["a.png"]);
        write_file_tree(outside.path(), &["b.png", "dir/c.png"]);
        symlink(outside.path().join("b.png"), tmp.path().join("b.png")).unwrap();
        symlink(outside.path().join("dir"), tmp.path().join("linked_dir")).unwrap();
        symlink(outside.path().join("gone.png"), tmp.path().join("dangling.png")).unwrap();

        let walker = FileWalker::new(tmp.path())
            .unwrap()
            .filter_by_extension(&["png"]);
        let files = collect(walker, tmp.path());
        assert_eq!(
            files.into_iter().collect::<Vec<_>>(),
            vec!["a.png", "b.png"]
        );
    }

    #[test]
    fn missing_directory_errors() {
        let tmp = TempDir::new().unwrap();
        let result = FileWalker::new(tmp.path().join("invalid_dir_tree"));
        assert!(matches!(result, Err(WalkError::DirectoryNotFound(_))));
    }

    #[test]
    fn file_root_errors() {
        let tmp = TempDir::new().unwrap();
        write_file_tree(tmp.path(), &["plain.txt"]);
        let result = FileWalker::new(tmp.path().join("plain.txt"));
        assert!(matches!(result, Err(WalkError::DirectoryNotFound(_))));
    }
}
