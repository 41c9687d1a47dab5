//! Listed directory trees
//!
//! A [`FileTree`] describes the contents of one directory at a single point
//! in time: every entry name maps to either a file size or a nested tree.
//! Trees are built by a storage adapter during listing, compared by the
//! sync engine and dropped at the end of the run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Kind of a tree entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    File,
    Directory,
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryKind::File => write!(f, "file"),
            EntryKind::Directory => write!(f, "directory"),
        }
    }
}

/// A single entry of a [`FileTree`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    /// A regular file and its size in bytes
    File { size: u64 },
    /// A subdirectory and its listed contents
    Directory(FileTree),
}

impl Node {
    /// Returns the kind of this entry
    #[must_use]
    pub fn kind(&self) -> EntryKind {
        match self {
            Node::File { .. } => EntryKind::File,
            Node::Directory(_) => EntryKind::Directory,
        }
    }
}

/// Recursive name → node mapping for one directory
///
/// Names never contain `/`. Iteration is in name order so walks over a tree
/// are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileTree {
    entries: BTreeMap<String, Node>,
}

impl FileTree {
    /// Creates an empty tree
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a file entry
    pub fn insert_file(&mut self, name: impl Into<String>, size: u64) {
        self.entries.insert(name.into(), Node::File { size });
    }

    /// Adds or replaces a directory entry
    pub fn insert_dir(&mut self, name: impl Into<String>, tree: FileTree) {
        self.entries.insert(name.into(), Node::Directory(tree));
    }

    /// Adds or replaces an arbitrary node
    pub fn insert(&mut self, name: impl Into<String>, node: Node) {
        self.entries.insert(name.into(), node);
    }

    /// Builder-style variant of [`insert_file`](Self::insert_file)
    #[must_use]
    pub fn with_file(mut self, name: impl Into<String>, size: u64) -> Self {
        self.insert_file(name, size);
        self
    }

    /// Builder-style variant of [`insert_dir`](Self::insert_dir)
    #[must_use]
    pub fn with_dir(mut self, name: impl Into<String>, tree: FileTree) -> Self {
        self.insert_dir(name, tree);
        self
    }

    /// Looks up a direct child by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Node> {
        self.entries.get(name)
    }

    /// Iterates direct children in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.entries.iter().map(|(name, node)| (name.as_str(), node))
    }

    /// Number of direct children
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the tree has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All files in the tree as `(relative path, size)`, depth first
    ///
    /// Relative paths use `/` between components, e.g. `"sub/b.txt"`.
    #[must_use]
    pub fn files(&self) -> Vec<(String, u64)> {
        let mut out = Vec::new();
        self.collect_files("", &mut out);
        out
    }

    fn collect_files(&self, prefix: &str, out: &mut Vec<(String, u64)>) {
        for (name, node) in &self.entries {
            match node {
                Node::File { size } => out.push((format!("{prefix}{name}"), *size)),
                Node::Directory(child) => child.collect_files(&format!("{prefix}{name}/"), out),
            }
        }
    }

    /// Number of files in the whole tree
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.entries
            .values()
            .map(|node| match node {
                Node::File { .. } => 1,
                Node::Directory(child) => child.file_count(),
            })
            .sum()
    }

    /// Sum of all file sizes in the whole tree
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.entries
            .values()
            .map(|node| match node {
                Node::File { size } => *size,
                Node::Directory(child) => child.total_size(),
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FileTree {
        FileTree::new()
            .with_file("a.txt", 10)
            .with_dir(
                "sub",
                FileTree::new()
                    .with_file("b.txt", 20)
                    .with_dir("deep", FileTree::new().with_file("c.bin", 5)),
            )
            .with_dir("empty", FileTree::new())
    }

    #[test]
    fn test_files_are_depth_first_in_name_order() {
        let files = sample().files();
        assert_eq!(
            files,
            vec![
                ("a.txt".to_string(), 10),
                ("sub/b.txt".to_string(), 20),
                ("sub/deep/c.bin".to_string(), 5),
            ]
        );
    }

    #[test]
    fn test_counts() {
        let tree = sample();
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.file_count(), 3);
        assert_eq!(tree.total_size(), 35);
        assert!(FileTree::new().is_empty());
    }

    #[test]
    fn test_insert_replaces_kind() {
        let mut tree = FileTree::new().with_file("x", 1);
        tree.insert_dir("x", FileTree::new());
        assert_eq!(tree.get("x").map(Node::kind), Some(EntryKind::Directory));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_serialize_shape() {
        let tree = FileTree::new()
            .with_file("a", 1)
            .with_dir("d", FileTree::new());
        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"a": {"file": {"size": 1}}, "d": {"directory": {}}})
        );
    }
}
