//! Tree comparison
//!
//! [`diff`] computes the entries of one listing that are missing from, or
//! differ from, another. The result keeps the shape of the input: a
//! directory shows up only when something below it differs, so walking the
//! result visits exactly the files that need work.

use serde::Serialize;
use treesync_core::domain::file_tree::{EntryKind, FileTree, Node};

/// Entries of `src` that need reconciling against `dst`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffResult {
    /// Missing or changed entries, shaped like `src`
    pub tree: FileTree,
    /// Names that are a file on one side and a directory on the other
    pub conflicts: Vec<KindConflict>,
}

impl DiffResult {
    /// True when there is nothing to copy and nothing in conflict
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty() && self.conflicts.is_empty()
    }
}

/// An entry whose kind differs between the two trees
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KindConflict {
    /// Directory names from the diff root down to the entry's parent
    pub dirs: Vec<String>,
    pub name: String,
    pub source_kind: EntryKind,
    pub dest_kind: EntryKind,
    /// Size of the source entry when it is a file, otherwise 0
    pub source_size: u64,
}

impl KindConflict {
    /// Path of the entry relative to the diff root, e.g. `"sub/x"`
    #[must_use]
    pub fn relative_path(&self) -> String {
        let mut path = String::new();
        for dir in &self.dirs {
            path.push_str(dir);
            path.push('/');
        }
        path.push_str(&self.name);
        path
    }
}

/// Compares `src` against `dst`
///
/// - an entry absent from `dst` is included as is, subtree and all
/// - a file present on both sides is included only when `size_check` is set
///   and the sizes differ
/// - a directory present on both sides is included only when its own diff
///   is non-empty
/// - a file/directory mismatch is left out of the tree and reported in
///   [`DiffResult::conflicts`]
///
/// With `size_check == false` the result is exactly the set of `src` paths
/// that do not exist in `dst`, which is what the delete pass needs.
#[must_use]
pub fn diff(src: &FileTree, dst: &FileTree, size_check: bool) -> DiffResult {
    let mut conflicts = Vec::new();
    let mut dirs = Vec::new();
    let tree = diff_level(src, dst, size_check, &mut dirs, &mut conflicts);
    DiffResult { tree, conflicts }
}

fn diff_level(
    src: &FileTree,
    dst: &FileTree,
    size_check: bool,
    dirs: &mut Vec<String>,
    conflicts: &mut Vec<KindConflict>,
) -> FileTree {
    let mut out = FileTree::new();

    for (name, node) in src.iter() {
        let Some(other) = dst.get(name) else {
            out.insert(name, node.clone());
            continue;
        };

        match (node, other) {
            (Node::File { size }, Node::File { size: other_size }) => {
                if size_check && size != other_size {
                    out.insert_file(name, *size);
                }
            }
            (Node::Directory(child), Node::Directory(other_child)) => {
                dirs.push(name.to_string());
                let sub = diff_level(child, other_child, size_check, dirs, conflicts);
                dirs.pop();
                if !sub.is_empty() {
                    out.insert_dir(name, sub);
                }
            }
            _ => conflicts.push(KindConflict {
                dirs: dirs.clone(),
                name: name.to_string(),
                source_kind: node.kind(),
                dest_kind: other.kind(),
                source_size: match node {
                    Node::File { size } => *size,
                    Node::Directory(_) => 0,
                },
            }),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn src_tree() -> FileTree {
        FileTree::new()
            .with_file("a.txt", 10)
            .with_dir("sub", FileTree::new().with_file("b.txt", 20))
    }

    #[test]
    fn test_diff_of_identical_trees_is_empty() {
        let tree = src_tree();
        assert!(diff(&tree, &tree, true).is_empty());
        assert!(diff(&tree, &tree, false).is_empty());
    }

    #[test]
    fn test_missing_entries_are_included_verbatim() {
        let src = src_tree();
        let result = diff(&src, &FileTree::new(), true);
        assert_eq!(result.tree, src);
        assert!(result.conflicts.is_empty());
    }

    #[test]
    fn test_size_change_included_only_with_size_check() {
        let src = FileTree::new().with_file("a.txt", 10);
        let dst = FileTree::new().with_file("a.txt", 11);

        let checked = diff(&src, &dst, true);
        assert_eq!(checked.tree, FileTree::new().with_file("a.txt", 10));

        let unchecked = diff(&src, &dst, false);
        assert!(unchecked.tree.is_empty());
    }

    #[test]
    fn test_unchanged_subtree_is_pruned() {
        let src = FileTree::new()
            .with_dir("same", FileTree::new().with_file("x", 1))
            .with_dir("changed", FileTree::new().with_file("y", 1).with_file("z", 2));
        let dst = FileTree::new()
            .with_dir("same", FileTree::new().with_file("x", 1))
            .with_dir("changed", FileTree::new().with_file("y", 1));

        let result = diff(&src, &dst, true);
        assert!(result.tree.get("same").is_none());
        assert_eq!(
            result.tree,
            FileTree::new().with_dir("changed", FileTree::new().with_file("z", 2))
        );
    }

    #[test]
    fn test_empty_source_directory_missing_on_destination_is_included() {
        let src = FileTree::new().with_dir("empty", FileTree::new());
        let result = diff(&src, &FileTree::new(), true);
        assert_eq!(result.tree.get("empty"), Some(&Node::Directory(FileTree::new())));
    }

    #[test]
    fn test_reverse_diff_without_size_check_lists_extra_paths() {
        // src = {a.txt:10, sub/{b.txt:20}}, dst = {a.txt:11, c.txt:5, sub/{}}
        let src = src_tree();
        let dst = FileTree::new()
            .with_file("a.txt", 11)
            .with_file("c.txt", 5)
            .with_dir("sub", FileTree::new());

        let forward = diff(&src, &dst, true);
        assert_eq!(
            forward.tree,
            FileTree::new()
                .with_file("a.txt", 10)
                .with_dir("sub", FileTree::new().with_file("b.txt", 20))
        );

        let reverse = diff(&dst, &src, false);
        assert_eq!(reverse.tree, FileTree::new().with_file("c.txt", 5));
    }

    #[test]
    fn test_kind_mismatch_is_reported_not_included() {
        let src = FileTree::new().with_dir(
            "sub",
            FileTree::new()
                .with_file("x", 3)
                .with_dir("y", FileTree::new().with_file("inner", 1)),
        );
        let dst = FileTree::new().with_dir(
            "sub",
            FileTree::new().with_dir("x", FileTree::new()).with_file("y", 9),
        );

        let result = diff(&src, &dst, true);
        assert!(result.tree.is_empty());
        assert_eq!(result.conflicts.len(), 2);

        let x = &result.conflicts[0];
        assert_eq!(x.relative_path(), "sub/x");
        assert_eq!(x.source_kind, EntryKind::File);
        assert_eq!(x.dest_kind, EntryKind::Directory);
        assert_eq!(x.source_size, 3);

        let y = &result.conflicts[1];
        assert_eq!(y.dirs, vec!["sub".to_string()]);
        assert_eq!(y.source_kind, EntryKind::Directory);
        assert_eq!(y.source_size, 0);
    }

    #[test]
    fn test_diff_is_deterministic() {
        let src = src_tree().with_file("0.txt", 1).with_file("z.txt", 2);
        let first = diff(&src, &FileTree::new(), true);
        let second = diff(&src, &FileTree::new(), true);
        assert_eq!(first, second);
        let names: Vec<&str> = first.tree.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["0.txt", "a.txt", "sub", "z.txt"]);
    }
}
