//! Directory tree materialization from flat GitHub listings
//!
//! GitHub hands back repository structure in two flat shapes:
//!
//! - the contents API lists exactly one directory level as `{name, type, size}` records
//! - the git trees API (with `recursive=1`) lists the whole repository as
//!   `{path, type, size}` records, ancestors before descendants
//!
//! This module turns both into [`FileNode`] values. Nodes are assembled in a
//! request-local arena (a vector of nodes plus a path → index table) and only
//! converted into the owned, nested [`FileNode`] shape once the whole listing has
//! been consumed. Nothing is cached between calls.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use super::error::{GithubError, Result};

/// Kind of a repository entry
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FileNodeType {
    #[strum(serialize = "file")]
    File,
    #[strum(serialize = "dir")]
    Dir,
}

impl FileNodeType {
    /// Maps a contents-API `type` marker (`file`, `dir`, ...).
    ///
    /// Missing or unrecognized markers (`symlink`, `submodule`) are treated as files.
    pub fn from_contents_marker(marker: Option<&str>) -> Self {
        marker
            .and_then(|m| m.parse::<FileNodeType>().ok())
            .unwrap_or(FileNodeType::File)
    }

    /// Maps a git-trees `type` marker: `tree` is a directory, anything else a file.
    pub fn from_tree_marker(marker: Option<&str>) -> Self {
        match marker {
            Some("tree") => FileNodeType::Dir,
            _ => FileNodeType::File,
        }
    }
}

/// One file or directory in a reconstructed repository tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileNode {
    /// Root-prefixed path, unique within one tree
    pub path: String,

    #[serde(rename = "type")]
    pub node_type: FileNodeType,

    /// Size in bytes, when the listing reports one
    pub size: Option<u64>,

    /// Children in listing order; `None` for files and for directories with no listed children
    pub children: Option<Vec<FileNode>>,
}

impl FileNode {
    pub fn new(path: impl Into<String>, node_type: FileNodeType, size: Option<u64>) -> Self {
        Self {
            path: path.into(),
            node_type,
            size,
            children: None,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.node_type == FileNodeType::Dir
    }
}

/// An entry of a single-level directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Single path segment, relative to the listed directory
    pub name: String,
    pub kind: FileNodeType,
    pub size: Option<u64>,
}

/// An entry of a recursive repository listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    /// Full path from the repository root
    pub path: String,
    pub kind: FileNodeType,
    pub size: Option<u64>,
}

/// Joins `name` onto `base` and makes sure the result starts with `/`.
///
/// An absolute `name` replaces `base`. No `..` resolution is performed.
///
/// ```
/// use plugin_apis::github::tree::join_with_root;
///
/// assert_eq!(join_with_root("src", "main.rs"), "/src/main.rs");
/// assert_eq!(join_with_root("", "README.md"), "/README.md");
/// assert_eq!(join_with_root("/docs/", "guide.md"), "/docs/guide.md");
/// assert_eq!(join_with_root("", ""), "/");
/// ```
pub fn join_with_root(base: &str, name: &str) -> String {
    let joined = if name.starts_with('/') {
        name.to_string()
    } else if base.is_empty() || base.ends_with('/') {
        format!("{}{}", base, name)
    } else {
        format!("{}/{}", base, name)
    };

    if joined.starts_with('/') {
        joined
    } else {
        format!("/{}", joined)
    }
}

/// Returns the directory part of `path`, POSIX `dirname` style.
///
/// `"/a/b"` → `"/a"`, `"/a"` → `"/"`, `"a"` → `""`.
pub fn dirname(path: &str) -> &str {
    match path.rfind('/') {
        None => "",
        Some(idx) => {
            let head = &path[..=idx];
            let trimmed = head.trim_end_matches('/');
            if trimmed.is_empty() { head } else { trimmed }
        }
    }
}

/// Builds the nodes of a single directory level.
///
/// Every entry becomes a childless node whose path is
/// `join_with_root(requested_path, entry.name)`. Input order is preserved.
pub fn build_children_list(entries: Vec<DirectoryEntry>, requested_path: &str) -> Vec<FileNode> {
    entries
        .into_iter()
        .map(|entry| {
            FileNode::new(
                join_with_root(requested_path, &entry.name),
                entry.kind,
                entry.size,
            )
        })
        .collect()
}

/// Arena slot used while assembling a tree
struct ArenaNode {
    node: FileNode,
    children: Vec<usize>,
}

/// Reconstructs the tree below `requested_path` from a recursive listing.
///
/// Entries are kept when their path is strictly longer than `requested_path` and
/// starts with it as a plain string prefix (no segment-boundary check, so
/// `/ab` also matches `/abc/...`). Each kept entry is attached to the node
/// registered under `dirname(entry.path)`; the listing must therefore name
/// ancestors before descendants.
///
/// Returns the children of the synthetic `requested_path` root, in listing order,
/// with every directory below populated.
///
/// # Errors
///
/// [`GithubError::MissingParent`] when an entry's parent was never registered.
/// The build is all-or-nothing; no partial tree is returned.
pub fn build_full_tree<I>(entries: I, requested_path: &str) -> Result<Vec<FileNode>>
where
    I: IntoIterator<Item = TreeEntry>,
{
    let mut arena = vec![ArenaNode {
        node: FileNode::new(requested_path, FileNodeType::Dir, Some(0)),
        children: Vec::new(),
    }];
    let mut index: HashMap<String, usize> = HashMap::new();
    index.insert(requested_path.to_string(), 0);

    for entry in entries {
        if entry.path.len() <= requested_path.len() || !entry.path.starts_with(requested_path) {
            continue;
        }

        let parent_path = dirname(&entry.path);
        let parent_id = *index
            .get(parent_path)
            .ok_or_else(|| GithubError::MissingParent {
                path: entry.path.clone(),
                parent: parent_path.to_string(),
            })?;

        let id = arena.len();
        index.insert(entry.path.clone(), id);
        arena[parent_id].children.push(id);
        arena.push(ArenaNode {
            node: FileNode::new(entry.path, entry.kind, entry.size),
            children: Vec::new(),
        });
    }

    Ok(assemble(arena))
}

/// Folds the arena into owned nodes and returns the root's children.
///
/// A parent is always registered before its children, so every child index is
/// greater than its parent's. Walking the arena backwards therefore finishes
/// every subtree before its parent asks for it.
fn assemble(arena: Vec<ArenaNode>) -> Vec<FileNode> {
    let mut child_ids: Vec<Vec<usize>> = Vec::with_capacity(arena.len());
    let mut slots: Vec<Option<FileNode>> = Vec::with_capacity(arena.len());
    for ArenaNode { node, children } in arena {
        child_ids.push(children);
        slots.push(Some(node));
    }

    for id in (1..slots.len()).rev() {
        if child_ids[id].is_empty() {
            continue;
        }
        let children: Vec<FileNode> = child_ids[id]
            .iter()
            .filter_map(|child| slots[*child].take())
            .collect();
        if let Some(node) = slots[id].as_mut() {
            node.children = Some(children);
        }
    }

    child_ids[0]
        .iter()
        .filter_map(|child| slots[*child].take())
        .collect()
}
