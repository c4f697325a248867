//! Name search over a materialized repository tree

use serde::{Deserialize, Serialize};

use super::tree::{FileNode, FileNodeType};

/// Paths whose name matched a search term, split by node kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameMatches {
    pub files: Vec<String>,
    pub dirs: Vec<String>,
}

/// A tagged path in a combined search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub path: String,
    #[serde(rename = "type")]
    pub hit_type: FileNodeType,
}

/// Collects every node whose path contains `needle`, ignoring case.
///
/// The walk is depth-first with an explicit stack. Children are always pushed,
/// so a matching directory does not hide matching descendants. Result order
/// follows the walk and carries no meaning; callers sort.
pub fn find_by_name_substring(roots: &[FileNode], needle: &str) -> NameMatches {
    let needle = needle.to_lowercase();
    let mut matches = NameMatches::default();
    let mut stack: Vec<&FileNode> = roots.iter().collect();

    while let Some(node) = stack.pop() {
        if let Some(children) = &node.children {
            stack.extend(children.iter());
        }

        if !node.path.to_lowercase().contains(&needle) {
            continue;
        }
        match node.node_type {
            FileNodeType::Dir => matches.dirs.push(node.path.clone()),
            FileNodeType::File => matches.files.push(node.path.clone()),
        }
    }

    matches
}

/// Unions name matches with code-search paths, tags them and sorts by path.
///
/// Code-search paths count as files. Duplicates between the two sources are kept.
pub fn merge_search_results(name_matches: NameMatches, code_matches: Vec<String>) -> Vec<SearchHit> {
    let NameMatches { mut files, dirs } = name_matches;
    files.extend(code_matches);

    let mut hits: Vec<SearchHit> = files
        .into_iter()
        .map(|path| SearchHit {
            path,
            hit_type: FileNodeType::File,
        })
        .chain(dirs.into_iter().map(|path| SearchHit {
            path,
            hit_type: FileNodeType::Dir,
        }))
        .collect();

    hits.sort_by(|a, b| a.path.cmp(&b.path));
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::tree::{TreeEntry, build_full_tree};

    fn sample_tree() -> Vec<FileNode> {
        let listing = vec![
            ("/a", FileNodeType::Dir, None),
            ("/a/b.txt", FileNodeType::File, Some(10)),
            ("/a/c", FileNodeType::Dir, None),
            ("/a/c/d.txt", FileNodeType::File, Some(5)),
        ]
        .into_iter()
        .map(|(path, kind, size)| TreeEntry {
            path: path.to_string(),
            kind,
            size,
        });
        build_full_tree(listing, "/").unwrap()
    }

    fn sorted(mut paths: Vec<String>) -> Vec<String> {
        paths.sort();
        paths
    }

    #[test]
    fn test_find_single_file() {
        let matches = find_by_name_substring(&sample_tree(), "d");
        assert_eq!(matches.files, vec!["/a/c/d.txt"]);
        assert!(matches.dirs.is_empty());
    }

    #[test]
    fn test_find_is_case_insensitive() {
        let matches = find_by_name_substring(&sample_tree(), "B.TXT");
        assert_eq!(matches.files, vec!["/a/b.txt"]);
    }

    #[test]
    fn test_matching_directory_keeps_descending() {
        let matches = find_by_name_substring(&sample_tree(), "/a");
        assert_eq!(sorted(matches.dirs), vec!["/a", "/a/c"]);
        assert_eq!(sorted(matches.files), vec!["/a/b.txt", "/a/c/d.txt"]);
    }

    #[test]
    fn test_no_match() {
        let matches = find_by_name_substring(&sample_tree(), "zzz");
        assert_eq!(matches, NameMatches::default());
    }

    #[test]
    fn test_empty_needle_matches_everything_once() {
        let matches = find_by_name_substring(&sample_tree(), "");
        assert_eq!(matches.files.len() + matches.dirs.len(), 4);
    }

    #[test]
    fn test_merge_keeps_duplicates_and_sorts() {
        let name_matches = NameMatches {
            files: vec!["/x/b.txt".to_string()],
            dirs: vec!["/x/c".to_string()],
        };
        let hits = merge_search_results(name_matches, vec!["/x/b.txt".to_string()]);

        assert_eq!(
            hits,
            vec![
                SearchHit {
                    path: "/x/b.txt".to_string(),
                    hit_type: FileNodeType::File
                },
                SearchHit {
                    path: "/x/b.txt".to_string(),
                    hit_type: FileNodeType::File
                },
                SearchHit {
                    path: "/x/c".to_string(),
                    hit_type: FileNodeType::Dir
                },
            ]
        );
        assert_eq!(
            serde_json::to_value(&hits[2]).unwrap(),
            serde_json::json!({"path": "/x/c", "type": "dir"})
        );
    }
}
