use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::fs::listing::{list_directory, EntryKind, ListedEntry, Listing};
use crate::fs::path::PathMatcher;

/// Index of a node in the tree arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

/// Whether a directory's entries have been read from disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Unloaded,
    /// A listing has been dispatched and not yet applied.
    Loading,
    Loaded,
}

/// One renderable slot in a node's `children`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Child {
    Node(NodeId),
    /// More directories exist beyond the current page.
    More,
    /// Stand-in for the entries of a directory that is not loaded yet.
    Loading,
}

/// A filesystem entry materialized in the tree.
#[derive(Debug, Clone)]
pub struct DirectoryNode {
    pub name: String,
    pub path: PathBuf,
    pub kind: EntryKind,
    pub load: LoadState,
    pub extended: bool,
    pub children: Vec<Child>,
    /// Every child directory, once loaded; `children` pages through these.
    pub directories: Vec<NodeId>,
    /// Child files and unreadable entries, once loaded.
    pub files: Vec<NodeId>,
    /// Names of `files`, in listing order.
    pub file_names: Vec<String>,
    pub parent: Option<NodeId>,
}

impl DirectoryNode {
    fn from_entry(entry: ListedEntry, parent: NodeId) -> Self {
        let is_dir = entry.kind == EntryKind::Directory;
        Self {
            name: entry.name,
            path: entry.path,
            kind: entry.kind,
            load: if is_dir {
                LoadState::Unloaded
            } else {
                LoadState::Loaded
            },
            extended: false,
            children: if is_dir { vec![Child::Loading] } else { Vec::new() },
            directories: Vec::new(),
            files: Vec::new(),
            file_names: Vec::new(),
            parent: Some(parent),
        }
    }

    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// True when the last child is the "more" sentinel.
    pub fn has_more(&self) -> bool {
        matches!(self.children.last(), Some(Child::More))
    }
}

/// A row of the depth-first rendering of the extended part of the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Row {
    Node(NodeId),
    More { parent: NodeId },
    Loading { parent: NodeId },
}

/// A flattened row with the layout data the tree widget needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlatRow {
    pub row: Row,
    pub depth: usize,
    pub is_last_sibling: bool,
}

/// Arena-backed, lazily materialized directory tree.
///
/// Nodes are only ever added; `parent` links are arena indices.
#[derive(Debug, Clone)]
pub struct DirectoryTree {
    nodes: Vec<DirectoryNode>,
    by_path: HashMap<PathBuf, NodeId>,
}

impl DirectoryTree {
    /// A tree holding only `root`, extended but not yet listed.
    pub fn new(root: &Path) -> Self {
        let root_node = DirectoryNode {
            name: root.to_string_lossy().to_string(),
            path: root.to_path_buf(),
            kind: EntryKind::Directory,
            load: LoadState::Unloaded,
            extended: true,
            children: vec![Child::Loading],
            directories: Vec::new(),
            files: Vec::new(),
            file_names: Vec::new(),
            parent: None,
        };
        let mut by_path = HashMap::new();
        by_path.insert(root.to_path_buf(), NodeId(0));
        Self {
            nodes: vec![root_node],
            by_path,
        }
    }

    /// Seed a tree whose single top-level node is `root`, listed eagerly.
    pub async fn seed_root(root: &Path) -> Self {
        let mut tree = Self::new(root);
        let root_id = tree.root_id();
        if let Some(path) = tree.begin_load(root_id) {
            let listing = list_directory(&path).await;
            tree.apply_listing(&path, listing, 1);
        }
        tree
    }

    pub fn root_id(&self) -> NodeId {
        NodeId(0)
    }

    pub fn root(&self) -> &DirectoryNode {
        &self.nodes[0]
    }

    pub fn get(&self, id: NodeId) -> Option<&DirectoryNode> {
        self.nodes.get(id.0)
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut DirectoryNode> {
        self.nodes.get_mut(id.0)
    }

    pub fn find_by_path(&self, path: &Path) -> Option<NodeId> {
        self.by_path.get(path).copied()
    }

    /// Names of the files listed under `id`.
    pub fn file_names(&self, id: NodeId) -> &[String] {
        self.get(id).map_or(&[], |node| node.file_names.as_slice())
    }

    /// Ancestors of `id`, nearest first, excluding `id` itself.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.get(id).and_then(|n| n.parent);
        while let Some(parent) = current {
            out.push(parent);
            current = self.get(parent).and_then(|n| n.parent);
        }
        out
    }

    /// Mark every ancestor of `id` as extended so `id` is rendered.
    pub fn extend_ancestors(&mut self, id: NodeId) {
        for ancestor in self.ancestors(id) {
            if let Some(node) = self.get_mut(ancestor) {
                node.extended = true;
            }
        }
    }

    /// Mark an unloaded directory as loading and return its path.
    ///
    /// Returns `None` for files, unknown entries, and directories that are
    /// already loading or loaded, so a listing is dispatched at most once.
    pub fn begin_load(&mut self, id: NodeId) -> Option<PathBuf> {
        let node = self.get_mut(id)?;
        if !node.is_directory() || node.load != LoadState::Unloaded {
            return None;
        }
        node.load = LoadState::Loading;
        node.extended = true;
        Some(node.path.clone())
    }

    /// Apply a listing for `path`, returning the node it was applied to.
    ///
    /// The first page of `page_size` directories becomes the node children.
    /// Listings for nodes that are not loading are dropped.
    pub fn apply_listing(
        &mut self,
        path: &Path,
        listing: Listing,
        page_size: usize,
    ) -> Option<NodeId> {
        let id = self.find_by_path(path)?;
        if self.get(id)?.load != LoadState::Loading {
            tracing::debug!("Dropping stale listing for {}", path.display());
            return None;
        }
        self.install_listing(id, listing);
        if id == self.root_id() {
            // The root shows every directory; only deeper levels are paged.
            let node = &mut self.nodes[id.0];
            node.children = node.directories.iter().copied().map(Child::Node).collect();
        } else {
            self.first_page(id, page_size);
        }
        Some(id)
    }

    fn install_listing(&mut self, id: NodeId, listing: Listing) {
        let Listing {
            directories: listed_directories,
            files: listed_files,
            file_names,
        } = listing;
        let mut directories = Vec::with_capacity(listed_directories.len());
        for entry in listed_directories {
            directories.push(self.insert_child(entry, id));
        }
        let mut files = Vec::with_capacity(listed_files.len());
        for entry in listed_files {
            files.push(self.insert_child(entry, id));
        }

        let node = &mut self.nodes[id.0];
        node.directories = directories;
        node.files = files;
        node.file_names = file_names;
        node.children.clear();
        node.load = LoadState::Loaded;
    }

    fn insert_child(&mut self, entry: ListedEntry, parent: NodeId) -> NodeId {
        if let Some(&existing) = self.by_path.get(&entry.path) {
            return existing;
        }
        let id = NodeId(self.nodes.len());
        self.by_path.insert(entry.path.clone(), id);
        self.nodes.push(DirectoryNode::from_entry(entry, parent));
        id
    }

    /// Depth-first rows of the extended part of the tree.
    pub fn flatten(&self) -> Vec<FlatRow> {
        let mut rows = Vec::new();
        self.flatten_node(self.root_id(), 0, true, &mut rows);
        rows
    }

    fn flatten_node(&self, id: NodeId, depth: usize, is_last: bool, rows: &mut Vec<FlatRow>) {
        rows.push(FlatRow {
            row: Row::Node(id),
            depth,
            is_last_sibling: is_last,
        });

        let node = &self.nodes[id.0];
        if !node.extended {
            return;
        }
        let count = node.children.len();
        for (i, child) in node.children.iter().enumerate() {
            let is_last_child = i + 1 == count;
            match *child {
                Child::Node(child_id) => {
                    self.flatten_node(child_id, depth + 1, is_last_child, rows)
                }
                Child::More => rows.push(FlatRow {
                    row: Row::More { parent: id },
                    depth: depth + 1,
                    is_last_sibling: is_last_child,
                }),
                Child::Loading => rows.push(FlatRow {
                    row: Row::Loading { parent: id },
                    depth: depth + 1,
                    is_last_sibling: is_last_child,
                }),
            }
        }
    }

    /// Row index of `id` in the current rendering, if it is visible.
    pub fn flattened_index_of(&self, id: NodeId) -> Option<usize> {
        let mut index = 0;
        if self.count_until(self.root_id(), id, &mut index) {
            Some(index)
        } else {
            None
        }
    }

    fn count_until(&self, current: NodeId, target: NodeId, index: &mut usize) -> bool {
        if current == target {
            return true;
        }
        *index += 1;
        let node = &self.nodes[current.0];
        if node.extended {
            for child in &node.children {
                match *child {
                    Child::Node(child_id) => {
                        if self.count_until(child_id, target, index) {
                            return true;
                        }
                    }
                    Child::More | Child::Loading => *index += 1,
                }
            }
        }
        false
    }

    /// Search the materialized directories for `target`.
    ///
    /// Returns the exact node if present, otherwise the deepest directory
    /// whose path is a prefix of `target`.
    pub fn search(&self, target: &Path, matcher: PathMatcher) -> (Option<NodeId>, Option<NodeId>) {
        let root = self.root();
        if matcher.same(&root.path, target) {
            return (Some(self.root_id()), None);
        }

        if !matcher.starts_with(target, &root.path) {
            return (None, None);
        }
        let mut closest = Some(self.root_id());
        let mut level = &root.directories;
        'descend: loop {
            for &id in level {
                let node = &self.nodes[id.0];
                if matcher.same(&node.path, target) {
                    return (Some(id), None);
                }
                if matcher.starts_with(target, &node.path) {
                    closest = Some(id);
                    level = &node.directories;
                    continue 'descend;
                }
            }
            break;
        }
        (None, closest)
    }
}
