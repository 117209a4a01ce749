use std::path::{Path, PathBuf};

use crate::fs::listing::Listing;
use crate::fs::path::PathMatcher;
use crate::fs::tree::{Child, DirectoryTree, FlatRow, LoadState, NodeId, Row};

/// Settings for a [`TreeNavigator`].
#[derive(Debug, Clone, Copy)]
pub struct NavigatorOptions {
    pub matcher: PathMatcher,
    /// Initial viewport height in rows; also the page size.
    pub height: usize,
}

impl Default for NavigatorOptions {
    fn default() -> Self {
        Self {
            matcher: PathMatcher::platform_default(),
            height: 10,
        }
    }
}

/// Direction of a page move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Outcome of a finished path resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub exact: Option<NodeId>,
    pub closest: Option<NodeId>,
}

impl Resolution {
    /// The node the cursor should land on.
    pub fn target(&self) -> Option<NodeId> {
        self.exact.or(self.closest)
    }
}

/// State of a path resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolve {
    Done(Resolution),
    /// Waiting for the listing of this directory.
    Pending(PathBuf),
}

/// Cursor, scroll and resolution state over a [`DirectoryTree`].
///
/// Listings are never performed here. Operations that need a directory read
/// queue its path; the owner drains them with [`take_requests`] and returns
/// each result through [`apply_listing`].
///
/// [`take_requests`]: TreeNavigator::take_requests
/// [`apply_listing`]: TreeNavigator::apply_listing
#[derive(Debug)]
pub struct TreeNavigator {
    tree: DirectoryTree,
    rows: Vec<FlatRow>,
    cursor: usize,
    scroll: usize,
    height: usize,
    matcher: PathMatcher,
    pending: Option<PathBuf>,
    requests: Vec<PathBuf>,
}

impl TreeNavigator {
    pub fn new(tree: DirectoryTree, options: NavigatorOptions) -> Self {
        let mut nav = Self {
            tree,
            rows: Vec::new(),
            cursor: 0,
            scroll: 0,
            height: options.height.max(1),
            matcher: options.matcher,
            pending: None,
            requests: Vec::new(),
        };
        let root = nav.tree.root_id();
        nav.request_load(root);
        nav.invalidate();
        nav
    }

    pub fn tree(&self) -> &DirectoryTree {
        &self.tree
    }

    pub fn rows(&self) -> &[FlatRow] {
        &self.rows
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// The row currently under the cursor.
    pub fn cursor_row(&self) -> Option<Row> {
        self.rows.get(self.cursor).map(|r| r.row)
    }

    /// The node under the cursor, if the cursor is on a real node.
    pub fn cursor_node(&self) -> Option<NodeId> {
        match self.cursor_row()? {
            Row::Node(id) => Some(id),
            _ => None,
        }
    }

    /// Whether a resolution is waiting on a listing.
    pub fn is_resolving(&self) -> bool {
        self.pending.is_some()
    }

    /// Drain the directories that must be listed.
    pub fn take_requests(&mut self) -> Vec<PathBuf> {
        std::mem::take(&mut self.requests)
    }

    fn request_load(&mut self, id: NodeId) {
        if let Some(path) = self.tree.begin_load(id) {
            tracing::debug!("Requesting listing of {}", path.display());
            self.requests.push(path);
        }
    }

    /// Recompute the flattened rows and clamp cursor and scroll to them.
    pub fn invalidate(&mut self) {
        self.rows = self.tree.flatten();
        let last = self.rows.len().saturating_sub(1);
        self.cursor = self.cursor.min(last);
        self.scroll = self.scroll.min(self.max_scroll());
    }

    fn max_scroll(&self) -> usize {
        self.rows.len().saturating_sub(self.height)
    }

    /// Update the viewport height, expanding any More rows that come into view.
    pub fn set_height(&mut self, height: usize) {
        let height = height.max(1);
        if height == self.height {
            return;
        }
        self.height = height;
        self.scroll = self.scroll.min(self.max_scroll());
        self.expand_visible_more();
        self.keep_in_view();
        self.invalidate();
    }

    /// Scroll so that the window starts at row `index`, as far as the rows allow.
    pub fn ensure_visible(&mut self, index: usize) {
        let offset = index.min(self.max_scroll());
        if offset != self.scroll {
            self.scroll = offset;
            self.expand_visible_more();
        }
        self.invalidate();
    }

    /// Minimal scroll that keeps the cursor inside the window.
    fn keep_in_view(&mut self) {
        let before = self.scroll;
        if self.cursor < self.scroll {
            self.scroll = self.cursor;
        } else if self.cursor >= self.scroll + self.height {
            self.scroll = self.cursor + 1 - self.height;
        }
        if self.scroll != before {
            self.expand_visible_more();
        }
    }

    /// Expand every More row inside the viewport window until none remain.
    fn expand_visible_more(&mut self) {
        loop {
            let end = (self.scroll + self.height).min(self.rows.len());
            let parents: Vec<NodeId> = self.rows[self.scroll.min(end)..end]
                .iter()
                .filter_map(|r| match r.row {
                    Row::More { parent } => Some(parent),
                    _ => None,
                })
                .collect();
            if parents.is_empty() {
                return;
            }
            let mut grew = false;
            for parent in parents {
                grew |= self.tree.load_more(parent, self.height);
            }
            self.rows = self.tree.flatten();
            if !grew {
                return;
            }
        }
    }

    /// Expand the More row under the cursor, if it is one.
    fn expand_more_at_cursor(&mut self) {
        if let Some(Row::More { parent }) = self.cursor_row() {
            self.tree.load_more(parent, self.height);
            self.rows = self.tree.flatten();
        }
    }

    pub fn move_up(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
        }
        self.expand_more_at_cursor();
        self.keep_in_view();
        self.invalidate();
    }

    pub fn move_down(&mut self) {
        if self.cursor + 1 < self.rows.len() {
            self.cursor += 1;
        }
        self.expand_more_at_cursor();
        self.keep_in_view();
        self.invalidate();
    }

    pub fn move_to_top(&mut self) {
        self.cursor = 0;
        self.keep_in_view();
        self.invalidate();
    }

    pub fn move_to_bottom(&mut self) {
        self.cursor = self.rows.len().saturating_sub(1);
        self.expand_more_at_cursor();
        self.keep_in_view();
        self.invalidate();
    }

    /// Move by one page, expanding every More row that is passed over.
    pub fn page_move(&mut self, direction: Direction) {
        let step = self.height.saturating_sub(1).max(1);
        loop {
            let last = self.rows.len().saturating_sub(1);
            let (from, to, target) = match direction {
                Direction::Down => {
                    let target = (self.cursor + step).min(last);
                    (self.cursor + 1, target, target)
                }
                Direction::Up => {
                    let target = self.cursor.saturating_sub(step);
                    (target, self.cursor.saturating_sub(1), target)
                }
            };
            let more = (from..=to).find_map(|i| match self.rows.get(i)?.row {
                Row::More { parent } => Some((i, parent)),
                _ => None,
            });
            let Some((index, parent)) = more else {
                self.cursor = target;
                break;
            };
            let before = self.rows.len();
            self.tree.load_more(parent, self.height);
            self.rows = self.tree.flatten();
            // Rows inserted above the cursor shift it down.
            if index < self.cursor {
                self.cursor += self.rows.len().saturating_sub(before);
            }
        }
        self.keep_in_view();
        self.invalidate();
    }

    /// Extend the directory under the cursor, or page in a More row.
    pub fn expand(&mut self) {
        match self.cursor_row() {
            Some(Row::Node(id)) => {
                let Some(node) = self.tree.get(id) else {
                    return;
                };
                if !node.is_directory() {
                    return;
                }
                if node.load == LoadState::Unloaded {
                    self.request_load(id);
                } else if let Some(node) = self.tree.get_mut(id) {
                    node.extended = true;
                }
            }
            Some(Row::More { parent }) => {
                self.tree.load_more(parent, self.height);
            }
            _ => {}
        }
        self.invalidate();
    }

    /// Collapse the node under the cursor, or step out to its parent.
    pub fn collapse(&mut self) {
        let Some(row) = self.cursor_row() else {
            return;
        };
        let root = self.tree.root_id();
        let focus = match row {
            Row::Node(id) if id != root && self.tree.get(id).is_some_and(|n| n.extended) => {
                self.set_extended(id, false);
                id
            }
            Row::Node(id) => match self.tree.get(id).and_then(|n| n.parent) {
                Some(parent) => {
                    if parent != root {
                        self.set_extended(parent, false);
                    }
                    parent
                }
                None => id,
            },
            Row::More { parent } | Row::Loading { parent } => {
                if parent != root {
                    self.set_extended(parent, false);
                }
                parent
            }
        };
        self.rows = self.tree.flatten();
        if let Some(index) = self.tree.flattened_index_of(focus) {
            self.cursor = index;
        }
        self.keep_in_view();
        self.invalidate();
    }

    fn set_extended(&mut self, id: NodeId, extended: bool) {
        if let Some(node) = self.tree.get_mut(id) {
            node.extended = extended;
        }
    }

    /// Activate the cursor row.
    ///
    /// Returns the directory that becomes the contents source. It may
    /// still be loading; its files arrive with the listing.
    pub fn select(&mut self) -> Option<NodeId> {
        let selected = match self.cursor_row()? {
            Row::Node(id) => {
                if self.tree.get(id).is_some_and(|n| n.load == LoadState::Unloaded) {
                    self.request_load(id);
                } else {
                    self.set_extended(id, true);
                }
                Some(id)
            }
            Row::More { parent } => {
                self.tree.load_more(parent, self.height);
                None
            }
            Row::Loading { .. } => None,
        };
        self.invalidate();
        selected
    }

    /// Move the cursor to `id`, scrolling it into view if needed.
    pub fn move_cursor_to(&mut self, id: NodeId) {
        self.tree.extend_ancestors(id);
        self.rows = self.tree.flatten();
        if let Some(index) = self.tree.flattened_index_of(id) {
            self.cursor = index;
            if index < self.scroll || index >= self.scroll + self.height {
                self.ensure_visible(index);
                return;
            }
        }
        self.invalidate();
    }

    /// Start resolving `target` to a node.
    ///
    /// Replaces any resolution still in progress.
    pub fn resolve(&mut self, target: &Path) -> Resolve {
        tracing::debug!("Resolving {}", target.display());
        self.pending = Some(target.to_path_buf());
        self.step_resolution()
    }

    /// Install a listing and resume a pending resolution.
    ///
    /// Returns the resolution state when one was in progress.
    pub fn apply_listing(&mut self, path: &Path, listing: Listing) -> Option<Resolve> {
        let applied = self.tree.apply_listing(path, listing, self.height);
        self.invalidate();
        if applied.is_some() && self.pending.is_some() {
            Some(self.step_resolution())
        } else {
            None
        }
    }

    fn step_resolution(&mut self) -> Resolve {
        let Some(target) = self.pending.clone() else {
            return Resolve::Done(Resolution {
                exact: None,
                closest: None,
            });
        };

        let (exact, closest) = self.tree.search(&target, self.matcher);
        if exact.is_none() {
            if let Some(ancestor) = closest {
                match self.tree.get(ancestor).map(|n| n.load) {
                    Some(LoadState::Unloaded) => {
                        self.request_load(ancestor);
                        self.invalidate();
                        return Resolve::Pending(self.path_of(ancestor));
                    }
                    Some(LoadState::Loading) => return Resolve::Pending(self.path_of(ancestor)),
                    _ => {}
                }
            }
        }

        self.pending = None;
        let resolution = Resolution { exact, closest };
        if let Some(id) = resolution.target() {
            self.reveal(id);
            self.move_cursor_to(id);
        }
        tracing::debug!(
            "Resolved {}: exact={:?} closest={:?}",
            target.display(),
            resolution.exact,
            resolution.closest
        );
        Resolve::Done(resolution)
    }

    fn path_of(&self, id: NodeId) -> PathBuf {
        self.tree
            .get(id)
            .map(|n| n.path.clone())
            .unwrap_or_default()
    }

    /// Page in every ancestor of `id` until the path to it is in `children`.
    fn reveal(&mut self, id: NodeId) {
        let mut child = id;
        for ancestor in self.tree.ancestors(id) {
            loop {
                let present = self
                    .tree
                    .get(ancestor)
                    .is_some_and(|n| n.children.contains(&Child::Node(child)));
                if present || !self.tree.load_more(ancestor, self.height) {
                    break;
                }
            }
            child = ancestor;
        }
        self.tree.extend_ancestors(id);
    }
}
