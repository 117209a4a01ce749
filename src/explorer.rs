use std::path::{Path, PathBuf};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::components::contents::ContentList;
use crate::components::path_input::TextInput;
use crate::focus::{ControlDef, ControlId, ControlKind, FocusManager};
use crate::fs::listing::Listing;
use crate::fs::path::{filesystem_root, normalize, normalize_input};
use crate::fs::tree::{DirectoryTree, NodeId, Row};
use crate::navigator::{Direction, NavigatorOptions, Resolution, Resolve, TreeNavigator};
use crate::view::{ViewId, ViewStack};

/// What an explorer lets the user pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplorerKind {
    Folder,
    File,
}

#[derive(Debug, Clone)]
pub struct ExplorerOptions {
    pub kind: ExplorerKind,
    pub title: String,
    pub navigator: NavigatorOptions,
}

/// Result of a key press that the owner must act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExplorerEffect {
    Accept(PathBuf),
    Escape,
}

/// Control ids of an explorer within its view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExplorerControls {
    pub input: ControlId,
    pub tree: ControlId,
    pub contents: ControlId,
    pub button: Option<ControlId>,
}

/// Path input, directory tree, contents list and optional "Choose Folder" button.
#[derive(Debug)]
pub struct FileExplorer {
    view: ViewId,
    kind: ExplorerKind,
    title: String,
    controls: ExplorerControls,
    navigator: TreeNavigator,
    input: TextInput,
    contents: ContentList,
    source: Option<NodeId>,
}

impl FileExplorer {
    /// Build an explorer in `view` seeded from the filesystem root of `start`.
    pub fn new(views: &mut ViewStack, view: ViewId, start: &Path, options: ExplorerOptions) -> Self {
        let tree = DirectoryTree::new(&filesystem_root(start));
        Self::with_tree(views, view, tree, start, options)
    }

    /// Build an explorer over an existing tree and submit `start` as its path.
    pub fn with_tree(
        views: &mut ViewStack,
        view: ViewId,
        tree: DirectoryTree,
        start: &Path,
        options: ExplorerOptions,
    ) -> Self {
        let controls = Self::adopt_controls(views, view, options.kind);
        let mut explorer = Self {
            view,
            kind: options.kind,
            title: options.title,
            controls,
            navigator: TreeNavigator::new(tree, options.navigator),
            input: TextInput::default(),
            contents: ContentList::default(),
            source: None,
        };
        explorer.input.set(start.to_string_lossy());
        explorer.submit(views);
        explorer
    }

    fn adopt_controls(views: &mut ViewStack, view: ViewId, kind: ExplorerKind) -> ExplorerControls {
        let mut scratch = FocusManager::new();
        let focus = match views.get_mut(view) {
            Some(v) => {
                v.focus = FocusManager::new();
                &mut v.focus
            }
            None => &mut scratch,
        };
        let input = focus.build(ControlDef::new(ControlKind::PathInput).tab_index(0));
        let tree = focus.build(ControlDef::new(ControlKind::DirectoryTree).tab_index(1));
        let contents = focus.build(
            ControlDef::new(ControlKind::ContentList)
                .tab_index(2)
                .visible(false),
        );
        let button = match kind {
            ExplorerKind::Folder => Some(focus.build(ControlDef::button("Choose Folder").tab_index(3))),
            ExplorerKind::File => None,
        };
        focus.focus_first();
        ExplorerControls {
            input,
            tree,
            contents,
            button,
        }
    }

    pub fn view(&self) -> ViewId {
        self.view
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn controls(&self) -> ExplorerControls {
        self.controls
    }

    pub fn navigator(&self) -> &TreeNavigator {
        &self.navigator
    }

    pub fn input(&self) -> &TextInput {
        &self.input
    }

    pub fn contents(&self) -> &ContentList {
        &self.contents
    }

    /// Directory whose files fill the contents list.
    pub fn source_path(&self) -> Option<&Path> {
        let node = self.navigator.tree().get(self.source?)?;
        Some(node.path.as_path())
    }

    pub fn take_requests(&mut self) -> Vec<PathBuf> {
        self.navigator.take_requests()
    }

    /// Update viewport heights of the tree and the contents list.
    pub fn set_heights(&mut self, tree: usize, contents: usize) {
        self.navigator.set_height(tree);
        self.contents.set_height(contents);
    }

    /// Resolve the path typed into the input.
    pub fn submit(&mut self, views: &mut ViewStack) {
        let mut target = normalize_input(self.input.text());
        if target.is_relative() {
            if let Ok(cwd) = std::env::current_dir() {
                target = normalize(&cwd.join(target));
            }
        }
        if let Resolve::Done(resolution) = self.navigator.resolve(&target) {
            self.finish_resolution(resolution, views);
        }
    }

    fn finish_resolution(&mut self, resolution: Resolution, views: &mut ViewStack) {
        if resolution.target().is_some() {
            self.select(views);
        }
    }

    /// Make the cursor row the contents source.
    fn select(&mut self, views: &mut ViewStack) {
        if let Some(id) = self.navigator.select() {
            self.source = Some(id);
            if let Some(node) = self.navigator.tree().get(id) {
                self.input.set(node.path.to_string_lossy());
            }
            self.refresh_contents(views);
        }
    }

    /// Show the directory under the cursor, or the parent of a placeholder
    /// row, without changing what is extended.
    fn show_cursor(&mut self, views: &mut ViewStack) {
        let id = match self.navigator.cursor_row() {
            Some(Row::Node(id)) => id,
            Some(Row::More { parent } | Row::Loading { parent }) => parent,
            None => return,
        };
        let Some(node) = self.navigator.tree().get(id) else {
            return;
        };
        if !node.is_directory() {
            return;
        }
        self.input.set(node.path.to_string_lossy());
        self.source = Some(id);
        self.refresh_contents(views);
    }

    fn refresh_contents(&mut self, views: &mut ViewStack) {
        let items: Vec<String> = self
            .source
            .map(|id| self.navigator.tree().file_names(id).to_vec())
            .unwrap_or_default();
        let visible = !items.is_empty();
        self.contents.set_items(items);
        if let Some(view) = views.get_mut(self.view) {
            view.focus.set_visible(self.controls.contents, visible);
        }
    }

    /// Install a background listing and continue any pending resolution.
    pub fn apply_listing(&mut self, path: &Path, listing: Listing, views: &mut ViewStack) {
        match self.navigator.apply_listing(path, listing) {
            Some(Resolve::Done(resolution)) => self.finish_resolution(resolution, views),
            _ => {
                if self.source_path() == Some(path) {
                    self.refresh_contents(views);
                }
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, views: &mut ViewStack) -> Option<ExplorerEffect> {
        match key.code {
            KeyCode::Tab => {
                if let Some(view) = views.get_mut(self.view) {
                    view.focus.focus_next();
                }
                return None;
            }
            KeyCode::Esc => return Some(ExplorerEffect::Escape),
            _ => {}
        }

        let focused = views.get(self.view).and_then(|v| v.focus.focused())?;
        if focused == self.controls.input {
            self.handle_input_key(key, views);
            None
        } else if focused == self.controls.tree {
            self.handle_tree_key(key, views);
            None
        } else if focused == self.controls.contents {
            self.handle_contents_key(key)
        } else if Some(focused) == self.controls.button {
            match key.code {
                KeyCode::Enter | KeyCode::Char(' ') => {
                    self.source_path().map(|p| ExplorerEffect::Accept(p.to_path_buf()))
                }
                _ => None,
            }
        } else {
            None
        }
    }

    fn handle_input_key(&mut self, key: KeyEvent, views: &mut ViewStack) {
        match key.code {
            KeyCode::Enter => self.submit(views),
            KeyCode::Backspace => self.input.delete_char(),
            KeyCode::Left => self.input.move_cursor_left(),
            KeyCode::Right => self.input.move_cursor_right(),
            KeyCode::Home => self.input.cursor_home(),
            KeyCode::End => self.input.cursor_end(),
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.input.input_char(c)
            }
            _ => {}
        }
    }

    fn handle_tree_key(&mut self, key: KeyEvent, views: &mut ViewStack) {
        match key.code {
            KeyCode::Up => self.navigator.move_up(),
            KeyCode::Down => self.navigator.move_down(),
            KeyCode::PageUp => self.navigator.page_move(Direction::Up),
            KeyCode::PageDown => self.navigator.page_move(Direction::Down),
            KeyCode::Home => self.navigator.move_to_top(),
            KeyCode::End => self.navigator.move_to_bottom(),
            KeyCode::Right => {
                self.navigator.expand();
                self.show_cursor(views);
            }
            KeyCode::Left => {
                self.navigator.collapse();
                self.show_cursor(views);
            }
            KeyCode::Enter | KeyCode::Char(' ') => self.select(views),
            _ => {}
        }
    }

    fn handle_contents_key(&mut self, key: KeyEvent) -> Option<ExplorerEffect> {
        match key.code {
            KeyCode::Up => self.contents.move_up(),
            KeyCode::Down => self.contents.move_down(),
            KeyCode::PageUp => self.contents.page_up(),
            KeyCode::PageDown => self.contents.page_down(),
            KeyCode::Home => self.contents.move_to_top(),
            KeyCode::End => self.contents.move_to_bottom(),
            KeyCode::Enter if self.kind == ExplorerKind::File => {
                let dir = self.source_path()?;
                let file = self.contents.selected()?;
                return Some(ExplorerEffect::Accept(dir.join(file)));
            }
            _ => {}
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::listing::list_directory;
    use crate::fs::path::PathMatcher;
    use crate::view::ViewOptions;
    use std::fs::{self, File};
    use tempfile::TempDir;

    fn setup_test_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("work/exercises")).unwrap();
        fs::create_dir(dir.path().join("empty")).unwrap();
        File::create(dir.path().join("work/exercises/solution.js")).unwrap();
        File::create(dir.path().join("work/exercises/notes.md")).unwrap();
        dir
    }

    fn options(kind: ExplorerKind) -> ExplorerOptions {
        ExplorerOptions {
            kind,
            title: "Choose".into(),
            navigator: NavigatorOptions {
                matcher: PathMatcher::new(false),
                height: 10,
            },
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    async fn serve(explorer: &mut FileExplorer, views: &mut ViewStack) {
        loop {
            let requests = explorer.take_requests();
            if requests.is_empty() {
                return;
            }
            for path in requests {
                let listing = list_directory(&path).await;
                explorer.apply_listing(&path, listing, views);
            }
        }
    }

    async fn open(root: &Path, start: &Path, kind: ExplorerKind) -> (ViewStack, FileExplorer) {
        let mut views = ViewStack::new();
        let view = views.create(ViewOptions::default());
        views.show(view);
        let mut explorer =
            FileExplorer::with_tree(&mut views, view, DirectoryTree::new(root), start, options(kind));
        serve(&mut explorer, &mut views).await;
        (views, explorer)
    }

    fn focus(views: &mut ViewStack, explorer: &FileExplorer, control: ControlId) {
        views.get_mut(explorer.view()).unwrap().focus.focus(control);
    }

    #[tokio::test]
    async fn start_path_is_resolved_and_selected() {
        let dir = setup_test_dir();
        let start = dir.path().join("work/exercises");
        let (views, explorer) = open(dir.path(), &start, ExplorerKind::File).await;

        assert_eq!(explorer.source_path(), Some(start.as_path()));
        assert_eq!(explorer.input().text(), start.to_string_lossy());
        assert_eq!(explorer.contents().items(), &["notes.md", "solution.js"]);
        let focus = &views.get(explorer.view()).unwrap().focus;
        assert!(focus.is_visible(explorer.controls().contents));
    }

    #[tokio::test]
    async fn typed_path_is_submitted_on_enter() {
        let dir = setup_test_dir();
        let (mut views, mut explorer) = open(dir.path(), dir.path(), ExplorerKind::File).await;

        let target = dir.path().join("work/exercises");
        for _ in 0..explorer.input().text().chars().count() {
            explorer.handle_key(key(KeyCode::Backspace), &mut views);
        }
        for c in target.to_string_lossy().chars() {
            explorer.handle_key(key(KeyCode::Char(c)), &mut views);
        }
        explorer.handle_key(key(KeyCode::Enter), &mut views);
        serve(&mut explorer, &mut views).await;

        assert_eq!(explorer.source_path(), Some(target.as_path()));
        let cursor = explorer.navigator().cursor_node().unwrap();
        assert_eq!(explorer.navigator().tree().get(cursor).unwrap().path, target);
    }

    #[tokio::test]
    async fn missing_path_selects_closest_directory() {
        let dir = setup_test_dir();
        let start = dir.path().join("work/missing/deeper");
        let (_views, explorer) = open(dir.path(), &start, ExplorerKind::Folder).await;
        assert_eq!(explorer.source_path(), Some(dir.path().join("work").as_path()));
    }

    #[tokio::test]
    async fn empty_contents_are_skipped_by_tab() {
        let dir = setup_test_dir();
        let start = dir.path().join("empty");
        let (mut views, mut explorer) = open(dir.path(), &start, ExplorerKind::Folder).await;
        let controls = explorer.controls();

        focus(&mut views, &explorer, controls.tree);
        explorer.handle_key(key(KeyCode::Tab), &mut views);
        let focused = views.get(explorer.view()).unwrap().focus.focused();
        assert_eq!(focused, controls.button);
    }

    #[tokio::test]
    async fn file_explorer_accepts_selected_file() {
        let dir = setup_test_dir();
        let start = dir.path().join("work/exercises");
        let (mut views, mut explorer) = open(dir.path(), &start, ExplorerKind::File).await;
        assert_eq!(explorer.controls().button, None);

        focus(&mut views, &explorer, explorer.controls().contents);
        explorer.handle_key(key(KeyCode::Down), &mut views);
        let effect = explorer.handle_key(key(KeyCode::Enter), &mut views);
        assert_eq!(effect, Some(ExplorerEffect::Accept(start.join("solution.js"))));
    }

    #[tokio::test]
    async fn folder_explorer_accepts_selected_directory() {
        let dir = setup_test_dir();
        let start = dir.path().join("work");
        let (mut views, mut explorer) = open(dir.path(), &start, ExplorerKind::Folder).await;

        focus(&mut views, &explorer, explorer.controls().button.unwrap());
        let effect = explorer.handle_key(key(KeyCode::Char(' ')), &mut views);
        assert_eq!(effect, Some(ExplorerEffect::Accept(start)));
    }

    #[tokio::test]
    async fn tree_selection_updates_input_and_contents() {
        let dir = setup_test_dir();
        let (mut views, mut explorer) = open(dir.path(), dir.path(), ExplorerKind::File).await;
        focus(&mut views, &explorer, explorer.controls().tree);

        // root, empty, work
        explorer.handle_key(key(KeyCode::End), &mut views);
        explorer.handle_key(key(KeyCode::Enter), &mut views);
        serve(&mut explorer, &mut views).await;
        explorer.handle_key(key(KeyCode::Down), &mut views);
        explorer.handle_key(key(KeyCode::Enter), &mut views);
        serve(&mut explorer, &mut views).await;

        let exercises = dir.path().join("work/exercises");
        assert_eq!(explorer.input().text(), exercises.to_string_lossy());
        assert_eq!(explorer.contents().items().len(), 2);
    }

    #[tokio::test]
    async fn expand_and_collapse_follow_the_cursor() {
        let dir = setup_test_dir();
        let (mut views, mut explorer) = open(dir.path(), dir.path(), ExplorerKind::File).await;
        focus(&mut views, &explorer, explorer.controls().tree);

        let work = dir.path().join("work");
        let exercises = work.join("exercises");
        explorer.handle_key(key(KeyCode::End), &mut views);
        explorer.handle_key(key(KeyCode::Right), &mut views);
        serve(&mut explorer, &mut views).await;
        assert_eq!(explorer.source_path(), Some(work.as_path()));
        assert_eq!(explorer.input().text(), work.to_string_lossy());

        explorer.handle_key(key(KeyCode::Down), &mut views);
        explorer.handle_key(key(KeyCode::Right), &mut views);
        serve(&mut explorer, &mut views).await;
        assert_eq!(explorer.source_path(), Some(exercises.as_path()));
        assert_eq!(explorer.contents().items(), &["notes.md", "solution.js"]);

        // Collapse exercises, then step out to work.
        explorer.handle_key(key(KeyCode::Left), &mut views);
        explorer.handle_key(key(KeyCode::Left), &mut views);
        assert_eq!(explorer.source_path(), Some(work.as_path()));
        assert_eq!(explorer.input().text(), work.to_string_lossy());
        assert!(explorer.contents().items().is_empty());
        let work_id = explorer.navigator().cursor_node().unwrap();
        assert!(!explorer.navigator().tree().get(work_id).unwrap().extended);
    }

    #[tokio::test]
    async fn escape_is_reported() {
        let dir = setup_test_dir();
        let (mut views, mut explorer) = open(dir.path(), dir.path(), ExplorerKind::File).await;
        assert_eq!(
            explorer.handle_key(key(KeyCode::Esc), &mut views),
            Some(ExplorerEffect::Escape)
        );
    }
}
