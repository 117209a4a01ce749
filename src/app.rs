use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::Rect;
use tokio::sync::mpsc::UnboundedSender;

use crate::components::column_list::ColumnList;
use crate::components::text_view::TextView;
use crate::config::AppConfig;
use crate::error::Result;
use crate::event::Event;
use crate::explorer::{ExplorerEffect, ExplorerKind, ExplorerOptions, FileExplorer};
use crate::focus::{ControlDef, ControlId, ControlKind};
use crate::fs::listing::{list_directory, Listing};
use crate::navigator::NavigatorOptions;
use crate::runner::{run_solution, RunRequest};
use crate::ui;
use crate::view::{ViewEvent, ViewId, ViewOptions, ViewStack};
use crate::workspace::{TrainingPackage, Workspace};

/// Seconds a status message stays on screen.
const STATUS_EXPIRY_SECS: u64 = 3;

/// Workspace preferences holding the folders last picked from.
const PACKAGE_FOLDER: &str = "packageFolder";
const SOLUTION_FOLDER: &str = "solutionFolder";

/// A transient message on the status line.
#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
    pub created: Instant,
}

/// Workspace panel: resume button, package table, import button.
#[derive(Debug, Clone, Copy)]
pub struct WorkspacePanel {
    pub view: ViewId,
    pub resume: ControlId,
    pub packages: ControlId,
    pub import: ControlId,
}

/// Package panel: exercise table, instructions and submit button.
#[derive(Debug, Clone, Copy)]
pub struct PackagePanel {
    pub view: ViewId,
    pub exercises: ControlId,
    pub instructions: ControlId,
    pub submit: ControlId,
}

/// Solution monitor: runner output and the OK button shown on exit.
#[derive(Debug, Clone, Copy)]
pub struct MonitorPanel {
    pub view: ViewId,
    pub output: ControlId,
    pub ok: ControlId,
}

/// Every view of the application.
#[derive(Debug, Clone, Copy)]
pub struct Panels {
    pub workspace_chooser: ViewId,
    pub workspace: WorkspacePanel,
    pub package_chooser: ViewId,
    pub package: PackagePanel,
    pub solution_chooser: ViewId,
    pub monitor: MonitorPanel,
}

impl Panels {
    fn create(views: &mut ViewStack) -> Self {
        let chooser = ViewOptions::default();

        let workspace_chooser = views.create(chooser);

        let view = views.create(ViewOptions {
            modal: false,
            escapable: false,
        });
        let (resume, packages, import) = match views.get_mut(view) {
            Some(v) => (
                v.adopt(ControlDef::button("Resume").visible(false)),
                v.adopt(
                    ControlDef::new(ControlKind::ColumnList {
                        headers: vec!["Package".into(), "Exercises".into(), "Done".into()],
                    })
                    .visible(false),
                ),
                v.adopt(ControlDef::button("Import Training Package")),
            ),
            None => (ControlId(0), ControlId(1), ControlId(2)),
        };
        let workspace = WorkspacePanel {
            view,
            resume,
            packages,
            import,
        };

        let package_chooser = views.create(chooser);

        let view = views.create(ViewOptions::default());
        let (exercises, instructions, submit) = match views.get_mut(view) {
            Some(v) => (
                v.adopt(ControlDef::new(ControlKind::ColumnList {
                    headers: vec!["Exercise".into(), "Done".into()],
                })),
                v.adopt(ControlDef::new(ControlKind::Text { scrollable: true })),
                v.adopt(ControlDef::button("Submit Solution")),
            ),
            None => (ControlId(0), ControlId(1), ControlId(2)),
        };
        let package = PackagePanel {
            view,
            exercises,
            instructions,
            submit,
        };

        let solution_chooser = views.create(chooser);

        let view = views.create(ViewOptions {
            modal: true,
            escapable: false,
        });
        let (output, ok) = match views.get_mut(view) {
            Some(v) => {
                let container = v.adopt(ControlDef::container(vec![ControlDef::new(
                    ControlKind::Text { scrollable: true },
                )
                .tab_index(0)]));
                let output = v.focus.children(container).first().copied().unwrap_or(container);
                let ok = v.adopt(ControlDef::button("OK").tab_index(1).visible(false));
                (output, ok)
            }
            None => (ControlId(0), ControlId(1)),
        };
        let monitor = MonitorPanel { view, output, ok };

        Self {
            workspace_chooser,
            workspace,
            package_chooser,
            package,
            solution_chooser,
            monitor,
        }
    }
}

/// Main application state.
pub struct App {
    pub config: AppConfig,
    pub views: ViewStack,
    pub panels: Panels,
    pub explorers: HashMap<ViewId, FileExplorer>,
    pub workspace: Option<Workspace>,
    pub package: Option<TrainingPackage>,
    pub packages: ColumnList,
    pub exercises: ColumnList,
    pub instructions: TextView,
    pub output: TextView,
    pub running: bool,
    pub should_quit: bool,
    pub status_message: Option<StatusMessage>,
    /// Terminal area, used to size explorers before their first draw.
    viewport: Rect,
    tx: UnboundedSender<Event>,
}

fn control_kind(views: &ViewStack, view: ViewId, id: ControlId) -> Option<&ControlKind> {
    views.get(view)?.focus.get(id).map(|c| &c.kind)
}

impl App {
    pub fn new(config: AppConfig, tx: UnboundedSender<Event>) -> Self {
        let mut views = ViewStack::new();
        let panels = Panels::create(&mut views);
        let column_list = |view, id| {
            control_kind(&views, view, id)
                .map(ColumnList::from_kind)
                .unwrap_or_default()
        };
        let text_view = |view, id| {
            control_kind(&views, view, id)
                .map(TextView::from_kind)
                .unwrap_or_default()
        };
        let packages = column_list(panels.workspace.view, panels.workspace.packages);
        let exercises = column_list(panels.package.view, panels.package.exercises);
        let instructions = text_view(panels.package.view, panels.package.instructions);
        let output = text_view(panels.monitor.view, panels.monitor.output).follow(true);
        Self {
            config,
            views,
            panels,
            explorers: HashMap::new(),
            workspace: None,
            package: None,
            packages,
            exercises,
            instructions,
            output,
            running: false,
            should_quit: false,
            status_message: None,
            viewport: Rect::new(0, 0, 80, 24),
            tx,
        }
    }

    /// Open the workspace in `dir`, or the workspace chooser if that fails.
    pub fn start(&mut self, dir: &Path) {
        match Workspace::load_or_create(dir) {
            Ok(workspace) => self.open_workspace(workspace),
            Err(e) => {
                self.set_error_message(e.to_string());
                self.open_explorer(
                    self.panels.workspace_chooser,
                    ExplorerKind::Folder,
                    "Choose Workspace Folder",
                    dir,
                );
            }
        }
    }

    fn open_workspace(&mut self, workspace: Workspace) {
        self.workspace = Some(workspace);
        self.refresh_workspace_panel();
        self.views.show(self.panels.workspace.view);
    }

    pub fn set_viewport(&mut self, viewport: Rect) {
        self.viewport = viewport;
    }

    /// Rebuild the explorer of `view` and show it.
    pub fn open_explorer(&mut self, view: ViewId, kind: ExplorerKind, title: &str, start: &Path) {
        let options = ExplorerOptions {
            kind,
            title: title.to_string(),
            navigator: NavigatorOptions {
                matcher: self.config.path_matcher(),
                height: ui::explorer_tree_rows(self.viewport, kind == ExplorerKind::Folder),
            },
        };
        let explorer = FileExplorer::new(&mut self.views, view, start, options);
        self.explorers.insert(view, explorer);
        self.views.show(view);
    }

    /// Folder new explorers start in.
    fn start_dir(&self) -> PathBuf {
        match &self.workspace {
            Some(workspace) => workspace.directory().to_path_buf(),
            None => std::env::current_dir().unwrap_or_else(|_| self.config.workspace_dir()),
        }
    }

    /// Folder remembered under `preference`, if it still exists.
    fn preferred_dir(&self, preference: &str) -> PathBuf {
        self.workspace
            .as_ref()
            .and_then(|w| w.preference(preference))
            .and_then(|value| value.as_str())
            .map(PathBuf::from)
            .filter(|dir| dir.is_dir())
            .unwrap_or_else(|| self.start_dir())
    }

    fn remember_folder(&mut self, preference: &str, dir: &Path) {
        if let Some(workspace) = self.workspace.as_mut() {
            let value = serde_json::Value::String(dir.to_string_lossy().to_string());
            workspace.set_preference(preference, value);
        }
    }

    // ── Status line ──────────────────────────────────────────────────────────

    pub fn set_status_message(&mut self, msg: impl Into<String>) {
        self.status_message = Some(StatusMessage {
            text: msg.into(),
            is_error: false,
            created: Instant::now(),
        });
    }

    pub fn set_error_message(&mut self, msg: impl Into<String>) {
        let text = msg.into();
        tracing::warn!("{}", text);
        self.status_message = Some(StatusMessage {
            text,
            is_error: true,
            created: Instant::now(),
        });
    }

    /// Clear the status message if it has been displayed for more than 3 seconds.
    pub fn clear_expired_status(&mut self) {
        if let Some(message) = &self.status_message {
            if message.created.elapsed().as_secs() >= STATUS_EXPIRY_SECS {
                self.status_message = None;
            }
        }
    }

    // ── Keys ─────────────────────────────────────────────────────────────────

    /// Route a key to the topmost visible view.
    pub fn handle_key(&mut self, key: KeyEvent) {
        let Some(top) = self.views.top() else {
            return;
        };
        if let Some(explorer) = self.explorers.get_mut(&top) {
            match explorer.handle_key(key, &mut self.views) {
                Some(ExplorerEffect::Accept(path)) => self.on_accept(top, path),
                Some(ExplorerEffect::Escape) => self.on_escape(top),
                None => {}
            }
        } else if top == self.panels.workspace.view {
            self.handle_workspace_key(key);
        } else if top == self.panels.package.view {
            self.handle_package_key(key);
        } else if top == self.panels.monitor.view {
            self.handle_monitor_key(key);
        }
        self.after_update();
    }

    fn focused(&self, view: ViewId) -> Option<ControlId> {
        self.views.get(view)?.focus.focused()
    }

    fn handle_workspace_key(&mut self, key: KeyEvent) {
        let panel = self.panels.workspace;
        let focused = self.focused(panel.view);
        match key.code {
            KeyCode::Tab => self.views.focus_next(),
            KeyCode::Esc => self.save_and_quit(),
            KeyCode::Up if focused == Some(panel.packages) => self.packages.move_up(),
            KeyCode::Down if focused == Some(panel.packages) => self.packages.move_down(),
            KeyCode::Enter | KeyCode::Char(' ') => {
                if focused == Some(panel.resume) {
                    if let Some(package_key) = self
                        .workspace
                        .as_ref()
                        .and_then(|w| w.current_training_package())
                        .map(|c| c.name.clone())
                    {
                        self.open_package(Path::new(&package_key));
                    }
                } else if focused == Some(panel.packages) {
                    let package_key = self.workspace.as_ref().and_then(|w| {
                        let row = self.packages.selected()?;
                        w.package_rows().get(row).map(|r| r.key.clone())
                    });
                    if let Some(package_key) = package_key {
                        self.open_package(Path::new(&package_key));
                    }
                } else if focused == Some(panel.import) {
                    let start = self.preferred_dir(PACKAGE_FOLDER);
                    self.open_explorer(
                        self.panels.package_chooser,
                        ExplorerKind::Folder,
                        "Choose Training Package",
                        &start,
                    );
                }
            }
            _ => {}
        }
    }

    fn handle_package_key(&mut self, key: KeyEvent) {
        let panel = self.panels.package;
        let focused = self.focused(panel.view);
        match key.code {
            KeyCode::Tab => self.views.focus_next(),
            KeyCode::Esc => {
                self.views.escape(panel.view);
            }
            KeyCode::Up if focused == Some(panel.exercises) => {
                self.exercises.move_up();
                self.select_exercise();
            }
            KeyCode::Down if focused == Some(panel.exercises) => {
                self.exercises.move_down();
                self.select_exercise();
            }
            KeyCode::Up if focused == Some(panel.instructions) => self.instructions.scroll_up(),
            KeyCode::Down if focused == Some(panel.instructions) => {
                self.instructions.scroll_down()
            }
            KeyCode::PageUp if focused == Some(panel.instructions) => self.instructions.page_up(),
            KeyCode::PageDown if focused == Some(panel.instructions) => {
                self.instructions.page_down()
            }
            KeyCode::Enter | KeyCode::Char(' ') if focused == Some(panel.submit) => {
                let start = self.preferred_dir(SOLUTION_FOLDER);
                self.open_explorer(
                    self.panels.solution_chooser,
                    ExplorerKind::File,
                    "Choose Solution File",
                    &start,
                );
            }
            _ => {}
        }
    }

    fn handle_monitor_key(&mut self, key: KeyEvent) {
        let panel = self.panels.monitor;
        if self.running {
            return;
        }
        match key.code {
            KeyCode::Tab => self.views.focus_next(),
            KeyCode::Up => self.output.scroll_up(),
            KeyCode::Down => self.output.scroll_down(),
            KeyCode::PageUp => self.output.page_up(),
            KeyCode::PageDown => self.output.page_down(),
            KeyCode::Esc => self.views.hide(panel.view),
            KeyCode::Enter | KeyCode::Char(' ') if self.focused(panel.view) == Some(panel.ok) => {
                self.views.hide(panel.view)
            }
            _ => {}
        }
    }

    // ── Explorer results ─────────────────────────────────────────────────────

    pub fn on_accept(&mut self, view: ViewId, path: PathBuf) {
        tracing::info!("Accepted {}", path.display());
        if view == self.panels.workspace_chooser {
            match Workspace::load_or_create(&path) {
                Ok(workspace) => {
                    self.views.hide(view);
                    self.open_workspace(workspace);
                }
                Err(e) => self.set_error_message(e.to_string()),
            }
        } else if view == self.panels.package_chooser {
            if let Err(e) = self.import_package(&path) {
                self.set_error_message(e.to_string());
                return;
            }
            self.views.hide(view);
            self.open_package(&path);
        } else if view == self.panels.solution_chooser {
            if let Some(parent) = path.parent() {
                self.remember_folder(SOLUTION_FOLDER, parent);
            }
            self.views.hide(view);
            self.start_run(path);
        }
    }

    pub fn on_escape(&mut self, view: ViewId) {
        if view == self.panels.workspace_chooser && self.workspace.is_none() {
            self.quit();
            return;
        }
        self.views.escape(view);
    }

    fn import_package(&mut self, dir: &Path) -> Result<()> {
        let package = TrainingPackage::load(dir)?;
        if let Some(parent) = dir.parent() {
            self.remember_folder(PACKAGE_FOLDER, parent);
        }
        if let Some(workspace) = self.workspace.as_mut() {
            workspace.add_training_package(&package);
            workspace.save()?;
        }
        self.set_status_message(format!("Imported {}", package.title));
        self.refresh_workspace_panel();
        Ok(())
    }

    /// Make the package in `dir` current and show its panel.
    pub fn open_package(&mut self, dir: &Path) {
        let package = match TrainingPackage::load(dir) {
            Ok(package) => package,
            Err(e) => {
                self.set_error_message(e.to_string());
                return;
            }
        };
        if let Some(workspace) = self.workspace.as_mut() {
            workspace.set_current_training_package(&package);
            let exercise = workspace
                .current_exercise()
                .or_else(|| workspace.next_incomplete_exercise(None))
                .unwrap_or(0);
            if let Err(e) = workspace.set_current_exercise(exercise) {
                tracing::warn!("Failed to select exercise: {}", e);
            }
            if let Err(e) = workspace.save() {
                tracing::warn!("Failed to save workspace: {}", e);
            }
        }
        self.package = Some(package);
        self.refresh_package_panel();
        self.views.show(self.panels.package.view);
    }

    fn select_exercise(&mut self) {
        let Some(index) = self.exercises.selected() else {
            return;
        };
        if let Some(workspace) = self.workspace.as_mut() {
            if let Err(e) = workspace.set_current_exercise(index) {
                tracing::warn!("Failed to select exercise: {}", e);
            }
        }
        self.refresh_instructions();
    }

    // ── Runner ───────────────────────────────────────────────────────────────

    fn start_run(&mut self, solution: PathBuf) {
        let exercise = self
            .workspace
            .as_ref()
            .and_then(|w| w.current_exercise())
            .unwrap_or(0);
        let tests = self
            .package
            .as_ref()
            .map(|p| p.test_paths(exercise))
            .unwrap_or_default();
        let request = RunRequest {
            program: self.config.runner_program().to_string(),
            args: self.config.runner_args(),
            tests,
            solution,
        };

        self.output.clear();
        self.running = true;
        let monitor = self.panels.monitor;
        if let Some(view) = self.views.get_mut(monitor.view) {
            view.focus.set_visible(monitor.ok, false);
        }
        self.views.show(monitor.view);
        tokio::spawn(run_solution(request, self.tx.clone()));
    }

    pub fn on_runner_output(&mut self, line: String) {
        self.output.push_line(line);
    }

    pub fn on_runner_exit(&mut self, passed: bool) {
        self.running = false;
        if passed {
            self.output.push_line("All tests passed.");
            if let Some(workspace) = self.workspace.as_mut() {
                if let Err(e) = workspace.pass_current_exercise() {
                    tracing::warn!("Failed to record pass: {}", e);
                }
                if let Some(next) = workspace.next_incomplete_exercise(workspace.current_exercise())
                {
                    if let Err(e) = workspace.set_current_exercise(next) {
                        tracing::warn!("Failed to select exercise: {}", e);
                    }
                }
                if let Err(e) = workspace.save() {
                    tracing::warn!("Failed to save workspace: {}", e);
                }
            }
            self.refresh_package_panel();
        } else {
            self.output.push_line("Some tests failed.");
        }

        let monitor = self.panels.monitor;
        if let Some(view) = self.views.get_mut(monitor.view) {
            view.focus.set_visible(monitor.ok, true);
            view.focus.focus(monitor.ok);
        }
        self.after_update();
    }

    // ── Background listings ──────────────────────────────────────────────────

    /// Spawn a listing task for every directory an explorer asked for.
    pub fn dispatch_listings(&mut self) {
        for (&view, explorer) in self.explorers.iter_mut() {
            for path in explorer.take_requests() {
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let listing = list_directory(&path).await;
                    let _ = tx.send(Event::DirectoryListed {
                        view,
                        path,
                        listing,
                    });
                });
            }
        }
    }

    pub fn on_directory_listed(&mut self, view: ViewId, path: PathBuf, listing: Listing) {
        if let Some(explorer) = self.explorers.get_mut(&view) {
            explorer.apply_listing(&path, listing, &mut self.views);
        }
        self.dispatch_listings();
    }

    /// React to views that were shown or hidden since the last call.
    pub fn process_view_events(&mut self) {
        for event in self.views.take_events() {
            match event {
                ViewEvent::Hidden(view) if view == self.panels.monitor.view => {
                    let complete = self
                        .workspace
                        .as_ref()
                        .is_some_and(|w| w.is_current_package_complete());
                    if complete {
                        self.set_status_message("Training package complete!");
                        self.views.hide(self.panels.package.view);
                    }
                }
                ViewEvent::Hidden(view) if view == self.panels.package.view => {
                    self.refresh_workspace_panel();
                }
                _ => {}
            }
        }
    }

    fn after_update(&mut self) {
        self.dispatch_listings();
        // Hiding the package panel emits another event.
        self.process_view_events();
        self.process_view_events();
    }

    // ── Panel contents ───────────────────────────────────────────────────────

    fn refresh_workspace_panel(&mut self) {
        let Some(workspace) = &self.workspace else {
            return;
        };
        let rows: Vec<Vec<String>> = workspace
            .package_rows()
            .into_iter()
            .map(|r| vec![r.title.clone(), r.total.to_string(), r.completion()])
            .collect();
        let has_current = workspace.current_training_package().is_some();
        let has_rows = !rows.is_empty();
        self.packages.set_rows(rows);

        let panel = self.panels.workspace;
        if let Some(view) = self.views.get_mut(panel.view) {
            view.focus.set_visible(panel.resume, has_current);
            view.focus.set_visible(panel.packages, has_rows);
            if view.is_visible() && view.focus.focused().is_none() {
                view.focus.focus_first();
            }
        }
    }

    fn refresh_package_panel(&mut self) {
        let (rows, current) = match &self.workspace {
            Some(workspace) => (
                workspace
                    .current_exercises()
                    .iter()
                    .map(|e| {
                        let done = if e.completed { "yes" } else { "" };
                        vec![e.title.clone(), done.to_string()]
                    })
                    .collect(),
                workspace.current_exercise().unwrap_or(0),
            ),
            None => (Vec::new(), 0),
        };
        self.exercises.set_rows(rows);
        self.exercises.select(current);
        self.refresh_instructions();
    }

    fn refresh_instructions(&mut self) {
        let index = self.exercises.selected().unwrap_or(0);
        let lines = self
            .package
            .as_ref()
            .and_then(|p| p.exercises.get(index))
            .map(|e| {
                let mut lines = vec![e.title.clone(), String::new()];
                lines.extend(e.instructions.iter().cloned());
                lines
            })
            .unwrap_or_default();
        self.instructions.set_lines(lines);
    }

    /// Title of the current package, for the status line.
    pub fn context(&self) -> String {
        match (&self.workspace, &self.package) {
            (Some(_), Some(package)) if self.views.is_visible(self.panels.package.view) => {
                package.title.clone()
            }
            (Some(workspace), _) => workspace.directory().display().to_string(),
            _ => String::new(),
        }
    }

    /// Save progress and quit.
    pub fn save_and_quit(&mut self) {
        if let Some(workspace) = &self.workspace {
            if let Err(e) = workspace.save() {
                tracing::warn!("Failed to save workspace: {}", e);
            }
        }
        self.quit();
    }

    /// Quit the application.
    pub fn quit(&mut self) {
        tracing::info!("Quitting");
        self.should_quit = true;
    }
}
