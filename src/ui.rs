use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, Padding, Paragraph},
    Frame,
};

use crate::app::App;
use crate::components::column_list::ColumnListWidget;
use crate::components::contents::ContentListWidget;
use crate::components::dialog::{centered_rect, panel_block, render_frame, scaled, ButtonWidget};
use crate::components::path_input::PathInputWidget;
use crate::components::status_bar::StatusBarWidget;
use crate::components::text_view::TextViewWidget;
use crate::components::tree::TreeWidget;
use crate::explorer::FileExplorer;
use crate::focus::ControlId;
use crate::view::{ViewId, ViewStack};

const KEY_HINTS: &str = "tab:focus  enter:select  esc:back  ctrl-c:quit";

/// Whether `control` holds the focus of the view that receives keys.
fn has_focus(views: &ViewStack, view: ViewId, control: ControlId) -> bool {
    views.top() == Some(view) && views.get(view).is_some_and(|v| v.focus.is_focused(control))
}

fn is_shown(views: &ViewStack, view: ViewId, control: ControlId) -> bool {
    views.get(view).is_some_and(|v| v.focus.is_visible(control))
}

fn render_button(frame: &mut Frame, views: &ViewStack, view: ViewId, control: ControlId, area: Rect) {
    let Some(button) = views.get(view).and_then(|v| v.focus.get(control)) else {
        return;
    };
    let focused = has_focus(views, view, control);
    frame.render_widget(ButtonWidget::for_control(button, focused), area);
}

/// Areas of an explorer drawn over `main`.
struct ExplorerLayout {
    frame: Rect,
    input: Rect,
    body: Rect,
    button: Rect,
}

fn explorer_layout(main: Rect, has_button: bool) -> ExplorerLayout {
    let frame = centered_rect(scaled(main.width, 4, 5), scaled(main.height, 4, 5), main);
    // Border plus horizontal padding, as drawn by `render_frame`.
    let inner = Block::default()
        .borders(Borders::ALL)
        .padding(Padding::horizontal(1))
        .inner(frame);
    let [input, body, button] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(3),
        Constraint::Length(if has_button { 1 } else { 0 }),
    ])
    .areas(inner);
    ExplorerLayout {
        frame,
        input,
        body,
        button,
    }
}

fn main_area(terminal: Rect) -> Rect {
    let [main, _status] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(terminal);
    main
}

/// Rows of the directory tree of an explorer on a `terminal`-sized screen.
pub fn explorer_tree_rows(terminal: Rect, has_button: bool) -> usize {
    let layout = explorer_layout(main_area(terminal), has_button);
    panel_block("", false).inner(layout.body).height as usize
}

/// Render the application UI.
pub fn render(app: &mut App, frame: &mut Frame) {
    let [main, status] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(frame.area());

    let visible: Vec<ViewId> = app.views.visible().collect();
    for view in visible {
        if view == app.panels.workspace.view {
            render_workspace(app, frame, main);
        } else if view == app.panels.package.view {
            render_package(app, frame, main);
        } else if view == app.panels.monitor.view {
            render_monitor(app, frame, main);
        } else if let Some(explorer) = app.explorers.get_mut(&view) {
            render_explorer(explorer, &app.views, frame, main);
        }
    }

    let context = app.context();
    let mut status_bar = StatusBarWidget::new(&context, KEY_HINTS);
    if let Some(message) = &app.status_message {
        status_bar = status_bar.status_message(&message.text, message.is_error);
    }
    frame.render_widget(status_bar, status);
}

fn render_workspace(app: &mut App, frame: &mut Frame, area: Rect) {
    let panel = app.panels.workspace;
    let views = &app.views;
    let block = panel_block("Dojo Workspace", views.top() == Some(panel.view));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let resume_rows = if is_shown(views, panel.view, panel.resume) { 2 } else { 0 };
    let [resume, packages, import] = Layout::vertical([
        Constraint::Length(resume_rows),
        Constraint::Min(1),
        Constraint::Length(1),
    ])
    .areas(inner);

    if resume_rows > 0 {
        render_button(frame, views, panel.view, panel.resume, resume);
    }
    if is_shown(views, panel.view, panel.packages) {
        let focused = has_focus(views, panel.view, panel.packages);
        frame.render_widget(ColumnListWidget::new(&app.packages, focused), packages);
    } else {
        let hint = Paragraph::new("No training packages imported yet.")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(hint, packages);
    }
    render_button(frame, views, panel.view, panel.import, import);
}

fn render_package(app: &mut App, frame: &mut Frame, area: Rect) {
    let panel = app.panels.package;
    let title = app
        .package
        .as_ref()
        .map_or("Training Package", |p| p.title.as_str());
    let block = panel_block(title, app.views.top() == Some(panel.view));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [list, right] =
        Layout::horizontal([Constraint::Percentage(40), Constraint::Percentage(60)]).areas(inner);
    let [text, submit] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(right);

    let views = &app.views;
    let focused = has_focus(views, panel.view, panel.exercises);
    let list_block = Block::default().borders(Borders::RIGHT);
    frame.render_widget(
        ColumnListWidget::new(&app.exercises, focused).block(list_block),
        list,
    );

    let focused = has_focus(views, panel.view, panel.instructions);
    let text_block = panel_block("Instructions", focused);
    app.instructions
        .set_height(text_block.inner(text).height as usize);
    frame.render_widget(TextViewWidget::new(&app.instructions).block(text_block), text);

    render_button(frame, &app.views, panel.view, panel.submit, submit);
}

fn render_monitor(app: &mut App, frame: &mut Frame, area: Rect) {
    let panel = app.panels.monitor;
    let rect = centered_rect(scaled(area.width, 3, 4), scaled(area.height, 3, 4), area);
    let title = if app.running { "Running Tests" } else { "Test Results" };
    let inner = render_frame(title, rect, frame.buffer_mut());

    let ok_rows = if is_shown(&app.views, panel.view, panel.ok) { 1 } else { 0 };
    let [output, ok] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(ok_rows)]).areas(inner);

    app.output.set_height(output.height as usize);
    frame.render_widget(TextViewWidget::new(&app.output), output);
    if ok_rows > 0 {
        render_button(frame, &app.views, panel.view, panel.ok, ok);
    }
}

fn render_explorer(explorer: &mut FileExplorer, views: &ViewStack, frame: &mut Frame, area: Rect) {
    let view = explorer.view();
    let controls = explorer.controls();
    let ExplorerLayout {
        frame: rect,
        input,
        body,
        button,
    } = explorer_layout(area, controls.button.is_some());
    render_frame(explorer.title(), rect, frame.buffer_mut());

    let show_contents = is_shown(views, view, controls.contents);
    let [tree, contents] = if show_contents {
        Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(body)
    } else {
        [body, Rect::default()]
    };

    let tree_focused = has_focus(views, view, controls.tree);
    let tree_title = if explorer.navigator().is_resolving() {
        "Folders (resolving...)"
    } else {
        "Folders"
    };
    let tree_block = panel_block(tree_title, tree_focused);
    let contents_focused = has_focus(views, view, controls.contents);
    let contents_block = panel_block("Files", contents_focused);
    explorer.set_heights(
        tree_block.inner(tree).height as usize,
        contents_block.inner(contents).height as usize,
    );

    let input_focused = has_focus(views, view, controls.input);
    frame.render_widget(
        PathInputWidget::new(explorer.input(), input_focused)
            .block(panel_block("Path", input_focused)),
        input,
    );
    frame.render_widget(
        TreeWidget::new(explorer.navigator(), tree_focused).block(tree_block),
        tree,
    );
    if show_contents {
        frame.render_widget(
            ContentListWidget::new(explorer.contents(), contents_focused).block(contents_block),
            contents,
        );
    }
    if let Some(id) = controls.button {
        render_button(frame, views, view, id, button);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use ratatui::{backend::TestBackend, Terminal};
    use tempfile::TempDir;

    fn screen(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let area = buffer.area;
        (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| buffer.cell((x, y)).unwrap().symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[tokio::test]
    async fn renders_workspace_panel() {
        let dir = TempDir::new().unwrap();
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let mut app = App::new(AppConfig::default(), tx);
        app.start(dir.path());

        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();
        let text = screen(&terminal);
        assert!(text.contains("Dojo Workspace"));
        assert!(text.contains("[ Import Training Package ]"));
        assert!(text.contains("No training packages imported yet."));
    }

    #[test]
    fn tree_rows_match_the_rendered_explorer() {
        let screen = Rect::new(0, 0, 80, 24);
        assert_eq!(explorer_tree_rows(screen, true), 10);
        assert_eq!(explorer_tree_rows(screen, false), 11);
        assert_eq!(explorer_tree_rows(Rect::new(0, 0, 80, 44), true), 26);
    }

    #[tokio::test]
    async fn explorer_sizes_tree_before_first_draw() {
        let dir = TempDir::new().unwrap();
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let mut app = App::new(AppConfig::default(), tx);
        app.set_viewport(Rect::new(0, 0, 80, 44));
        app.start(&dir.path().join("missing"));

        let explorer = &app.explorers[&app.panels.workspace_chooser];
        assert_eq!(explorer.navigator().height(), 26);

        let mut terminal = Terminal::new(TestBackend::new(80, 44)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();
        let explorer = &app.explorers[&app.panels.workspace_chooser];
        assert_eq!(explorer.navigator().height(), 26);
    }

    #[tokio::test]
    async fn renders_explorer_over_panel() {
        let dir = TempDir::new().unwrap();
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let mut app = App::new(AppConfig::default(), tx);
        app.start(&dir.path().join("missing"));

        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();
        let text = screen(&terminal);
        assert!(text.contains("Choose Workspace Folder"));
        assert!(text.contains("[ Choose Folder ]"));
        assert!(text.contains("valid workspace"));
    }
}
