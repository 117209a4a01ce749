mod app;
mod components;
mod config;
mod error;
mod event;
mod explorer;
mod focus;
mod fs;
mod handler;
mod logging;
mod navigator;
mod runner;
mod tui;
mod ui;
mod view;
mod workspace;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::app::App;
use crate::config::{AppConfig, GeneralConfig, LogConfig, TreeConfig};
use crate::event::{Event, EventHandler};
use crate::tui::{install_panic_hook, Tui};

/// A terminal coding-dojo trainer.
#[derive(Parser, Debug)]
#[command(name = "dojo", version, about)]
struct Cli {
    /// Workspace folder (defaults to the configured one, then the current directory)
    workspace: Option<PathBuf>,

    /// Path to a config file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Compare paths case-insensitively in the directory tree
    #[arg(long)]
    case_insensitive: bool,

    /// Write the log to this file
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn overrides(&self) -> AppConfig {
        AppConfig {
            general: GeneralConfig {
                workspace: self
                    .workspace
                    .as_ref()
                    .map(|p| p.to_string_lossy().to_string()),
                mouse: None,
            },
            tree: TreeConfig {
                case_insensitive: self.case_insensitive.then_some(true),
            },
            log: LogConfig {
                level: None,
                file: self
                    .log_file
                    .as_ref()
                    .map(|p| p.to_string_lossy().to_string()),
            },
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> error::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref(), Some(&cli.overrides()));

    if let Err(e) = logging::init(&config.log_file(), config.log_level()) {
        eprintln!("Warning: logging disabled: {}", e);
    }

    let workspace = config.workspace_dir();
    let workspace = if workspace.is_relative() {
        std::env::current_dir()?.join(workspace)
    } else {
        workspace
    };

    install_panic_hook();

    let mut tui = Tui::new(config.mouse_enabled())?;
    let mut events = EventHandler::new(Duration::from_millis(100));
    let mut app = App::new(config, events.sender());
    app.set_viewport(tui.area()?);
    app.start(&fs::path::normalize(&workspace));
    app.dispatch_listings();

    loop {
        tui.draw(|frame| ui::render(&mut app, frame))?;
        app.dispatch_listings();

        match events.next().await? {
            Event::Key(key) => handler::handle_key_event(&mut app, key),
            Event::Mouse(_) => {}
            Event::Tick => app.clear_expired_status(),
            Event::Resize(width, height) => {
                app.set_viewport(ratatui::layout::Rect::new(0, 0, width, height))
            }
            Event::DirectoryListed {
                view,
                path,
                listing,
            } => app.on_directory_listed(view, path, listing),
            Event::RunnerOutput(line) => app.on_runner_output(line),
            Event::RunnerExit { passed } => app.on_runner_exit(passed),
        }

        if app.should_quit {
            break;
        }
    }

    tui.restore()?;
    Ok(())
}
