//! Application configuration: TOML file loading, CLI overrides, and defaults.
//!
//! Resolution order (first found wins, values merge/override):
//! 1. CLI flags (`--config`, `--case-insensitive`, `--log-file`)
//! 2. `$DOJO_CONFIG` environment variable (path to config file)
//! 3. Project-local `.dojo.toml` in the current working directory
//! 4. Global `~/.config/dojo/config.toml`
//! 5. Built-in defaults

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::fs::path::PathMatcher;

// ── Section configs ──────────────────────────────────────────────────────────

/// General application settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct GeneralConfig {
    /// Workspace folder (overridden by CLI positional arg).
    pub workspace: Option<String>,
    /// Enable mouse capture.
    pub mouse: Option<bool>,
}

/// Directory tree settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TreeConfig {
    /// Compare paths case-insensitively during resolution.
    pub case_insensitive: Option<bool>,
}

/// Exercise runner settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RunnerConfig {
    /// Program that runs the tests.
    pub program: Option<String>,
    /// Arguments placed before the test scripts and the solution.
    pub args: Option<Vec<String>>,
}

/// Log output settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    pub level: Option<String>,
    /// Log file path.
    pub file: Option<String>,
}

// ── Top-level config ─────────────────────────────────────────────────────────

/// Top-level application configuration.
///
/// All fields are optional so that partial configs from different sources
/// can be merged together (CLI overrides file, file overrides defaults).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub tree: TreeConfig,
    pub runner: RunnerConfig,
    pub log: LogConfig,
}

// ── Default constants ────────────────────────────────────────────────────────

pub const DEFAULT_RUNNER_PROGRAM: &str = "npx";
pub const DEFAULT_RUNNER_ARGS: [&str; 3] = ["mocha", "--reporter", "spec"];
pub const DEFAULT_LOG_LEVEL: &str = "info";

// ── Config file locator ──────────────────────────────────────────────────────

/// Return the list of candidate config file paths in priority order.
///
/// Does NOT include the CLI `--config` path; that is handled separately.
fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(env_path) = std::env::var("DOJO_CONFIG") {
        paths.push(PathBuf::from(env_path));
    }

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(".dojo.toml"));
    }

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("dojo").join("config.toml"));
    }

    paths
}

/// Try to read and parse a TOML config file. Returns `None` if the file
/// doesn't exist or can't be parsed (with a warning printed to stderr).
///
/// Config is read before logging starts, so warnings go to stderr.
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str::<AppConfig>(&content) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            eprintln!(
                "Warning: failed to parse config file {}: {}",
                path.display(),
                e
            );
            None
        }
    }
}

// ── Merge logic ──────────────────────────────────────────────────────────────

impl AppConfig {
    /// Merge `other` on top of `self`; `other`'s `Some` values win.
    pub fn merge(self, other: &AppConfig) -> AppConfig {
        AppConfig {
            general: GeneralConfig {
                workspace: other
                    .general
                    .workspace
                    .clone()
                    .or(self.general.workspace),
                mouse: other.general.mouse.or(self.general.mouse),
            },
            tree: TreeConfig {
                case_insensitive: other.tree.case_insensitive.or(self.tree.case_insensitive),
            },
            runner: RunnerConfig {
                program: other.runner.program.clone().or(self.runner.program),
                args: other.runner.args.clone().or(self.runner.args),
            },
            log: LogConfig {
                level: other.log.level.clone().or(self.log.level),
                file: other.log.file.clone().or(self.log.file),
            },
        }
    }

    /// Load the final merged configuration.
    ///
    /// `cli_config_path` is an explicit config file path from `--config`.
    /// `cli_overrides` are partial overrides derived from CLI flags.
    pub fn load(cli_config_path: Option<&Path>, cli_overrides: Option<&AppConfig>) -> AppConfig {
        let mut config = AppConfig::default();

        // Walk in reverse so that highest-priority (env var) overwrites lower.
        for path in candidate_paths().iter().rev() {
            if let Some(file_cfg) = load_file(path) {
                config = config.merge(&file_cfg);
            }
        }

        if let Some(cli_path) = cli_config_path {
            if let Some(file_cfg) = load_file(cli_path) {
                config = config.merge(&file_cfg);
            }
        }

        if let Some(overrides) = cli_overrides {
            config = config.merge(overrides);
        }

        config
    }

    // ── Convenience getters with built-in defaults ──────────────────────────

    /// Workspace folder; the current directory when unset.
    pub fn workspace_dir(&self) -> PathBuf {
        self.general
            .workspace
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Whether mouse capture is enabled.
    pub fn mouse_enabled(&self) -> bool {
        self.general.mouse.unwrap_or(false)
    }

    /// Path matcher for tree resolution; follows the platform when unset.
    pub fn path_matcher(&self) -> PathMatcher {
        match self.tree.case_insensitive {
            Some(case_insensitive) => PathMatcher::new(case_insensitive),
            None => PathMatcher::platform_default(),
        }
    }

    pub fn runner_program(&self) -> &str {
        self.runner
            .program
            .as_deref()
            .unwrap_or(DEFAULT_RUNNER_PROGRAM)
    }

    pub fn runner_args(&self) -> Vec<String> {
        match &self.runner.args {
            Some(args) => args.clone(),
            None => DEFAULT_RUNNER_ARGS.iter().map(|a| a.to_string()).collect(),
        }
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    /// Log file; `<state dir>/dojo/dojo.log` when unset.
    pub fn log_file(&self) -> PathBuf {
        if let Some(file) = &self.log.file {
            return PathBuf::from(file);
        }
        dirs::state_dir()
            .or_else(dirs::cache_dir)
            .unwrap_or_else(std::env::temp_dir)
            .join("dojo")
            .join("dojo.log")
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_values() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.workspace_dir(), PathBuf::from("."));
        assert!(!cfg.mouse_enabled());
        assert_eq!(cfg.path_matcher(), PathMatcher::platform_default());
        assert_eq!(cfg.runner_program(), "npx");
        assert_eq!(cfg.runner_args(), vec!["mocha", "--reporter", "spec"]);
        assert_eq!(cfg.log_level(), "info");
        assert!(cfg.log_file().ends_with("dojo/dojo.log"));
    }

    #[test]
    fn test_toml_parsing_full() {
        let toml = r#"
[general]
workspace = "/home/me/dojo"
mouse = true

[tree]
case_insensitive = true

[runner]
program = "node"
args = ["--test"]

[log]
level = "debug"
file = "/tmp/dojo-test.log"
"#;
        let cfg: AppConfig = toml::from_str(toml).expect("parse failed");
        assert_eq!(cfg.workspace_dir(), PathBuf::from("/home/me/dojo"));
        assert!(cfg.mouse_enabled());
        assert!(cfg.path_matcher().is_case_insensitive());
        assert_eq!(cfg.runner_program(), "node");
        assert_eq!(cfg.runner_args(), vec!["--test"]);
        assert_eq!(cfg.log_level(), "debug");
        assert_eq!(cfg.log_file(), PathBuf::from("/tmp/dojo-test.log"));
    }

    #[test]
    fn test_toml_parsing_partial() {
        let toml = r#"
[tree]
case_insensitive = false
"#;
        let cfg: AppConfig = toml::from_str(toml).expect("parse failed");
        assert!(!cfg.path_matcher().is_case_insensitive());
        assert_eq!(cfg.runner_program(), "npx");
    }

    #[test]
    fn test_toml_parsing_empty() {
        let cfg: AppConfig = toml::from_str("").expect("parse failed");
        assert_eq!(cfg.log_level(), "info");
    }

    #[test]
    fn test_merge_overrides() {
        let base = AppConfig {
            runner: RunnerConfig {
                program: Some("npx".into()),
                args: Some(vec!["mocha".into()]),
            },
            ..Default::default()
        };
        let over = AppConfig {
            runner: RunnerConfig {
                program: Some("node".into()),
                // args not set, should keep base
                ..Default::default()
            },
            ..Default::default()
        };

        let merged = base.merge(&over);
        assert_eq!(merged.runner_program(), "node");
        assert_eq!(merged.runner_args(), vec!["mocha"]);
    }

    #[test]
    fn test_merge_none_does_not_clear_some() {
        let base = AppConfig {
            tree: TreeConfig {
                case_insensitive: Some(true),
            },
            ..Default::default()
        };
        let merged = base.merge(&AppConfig::default());
        assert!(merged.path_matcher().is_case_insensitive());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg_path = dir.path().join("test-config.toml");
        let mut f = std::fs::File::create(&cfg_path).expect("create");
        writeln!(
            f,
            r#"
[log]
level = "trace"
"#
        )
        .expect("write");

        let cfg = load_file(&cfg_path).expect("load");
        assert_eq!(cfg.log_level(), "trace");
        assert_eq!(cfg.runner_program(), "npx");
    }

    #[test]
    fn test_load_missing_file() {
        assert!(load_file(Path::new("/nonexistent/config.toml")).is_none());
    }

    #[test]
    fn test_load_invalid_toml_returns_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg_path = dir.path().join("bad.toml");
        std::fs::write(&cfg_path, "this is { not valid toml").expect("write");
        assert!(load_file(&cfg_path).is_none());
    }

    #[test]
    fn test_load_with_cli_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg_path = dir.path().join("config.toml");
        std::fs::write(
            &cfg_path,
            r#"
[general]
workspace = "/from/file"

[tree]
case_insensitive = false
"#,
        )
        .expect("write");

        let cli_overrides = AppConfig {
            tree: TreeConfig {
                case_insensitive: Some(true),
            },
            ..Default::default()
        };

        let cfg = AppConfig::load(Some(&cfg_path), Some(&cli_overrides));
        assert!(cfg.path_matcher().is_case_insensitive());
        assert_eq!(cfg.workspace_dir(), PathBuf::from("/from/file"));
    }
}
