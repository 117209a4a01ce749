use std::path::{Component, Path, PathBuf};

/// Lexically normalize a path: drop `.` segments and fold `..` into the
/// preceding segment. Never touches the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Normalize text typed by the user. Empty input means the root separator.
pub fn normalize_input(input: &str) -> PathBuf {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return PathBuf::from(std::path::MAIN_SEPARATOR_STR);
    }
    normalize(Path::new(trimmed))
}

/// The filesystem root that contains `path` (`/` on unix, the drive on Windows).
pub fn filesystem_root(path: &Path) -> PathBuf {
    path.ancestors()
        .last()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(std::path::MAIN_SEPARATOR_STR))
}

/// Path comparison with configurable case sensitivity.
///
/// Prefix checks are component-wise, so `/a/bc` is not under `/a/b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathMatcher {
    case_insensitive: bool,
}

impl PathMatcher {
    pub fn new(case_insensitive: bool) -> Self {
        Self { case_insensitive }
    }

    /// Case-insensitive on platforms whose default filesystems are.
    pub fn platform_default() -> Self {
        Self::new(cfg!(any(windows, target_os = "macos")))
    }

    pub fn is_case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    fn component_eq(&self, a: Component<'_>, b: Component<'_>) -> bool {
        if self.case_insensitive {
            a.as_os_str().to_string_lossy().to_lowercase()
                == b.as_os_str().to_string_lossy().to_lowercase()
        } else {
            a == b
        }
    }

    /// Whether `path` equals `base` or lies beneath it.
    pub fn starts_with(&self, path: &Path, base: &Path) -> bool {
        let mut rest = path.components();
        for expected in base.components() {
            match rest.next() {
                Some(actual) if self.component_eq(actual, expected) => {}
                _ => return false,
            }
        }
        true
    }

    pub fn same(&self, a: &Path, b: &Path) -> bool {
        a.components().count() == b.components().count() && self.starts_with(a, b)
    }
}

impl Default for PathMatcher {
    fn default() -> Self {
        Self::platform_default()
    }
}
