use std::path::{Path, PathBuf};

use futures::future::join_all;

/// Classification of a directory entry from a non-following stat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    File,
    /// The stat call failed; the entry is shown but never expanded.
    Unknown,
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedEntry {
    pub name: String,
    pub path: PathBuf,
    pub kind: EntryKind,
}

/// Result of listing one directory, split into expandable and plain entries.
///
/// An empty listing means "nothing visible here", not necessarily an empty
/// directory: unreadable directories list as empty too.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    pub directories: Vec<ListedEntry>,
    /// Files and entries whose stat failed.
    pub files: Vec<ListedEntry>,
    pub file_names: Vec<String>,
}

impl Listing {
    /// Build a listing from classified entries, ordered by name (case-insensitive).
    pub fn from_entries(mut entries: Vec<ListedEntry>) -> Self {
        entries.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.name.cmp(&b.name))
        });

        let mut listing = Listing::default();
        for entry in entries {
            match entry.kind {
                EntryKind::Directory => listing.directories.push(entry),
                EntryKind::File | EntryKind::Unknown => {
                    listing.file_names.push(entry.name.clone());
                    listing.files.push(entry);
                }
            }
        }
        listing
    }
}

/// List `directory` and classify every entry.
///
/// Stats for all entries are issued concurrently and joined before the
/// listing is returned. A failing listing degrades to an empty result.
pub async fn list_directory(directory: &Path) -> Listing {
    let names = match read_names(directory).await {
        Ok(names) => names,
        Err(e) => {
            tracing::warn!("Failed to list {}: {}", directory.display(), e);
            return Listing::default();
        }
    };

    let listing = Listing::from_entries(classify_entries(directory, names).await);
    tracing::debug!(
        "Listed {}: {} directories, {} files",
        directory.display(),
        listing.directories.len(),
        listing.files.len()
    );
    listing
}

/// Stat every named entry of `directory` concurrently.
///
/// An entry that cannot be stat'ed, for instance because it was removed
/// after the directory was read, is classified `Unknown`.
async fn classify_entries(directory: &Path, names: Vec<String>) -> Vec<ListedEntry> {
    let stats = names.iter().map(|name| {
        let path = directory.join(name);
        async move {
            let kind = match tokio::fs::symlink_metadata(&path).await {
                Ok(meta) if meta.is_dir() => EntryKind::Directory,
                Ok(_) => EntryKind::File,
                Err(e) => {
                    tracing::debug!("Failed to stat {}: {}", path.display(), e);
                    EntryKind::Unknown
                }
            };
            (path, kind)
        }
    });
    let classified = join_all(stats).await;

    names
        .into_iter()
        .zip(classified)
        .map(|(name, (path, kind))| ListedEntry { name, path, kind })
        .collect()
}

async fn read_names(directory: &Path) -> std::io::Result<Vec<String>> {
    let mut entries = tokio::fs::read_dir(directory).await?;
    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        names.push(entry.file_name().to_string_lossy().to_string());
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use tempfile::TempDir;

    fn setup_test_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("beta")).unwrap();
        fs::create_dir(dir.path().join("Alpha")).unwrap();
        File::create(dir.path().join("notes.txt")).unwrap();
        File::create(dir.path().join("main.rs")).unwrap();
        dir
    }

    #[tokio::test]
    async fn splits_directories_and_files() {
        let dir = setup_test_dir();
        let listing = list_directory(dir.path()).await;

        let dirs: Vec<&str> = listing.directories.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(dirs, vec!["Alpha", "beta"]);
        assert_eq!(listing.file_names, vec!["main.rs", "notes.txt"]);
        assert!(listing.files.iter().all(|e| e.kind == EntryKind::File));
    }

    #[tokio::test]
    async fn entry_paths_are_joined_to_directory() {
        let dir = setup_test_dir();
        let listing = list_directory(dir.path()).await;
        assert_eq!(listing.directories[0].path, dir.path().join("Alpha"));
    }

    #[tokio::test]
    async fn missing_directory_lists_empty() {
        let dir = TempDir::new().unwrap();
        let listing = list_directory(&dir.path().join("gone")).await;
        assert!(listing.directories.is_empty());
        assert!(listing.files.is_empty());
        assert!(listing.file_names.is_empty());
    }

    #[tokio::test]
    async fn vanished_entry_is_classified_unknown() {
        let dir = setup_test_dir();
        let names = vec!["beta".to_string(), "notes.txt".to_string(), "vanished".to_string()];
        let entries = classify_entries(dir.path(), names).await;

        let kinds: Vec<EntryKind> = entries.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![EntryKind::Directory, EntryKind::File, EntryKind::Unknown]
        );
        assert_eq!(entries[2].path, dir.path().join("vanished"));

        let listing = Listing::from_entries(entries);
        assert_eq!(listing.file_names, vec!["notes.txt", "vanished"]);
        assert_eq!(listing.files[1].kind, EntryKind::Unknown);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn unsearchable_directory_lists_entries_as_unknown() {
        use std::os::unix::fs::PermissionsExt;

        let dir = setup_test_dir();
        let locked = dir.path().join("beta");
        File::create(locked.join("inside.txt")).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o600)).unwrap();
        if fs::symlink_metadata(locked.join("inside.txt")).is_ok() {
            // Privileged users bypass directory search permission.
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let listing = list_directory(&locked).await;
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert!(listing.directories.is_empty());
        assert_eq!(listing.file_names, vec!["inside.txt"]);
        assert_eq!(listing.files[0].kind, EntryKind::Unknown);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlink_to_directory_is_not_followed() {
        let dir = setup_test_dir();
        std::os::unix::fs::symlink(dir.path().join("beta"), dir.path().join("link")).unwrap();
        let listing = list_directory(dir.path()).await;
        assert!(listing.file_names.contains(&"link".to_string()));
        assert!(!listing.directories.iter().any(|e| e.name == "link"));
    }

    #[test]
    fn unknown_entries_are_listed_with_files() {
        let listing = Listing::from_entries(vec![
            ListedEntry {
                name: "ghost".into(),
                path: PathBuf::from("/x/ghost"),
                kind: EntryKind::Unknown,
            },
            ListedEntry {
                name: "dir".into(),
                path: PathBuf::from("/x/dir"),
                kind: EntryKind::Directory,
            },
        ]);
        assert_eq!(listing.directories.len(), 1);
        assert_eq!(listing.files[0].kind, EntryKind::Unknown);
        assert_eq!(listing.file_names, vec!["ghost"]);
    }
}
