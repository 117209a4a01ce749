use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

const WORKSPACE_FILE: &str = "workspace.json";
const PACKAGE_FILE: &str = "root.json";

/// Progress on one exercise of an imported package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseProgress {
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

/// An imported package as recorded in the workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageProgress {
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub exercises: Vec<ExerciseProgress>,
}

/// Pointer to the package and exercise being worked on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentPackage {
    /// Key into `training_packages`: the package directory.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_exercise: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorkspaceData {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    training_packages: BTreeMap<String, PackageProgress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    current_training_package: Option<CurrentPackage>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    preference: BTreeMap<String, serde_json::Value>,
}

/// One row of the package summary table.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageSummary {
    pub key: String,
    pub title: String,
    pub total: usize,
    pub completed: usize,
}

impl PackageSummary {
    pub fn completion(&self) -> String {
        if self.total == 0 {
            return "0%".to_string();
        }
        format!("{:.0}%", self.completed as f64 / self.total as f64 * 100.0)
    }
}

/// A workspace folder and its persisted progress.
#[derive(Debug, Clone)]
pub struct Workspace {
    directory: PathBuf,
    data: WorkspaceData,
}

impl Workspace {
    /// Load `<dir>/workspace.json`.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(WORKSPACE_FILE);
        let contents = fs::read_to_string(&path).map_err(|e| {
            tracing::warn!("Failed to read {}: {}", path.display(), e);
            AppError::InvalidWorkspace(dir.to_path_buf())
        })?;
        let data = serde_json::from_str(&contents).map_err(|e| {
            tracing::warn!("Failed to parse {}: {}", path.display(), e);
            AppError::InvalidWorkspace(dir.to_path_buf())
        })?;
        tracing::info!("Loaded workspace {}", dir.display());
        Ok(Self {
            directory: dir.to_path_buf(),
            data,
        })
    }

    /// Write an empty workspace into `dir`, replacing any existing one.
    pub fn create(dir: &Path) -> Result<Self> {
        let workspace = Self {
            directory: dir.to_path_buf(),
            data: WorkspaceData::default(),
        };
        workspace.save()?;
        tracing::info!("Created workspace {}", dir.display());
        Ok(workspace)
    }

    /// Load the workspace in `dir`, creating it if it is missing or unreadable.
    pub fn load_or_create(dir: &Path) -> Result<Self> {
        match Self::load(dir) {
            Ok(workspace) => Ok(workspace),
            Err(_) if dir.is_dir() => Self::create(dir),
            Err(e) => Err(e),
        }
    }

    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.data)?;
        fs::write(self.directory.join(WORKSPACE_FILE), json)?;
        Ok(())
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Record a package with every exercise incomplete.
    pub fn add_training_package(&mut self, package: &TrainingPackage) {
        let exercises = package
            .exercises
            .iter()
            .map(|e| ExerciseProgress {
                name: e.name.clone(),
                title: e.title.clone(),
                completed: false,
            })
            .collect();
        self.data.training_packages.insert(
            package.key(),
            PackageProgress {
                name: package.name.clone(),
                title: package.title.clone(),
                exercises,
            },
        );
    }

    pub fn set_current_training_package(&mut self, package: &TrainingPackage) {
        let current = self
            .data
            .current_training_package
            .get_or_insert_with(CurrentPackage::default);
        current.name = package.key();
    }

    pub fn current_training_package(&self) -> Option<&CurrentPackage> {
        self.data.current_training_package.as_ref()
    }

    pub fn current_exercise(&self) -> Option<usize> {
        self.current_training_package()?.current_exercise
    }

    pub fn set_current_exercise(&mut self, index: usize) -> Result<()> {
        let current = self
            .data
            .current_training_package
            .as_mut()
            .ok_or(AppError::PackageNotSet)?;
        current.current_exercise = Some(index);
        Ok(())
    }

    /// Exercises of the current package, empty when none is current.
    pub fn current_exercises(&self) -> &[ExerciseProgress] {
        self.current_training_package()
            .and_then(|c| self.data.training_packages.get(&c.name))
            .map(|p| p.exercises.as_slice())
            .unwrap_or_default()
    }

    fn current_exercises_mut(&mut self) -> Option<&mut Vec<ExerciseProgress>> {
        let key = &self.data.current_training_package.as_ref()?.name;
        self.data
            .training_packages
            .get_mut(key)
            .map(|p| &mut p.exercises)
    }

    pub fn pass_current_exercise(&mut self) -> Result<()> {
        let index = self.current_exercise().ok_or(AppError::PackageNotSet)?;
        if let Some(exercise) = self
            .current_exercises_mut()
            .and_then(|exercises| exercises.get_mut(index))
        {
            exercise.completed = true;
        }
        Ok(())
    }

    /// Index of the first incomplete exercise after `after` (or from the start).
    pub fn next_incomplete_exercise(&self, after: Option<usize>) -> Option<usize> {
        let start = after.map_or(0, |i| i + 1);
        self.current_exercises()
            .iter()
            .enumerate()
            .skip(start)
            .find(|(_, e)| !e.completed)
            .map(|(i, _)| i)
    }

    pub fn is_current_package_complete(&self) -> bool {
        self.current_exercises().iter().all(|e| e.completed)
    }

    /// Summary rows for every imported package, ordered by key.
    pub fn package_rows(&self) -> Vec<PackageSummary> {
        self.data
            .training_packages
            .iter()
            .map(|(key, p)| PackageSummary {
                key: key.clone(),
                title: p.title.clone(),
                total: p.exercises.len(),
                completed: p.exercises.iter().filter(|e| e.completed).count(),
            })
            .collect()
    }

    pub fn preference(&self, name: &str) -> Option<&serde_json::Value> {
        self.data.preference.get(name)
    }

    pub fn set_preference(&mut self, name: &str, value: serde_json::Value) {
        self.data.preference.insert(name.to_string(), value);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ExerciseScript {
    #[serde(default)]
    pub tests: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Exercise {
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default)]
    pub script: ExerciseScript,
}

/// A training package read from `<dir>/root.json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TrainingPackage {
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
    #[serde(skip)]
    pub directory: PathBuf,
}

impl TrainingPackage {
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(PACKAGE_FILE);
        let contents = fs::read_to_string(&path).map_err(|e| {
            tracing::warn!("Failed to read {}: {}", path.display(), e);
            AppError::InvalidPackage(dir.to_path_buf())
        })?;
        let mut package: TrainingPackage = serde_json::from_str(&contents).map_err(|e| {
            tracing::warn!("Failed to parse {}: {}", path.display(), e);
            AppError::InvalidPackage(dir.to_path_buf())
        })?;
        package.directory = dir.to_path_buf();
        Ok(package)
    }

    /// The workspace key for this package.
    pub fn key(&self) -> String {
        self.directory.to_string_lossy().to_string()
    }

    /// Test script paths resolved against the package directory.
    pub fn test_paths(&self, exercise: usize) -> Vec<PathBuf> {
        self.exercises
            .get(exercise)
            .map(|e| {
                e.script
                    .tests
                    .iter()
                    .map(|t| self.directory.join(t))
                    .collect()
            })
            .unwrap_or_default()
    }
}
