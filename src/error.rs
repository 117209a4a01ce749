use std::path::PathBuf;

use thiserror::Error;

/// Application-wide result type alias.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// I/O errors from filesystem operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Terminal initialization or rendering errors.
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// Invalid path provided by the user.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// The folder holds no readable workspace file.
    #[error("This folder does not appear to be a valid workspace: {}", .0.display())]
    InvalidWorkspace(PathBuf),

    /// The folder holds no readable training package.
    #[error("This folder does not appear to be a valid training package: {}", .0.display())]
    InvalidPackage(PathBuf),

    /// An exercise was addressed while no training package is current.
    #[error("No training package is currently selected")]
    PackageNotSet,

    /// JSON encoding failures when writing persisted state.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
