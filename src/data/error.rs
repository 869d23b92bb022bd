use std::path::PathBuf;

use thiserror::Error;

/// Why a dataset could not be produced. Per-row problems never end up here.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The source path is missing or unreadable.
    #[error("cannot read {}: {source}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file was read but holds no usable table.
    #[error("{} is not a usable table: {reason}", path.display())]
    Schema { path: PathBuf, reason: String },
}

impl LoadError {
    pub fn schema(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        LoadError::Schema {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn file_access(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LoadError::FileAccess {
            path: path.into(),
            source,
        }
    }
}
