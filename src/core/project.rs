//! Project discovery and structure

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::store::DATABASE_FILE;

/// Directory marking a project root
const PROJECT_DIR: &str = ".a11y";

/// A directory holding an `.a11y/` folder with config and database
#[derive(Debug)]
pub struct Project {
    /// Root directory of the project (parent of .a11y/)
    root: PathBuf,
}

impl Project {
    /// Find project root by walking up from the current directory
    pub fn discover() -> Result<Self, ProjectError> {
        let current = std::env::current_dir()
            .map_err(|e| ProjectError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find project root by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, ProjectError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        loop {
            if current.join(PROJECT_DIR).is_dir() {
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(ProjectError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Create the `.a11y/` directory and default config at the given path
    pub fn init(path: &Path) -> Result<Self, ProjectError> {
        let root = path
            .canonicalize()
            .unwrap_or_else(|_| path.to_path_buf());

        let project_dir = root.join(PROJECT_DIR);
        if project_dir.exists() {
            return Err(ProjectError::AlreadyExists(root.clone()));
        }

        std::fs::create_dir_all(&project_dir)
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        let config_path = project_dir.join("config.yaml");
        std::fs::write(&config_path, Self::default_config())
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        Ok(Self { root })
    }

    fn default_config() -> &'static str {
        r#"# a11y project configuration

# Site partition used for every query
# site_id: 1

# Maximum issue rows considered by a single query
# record_limit: 100000

# Seconds a computed summary stays fresh
# cache_ttl_secs: 86400

# Name of the issue table written by the scanner
# issue_table: accessibility_checker

# scannable_post_types: [post, page]
# scannable_post_statuses: [publish, future, draft, pending, private]
# public_post_types: [post, page]
"#
    }

    /// Get the project root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the .a11y configuration directory
    pub fn project_dir(&self) -> PathBuf {
        self.root.join(PROJECT_DIR)
    }

    /// Path of the SQLite database
    pub fn database_path(&self) -> PathBuf {
        self.root.join(DATABASE_FILE)
    }
}

/// Errors that can occur during project operations
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("not an a11y project (searched from {searched_from:?}). Run 'a11y init' to create one.")]
    NotFound { searched_from: PathBuf },

    #[error("a11y project already exists at {0:?}")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    IoError(String),
}
