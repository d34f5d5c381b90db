//! The shared, read-only context every check runs against.

use std::path::PathBuf;
use std::sync::Arc;

use crate::ignorefile::Dockerignore;
use crate::model::Dockerfile;

/// Built once per lint run, before any check starts; immutable thereafter.
#[derive(Debug, Clone)]
pub struct CheckContext {
    /// Where the Dockerfile came from (may be a synthetic name for readers).
    pub dockerfile_path: PathBuf,
    /// The build-context directory, when the caller supplied one.
    pub context_dir: Option<PathBuf>,
    pub dockerfile: Arc<Dockerfile>,
    pub dockerignore: Arc<Dockerignore>,
}

impl CheckContext {
    pub fn new(
        dockerfile_path: impl Into<PathBuf>,
        context_dir: Option<PathBuf>,
        dockerfile: Arc<Dockerfile>,
        dockerignore: Arc<Dockerignore>,
    ) -> Self {
        CheckContext {
            dockerfile_path: dockerfile_path.into(),
            context_dir,
            dockerfile,
            dockerignore,
        }
    }

    /// The Dockerfile's path relative to the build context, for matching
    /// against dockerignore patterns.
    pub fn dockerfile_relative_path(&self) -> String {
        if let Some(context) = &self.context_dir {
            if let Ok(relative) = self.dockerfile_path.strip_prefix(context) {
                return relative.to_string_lossy().replace('\\', "/");
            }
        }
        self.dockerfile_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Dockerfile".to_string())
    }
}
