use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::app::Result;
use crate::fetcher::ResourceFetcher;

/// Reads a local file as text.
#[derive(Debug, Clone)]
pub struct FileResourceFetcher {
    path: PathBuf,
}

impl FileResourceFetcher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ResourceFetcher for FileResourceFetcher {
    type Output = String;

    /// The file contents, or `None` if the file cannot be read.
    async fn get(&self) -> Result<Option<String>> {
        debug!("loading file: {}", self.path.display());

        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) => {
                debug!("Error loading file {}: {}", self.path.display(), e);
                Ok(None)
            }
        }
    }
}
