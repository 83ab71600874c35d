use crate::core::Storage;
use crate::utils::error::{MossError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Files rooted at one report directory.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.base_path.join(path);
        fs::read(&full_path).map_err(|e| MossError::filesystem(&full_path, e))
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.base_path.join(path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).map_err(|e| MossError::filesystem(parent, e))?;
        }

        fs::write(&full_path, data).map_err(|e| MossError::filesystem(&full_path, e))?;
        Ok(())
    }
}
