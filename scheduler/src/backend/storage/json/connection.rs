use anyhow::{Context, Result};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

/// JsonConnection owns the data directory every file repository writes into
#[derive(Clone, Debug)]
pub struct JsonConnection {
    base_directory: PathBuf,
}

impl JsonConnection {
    /// Create a connection, creating the directory when it does not exist yet
    pub fn new<P: AsRef<Path>>(base_directory: P) -> Result<Self> {
        let base_path = base_directory.as_ref().to_path_buf();

        if !base_path.exists() {
            fs::create_dir_all(&base_path)
                .with_context(|| format!("Failed to create data directory {}", base_path.display()))?;
            info!("Created data directory: {}", base_path.display());
        }

        Ok(Self {
            base_directory: base_path,
        })
    }

    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    pub fn file_path(&self, file_name: &str) -> PathBuf {
        self.base_directory.join(file_name)
    }

    /// Contents of `file_name`, or `None` when it does not exist
    pub fn read_if_exists(&self, file_name: &str) -> Result<Option<String>> {
        let path = self.file_path(file_name);
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Some(contents))
    }

    /// Replace `file_name` in one step: write a temp file, then rename it over
    pub fn write_atomic(&self, file_name: &str, contents: &str) -> Result<()> {
        let path = self.file_path(file_name);
        let temp_path = path.with_extension("tmp");

        fs::write(&temp_path, contents)
            .with_context(|| format!("Failed to write {}", temp_path.display()))?;
        fs::rename(&temp_path, &path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;

        debug!("Saved {}", path.display());
        Ok(())
    }

    pub fn remove_if_exists(&self, file_name: &str) -> Result<()> {
        let path = self.file_path(file_name);
        if path.exists() {
            fs::remove_file(&path).with_context(|| format!("Failed to remove {}", path.display()))?;
            debug!("Removed {}", path.display());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_new_creates_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join("b");
        let connection = JsonConnection::new(&nested).unwrap();
        assert!(nested.is_dir());
        assert_eq!(connection.base_directory(), nested.as_path());
    }

    #[test]
    fn test_atomic_write_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let connection = JsonConnection::new(temp_dir.path()).unwrap();

        connection.write_atomic("data.json", "{\"a\":1}").unwrap();
        connection.write_atomic("data.json", "{\"a\":2}").unwrap();

        assert_eq!(connection.read_if_exists("data.json").unwrap().unwrap(), "{\"a\":2}");
        assert!(!temp_dir.path().join("data.tmp").exists());
    }

    #[test]
    fn test_missing_file_reads_as_none_and_removal_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let connection = JsonConnection::new(temp_dir.path()).unwrap();

        assert_eq!(connection.read_if_exists("missing.json").unwrap(), None);
        connection.remove_if_exists("missing.json").unwrap();
    }
}
