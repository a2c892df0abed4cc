//! Local filesystem storage for uploaded files.

use std::path::PathBuf;

use rand::RngCore;

use crate::{AppError, AppResult};

/// Local filesystem storage rooted at a single directory.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    /// Create a new local storage backend.
    #[must_use]
    pub const fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Write `data` under `key`, creating the directory if needed.
    pub async fn upload(&self, key: &str, data: &[u8]) -> AppResult<PathBuf> {
        let path = self.path_for(key)?;

        tokio::fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| AppError::DependencyFailure(format!("Failed to create directory: {e}")))?;

        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::DependencyFailure(format!("Failed to write file: {e}")))?;

        tracing::debug!(key = %key, size = data.len(), "Stored file");
        Ok(path)
    }

    /// Delete the file stored under `key`, if any.
    pub async fn delete(&self, key: &str) -> AppResult<()> {
        let path = self.path_for(key)?;
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tokio::fs::remove_file(&path)
                .await
                .map_err(|e| AppError::DependencyFailure(format!("Failed to delete file: {e}")))?;
        }
        Ok(())
    }

    /// Check if a file exists.
    pub async fn exists(&self, key: &str) -> AppResult<bool> {
        let path = self.path_for(key)?;
        Ok(tokio::fs::try_exists(&path).await.unwrap_or(false))
    }

    fn path_for(&self, key: &str) -> AppResult<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(AppError::Validation(format!("Invalid storage key: {key}")));
        }
        Ok(self.base_path.join(key))
    }
}

/// Generate a random file name that keeps the upload's extension.
///
/// The stem is 16 lowercase hex characters; the extension is lowercased.
#[must_use]
pub fn generate_storage_key(original_name: &str) -> String {
    let mut bytes = [0u8; 8];
    rand::thread_rng().fill_bytes(&mut bytes);

    let extension = original_name
        .rfind('.')
        .filter(|&pos| pos > 0 && pos < original_name.len() - 1)
        .map(|pos| original_name[pos + 1..].to_ascii_lowercase())
        .filter(|ext| ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| "bin".to_string());

    format!("{}.{extension}", hex::encode(bytes))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_storage_key() {
        let key = generate_storage_key("Photo.JPG");
        let (stem, ext) = key.split_once('.').unwrap();
        assert_eq!(stem.len(), 16);
        assert!(stem.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(ext, "jpg");
    }

    #[test]
    fn test_generate_storage_key_no_extension() {
        let key = generate_storage_key("file");
        assert!(key.ends_with(".bin"));
    }

    #[test]
    fn test_keys_are_random() {
        assert_ne!(generate_storage_key("a.png"), generate_storage_key("a.png"));
    }

    #[tokio::test]
    async fn test_upload_and_delete() {
        let dir = std::env::temp_dir().join(format!("inkwell-storage-{}", generate_storage_key("x")));
        let storage = LocalStorage::new(dir.clone());

        storage.upload("pic.png", b"data").await.unwrap();
        assert!(storage.exists("pic.png").await.unwrap());

        storage.delete("pic.png").await.unwrap();
        assert!(!storage.exists("pic.png").await.unwrap());

        tokio::fs::remove_dir_all(dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_path_traversal() {
        let storage = LocalStorage::new(std::env::temp_dir());
        assert!(storage.upload("../etc/passwd", b"x").await.is_err());
        assert!(storage.upload(".hidden", b"x").await.is_err());
    }
}
