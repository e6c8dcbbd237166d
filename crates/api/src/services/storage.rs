//! Local file storage for uploaded pictures.

use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::debug;

use crate::config::StorageConfig;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid storage path: {0}")]
    InvalidPath(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
    public_url_prefix: String,
}

impl FileStorage {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            root: PathBuf::from(&config.upload_dir),
            public_url_prefix: config.public_url_prefix.trim_end_matches('/').to_string(),
        }
    }

    /// Resolves a relative storage path, refusing anything that could
    /// escape the upload directory.
    fn resolve(&self, relative: &str) -> Result<PathBuf, StorageError> {
        let path = Path::new(relative);
        let is_plain = !relative.is_empty()
            && path
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !is_plain {
            return Err(StorageError::InvalidPath(relative.to_string()));
        }
        Ok(self.root.join(path))
    }

    /// Public URL a stored file is served under.
    pub fn url_for(&self, relative: &str) -> String {
        format!("{}/{}", self.public_url_prefix, relative)
    }

    /// Storage path of a public URL produced by [`FileStorage::url_for`].
    pub fn path_for_url<'a>(&self, url: &'a str) -> Option<&'a str> {
        url.strip_prefix(&self.public_url_prefix)?.strip_prefix('/')
    }

    /// Writes `bytes` to `relative`, replacing any existing file. Returns the
    /// public URL.
    pub async fn save(&self, relative: &str, bytes: &[u8]) -> Result<String, StorageError> {
        let target = self.resolve(relative)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&target, bytes).await?;
        debug!(path = %target.display(), size = bytes.len(), "File stored");
        Ok(self.url_for(relative))
    }

    /// Removes `relative`. A missing file is not an error.
    pub async fn delete(&self, relative: &str) -> Result<(), StorageError> {
        let target = self.resolve(relative)?;
        match fs::remove_file(&target).await {
            Ok(()) => {
                debug!(path = %target.display(), "File deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// File extension for an uploaded file, preferring the MIME type over the
/// submitted file name.
pub fn extension_for(content_type: &str, file_name: Option<&str>) -> String {
    if let Some(exts) = mime_guess::get_mime_extensions_str(content_type) {
        if let Some(ext) = exts.iter().find(|e| **e == "jpg").or_else(|| exts.first()) {
            return ext.to_string();
        }
    }
    file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage(root: &Path) -> FileStorage {
        FileStorage::new(&StorageConfig {
            upload_dir: root.display().to_string(),
            public_url_prefix: "/uploads/".to_string(),
        })
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let storage = storage(Path::new("/tmp/uploads"));
        assert!(storage.resolve("../etc/passwd").is_err());
        assert!(storage.resolve("/etc/passwd").is_err());
        assert!(storage.resolve("").is_err());
        assert!(storage.resolve("userGroup/a.png").is_ok());
    }

    #[test]
    fn test_url_round_trip() {
        let storage = storage(Path::new("/tmp/uploads"));
        let url = storage.url_for("userGroup/a.png");
        assert_eq!(url, "/uploads/userGroup/a.png");
        assert_eq!(storage.path_for_url(&url), Some("userGroup/a.png"));
        assert_eq!(storage.path_for_url("https://cdn.example.com/a.png"), None);
    }

    #[test]
    fn test_extension_for() {
        assert_eq!(extension_for("image/png", Some("avatar.jpeg")), "png");
        assert_eq!(extension_for("application/x-unknown-kind", Some("a.GIF")), "gif");
        assert_eq!(extension_for("application/x-unknown-kind", None), "");
    }

    #[tokio::test]
    async fn test_save_and_delete() {
        let root = std::env::temp_dir().join(format!("wiki-storage-{}", uuid::Uuid::new_v4()));
        let storage = storage(&root);

        let url = storage.save("userGroup/x.png", b"png-bytes").await.unwrap();
        assert_eq!(url, "/uploads/userGroup/x.png");
        assert!(root.join("userGroup/x.png").exists());

        storage.delete("userGroup/x.png").await.unwrap();
        assert!(!root.join("userGroup/x.png").exists());
        // deleting twice is fine
        storage.delete("userGroup/x.png").await.unwrap();

        let _ = std::fs::remove_dir_all(&root);
    }
}
