//! services/api/src/adapters/storage.rs
//!
//! This module contains the disk-backed implementation of the `FileStorage`
//! port. Uploaded poster images land under the configured upload directory,
//! which the web server serves statically, and the returned URL is public.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use opencourse_core::ports::{FileStorage, PortError, PortResult};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A file storage adapter that writes into a local directory.
#[derive(Clone)]
pub struct DiskStorageAdapter {
    root: PathBuf,
    public_base_url: String,
}

impl DiskStorageAdapter {
    pub fn new(root: PathBuf, public_base_url: String) -> Self {
        Self {
            root,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }
}

/// The stored name is a fresh UUID plus the original extension; the client
/// filename itself never reaches the filesystem.
fn stored_file_name(original: &str) -> String {
    let extension = Path::new(original)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("bin")
        .to_lowercase();
    format!("{}.{}", Uuid::new_v4(), extension)
}

//=========================================================================================
// `FileStorage` Trait Implementation
//=========================================================================================

#[async_trait]
impl FileStorage for DiskStorageAdapter {
    async fn store(&self, file_name: &str, bytes: &[u8]) -> PortResult<String> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let name = stored_file_name(file_name);
        let path = self.root.join(&name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(format!("{}/uploads/{}", self.public_base_url, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_name_keeps_the_extension_only() {
        let name = stored_file_name("../../etc/Poster Image.PNG");
        assert!(name.ends_with(".png"));
        assert!(!name.contains('/'));
        assert!(!name.contains("Poster"));
    }

    #[test]
    fn missing_extension_falls_back_to_bin() {
        assert!(stored_file_name("poster").ends_with(".bin"));
    }

    #[tokio::test]
    async fn stores_under_root_and_returns_public_url() {
        let dir = std::env::temp_dir().join(format!("opencourse-test-{}", Uuid::new_v4()));
        let adapter = DiskStorageAdapter::new(dir.clone(), "http://localhost:3000/".to_string());

        let url = adapter.store("poster.png", b"not-really-a-png").await.unwrap();
        assert!(url.starts_with("http://localhost:3000/uploads/"));

        let name = url.rsplit('/').next().unwrap();
        let on_disk = tokio::fs::read(dir.join(name)).await.unwrap();
        assert_eq!(on_disk, b"not-really-a-png");

        tokio::fs::remove_dir_all(dir).await.ok();
    }
}
