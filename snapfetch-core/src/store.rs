use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::PersistError;

/// File name used when the caller does not pick one.
pub const DEFAULT_FILE_NAME: &str = "downloaded_image.png";

/// Destination for the persisted PNG copy: one file, overwritten per fetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PngFileStore {
    dir: PathBuf,
    file_name: String,
}

impl PngFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            file_name: DEFAULT_FILE_NAME.to_string(),
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }

    pub async fn ensure_dir(&self) -> Result<(), PersistError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| PersistError::Io {
                path: self.dir.clone(),
                source,
            })
    }

    pub async fn exists(&self) -> bool {
        tokio::fs::try_exists(self.path()).await.unwrap_or(false)
    }

    /// Replace the target with `bytes` via tmp + rename.
    ///
    /// Readers and concurrent writers only ever observe a complete file; the
    /// last rename wins.
    pub async fn write(&self, bytes: &[u8]) -> Result<PathBuf, PersistError> {
        self.ensure_dir().await?;
        let path = self.path();

        let tmp = self.dir.join(format!(
            ".{}.tmp-{}",
            self.file_name,
            Uuid::new_v4().simple()
        ));

        if let Err(err) = write_tmp(&tmp, bytes).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(err);
        }

        if let Err(source) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(PersistError::Io { path, source });
        }

        Ok(path)
    }
}

async fn write_tmp(tmp: &Path, bytes: &[u8]) -> Result<(), PersistError> {
    let io_err = |source| PersistError::Io {
        path: tmp.to_path_buf(),
        source,
    };

    let mut file = tokio::fs::File::create(tmp).await.map_err(io_err)?;
    file.write_all(bytes).await.map_err(io_err)?;
    file.flush().await.map_err(io_err)?;
    file.sync_all().await.map_err(io_err)?;
    Ok(())
}
