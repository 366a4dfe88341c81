//! # Picture Store
//!
//! Profile pictures are plain files in the guardian's `pictures/` directory,
//! named after the child and the image type, e.g. `child_1737300000000_9b0e1f2a.png`.
//! The file name doubles as the reference stored on the child. Writes go
//! through a `WriteBatch` so they land together with the child record.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use log::debug;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use super::connection::CsvConnection;
use super::write_batch::WriteBatch;
use crate::storage::traits::{Picture, PictureStorage};

/// Accepted image types and the extension each is stored under
const PICTURE_TYPES: &[(&str, &str)] = &[
    ("image/png", "png"),
    ("image/jpeg", "jpg"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
];

pub fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
    let essence = content_type.split(';').next().unwrap_or_default().trim().to_lowercase();
    PICTURE_TYPES
        .iter()
        .find(|(mime, _)| *mime == essence)
        .map(|(_, ext)| *ext)
}

fn content_type_for_extension(extension: &str) -> Option<&'static str> {
    PICTURE_TYPES
        .iter()
        .find(|(_, ext)| *ext == extension)
        .map(|(mime, _)| *mime)
}

#[derive(Clone)]
pub struct PictureStore {
    connection: CsvConnection,
}

impl PictureStore {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    /// Resolve a reference to a path inside the pictures directory.
    /// References that could escape the directory are rejected.
    fn resolve(&self, guardian_id: &str, reference: &str) -> Result<(PathBuf, &'static str)> {
        let Some((stem, extension)) = reference.rsplit_once('.') else {
            bail!("Invalid picture reference: {}", reference);
        };
        if stem.is_empty() || CsvConnection::safe_directory_name(stem) != stem {
            bail!("Invalid picture reference: {}", reference);
        }
        let Some(content_type) = content_type_for_extension(extension) else {
            bail!("Unsupported picture type in reference: {}", reference);
        };

        Ok((self.connection.pictures_directory(guardian_id).join(reference), content_type))
    }
}

impl PictureStore {
    /// Stage a child's picture in `batch` and return its reference. The file
    /// only replaces an existing one when the batch commits.
    pub(crate) fn stage_picture(
        &self,
        batch: &mut WriteBatch,
        guardian_id: &str,
        child_id: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<String> {
        let Some(extension) = extension_for_content_type(content_type) else {
            bail!("Unsupported picture type: {}", content_type);
        };

        let reference = format!("{}.{}", CsvConnection::safe_directory_name(child_id), extension);
        let path = self.connection.pictures_directory(guardian_id).join(&reference);
        batch.put(path, bytes.to_vec());

        debug!("Staged picture {} ({} bytes)", reference, bytes.len());
        Ok(reference)
    }

    pub(crate) fn stage_delete_picture(&self, batch: &mut WriteBatch, guardian_id: &str, reference: &str) -> Result<()> {
        let (path, _) = self.resolve(guardian_id, reference)?;
        batch.delete(path);
        Ok(())
    }
}

#[async_trait]
impl PictureStorage for PictureStore {
    async fn get_picture(&self, guardian_id: &str, reference: &str) -> Result<Option<Picture>> {
        let (path, content_type) = self.resolve(guardian_id, reference)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(Picture {
                content_type: content_type.to_string(),
                bytes,
            })),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::csv::test_utils::{TestEnvironment, GUARDIAN_ID};

    #[test]
    fn test_extension_for_content_type() {
        assert_eq!(extension_for_content_type("image/png"), Some("png"));
        assert_eq!(extension_for_content_type("IMAGE/JPEG; charset=binary"), Some("jpg"));
        assert_eq!(extension_for_content_type("text/plain"), None);
    }

    #[tokio::test]
    async fn test_staged_picture_lands_on_commit() {
        let env = TestEnvironment::new().unwrap();
        let store = PictureStore::new(env.connection.clone());

        let mut batch = WriteBatch::new();
        let reference = store
            .stage_picture(&mut batch, GUARDIAN_ID, "child::1::a", "image/png", &[0x89, 0x50, 0x4e, 0x47])
            .unwrap();
        assert_eq!(reference, "child_1_a.png");
        assert!(store.get_picture(GUARDIAN_ID, &reference).await.unwrap().is_none());
        batch.commit().unwrap();

        let picture = store.get_picture(GUARDIAN_ID, &reference).await.unwrap().unwrap();
        assert_eq!(picture.content_type, "image/png");
        assert_eq!(picture.bytes, vec![0x89, 0x50, 0x4e, 0x47]);

        let mut batch = WriteBatch::new();
        store.stage_delete_picture(&mut batch, GUARDIAN_ID, &reference).unwrap();
        batch.commit().unwrap();
        assert!(store.get_picture(GUARDIAN_ID, &reference).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_dropped_batch_keeps_previous_picture() {
        let env = TestEnvironment::new().unwrap();
        let store = PictureStore::new(env.connection.clone());

        let mut batch = WriteBatch::new();
        let reference = store.stage_picture(&mut batch, GUARDIAN_ID, "child::1::a", "image/png", b"old").unwrap();
        batch.commit().unwrap();

        let mut batch = WriteBatch::new();
        store.stage_picture(&mut batch, GUARDIAN_ID, "child::1::a", "image/png", b"new").unwrap();
        drop(batch);

        let picture = store.get_picture(GUARDIAN_ID, &reference).await.unwrap().unwrap();
        assert_eq!(picture.bytes, b"old".to_vec());
    }

    #[test]
    fn test_new_type_gets_new_reference() {
        let env = TestEnvironment::new().unwrap();
        let store = PictureStore::new(env.connection.clone());
        let mut batch = WriteBatch::new();

        let png = store.stage_picture(&mut batch, GUARDIAN_ID, "child::1::a", "image/png", b"a").unwrap();
        let gif = store.stage_picture(&mut batch, GUARDIAN_ID, "child::1::a", "image/gif", b"b").unwrap();
        assert_ne!(png, gif);
        assert!(store
            .stage_picture(&mut batch, GUARDIAN_ID, "child::1::a", "text/html", b"c")
            .is_err());
    }

    #[tokio::test]
    async fn test_rejects_references_outside_store() {
        let env = TestEnvironment::new().unwrap();
        let store = PictureStore::new(env.connection.clone());
        let mut batch = WriteBatch::new();

        assert!(store.get_picture(GUARDIAN_ID, "../guardians.png").await.is_err());
        assert!(store.get_picture(GUARDIAN_ID, "child_1_a.exe").await.is_err());
        assert!(store.stage_delete_picture(&mut batch, GUARDIAN_ID, "noextension").is_err());
        assert!(batch.is_empty());
    }
}
