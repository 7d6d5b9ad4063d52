//! Image upload storage
//!
//! Persists uploaded recipe images into the upload directory. The logic works
//! against the `UploadSource` trait only, so it does not care whether the
//! bytes came from a multipart request or anywhere else.

use crate::error::AppError;
use axum::body::Bytes;
use chrono::Utc;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncRead, AsyncWriteExt};
use tracing::{info, warn};

/// An uploaded file: the name the client claimed plus its bytes
pub trait UploadSource {
    /// Reader yielding the file contents
    type Reader: AsyncRead + Unpin + Send;

    /// File name as sent by the client, unsanitized
    fn original_name(&self) -> &str;

    /// Consume the upload and return its contents as a reader
    fn into_reader(self) -> Self::Reader;
}

/// An image part received in a multipart request, fully buffered
#[derive(Debug, Clone)]
pub struct UploadedImage {
    original_name: String,
    data: Bytes,
}

impl UploadedImage {
    /// Wrap a received file part
    pub fn new(original_name: impl Into<String>, data: Bytes) -> Self {
        Self {
            original_name: original_name.into(),
            data,
        }
    }

    /// Size of the upload in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when the part carried no bytes (no file was chosen)
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl UploadSource for UploadedImage {
    type Reader = Cursor<Bytes>;

    fn original_name(&self) -> &str {
        &self.original_name
    }

    fn into_reader(self) -> Self::Reader {
        Cursor::new(self.data)
    }
}

/// Writes uploads into a single directory
#[derive(Debug, Clone)]
pub struct ImageStore {
    upload_dir: PathBuf,
}

impl ImageStore {
    /// Create a store rooted at `upload_dir` (created lazily on first upload)
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
        }
    }

    /// Directory uploads are written to
    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Reduce a client-supplied name to a safe, whitespace-free file name
    ///
    /// Directory components (either separator), `.` and `..` are dropped and
    /// only the final name is kept, so the result can never point outside the
    /// upload directory. Each run of whitespace becomes a single `_`.
    ///
    /// # Returns
    /// * `Ok(String)` - Sanitized file name
    /// * `Err(AppError::InvalidFilename)` - Nothing usable was left
    pub fn sanitize_filename(claimed: &str) -> Result<String, AppError> {
        let base = claimed
            .split(['/', '\\'])
            .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
            .last()
            .unwrap_or("");

        let mut sanitized = String::with_capacity(base.len());
        let mut in_whitespace = false;
        for c in base.chars() {
            if c.is_whitespace() {
                if !in_whitespace {
                    sanitized.push('_');
                }
                in_whitespace = true;
            } else if !c.is_control() {
                sanitized.push(c);
                in_whitespace = false;
            }
        }

        if sanitized.is_empty() {
            return Err(AppError::InvalidFilename(format!(
                "No usable file name in {:?}",
                claimed
            )));
        }
        Ok(sanitized)
    }

    /// Build the stored name: `<millis>_<sanitized name>`
    pub fn storage_filename(timestamp_millis: i64, sanitized: &str) -> String {
        format!("{}_{}", timestamp_millis, sanitized)
    }

    /// Create the upload directory and its parents if missing
    ///
    /// Safe to call repeatedly and from concurrent requests; an existing
    /// directory counts as success.
    pub async fn ensure_upload_dir(&self) -> Result<(), AppError> {
        fs::create_dir_all(&self.upload_dir).await?;
        Ok(())
    }

    /// Persist an upload and return the generated file name (not the path)
    ///
    /// Fails rather than overwriting if a file with the generated name already exists.
    pub async fn store<S: UploadSource>(&self, source: S) -> Result<String, AppError> {
        self.store_at(source, Utc::now().timestamp_millis()).await
    }

    /// [`ImageStore::store`] with an explicit timestamp prefix
    ///
    /// An existing file under the generated name yields `AppError::Upload`
    /// with `ErrorKind::AlreadyExists` and is left untouched.
    pub async fn store_at<S: UploadSource>(
        &self,
        source: S,
        timestamp_millis: i64,
    ) -> Result<String, AppError> {
        let sanitized = Self::sanitize_filename(source.original_name())?;
        let filename = Self::storage_filename(timestamp_millis, &sanitized);

        self.ensure_upload_dir().await?;
        let path = self.upload_dir.join(&filename);

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;

        let mut reader = source.into_reader();
        let written = match tokio::io::copy(&mut reader, &mut file).await {
            Ok(n) => n,
            Err(e) => {
                drop(file);
                if let Err(cleanup) = fs::remove_file(&path).await {
                    warn!("Failed to clean up partial upload {}: {}", filename, cleanup);
                }
                return Err(e.into());
            }
        };
        file.flush().await?;
        file.sync_all().await?;

        info!("Saved uploaded image: {} ({} bytes)", filename, written);
        Ok(filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// Upload backed by a static byte slice
    struct StaticUpload {
        name: &'static str,
        data: &'static [u8],
    }

    impl UploadSource for StaticUpload {
        type Reader = &'static [u8];

        fn original_name(&self) -> &str {
            self.name
        }

        fn into_reader(self) -> Self::Reader {
            self.data
        }
    }

    #[test]
    fn test_sanitize_replaces_whitespace() {
        assert_eq!(
            ImageStore::sanitize_filename("My Recipe Photo.JPG").unwrap(),
            "My_Recipe_Photo.JPG"
        );
        assert_eq!(
            ImageStore::sanitize_filename("tabs\tand  spaces.png").unwrap(),
            "tabs_and_spaces.png"
        );
    }

    #[test]
    fn test_sanitize_strips_traversal() {
        assert_eq!(
            ImageStore::sanitize_filename("../../etc/passwd").unwrap(),
            "passwd"
        );
        assert_eq!(
            ImageStore::sanitize_filename("..\\..\\windows\\evil.jpg").unwrap(),
            "evil.jpg"
        );
        assert_eq!(
            ImageStore::sanitize_filename("C:\\Users\\me\\Pictures\\cake.jpg").unwrap(),
            "cake.jpg"
        );
        assert_eq!(
            ImageStore::sanitize_filename("photos/./pie..jpg").unwrap(),
            "pie..jpg"
        );
    }

    #[test]
    fn test_sanitize_rejects_empty_result() {
        for claimed in ["", "..", "../..", "/", "./"] {
            let result = ImageStore::sanitize_filename(claimed);
            assert!(
                matches!(result, Err(AppError::InvalidFilename(_))),
                "{:?} should be rejected",
                claimed
            );
        }
    }

    #[test]
    fn test_storage_filename_format() {
        assert_eq!(
            ImageStore::storage_filename(1700000000123, "cake.jpg"),
            "1700000000123_cake.jpg"
        );
    }

    #[tokio::test]
    async fn test_store_writes_bytes_and_creates_directory() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let upload_dir = temp_dir.path().join("nested").join("uploads");
        let store = ImageStore::new(&upload_dir);

        let filename = store
            .store(StaticUpload {
                name: "My Recipe Photo.JPG",
                data: b"jpeg bytes",
            })
            .await
            .expect("Failed to store upload");

        assert!(!filename.chars().any(char::is_whitespace));
        let (prefix, rest) = filename.split_once('_').unwrap();
        assert!(prefix.parse::<i64>().is_ok(), "prefix {:?}", prefix);
        assert_eq!(rest, "My_Recipe_Photo.JPG");

        let contents = std::fs::read(upload_dir.join(&filename)).unwrap();
        assert_eq!(contents, b"jpeg bytes");
    }

    #[tokio::test]
    async fn test_store_same_name_twice_gets_distinct_files() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let store = ImageStore::new(temp_dir.path());
        let upload = || StaticUpload {
            name: "My Recipe Photo.JPG",
            data: b"x",
        };

        let first = store.store(upload()).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = store.store(upload()).await.unwrap();

        assert_ne!(first, second);
        assert!(temp_dir.path().join(&first).exists());
        assert!(temp_dir.path().join(&second).exists());
    }

    #[tokio::test]
    async fn test_store_refuses_to_overwrite_existing_file() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let store = ImageStore::new(temp_dir.path());
        let existing = temp_dir.path().join("1700000000000_pic.png");
        std::fs::write(&existing, b"original").unwrap();

        let result = store
            .store_at(
                StaticUpload {
                    name: "pic.png",
                    data: b"replacement",
                },
                1700000000000,
            )
            .await;

        match result {
            Err(AppError::Upload(e)) => assert_eq!(e.kind(), std::io::ErrorKind::AlreadyExists),
            other => panic!("expected AlreadyExists, got {:?}", other),
        }
        assert_eq!(std::fs::read(&existing).unwrap(), b"original");
    }

    #[tokio::test]
    async fn test_store_at_uses_given_timestamp() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let store = ImageStore::new(temp_dir.path());

        let filename = store
            .store_at(
                StaticUpload {
                    name: "pic.png",
                    data: b"png",
                },
                42,
            )
            .await
            .unwrap();

        assert_eq!(filename, "42_pic.png");
        assert_eq!(std::fs::read(temp_dir.path().join("42_pic.png")).unwrap(), b"png");
    }

    #[tokio::test]
    async fn test_store_never_escapes_upload_dir() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let upload_dir = temp_dir.path().join("uploads");
        let store = ImageStore::new(&upload_dir);

        let filename = store
            .store(StaticUpload {
                name: "../../outside.txt",
                data: b"x",
            })
            .await
            .unwrap();

        assert!(filename.ends_with("_outside.txt"));
        assert!(upload_dir.join(&filename).exists());
        assert!(!temp_dir.path().join("outside.txt").exists());
    }

    #[tokio::test]
    async fn test_ensure_upload_dir_is_idempotent_and_concurrent() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let store = ImageStore::new(temp_dir.path().join("a").join("b"));

        let (r1, r2, r3) = tokio::join!(
            store.ensure_upload_dir(),
            store.ensure_upload_dir(),
            store.ensure_upload_dir()
        );
        assert!(r1.is_ok() && r2.is_ok() && r3.is_ok());
        store.ensure_upload_dir().await.unwrap();
        assert!(store.upload_dir().is_dir());
    }

    #[tokio::test]
    async fn test_uploaded_image_reads_back() {
        let image = UploadedImage::new("pic.png", Bytes::from_static(b"png"));
        assert_eq!(image.len(), 3);
        assert!(!image.is_empty());
        assert_eq!(image.original_name(), "pic.png");

        let temp_dir = tempdir().expect("Failed to create temp dir");
        let store = ImageStore::new(temp_dir.path());
        let filename = store.store(image).await.unwrap();
        assert_eq!(std::fs::read(temp_dir.path().join(filename)).unwrap(), b"png");
    }
}
