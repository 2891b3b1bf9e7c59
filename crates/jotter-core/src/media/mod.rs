//! Inline images: upload, reference bookkeeping, and orphan cleanup.
//!
//! Every uploaded image is recorded in the image collection so that images
//! no longer referenced by any note body can be deleted from the host later.

mod cloudinary;

use std::time::Duration;

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::models::{ImageServiceCredentials, Note};
use crate::remote::{Connector, Document, DocumentStore, RemoteConnection, IMAGES_COLLECTION};
use crate::repository::DEFAULT_REMOTE_TIMEOUT;
use crate::util::is_http_url;

pub use cloudinary::CloudinaryHost;

/// An image file to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Read an image from disk, guessing the content type from the extension.
    pub fn from_path(path: &std::path::Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("image")
            .to_string();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let content_type = match extension.as_str() {
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "webp" => "image/webp",
            "svg" => "image/svg+xml",
            _ => "application/octet-stream",
        };
        Ok(Self {
            file_name,
            content_type: content_type.to_string(),
            bytes,
        })
    }
}

/// Host response for a stored image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub public_id: String,
    pub signature: String,
}

#[allow(async_fn_in_trait)]
pub trait ImageHost {
    async fn upload(
        &self,
        image: &ImageUpload,
        credentials: &ImageServiceCredentials,
    ) -> Result<UploadedImage>;

    /// Signed deletion of a stored image.
    async fn destroy(&self, public_id: &str, credentials: &ImageServiceCredentials) -> Result<()>;
}

/// Signature over request parameters: pairs sorted by key, joined as
/// `k=v&k=v`, the secret appended, SHA-256, lowercase hex.
///
/// ```
/// use jotter_core::media::sign_params;
///
/// let signature = sign_params(&[("timestamp", "1315060510"), ("public_id", "sample")], "abcd");
/// assert_eq!(signature.len(), 64);
/// ```
pub fn sign_params(params: &[(&str, &str)], secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let canonical = sorted
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Placeholder inserted into the note body when an upload fails.
pub fn upload_failed_placeholder(error: &Error) -> String {
    match error {
        Error::Upload(_) => format!("[{error}]"),
        other => format!("[{}]", Error::Upload(other.to_string())),
    }
}

pub struct ImageLibrary<H, C: Connector> {
    host: H,
    connection: RemoteConnection<C>,
    collection: String,
    timeout: Duration,
}

impl<H: ImageHost, C: Connector> ImageLibrary<H, C> {
    pub fn new(host: H, connection: RemoteConnection<C>) -> Self {
        Self {
            host,
            connection,
            collection: IMAGES_COLLECTION.to_string(),
            timeout: DEFAULT_REMOTE_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Upload `image` and return markup for the note body.
    ///
    /// Never fails: an upload error becomes the inline placeholder text.
    pub async fn upload_inline(
        &self,
        image: &ImageUpload,
        credentials: Option<&ImageServiceCredentials>,
    ) -> String {
        let Some(credentials) = credentials else {
            return upload_failed_placeholder(&Error::Upload(
                "image service is not configured".into(),
            ));
        };

        let uploaded = match self.host.upload(image, credentials).await {
            Ok(uploaded) if is_http_url(&uploaded.url) => uploaded,
            Ok(uploaded) => {
                return upload_failed_placeholder(&Error::Upload(format!(
                    "host returned an unusable URL '{}'",
                    uploaded.url
                )));
            }
            Err(error) => {
                tracing::warn!(file = %image.file_name, "Image upload failed: {error}");
                return upload_failed_placeholder(&error);
            }
        };

        if let Err(error) = self.record(&uploaded).await {
            tracing::warn!(url = %uploaded.url, "Failed to record uploaded image: {error}");
        }
        format!(
            r#"<img src="{}" width="{}" height="{}" alt="{}">"#,
            uploaded.url,
            uploaded.width,
            uploaded.height,
            image.file_name.replace('"', "")
        )
    }

    async fn record(&self, uploaded: &UploadedImage) -> Result<()> {
        let mut record = Document::new();
        record.insert("url".into(), Value::String(uploaded.url.clone()));
        record.insert("signature".into(), Value::String(uploaded.signature.clone()));
        record.insert("publicId".into(), Value::String(uploaded.public_id.clone()));

        let session = self.connection.session().await?;
        let add = session.store().add_document(&self.collection, record);
        tokio::time::timeout(self.timeout, add)
            .await
            .map_err(|_| Error::RemoteWrite("image record timed out".into()))??;
        Ok(())
    }

    /// Delete every recorded image that no note body references.
    ///
    /// `notes` must be the complete remote list. Returns how many images
    /// were removed; failures on individual images are logged and skipped.
    pub async fn prune_orphans(
        &self,
        notes: &[Note],
        credentials: &ImageServiceCredentials,
    ) -> Result<usize> {
        let session = self.connection.session().await?;
        let store = session.store();
        let images = tokio::time::timeout(self.timeout, store.get_all_documents(&self.collection))
            .await
            .map_err(|_| Error::RemoteRead("image list timed out".into()))??;

        let mut removed = 0;
        for (id, record) in images {
            let Some(url) = record.get("url").and_then(Value::as_str) else {
                continue;
            };
            if notes.iter().any(|note| note.body.contains(url)) {
                continue;
            }

            if let Some(public_id) = record.get("publicId").and_then(Value::as_str) {
                if let Err(error) = self.host.destroy(public_id, credentials).await {
                    tracing::warn!(url, "Failed to delete orphaned image: {error}");
                    continue;
                }
            }
            match store.delete_document(&self.collection, &id).await {
                Ok(()) => removed += 1,
                Err(error) => tracing::warn!(url, "Failed to forget orphaned image: {error}"),
            }
        }
        tracing::info!(removed, "orphaned images pruned");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::models::{Delimiter, EnvironmentProfile};
    use crate::remote::memory::{MemoryCloud, MemoryConnector};

    #[derive(Default)]
    struct FakeHost {
        fail: bool,
        destroyed: Mutex<Vec<String>>,
    }

    impl ImageHost for FakeHost {
        async fn upload(
            &self,
            image: &ImageUpload,
            _: &ImageServiceCredentials,
        ) -> Result<UploadedImage> {
            if self.fail {
                return Err(Error::Upload("quota exceeded".into()));
            }
            Ok(UploadedImage {
                url: format!("https://img.test/{}", image.file_name),
                width: 640,
                height: 480,
                public_id: image.file_name.clone(),
                signature: "sig".into(),
            })
        }

        async fn destroy(&self, public_id: &str, _: &ImageServiceCredentials) -> Result<()> {
            self.destroyed.lock().unwrap().push(public_id.to_string());
            Ok(())
        }
    }

    fn credentials() -> ImageServiceCredentials {
        EnvironmentProfile::parse(
            "CLOUDNAME: demo, UPLOADPRESET: preset, CLOUDAPIKEY: k, CLOUDAPISECRET: s",
            Delimiter::Comma,
        )
        .image_service()
        .unwrap()
    }

    fn image(name: &str) -> ImageUpload {
        ImageUpload {
            file_name: name.into(),
            content_type: "image/png".into(),
            bytes: vec![0x89, b'P', b'N', b'G'],
        }
    }

    async fn library(cloud: &MemoryCloud, host: FakeHost) -> ImageLibrary<FakeHost, MemoryConnector> {
        let connection = RemoteConnection::new(MemoryConnector::new(cloud.clone()));
        connection
            .open(&EnvironmentProfile::parse(
                "APIKEY: key, AUTHDOMAIN: d, PROJECTID: proj, STORAGEBUCKET: b, \
                 MESSAGINGSENDERID: 1, APPID: app",
                Delimiter::Comma,
            ))
            .await
            .unwrap();
        ImageLibrary::new(host, connection)
    }

    #[test]
    fn signature_is_order_independent_sha256_hex() {
        let expected = "0d4fe14b2b4a3f68a97ccc5097c43908b623d24293c296826a9390c14d891509";
        assert_eq!(
            sign_params(&[("public_id", "sample"), ("timestamp", "1315060510")], "abcd"),
            expected
        );
        assert_eq!(
            sign_params(&[("timestamp", "1315060510"), ("public_id", "sample")], "abcd"),
            expected
        );
    }

    #[tokio::test]
    async fn successful_upload_is_recorded_and_inlined() {
        let cloud = MemoryCloud::new();
        let library = library(&cloud, FakeHost::default()).await;

        let markup = library.upload_inline(&image("cat.png"), Some(&credentials())).await;

        assert_eq!(
            markup,
            r#"<img src="https://img.test/cat.png" width="640" height="480" alt="cat.png">"#
        );
        let records = cloud.documents("proj", "Images");
        let record = records.values().next().unwrap();
        assert_eq!(record["url"], "https://img.test/cat.png");
        assert_eq!(record["signature"], "sig");
    }

    #[tokio::test]
    async fn failed_upload_becomes_placeholder() {
        let cloud = MemoryCloud::new();
        let library = library(&cloud, FakeHost { fail: true, ..FakeHost::default() }).await;

        let markup = library.upload_inline(&image("cat.png"), Some(&credentials())).await;
        assert_eq!(markup, "[Image upload failed: quota exceeded]");

        let markup = library.upload_inline(&image("cat.png"), None).await;
        assert_eq!(markup, "[Image upload failed: image service is not configured]");
        assert!(cloud.documents("proj", "Images").is_empty());
    }

    #[tokio::test]
    async fn prune_removes_only_unreferenced_images() {
        let cloud = MemoryCloud::new();
        let library = library(&cloud, FakeHost::default()).await;
        let kept = library.upload_inline(&image("kept.png"), Some(&credentials())).await;
        library.upload_inline(&image("gone.png"), Some(&credentials())).await;

        let notes = vec![Note::new("t", format!("<p>{kept}</p>"))];
        let removed = library.prune_orphans(&notes, &credentials()).await.unwrap();

        assert_eq!(removed, 1);
        assert_eq!(*library.host.destroyed.lock().unwrap(), vec!["gone.png"]);
        let remaining = cloud.documents("proj", "Images");
        assert_eq!(remaining.len(), 1);
        assert_eq!(
            remaining.values().next().unwrap()["url"],
            "https://img.test/kept.png"
        );
    }
}
