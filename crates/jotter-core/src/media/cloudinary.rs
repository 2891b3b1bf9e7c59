//! Cloudinary image host.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use super::{sign_params, ImageHost, ImageUpload, UploadedImage};
use crate::error::{Error, Result};
use crate::models::ImageServiceCredentials;
use crate::util::compact_text;

const CLOUDINARY_API_URL: &str = "https://api.cloudinary.com/v1_1";
const UPLOAD_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct CloudinaryHost {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
    #[serde(default)]
    signature: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

impl CloudinaryHost {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(UPLOAD_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            base_url: CLOUDINARY_API_URL.to_string(),
            client,
        })
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self, credentials: &ImageServiceCredentials, action: &str) -> String {
        format!(
            "{}/{}/image/{action}",
            self.base_url,
            urlencoding::encode(&credentials.cloud_name)
        )
    }
}

async fn failure(response: reqwest::Response) -> Error {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Error::Upload(format!("HTTP {status}: {}", compact_text(&body)))
}

impl ImageHost for CloudinaryHost {
    async fn upload(
        &self,
        image: &ImageUpload,
        credentials: &ImageServiceCredentials,
    ) -> Result<UploadedImage> {
        let Some(preset) = credentials.upload_preset.as_deref() else {
            return Err(Error::Upload("UPLOADPRESET is not configured".into()));
        };
        let part = Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.content_type)
            .map_err(|error| Error::Upload(error.to_string()))?;
        let form = Form::new()
            .text("upload_preset", preset.to_string())
            .part("file", part);

        let response = self
            .client
            .post(self.endpoint(credentials, "upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|error| Error::Upload(error.to_string()))?;
        if !response.status().is_success() {
            return Err(failure(response).await);
        }
        let uploaded = response
            .json::<UploadResponse>()
            .await
            .map_err(|error| Error::Upload(format!("invalid upload response: {error}")))?;

        tracing::debug!(public_id = %uploaded.public_id, "image uploaded");
        Ok(UploadedImage {
            url: uploaded.secure_url,
            width: uploaded.width,
            height: uploaded.height,
            public_id: uploaded.public_id,
            signature: uploaded.signature,
        })
    }

    async fn destroy(&self, public_id: &str, credentials: &ImageServiceCredentials) -> Result<()> {
        let (Some(api_key), Some(api_secret)) = (
            credentials.api_key.as_deref(),
            credentials.api_secret.as_deref(),
        ) else {
            return Err(Error::Upload(
                "CLOUDAPIKEY and CLOUDAPISECRET are required to delete images".into(),
            ));
        };
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign_params(
            &[("public_id", public_id), ("timestamp", timestamp.as_str())],
            api_secret,
        );

        let response = self
            .client
            .post(self.endpoint(credentials, "destroy"))
            .form(&[
                ("public_id", public_id),
                ("timestamp", timestamp.as_str()),
                ("api_key", api_key),
                ("signature", signature.as_str()),
                ("signature_algorithm", "sha256"),
            ])
            .send()
            .await
            .map_err(|error| Error::Upload(error.to_string()))?;
        if !response.status().is_success() {
            return Err(failure(response).await);
        }
        let body = response
            .json::<DestroyResponse>()
            .await
            .map_err(|error| Error::Upload(format!("invalid destroy response: {error}")))?;
        // "not found" means the image is already gone.
        match body.result.as_str() {
            "ok" | "not found" => Ok(()),
            other => Err(Error::Upload(format!("destroy returned '{other}'"))),
        }
    }
}
