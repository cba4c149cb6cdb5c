use std::time::Duration;

use async_trait::async_trait;
use listing_schema::{FieldError, MediaCreated, MediaRef, PresignedUrlResponse, PropertyInsert};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::json;

use crate::error::WizardError;
use crate::state::PropertySubmitter;

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    fields: Vec<FieldError>,
}

#[derive(Debug, Deserialize)]
struct Created {
    id: i64,
}

/// A file picked for upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_id: String,
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Talks to the listings API on behalf of one signed-in user.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self, WizardError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(ApiClient {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turns a non-2xx answer into [`WizardError::Api`].
    async fn check(response: Response) -> Result<Response, WizardError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let (message, fields) = match serde_json::from_str::<ErrorBody>(&body) {
            Ok(parsed) => (parsed.error, parsed.fields),
            Err(_) => (status.canonical_reason().unwrap_or("request failed").to_string(), Vec::new()),
        };
        Err(WizardError::Api {
            status: status.as_u16(),
            message,
            fields,
        })
    }

    /// Presigns, uploads the bytes, then records the metadata row. The
    /// reference is returned only after the row exists.
    pub async fn upload_media(&self, file: UploadFile, order: i32) -> Result<MediaRef, WizardError> {
        let response = self
            .client
            .post(self.url("/media/presigned-url"))
            .bearer_auth(&self.token)
            .json(&json!({
                "fileId": file.file_id,
                "name": file.name,
                "mimeType": file.mime_type,
                "size": file.bytes.len(),
            }))
            .send()
            .await?;
        let presigned: PresignedUrlResponse = Self::check(response).await?.json().await?;

        let response = self
            .client
            .put(&presigned.url)
            .header(reqwest::header::CONTENT_TYPE, file.mime_type.clone())
            .body(file.bytes)
            .send()
            .await?;
        Self::check(response).await?;
        log::debug!("Uploaded {} to object storage", presigned.file_id);

        let response = self
            .client
            .post(self.url("/media"))
            .bearer_auth(&self.token)
            .json(&json!({
                "name": file.name,
                "url": presigned.access_url,
                "mimeType": file.mime_type,
                "order": order,
            }))
            .send()
            .await?;
        let created: MediaCreated = Self::check(response).await?.json().await?;
        Ok(MediaRef {
            id: created.media_id,
            url: created.url,
            name: created.name,
        })
    }
}

#[async_trait]
impl PropertySubmitter for ApiClient {
    async fn create_property(&self, payload: &PropertyInsert) -> Result<i64, WizardError> {
        let response = self
            .client
            .post(self.url("/me/properties"))
            .bearer_auth(&self.token)
            .json(payload)
            .send()
            .await?;
        let created: Created = Self::check(response).await?.json().await?;
        Ok(created.id)
    }
}
