use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::error::ValidationErrors;
use crate::rules::check;

/// A recorded upload. Bytes live in object storage; this is the metadata row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub mime_type: String,
    pub is_primary: bool,
    pub order: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Reference to an already recorded upload, as carried by `mediaData`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaRef {
    pub id: i64,
    pub url: String,
    pub name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct MediaRefForm {
    #[validate(
        required(message = "Media ID is required"),
        range(min = 1, message = "Media ID must be positive")
    )]
    id: Option<i64>,
    #[validate(required(message = "URL is required"), custom(function = "crate::rules::absolute_url"))]
    url: Option<String>,
    #[validate(
        required(message = "Name is required"),
        custom(function = "crate::rules::not_blank", message = "Name is too short")
    )]
    name: Option<String>,
}

impl MediaRefForm {
    pub(crate) fn id(&self) -> Option<i64> {
        self.id
    }
}

/// Body of `POST /media`: the metadata-confirmation step of an upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaInsert {
    pub name: String,
    pub url: String,
    pub mime_type: String,
    pub order: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct MediaInsertForm {
    #[validate(
        required(message = "Name is required"),
        custom(function = "crate::rules::not_blank", message = "Name is too short")
    )]
    name: Option<String>,
    #[validate(required(message = "URL is required"), custom(function = "crate::rules::absolute_url"))]
    url: Option<String>,
    #[validate(
        required(message = "Mime type is required"),
        custom(function = "crate::rules::not_blank", message = "Mime type is too short")
    )]
    mime_type: Option<String>,
    #[validate(
        required(message = "Order is required"),
        range(min = 0, message = "Order can't be negative")
    )]
    order: Option<i32>,
    #[validate(custom(function = "crate::rules::not_blank", message = "Alt is too short"))]
    alt: Option<String>,
}

impl MediaInsert {
    pub fn from_json(value: &Value) -> Result<Self, ValidationErrors> {
        if !value.is_object() {
            return Err(ValidationErrors::single("", "Expected an object"));
        }
        let mut errors = ValidationErrors::new();
        let insert = check::<MediaInsertForm, MediaInsert>(value, &mut errors, MediaInsertForm::validate);
        let insert = insert.map(|insert| MediaInsert {
            name: insert.name.trim().to_owned(),
            mime_type: insert.mime_type.trim().to_owned(),
            ..insert
        });
        errors.finish(insert)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaCreated {
    pub media_id: i64,
    pub url: String,
    pub name: String,
    pub mime_type: String,
}

/// Body of `POST /media/presigned-url`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignedUrlRequest {
    pub file_id: String,
    pub name: String,
    pub mime_type: String,
    pub size: i64,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct PresignedUrlForm {
    #[validate(required(message = "File ID is required"), custom(function = "crate::rules::file_id"))]
    file_id: Option<String>,
    #[validate(
        required(message = "Name is required"),
        custom(function = "crate::rules::not_blank", message = "Name is too short")
    )]
    name: Option<String>,
    #[validate(
        required(message = "Mime type is required"),
        custom(function = "crate::rules::not_blank", message = "Mime type is too short")
    )]
    mime_type: Option<String>,
    #[validate(required(message = "Size is required"), range(min = 1, message = "Size must be positive"))]
    size: Option<i64>,
}

impl PresignedUrlRequest {
    pub fn from_json(value: &Value) -> Result<Self, ValidationErrors> {
        if !value.is_object() {
            return Err(ValidationErrors::single("", "Expected an object"));
        }
        let mut errors = ValidationErrors::new();
        let request = check(value, &mut errors, PresignedUrlForm::validate);
        errors.finish(request)
    }
}

/// Upload credentials handed back to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignedUrlResponse {
    pub file_id: String,
    /// Where the client `PUT`s the bytes.
    pub url: String,
    pub name: String,
    pub mime_type: String,
    /// Where the object is readable once uploaded.
    pub access_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn media_insert_accepts_upload_confirmation() {
        let insert = MediaInsert::from_json(&json!({
            "name": "front.jpg",
            "url": "https://bucket.s3.eu-central-1.amazonaws.com/uploads/u1/front.jpg",
            "mimeType": "image/jpeg",
            "order": 0
        }))
        .unwrap();
        assert_eq!(insert.order, 0);
        assert_eq!(insert.alt, None);
    }

    #[test]
    fn media_insert_rejects_negative_order_and_relative_url() {
        let errors = MediaInsert::from_json(&json!({
            "name": "front.jpg",
            "url": "/front.jpg",
            "mimeType": "image/jpeg",
            "order": -1
        }))
        .unwrap_err();
        assert_eq!(errors.paths().collect::<Vec<_>>(), vec!["order", "url"]);
    }

    #[test]
    fn presigned_request_requires_size() {
        let errors = PresignedUrlRequest::from_json(&json!({
            "fileId": "abc",
            "name": "a.png",
            "mimeType": "image/png",
            "size": 0
        }))
        .unwrap_err();
        assert!(errors.touches("size"));
    }

    #[test]
    fn presigned_request_rejects_path_like_file_id() {
        let errors = PresignedUrlRequest::from_json(&json!({
            "fileId": "../etc",
            "name": "a.png",
            "mimeType": "image/png",
            "size": 10
        }))
        .unwrap_err();
        assert_eq!(errors.paths().collect::<Vec<_>>(), vec!["fileId"]);
    }
}
