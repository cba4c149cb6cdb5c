use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use listing_backend::app::{router, AppState};
use listing_backend::auth::{create_token, CurrentUser};
use listing_backend::repository::InMemoryPropertyRepository;
use listing_backend::storage::{object_key, StorageError, UploadSigner};
use listing_schema::{PresignedUrlRequest, PresignedUrlResponse};
use serde_json::{json, Value};
use tower::ServiceExt;

const SECRET: &str = "test-secret";

struct FakeSigner;

#[async_trait]
impl UploadSigner for FakeSigner {
    async fn presign_upload(
        &self,
        user_id: &str,
        request: &PresignedUrlRequest,
    ) -> Result<PresignedUrlResponse, StorageError> {
        let key = object_key(user_id, &request.file_id);
        Ok(PresignedUrlResponse {
            file_id: request.file_id.clone(),
            url: format!("https://bucket.s3.test/{key}?X-Amz-Signature=abc"),
            name: request.name.clone(),
            mime_type: request.mime_type.clone(),
            access_url: format!("https://bucket.s3.test/{key}"),
        })
    }
}

fn make_app() -> Router {
    router(AppState {
        repository: Arc::new(InMemoryPropertyRepository::new()),
        uploads: Arc::new(FakeSigner),
        jwt_secret: SECRET.into(),
        max_page_size: 50,
    })
}

fn token(id: &str) -> String {
    let user = CurrentUser {
        id: id.into(),
        name: format!("User {id}"),
        image: Some(format!("https://img.example.com/{id}.png")),
    };
    create_token(&user, SECRET, 3600).unwrap()
}

async fn send(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    let body = match body {
        Some(value) => {
            builder = builder.header("Content-Type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    let res = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = res.status();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// A rental villa referencing `uploader`'s `front.jpg` upload.
fn listing(title: &str, uploader: &str, media_id: i64) -> Value {
    json!({
        "propertyType": {
            "name": "VILLA",
            "villaDetails": { "subtype": "TWIN_HOUSE", "bedrooms": 4, "bathrooms": 3, "furnished": false }
        },
        "title": title,
        "description": "Corner twin house facing the park",
        "ownerName": "Karim Nabil",
        "ownerPhone": "01012345678",
        "governorate": "GIZA",
        "city": "Sheikh Zayed",
        "area": 320,
        "amenities": ["PRIVATE_GARDEN", "SECURITY"],
        "price": 12000,
        "purpose": "RENT",
        "rentDetails": { "rentFrequency": "MONTHLY", "deposit": 24000, "insurance": 5000 },
        "mediaData": [{ "id": media_id, "url": format!("https://bucket.s3.test/uploads/{uploader}/front.jpg"), "name": "front.jpg" }]
    })
}

async fn upload(app: &Router, token: &str) -> i64 {
    let (status, presigned) = send(
        app,
        Method::POST,
        "/media/presigned-url",
        Some(token),
        Some(json!({ "fileId": "front.jpg", "name": "front.jpg", "mimeType": "image/jpeg", "size": 2048 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let access_url = presigned["accessUrl"].as_str().unwrap().to_string();

    let (status, created) = send(
        app,
        Method::POST,
        "/media",
        Some(token),
        Some(json!({ "name": "front.jpg", "url": access_url, "mimeType": "image/jpeg", "order": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["url"], json!(access_url));
    created["mediaId"].as_i64().unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let (status, body) = send(&make_app(), Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn protected_routes_require_a_session() {
    let app = make_app();
    let (status, body) = send(&app, Method::GET, "/me/properties?pageSize=5", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, _) = send(&app, Method::POST, "/media", Some("not-a-jwt"), Some(json!({}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn listing_lifecycle() {
    let app = make_app();
    let owner = token("owner");
    let media_id = upload(&app, &owner).await;

    let (status, created) = send(&app, Method::POST, "/me/properties", Some(&owner), Some(listing("Twin house", "owner", media_id))).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_i64().unwrap();

    let (status, detail) = send(&app, Method::GET, &format!("/properties/{id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["slug"], json!(format!("twin-house-{id}")));
    assert_eq!(detail["ownerPhone"], json!("+201012345678"));
    assert_eq!(detail["propertyType"]["name"], json!("VILLA"));
    assert_eq!(detail["rentDetails"]["rentFrequency"], json!("MONTHLY"));
    assert_eq!(detail["user"]["id"], json!("owner"));
    assert_eq!(detail["media"][0]["id"], json!(media_id));
    assert_eq!(detail["media"][0]["isPrimary"], json!(true));

    let (status, page) = send(&app, Method::GET, "/properties?pageSize=10&purpose=RENT&governorates[]=GIZA", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["data"].as_array().unwrap().len(), 1);
    assert_eq!(page["data"][0]["primaryMedia"]["id"], json!(media_id));
    assert_eq!(page["nextCursor"], Value::Null);

    let (_, mine) = send(&app, Method::GET, "/me/properties?pageSize=10", Some(&owner), None).await;
    assert_eq!(mine["data"].as_array().unwrap().len(), 1);
    let (_, theirs) = send(&app, Method::GET, "/me/properties?pageSize=10", Some(&token("other")), None).await;
    assert!(theirs["data"].as_array().unwrap().is_empty());

    let (status, _) = send(&app, Method::DELETE, &format!("/me/properties/{id}"), Some(&token("other")), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Method::GET, &format!("/properties/{id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, deleted) = send(&app, Method::DELETE, &format!("/me/properties/{id}"), Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted, json!({ "id": id }));
    let (status, body) = send(&app, Method::GET, &format!("/properties/{id}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn invalid_listing_reports_field_paths() {
    let app = make_app();
    let owner = token("owner");
    let media_id = upload(&app, &owner).await;
    let mut payload = listing("Twin house", "owner", media_id);
    payload["area"] = json!(5);
    payload["rentDetails"]["deposit"] = json!(-1);

    let (status, body) = send(&app, Method::POST, "/me/properties", Some(&owner), Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let paths: Vec<&str> = body["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["path"].as_str().unwrap())
        .collect();
    assert!(paths.contains(&"area"));
    assert!(paths.contains(&"rentDetails.deposit"));
}

#[tokio::test]
async fn someone_elses_media_cannot_be_attached() {
    let app = make_app();
    let media_id = upload(&app, &token("uploader")).await;

    let (status, body) = send(&app, Method::POST, "/me/properties", Some(&token("thief")), Some(listing("Twin house", "uploader", media_id))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"][0]["path"], json!("mediaData.0.id"));
}

#[tokio::test]
async fn media_reference_must_match_the_upload() {
    let app = make_app();
    let owner = token("owner");
    let media_id = upload(&app, &owner).await;
    let mut payload = listing("Twin house", "owner", media_id);
    payload["mediaData"][0]["name"] = json!("renamed.jpg");

    let (status, body) = send(&app, Method::POST, "/me/properties", Some(&owner), Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"][0]["path"], json!("mediaData.0.id"));

    let (status, _) = send(&app, Method::POST, "/me/properties", Some(&owner), Some(listing("Twin house", "owner", media_id))).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn malformed_body_is_a_validation_error() {
    let app = make_app();
    let req = Request::builder()
        .method(Method::POST)
        .uri("/me/properties")
        .header("Authorization", format!("Bearer {}", token("owner")))
        .body(Body::from("{not json"))
        .unwrap();
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn paging_walks_every_listing_once() {
    let app = make_app();
    let owner = token("owner");
    let mut ids = Vec::new();
    for n in 0..5 {
        let media_id = upload(&app, &owner).await;
        let (_, created) = send(&app, Method::POST, "/me/properties", Some(&owner), Some(listing(&format!("House {n}"), "owner", media_id))).await;
        ids.push(created["id"].as_i64().unwrap());
    }

    let mut seen = Vec::new();
    let mut uri = "/properties?pageSize=2".to_string();
    loop {
        let (status, page) = send(&app, Method::GET, &uri, None, None).await;
        assert_eq!(status, StatusCode::OK);
        let data = page["data"].as_array().unwrap();
        assert!(data.len() <= 2);
        seen.extend(data.iter().map(|p| p["id"].as_i64().unwrap()));
        match page["nextCursor"].as_str() {
            Some(cursor) => uri = format!("/properties?pageSize=2&cursor={}", url_encode(cursor)),
            None => break,
        }
    }
    assert_eq!(seen, ids);

    let (_, empty) = send(&app, Method::GET, "/properties?pageSize=0", None, None).await;
    assert_eq!(empty, json!({ "data": [], "nextCursor": null }));
}

#[tokio::test]
async fn bad_query_parameters_are_rejected() {
    let app = make_app();

    let (status, body) = send(&app, Method::GET, "/properties", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"][0]["path"], json!("pageSize"));

    let (status, _) = send(&app, Method::GET, "/properties?pageSize=500", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, Method::GET, "/properties?pageSize=2&cursor=%21%21", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Invalid cursor"));

    let (status, _) = send(&app, Method::GET, "/properties/abc", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

fn url_encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
