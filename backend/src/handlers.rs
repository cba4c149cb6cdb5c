use axum::{
    body::Bytes,
    extract::{Path, RawQuery, State},
    http::StatusCode,
    Extension, Json,
};
use listing_schema::{
    MediaCreated, MediaInsert, Page, PageRequest, PresignedUrlRequest, PresignedUrlResponse,
    Property, PropertyFilters, PropertyInsert, PropertySummary, QueryPairs, ValidationErrors,
};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::repository::list_properties as load_page;

fn query_pairs(raw: Option<String>) -> QueryPairs {
    QueryPairs::new(url::form_urlencoded::parse(raw.unwrap_or_default().as_bytes()).into_owned())
}

fn parse_body(body: &Bytes) -> Result<Value, ApiError> {
    serde_json::from_slice(body)
        .map_err(|_| ApiError::Validation(ValidationErrors::single("", "Request body must be valid JSON")))
}

/// Ids that do not parse can't name a listing.
fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>().map_err(|_| ApiError::NotFound)
}

/// Reads paging and filter parameters, reporting problems in both at once.
fn list_params(pairs: &QueryPairs, max_page_size: i64) -> Result<(PageRequest, PropertyFilters), ValidationErrors> {
    match (PageRequest::from_query(pairs, max_page_size), PropertyFilters::from_query(pairs)) {
        (Ok(page), Ok(filters)) => Ok((page, filters)),
        (page, filters) => {
            let mut errors = ValidationErrors::new();
            if let Err(e) = page {
                errors.errors.extend(e.errors);
            }
            if let Err(e) = filters {
                errors.errors.extend(e.errors);
            }
            Err(errors)
        }
    }
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn list_properties(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<Page<PropertySummary>>, ApiError> {
    let (page, filters) = list_params(&query_pairs(query), state.max_page_size)?;
    let repository = state.repository.clone();
    let page = tokio::task::spawn_blocking(move || load_page(repository.as_ref(), &page, filters, None)).await??;
    log::debug!("Listed {} properties", page.data.len());
    Ok(Json(page))
}

pub async fn get_property(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Property>, ApiError> {
    let id = parse_id(&id)?;
    let repository = state.repository.clone();
    let property = tokio::task::spawn_blocking(move || repository.get_by_id(id))
        .await??
        .ok_or(ApiError::NotFound)?;
    Ok(Json(property))
}

pub async fn list_my_properties(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    RawQuery(query): RawQuery,
) -> Result<Json<Page<PropertySummary>>, ApiError> {
    let page = PageRequest::from_query(&query_pairs(query), state.max_page_size)?;
    let repository = state.repository.clone();
    let page = tokio::task::spawn_blocking(move || {
        load_page(repository.as_ref(), &page, PropertyFilters::default(), Some(user.id))
    })
    .await??;
    Ok(Json(page))
}

pub async fn create_property(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let payload = PropertyInsert::from_json(&parse_body(&body)?)?;
    let repository = state.repository.clone();
    let owner = user.id.clone();
    let id = tokio::task::spawn_blocking(move || {
        repository.upsert_user(&user.profile())?;
        repository.create_property(&user.id, &payload)
    })
    .await??;
    log::info!("Property {} created by {}", id, owner);
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

pub async fn delete_property(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id)?;
    let repository = state.repository.clone();
    let owner = user.id.clone();
    let id = tokio::task::spawn_blocking(move || repository.delete_property(&user.id, id)).await??;
    log::info!("Property {} deleted by {}", id, owner);
    Ok(Json(json!({ "id": id })))
}

pub async fn create_presigned_url(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    body: Bytes,
) -> Result<Json<PresignedUrlResponse>, ApiError> {
    let request = PresignedUrlRequest::from_json(&parse_body(&body)?)?;
    let response = state.uploads.presign_upload(&user.id, &request).await?;
    Ok(Json(response))
}

pub async fn create_media(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    body: Bytes,
) -> Result<(StatusCode, Json<MediaCreated>), ApiError> {
    let payload = MediaInsert::from_json(&parse_body(&body)?)?;
    let repository = state.repository.clone();
    let (media_id, payload) = tokio::task::spawn_blocking(move || {
        repository.upsert_user(&user.profile())?;
        let media_id = repository.insert_media(&user.id, &payload)?;
        Ok::<_, crate::repository::RepositoryError>((media_id, payload))
    })
    .await??;
    log::info!("Media {} recorded", media_id);
    Ok((
        StatusCode::CREATED,
        Json(MediaCreated {
            media_id,
            url: payload.url,
            name: payload.name,
            mime_type: payload.mime_type,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bracketed_keys_accumulate() {
        let pairs = query_pairs(Some("pageSize=2&propertyTypes[]=VILLA&propertyTypes%5B%5D=LAND&city=New%20Cairo".into()));
        let (page, filters) = list_params(&pairs, 100).unwrap();
        assert_eq!(page.page_size, 2);
        assert_eq!(filters.property_types.len(), 2);
        assert_eq!(filters.city.as_deref(), Some("New Cairo"));
    }

    #[test]
    fn paging_and_filter_errors_are_reported_together() {
        let pairs = query_pairs(Some("pageSize=-1&purpose=LEASE".into()));
        let errors = list_params(&pairs, 100).unwrap_err();
        assert!(errors.touches("pageSize"));
        assert!(errors.touches("purpose"));
    }
}
