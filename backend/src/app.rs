use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

use crate::auth::require_user;
use crate::handlers;
use crate::repository::PropertyRepository;
use crate::storage::UploadSigner;

#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn PropertyRepository>,
    pub uploads: Arc<dyn UploadSigner>,
    pub jwt_secret: String,
    pub max_page_size: i64,
}

pub fn router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route(
            "/me/properties",
            get(handlers::list_my_properties).post(handlers::create_property),
        )
        .route("/me/properties/:id", delete(handlers::delete_property))
        .route("/media/presigned-url", post(handlers::create_presigned_url))
        .route("/media", post(handlers::create_media))
        .layer(middleware::from_fn_with_state(state.clone(), require_user));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/properties", get(handlers::list_properties))
        .route("/properties/:id", get(handlers::get_property))
        .merge(protected_routes)
        .with_state(state)
}
