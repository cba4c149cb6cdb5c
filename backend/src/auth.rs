use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use listing_schema::OwnerProfile;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::app::AppState;
use crate::error::ApiError;

/// Session claims issued by the authentication provider.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    #[serde(default)]
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    picture: Option<String>,
    exp: usize,
}

/// The authenticated caller, attached to the request by [`require_user`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: String,
    pub name: String,
    pub image: Option<String>,
}

impl CurrentUser {
    pub fn profile(&self) -> OwnerProfile {
        OwnerProfile {
            id: self.id.clone(),
            name: self.name.clone(),
            image: self.image.clone(),
        }
    }
}

pub fn create_token(
    user: &CurrentUser,
    jwt_secret: &str,
    ttl_secs: u64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    let claims = Claims {
        sub: user.id.clone(),
        name: user.name.clone(),
        picture: user.image.clone(),
        exp: (now + ttl_secs) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
}

pub fn validate_token(token: &str, jwt_secret: &str) -> Result<CurrentUser, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &Validation::default(),
    )?;
    let claims = token_data.claims;
    Ok(CurrentUser {
        id: claims.sub,
        name: claims.name,
        image: claims.picture,
    })
}

/// Rejects requests without a valid bearer token; otherwise makes the
/// caller available to handlers as `Extension<CurrentUser>`.
pub async fn require_user(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized)?;
    let user = validate_token(token.trim(), &state.jwt_secret).map_err(|e| {
        log::debug!("Rejected session token: {}", e);
        ApiError::Unauthorized
    })?;
    if user.id.is_empty() {
        return Err(ApiError::Unauthorized);
    }
    log::debug!("Authenticated user: {}", user.id);
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> CurrentUser {
        CurrentUser {
            id: "user-1".into(),
            name: "Mona".into(),
            image: None,
        }
    }

    #[test]
    fn token_round_trip() {
        let token = create_token(&user(), "secret", 60).unwrap();
        assert_eq!(validate_token(&token, "secret").unwrap(), user());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = create_token(&user(), "secret", 60).unwrap();
        assert!(validate_token(&token, "other").is_err());
    }
}
