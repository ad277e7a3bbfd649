use axum::{
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::response::ApiError;
use crate::state::AppState;

/// Claims of a Supabase-issued access token. `sub` is the user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: Uuid,
    pub email: Option<String>,
    pub exp: i64,
}

/// Authenticated caller, injected into request extensions for handlers.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|auth_header| auth_header.to_str().ok())
        .and_then(|auth_value| auth_value.strip_prefix("Bearer "))
        .map(str::to_owned);

    let Some(token) = token else {
        return Err(ApiError(
            "Unauthorized: Missing or invalid token".to_string(),
            StatusCode::UNAUTHORIZED,
        ));
    };

    let Some(secret) = &state.config.supabase_jwt_secret else {
        return Err(ApiError(
            "Auth is not configured on this deployment".to_string(),
            StatusCode::SERVICE_UNAVAILABLE,
        ));
    };

    let claims = decode::<TokenClaims>(
        &token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| {
        ApiError(
            "Unauthorized: Invalid token".to_string(),
            StatusCode::UNAUTHORIZED,
        )
    })?
    .claims;

    req.extensions_mut().insert(AuthUser {
        id: claims.sub,
        email: claims.email,
    });

    Ok(next.run(req).await)
}
