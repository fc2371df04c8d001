use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use headers::{authorization::Bearer, Authorization, HeaderMapExt};

use shared_models::auth::Principal;
use shared_models::error::AppError;

use crate::jwt::validate_token;
use crate::state::AppState;

// Rejects requests without a valid bearer token and attaches the principal.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let auth = request
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or_else(|| AppError::Auth("Missing or malformed authorization header".to_string()))?;

    let principal = validate_token(auth.token(), &state.config.jwt_secret).map_err(AppError::Auth)?;

    request.extensions_mut().insert(principal);

    Ok(next.run(request).await)
}

pub fn extract_principal<B>(request: &Request<B>) -> Result<Principal, AppError> {
    request
        .extensions()
        .get::<Principal>()
        .copied()
        .ok_or_else(|| AppError::Auth("Principal not found in request extensions".to_string()))
}
