use crate::error::{ApiErrorBody, ApiErrorObject};
use crate::server::router::ForgeState;
use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use subtle::ConstantTimeEq;

fn extract_header_token(headers: &axum::http::HeaderMap) -> Option<String> {
    if let Some(k) = headers.get("x-api-key").and_then(|v| v.to_str().ok()) {
        return Some(k.to_string());
    }
    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().to_string())
}

/// Admin-only routes: `Authorization: Bearer <key>` or `x-api-key: <key>`.
#[derive(Debug, Clone, Copy)]
pub struct RequireAdminKey;

impl FromRequestParts<ForgeState> for RequireAdminKey {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ForgeState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.admin_key.as_deref() else {
            return Err(AuthError::Disabled);
        };

        match extract_header_token(&parts.headers) {
            Some(key) if bool::from(key.as_bytes().ct_eq(expected.as_bytes())) => {
                Ok(RequireAdminKey)
            }
            Some(_) => Err(AuthError::InvalidKey),
            None => Err(AuthError::MissingKey),
        }
    }
}

#[derive(Debug)]
pub enum AuthError {
    MissingKey,
    InvalidKey,
    Disabled,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingKey => (StatusCode::UNAUTHORIZED, "Missing admin key"),
            AuthError::InvalidKey => (StatusCode::UNAUTHORIZED, "Invalid admin key"),
            AuthError::Disabled => (StatusCode::NOT_FOUND, "Administrative routes are disabled"),
        };
        let body = ApiErrorBody {
            inner: ApiErrorObject {
                code: if status == StatusCode::UNAUTHORIZED {
                    "UNAUTHORIZED".to_string()
                } else {
                    "NOT_FOUND".to_string()
                },
                message: message.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}
