//! Bearer-token authorization applied in front of every gateway route.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use tollgate_shared::middleware::extract_bearer_token;
use tollgate_shared::token::{self, TokenSecret};
use tollgate_shared::{strip_identity_headers, AppError, AuthenticatedIdentity, ErrorCode};

use crate::AppState;

pub const INVALID_TOKEN_MESSAGE: &str = "Invalid or expired token";

/// A path that skips authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicPath {
    Exact(&'static str),
    /// Matches the prefix itself and anything below it (`/docs`, `/docs/...`).
    Prefix(&'static str),
}

impl PublicPath {
    pub fn matches(&self, path: &str) -> bool {
        match *self {
            PublicPath::Exact(p) => path == p,
            PublicPath::Prefix(p) => path
                .strip_prefix(p)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/')),
        }
    }
}

pub const DEFAULT_PUBLIC_PATHS: &[PublicPath] = &[
    PublicPath::Exact("/health"),
    PublicPath::Exact("/status"),
    PublicPath::Exact("/"),
    PublicPath::Exact("/api/auth/register"),
    PublicPath::Exact("/api/auth/login"),
    PublicPath::Exact("/api/auth/refresh"),
];

pub fn is_public(path: &str, rules: &[PublicPath]) -> bool {
    rules.iter().any(|rule| rule.matches(path))
}

/// Resolve the caller from an `Authorization: Bearer` header.
///
/// 401 when no bearer token is present, 403 for any token that fails
/// verification. The reason for a 403 is only logged.
pub fn authorize(headers: &HeaderMap, secret: &TokenSecret) -> Result<AuthenticatedIdentity, AppError> {
    let token = extract_bearer_token(headers)?;
    token::verify(token, secret)
        .map(AuthenticatedIdentity::from)
        .map_err(|e| {
            tracing::debug!(error = %e, "bearer token rejected");
            AppError::new(ErrorCode::TokenInvalid, INVALID_TOKEN_MESSAGE)
        })
}

/// Middleware: drop client-supplied identity headers, then either let a
/// public path through or attach the verified identity to the request.
pub async fn gateway_auth(State(state): State<Arc<AppState>>, mut req: Request, next: Next) -> Response {
    strip_identity_headers(req.headers_mut());

    if is_public(req.uri().path(), &state.public_paths) {
        return next.run(req).await;
    }

    let identity = match authorize(req.headers(), &state.access_secret) {
        Ok(identity) => identity,
        Err(err) => return err.into_response(),
    };

    identity.write_headers(req.headers_mut());
    req.extensions_mut().insert(identity);
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::AUTHORIZATION;
    use axum::http::{HeaderValue, StatusCode};
    use tollgate_shared::TokenSubject;
    use uuid::Uuid;

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {token}")).unwrap());
        headers
    }

    #[test]
    fn default_rules() {
        assert!(is_public("/", DEFAULT_PUBLIC_PATHS));
        assert!(is_public("/health", DEFAULT_PUBLIC_PATHS));
        assert!(is_public("/api/auth/login", DEFAULT_PUBLIC_PATHS));
        assert!(!is_public("/api/auth/logout", DEFAULT_PUBLIC_PATHS));
        assert!(!is_public("/api/auth/login/extra", DEFAULT_PUBLIC_PATHS));
        assert!(!is_public("/metrics", DEFAULT_PUBLIC_PATHS));
        assert!(!is_public("/api/notes", DEFAULT_PUBLIC_PATHS));
    }

    #[test]
    fn prefix_rule_respects_segments() {
        let rule = PublicPath::Prefix("/docs");
        assert!(rule.matches("/docs"));
        assert!(rule.matches("/docs/openapi.json"));
        assert!(!rule.matches("/docsearch"));
    }

    #[test]
    fn authorize_maps_failures() {
        let secret = TokenSecret::new("gateway-secret").unwrap();

        let missing = authorize(&HeaderMap::new(), &secret).unwrap_err();
        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

        let mut basic = HeaderMap::new();
        basic.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert_eq!(authorize(&basic, &secret).unwrap_err().status(), StatusCode::UNAUTHORIZED);

        let forged = authorize(&bearer("a.b.c"), &secret).unwrap_err();
        assert_eq!(forged.status(), StatusCode::FORBIDDEN);
        assert_eq!(forged.to_string(), INVALID_TOKEN_MESSAGE);

        let other = TokenSecret::new("someone-elses-secret").unwrap();
        let subject = TokenSubject { user_id: Uuid::now_v7(), email: "a@example.com".into() };
        let foreign = token::sign(&subject, &other, 60).unwrap();
        assert_eq!(authorize(&bearer(&foreign), &secret).unwrap_err().status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn authorize_yields_token_subject() {
        let secret = TokenSecret::new("gateway-secret").unwrap();
        let subject = TokenSubject { user_id: Uuid::now_v7(), email: "alice@example.com".into() };
        let token = token::sign(&subject, &secret, 60).unwrap();

        let identity = authorize(&bearer(&token), &secret).unwrap();
        assert_eq!(identity.user_id, subject.user_id);
        assert_eq!(identity.email, "alice@example.com");
    }
}
