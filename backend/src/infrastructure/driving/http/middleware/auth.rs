use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;

use crate::application::UserServiceError;
use crate::domain::BearerToken;

/// The caller's bearer credential, taken verbatim from the `Authorization`
/// header. It is never decoded here.
#[derive(Debug, Clone)]
pub struct CallerToken(pub BearerToken);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CallerToken
where
    S: Send + Sync,
{
    type Rejection = UserServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| UserServiceError::Forbidden("missing or malformed bearer credential"))?;

        if bearer.token().is_empty() {
            return Err(UserServiceError::Forbidden("missing or malformed bearer credential"));
        }
        Ok(Self(BearerToken::new(bearer.token())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(header: Option<&str>) -> Result<CallerToken, UserServiceError> {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header("authorization", value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        CallerToken::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_bearer_token_is_taken_verbatim() {
        let CallerToken(token) = extract(Some("Bearer abc.def.ghi")).await.unwrap();
        assert_eq!(token.expose(), "abc.def.ghi");
    }

    #[tokio::test]
    async fn test_missing_header_is_forbidden() {
        assert!(matches!(extract(None).await, Err(UserServiceError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_other_schemes_are_forbidden() {
        assert!(matches!(
            extract(Some("Basic dXNlcjpwYXNz")).await,
            Err(UserServiceError::Forbidden(_))
        ));
    }
}
