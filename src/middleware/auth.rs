use axum::{
    extract::{FromRef, FromRequestParts, OptionalFromRequestParts},
    http::{header, request::Parts},
};
use uuid::Uuid;

use crate::{error::AppError, token::JwtKeys};

/// Caller identified by a valid access token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: String,
}

pub fn ensure_role(user: &AuthUser, role: &str) -> Result<(), AppError> {
    if user.role != role {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn ensure_admin(user: &AuthUser) -> Result<(), AppError> {
    ensure_role(user, "admin")
}

fn bearer_token(parts: &Parts) -> Option<Result<&str, AppError>> {
    let value = parts.headers.get(header::AUTHORIZATION)?;
    let token = value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Invalid Authorization header".into()));
    Some(token)
}

fn authenticate(keys: &JwtKeys, token: &str) -> Result<AuthUser, AppError> {
    let claims = keys.verify_access(token).map_err(|err| {
        tracing::debug!(error = %err, "rejected access token");
        AppError::Unauthorized("Invalid or expired token".into())
    })?;
    Ok(AuthUser {
        user_id: claims.sub,
        role: claims.role,
    })
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(|| {
            AppError::Unauthorized("Authentication credentials were not provided".into())
        })??;
        authenticate(&JwtKeys::from_ref(state), token)
    }
}

/// `Option<AuthUser>`: no header means anonymous, a bad token is still rejected.
impl<S> OptionalFromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        match bearer_token(parts) {
            None => Ok(None),
            Some(token) => authenticate(&JwtKeys::from_ref(state), token?).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtConfig;
    use axum::http::Request;

    fn keys() -> JwtKeys {
        JwtKeys::from_config(&JwtConfig {
            secret: "middleware-secret".into(),
            issuer: "kainan-test".into(),
            access_ttl_minutes: 5,
            refresh_ttl_minutes: 60,
        })
    }

    fn parts(auth: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/user/");
        if let Some(value) = auth {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(()).expect("request").into_parts().0
    }

    #[tokio::test]
    async fn accepts_access_token() {
        let keys = keys();
        let user_id = Uuid::new_v4();
        let token = keys.sign_access(user_id, "admin").expect("sign");
        let mut parts = parts(Some(&format!("Bearer {token}")));
        let user = <AuthUser as FromRequestParts<JwtKeys>>::from_request_parts(&mut parts, &keys)
            .await
            .expect("authenticated");
        assert_eq!(user.user_id, user_id);
        assert!(ensure_admin(&user).is_ok());
    }

    #[tokio::test]
    async fn rejects_missing_or_refresh_token() {
        let keys = keys();
        let mut missing = parts(None);
        let err = <AuthUser as FromRequestParts<JwtKeys>>::from_request_parts(&mut missing, &keys)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));

        let refresh = keys.sign_refresh(Uuid::new_v4(), "user").expect("sign");
        let mut parts = parts(Some(&format!("Bearer {refresh}")));
        let err = <AuthUser as FromRequestParts<JwtKeys>>::from_request_parts(&mut parts, &keys)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn optional_extractor_allows_anonymous() {
        let keys = keys();
        let mut anonymous = parts(None);
        let user = <AuthUser as OptionalFromRequestParts<JwtKeys>>::from_request_parts(
            &mut anonymous,
            &keys,
        )
        .await
        .expect("anonymous ok");
        assert!(user.is_none());

        let mut garbage = parts(Some("Bearer nope"));
        assert!(
            <AuthUser as OptionalFromRequestParts<JwtKeys>>::from_request_parts(&mut garbage, &keys)
                .await
                .is_err()
        );
    }

    #[test]
    fn non_admin_is_forbidden() {
        let user = AuthUser {
            user_id: Uuid::new_v4(),
            role: "user".into(),
        };
        assert!(matches!(ensure_admin(&user), Err(AppError::Forbidden)));
    }
}
