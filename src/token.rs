use axum::extract::FromRef;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{config::JwtConfig, dto::auth::TokenPair, state::AppState};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,
    pub role: String,
    pub exp: usize,
    pub iat: usize,
    pub iss: String,
    /// Unique per token so a single refresh token can be revoked.
    pub jti: Uuid,
    pub kind: TokenKind,
}

impl Claims {
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp as i64, 0).unwrap_or_else(Utc::now)
    }
}

#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}

impl JwtKeys {
    pub fn from_config(config: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            issuer: config.issuer.clone(),
            access_ttl: Duration::minutes(config.access_ttl_minutes),
            refresh_ttl: Duration::minutes(config.refresh_ttl_minutes),
        }
    }

    fn sign(&self, user_id: Uuid, role: &str, kind: TokenKind) -> anyhow::Result<String> {
        let now = Utc::now();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let claims = Claims {
            sub: user_id,
            role: role.to_string(),
            iat: now.timestamp() as usize,
            exp: (now + ttl).timestamp() as usize,
            iss: self.issuer.clone(),
            jti: Uuid::new_v4(),
            kind,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        tracing::debug!(user_id = %user_id, kind = ?kind, "jwt signed");
        Ok(token)
    }

    pub fn sign_access(&self, user_id: Uuid, role: &str) -> anyhow::Result<String> {
        self.sign(user_id, role, TokenKind::Access)
    }

    pub fn sign_refresh(&self, user_id: Uuid, role: &str) -> anyhow::Result<String> {
        self.sign(user_id, role, TokenKind::Refresh)
    }

    pub fn issue_pair(&self, user_id: Uuid, role: &str) -> anyhow::Result<TokenPair> {
        Ok(TokenPair {
            access: self.sign_access(user_id, role)?,
            refresh: self.sign_refresh(user_id, role)?,
        })
    }

    /// Checks signature, expiry and issuer. Does not look at the token kind.
    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        Ok(data.claims)
    }

    pub fn verify_access(&self, token: &str) -> anyhow::Result<Claims> {
        let claims = self.verify(token)?;
        if claims.kind != TokenKind::Access {
            anyhow::bail!("not an access token");
        }
        Ok(claims)
    }

    pub fn verify_refresh(&self, token: &str) -> anyhow::Result<Claims> {
        let claims = self.verify(token)?;
        if claims.kind != TokenKind::Refresh {
            anyhow::bail!("not a refresh token");
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(secret: &str, issuer: &str) -> JwtKeys {
        JwtKeys::from_config(&JwtConfig {
            secret: secret.into(),
            issuer: issuer.into(),
            access_ttl_minutes: 5,
            refresh_ttl_minutes: 60,
        })
    }

    #[test]
    fn access_token_round_trips_claims() {
        let keys = keys("dev-secret", "kainan-test");
        let user_id = Uuid::new_v4();
        let token = keys.sign_access(user_id, "user").expect("sign");
        let claims = keys.verify_access(&token).expect("verify");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role, "user");
        assert_eq!(claims.iss, "kainan-test");
        assert_eq!(claims.kind, TokenKind::Access);
        assert!(claims.expires_at() > Utc::now());
    }

    #[test]
    fn pair_has_distinct_kinds_and_ids() {
        let keys = keys("dev-secret", "iss");
        let pair = keys.issue_pair(Uuid::new_v4(), "admin").expect("pair");
        let access = keys.verify(&pair.access).expect("access");
        let refresh = keys.verify_refresh(&pair.refresh).expect("refresh");
        assert_eq!(access.kind, TokenKind::Access);
        assert_eq!(refresh.kind, TokenKind::Refresh);
        assert_ne!(access.jti, refresh.jti);
        assert!(refresh.exp > access.exp);
    }

    #[test]
    fn kinds_are_not_interchangeable() {
        let keys = keys("dev-secret", "iss");
        let access = keys.sign_access(Uuid::new_v4(), "user").expect("sign");
        let refresh = keys.sign_refresh(Uuid::new_v4(), "user").expect("sign");
        let err = keys.verify_refresh(&access).unwrap_err();
        assert!(err.to_string().contains("not a refresh token"));
        assert!(keys.verify_access(&refresh).is_err());
    }

    #[test]
    fn rejects_foreign_secret_or_issuer() {
        let good = keys("same-secret", "good-iss");
        let token = good.sign_access(Uuid::new_v4(), "user").expect("sign");
        assert!(keys("same-secret", "other-iss").verify(&token).is_err());
        assert!(keys("other-secret", "good-iss").verify(&token).is_err());
        assert!(good.verify("not.a.jwt").is_err());
    }
}
