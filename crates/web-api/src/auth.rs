//! JWT 认证模块
//!
//! 提供会话令牌的签发、验证，以及从请求头中提取当前用户。

use std::sync::Arc;

use application::{Clock, SystemClock, TokenError, TokenIssuer};
use axum::{extract::FromRequestParts, http::request::Parts, http::HeaderMap};
use config::JwtConfig;
use domain::{User, UserId};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, state::AppState};

/// 登录成功后携带令牌的响应头
pub const AUTH_TOKEN_HEADER: &str = "auth-token";

/// JWT Claims 结构
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32,
    pub username: String,
    pub iat: i64,
    pub exp: i64, // 过期时间 (Unix timestamp)
}

/// JWT Token 服务
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    clock: Arc<dyn Clock>,
}

impl JwtService {
    pub fn new(config: JwtConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: JwtConfig, clock: Arc<dyn Clock>) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_ref());
        let decoding_key = DecodingKey::from_secret(config.secret.as_ref());

        Self {
            config,
            encoding_key,
            decoding_key,
            clock,
        }
    }

    /// 验证并解析 JWT token
    pub fn verify_token(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|token_data| token_data.claims)
            .map_err(|err| TokenError::Invalid(err.to_string()))
    }

    /// 从 headers 中提取和验证 token，优先 `auth-token`，其次 `Authorization: Bearer`
    pub fn extract_user_from_headers(&self, headers: &HeaderMap) -> Result<UserId, ApiError> {
        let token = match headers.get(AUTH_TOKEN_HEADER) {
            Some(value) => value
                .to_str()
                .map_err(|_| ApiError::unauthorized("Invalid auth-token header"))?,
            None => headers
                .get(axum::http::header::AUTHORIZATION)
                .and_then(|header| header.to_str().ok())
                .ok_or_else(|| ApiError::unauthorized("Missing authorization header"))?
                .strip_prefix("Bearer ")
                .ok_or_else(|| ApiError::unauthorized("Invalid authorization header format"))?,
        };

        let claims = self
            .verify_token(token)
            .map_err(|err| ApiError::unauthorized(err.to_string()))?;
        Ok(UserId::new(claims.sub))
    }
}

impl TokenIssuer for JwtService {
    fn issue_token(&self, user: &User) -> Result<String, TokenError> {
        let now = self.clock.now();
        let exp = now + chrono::Duration::hours(self.config.expiration_hours);

        let claims = Claims {
            sub: user.id.value(),
            username: user.username.as_str().to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|err| TokenError::Issue(err.to_string()))
    }
}

/// 已通过令牌认证的调用者
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser(pub UserId);

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        state
            .jwt_service
            .extract_user_from_headers(&parts.headers)
            .map(AuthenticatedUser)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use application::FixedClock;
    use axum::http::HeaderValue;
    use chrono::{TimeZone, Utc};
    use domain::{NewUser, PasswordHash, UserEmail, Username};

    fn config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-key-with-at-least-32-characters".to_string(),
            expiration_hours: 24,
        }
    }

    fn user(id: i32, username: &str) -> User {
        NewUser::new(
            Username::parse(username).unwrap(),
            UserEmail::parse(format!("{username}@example.com")).unwrap(),
            PasswordHash::new("$2b$04$hash").unwrap(),
        )
        .with_id(UserId::new(id))
    }

    #[test]
    fn token_is_deterministic_for_fixed_clock() {
        let clock = Arc::new(FixedClock(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
        let service = JwtService::with_clock(config(), clock);
        let user = user(7, "auser");

        let first = service.issue_token(&user).unwrap();
        let second = service.issue_token(&user).unwrap();
        assert_eq!(first, second);

        let other = service.issue_token(&self::user(8, "buser")).unwrap();
        assert_ne!(first, other);
    }

    #[test]
    fn issued_token_verifies_and_carries_subject() {
        let service = JwtService::new(config());
        let token = service.issue_token(&user(7, "auser")).unwrap();

        let claims = service.verify_token(&token).unwrap();
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.username, "auser");
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn expired_token_is_rejected() {
        let clock = Arc::new(FixedClock(Utc.with_ymd_and_hms(2001, 1, 1, 0, 0, 0).unwrap()));
        let service = JwtService::with_clock(config(), clock);
        let token = service.issue_token(&user(7, "auser")).unwrap();

        assert!(matches!(
            service.verify_token(&token),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = JwtService::new(config())
            .issue_token(&user(7, "auser"))
            .unwrap();
        let other = JwtService::new(JwtConfig {
            secret: "another-secret-key-with-at-least-32-characters".to_string(),
            expiration_hours: 24,
        });

        assert!(other.verify_token(&token).is_err());
    }

    #[test]
    fn extracts_user_from_either_header() {
        let service = JwtService::new(config());
        let token = service.issue_token(&user(7, "auser")).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(AUTH_TOKEN_HEADER, HeaderValue::from_str(&token).unwrap());
        assert_eq!(
            service.extract_user_from_headers(&headers).unwrap(),
            UserId::new(7)
        );

        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        assert_eq!(
            service.extract_user_from_headers(&headers).unwrap(),
            UserId::new(7)
        );

        assert!(service.extract_user_from_headers(&HeaderMap::new()).is_err());
    }
}
