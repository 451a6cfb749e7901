use axum::Extension;
use bcrypt::{hash, verify, HashParts};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use sea_orm::DatabaseConnection;
use std::str::FromStr;
use tracing::{info, warn};

use crate::db::entities::user;
use crate::db::services::user_service;
use crate::server::config::ServerConfig;
use crate::web::error::AppError;
use crate::web::models::user_models::UserOut;
use crate::web::models::{
    Claims, CurrentUser, LoginForm, PASSWORD_MAX_BYTES, TokenPair, TokenType, UserRegisterIn,
    normalize_email,
};

const DUPLICATE_USER: &str = "User with this email or tg_id already exists";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    Expired,
    Invalid,
    WrongType,
}

impl TokenError {
    pub fn message(self, token_type: TokenType) -> &'static str {
        match (self, token_type) {
            (TokenError::Expired, TokenType::Access) => "Token expired",
            (TokenError::Expired, TokenType::Refresh) => "Refresh token expired",
            (TokenError::Invalid, TokenType::Access) => "Invalid token",
            (TokenError::Invalid, TokenType::Refresh) => "Invalid refresh token",
            (TokenError::WrongType, _) => "Wrong token type",
        }
    }
}

pub fn hash_password(plain: &str, cost: u32) -> Result<String, AppError> {
    hash(plain, cost).map_err(|e| AppError::PasswordHashingError(e.to_string()))
}

/// Passwords longer than bcrypt's input limit never match, so a shared
/// 72-byte prefix cannot stand in for the real password.
pub fn verify_password(plain: &str, hashed: &str) -> bool {
    if plain.len() > PASSWORD_MAX_BYTES {
        return false;
    }
    verify(plain, hashed).unwrap_or_else(|e| {
        warn!(error = %e, "Stored password hash could not be parsed.");
        false
    })
}

/// True when `hashed` was produced with a cost other than the configured one.
pub fn needs_rehash(hashed: &str, cost: u32) -> bool {
    match HashParts::from_str(hashed) {
        Ok(parts) => parts.get_cost() != cost,
        Err(_) => true,
    }
}

fn algorithm(config: &ServerConfig) -> Result<Algorithm, AppError> {
    Algorithm::from_str(&config.jwt_alg)
        .map_err(|e| AppError::TokenCreationError(format!("unsupported algorithm: {e}")))
}

fn create_token(
    user_id: i32,
    token_type: TokenType,
    lifetime: Duration,
    config: &ServerConfig,
) -> Result<String, AppError> {
    let claims = Claims {
        sub: user_id.to_string(),
        token_type,
        exp: (Utc::now() + lifetime).timestamp() as usize,
    };

    encode(
        &Header::new(algorithm(config)?),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_ref()),
    )
    .map_err(|e| AppError::TokenCreationError(e.to_string()))
}

pub fn create_access_token(user_id: i32, config: &ServerConfig) -> Result<String, AppError> {
    create_token(
        user_id,
        TokenType::Access,
        Duration::minutes(config.access_expires_min),
        config,
    )
}

pub fn create_refresh_token(user_id: i32, config: &ServerConfig) -> Result<String, AppError> {
    create_token(
        user_id,
        TokenType::Refresh,
        Duration::days(config.refresh_expires_days),
        config,
    )
}

pub fn create_token_pair(user_id: i32, config: &ServerConfig) -> Result<TokenPair, AppError> {
    Ok(TokenPair {
        access_token: create_access_token(user_id, config)?,
        refresh_token: create_refresh_token(user_id, config)?,
        token_type: "bearer".to_string(),
    })
}

/// Decodes a token, checks signature and expiry, and insists on `expected` type.
/// Returns the user id carried in `sub`.
pub fn decode_token(
    token: &str,
    expected: TokenType,
    config: &ServerConfig,
) -> Result<i32, TokenError> {
    let algorithm = Algorithm::from_str(&config.jwt_alg).map_err(|_| TokenError::Invalid)?;
    let mut validation = Validation::new(algorithm);
    validation.leeway = 0;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_ref()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid,
    })?;

    if token_data.claims.token_type != expected {
        return Err(TokenError::WrongType);
    }
    token_data
        .claims
        .sub
        .parse::<i32>()
        .map_err(|_| TokenError::Invalid)
}

/// Validates the payload, hashes the password and stores the user.
pub async fn create_user(
    pool: &DatabaseConnection,
    mut req: UserRegisterIn,
    config: &ServerConfig,
) -> Result<user::Model, AppError> {
    req.validate()?;

    let hashed_password = hash_password(&req.password, config.bcrypt_cost)?;
    let user = user_service::create_user(pool, &req.email, req.tg_id, hashed_password, true)
        .await
        .map_err(|e| AppError::conflict_or_db(e, DUPLICATE_USER))?;

    info!(user_id = user.id, "User registered.");
    Ok(user)
}

pub async fn register_user(
    pool: &DatabaseConnection,
    req: UserRegisterIn,
    config: &ServerConfig,
) -> Result<TokenPair, AppError> {
    let user = create_user(pool, req, config).await?;
    create_token_pair(user.id, config)
}

pub async fn login_user(
    pool: &DatabaseConnection,
    form: LoginForm,
    config: &ServerConfig,
) -> Result<TokenPair, AppError> {
    let email = normalize_email(&form.username).map_err(|_| AppError::InvalidCredentials)?;
    let user = user_service::get_user_by_email(pool, &email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !verify_password(&form.password, &user.hashed_password) {
        return Err(AppError::InvalidCredentials);
    }

    if !user.is_active {
        return Err(AppError::Forbidden("User is inactive".to_string()));
    }

    let user_id = user.id;
    if needs_rehash(&user.hashed_password, config.bcrypt_cost) {
        let rehashed = hash_password(&form.password, config.bcrypt_cost)?;
        user_service::update_password_hash(pool, user, rehashed).await?;
        info!(user_id, "Password hash upgraded to the configured cost.");
    }

    create_token_pair(user_id, config)
}

pub async fn refresh_tokens(
    pool: &DatabaseConnection,
    refresh_token: &str,
    config: &ServerConfig,
) -> Result<TokenPair, AppError> {
    let user_id = decode_token(refresh_token, TokenType::Refresh, config).map_err(|e| {
        warn!(error = ?e, "Rejected refresh token.");
        AppError::Unauthorized(e.message(TokenType::Refresh).to_string())
    })?;

    match user_service::get_user_by_id(pool, user_id).await? {
        Some(user) if user.is_active => create_token_pair(user.id, config),
        _ => Err(AppError::Unauthorized(
            "User not found or inactive".to_string(),
        )),
    }
}

pub async fn me(Extension(CurrentUser(user)): Extension<CurrentUser>) -> axum::Json<UserOut> {
    axum::Json(UserOut::from(user))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ServerConfig {
        ServerConfig::with_secret("unit-test-secret", "sqlite::memory:").unwrap()
    }

    #[test]
    fn access_token_round_trip() {
        let config = config();
        let token = create_access_token(42, &config).unwrap();
        assert_eq!(decode_token(&token, TokenType::Access, &config), Ok(42));
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let config = config();
        let token = create_refresh_token(42, &config).unwrap();
        assert_eq!(
            decode_token(&token, TokenType::Access, &config),
            Err(TokenError::WrongType)
        );
        assert_eq!(decode_token(&token, TokenType::Refresh, &config), Ok(42));
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let mut config = config();
        config.access_expires_min = -5;
        let token = create_access_token(1, &config).unwrap();
        assert_eq!(
            decode_token(&token, TokenType::Access, &config),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn foreign_signature_is_invalid() {
        let config = config();
        let mut other = config.clone();
        other.jwt_secret = "someone-else".to_string();
        let token = create_access_token(1, &other).unwrap();
        assert_eq!(
            decode_token(&token, TokenType::Access, &config),
            Err(TokenError::Invalid)
        );
        assert_eq!(
            decode_token("not-a-jwt", TokenType::Access, &config),
            Err(TokenError::Invalid)
        );
    }

    #[test]
    fn password_hash_and_rehash() {
        let hashed = hash_password("correct horse", 4).unwrap();
        assert!(verify_password("correct horse", &hashed));
        assert!(!verify_password("battery staple", &hashed));
        assert!(!needs_rehash(&hashed, 4));
        assert!(needs_rehash(&hashed, 5));
        assert!(needs_rehash("plaintext", 4));
        assert!(!verify_password("plaintext", "plaintext"));
    }

    #[test]
    fn over_long_password_never_verifies() {
        let prefix = "a".repeat(72);
        let hashed = hash_password(&prefix, 4).unwrap();
        assert!(verify_password(&prefix, &hashed));
        assert!(!verify_password(&format!("{prefix}totally-different"), &hashed));
    }
}
