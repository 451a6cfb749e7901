use serde::{Deserialize, Serialize};

use crate::db::entities::user;
use crate::web::error::AppError;

pub mod check_models;
pub mod monitor_models;
pub mod user_models;

pub const PASSWORD_MIN_LEN: usize = 8;
/// bcrypt only reads this many bytes of its input.
pub const PASSWORD_MAX_BYTES: usize = 72;

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserRegisterIn {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub tg_id: Option<i64>,
}

impl UserRegisterIn {
    pub fn validate(&mut self) -> Result<(), AppError> {
        self.email = normalize_email(&self.email)?;
        validate_password(&self.password)
    }
}

/// OAuth2 password-flow form: `username` carries the e-mail address.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenRefresh {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

// JWT Claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user id
    #[serde(rename = "type")]
    pub token_type: TokenType,
    pub exp: usize,
}

/// The authenticated user, attached to the request by the auth middleware.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub user::Model);

pub fn normalize_email(raw: &str) -> Result<String, AppError> {
    let email = raw.trim();
    let invalid = || AppError::InvalidInput("value is not a valid email address".to_string());

    if email.len() > 250 || email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|label| label.is_empty()) {
        return Err(invalid());
    }
    // Domains are case-insensitive, the local part is kept as typed.
    Ok(format!("{local}@{}", domain.to_ascii_lowercase()))
}

pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < PASSWORD_MIN_LEN {
        return Err(AppError::InvalidInput(format!(
            "password must be at least {PASSWORD_MIN_LEN} characters"
        )));
    }
    if password.len() > PASSWORD_MAX_BYTES {
        return Err(AppError::InvalidInput(format!(
            "password must be at most {PASSWORD_MAX_BYTES} bytes"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_addresses() {
        assert_eq!(normalize_email("  ann@example.com ").unwrap(), "ann@example.com");
        assert!(normalize_email("a.b+tag@mail.example.org").is_ok());
        assert_eq!(normalize_email("Ann@Example.COM").unwrap(), "Ann@example.com");
    }

    #[test]
    fn rejects_malformed_addresses() {
        for bad in ["", "ann", "@example.com", "ann@", "ann@example", "ann@@example.com", "a n@example.com", "ann@example..com"] {
            assert!(normalize_email(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn password_length_bounds() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("exactly8").is_ok());
        assert!(validate_password(&"x".repeat(72)).is_ok());
        assert!(validate_password(&"x".repeat(73)).is_err());
        // 36 two-byte characters fill the limit exactly.
        assert!(validate_password(&"é".repeat(36)).is_ok());
        assert!(validate_password(&"é".repeat(37)).is_err());
    }

    #[test]
    fn claims_use_type_field_on_the_wire() {
        let claims = Claims {
            sub: "7".to_string(),
            token_type: TokenType::Refresh,
            exp: 1,
        };
        let value = serde_json::to_value(&claims).unwrap();
        assert_eq!(value["type"], "refresh");
        assert_eq!(value["sub"], "7");
    }
}
