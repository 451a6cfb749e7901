use serde::{Deserialize, Deserializer, Serialize};

use crate::db::entities::user;
use crate::web::error::AppError;
use crate::web::models::normalize_email;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserUpdateIn {
    #[serde(default)]
    pub email: Option<String>,
    /// `Some(None)` clears the Telegram id, `None` leaves it untouched.
    #[serde(default, deserialize_with = "present_or_null")]
    pub tg_id: Option<Option<i64>>,
}

impl UserUpdateIn {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.tg_id.is_none()
    }

    pub fn validate(&mut self) -> Result<(), AppError> {
        if let Some(email) = self.email.as_deref() {
            self.email = Some(normalize_email(email)?);
        }
        Ok(())
    }
}

fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserOut {
    pub id: i32,
    pub email: String,
    pub tg_id: Option<i64>,
    pub is_active: bool,
}

impl From<user::Model> for UserOut {
    fn from(user: user::Model) -> Self {
        UserOut {
            id: user.id,
            email: user.email,
            tg_id: user.tg_id,
            is_active: user.is_active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinguishes_null_from_absent_tg_id() {
        let absent: UserUpdateIn = serde_json::from_str(r#"{"email":"a@b.io"}"#).unwrap();
        assert_eq!(absent.tg_id, None);

        let cleared: UserUpdateIn = serde_json::from_str(r#"{"tg_id":null}"#).unwrap();
        assert_eq!(cleared.tg_id, Some(None));

        let set: UserUpdateIn = serde_json::from_str(r#"{"tg_id":42}"#).unwrap();
        assert_eq!(set.tg_id, Some(Some(42)));
    }

    #[test]
    fn rejects_unknown_fields() {
        assert!(serde_json::from_str::<UserUpdateIn>(r#"{"is_active":false}"#).is_err());
    }
}
