use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
};

use crate::db::entities::{prelude::*, user};
use crate::web::models::user_models::UserUpdateIn;

/// Inserts a new user. The password must already be hashed.
pub async fn create_user(
    db: &DatabaseConnection,
    email: &str,
    tg_id: Option<i64>,
    hashed_password: String,
    is_active: bool,
) -> Result<user::Model, DbErr> {
    let new_user = user::ActiveModel {
        email: Set(email.to_owned()),
        tg_id: Set(tg_id),
        hashed_password: Set(hashed_password),
        is_active: Set(is_active),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    new_user.insert(db).await
}

pub async fn get_user_by_id(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<Option<user::Model>, DbErr> {
    User::find_by_id(user_id).one(db).await
}

pub async fn get_user_by_email(
    db: &DatabaseConnection,
    email: &str,
) -> Result<Option<user::Model>, DbErr> {
    User::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await
}

/// Applies a partial update. Returns `None` when the user does not exist.
pub async fn update_user(
    db: &DatabaseConnection,
    user_id: i32,
    fields: UserUpdateIn,
) -> Result<Option<user::Model>, DbErr> {
    let Some(existing) = User::find_by_id(user_id).one(db).await? else {
        return Ok(None);
    };

    let mut active: user::ActiveModel = existing.into();
    if let Some(email) = fields.email {
        active.email = Set(email);
    }
    if let Some(tg_id) = fields.tg_id {
        active.tg_id = Set(tg_id);
    }

    active.update(db).await.map(Some)
}

pub async fn update_password_hash(
    db: &DatabaseConnection,
    user: user::Model,
    hashed_password: String,
) -> Result<user::Model, DbErr> {
    let mut active: user::ActiveModel = user.into();
    active.hashed_password = Set(hashed_password);
    active.update(db).await
}

/// Enables or disables an account. Returns `None` when the user does not exist.
pub async fn set_active(
    db: &DatabaseConnection,
    user_id: i32,
    is_active: bool,
) -> Result<Option<user::Model>, DbErr> {
    let Some(existing) = User::find_by_id(user_id).one(db).await? else {
        return Ok(None);
    };
    let mut active: user::ActiveModel = existing.into();
    active.is_active = Set(is_active);
    active.update(db).await.map(Some)
}

/// Deletes a user; their monitors and checks go with them through the
/// `ON DELETE CASCADE` foreign keys.
pub async fn delete_user(db: &DatabaseConnection, user_id: i32) -> Result<bool, DbErr> {
    let result = User::delete_by_id(user_id).exec(db).await?;
    Ok(result.rows_affected > 0)
}
