mod common;

use api_health_checker::db::entities::prelude::*;
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::{Value, json};

use common::{PASSWORD, start_server};

#[tokio::test]
async fn create_user_is_public_and_returns_profile() {
    let app = start_server().await;

    let res = app
        .client
        .post(app.url("/api/users"))
        .json(&json!({ "email": "gina@example.com", "password": PASSWORD, "tg_id": 1001 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 201);
    let user: Value = res.json().await.unwrap();
    assert_eq!(user["email"], "gina@example.com");
    assert_eq!(user["tg_id"], 1001);
    assert_eq!(user["is_active"], true);
    assert!(user.get("hashed_password").is_none());

    // Same Telegram id, different e-mail.
    let res = app
        .client
        .post(app.url("/api/users"))
        .json(&json!({ "email": "gina2@example.com", "password": PASSWORD, "tg_id": 1001 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 409);
}

#[tokio::test]
async fn users_can_only_read_their_own_profile() {
    let app = start_server().await;
    let token = app.access_token("hank@example.com").await;
    app.register("ivy@example.com").await;

    let me: Value = app
        .client
        .get(app.url("/api/users/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let my_id = me["id"].as_i64().unwrap();

    let res = app
        .client
        .get(app.url(&format!("/api/users/{my_id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let res = app
        .client
        .get(app.url(&format!("/api/users/{}", my_id + 1)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 403);
}

#[tokio::test]
async fn patch_me_updates_and_detects_conflicts() {
    let app = start_server().await;
    let token = app.access_token("jack@example.com").await;
    app.register("kate@example.com").await;

    let res = app
        .client
        .patch(app.url("/api/users/me"))
        .bearer_auth(&token)
        .json(&json!({ "tg_id": 77 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let user: Value = res.json().await.unwrap();
    assert_eq!(user["tg_id"], 77);
    assert_eq!(user["email"], "jack@example.com");

    let res = app
        .client
        .patch(app.url("/api/users/me"))
        .bearer_auth(&token)
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let user: Value = res.json().await.unwrap();
    assert_eq!(user["tg_id"], 77);

    let res = app
        .client
        .patch(app.url("/api/users/me"))
        .bearer_auth(&token)
        .json(&json!({ "email": "kate@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 409);

    let res = app
        .client
        .patch(app.url("/api/users/me"))
        .bearer_auth(&token)
        .json(&json!({ "tg_id": null }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let user: Value = res.json().await.unwrap();
    assert!(user["tg_id"].is_null());
}

#[tokio::test]
async fn deleting_a_user_cascades_to_monitors() {
    let app = start_server().await;
    let token = app.access_token("liam@example.com").await;

    let res = app
        .create_monitor(&token, json!({ "name": "home", "url": "https://example.com" }))
        .await;
    assert_eq!(res.status(), 201);
    let monitor: Value = res.json().await.unwrap();
    let monitor_id = monitor["id"].as_i64().unwrap();

    let res = app
        .client
        .delete(app.url("/api/users/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 204);
    assert_eq!(Monitor::find().count(&app.db).await.unwrap(), 0);

    // The old token no longer resolves to a user.
    let res = app
        .client
        .get(app.url("/api/users/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 401);

    // Re-registering the address does not bring the monitor back.
    let token = app.access_token("liam@example.com").await;
    let res = app
        .client
        .get(app.url(&format!("/api/monitors/{monitor_id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);
}
