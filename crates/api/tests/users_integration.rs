//! User administration.

mod common;

use axum::http::StatusCode;
use common::{create_test_app, create_user, get, post, test_config, test_pool, unique_email};
use serde_json::json;

#[tokio::test]
async fn test_invite_users() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let config = test_config();
    let (_, token) = create_user(&pool, &config, true).await;
    let app = create_test_app(config, pool);
    let email = unique_email();

    let (status, body) = post(
        &app,
        "/admin/users/invite",
        &token,
        json!({ "emailList": format!("{}\n\n{}", email, email), "sendEmail": false }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["redirectTo"], "/admin/users");

    let invited = body["data"].as_array().unwrap();
    assert_eq!(invited[0]["email"], email.as_str());
    assert!(invited[0]["password"].is_string());
}

#[tokio::test]
async fn test_users_view() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let config = test_config();
    let (_, token) = create_user(&pool, &config, true).await;
    let app = create_test_app(config, pool);

    let (status, body) = get(&app, "/admin/users", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["activeUsers"].as_i64().unwrap() >= 1);
    assert_eq!(body["isUserCountExceedsUpperLimit"], false);
    assert!(body["users"][0].get("passwordHash").is_none());
}

#[tokio::test]
async fn test_suspend_and_remove_user() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let config = test_config();
    let (_, token) = create_user(&pool, &config, true).await;
    let (target, _) = create_user(&pool, &config, false).await;
    let app = create_test_app(config, pool);

    let (_, body) = post(
        &app,
        &format!("/admin/user/{}/suspend", target),
        &token,
        json!({}),
    )
    .await;
    assert_eq!(body["flash"]["level"], "success");

    let (_, body) = post(
        &app,
        &format!("/admin/user/{}/remove", target),
        &token,
        json!({}),
    )
    .await;
    assert_eq!(body["flash"]["level"], "success");
    assert!(body["flash"]["messages"][0]
        .as_str()
        .unwrap()
        .ends_with("'s account has been deleted"));
}

#[tokio::test]
async fn test_reset_password() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let config = test_config();
    let (_, token) = create_user(&pool, &config, true).await;
    let (target, _) = create_user(&pool, &config, false).await;
    let app = create_test_app(config, pool);

    let (_, body) = post(
        &app,
        "/_api/admin/users.resetPassword",
        &token,
        json!({ "user_id": target }),
    )
    .await;
    assert_eq!(body["ok"], true);
    assert!(!body["password"].as_str().unwrap().is_empty());
    assert_eq!(body["user"]["id"], target.to_string());
}
