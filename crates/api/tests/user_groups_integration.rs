//! User group administration.

mod common;

use axum::http::StatusCode;
use common::{create_test_app, create_user, get, post, test_config, test_pool};
use fake::faker::lorem::en::Word;
use fake::Fake;
use serde_json::json;
use uuid::Uuid;

fn group_name() -> String {
    format!("{}-{}", Word().fake::<String>(), Uuid::new_v4().simple())
}

#[tokio::test]
async fn test_create_group_and_reject_duplicate() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let config = test_config();
    let (_, token) = create_user(&pool, &config, true).await;
    let app = create_test_app(config, pool);
    let name = group_name();

    let (status, body) = post(
        &app,
        "/admin/user-group/create",
        &token,
        json!({ "userGroupName": name }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["redirectTo"], "/admin/user-groups");
    assert_eq!(body["flash"]["level"], "success");
    assert_eq!(body["data"]["name"], name.as_str());

    let (_, body) = post(
        &app,
        "/admin/user-group/create",
        &token,
        json!({ "userGroupName": name }),
    )
    .await;
    assert_eq!(body["flash"]["level"], "error");
    assert_eq!(
        body["flash"]["messages"][0],
        "The same group name already exists"
    );
}

#[tokio::test]
async fn test_group_detail_and_membership() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let config = test_config();
    let (_, token) = create_user(&pool, &config, true).await;
    let app = create_test_app(config, pool.clone());

    let (_, body) = post(
        &app,
        "/admin/user-group/create",
        &token,
        json!({ "userGroupName": group_name() }),
    )
    .await;
    let group_id = body["data"]["id"].as_str().unwrap().to_string();

    let detail = format!("/admin/user-group-detail/{}", group_id);
    let (status, body) = get(&app, &detail, &token).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["userGroupRelations"].as_array().unwrap().is_empty());
    assert_eq!(body["isAclEnabled"], true);

    // Unknown users cannot be added.
    let (_, body) = post(
        &app,
        "/admin/user-group-relation/create",
        &token,
        json!({ "user_group_id": group_id, "user_name": "nobody-here" }),
    )
    .await;
    assert_eq!(body["redirectTo"], detail.as_str());
    assert_eq!(
        body["flash"]["messages"][0],
        "Error on create user-group relation"
    );
}

#[tokio::test]
async fn test_unknown_group_detail_redirects() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let config = test_config();
    let (_, token) = create_user(&pool, &config, true).await;
    let app = create_test_app(config, pool);

    let (status, body) = get(
        &app,
        &format!("/admin/user-group-detail/{}", Uuid::new_v4()),
        &token,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["redirectTo"], "/admin/user-groups");
    assert_eq!(body["flash"]["messages"][0], "Group not found");
}

#[tokio::test]
async fn test_group_list_is_paginated() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let config = test_config();
    let (_, token) = create_user(&pool, &config, true).await;
    let app = create_test_app(config, pool);

    let (status, body) = get(&app, "/admin/user-groups?page=1", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["userGroups"].as_array().unwrap().len() <= 10);
    assert!(body["pager"]["pagesCount"].is_number());
}
