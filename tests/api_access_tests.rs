// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Route-guard and workspace API tests over the real router.
//!
//! These verify that:
//! 1. The session gate blocks while loading and redirects when signed out
//! 2. Dashboard routing and team-scoped access follow role/team
//! 3. Demo Mode serves the seeded in-memory workspace end to end

mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use bdsync::store::{ProfileStore, WorkspaceStore};
use common::{admin_profile, member_profile, test_identity, wait_for_snapshot};
use tower::ServiceExt;

async fn get(app: &axum::Router, uri: &str) -> axum::response::Response {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn post_json(app: &axum::Router, uri: &str, body: &str) -> axum::response::Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Sign the given profile in through the stub identity provider.
async fn sign_in_as(app: &common::TestApp, profile: bdsync::models::UserProfile) {
    app.store.upsert_profile(&profile).await.unwrap();
    app.identity.set_operator(test_identity(&profile.uid)).await;
    app.state.session.sign_in().await.unwrap();
    wait_for_snapshot(&app.state.session, |s| {
        s.user.as_ref().map(|u| u.uid.as_str()) == Some(profile.uid.as_str())
    })
    .await;
}

#[tokio::test]
async fn test_health_is_public() {
    let app = common::create_test_app().await;
    let response = get(&app.router, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_dashboard_while_loading_returns_503() {
    use bdsync::session::SessionManager;
    use bdsync::store::MemoryStore;
    use std::sync::Arc;
    use std::time::Duration;

    // Session constructed but never initialized: still unresolved
    let identity = common::StubIdentity::new();
    let store = Arc::new(MemoryStore::new());
    let session = SessionManager::new(identity, store.clone(), Duration::from_secs(30));
    let state = Arc::new(bdsync::AppState {
        config: bdsync::config::Config::test_default(),
        session,
        store: store.clone(),
        demo_store: Arc::new(MemoryStore::demo()),
    });
    let router = bdsync::routes::create_router(state);

    let response = get(&router, "/dashboard").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "1");
}

#[tokio::test]
async fn test_dashboard_signed_out_redirects_to_login() {
    let app = common::create_test_app().await;
    wait_for_snapshot(&app.state.session, |s| !s.loading).await;

    let response = get(&app.router, "/dashboard").await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/login");
}

#[tokio::test]
async fn test_dashboard_member_with_team_redirects_to_workspace() {
    let app = common::create_test_app().await;
    sign_in_as(&app, member_profile("u1", Some("t1"))).await;

    let response = get(&app.router, "/dashboard").await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/teams/t1"
    );
}

#[tokio::test]
async fn test_dashboard_member_without_team_awaits_invitation() {
    let app = common::create_test_app().await;
    sign_in_as(&app, member_profile("u1", None)).await;

    let response = get(&app.router, "/dashboard").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "awaiting_invitation");
}

#[tokio::test]
async fn test_dashboard_admin_redirects_to_overview() {
    let app = common::create_test_app().await;
    sign_in_as(&app, admin_profile("boss")).await;

    let response = get(&app.router, "/dashboard").await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/admin/teams"
    );

    let response = get(&app.router, "/admin/teams").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_member_cannot_use_admin_surface() {
    let app = common::create_test_app().await;
    sign_in_as(&app, member_profile("u1", Some("t1"))).await;

    let response = get(&app.router, "/admin/teams").await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/dashboard"
    );

    let response = post_json(&app.router, "/admin/teams", r#"{"name":"Rogue"}"#).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_team_scoped_access() {
    let app = common::create_test_app().await;
    let own = app.store.create_team("Own Team").await.unwrap();
    let other = app.store.create_team("Other Team").await.unwrap();
    sign_in_as(&app, member_profile("u1", Some(&own.id))).await;

    let response = get(&app.router, &format!("/teams/{}", own.id)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get(&app.router, &format!("/teams/{}", other.id)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = json_body(response).await;
    assert_eq!(body["error"], "access_denied");
}

#[tokio::test]
async fn test_admin_can_enter_any_team() {
    let app = common::create_test_app().await;
    let team = app.store.create_team("Any Team").await.unwrap();
    sign_in_as(&app, admin_profile("boss")).await;

    let response = get(&app.router, &format!("/teams/{}", team.id)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["name"], "Any Team");
}

#[tokio::test]
async fn test_admin_creates_team() {
    let app = common::create_test_app().await;
    sign_in_as(&app, admin_profile("boss")).await;

    let response = post_json(&app.router, "/admin/teams", r#"{"name":"Growth"}"#).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["name"], "Growth");

    let response = post_json(&app.router, "/admin/teams", r#"{"name":""}"#).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_record_and_list_meetings() {
    let app = common::create_test_app().await;
    let team = app.store.create_team("Standup").await.unwrap();
    sign_in_as(&app, member_profile("u1", Some(&team.id))).await;

    let uri = format!("/teams/{}/meetings", team.id);
    let response = post_json(
        &app.router,
        &uri,
        r#"{"rawNotes":"Discussed Q3 pipeline","analysis":{"summary":"Pipeline review","action_items":[{"task":"Follow up with ACME","owner":"u1"}],"suggestions":"Focus on enterprise"}}"#,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let meeting = json_body(response).await;
    assert_eq!(meeting["teamId"], team.id);
    assert_eq!(meeting["analysis"]["summary"], "Pipeline review");

    let response = get(&app.router, &uri).await;
    assert_eq!(response.status(), StatusCode::OK);
    let meetings = json_body(response).await;
    assert_eq!(meetings.as_array().unwrap().len(), 1);

    // A meeting with neither notes nor analysis is rejected
    let response = post_json(&app.router, &uri, r#"{"rawNotes":"   "}"#).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invite_preview_and_join() {
    let app = common::create_test_app().await;
    let team = app.store.create_team("Joiners").await.unwrap();
    sign_in_as(&app, member_profile("newbie", None)).await;

    let response = get(&app.router, &format!("/join/{}", team.id)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["name"], "Joiners");

    let response = get(&app.router, "/join/no-such-team").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = post_json(&app.router, &format!("/join/{}", team.id), "{}").await;
    assert_eq!(response.status(), StatusCode::OK);

    let profile = app.store.get_profile("newbie").await.unwrap().unwrap();
    assert_eq!(profile.team_id.as_deref(), Some(team.id.as_str()));
    let team = app.store.get_team(&team.id).await.unwrap().unwrap();
    assert!(team.member_ids.contains(&"newbie".to_string()));
}

#[tokio::test]
async fn test_demo_mode_end_to_end() {
    use bdsync::config::DEFAULT_DEMO_TRIGGER_CODES;
    use bdsync::identity::IdentityError;

    let app = common::create_test_app().await;
    wait_for_snapshot(&app.state.session, |s| !s.loading).await;

    let codes: Vec<String> = DEFAULT_DEMO_TRIGGER_CODES
        .iter()
        .map(|c| c.to_string())
        .collect();
    app.identity
        .fail_sign_in(IdentityError::classified(
            "auth/api-key-not-valid",
            "API key not valid",
            &codes,
        ))
        .await;

    // Sign-in over HTTP recovers into Demo Mode
    let response = post_json(&app.router, "/auth/signin", "{}").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["isDemo"], true);
    assert_eq!(body["user"]["role"], "admin");

    // The admin overview now serves the seeded demo workspace
    let response = get(&app.router, "/admin/teams").await;
    assert_eq!(response.status(), StatusCode::OK);
    let teams = json_body(response).await;
    assert_eq!(teams.as_array().unwrap().len(), 3);

    // Logout exits Demo Mode
    let response = post_json(&app.router, "/auth/logout", "{}").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["isDemo"], false);
    assert!(body["user"].is_null());
}

#[tokio::test]
async fn test_failed_sign_in_surfaces_error() {
    use bdsync::identity::{IdentityError, IdentityErrorKind};

    let app = common::create_test_app().await;
    wait_for_snapshot(&app.state.session, |s| !s.loading).await;

    app.identity
        .fail_sign_in(IdentityError::new(
            IdentityErrorKind::Network,
            "auth/network-request-failed",
            "socket timeout",
        ))
        .await;

    let response = post_json(&app.router, "/auth/signin", "{}").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["error"], "sign_in_failed");

    // Session unchanged
    let response = get(&app.router, "/auth/session").await;
    let body = json_body(response).await;
    assert_eq!(body["isDemo"], false);
    assert!(body["user"].is_null());
}
