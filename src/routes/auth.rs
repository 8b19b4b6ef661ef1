// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session lifecycle routes.

use crate::error::{AppError, Result};
use crate::session::{SessionError, SessionSnapshot};
use crate::AppState;
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login", get(login_entry))
        .route("/auth/signin", post(sign_in))
        .route("/auth/logout", post(logout))
        .route("/auth/session", get(session_state))
}

#[derive(Serialize)]
struct LoginEntry {
    status: &'static str,
    sign_in: &'static str,
}

/// Sign-in entry point; target of the protected-route redirect.
async fn login_entry() -> Json<LoginEntry> {
    Json(LoginEntry {
        status: "sign_in_required",
        sign_in: "POST /auth/signin",
    })
}

/// Trigger the interactive sign-in flow.
///
/// Configuration-class provider failures enter Demo Mode and succeed;
/// any other failure is surfaced as a visible error.
async fn sign_in(State(state): State<Arc<AppState>>) -> Result<Json<SessionSnapshot>> {
    state.session.sign_in().await.map_err(map_session_error)?;
    Ok(Json(state.session.snapshot()))
}

async fn logout(State(state): State<Arc<AppState>>) -> Result<Json<SessionSnapshot>> {
    state.session.logout().await.map_err(map_session_error)?;
    Ok(Json(state.session.snapshot()))
}

/// Current `{user, loading, isDemo}` snapshot.
async fn session_state(State(state): State<Arc<AppState>>) -> Json<SessionSnapshot> {
    Json(state.session.snapshot())
}

fn map_session_error(err: SessionError) -> AppError {
    match err {
        SessionError::SignIn(detail) => AppError::SignIn(detail.to_string()),
        other => AppError::Internal(anyhow::Error::new(other)),
    }
}
