// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Protected-route middleware.
//!
//! Applies the route gate to every protected request: gated handlers never
//! run while the session is still resolving or signed out.

use crate::session::guards::{route_gate, RouteGate};
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;

/// Authenticated profile for the current request.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub crate::models::UserProfile);

/// Middleware that requires a resolved, signed-in session.
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let snapshot = state.session.snapshot();
    match route_gate(&snapshot) {
        RouteGate::Loading => {
            // Loading placeholder: ask the client to retry shortly
            (
                [(header::RETRY_AFTER, "1")],
                crate::error::AppError::SessionResolving,
            )
                .into_response()
        }
        RouteGate::SignInRequired => Redirect::temporary("/login").into_response(),
        RouteGate::Allow => match snapshot.user {
            Some(user) => {
                request.extensions_mut().insert(CurrentUser(user));
                next.run(request).await
            }
            // Unreachable given the gate, but fail closed
            None => Redirect::temporary("/login").into_response(),
        },
    }
}
