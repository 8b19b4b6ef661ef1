// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! BD Sync API Server
//!
//! Hosts the team-meeting dashboard: session lifecycle (with Demo Mode
//! fallback when auth is misconfigured) plus the teams/meetings workspace
//! API backed by Firestore.

use bdsync::{
    config::Config,
    identity::GoogleIdentityBroker,
    session::SessionManager,
    store::{FirestoreStore, MemoryStore, WorkspaceStore},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting BD Sync API");

    // Initialize Firestore-backed workspace store
    let firestore = Arc::new(
        FirestoreStore::new(&config.gcp_project_id)
            .await
            .expect("Failed to connect to Firestore"),
    );
    let store: Arc<dyn WorkspaceStore> = firestore.clone();

    // In-memory store for Demo Mode, seeded with the demo teams
    let demo_store: Arc<dyn WorkspaceStore> = Arc::new(MemoryStore::demo());

    // Identity provider adapter
    let identity = Arc::new(GoogleIdentityBroker::new(
        config.google_api_key.clone(),
        config.operator_email.clone(),
        config.operator_password.clone(),
        config.demo_trigger_codes.clone(),
    ));

    // Session manager owns the auth state machine
    let session = SessionManager::new(identity, firestore, config.auth_resolve_timeout);
    if let Err(err) = session.initialize().await {
        // The session resolves to signed-out; the server stays up so the
        // operator can retry via /auth/signin
        tracing::error!(error = %err, "Initial identity subscription failed");
    }

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        session,
        store,
        demo_store,
    });

    // Build router
    let app = bdsync::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("bdsync=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
