// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! BD Sync: team-meeting dashboard backend.
//!
//! This crate hosts the dashboard's session lifecycle (sign-in, role and
//! team resolution, Demo Mode fallback) and the workspace API (teams,
//! meetings, invites) over Firestore.

pub mod config;
pub mod error;
pub mod identity;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod session;
pub mod store;

use config::Config;
use session::SessionManager;
use std::sync::Arc;
use store::WorkspaceStore;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub session: SessionManager,
    /// Real backing store
    pub store: Arc<dyn WorkspaceStore>,
    /// In-memory store used while the session is in Demo Mode
    pub demo_store: Arc<dyn WorkspaceStore>,
}

impl AppState {
    /// Store to use for the current request. Demo Mode routes every store
    /// call to the in-memory backend.
    pub fn workspace(&self) -> Arc<dyn WorkspaceStore> {
        if self.session.snapshot().is_demo {
            self.demo_store.clone()
        } else {
            self.store.clone()
        }
    }
}
