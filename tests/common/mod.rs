// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use bdsync::config::Config;
use bdsync::identity::{AuthStateEvent, Identity, IdentityError, IdentityProvider};
use bdsync::models::{UserProfile, UserRole};
use bdsync::routes::create_router;
use bdsync::session::{SessionManager, SessionSnapshot};
use bdsync::store::{MemoryStore, ProfileStore, WorkspaceStore};
use bdsync::AppState;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Scriptable identity provider.
///
/// Tests drive the auth-state stream with `emit` and pick the outcome of
/// `sign_in` with `fail_sign_in`.
pub struct StubIdentity {
    auth_state: watch::Sender<AuthStateEvent>,
    operator: Mutex<Identity>,
    sign_in_error: Mutex<Option<IdentityError>>,
    subscribe_count: AtomicUsize,
}

#[allow(dead_code)]
impl StubIdentity {
    pub fn new() -> Arc<Self> {
        let (auth_state, _) = watch::channel(AuthStateEvent::SignedOut);
        Arc::new(Self {
            auth_state,
            operator: Mutex::new(test_identity("user-1")),
            sign_in_error: Mutex::new(None),
            subscribe_count: AtomicUsize::new(0),
        })
    }

    pub fn emit(&self, event: AuthStateEvent) {
        self.auth_state.send_replace(event);
    }

    pub async fn set_operator(&self, identity: Identity) {
        *self.operator.lock().await = identity;
    }

    pub async fn fail_sign_in(&self, err: IdentityError) {
        *self.sign_in_error.lock().await = Some(err);
    }

    pub async fn clear_sign_in_error(&self) {
        *self.sign_in_error.lock().await = None;
    }

    /// Number of auth-state subscriptions established so far.
    pub fn subscribe_count(&self) -> usize {
        self.subscribe_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for StubIdentity {
    async fn subscribe_auth_state(
        &self,
    ) -> Result<BoxStream<'static, AuthStateEvent>, IdentityError> {
        self.subscribe_count.fetch_add(1, Ordering::SeqCst);
        let mut rx = self.auth_state.subscribe();
        rx.mark_changed();
        let stream = futures_util::stream::unfold(rx, |mut rx| async move {
            match rx.changed().await {
                Ok(()) => {
                    let event = rx.borrow_and_update().clone();
                    Some((event, rx))
                }
                Err(_) => None,
            }
        });
        Ok(stream.boxed())
    }

    async fn sign_in(&self) -> Result<(), IdentityError> {
        if let Some(err) = self.sign_in_error.lock().await.clone() {
            return Err(err);
        }
        let identity = self.operator.lock().await.clone();
        self.auth_state
            .send_replace(AuthStateEvent::SignedIn(identity));
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        self.auth_state.send_replace(AuthStateEvent::SignedOut);
        Ok(())
    }
}

#[allow(dead_code)]
pub fn test_identity(uid: &str) -> Identity {
    Identity {
        uid: uid.to_string(),
        email: format!("{}@example.com", uid),
        display_name: Some("Test User".to_string()),
        photo_url: None,
    }
}

#[allow(dead_code)]
pub fn member_profile(uid: &str, team_id: Option<&str>) -> UserProfile {
    UserProfile {
        uid: uid.to_string(),
        email: format!("{}@example.com", uid),
        display_name: Some("Test User".to_string()),
        role: UserRole::Member,
        team_id: team_id.map(|t| t.to_string()),
        photo_url: None,
    }
}

#[allow(dead_code)]
pub fn admin_profile(uid: &str) -> UserProfile {
    UserProfile {
        role: UserRole::Admin,
        ..member_profile(uid, None)
    }
}

/// Test app wired with the stub identity provider and in-memory stores.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub identity: Arc<StubIdentity>,
    pub store: Arc<MemoryStore>,
}

/// Create a test app; the session is initialized and will resolve to
/// signed-out unless the test emits an identity first.
#[allow(dead_code)]
pub async fn create_test_app() -> TestApp {
    let identity = StubIdentity::new();
    let store = Arc::new(MemoryStore::new());
    let workspace: Arc<dyn WorkspaceStore> = store.clone();
    let profiles: Arc<dyn ProfileStore> = store.clone();

    let config = Config::test_default();
    let session = SessionManager::new(identity.clone(), profiles, config.auth_resolve_timeout);
    session.initialize().await.expect("session init");

    let state = Arc::new(AppState {
        config,
        session,
        store: workspace,
        demo_store: Arc::new(MemoryStore::demo()),
    });

    TestApp {
        router: create_router(state.clone()),
        state: state.clone(),
        identity,
        store,
    }
}

/// Wait until the session snapshot satisfies `pred` (1s budget).
#[allow(dead_code)]
pub async fn wait_for_snapshot<F>(session: &SessionManager, pred: F) -> SessionSnapshot
where
    F: Fn(&SessionSnapshot) -> bool,
{
    let mut rx = session.subscribe();
    let deadline = tokio::time::Instant::now() + Duration::from_secs(1);
    loop {
        {
            let snapshot = rx.borrow_and_update().clone();
            if pred(&snapshot) {
                return snapshot;
            }
        }
        match tokio::time::timeout_at(deadline, rx.changed()).await {
            Ok(Ok(())) => {}
            Ok(Err(_)) => panic!("session state channel closed"),
            Err(_) => panic!("timed out waiting for session snapshot"),
        }
    }
}
