// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session manager: process-wide authentication state.
//!
//! Bridges the identity provider's auth-state stream and the per-uid
//! profile subscription into a single `{user, loading, isDemo}` snapshot
//! published on a watch channel. Only the session manager writes to the
//! channel; everything else holds receivers.
//!
//! Demo Mode: a configuration-class sign-in failure (bad API key,
//! unauthorized domain, provider internal error) switches the session to a
//! fabricated local admin identity. Once set, the identity subscription is
//! bypassed until `logout`.

pub mod guards;

use crate::identity::{AuthStateEvent, Identity, IdentityError, IdentityErrorKind, IdentityProvider};
use crate::models::{UserProfile, UserRole};
use crate::store::{ProfileEvent, ProfileStore, ProfileSubscription, StoreError};
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

/// Fixed uid of the fabricated Demo Mode administrator.
pub const DEMO_ADMIN_UID: &str = "demo-admin-123";

/// Current session state. `loading` is true only during the initial
/// resolution of identity state; gated content must not render while it
/// is set.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub user: Option<UserProfile>,
    pub loading: bool,
    pub is_demo: bool,
}

impl SessionSnapshot {
    fn unresolved() -> Self {
        Self {
            user: None,
            loading: true,
            is_demo: false,
        }
    }
}

/// Session-level errors surfaced to the caller.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("identity subscription failed: {0}")]
    Subscribe(IdentityError),

    #[error("sign-in failed: {0}")]
    SignIn(IdentityError),

    #[error("sign-out failed: {0}")]
    SignOut(IdentityError),
}

/// The fabricated administrator profile used in Demo Mode. Never written
/// to the profile store.
pub fn demo_admin_profile() -> UserProfile {
    UserProfile {
        uid: DEMO_ADMIN_UID.to_string(),
        email: "admin@bdsync.demo".to_string(),
        display_name: Some("Demo Admin".to_string()),
        role: UserRole::Admin,
        team_id: None,
        photo_url: Some(
            "https://ui-avatars.com/api/?name=Demo+Admin&background=0ea5e9&color=fff".to_string(),
        ),
    }
}

/// Owns the session state machine. Constructed once at startup and shared
/// by handle.
pub struct SessionManager {
    identity: Arc<dyn IdentityProvider>,
    profiles: Arc<dyn ProfileStore>,
    state: watch::Sender<SessionSnapshot>,
    resolve_timeout: Duration,
    loop_task: Mutex<Option<JoinHandle<()>>>,
}

impl SessionManager {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        profiles: Arc<dyn ProfileStore>,
        resolve_timeout: Duration,
    ) -> Self {
        let (state, _) = watch::channel(SessionSnapshot::unresolved());
        Self {
            identity,
            profiles,
            state,
            resolve_timeout,
            loop_task: Mutex::new(None),
        }
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    /// Receiver for session-state changes. Consumers are read-only.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    /// Start (or restart) the identity-state loop.
    ///
    /// In Demo Mode this is a no-op beyond clearing `loading`: no external
    /// subscription is established until `logout` resets the flag.
    pub async fn initialize(&self) -> Result<(), SessionError> {
        if self.state.borrow().is_demo {
            self.state.send_modify(|s| s.loading = false);
            return Ok(());
        }

        self.stop_loop().await;

        let auth_events = match self.identity.subscribe_auth_state().await {
            Ok(stream) => stream,
            Err(err) => {
                tracing::error!(error = %err, "Failed to subscribe to auth state");
                self.state.send_modify(|s| {
                    s.user = None;
                    s.loading = false;
                });
                return Err(SessionError::Subscribe(err));
            }
        };

        let handle = tokio::spawn(run_loop(
            auth_events,
            self.profiles.clone(),
            self.state.clone(),
        ));
        *self.loop_task.lock().await = Some(handle);

        self.spawn_resolve_watchdog();
        Ok(())
    }

    /// Interactive sign-in.
    ///
    /// Success is delivered asynchronously via the auth-state stream.
    /// Configuration-class failures enter Demo Mode and report success;
    /// every other failure is returned for the caller to surface.
    pub async fn sign_in(&self) -> Result<(), SessionError> {
        match self.identity.sign_in().await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == IdentityErrorKind::Config => {
                tracing::warn!(code = %err.code(), "Entering Demo Mode (auth misconfigured)");
                self.enter_demo().await;
                Ok(())
            }
            Err(err) => {
                tracing::error!(code = %err.code(), error = %err, "Sign-in failed");
                Err(SessionError::SignIn(err))
            }
        }
    }

    /// Sign out. Exiting Demo Mode re-attempts a real identity
    /// subscription.
    pub async fn logout(&self) -> Result<(), SessionError> {
        if self.state.borrow().is_demo {
            self.state.send_replace(SessionSnapshot::unresolved());
            return self.initialize().await;
        }

        self.identity
            .sign_out()
            .await
            .map_err(SessionError::SignOut)?;
        // May be redundant with the stream's own signed-out event
        self.state.send_modify(|s| {
            s.user = None;
            s.loading = false;
        });
        Ok(())
    }

    async fn enter_demo(&self) {
        self.stop_loop().await;
        self.state.send_replace(SessionSnapshot {
            user: Some(demo_admin_profile()),
            loading: false,
            is_demo: true,
        });
    }

    async fn stop_loop(&self) {
        if let Some(handle) = self.loop_task.lock().await.take() {
            // Aborting drops any held profile subscription, releasing its
            // listener
            handle.abort();
        }
    }

    /// Bound the initial identity resolution so `loading` can never hang.
    fn spawn_resolve_watchdog(&self) {
        let state = self.state.clone();
        let timeout = self.resolve_timeout;
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            if state.borrow().loading {
                tracing::warn!(
                    timeout_secs = timeout.as_secs(),
                    "Identity state unresolved after timeout, releasing loading gate"
                );
                state.send_modify(|s| s.loading = false);
            }
        });
    }
}

/// Event loop bridging auth-state events and the profile subscription.
async fn run_loop(
    mut auth_events: BoxStream<'static, AuthStateEvent>,
    profiles: Arc<dyn ProfileStore>,
    state: watch::Sender<SessionSnapshot>,
) {
    // At most one profile subscription is active at a time; replacing or
    // clearing the Option releases the previous one.
    let mut profile_sub: Option<ProfileSubscription> = None;
    let mut signed_in: Option<Identity> = None;

    loop {
        tokio::select! {
            event = auth_events.next() => match event {
                None => break,
                Some(AuthStateEvent::SignedOut) => {
                    profile_sub = None;
                    signed_in = None;
                    state.send_modify(|s| {
                        s.user = None;
                        s.loading = false;
                    });
                }
                Some(AuthStateEvent::SignedIn(identity)) => {
                    if signed_in.as_ref().map(|i| i.uid.as_str())
                        == Some(identity.uid.as_str())
                    {
                        continue;
                    }
                    profile_sub = None;
                    match profiles.subscribe_profile(&identity.uid).await {
                        Ok(sub) => {
                            profile_sub = Some(sub);
                            signed_in = Some(identity);
                        }
                        Err(err) => {
                            tracing::warn!(
                                error = %err,
                                uid = %identity.uid,
                                "Profile subscription failed"
                            );
                            signed_in = Some(identity);
                            state.send_modify(|s| s.loading = false);
                        }
                    }
                }
            },
            event = next_profile_event(&mut profile_sub), if profile_sub.is_some() => {
                handle_profile_event(event, &mut profile_sub, &signed_in, &profiles, &state)
                    .await;
            }
        }
    }
}

async fn next_profile_event(
    sub: &mut Option<ProfileSubscription>,
) -> Option<Result<ProfileEvent, StoreError>> {
    match sub {
        Some(sub) => sub.next_event().await,
        None => std::future::pending().await,
    }
}

async fn handle_profile_event(
    event: Option<Result<ProfileEvent, StoreError>>,
    profile_sub: &mut Option<ProfileSubscription>,
    signed_in: &Option<Identity>,
    profiles: &Arc<dyn ProfileStore>,
    state: &watch::Sender<SessionSnapshot>,
) {
    match event {
        Some(Ok(ProfileEvent::Current(profile))) => {
            // The store is the source of truth over the raw identity payload
            state.send_modify(move |s| {
                s.user = Some(profile);
                s.loading = false;
            });
        }
        Some(Ok(ProfileEvent::Missing)) => {
            let Some(identity) = signed_in else {
                return;
            };
            let profile = UserProfile::first_sign_in(identity);
            if let Err(err) = profiles.upsert_profile(&profile).await {
                tracing::warn!(error = %err, uid = %profile.uid, "Failed to create profile");
            }
            // Optimistic: the subscription will re-deliver the same value
            state.send_modify(move |s| {
                s.user = Some(profile);
                s.loading = false;
            });
        }
        Some(Err(err)) => {
            tracing::error!(error = %err, "Error listening to user profile");
            state.send_modify(|s| s.loading = false);
        }
        None => {
            *profile_sub = None;
        }
    }
}
