// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore-backed workspace store.
//!
//! Typed operations over three collections:
//! - `users` (profiles, keyed by uid, with a live document listener)
//! - `teams`
//! - `meetings`

use super::{collections, ProfileEvent, ProfileStore, ProfileSubscription, StoreError, WorkspaceStore};
use crate::models::{Meeting, MeetingAnalysis, Team, UserProfile};
use async_trait::async_trait;
use firestore::{
    FirestoreDb, FirestoreListenEvent, FirestoreListenerTarget,
    FirestoreTempFilesListenStateStorage,
};
use futures_util::StreamExt;
use tokio::sync::{mpsc, oneshot};

const PROFILE_LISTEN_TARGET: FirestoreListenerTarget = FirestoreListenerTarget::new(42_u32);

/// Firestore client wrapper.
#[derive(Clone)]
pub struct FirestoreStore {
    client: Option<FirestoreDb>,
}

impl FirestoreStore {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, StoreError> {
        // If the emulator environment variable is set, use unauthenticated
        // connection to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = FirestoreDb::new(project_id)
            .await
            .map_err(|e| StoreError::Unavailable(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, StoreError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            StoreError::Unavailable(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All operations return `StoreError::Unavailable` if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&FirestoreDb, StoreError> {
        self.client
            .as_ref()
            .ok_or_else(|| StoreError::Unavailable("not connected (offline mode)".to_string()))
    }
}

#[async_trait]
impl ProfileStore for FirestoreStore {
    async fn subscribe_profile(&self, uid: &str) -> Result<ProfileSubscription, StoreError> {
        let client = self.get_client()?.clone();
        let uid = uid.to_string();
        let (tx, rx) = mpsc::channel::<Result<ProfileEvent, StoreError>>(16);
        let (release_tx, release_rx) = oneshot::channel::<()>();

        // First event reflects the current document state; the listener
        // then delivers updates.
        match self.get_profile(&uid).await {
            Ok(Some(profile)) => {
                let _ = tx.send(Ok(ProfileEvent::Current(profile))).await;
            }
            Ok(None) => {
                let _ = tx.send(Ok(ProfileEvent::Missing)).await;
            }
            Err(err) => {
                let _ = tx.send(Err(err)).await;
            }
        }

        let mut listener = client
            .create_listener(FirestoreTempFilesListenStateStorage::new())
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        client
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .batch_listen([uid.clone()])
            .add_target(PROFILE_LISTEN_TARGET, &mut listener)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let events_tx = tx.clone();
        listener
            .start(move |event| {
                let events_tx = events_tx.clone();
                async move {
                    match event {
                        FirestoreListenEvent::DocumentChange(ref change) => {
                            if let Some(doc) = &change.document {
                                let sent = match FirestoreDb::deserialize_doc_to::<UserProfile>(doc)
                                {
                                    Ok(profile) => {
                                        events_tx.send(Ok(ProfileEvent::Current(profile))).await
                                    }
                                    Err(err) => {
                                        events_tx.send(Err(StoreError::Data(err.to_string()))).await
                                    }
                                };
                                let _ = sent;
                            }
                        }
                        FirestoreListenEvent::DocumentDelete(_) => {
                            let _ = events_tx.send(Ok(ProfileEvent::Missing)).await;
                        }
                        _ => {}
                    }
                    Ok(())
                }
            })
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        // Shut the listener down once the subscription handle is dropped.
        tokio::spawn(async move {
            let _ = release_rx.await;
            if let Err(err) = listener.shutdown().await {
                tracing::debug!(error = %err, "Profile listener shutdown failed");
            }
        });

        let events = futures_util::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        })
        .boxed();

        Ok(ProfileSubscription::new(events, Some(release_tx)))
    }

    async fn upsert_profile(&self, profile: &UserProfile) -> Result<(), StoreError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&profile.uid)
            .object(profile)
            .execute()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(())
    }

    async fn get_profile(&self, uid: &str) -> Result<Option<UserProfile>, StoreError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(uid)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    async fn assign_team(&self, uid: &str, team_id: &str) -> Result<(), StoreError> {
        let mut profile = self
            .get_profile(uid)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("user {}", uid)))?;
        profile.team_id = Some(team_id.to_string());
        self.upsert_profile(&profile).await
    }
}

#[async_trait]
impl WorkspaceStore for FirestoreStore {
    async fn list_teams(&self) -> Result<Vec<Team>, StoreError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::TEAMS)
            .obj()
            .query()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    async fn get_team(&self, team_id: &str) -> Result<Option<Team>, StoreError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::TEAMS)
            .obj()
            .one(team_id)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    async fn create_team(&self, name: &str) -> Result<Team, StoreError> {
        let team = Team {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            member_ids: Vec::new(),
        };

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::TEAMS)
            .document_id(&team.id)
            .object(&team)
            .execute()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Ok(team)
    }

    async fn add_member(&self, team_id: &str, uid: &str) -> Result<(), StoreError> {
        let mut team = self
            .get_team(team_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("team {}", team_id)))?;

        if team.member_ids.iter().any(|m| m == uid) {
            return Ok(());
        }
        team.member_ids.push(uid.to_string());

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::TEAMS)
            .document_id(&team.id)
            .object(&team)
            .execute()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(())
    }

    async fn team_members(&self, team_id: &str) -> Result<Vec<UserProfile>, StoreError> {
        let team_id = team_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| q.field("teamId").eq(team_id.clone()))
            .obj()
            .query()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    async fn list_meetings(&self, team_id: &str) -> Result<Vec<Meeting>, StoreError> {
        let team_id = team_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::MEETINGS)
            .filter(move |q| q.field("teamId").eq(team_id.clone()))
            .order_by([(
                "createdAt",
                firestore::FirestoreQueryDirection::Descending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    async fn record_meeting(
        &self,
        team_id: &str,
        date: &str,
        raw_notes: &str,
        analysis: Option<MeetingAnalysis>,
    ) -> Result<Meeting, StoreError> {
        let meeting = Meeting {
            id: uuid::Uuid::new_v4().to_string(),
            team_id: team_id.to_string(),
            date: date.to_string(),
            raw_notes: raw_notes.to_string(),
            analysis,
            created_at: chrono::Utc::now().timestamp_millis(),
        };

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::MEETINGS)
            .document_id(&meeting.id)
            .object(&meeting)
            .execute()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Ok(meeting)
    }
}
