// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Document store seam (profiles, teams, meetings).
//!
//! The session manager depends only on [`ProfileStore`]; the feature routes
//! use the wider [`WorkspaceStore`]. Two implementations exist: Firestore
//! for real sessions and an in-memory store for Demo Mode and tests.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreStore;
pub use memory::MemoryStore;

use crate::models::{Meeting, MeetingAnalysis, Team, UserProfile};
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use tokio::sync::oneshot;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const TEAMS: &str = "teams";
    pub const MEETINGS: &str = "meetings";
}

/// Store errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// Transport failure talking to the backing store.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Document exists but could not be decoded.
    #[error("malformed document: {0}")]
    Data(String),

    #[error("not found: {0}")]
    NotFound(String),
}

/// One event on a profile-document subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileEvent {
    /// Current document contents.
    Current(UserProfile),
    /// The document does not exist.
    Missing,
}

/// Live subscription to a single profile document.
///
/// Dropping the subscription releases the underlying listener; at most one
/// subscription per signed-in uid is held by the session manager.
pub struct ProfileSubscription {
    events: BoxStream<'static, Result<ProfileEvent, StoreError>>,
    _release: Option<oneshot::Sender<()>>,
}

impl ProfileSubscription {
    pub fn new(
        events: BoxStream<'static, Result<ProfileEvent, StoreError>>,
        release: Option<oneshot::Sender<()>>,
    ) -> Self {
        Self {
            events,
            _release: release,
        }
    }

    /// Next subscription event; `None` when the stream has ended.
    pub async fn next_event(&mut self) -> Option<Result<ProfileEvent, StoreError>> {
        self.events.next().await
    }
}

/// Profile document operations required by the session manager.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Subscribe to the profile document for `uid`. The first event
    /// reflects the current state (`Current` or `Missing`).
    async fn subscribe_profile(&self, uid: &str) -> Result<ProfileSubscription, StoreError>;

    /// Create or replace a profile. Idempotent.
    async fn upsert_profile(&self, profile: &UserProfile) -> Result<(), StoreError>;

    /// Point-read a profile.
    async fn get_profile(&self, uid: &str) -> Result<Option<UserProfile>, StoreError>;

    /// Set the team assignment on a profile (invite acceptance).
    async fn assign_team(&self, uid: &str, team_id: &str) -> Result<(), StoreError>;
}

/// Full workspace surface: profiles plus teams and meetings.
#[async_trait]
pub trait WorkspaceStore: ProfileStore {
    async fn list_teams(&self) -> Result<Vec<Team>, StoreError>;

    async fn get_team(&self, team_id: &str) -> Result<Option<Team>, StoreError>;

    async fn create_team(&self, name: &str) -> Result<Team, StoreError>;

    /// Add `uid` to the team's member list. Idempotent.
    async fn add_member(&self, team_id: &str, uid: &str) -> Result<(), StoreError>;

    /// Profiles currently assigned to the team.
    async fn team_members(&self, team_id: &str) -> Result<Vec<UserProfile>, StoreError>;

    /// Meetings for a team, newest first.
    async fn list_meetings(&self, team_id: &str) -> Result<Vec<Meeting>, StoreError>;

    async fn record_meeting(
        &self,
        team_id: &str,
        date: &str,
        raw_notes: &str,
        analysis: Option<MeetingAnalysis>,
    ) -> Result<Meeting, StoreError>;
}
