// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory workspace store.
//!
//! Backs Demo Mode (the session must keep working with no external
//! services) and the test suite. Profile subscriptions are fed from a
//! broadcast channel so the session manager sees the same push behavior
//! as with the Firestore listener.

use super::{ProfileEvent, ProfileStore, ProfileSubscription, StoreError, WorkspaceStore};
use crate::models::{Meeting, MeetingAnalysis, Team, UserProfile};
use async_trait::async_trait;
use dashmap::DashMap;
use futures_util::{stream, StreamExt};
use tokio::sync::broadcast;

/// In-memory store.
pub struct MemoryStore {
    profiles: DashMap<String, UserProfile>,
    teams: DashMap<String, Team>,
    meetings: DashMap<String, Meeting>,
    profile_events: broadcast::Sender<(String, ProfileEvent)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (profile_events, _) = broadcast::channel(32);
        Self {
            profiles: DashMap::new(),
            teams: DashMap::new(),
            meetings: DashMap::new(),
            profile_events,
        }
    }

    /// Store pre-seeded with the Demo Mode teams.
    pub fn demo() -> Self {
        let store = Self::new();
        for (id, name) in [
            ("team-alpha", "Alpha Squad (Enterprise)"),
            ("team-beta", "Beta Force (SMB)"),
            ("team-gamma", "Gamma Growth (Partnerships)"),
        ] {
            store.teams.insert(
                id.to_string(),
                Team {
                    id: id.to_string(),
                    name: name.to_string(),
                    member_ids: Vec::new(),
                },
            );
        }
        store
    }

    fn publish(&self, uid: &str, event: ProfileEvent) {
        // No receivers is fine; the send result is irrelevant
        let _ = self.profile_events.send((uid.to_string(), event));
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn subscribe_profile(&self, uid: &str) -> Result<ProfileSubscription, StoreError> {
        let first = match self.profiles.get(uid) {
            Some(profile) => ProfileEvent::Current(profile.value().clone()),
            None => ProfileEvent::Missing,
        };

        let rx = self.profile_events.subscribe();
        let uid = uid.to_string();
        let updates = stream::unfold(rx, move |mut rx| {
            let uid = uid.clone();
            async move {
                loop {
                    match rx.recv().await {
                        Ok((event_uid, event)) if event_uid == uid => {
                            return Some((Ok(event), rx));
                        }
                        Ok(_) => continue,
                        Err(broadcast::error::RecvError::Lagged(_)) => continue,
                        Err(broadcast::error::RecvError::Closed) => return None,
                    }
                }
            }
        });

        let events = stream::iter([Ok(first)]).chain(updates).boxed();
        Ok(ProfileSubscription::new(events, None))
    }

    async fn upsert_profile(&self, profile: &UserProfile) -> Result<(), StoreError> {
        self.profiles
            .insert(profile.uid.clone(), profile.clone());
        self.publish(&profile.uid, ProfileEvent::Current(profile.clone()));
        Ok(())
    }

    async fn get_profile(&self, uid: &str) -> Result<Option<UserProfile>, StoreError> {
        Ok(self.profiles.get(uid).map(|p| p.value().clone()))
    }

    async fn assign_team(&self, uid: &str, team_id: &str) -> Result<(), StoreError> {
        let updated = {
            let mut entry = self
                .profiles
                .get_mut(uid)
                .ok_or_else(|| StoreError::NotFound(format!("user {}", uid)))?;
            entry.team_id = Some(team_id.to_string());
            entry.clone()
        };
        self.publish(uid, ProfileEvent::Current(updated));
        Ok(())
    }
}

#[async_trait]
impl WorkspaceStore for MemoryStore {
    async fn list_teams(&self) -> Result<Vec<Team>, StoreError> {
        let mut teams: Vec<Team> = self.teams.iter().map(|t| t.value().clone()).collect();
        teams.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(teams)
    }

    async fn get_team(&self, team_id: &str) -> Result<Option<Team>, StoreError> {
        Ok(self.teams.get(team_id).map(|t| t.value().clone()))
    }

    async fn create_team(&self, name: &str) -> Result<Team, StoreError> {
        let team = Team {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            member_ids: Vec::new(),
        };
        self.teams.insert(team.id.clone(), team.clone());
        Ok(team)
    }

    async fn add_member(&self, team_id: &str, uid: &str) -> Result<(), StoreError> {
        let mut team = self
            .teams
            .get_mut(team_id)
            .ok_or_else(|| StoreError::NotFound(format!("team {}", team_id)))?;
        if !team.member_ids.iter().any(|m| m == uid) {
            team.member_ids.push(uid.to_string());
        }
        Ok(())
    }

    async fn team_members(&self, team_id: &str) -> Result<Vec<UserProfile>, StoreError> {
        Ok(self
            .profiles
            .iter()
            .filter(|p| p.value().team_id.as_deref() == Some(team_id))
            .map(|p| p.value().clone())
            .collect())
    }

    async fn list_meetings(&self, team_id: &str) -> Result<Vec<Meeting>, StoreError> {
        let mut meetings: Vec<Meeting> = self
            .meetings
            .iter()
            .filter(|m| m.value().team_id == team_id)
            .map(|m| m.value().clone())
            .collect();
        meetings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(meetings)
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
        self.meetings.insert(meeting.id.clone(), meeting.clone());
        Ok(meeting)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;

    fn member(uid: &str, team: Option<&str>) -> UserProfile {
        UserProfile {
            uid: uid.to_string(),
            email: format!("{}@example.com", uid),
            display_name: None,
            role: UserRole::Member,
            team_id: team.map(|t| t.to_string()),
            photo_url: None,
        }
    }

    #[tokio::test]
    async fn test_subscription_sees_missing_then_upsert() {
        let store = MemoryStore::new();
        let mut sub = store.subscribe_profile("u1").await.unwrap();
        assert_eq!(sub.next_event().await.unwrap().unwrap(), ProfileEvent::Missing);

        store.upsert_profile(&member("u1", None)).await.unwrap();
        match sub.next_event().await.unwrap().unwrap() {
            ProfileEvent::Current(p) => assert_eq!(p.uid, "u1"),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_add_member_is_idempotent() {
        let store = MemoryStore::demo();
        store.add_member("team-alpha", "u1").await.unwrap();
        store.add_member("team-alpha", "u1").await.unwrap();
        let team = store.get_team("team-alpha").await.unwrap().unwrap();
        assert_eq!(team.member_ids, vec!["u1"]);
    }

    #[tokio::test]
    async fn test_meetings_ordered_newest_first() {
        let store = MemoryStore::demo();
        let first = store
            .record_meeting("team-alpha", "2026-08-01T10:00:00Z", "first", None)
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = store
            .record_meeting("team-alpha", "2026-08-02T10:00:00Z", "second", None)
            .await
            .unwrap();

        let meetings = store.list_meetings("team-alpha").await.unwrap();
        assert_eq!(meetings[0].id, second.id);
        assert_eq!(meetings[1].id, first.id);
    }
}
