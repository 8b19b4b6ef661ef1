// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Team model.

use serde::{Deserialize, Serialize};

/// A team of members (collection `teams`).
///
/// `member_ids` mirrors the `team_id` field on member profiles; it is kept
/// for listing and is treated as a set (insertion order irrelevant).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub member_ids: Vec<String>,
}

impl Team {
    /// Invite link members use to join this team.
    pub fn invite_link(&self, frontend_url: &str) -> String {
        format!("{}/#/join/{}", frontend_url, self.id)
    }
}
