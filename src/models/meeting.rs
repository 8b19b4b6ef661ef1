// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Meeting records and their structured analysis.

use serde::{Deserialize, Serialize};

/// One action item from a meeting analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionItem {
    pub task: String,
    pub owner: String,
}

/// Structured annotation of a meeting's raw notes. Entered manually; the
/// store treats it as opaque data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingAnalysis {
    pub summary: String,
    pub action_items: Vec<ActionItem>,
    pub suggestions: String,
}

/// A recorded meeting (collection `meetings`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meeting {
    pub id: String,
    pub team_id: String,
    /// Meeting date, RFC 3339
    pub date: String,
    pub raw_notes: String,
    #[serde(default)]
    pub analysis: Option<MeetingAnalysis>,
    /// Creation time, unix millis (used for newest-first ordering)
    pub created_at: i64,
}
