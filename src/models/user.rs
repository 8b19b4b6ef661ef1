// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User profile model for storage and API.

use crate::identity::Identity;
use serde::{Deserialize, Serialize};

/// Role of an authenticated principal. Every profile has exactly one role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Member,
}

/// User profile stored in Firestore (collection `users`, keyed by uid).
///
/// This is the authoritative record of role and team assignment, distinct
/// from the raw identity-provider payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Stable identity-provider uid (also the document ID)
    pub uid: String,
    /// Email address
    pub email: String,
    /// Display name, if shared
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Role (admin or member)
    pub role: UserRole,
    /// Assigned team, None until invited (admins may never have one)
    #[serde(default)]
    pub team_id: Option<String>,
    /// Profile picture URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

impl UserProfile {
    /// Default profile synthesized on first sign-in, before any admin or
    /// invitation has touched it.
    pub fn first_sign_in(identity: &Identity) -> Self {
        Self {
            uid: identity.uid.clone(),
            email: identity.email.clone(),
            display_name: Some(
                identity
                    .display_name
                    .clone()
                    .unwrap_or_else(|| "User".to_string()),
            ),
            role: UserRole::Member,
            team_id: None,
            photo_url: identity.photo_url.clone(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}
