// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Route guards: pure functions of session state.
//!
//! These make no calls and cache nothing; callers re-evaluate them on
//! every request/navigation.

use super::SessionSnapshot;
use crate::models::{UserProfile, UserRole};

/// Outcome of the protected-route gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteGate {
    /// Initial resolution still in flight; render a placeholder only.
    Loading,
    /// No authenticated user; redirect to the sign-in entry point.
    SignInRequired,
    Allow,
}

/// Gate for any protected surface. Gated content is never reachable while
/// `loading` is set, even if a user is already present.
pub fn route_gate(snapshot: &SessionSnapshot) -> RouteGate {
    if snapshot.loading {
        RouteGate::Loading
    } else if snapshot.user.is_none() {
        RouteGate::SignInRequired
    } else {
        RouteGate::Allow
    }
}

/// Landing destination for an authenticated user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardDestination {
    /// Admins land on the team-overview surface.
    AdminOverview,
    /// Members with a team go straight to their workspace.
    TeamWorkspace(String),
    /// Members without a team wait for an invitation; terminal until an
    /// admin intervenes.
    AwaitingInvitation,
}

pub fn dashboard_destination(user: &UserProfile) -> DashboardDestination {
    match (user.role, &user.team_id) {
        (UserRole::Admin, _) => DashboardDestination::AdminOverview,
        (UserRole::Member, Some(team_id)) => {
            DashboardDestination::TeamWorkspace(team_id.clone())
        }
        (UserRole::Member, None) => DashboardDestination::AwaitingInvitation,
    }
}

/// Team-scoped access decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamAccess {
    Granted,
    Denied,
}

/// Members may only enter their own team's workspace; admins are never
/// denied here.
pub fn team_access(user: &UserProfile, team_id: &str) -> TeamAccess {
    match user.role {
        UserRole::Admin => TeamAccess::Granted,
        UserRole::Member if user.team_id.as_deref() == Some(team_id) => TeamAccess::Granted,
        UserRole::Member => TeamAccess::Denied,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(role: UserRole, team_id: Option<&str>) -> UserProfile {
        UserProfile {
            uid: "u1".to_string(),
            email: "u1@example.com".to_string(),
            display_name: None,
            role,
            team_id: team_id.map(|t| t.to_string()),
            photo_url: None,
        }
    }

    #[test]
    fn test_gate_blocks_while_loading_even_with_user() {
        let snapshot = SessionSnapshot {
            user: Some(profile(UserRole::Member, Some("t1"))),
            loading: true,
            is_demo: false,
        };
        assert_eq!(route_gate(&snapshot), RouteGate::Loading);
    }

    #[test]
    fn test_gate_redirects_without_user() {
        let snapshot = SessionSnapshot {
            user: None,
            loading: false,
            is_demo: false,
        };
        assert_eq!(route_gate(&snapshot), RouteGate::SignInRequired);
    }

    #[test]
    fn test_gate_allows_resolved_user() {
        let snapshot = SessionSnapshot {
            user: Some(profile(UserRole::Member, None)),
            loading: false,
            is_demo: false,
        };
        assert_eq!(route_gate(&snapshot), RouteGate::Allow);
    }

    #[test]
    fn test_dashboard_destination_per_role() {
        assert_eq!(
            dashboard_destination(&profile(UserRole::Admin, None)),
            DashboardDestination::AdminOverview
        );
        assert_eq!(
            dashboard_destination(&profile(UserRole::Admin, Some("t9"))),
            DashboardDestination::AdminOverview
        );
        assert_eq!(
            dashboard_destination(&profile(UserRole::Member, Some("t1"))),
            DashboardDestination::TeamWorkspace("t1".to_string())
        );
        assert_eq!(
            dashboard_destination(&profile(UserRole::Member, None)),
            DashboardDestination::AwaitingInvitation
        );
    }

    #[test]
    fn test_team_access() {
        let member = profile(UserRole::Member, Some("t1"));
        assert_eq!(team_access(&member, "t1"), TeamAccess::Granted);
        assert_eq!(team_access(&member, "t2"), TeamAccess::Denied);

        let unassigned = profile(UserRole::Member, None);
        assert_eq!(team_access(&unassigned, "t1"), TeamAccess::Denied);

        let admin = profile(UserRole::Admin, None);
        assert_eq!(team_access(&admin, "t1"), TeamAccess::Granted);
        assert_eq!(team_access(&admin, "t2"), TeamAccess::Granted);
    }
}
