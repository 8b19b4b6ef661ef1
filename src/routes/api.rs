// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workspace API routes (dashboard, teams, meetings, invites).
//!
//! All routes here sit behind the session gate; handlers re-evaluate the
//! role/team guards on every request.

use crate::error::{AppError, Result};
use crate::middleware::CurrentUser;
use crate::models::{Meeting, MeetingAnalysis, Team, UserProfile};
use crate::session::guards::{dashboard_destination, team_access, DashboardDestination, TeamAccess};
use crate::AppState;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/admin/teams", get(admin_teams).post(create_team))
        .route("/teams/{id}", get(team_workspace))
        .route("/teams/{id}/meetings", get(list_meetings).post(record_meeting))
        .route("/join/{team_id}", get(invite_preview).post(accept_invite))
}

#[derive(Serialize)]
struct AwaitingInvitation {
    status: &'static str,
    message: &'static str,
}

/// Landing route: admins to the overview, members to their workspace,
/// unassigned members to the awaiting-invitation view.
async fn dashboard(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Response {
    match dashboard_destination(&user) {
        DashboardDestination::AdminOverview => Redirect::temporary("/admin/teams").into_response(),
        DashboardDestination::TeamWorkspace(team_id) => {
            Redirect::temporary(&format!("/teams/{}", team_id)).into_response()
        }
        DashboardDestination::AwaitingInvitation => Json(AwaitingInvitation {
            status: "awaiting_invitation",
            message: "Your account is not assigned to a team yet. Ask an admin for an invite link.",
        })
        .into_response(),
    }
}

#[derive(Serialize)]
struct TeamOverview {
    #[serde(flatten)]
    team: Team,
    invite_link: String,
}

/// Admin team overview. Members are sent back to their own landing route.
async fn admin_teams(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Response> {
    if !user.is_admin() {
        return Ok(Redirect::temporary("/dashboard").into_response());
    }

    let teams = state.workspace().list_teams().await?;
    let overview: Vec<TeamOverview> = teams
        .into_iter()
        .map(|team| TeamOverview {
            invite_link: team.invite_link(&state.config.frontend_url),
            team,
        })
        .collect();
    Ok(Json(overview).into_response())
}

#[derive(Deserialize, Validate)]
struct CreateTeamRequest {
    #[validate(length(min = 1, max = 80))]
    name: String,
}

async fn create_team(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<CreateTeamRequest>,
) -> Result<Json<Team>> {
    if !user.is_admin() {
        return Err(AppError::AccessDenied);
    }
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let team = state.workspace().create_team(payload.name.trim()).await?;
    tracing::info!(team_id = %team.id, name = %team.name, "Team created");
    Ok(Json(team))
}

#[derive(Serialize)]
struct TeamWorkspace {
    #[serde(flatten)]
    team: Team,
    members: Vec<UserProfile>,
}

/// Team workspace view, guarded by the team-scoped access check.
async fn team_workspace(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(team_id): Path<String>,
) -> Result<Json<TeamWorkspace>> {
    check_team_access(&user, &team_id)?;

    let store = state.workspace();
    let team = store
        .get_team(&team_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("team {}", team_id)))?;
    let members = store.team_members(&team_id).await?;

    Ok(Json(TeamWorkspace { team, members }))
}

async fn list_meetings(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(team_id): Path<String>,
) -> Result<Json<Vec<Meeting>>> {
    check_team_access(&user, &team_id)?;
    let meetings = state.workspace().list_meetings(&team_id).await?;
    Ok(Json(meetings))
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct RecordMeetingRequest {
    /// Meeting date, RFC 3339; defaults to now
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    #[validate(length(max = 50_000))]
    raw_notes: String,
    #[serde(default)]
    analysis: Option<MeetingAnalysis>,
}

impl RecordMeetingRequest {
    fn is_empty(&self) -> bool {
        let analysis_empty = match &self.analysis {
            None => true,
            Some(a) => {
                a.summary.trim().is_empty()
                    && a.suggestions.trim().is_empty()
                    && a.action_items.iter().all(|i| i.task.trim().is_empty())
            }
        };
        self.raw_notes.trim().is_empty() && analysis_empty
    }
}

async fn record_meeting(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(team_id): Path<String>,
    Json(payload): Json<RecordMeetingRequest>,
) -> Result<Json<Meeting>> {
    check_team_access(&user, &team_id)?;
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    if payload.is_empty() {
        return Err(AppError::BadRequest(
            "meeting needs notes or analysis".to_string(),
        ));
    }

    let date = payload
        .date
        .unwrap_or_else(|| chrono::Utc::now().to_rfc3339());
    let meeting = state
        .workspace()
        .record_meeting(&team_id, &date, &payload.raw_notes, payload.analysis)
        .await?;

    tracing::info!(team_id = %team_id, meeting_id = %meeting.id, "Meeting recorded");
    Ok(Json(meeting))
}

/// Invite preview: the team a join link points at.
async fn invite_preview(
    State(state): State<Arc<AppState>>,
    Path(team_id): Path<String>,
) -> Result<Json<Team>> {
    let team = state
        .workspace()
        .get_team(&team_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Team not found".to_string()))?;
    Ok(Json(team))
}

#[derive(Serialize)]
struct JoinResponse {
    joined: String,
    redirect: String,
}

/// Accept an invitation: assign the caller to the team and mirror the
/// membership on the team document. Both writes are idempotent.
async fn accept_invite(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(team_id): Path<String>,
) -> Result<Json<JoinResponse>> {
    let store = state.workspace();

    store
        .get_team(&team_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Team not found".to_string()))?;

    // The profile may not exist in this store yet (fresh Demo Mode session)
    if store.get_profile(&user.uid).await?.is_none() {
        store.upsert_profile(&user).await?;
    }
    store.assign_team(&user.uid, &team_id).await?;
    store.add_member(&team_id, &user.uid).await?;

    tracing::info!(uid = %user.uid, team_id = %team_id, "Joined team");
    Ok(Json(JoinResponse {
        redirect: format!("/teams/{}", team_id),
        joined: team_id,
    }))
}

fn check_team_access(user: &UserProfile, team_id: &str) -> Result<()> {
    match team_access(user, team_id) {
        TeamAccess::Granted => Ok(()),
        TeamAccess::Denied => Err(AppError::AccessDenied),
    }
}
