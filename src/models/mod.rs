// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models shared by the store, session, and API layers.

pub mod meeting;
pub mod team;
pub mod user;

pub use meeting::{ActionItem, Meeting, MeetingAnalysis};
pub use team::Team;
pub use user::{UserProfile, UserRole};
