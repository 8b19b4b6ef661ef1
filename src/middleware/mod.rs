// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules (session gate, security headers).

pub mod security;
pub mod session_gate;

pub use session_gate::{require_session, CurrentUser};
