// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity provider seam.
//!
//! The session manager only ever talks to [`IdentityProvider`]; the concrete
//! Google adapter lives in [`google`]. Provider failures carry a
//! [`IdentityErrorKind`] tag so that Demo Mode entry is a pattern match,
//! not a substring search over error messages.

pub mod google;

pub use google::GoogleIdentityBroker;

use async_trait::async_trait;
use futures_util::stream::BoxStream;

/// Raw identity payload from the provider. Not authoritative for role or
/// team assignment; see `models::UserProfile`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

/// One event on the authentication-state stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStateEvent {
    SignedOut,
    SignedIn(Identity),
}

/// Failure classification for identity-provider errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityErrorKind {
    /// Provider misconfiguration (bad API key, unauthorized domain,
    /// provider internal error). Triggers Demo Mode entry.
    Config,
    /// Ordinary authentication failure (bad credentials, disabled user).
    Auth,
    /// Transport failure; retryable.
    Network,
}

/// Error from the identity provider, tagged with its classification.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{code}: {message}")]
pub struct IdentityError {
    kind: IdentityErrorKind,
    code: String,
    message: String,
}

impl IdentityError {
    pub fn new(kind: IdentityErrorKind, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
            message: message.into(),
        }
    }

    /// Build an error from a provider code and message, classifying it
    /// against the configured Demo-Mode trigger list.
    pub fn classified(code: impl Into<String>, message: impl Into<String>, demo_codes: &[String]) -> Self {
        let code = code.into();
        let message = message.into();
        let kind = classify(&code, &message, demo_codes);
        Self { kind, code, message }
    }

    pub fn kind(&self) -> IdentityErrorKind {
        self.kind
    }

    pub fn code(&self) -> &str {
        &self.code
    }
}

/// Classify a provider error code/message.
///
/// Codes on the trigger list are configuration-class. Messages mentioning
/// `api-key` or `domain` are also treated as configuration-class (some
/// provider deployments report key/domain problems only in the message).
pub fn classify(code: &str, message: &str, demo_codes: &[String]) -> IdentityErrorKind {
    if demo_codes.iter().any(|c| c == code)
        || message.contains("api-key")
        || message.contains("domain")
    {
        IdentityErrorKind::Config
    } else if code == "auth/network-request-failed" {
        IdentityErrorKind::Network
    } else {
        IdentityErrorKind::Auth
    }
}

/// Abstract identity provider.
///
/// `sign_in` success is delivered through the auth-state stream, not the
/// return value; callers must not mutate session state on `Ok(())`.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Subscribe to authentication-state changes. The stream yields the
    /// current state immediately, then every subsequent change.
    async fn subscribe_auth_state(
        &self,
    ) -> Result<BoxStream<'static, AuthStateEvent>, IdentityError>;

    /// Run the interactive sign-in flow.
    async fn sign_in(&self) -> Result<(), IdentityError>;

    /// Sign the current identity out.
    async fn sign_out(&self) -> Result<(), IdentityError>;
}
