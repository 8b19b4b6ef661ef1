// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google Identity Toolkit adapter.
//!
//! Implements the interactive sign-in flow against the Identity Toolkit
//! REST API for the configured operator account, and publishes the
//! resulting identity on a process-local auth-state stream.

use super::{AuthStateEvent, Identity, IdentityError, IdentityErrorKind, IdentityProvider};
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use serde::Deserialize;
use tokio::sync::watch;

const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Identity provider backed by the Google Identity Toolkit REST API.
pub struct GoogleIdentityBroker {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    operator_email: String,
    operator_password: String,
    demo_codes: Vec<String>,
    auth_state: watch::Sender<AuthStateEvent>,
}

impl GoogleIdentityBroker {
    pub fn new(
        api_key: String,
        operator_email: String,
        operator_password: String,
        demo_codes: Vec<String>,
    ) -> Self {
        let (auth_state, _) = watch::channel(AuthStateEvent::SignedOut);
        Self {
            http: reqwest::Client::new(),
            base_url: IDENTITY_TOOLKIT_URL.to_string(),
            api_key,
            operator_email,
            operator_password,
            demo_codes,
            auth_state,
        }
    }

    /// Override the API endpoint (tests point this at a local server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn network_error(&self, err: reqwest::Error) -> IdentityError {
        IdentityError::new(
            IdentityErrorKind::Network,
            "auth/network-request-failed",
            err.to_string(),
        )
    }

    async fn rest_error(&self, response: reqwest::Response) -> IdentityError {
        let status = response.status();
        let message = match response.json::<RestErrorBody>().await {
            Ok(body) => body.error.message,
            Err(_) => format!("HTTP {}", status),
        };
        let code = rest_error_code(&message);
        IdentityError::classified(code, message, &self.demo_codes)
    }
}

#[async_trait]
impl IdentityProvider for GoogleIdentityBroker {
    async fn subscribe_auth_state(
        &self,
    ) -> Result<BoxStream<'static, AuthStateEvent>, IdentityError> {
        let mut rx = self.auth_state.subscribe();
        // Deliver the current state as the first event
        rx.mark_changed();
        let stream = futures_util::stream::unfold(rx, |mut rx| async move {
            match rx.changed().await {
                Ok(()) => {
                    let event = rx.borrow_and_update().clone();
                    Some((event, rx))
                }
                Err(_) => None,
            }
        });
        Ok(stream.boxed())
    }

    async fn sign_in(&self) -> Result<(), IdentityError> {
        let url = format!(
            "{}/accounts:signInWithPassword?key={}",
            self.base_url, self.api_key
        );

        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({
                "email": self.operator_email,
                "password": self.operator_password,
                "returnSecureToken": true,
            }))
            .send()
            .await
            .map_err(|e| self.network_error(e))?;

        if !response.status().is_success() {
            return Err(self.rest_error(response).await);
        }

        let signed_in: SignInResponse = response
            .json()
            .await
            .map_err(|e| self.network_error(e))?;

        // accounts:lookup carries the photo URL, which signInWithPassword
        // does not
        let identity = match self.lookup(&signed_in.id_token).await {
            Ok(identity) => identity,
            Err(err) => {
                tracing::warn!(error = %err, "Account lookup failed, using sign-in payload");
                Identity {
                    uid: signed_in.local_id,
                    email: signed_in.email,
                    display_name: signed_in.display_name,
                    photo_url: None,
                }
            }
        };

        tracing::info!(uid = %identity.uid, "Signed in");
        self.auth_state
            .send_replace(AuthStateEvent::SignedIn(identity));
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        self.auth_state.send_replace(AuthStateEvent::SignedOut);
        Ok(())
    }
}

impl GoogleIdentityBroker {
    async fn lookup(&self, id_token: &str) -> Result<Identity, IdentityError> {
        let url = format!("{}/accounts:lookup?key={}", self.base_url, self.api_key);

        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "idToken": id_token }))
            .send()
            .await
            .map_err(|e| self.network_error(e))?;

        if !response.status().is_success() {
            return Err(self.rest_error(response).await);
        }

        let body: LookupResponse = response
            .json()
            .await
            .map_err(|e| self.network_error(e))?;

        let account = body.users.into_iter().next().ok_or_else(|| {
            IdentityError::new(
                IdentityErrorKind::Auth,
                "auth/user-not-found",
                "accounts:lookup returned no users",
            )
        })?;

        Ok(Identity {
            uid: account.local_id,
            email: account.email.unwrap_or_default(),
            display_name: account.display_name,
            photo_url: account.photo_url,
        })
    }
}

/// Map an Identity Toolkit REST error message to a canonical `auth/*` code.
fn rest_error_code(message: &str) -> &'static str {
    let head = message.split(':').next().unwrap_or(message).trim();
    if head.starts_with("API_KEY_INVALID") || message.contains("API key not valid") {
        "auth/api-key-not-valid"
    } else if head.starts_with("EMAIL_NOT_FOUND") {
        "auth/user-not-found"
    } else if head.starts_with("INVALID_PASSWORD") || head.starts_with("INVALID_LOGIN_CREDENTIALS")
    {
        "auth/wrong-password"
    } else if head.starts_with("USER_DISABLED") {
        "auth/user-disabled"
    } else if head.starts_with("TOO_MANY_ATTEMPTS_TRY_LATER") {
        "auth/too-many-requests"
    } else if head.starts_with("OPERATION_NOT_ALLOWED") {
        "auth/operation-not-allowed"
    } else if head.starts_with("INTERNAL") {
        "auth/internal-error"
    } else {
        "auth/unknown"
    }
}

#[derive(Deserialize)]
struct RestErrorBody {
    error: RestError,
}

#[derive(Deserialize)]
struct RestError {
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    #[serde(default)]
    email: String,
    id_token: String,
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupAccount>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupAccount {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    photo_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rest_error_code_mapping() {
        assert_eq!(rest_error_code("API_KEY_INVALID"), "auth/api-key-not-valid");
        assert_eq!(
            rest_error_code("API_KEY_INVALID : API key not valid. Please pass a valid API key."),
            "auth/api-key-not-valid"
        );
        assert_eq!(rest_error_code("EMAIL_NOT_FOUND"), "auth/user-not-found");
        assert_eq!(rest_error_code("INVALID_PASSWORD"), "auth/wrong-password");
        assert_eq!(
            rest_error_code("INVALID_LOGIN_CREDENTIALS"),
            "auth/wrong-password"
        );
        assert_eq!(rest_error_code("INTERNAL_ERROR"), "auth/internal-error");
        assert_eq!(rest_error_code("SOMETHING_ELSE"), "auth/unknown");
    }

    #[tokio::test]
    async fn test_stream_yields_current_state_first() {
        let broker = GoogleIdentityBroker::new(
            "key".into(),
            "op@example.com".into(),
            "pw".into(),
            vec![],
        );
        let mut stream = broker.subscribe_auth_state().await.unwrap();
        assert_eq!(stream.next().await, Some(AuthStateEvent::SignedOut));
    }

    #[tokio::test]
    async fn test_sign_out_publishes_signed_out_event() {
        let broker = GoogleIdentityBroker::new(
            "key".into(),
            "op@example.com".into(),
            "pw".into(),
            vec![],
        );
        let mut stream = broker.subscribe_auth_state().await.unwrap();
        assert_eq!(stream.next().await, Some(AuthStateEvent::SignedOut));
        broker.sign_out().await.unwrap();
        assert_eq!(stream.next().await, Some(AuthStateEvent::SignedOut));
    }
}
