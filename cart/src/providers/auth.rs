//! Authentication service boundary.
//!
//! The storefront signs users in against a cookie-session service. The cart
//! does not depend on it; the trait lives here so hosts can wire both behind
//! one environment.

use crate::error::AuthError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Signed-in user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// User id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Whether the email address has been verified.
    pub email_verified: bool,
    /// Avatar URL.
    pub image: Option<String>,
    /// Account creation time.
    pub created_at: DateTime<Utc>,
    /// Last account update.
    pub updated_at: DateTime<Utc>,
}

/// Server-side session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Session id.
    pub id: String,
    /// Owner of the session.
    pub user_id: String,
    /// When the session stops being valid.
    pub expires_at: DateTime<Utc>,
    /// Opaque session token.
    pub token: String,
    /// Client IP at sign-in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    /// Client user agent at sign-in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Session creation time.
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Whether the session has expired at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// User plus session, as returned by sign-in, sign-up and session lookup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    /// The user.
    pub user: User,
    /// Their session.
    pub session: Session,
}

/// Sign-up form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignUpData {
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Password.
    pub password: String,
    /// Avatar URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Sign-in form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInData {
    /// Email address.
    pub email: String,
    /// Password.
    pub password: String,
    /// Ask for a long-lived session.
    #[serde(default)]
    pub remember_me: bool,
}

/// Cookie-session authentication service.
pub trait AuthService: Send + Sync {
    /// The current session, if one is active.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Service`] if the service cannot be reached.
    fn get_session(&self) -> impl Future<Output = Result<Option<AuthResponse>, AuthError>> + Send;

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] if the email or password is wrong.
    fn sign_in(
        &self,
        data: SignInData,
    ) -> impl Future<Output = Result<AuthResponse, AuthError>> + Send;

    /// Register a new account and sign it in.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UserExists`] if the email is already registered.
    fn sign_up(
        &self,
        data: SignUpData,
    ) -> impl Future<Output = Result<AuthResponse, AuthError>> + Send;

    /// End the current session.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NoSession`] if nobody is signed in.
    fn sign_out(&self) -> impl Future<Output = Result<(), AuthError>> + Send;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use storefront_testing::test_time;

    #[test]
    fn session_wire_format_is_camel_case() {
        let session = Session {
            id: "s1".to_string(),
            user_id: "u1".to_string(),
            expires_at: test_time(),
            token: "t".to_string(),
            ip_address: None,
            user_agent: None,
            created_at: test_time(),
        };

        let json = serde_json::to_value(&session).unwrap();

        assert_eq!(json["userId"], "u1");
        assert!(json.get("ipAddress").is_none());
        assert!(session.is_expired(test_time()));
    }

    #[test]
    fn remember_me_defaults_to_false() {
        let data: SignInData =
            serde_json::from_str(r#"{"email": "a@b.c", "password": "pw"}"#).unwrap();
        assert!(!data.remember_me);
    }
}
