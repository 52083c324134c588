//! Mock authentication service.

use crate::error::AuthError;
use crate::providers::{AuthResponse, AuthService, Session, SignInData, SignUpData, User};
use chrono::Duration;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use storefront_core::environment::{Clock, SystemClock};

/// Registered account: the user and their password.
type Account = (User, String);

#[derive(Default)]
struct AuthState {
    accounts: HashMap<String, Account>,
    current: Option<AuthResponse>,
    next_id: u64,
}

/// In-memory authentication service.
///
/// Accounts are keyed by email. One session is active at a time; signing in
/// replaces it. Clones share accounts and session.
#[derive(Clone)]
pub struct MockAuthService {
    state: Arc<Mutex<AuthState>>,
    clock: Arc<dyn Clock>,
}

impl MockAuthService {
    /// Session lifetime in days
    pub const SESSION_TTL_DAYS: i64 = 7;

    /// Create an empty service on the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an empty service on `clock`.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(Mutex::new(AuthState::default())),
            clock,
        }
    }

    /// Number of registered accounts (for testing).
    #[must_use]
    pub fn account_count(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .accounts
            .len()
    }

    fn start_session(&self, state: &mut AuthState, user: User) -> AuthResponse {
        let now = self.clock.now();
        state.next_id += 1;
        let session = Session {
            id: format!("session-{}", state.next_id),
            user_id: user.id.clone(),
            expires_at: now + Duration::days(Self::SESSION_TTL_DAYS),
            token: format!("token-{}", state.next_id),
            ip_address: None,
            user_agent: None,
            created_at: now,
        };
        let response = AuthResponse { user, session };
        state.current = Some(response.clone());
        response
    }
}

impl Default for MockAuthService {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MockAuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockAuthService")
            .field("accounts", &self.account_count())
            .finish_non_exhaustive()
    }
}

impl AuthService for MockAuthService {
    fn get_session(&self) -> impl Future<Output = Result<Option<AuthResponse>, AuthError>> + Send {
        let now = self.clock.now();
        let result = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if state
                .current
                .as_ref()
                .is_some_and(|current| current.session.is_expired(now))
            {
                tracing::debug!("Session expired");
                state.current = None;
            }
            state.current.clone()
        };

        async move { Ok(result) }
    }

    fn sign_in(
        &self,
        data: SignInData,
    ) -> impl Future<Output = Result<AuthResponse, AuthError>> + Send {
        let result = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            match state.accounts.get(&data.email) {
                Some((user, password)) if *password == data.password => {
                    let user = user.clone();
                    Ok(self.start_session(&mut state, user))
                }
                _ => Err(AuthError::InvalidCredentials),
            }
        };

        async move { result }
    }

    fn sign_up(
        &self,
        data: SignUpData,
    ) -> impl Future<Output = Result<AuthResponse, AuthError>> + Send {
        let result = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if state.accounts.contains_key(&data.email) {
                Err(AuthError::UserExists(data.email))
            } else {
                let now = self.clock.now();
                state.next_id += 1;
                let user = User {
                    id: format!("user-{}", state.next_id),
                    name: data.name,
                    email: data.email.clone(),
                    email_verified: false,
                    image: data.image,
                    created_at: now,
                    updated_at: now,
                };
                state
                    .accounts
                    .insert(data.email, (user.clone(), data.password));
                Ok(self.start_session(&mut state, user))
            }
        };

        async move { result }
    }

    fn sign_out(&self) -> impl Future<Output = Result<(), AuthError>> + Send {
        let result = self
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .current
            .take()
            .map(|_| ())
            .ok_or(AuthError::NoSession);

        async move { result }
    }
}
