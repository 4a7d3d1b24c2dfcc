//! Auth-session state for the current client user.
//!
//! SYSTEM CONTEXT
//! ==============
//! Owns the authenticated principal (profile, roles, permissions). The
//! navigation guard reads it on every transition; only `login`, `register`,
//! `load_profile`, and `logout` write it.
//!
//! DESIGN
//! ======
//! The principal is a single `Option<Arc<Principal>>`, so identity and
//! permissions are swapped in one write and can never disagree. Writes happen
//! only after the backend call succeeds, so a failed call leaves the previous
//! state untouched. The in-flight counter is released by a drop guard, which
//! also covers a caller abandoning the future mid-request.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use super::permissions::PermissionSet;
use crate::net::api::AuthApi;
use crate::net::error::ApiError;
use crate::net::types::{AuthResponse, LoginRequest, ProfileResponse, RegisterRequest, UserProfile};
use crate::token_store::{TokenStore, TokenStoreError};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Storage(#[from] TokenStoreError),
}

/// The authenticated identity together with what it may do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    pub user: UserProfile,
    pub roles: Vec<String>,
    pub permissions: PermissionSet,
}

impl From<ProfileResponse> for Principal {
    fn from(profile: ProfileResponse) -> Self {
        Self {
            user: profile.user,
            roles: profile.roles,
            permissions: profile.permissions.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Anonymous,
    /// A login or register call is in flight.
    Loading,
    Authenticated,
}

// =============================================================================
// IN-FLIGHT GUARD
// =============================================================================

struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

// =============================================================================
// SESSION STORE
// =============================================================================

pub struct SessionStore {
    api: Arc<dyn AuthApi>,
    tokens: Arc<dyn TokenStore>,
    principal: RwLock<Option<Arc<Principal>>>,
    /// Credential a failed logout could not delete; never revalidated.
    abandoned: RwLock<Option<String>>,
    in_flight: AtomicUsize,
}

impl SessionStore {
    #[must_use]
    pub fn new(api: Arc<dyn AuthApi>, tokens: Arc<dyn TokenStore>) -> Self {
        Self {
            api,
            tokens,
            principal: RwLock::new(None),
            abandoned: RwLock::new(None),
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Log in and replace the current principal.
    ///
    /// # Errors
    ///
    /// Returns the backend or storage error; the prior session is kept.
    pub async fn login(&self, payload: &LoginRequest) -> Result<Arc<Principal>, SessionError> {
        let _loading = InFlight::enter(&self.in_flight);
        let response = self.api.login(payload).await.inspect_err(|e| {
            tracing::info!(email = %payload.email, error = %e, "login rejected");
        })?;
        let principal = self.establish(response)?;
        tracing::info!(user_id = principal.user.id, email = %principal.user.email, "login succeeded");
        Ok(principal)
    }

    /// Register a new account and sign in as it.
    ///
    /// # Errors
    ///
    /// Returns the backend or storage error; the prior session is kept.
    pub async fn register(&self, payload: &RegisterRequest) -> Result<Arc<Principal>, SessionError> {
        let _loading = InFlight::enter(&self.in_flight);
        let response = self.api.register(payload).await.inspect_err(|e| {
            tracing::info!(email = %payload.email, error = %e, "registration rejected");
        })?;
        let principal = self.establish(response)?;
        tracing::info!(user_id = principal.user.id, email = %principal.user.email, "registration succeeded");
        Ok(principal)
    }

    /// Refresh the principal from the stored credential.
    ///
    /// Returns `Ok(None)` without touching the network when no credential is
    /// stored or the stored one was left behind by a failed logout, and
    /// discards the result when the credential changed mid-request.
    ///
    /// # Errors
    ///
    /// Returns the backend error; the prior session is kept.
    pub async fn load_profile(&self) -> Result<Option<Arc<Principal>>, SessionError> {
        let Some(token) = self.tokens.get() else {
            return Ok(None);
        };
        if self.is_abandoned(&token) {
            tracing::debug!("stored credential was logged out; not revalidating");
            return Ok(None);
        }
        let profile = self.api.me().await?;
        if self.tokens.get().as_deref() != Some(token.as_str()) {
            tracing::debug!("credential changed during profile load; discarding result");
            return Ok(None);
        }
        let principal = self.replace(Principal::from(profile));
        tracing::debug!(user_id = principal.user.id, "profile loaded");
        Ok(Some(principal))
    }

    /// Drop the principal and the stored credential. Safe to call repeatedly.
    ///
    /// # Errors
    ///
    /// Returns an error if the credential could not be removed from storage.
    /// The in-memory principal is cleared either way, and the stranded
    /// credential is never used to sign back in.
    pub fn logout(&self) -> Result<(), TokenStoreError> {
        let stored = self.tokens.get();
        let cleared = self.tokens.set(None);
        match &cleared {
            Ok(()) => self.set_abandoned(None),
            Err(e) => {
                tracing::warn!(error = %e, "credential removal failed; ignoring it until next login");
                self.set_abandoned(stored);
            }
        }
        if let Some(previous) = self.write_slot(None) {
            tracing::info!(user_id = previous.user.id, "logged out");
        }
        cleared
    }

    fn is_abandoned(&self, token: &str) -> bool {
        self.abandoned
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_deref()
            == Some(token)
    }

    fn set_abandoned(&self, token: Option<String>) {
        *self.abandoned.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    fn establish(&self, response: AuthResponse) -> Result<Arc<Principal>, SessionError> {
        if response.access_token.is_empty() {
            return Err(ApiError::Decode("auth response carried an empty access_token".to_owned()).into());
        }
        if !response.token_type.eq_ignore_ascii_case("bearer") {
            tracing::warn!(token_type = %response.token_type, "unexpected token type; sending as bearer");
        }
        self.tokens.set(Some(&response.access_token))?;
        self.set_abandoned(None);
        Ok(self.replace(Principal::from(ProfileResponse::from(response))))
    }

    fn replace(&self, principal: Principal) -> Arc<Principal> {
        let principal = Arc::new(principal);
        self.write_slot(Some(Arc::clone(&principal)));
        principal
    }

    fn write_slot(&self, next: Option<Arc<Principal>>) -> Option<Arc<Principal>> {
        let mut slot = self.principal.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *slot, next)
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    #[must_use]
    pub fn principal(&self) -> Option<Arc<Principal>> {
        self.principal
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn user(&self) -> Option<UserProfile> {
        self.principal().map(|p| p.user.clone())
    }

    #[must_use]
    pub fn roles(&self) -> Vec<String> {
        self.principal().map(|p| p.roles.clone()).unwrap_or_default()
    }

    #[must_use]
    pub fn permissions(&self) -> PermissionSet {
        self.principal()
            .map(|p| p.permissions.clone())
            .unwrap_or_default()
    }

    /// False when anonymous; otherwise true for `"*"` or an exact match.
    #[must_use]
    pub fn has_permission(&self, permission: &str) -> bool {
        self.principal()
            .is_some_and(|p| p.permissions.allows(permission))
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.principal().is_some()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        if self.is_loading() {
            SessionPhase::Loading
        } else if self.is_authenticated() {
            SessionPhase::Authenticated
        } else {
            SessionPhase::Anonymous
        }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
