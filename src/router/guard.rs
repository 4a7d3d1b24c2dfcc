//! Pre-transition navigation guard.
//!
//! ARCHITECTURE
//! ============
//! `before_each` runs for every attempted transition, in this order:
//!
//! 1. Unknown paths redirect to the landing page.
//! 2. Anonymous session with a stored credential: silently load the profile.
//!    Any failure forces logout, so a credential the backend will not vouch
//!    for is never trusted. This step finishes before anything below reads
//!    session state.
//! 3. Auth-only route while anonymous: redirect to login, carrying the
//!    requested path.
//! 4. Login or landing while authenticated: redirect into the app.
//! 5. Missing route permission: redirect to the unauthorized page.
//! 6. Otherwise allow.

#[cfg(test)]
#[path = "guard_test.rs"]
mod guard_test;

use std::sync::Arc;

use super::routes::{
    APP_PATH, LANDING, LANDING_PATH, LOGIN, Location, RETURN_PARAM, Route, RouteTable, UNAUTHORIZED_PATH,
    login_redirect,
};
use crate::state::session::SessionStore;
use crate::token_store::TokenStore;

/// Upper bound on redirects followed by [`NavigationGuard::navigate`].
pub const MAX_REDIRECTS: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    #[error("navigation to {target} exceeded {} redirects", .hops.len())]
    RedirectLoop { target: String, hops: Vec<Redirect> },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RedirectReason {
    NotFound,
    LoginRequired,
    AlreadyAuthenticated,
    MissingPermission { permission: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Redirect {
    pub from: String,
    pub to: String,
    pub reason: RedirectReason,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Navigation {
    Allow(Route),
    Redirect(Redirect),
}

/// Where a navigation finally landed and how it got there.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub full_path: String,
    pub route: Route,
    pub hops: Vec<Redirect>,
}

pub struct NavigationGuard {
    session: Arc<SessionStore>,
    tokens: Arc<dyn TokenStore>,
    routes: RouteTable,
}

impl NavigationGuard {
    #[must_use]
    pub fn new(session: Arc<SessionStore>, tokens: Arc<dyn TokenStore>, routes: RouteTable) -> Self {
        Self { session, tokens, routes }
    }

    #[must_use]
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Decide a single transition to `target`.
    pub async fn before_each(&self, target: &str) -> Navigation {
        let location = Location::parse(target);
        let Some(route) = self.routes.resolve(&location.path) else {
            return redirect(&location, LANDING_PATH.to_owned(), RedirectReason::NotFound);
        };

        self.revalidate_stored_credential().await;
        let authenticated = self.session.is_authenticated();

        if route.requires_auth && !authenticated {
            return redirect(&location, login_redirect(&location.full_path), RedirectReason::LoginRequired);
        }
        if authenticated && (route.is_named(LOGIN) || route.is_named(LANDING)) {
            return redirect(&location, APP_PATH.to_owned(), RedirectReason::AlreadyAuthenticated);
        }
        if let Some(permission) = &route.permission {
            if !self.session.has_permission(permission) {
                tracing::debug!(path = %location.path, %permission, "permission denied");
                return redirect(
                    &location,
                    UNAUTHORIZED_PATH.to_owned(),
                    RedirectReason::MissingPermission { permission: permission.clone() },
                );
            }
        }
        Navigation::Allow(route.clone())
    }

    /// Run the guard repeatedly, following redirects until a route is allowed.
    ///
    /// # Errors
    ///
    /// Returns [`GuardError::RedirectLoop`] after [`MAX_REDIRECTS`] hops.
    pub async fn navigate(&self, target: &str) -> Result<Resolution, GuardError> {
        let mut hops = Vec::new();
        let mut current = target.to_owned();
        loop {
            match self.before_each(&current).await {
                Navigation::Allow(route) => {
                    let full_path = Location::parse(&current).full_path;
                    return Ok(Resolution { full_path, route, hops });
                }
                Navigation::Redirect(hop) => {
                    if hops.len() >= MAX_REDIRECTS {
                        tracing::warn!(%target, hops = hops.len(), "redirect loop");
                        return Err(GuardError::RedirectLoop { target: target.to_owned(), hops });
                    }
                    current.clone_from(&hop.to);
                    hops.push(hop);
                }
            }
        }
    }

    /// Destination after a successful login: the carried return target when
    /// it is a known in-app path, else the app root.
    #[must_use]
    pub fn post_login_target(&self, login_location: &str) -> String {
        let Some(return_to) = Location::parse(login_location).query_param(RETURN_PARAM) else {
            return APP_PATH.to_owned();
        };
        // Only same-origin absolute paths; "//host" would leave the app.
        if !return_to.starts_with('/') || return_to.starts_with("//") {
            return APP_PATH.to_owned();
        }
        let location = Location::parse(&return_to);
        match self.routes.resolve(&location.path) {
            Some(route) if !route.is_named(LOGIN) => location.full_path,
            _ => APP_PATH.to_owned(),
        }
    }

    async fn revalidate_stored_credential(&self) {
        if self.session.is_authenticated() || self.tokens.get().is_none() {
            return;
        }
        if let Err(e) = self.session.load_profile().await {
            tracing::warn!(error = %e, "stored credential rejected; forcing logout");
            if let Err(e) = self.session.logout() {
                tracing::error!(error = %e, "failed to clear rejected credential");
            }
        }
    }
}

fn redirect(from: &Location, to: String, reason: RedirectReason) -> Navigation {
    Navigation::Redirect(Redirect { from: from.full_path.clone(), to, reason })
}
