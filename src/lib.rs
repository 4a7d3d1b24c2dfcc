//! Constellation client session and authorization guard.
//!
//! SYSTEM CONTEXT
//! ==============
//! A marketing-platform client needs to know, on every navigation, whether the
//! caller holds a usable bearer credential, who they are, and what they may do.
//! This crate owns that decision:
//!
//! - [`token_store`] persists the single bearer credential.
//! - [`net`] talks to the backend and normalizes its error envelope.
//! - [`state`] holds the authenticated principal and its permission set.
//! - [`router`] evaluates every route transition against that state.
//!
//! There is no global state. A [`Client`] bundle is built once at startup and
//! handed to whatever drives navigation.

pub mod config;
pub mod net;
pub mod router;
pub mod state;
pub mod token_store;

use std::sync::Arc;

use config::ClientConfig;
use net::api::{ApiClient, AuthApi};
use net::error::ApiError;
use net::health::HealthMonitor;
use router::guard::NavigationGuard;
use router::routes::RouteTable;
use state::session::SessionStore;
use token_store::{FileTokenStore, TokenStore};

/// Every collaborator wired together from one [`ClientConfig`].
///
/// Cloning is cheap; all members share the same credential slot and session.
#[derive(Clone)]
pub struct Client {
    pub tokens: Arc<dyn TokenStore>,
    pub api: Arc<ApiClient>,
    pub session: Arc<SessionStore>,
    pub guard: Arc<NavigationGuard>,
    pub health: Arc<HealthMonitor>,
}

impl Client {
    /// Build the client stack with a durable file-backed credential slot.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        let tokens: Arc<dyn TokenStore> = Arc::new(FileTokenStore::new(config.token_path.clone()));
        Self::with_token_store(config, tokens)
    }

    /// Build the client stack around an already-constructed credential slot.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn with_token_store(config: &ClientConfig, tokens: Arc<dyn TokenStore>) -> Result<Self, ApiError> {
        let api = Arc::new(ApiClient::new(config, Arc::clone(&tokens))?);
        let auth_api: Arc<dyn AuthApi> = api.clone();
        let session = Arc::new(SessionStore::new(auth_api, Arc::clone(&tokens)));
        let guard = Arc::new(NavigationGuard::new(
            Arc::clone(&session),
            Arc::clone(&tokens),
            RouteTable::constellation(),
        ));
        let health = Arc::new(HealthMonitor::new(Arc::clone(&api), config.health_stale_after()));
        Ok(Self { tokens, api, session, guard, health })
    }
}
