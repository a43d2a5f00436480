//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use staff_dashboard_core::ports::{DocumentStore, IdentityProvider, ResearchPublisher};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all
/// handlers. The store handle owns the connection pool; nothing here is
/// request-scoped.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub oauth: Arc<dyn IdentityProvider>,
    pub publisher: Arc<dyn ResearchPublisher>,
    pub config: Arc<Config>,
}
