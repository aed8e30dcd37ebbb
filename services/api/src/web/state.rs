//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use opencourse_core::ports::{
    AuthStore, CatalogStore, CompletionStore, FileStorage, SubscriptionService,
};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all
/// handlers. The admin allow-list travels inside `config`; nothing here is
/// mutable after startup.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<dyn AuthStore>,
    pub catalog: Arc<dyn CatalogStore>,
    pub completions: Arc<dyn CompletionStore>,
    pub subscription: Arc<dyn SubscriptionService>,
    pub storage: Arc<dyn FileStorage>,
    pub config: Arc<Config>,
}
