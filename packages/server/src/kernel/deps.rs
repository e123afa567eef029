//! Server dependencies for activities (using traits for testability)
//!
//! Every activity takes `&ServerDeps`; production wires the Postgres store and
//! push notifier, tests wire the in-memory doubles from `test_dependencies`.

use sqlx::PgPool;
use std::sync::Arc;

use crate::common::utils::ExpoClient;
use crate::config::MatchingConfig;
use crate::kernel::{BaseMatchNotifier, BaseMatchStore, PgMatchStore, PushMatchNotifier};

#[derive(Clone)]
pub struct ServerDeps {
    pub store: Arc<dyn BaseMatchStore>,
    pub notifier: Arc<dyn BaseMatchNotifier>,
    pub matching: MatchingConfig,
}

impl ServerDeps {
    pub fn new(
        store: Arc<dyn BaseMatchStore>,
        notifier: Arc<dyn BaseMatchNotifier>,
        matching: MatchingConfig,
    ) -> Self {
        Self {
            store,
            notifier,
            matching,
        }
    }

    /// Production wiring: Postgres persistence, Expo push delivery.
    pub fn postgres(pool: PgPool, expo_access_token: Option<String>, matching: MatchingConfig) -> Self {
        let store: Arc<dyn BaseMatchStore> = Arc::new(PgMatchStore::new(pool));
        let push = Arc::new(ExpoClient::new(expo_access_token));
        let notifier = Arc::new(PushMatchNotifier::new(store.clone(), push));

        Self::new(store, notifier, matching)
    }
}
