//! Application state shared across handlers

use std::sync::Arc;

use domain::alerts::AlertDispatcher;
use domain::postgres::Database;
use domain::sanitary::SanitaryPlanService;
use domain::store::{AlertStore, HorseStore, UserStore};
use domain::users::UserAdministration;

use crate::middleware::JwtVerifier;

/// Everything the API reads and writes
pub trait ApiStore: UserStore + HorseStore + AlertStore + Clone + 'static {}

impl<T> ApiStore for T where T: UserStore + HorseStore + AlertStore + Clone + 'static {}

/// Application state shared across handlers
///
/// Production runs on [`Database`]; handler tests swap in the in-memory store.
#[derive(Clone)]
pub struct AppState<S = Database> {
    pub store: S,
    pub users: Arc<UserAdministration<S>>,
    pub sanitary: Arc<SanitaryPlanService<S>>,
    pub alerts: AlertDispatcher<S>,
    pub jwt: JwtVerifier,
}

impl<S: ApiStore> AppState<S> {
    pub fn new(store: S, jwt: JwtVerifier) -> Self {
        Self {
            users: Arc::new(UserAdministration::new(store.clone())),
            sanitary: Arc::new(SanitaryPlanService::new(store.clone())),
            alerts: AlertDispatcher::new(store.clone()),
            store,
            jwt,
        }
    }
}
