use std::{sync::Arc, time::Instant};

use sqlx::PgPool;
use tokio::sync::watch;

use crate::{config::AppConfig, db::ConnectionState};

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<AppConfig>,
    pub db_state: watch::Receiver<ConnectionState>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(db: PgPool, config: Arc<AppConfig>, db_state: watch::Receiver<ConnectionState>) -> Self {
        Self {
            db,
            config,
            db_state,
            started_at: Instant::now(),
        }
    }

    pub fn connection_state(&self) -> ConnectionState {
        *self.db_state.borrow()
    }
}
