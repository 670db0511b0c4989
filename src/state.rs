use std::sync::Arc;

use sqlx::postgres::PgPool;

use crate::store::PgStore;
use crate::workflow::{TracingListener, WorkflowEngine};

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<WorkflowEngine<PgStore>>,
}

impl AppState {
    pub fn new(db_pool: PgPool) -> Self {
        let engine = WorkflowEngine::new(PgStore::new(db_pool))
            .with_listener(Arc::new(TracingListener));
        AppState {
            engine: Arc::new(engine),
        }
    }
}
