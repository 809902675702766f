mod handlers;
mod router;

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::core::coordinator::Coordinator;
use crate::core::jobs::JobQueue;
use crate::core::store::WorkflowStore;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) store: Arc<WorkflowStore>,
    pub(crate) coordinator: Arc<Coordinator>,
    pub(crate) jobs: Arc<JobQueue>,
}

pub struct ApiServer {
    state: AppState,
    api_host: String,
    api_port: u16,
}

impl ApiServer {
    pub fn new(
        store: Arc<WorkflowStore>,
        coordinator: Arc<Coordinator>,
        jobs: Arc<JobQueue>,
        api_host: String,
        api_port: u16,
    ) -> Self {
        Self {
            state: AppState {
                store,
                coordinator,
                jobs,
            },
            api_host,
            api_port,
        }
    }

    pub async fn serve(self) -> Result<()> {
        let app = router::build_api_router(self.state);
        let addr = format!("{}:{}", self.api_host, self.api_port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        info!("API listening on http://{}", addr);
        axum::serve(listener, app).await?;
        Ok(())
    }
}
