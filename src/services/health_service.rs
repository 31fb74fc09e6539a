use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report `ok` or `degraded`, pinging the store so failures show up in the logs.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.store().await {
        Ok(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "store ping failed");
            }
        }
        Err(_) => warn!("no usable store (degraded mode)"),
    }

    if state.is_degraded() {
        HealthResponse::degraded()
    } else {
        HealthResponse::ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, services::testing::memory_state, state::AppState};

    #[tokio::test]
    async fn reports_degraded_without_a_store() {
        let state = AppState::new(AppConfig::default());
        assert_eq!(health_status(&state).await.status, "degraded");

        let state = memory_state().await;
        assert_eq!(health_status(&state).await.status, "ok");
    }
}
