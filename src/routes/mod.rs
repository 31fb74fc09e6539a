use axum::Router;

use crate::state::SharedState;

pub mod docs;
pub mod fields;
pub mod games;
pub mod groups;
pub mod health;
pub mod identity;
pub mod messages;
pub mod users;
pub mod websocket;

/// Compose all route trees, wiring in shared state and documentation routes.
///
/// REST routes live under `/api`; the chat socket and the docs sit at the root.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(users::router())
        .merge(groups::router())
        .merge(fields::router())
        .merge(games::router())
        .merge(messages::router());

    let docs_router = docs::router(state.clone());

    Router::new()
        .nest("/api", api_router)
        .merge(websocket::router())
        .merge(docs_router)
        .with_state(state)
}
