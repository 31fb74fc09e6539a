/// Group chat history and message operations.
pub mod chat_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Venues, pricing and availability.
pub mod field_service;
/// Games, attendance and waitlists.
pub mod game_service;
/// Group membership management.
pub mod group_service;
/// Health check service.
pub mod health_service;
/// In-app notification inbox.
pub mod notification_service;
/// Serialized events pushed to group chat rooms.
pub mod room_events;
/// Storage connection supervisor toggling degraded mode.
pub mod storage_supervisor;
#[cfg(test)]
mod testing;
/// Player registration and caller identification.
pub mod user_service;
/// WebSocket chat sessions.
pub mod websocket_service;
