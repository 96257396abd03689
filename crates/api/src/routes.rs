/// Event endpoint definitions
pub mod events;
/// Health and version endpoints
pub mod health;
/// Notification endpoint definitions
pub mod notifications;
/// Session endpoint definitions
pub mod sessions;
