use axum::{
    Router,
    routing::{delete, get, post},
};
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route(
            "/api/notifications",
            get(handlers::notifications::list_notifications),
        )
        .route(
            "/api/notifications/unread",
            get(handlers::notifications::unread_notifications),
        )
        .route(
            "/api/notifications/:id/read",
            post(handlers::notifications::mark_notification_read),
        )
        .route(
            "/api/notifications/:id",
            delete(handlers::notifications::delete_notification),
        )
}
