use axum::{
    Router,
    routing::{delete, get, post, put},
};
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/api/events", post(handlers::events::create_event))
        .route("/api/events", get(handlers::events::list_events))
        .route("/api/events/mine", get(handlers::events::my_events))
        .route("/api/events/:id", get(handlers::events::get_event))
        .route("/api/events/:id", put(handlers::events::update_event))
        .route("/api/events/:id", delete(handlers::events::delete_event))
        .route(
            "/api/events/:id/register",
            post(handlers::events::register_for_event),
        )
        .route(
            "/api/events/:id/register",
            delete(handlers::events::cancel_registration),
        )
        .route("/api/events/:id/join", post(handlers::events::join_event))
        .route("/api/events/:id/check-in", post(handlers::events::check_in))
        .route(
            "/api/events/:id/attendance",
            get(handlers::events::event_attendance),
        )
}
