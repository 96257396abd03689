use axum::{
    Router,
    routing::{delete, get, post, put},
};
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/api/sessions", post(handlers::sessions::create_session))
        .route("/api/sessions", get(handlers::sessions::list_sessions))
        .route("/api/sessions/:id", put(handlers::sessions::update_session))
        .route(
            "/api/sessions/:id",
            delete(handlers::sessions::delete_session),
        )
        .route(
            "/api/sessions/:id/join",
            post(handlers::sessions::join_session),
        )
}
