pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::cv::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/v1/cvs",
            post(handlers::handle_create_cv).get(handlers::handle_list_cvs),
        )
        .route(
            "/api/v1/cvs/:id",
            get(handlers::handle_get_cv)
                .patch(handlers::handle_update_cv)
                .delete(handlers::handle_delete_cv),
        )
        .with_state(state)
}
