use axum::routing::{delete, get, post};
use axum::Router;

use coinbot_application::AppState;

use crate::handlers::{config_handlers, ops_handlers};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/get_slot_machine_config",
            get(config_handlers::get_slot_machine_config),
        )
        .route(
            "/set_slot_machine_config",
            post(config_handlers::set_slot_machine_config),
        )
        .route("/get_bot_config", get(config_handlers::get_bot_config))
        .route("/set_bot_config", post(config_handlers::set_bot_config))
        .route(
            "/delete_checkpoints",
            delete(config_handlers::delete_checkpoints),
        )
        .route("/health/live", get(ops_handlers::health_live))
        .route("/metrics", get(ops_handlers::metrics_prometheus))
        .with_state(state)
}
