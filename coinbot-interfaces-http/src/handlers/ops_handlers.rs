use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;

use coinbot_application::AppState;

use crate::middleware::authorize;

pub async fn health_live(State(state): State<AppState>) -> StatusCode {
    if state.shutdown.is_triggered() {
        return StatusCode::SERVICE_UNAVAILABLE;
    }
    StatusCode::OK
}

pub async fn metrics_prometheus(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if let Err(err) = authorize(&state.config, &headers) {
        return err.into_response();
    }
    let payload = state.metrics.render_prometheus();
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; version=0.0.4; charset=utf-8"),
    );
    (headers, payload).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{TestServer, TOKEN};

    #[tokio::test]
    async fn liveness_reflects_shutdown() {
        let server = TestServer::new().await;
        assert_eq!(health_live(State(server.state.clone())).await, StatusCode::OK);
        server.state.shutdown.trigger("ledger down");
        assert_eq!(
            health_live(State(server.state.clone())).await,
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[tokio::test]
    async fn metrics_need_a_token() {
        let server = TestServer::new().await;
        server.state.metrics.record_reward();

        let response = metrics_prometheus(State(server.state.clone()), HeaderMap::new())
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let mut headers = HeaderMap::new();
        headers.insert(
            "Authorization",
            HeaderValue::from_str(&format!("Bearer {}", TOKEN)).expect("header"),
        );
        let response = metrics_prometheus(State(server.state.clone()), headers)
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).expect("content type"),
            "text/plain; version=0.0.4; charset=utf-8"
        );
    }
}
