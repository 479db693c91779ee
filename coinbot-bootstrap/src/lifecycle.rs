use std::time::Duration;

use anyhow::{anyhow, Result};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use coinbot_application::AppState;
use coinbot_interfaces_http::build_router;

use crate::context::AppContext;
use crate::gateway_bridge::{spawn_gateway_bridge, GatewayBridge};

pub const SIGNAL_REASON: &str = "signal received";

fn build_router_with_layers(state: AppState) -> Router {
    build_router(state.clone())
        .layer(CorsLayer::permissive())
        .layer(RequestBodyLimitLayer::new(
            usize::try_from(state.config.max_body_bytes).unwrap_or(usize::MAX),
        ))
        .layer(TimeoutLayer::new(Duration::from_secs(
            state.config.request_timeout_seconds,
        )))
        .layer(TraceLayer::new_for_http())
}

/// Serves the config surface and the gateway until a signal arrives or a
/// fatal ledger error stops the process.
pub async fn run(context: AppContext) -> Result<()> {
    let AppContext {
        config,
        state,
        discord,
        workers,
    } = context;
    let shutdown = state.shutdown.clone();

    let app = build_router_with_layers(state.clone());
    let addr: std::net::SocketAddr = state.config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!("listening on {}", addr);

    let server = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown.wait().await;
                })
                .await
        })
    };

    let token = config.discord_token.clone().unwrap_or_default();
    let gateway = spawn_gateway_bridge(GatewayBridge {
        state: state.clone(),
        workers: workers.clone(),
        rest: discord,
        gateway_url: config.gateway_url.clone(),
        token,
        reconnect_delay: Duration::from_secs(config.reconnect_delay_seconds),
    });

    let reason = tokio::select! {
        _ = shutdown_signal() => {
            shutdown.trigger(SIGNAL_REASON);
            shutdown.reason().unwrap_or_else(|| SIGNAL_REASON.to_string())
        }
        reason = shutdown.wait() => reason,
    };
    info!("shutting down: {}", reason);

    workers.close_all().await;
    gateway.abort();
    match server.await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => warn!("http server exited with error: {}", err),
        Err(err) => warn!("http server task failed: {}", err),
    }

    if reason == SIGNAL_REASON {
        Ok(())
    } else {
        error!("stopped on fatal error: {}", reason);
        Err(anyhow!("stopped on fatal error: {}", reason))
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("sigterm handler unavailable: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
