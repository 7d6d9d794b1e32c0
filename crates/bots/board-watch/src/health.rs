//! Always-on HTTP endpoint for the hosting platform's liveness probe.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use snafu::Snafu;
use tokio::net::{TcpListener, TcpSocket};
use tokio::signal;
use tracing::{info, warn};

use crate::status::{StatusReport, StatusSource};

const LOG_TARGET: &str = "board_watch::health";

pub const ALIVE: &str = "alive";

#[derive(Debug, Snafu)]
pub enum HealthServerError {
    #[snafu(transparent)]
    Io { source: io::Error },
}

pub type HealthServerResult<T> = std::result::Result<T, HealthServerError>;

type SharedState = Arc<StatusSource>;

pub struct HealthServer {
    listener: TcpListener,
    state: SharedState,
}

impl HealthServer {
    pub async fn bind(addr: SocketAddr, status: StatusSource) -> HealthServerResult<Self> {
        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()?
        } else {
            TcpSocket::new_v6()?
        };
        #[cfg(unix)]
        socket.set_reuseaddr(true)?;
        socket.set_nodelay(true)?;
        socket.bind(addr)?;
        let listener = socket.listen(1024)?;

        info!(target: LOG_TARGET, addr = %listener.local_addr()?, "Health endpoint listening");
        Ok(Self {
            listener,
            state: Arc::new(status),
        })
    }

    pub fn addr(&self) -> HealthServerResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub async fn run(self) -> HealthServerResult<()> {
        axum::serve(self.listener, router(self.state))
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(alive))
        .route("/status", get(status))
        .with_state(state)
}

async fn alive() -> &'static str {
    ALIVE
}

async fn status(State(state): State<SharedState>) -> Json<StatusReport> {
    Json(state.report())
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(target: LOG_TARGET, %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                warn!(target: LOG_TARGET, %err, "Failed to install SIGTERM handler");
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
    info!(target: LOG_TARGET, "Shutdown signal received");
}
