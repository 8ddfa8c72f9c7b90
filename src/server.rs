use std::future::Future;
use std::time::Duration;

use axum::Router;
use hyper_util::{
    rt::{TokioExecutor, TokioIo},
    server::{conn::auto::Builder as ConnBuilder, graceful::GracefulShutdown},
    service::TowerToHyperService,
};
use thiserror::Error;
use tokio::{net::TcpListener, task::JoinSet};
use tower_http::normalize_path::NormalizePath;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("in-flight requests did not finish within {0:?}")]
    GraceExpired(Duration),
}

/// Serve `service` on `listener` until `shutdown` resolves.
///
/// Every connection runs in a task owned by this function. Once `shutdown`
/// fires the listener is dropped, idle connections are closed and in-flight
/// requests get up to `grace` to complete. Connections still open after that
/// are aborted, which drops their handlers mid-request.
pub async fn serve_until<F>(
    listener: TcpListener,
    service: NormalizePath<Router>,
    shutdown: F,
    grace: Duration,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send,
{
    let builder = ConnBuilder::new(TokioExecutor::new());
    let graceful = GracefulShutdown::new();
    let mut connections = JoinSet::new();

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            // Stop accepting as soon as shutdown is requested
            biased;

            () = &mut shutdown => break,

            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to accept connection");
                        continue;
                    }
                };

                let hyper_service = TowerToHyperService::new(service.clone());
                let connection = builder
                    .serve_connection(TokioIo::new(stream), hyper_service)
                    .into_owned();
                let connection = graceful.watch(connection);

                connections.spawn(async move {
                    if let Err(e) = connection.await {
                        tracing::debug!(peer = %peer, error = %e, "Connection closed with error");
                    }
                });
            }

            // Reap finished connections
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
        }
    }

    drop(listener);
    tracing::info!(
        grace = ?grace,
        open_connections = connections.len(),
        "Shutdown requested, draining connections"
    );

    let drained = tokio::time::timeout(grace, graceful.shutdown()).await.is_ok();
    if !drained {
        connections.abort_all();
    }
    while connections.join_next().await.is_some() {}

    if drained {
        tracing::info!("Server stopped");
        Ok(())
    } else {
        tracing::warn!(grace = ?grace, "Grace period expired, aborted open connections");
        Err(ServerError::GraceExpired(grace))
    }
}

/// Resolves on SIGINT, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
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
