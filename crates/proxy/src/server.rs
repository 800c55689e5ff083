//! HTTP surface: `GET /{*path}?mode=&width=&height=`

use crate::config::ProxyConfig;
use crate::error::{ProxyError, ServeError};
use crate::fetch::HttpFetcher;
use crate::pipeline::Pipeline;
use crate::request::{RequestDescriptor, TransformQuery};
use axum::Router;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Router with the image route and request tracing.
pub fn router(pipeline: Arc<Pipeline>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/{*path}", get(object_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(pipeline)
}

async fn root_handler(
    State(pipeline): State<Arc<Pipeline>>,
    query: Result<Query<TransformQuery>, QueryRejection>,
) -> Response {
    serve_object(&pipeline, String::new(), query).await
}

async fn object_handler(
    State(pipeline): State<Arc<Pipeline>>,
    Path(path): Path<String>,
    query: Result<Query<TransformQuery>, QueryRejection>,
) -> Response {
    serve_object(&pipeline, path, query).await
}

async fn serve_object(
    pipeline: &Pipeline,
    path: String,
    query: Result<Query<TransformQuery>, QueryRejection>,
) -> Response {
    let started = Instant::now();

    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => {
            let err = ProxyError::InvalidQuery(rejection.body_text());
            warn!(%path, error = %err, "Rejected query");
            return err.into_response();
        }
    };

    let request = RequestDescriptor::new(path, query);
    let mode = request.mode.as_deref().unwrap_or("-");

    match pipeline.handle(&request).await {
        Ok(result) => {
            info!(
                path = %request.path,
                mode,
                outcome = result.outcome.as_str(),
                content_type = %result.content_type,
                bytes = result.bytes.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Served image"
            );
            ([(CONTENT_TYPE, result.content_type)], result.bytes).into_response()
        }
        Err(err) => {
            warn!(
                path = %request.path,
                mode,
                kind = err.kind(),
                status = err.status().as_u16(),
                error = %err,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Request failed"
            );
            err.into_response()
        }
    }
}

/// Bind the configured address and serve until `shutdown` resolves.
pub async fn serve<F>(config: ProxyConfig, shutdown: F) -> Result<(), ServeError>
where
    F: Future<Output = ()> + Send + 'static,
{
    config.validate()?;

    let fetcher = Arc::new(HttpFetcher::new(&config.storage)?);
    let pipeline = Arc::new(Pipeline::new(&config, fetcher));

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| ServeError::Bind {
            addr: addr.clone(),
            source,
        })?;

    serve_on(listener, pipeline, shutdown).await
}

/// Serve on an already bound listener.
pub async fn serve_on<F>(
    listener: TcpListener,
    pipeline: Arc<Pipeline>,
    shutdown: F,
) -> Result<(), ServeError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let local = listener.local_addr()?;
    info!(
        addr = %local,
        storage = pipeline.storage_base(),
        "pixfront listening"
    );

    axum::serve(listener, router(pipeline))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("pixfront stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
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
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}
