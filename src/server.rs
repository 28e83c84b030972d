//! HTTP surface of the service.
//!
//! | Route | Handler |
//! |---|---|
//! | `GET /ping` | liveness message |
//! | `GET /` | info message |
//! | `POST /resize` | multipart `image` + `size` [+ `quality`] → [`ImagesResponse`] |
//! | anything else | 404 `{"message": "Route does not exist.", "error": true}` |
//!
//! Resizing is CPU-bound and runs off the async runtime: the handler moves
//! the validated request onto a blocking thread, which hands the sizes to the
//! shared [`Dispatcher`]. If the client goes away before the response is
//! ready, the handler future is dropped and the request's [`CancelToken`]
//! trips, so sizes that have not started are skipped.

use crate::api::{ApiError, ImagesResponse, MessageResponse, PING_MESSAGE, ROOT_MESSAGE};
use crate::cancel::CancelToken;
use crate::config::AkiraConfig;
use crate::dispatch::{DispatchError, Dispatcher};
use crate::imaging::RustEngine;
use crate::request::{RequestError, ResizeForm, ResizeRequest};
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{ConnectInfo, DefaultBodyLimit, Multipart, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// Shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher<RustEngine>,
    pub config: Arc<AkiraConfig>,
}

impl AppState {
    /// Start the worker pool described by `config`.
    pub fn new(config: AkiraConfig) -> Result<Self, ServerError> {
        let dispatcher = Dispatcher::new(RustEngine::new(), config.dispatch_config())?;
        Ok(Self {
            dispatcher,
            config: Arc::new(config),
        })
    }
}

pub fn router(state: AppState) -> Router {
    let body_limit = state.config.server.max_upload_bytes;
    Router::new()
        .route("/ping", get(ping))
        .route("/", get(root))
        .route("/resize", post(resize))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

/// Bind, serve until Ctrl+C or SIGTERM, then drain in-flight requests.
pub async fn serve(config: AkiraConfig) -> Result<(), ServerError> {
    let addr = config.bind_addr();
    let pool_size = config.processing.pool_size;
    let format = config.processing.output_format;
    let state = AppState::new(config)?;

    let listener = TcpListener::bind(&addr).await?;
    info!(addr = %listener.local_addr()?, pool_size, %format, "akira listening");

    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Oyasuminasai!");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to listen for SIGTERM");
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
    info!("shutdown signal received, draining requests");
}

async fn log_request(request: Request, next: Next) -> Response {
    let remote = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "-".to_string());
    info!(method = %request.method(), %remote, uri = %request.uri(), "request");
    next.run(request).await
}

async fn ping() -> Json<MessageResponse> {
    Json(MessageResponse::ok(PING_MESSAGE))
}

async fn root() -> Json<MessageResponse> {
    Json(MessageResponse::ok(ROOT_MESSAGE))
}

async fn not_found() -> ApiError {
    ApiError::not_found()
}

async fn resize(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ImagesResponse>, ApiError> {
    let started = Instant::now();
    let form = match multipart {
        Ok(multipart) => read_form(multipart).await,
        Err(rejection) => {
            debug!(%rejection, "resize request is not multipart");
            ResizeForm::new()
        }
    };

    let request = form
        .validate(state.config.resize.default_quality)
        .inspect_err(|err| {
            if let RequestError::ImageRead(reason) | RequestError::UploadTooLarge(reason) = err {
                error!(%reason, "failed to read uploaded image");
            }
        })?;
    let ResizeRequest {
        image,
        tokens,
        raw_sizes,
        quality,
    } = request;

    let cancel = CancelToken::with_timeout(state.config.request_timeout());
    let guard = cancel.clone().cancel_on_drop();
    let dispatcher = state.dispatcher.clone();
    let results =
        tokio::task::spawn_blocking(move || dispatcher.resize_all(image, tokens, quality, &cancel))
            .await
            .map_err(|err| {
                error!(error = %err, "resize task did not complete");
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong while resizing the image.",
                )
            })?;
    guard.disarm();

    let body = ImagesResponse::from_results(results, state.config.resize.report_failures);
    info!(
        elapsed = ?started.elapsed(),
        sizes = %raw_sizes,
        returned = body.images.len(),
        "request complete"
    );
    Ok(Json(body))
}

fn record_body_error(form: &mut ResizeForm, err: &MultipartError) {
    form.record_body_error(
        err.body_text(),
        err.status() == StatusCode::PAYLOAD_TOO_LARGE,
    );
}

/// Collect the fields `validate` cares about. Unknown fields are ignored.
///
/// Reading stops at the first stream error; the error is kept in the form so
/// that validation reports it instead of a field that was never reached.
async fn read_form(mut multipart: Multipart) -> ResizeForm {
    let mut form = ResizeForm::new();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                warn!(error = %err, "stopped reading multipart body");
                record_body_error(&mut form, &err);
                break;
            }
        };
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        match name.as_str() {
            "image" if !form.has_image() => {
                let start = Instant::now();
                match field.bytes().await {
                    Ok(bytes) => {
                        info!(bytes = bytes.len(), elapsed = ?start.elapsed(), "read image");
                        form.set_image(bytes.to_vec());
                    }
                    Err(err) => {
                        record_body_error(&mut form, &err);
                        break;
                    }
                }
            }
            "size" | "quality" => match field.text().await {
                Ok(text) if name == "size" => form.set_size(text),
                Ok(text) => form.set_quality(text),
                Err(err) => {
                    warn!(field = %name, error = %err, "unreadable form field");
                    record_body_error(&mut form, &err);
                    break;
                }
            },
            _ => {}
        }
    }
    form
}
