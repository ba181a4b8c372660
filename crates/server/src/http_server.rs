use std::{future::Future, sync::Arc};

use anyhow::{Context, Result};
use axum::{
    body::to_bytes,
    extract::{Extension, Request},
    http::{
        header::{ALLOW, CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS},
        HeaderValue, Method, StatusCode,
    },
    response::{IntoResponse, Response},
    routing::any,
    Json, Router,
};
use bytes::Bytes;
use netdev_store::{DeviceInfo, LogStore, StoreError, StoreResult, ValidationError};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;

pub const EMPTY_LOG_PLACEHOLDER: &str = "Лог-файл порожній\n";
pub const ALLOWED_METHODS: &str = "GET, POST, DELETE, PUT, PATCH";

const TEXT_PLAIN_UTF8: &str = "text/plain; charset=utf-8";

#[derive(Clone)]
struct HttpState {
    inner: Arc<HttpStateInner>,
}

struct HttpStateInner {
    store: Arc<LogStore>,
    max_body_bytes: usize,
    validate_batches: bool,
}

impl HttpState {
    fn new(store: Arc<LogStore>, config: &ServerConfig) -> Self {
        Self {
            inner: Arc::new(HttpStateInner {
                store,
                max_body_bytes: config.max_body_bytes,
                validate_batches: config.validate_batches,
            }),
        }
    }

    /// Runs a store operation on the blocking pool; the store lock and file
    /// I/O are synchronous.
    async fn with_store<T, F>(&self, op: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&LogStore) -> StoreResult<T> + Send + 'static,
    {
        let store = Arc::clone(&self.inner.store);
        tokio::task::spawn_blocking(move || op(&store))
            .await
            .map_err(ApiError::internal)?
            .map_err(ApiError::Store)
    }

    fn check_batch(&self, devices: &[DeviceInfo]) -> Result<(), ApiError> {
        if !self.inner.validate_batches {
            return Ok(());
        }

        for (index, device) in devices.iter().enumerate() {
            device.validate().map_err(|err| {
                tracing::debug!("batch element {index} rejected: {err}");
                ApiError::MissingFields(err)
            })?;
        }

        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct StatusMessage {
    status: &'static str,
    message: String,
}

impl StatusMessage {
    fn success(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            status: "success",
            message: message.into(),
        })
    }
}

#[derive(Debug)]
enum ApiError {
    BodyUnreadable(axum::Error),
    MalformedRecord(serde_json::Error),
    MalformedBatch(serde_json::Error),
    MissingFields(ValidationError),
    MethodNotAllowed(Method),
    Store(StoreError),
    Internal(anyhow::Error),
}

impl ApiError {
    fn internal<E: Into<anyhow::Error>>(err: E) -> Self {
        Self::Internal(err.into())
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::BodyUnreadable(_)
            | ApiError::MalformedRecord(_)
            | ApiError::MalformedBatch(_)
            | ApiError::MissingFields(_) => StatusCode::BAD_REQUEST,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Store(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            ApiError::BodyUnreadable(_) => "Помилка читання тіла запиту",
            ApiError::MalformedRecord(_) => "Невірний формат JSON",
            ApiError::MalformedBatch(_) => "Невірний формат JSON (очікується масив об'єктів)",
            ApiError::MissingFields(_) => {
                "Всі поля обов'язкові: device_name, device_type, ip_address, routing_type"
            }
            ApiError::MethodNotAllowed(_) => "Метод не підтримується",
            ApiError::Store(StoreError::Read { .. }) => "Помилка читання лог-файлу",
            ApiError::Store(StoreError::Open { .. }) => "Помилка відкриття лог-файлу",
            ApiError::Store(StoreError::Create { .. }) => "Помилка створення лог-файлу",
            ApiError::Store(StoreError::Write { .. }) => "Помилка запису в лог-файл",
            ApiError::Store(StoreError::Truncate { .. }) => "Помилка очищення лог-файлу",
            ApiError::Store(StoreError::Poisoned) | ApiError::Internal(_) => {
                "Внутрішня помилка сервера"
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Store(err) => tracing::error!("log store failure: {err}"),
            ApiError::Internal(err) => tracing::error!("request handling failed: {:#}", err),
            ApiError::MethodNotAllowed(method) => {
                tracing::warn!("rejected unsupported method {method}")
            }
            ApiError::BodyUnreadable(err) => tracing::debug!("request body unreadable: {err}"),
            ApiError::MalformedRecord(err) | ApiError::MalformedBatch(err) => {
                tracing::debug!("malformed JSON payload: {err}")
            }
            ApiError::MissingFields(err) => tracing::debug!("payload rejected: {err}"),
        }

        let mut response = plain_text(status, format!("{}\n", self.message()));
        response
            .headers_mut()
            .insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
        if matches!(self, ApiError::MethodNotAllowed(_)) {
            response
                .headers_mut()
                .insert(ALLOW, HeaderValue::from_static(ALLOWED_METHODS));
        }
        response
    }
}

fn plain_text(status: StatusCode, body: impl Into<axum::body::Body>) -> Response {
    let mut response = (status, body.into()).into_response();
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN_UTF8));
    response
}

/// Builds the router serving the device log on `/`.
pub fn router(store: Arc<LogStore>, config: &ServerConfig) -> Router {
    let state = HttpState::new(store, config);

    Router::new()
        .route("/", any(handle_request))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
}

/// Serves `router` on an already bound listener until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server encountered an unrecoverable error")
}

/// Opens the log, binds the configured address and serves until Ctrl+C.
pub async fn run_http_server(config: ServerConfig) -> Result<()> {
    let store = LogStore::open(&config.log_file)
        .with_context(|| format!("Failed to prepare log file {}", config.log_file.display()))?;
    let store = Arc::new(store);

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind device log server to {addr}"))?;

    log_banner(&addr, &config);

    serve(listener, router(store, &config), shutdown_signal()).await
}

fn log_banner(addr: &str, config: &ServerConfig) {
    tracing::info!("Device log server listening on http://{addr}/");
    tracing::info!("Log file: {}", config.log_file.display());
    tracing::info!("Available methods:");
    tracing::info!("  GET    / - read the log file");
    tracing::info!("  POST   / - append one device record");
    tracing::info!("  DELETE / - clear the log file");
    tracing::info!("  PUT    / - replace all records");
    tracing::info!("  PATCH  / - append several records");
    if !config.validate_batches {
        tracing::warn!("PUT/PATCH elements are not validated");
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to install Ctrl+C handler: {err}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Received Ctrl+C; shutting down");
}

async fn handle_request(
    Extension(state): Extension<HttpState>,
    request: Request,
) -> Result<Response, ApiError> {
    let method = request.method().clone();
    match method {
        Method::GET => read_log(&state).await,
        Method::POST => {
            let body = read_body(&state, request).await?;
            append_device(&state, &body).await
        }
        Method::DELETE => clear_log(&state).await,
        Method::PUT => {
            let body = read_body(&state, request).await?;
            replace_devices(&state, &body).await
        }
        Method::PATCH => {
            let body = read_body(&state, request).await?;
            append_devices(&state, &body).await
        }
        other => Err(ApiError::MethodNotAllowed(other)),
    }
}

async fn read_body(state: &HttpState, request: Request) -> Result<Bytes, ApiError> {
    to_bytes(request.into_body(), state.inner.max_body_bytes)
        .await
        .map_err(ApiError::BodyUnreadable)
}

// A JSON `null` batch counts as empty.
fn decode_batch(body: &[u8]) -> Result<Vec<DeviceInfo>, ApiError> {
    serde_json::from_slice::<Option<Vec<DeviceInfo>>>(body)
        .map(Option::unwrap_or_default)
        .map_err(ApiError::MalformedBatch)
}

async fn read_log(state: &HttpState) -> Result<Response, ApiError> {
    let content = state.with_store(|store| store.read()).await?;

    if content.is_empty() {
        return Ok(plain_text(StatusCode::OK, EMPTY_LOG_PLACEHOLDER));
    }

    tracing::info!("GET: log file read ({} bytes)", content.len());
    Ok(plain_text(StatusCode::OK, content))
}

async fn append_device(state: &HttpState, body: &[u8]) -> Result<Response, ApiError> {
    let device: DeviceInfo = serde_json::from_slice(body).map_err(ApiError::MalformedRecord)?;
    device.validate().map_err(ApiError::MissingFields)?;

    let record = state
        .with_store(move |store| store.append_one(device))
        .await?;

    tracing::info!("POST: appended record - {record}");
    Ok((
        StatusCode::CREATED,
        StatusMessage::success("Запис додано до лог-файлу"),
    )
        .into_response())
}

async fn clear_log(state: &HttpState) -> Result<Response, ApiError> {
    state.with_store(|store| store.clear()).await?;

    tracing::info!("DELETE: log file cleared");
    Ok(StatusMessage::success("Лог-файл очищено").into_response())
}

async fn replace_devices(state: &HttpState, body: &[u8]) -> Result<Response, ApiError> {
    let devices = decode_batch(body)?;
    state.check_batch(&devices)?;

    let count = state
        .with_store(move |store| store.replace_all(devices))
        .await?;

    tracing::info!("PUT: log file replaced ({count} records)");
    Ok(StatusMessage::success(format!(
        "Лог-файл повністю оновлено, додано {count} записів"
    ))
    .into_response())
}

async fn append_devices(state: &HttpState, body: &[u8]) -> Result<Response, ApiError> {
    let devices = decode_batch(body)?;
    state.check_batch(&devices)?;

    let count = state
        .with_store(move |store| store.append_many(devices))
        .await?;

    tracing::info!("PATCH: appended {count} records");
    Ok(StatusMessage::success(format!("Додано {count} нових записів")).into_response())
}
