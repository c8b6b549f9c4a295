mod config;
mod criancas;
mod cultos;
mod estatisticas;
mod presenca;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::{HeaderName, HeaderValue};
use axum::middleware;
use axum::response::Response as AxumResponse;
use axum::{
    Json, Router,
    http::{Method, StatusCode, header},
    routing::{delete, get, put},
};
use chrono::NaiveDateTime;
pub use config::{AppConfig, ConfigError, DEFAULT_CONFIG_PATH, DEFAULT_DB_PATH, DEFAULT_PORT};
pub use estatisticas::average_attendance;
use kidcheck_shared::api::{ErrorBody, HealthDto};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info_span;
use uuid::Uuid;

use crate::storage::{Store, StorageError};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Store,
}

impl AppState {
    pub fn new(config: AppConfig, store: Store) -> Self {
        Self { config, store }
    }
}

#[derive(Clone, Debug)]
struct ReqId(pub String);

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(api_health))
        .route(
            "/criancas",
            get(criancas::api_list_criancas).post(criancas::api_create_crianca),
        )
        .route("/criancas/buscar", get(criancas::api_search_criancas))
        .route(
            "/criancas/{id}",
            get(criancas::api_get_crianca)
                .put(criancas::api_update_crianca)
                .delete(criancas::api_delete_crianca),
        )
        .route(
            "/cultos",
            get(cultos::api_list_cultos).post(cultos::api_create_culto),
        )
        .route(
            "/cultos/{id}",
            get(cultos::api_get_culto)
                .put(cultos::api_update_culto)
                .delete(cultos::api_delete_culto),
        )
        .route(
            "/cultos/{id}/criancas",
            get(presenca::api_list_criancas_in_culto).post(presenca::api_add_crianca_to_culto),
        )
        .route(
            "/cultos/{id}/criancas/{crianca_id}",
            delete(presenca::api_remove_crianca_from_culto),
        )
        .route(
            "/cultos/{id}/criancas/{crianca_id}/checkout",
            put(presenca::api_set_checkout),
        )
        .route("/estatisticas", get(estatisticas::api_estatisticas))
        .method_not_allowed_fallback(method_not_allowed);

    // Trace with request context (method, path, request_id)
    let trace = TraceLayer::new_for_http().make_span_with(|req: &axum::http::Request<_>| {
        let request_id = req
            .extensions()
            .get::<ReqId>()
            .map(|r| r.0.clone())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        info_span!(
            "request",
            method = %req.method(),
            path = %req.uri().path(),
            request_id = %request_id,
        )
    });

    let app = Router::new()
        .route("/healthz", get(health))
        .nest("/api", api)
        .fallback(route_not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .with_state(state.clone())
        .layer(trace)
        .layer(middleware::from_fn(add_security_headers))
        .layer(middleware::from_fn(add_request_id));

    // Optionally add CORS for dev if configured
    if let Some(origin) = &state.config.dev_cors_origin {
        let hv = cors_origin(origin);
        let cors = CorsLayer::new()
            .allow_origin(hv)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE]);
        app.layer(cors)
    } else {
        app
    }
}

async fn health() -> &'static str {
    "ok"
}

async fn api_health() -> Json<HealthDto> {
    Json(HealthDto {
        status: "ok".into(),
        message: "API funcionando".into(),
    })
}

async fn route_not_found() -> AppError {
    AppError::not_found("Rota não encontrada")
}

async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

const FALLBACK_CORS_ORIGIN: &str = "http://localhost:5173";

fn cors_origin(origin: &str) -> HeaderValue {
    HeaderValue::from_str(origin).unwrap_or_else(|e| {
        tracing::warn!(
            origin,
            error = %e,
            fallback = FALLBACK_CORS_ORIGIN,
            "invalid dev_cors_origin; using fallback"
        );
        HeaderValue::from_static(FALLBACK_CORS_ORIGIN)
    })
}

async fn add_request_id(
    mut req: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> AxumResponse {
    let hdr = HeaderName::from_static("x-request-id");
    // Use provided x-request-id if present, else generate
    let rid = req
        .headers()
        .get(&hdr)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    req.extensions_mut().insert(ReqId(rid.clone()));
    let mut resp = next.run(req).await;
    if let Ok(hv) = HeaderValue::from_str(&rid) {
        resp.headers_mut().insert(hdr, hv);
    }
    resp
}

async fn add_security_headers(
    req: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> AxumResponse {
    let path = req.uri().path().to_string();
    let mut resp = next.run(req).await;

    let headers = resp.headers_mut();
    headers.insert(
        HeaderName::from_static("x-content-type-options"),
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        HeaderName::from_static("x-frame-options"),
        HeaderValue::from_static("SAMEORIGIN"),
    );
    headers.insert(
        HeaderName::from_static("referrer-policy"),
        HeaderValue::from_static("no-referrer"),
    );

    // Attendance changes minute to minute during an event; never cache the API
    if path == "/healthz" || path == "/api" || path.starts_with("/api/") {
        headers.insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store, no-cache, must-revalidate, private"),
        );
        headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    }

    resp
}

/// Storage timestamps are naive UTC; the API speaks RFC3339.
fn rfc3339(dt: NaiveDateTime) -> String {
    chrono::DateTime::<chrono::Utc>::from_naive_utc_and_offset(dt, chrono::Utc).to_rfc3339()
}

/// Trims and rejects blank values; `field` is only used for logging.
fn required(field: &'static str, value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        tracing::debug!(field, "missing required field");
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Blank or absent optional text collapses to `None`.
fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    /// Duplicate attendance; reported to clients as 400.
    Conflict(String),
    MethodNotAllowed,
    Internal(String),
}

impl AppError {
    fn bad_request<T: Into<String>>(msg: T) -> Self {
        Self::BadRequest(msg.into())
    }
    fn not_found<T: Into<String>>(msg: T) -> Self {
        Self::NotFound(msg.into())
    }
    fn internal<E: std::fmt::Display>(e: E) -> Self {
        Self::Internal(e.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(entity) => {
                AppError::NotFound(capitalize(&StorageError::NotFound(entity).to_string()))
            }
            StorageError::Conflict(msg) => AppError::Conflict(msg),
            StorageError::InvalidInput(msg) => AppError::BadRequest(msg),
            other => AppError::internal(other),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rej: JsonRejection) -> Self {
        AppError::bad_request(format!("Corpo da requisição inválido: {}", rej.body_text()))
    }
}

impl From<PathRejection> for AppError {
    fn from(rej: PathRejection) -> Self {
        AppError::bad_request(format!("Identificador inválido: {}", rej.body_text()))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rej: QueryRejection) -> Self {
        AppError::bad_request(format!("Parâmetros inválidos: {}", rej.body_text()))
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, msg, kind, detail) = match self {
            AppError::BadRequest(m) => (StatusCode::BAD_REQUEST, m, "bad_request", None),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, m, "not_found", None),
            AppError::Conflict(m) => (StatusCode::BAD_REQUEST, m, "conflict", None),
            AppError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                "Método não permitido".to_string(),
                "method_not_allowed",
                None,
            ),
            // Do not leak internal error details to clients, but log them
            AppError::Internal(m) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Erro interno do servidor".to_string(),
                "internal",
                Some(m),
            ),
        };
        if let Some(detail) = detail {
            tracing::error!(status = %status, kind = kind, message = %msg, detail = %detail, "request failed");
        } else {
            tracing::warn!(status = %status, kind = kind, message = %msg, "request rejected");
        }
        let body = axum::Json(ErrorBody { error: msg });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Entity;
    use axum::response::IntoResponse;

    #[test]
    fn storage_errors_map_to_statuses() {
        let cases = [
            (StorageError::NotFound(Entity::Crianca), StatusCode::NOT_FOUND),
            (
                StorageError::Conflict("duplicada".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                StorageError::InvalidInput("ruim".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                StorageError::Migration("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            let resp = AppError::from(err).into_response();
            assert_eq!(resp.status(), expected);
        }
    }

    #[test]
    fn not_found_message_is_capitalized() {
        match AppError::from(StorageError::NotFound(Entity::Culto)) {
            AppError::NotFound(m) => assert_eq!(m, "Culto não encontrado(a)"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn internal_detail_is_not_exposed() {
        let err = AppError::from(StorageError::Migration("secret table".into()));
        match &err {
            AppError::Internal(detail) => assert!(detail.contains("secret table")),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn method_not_allowed_is_405() {
        let resp = AppError::MethodNotAllowed.into_response();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn invalid_cors_origin_falls_back() {
        assert_eq!(cors_origin("http://igreja.local:8080"), "http://igreja.local:8080");
        assert_eq!(cors_origin("http://bad\norigin"), FALLBACK_CORS_ORIGIN);
    }

    #[test]
    fn required_trims_and_rejects_blank() {
        assert_eq!(required("nome", "  Ana ".into()).as_deref(), Some("Ana"));
        assert_eq!(required("nome", "   ".into()), None);
        assert_eq!(required("nome", String::new()), None);
    }

    #[test]
    fn optional_text_drops_blank() {
        assert_eq!(optional_text(Some("  ".into())), None);
        assert_eq!(optional_text(None), None);
        assert_eq!(optional_text(Some(" glúten ".into())).as_deref(), Some("glúten"));
    }

    #[test]
    fn rfc3339_is_utc() {
        let dt = chrono::NaiveDate::from_ymd_opt(2024, 3, 10)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        assert_eq!(rfc3339(dt), "2024-03-10T09:30:00+00:00");
    }
}
