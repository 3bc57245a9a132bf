//! HTTP server for the browser UI.
//!
//! Every handler is a thin shim over [`Orchestrator`]; state reaches the page
//! as Server-Sent Events carrying the whole [`UiState`](crate::UiState).

mod assets;

pub use assets::{icon_svg, index_html};

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use futures::Stream;
use serde::{Deserialize, Serialize};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::WatchStream;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::orchestrator::Orchestrator;
use crate::request::DownloadForm;

#[derive(Clone)]
struct AppState {
    orchestrator: Orchestrator,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

#[derive(Serialize)]
struct JobResponse {
    job_id: Uuid,
}

#[derive(Serialize)]
struct PauseResponse {
    paused: bool,
}

#[derive(Serialize)]
struct CancelResponse {
    cancelled: bool,
}

#[derive(Deserialize)]
struct FolderRequest {
    folder: String,
}

#[derive(Serialize)]
struct FolderResponse {
    output_folder: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Maps library errors onto HTTP statuses.
struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            ref e if e.is_validation() => StatusCode::BAD_REQUEST,
            Error::Busy => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = axum::Json(ErrorResponse {
            error: self.0.to_string(),
        });
        (status, body).into_response()
    }
}

async fn index_page() -> impl IntoResponse {
    Html(index_html())
}

async fn icon() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "image/svg+xml")], icon_svg())
}

async fn api_health() -> impl IntoResponse {
    axum::Json(HealthResponse {
        status: "ok".to_string(),
    })
}

async fn api_state(State(state): State<AppState>) -> impl IntoResponse {
    axum::Json(state.orchestrator.snapshot())
}

async fn api_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = std::result::Result<Event, axum::Error>>> {
    let stream = WatchStream::new(state.orchestrator.subscribe())
        .map(|ui| Event::default().json_data(&ui));
    Sse::new(stream).keep_alive(KeepAlive::default())
}

async fn api_download(
    State(state): State<AppState>,
    axum::Json(form): axum::Json<DownloadForm>,
) -> std::result::Result<impl IntoResponse, ApiError> {
    let job_id = state.orchestrator.start(form).await?;
    Ok((StatusCode::ACCEPTED, axum::Json(JobResponse { job_id })))
}

async fn api_pause(State(state): State<AppState>) -> impl IntoResponse {
    axum::Json(PauseResponse {
        paused: state.orchestrator.toggle_pause(),
    })
}

async fn api_cancel(State(state): State<AppState>) -> impl IntoResponse {
    axum::Json(CancelResponse {
        cancelled: state.orchestrator.cancel(),
    })
}

async fn api_folder(
    State(state): State<AppState>,
    axum::Json(payload): axum::Json<FolderRequest>,
) -> std::result::Result<impl IntoResponse, ApiError> {
    state.orchestrator.set_output_folder(&payload.folder)?;
    Ok(axum::Json(FolderResponse {
        output_folder: state.orchestrator.output_folder(),
    }))
}

/// Builds the application router.
#[must_use]
pub fn router(orchestrator: Orchestrator) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index_page))
        .route("/icon.svg", get(icon))
        .route("/api/health", get(api_health))
        .route("/api/state", get(api_state))
        .route("/api/events", get(api_events))
        .route("/api/download", post(api_download))
        .route("/api/pause", post(api_pause))
        .route("/api/cancel", post(api_cancel))
        .route("/api/folder", post(api_folder))
        .layer(cors)
        .with_state(AppState { orchestrator })
}

/// Serves the web UI until Ctrl-C.
///
/// A download still running at shutdown is cancelled.
///
/// # Errors
///
/// Returns an error if the server cannot bind to the specified address.
pub async fn run_server(orchestrator: Orchestrator, host: &str, port: u16) -> Result<()> {
    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    let addr = listener.local_addr()?;
    log::info!("Web UI listening on http://{addr}");

    let app = router(orchestrator.clone());
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            log::info!("Shutting down");
        })
        .await?;

    if orchestrator.cancel() {
        orchestrator.wait_idle().await;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::Body;
    use tempfile::TempDir;

    use crate::config::DownloadConfig;
    use crate::control::TransferControl;
    use crate::engine::{DownloadOutcome, Engine};
    use crate::options::EngineConfig;
    use crate::progress::DownloadProgress;
    use crate::request::DownloadMode;
    use crate::stats::TransferStats;

    /// Holds the job until cancelled.
    struct BlockingEngine;

    #[async_trait]
    impl Engine for BlockingEngine {
        async fn download(
            &self,
            _url: &str,
            _config: &EngineConfig,
            _progress: &Arc<dyn DownloadProgress>,
            control: &TransferControl,
        ) -> Result<DownloadOutcome> {
            control.cancelled().await;
            Err(Error::Cancelled)
        }
    }

    /// Finishes immediately.
    struct InstantEngine;

    #[async_trait]
    impl Engine for InstantEngine {
        async fn download(
            &self,
            _url: &str,
            _config: &EngineConfig,
            _progress: &Arc<dyn DownloadProgress>,
            _control: &TransferControl,
        ) -> Result<DownloadOutcome> {
            Ok(DownloadOutcome {
                files: vec![PathBuf::from("downloads/MyVideo.mp4")],
                stats: TransferStats::new(0, Duration::ZERO),
            })
        }
    }

    fn app_state(engine: Arc<dyn Engine>) -> (AppState, TempDir) {
        let dir = TempDir::new().unwrap();
        let config = DownloadConfig::new().with_output_folder(dir.path().to_string_lossy());
        let state = AppState {
            orchestrator: Orchestrator::new(engine, config),
        };
        (state, dir)
    }

    fn best_form() -> DownloadForm {
        DownloadForm {
            url: "https://youtu.be/dQw4w9WgXcQ".to_string(),
            mode: DownloadMode::BestQuality,
            video_quality: None,
            audio_format: None,
            custom_flags: None,
        }
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_ok() {
        let response = api_health().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn download_is_accepted() {
        let (state, _dir) = app_state(Arc::new(InstantEngine));
        let response = api_download(State(state.clone()), axum::Json(best_form()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let job_id = body_json(response).await["job_id"].as_str().unwrap().to_string();

        state.orchestrator.wait_idle().await;
        let snapshot = state.orchestrator.snapshot();
        assert_eq!(snapshot.job.unwrap().id.to_string(), job_id);
    }

    #[tokio::test]
    async fn validation_error_is_bad_request() {
        let (state, _dir) = app_state(Arc::new(InstantEngine));
        let form = DownloadForm {
            mode: DownloadMode::Audio,
            ..best_form()
        };
        let response = api_download(State(state), axum::Json(form))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(
            body_json(response).await["error"]
                .as_str()
                .unwrap()
                .contains("audio format")
        );
    }

    #[tokio::test]
    async fn busy_is_conflict() {
        let (state, _dir) = app_state(Arc::new(BlockingEngine));
        api_download(State(state.clone()), axum::Json(best_form()))
            .await
            .ok()
            .unwrap();

        let response = api_download(State(state.clone()), axum::Json(best_form()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = api_cancel(State(state.clone())).await.into_response();
        assert_eq!(body_json(response).await["cancelled"], true);
        state.orchestrator.wait_idle().await;
    }

    #[tokio::test]
    async fn pause_toggles() {
        let (state, _dir) = app_state(Arc::new(BlockingEngine));
        let response = api_pause(State(state.clone())).await.into_response();
        assert_eq!(body_json(response).await["paused"], false);

        api_download(State(state.clone()), axum::Json(best_form()))
            .await
            .ok()
            .unwrap();
        let response = api_pause(State(state.clone())).await.into_response();
        assert_eq!(body_json(response).await["paused"], true);
        let response = api_pause(State(state.clone())).await.into_response();
        assert_eq!(body_json(response).await["paused"], false);

        state.orchestrator.cancel();
        state.orchestrator.wait_idle().await;
    }

    #[tokio::test]
    async fn folder_updates_session() {
        let (state, dir) = app_state(Arc::new(InstantEngine));
        let folder = dir.path().join("music").to_string_lossy().into_owned();

        let response = api_folder(
            State(state.clone()),
            axum::Json(FolderRequest {
                folder: folder.clone(),
            }),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["output_folder"], folder);

        let response = api_folder(
            State(state),
            axum::Json(FolderRequest {
                folder: String::new(),
            }),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn state_is_json() {
        let (state, _dir) = app_state(Arc::new(InstantEngine));
        let response = api_state(State(state)).await.into_response();
        let json = body_json(response).await;
        assert_eq!(json["phase"], "idle");
        assert_eq!(json["percent"], 0);
    }

    #[tokio::test]
    async fn events_start_with_current_state() {
        let (state, _dir) = app_state(Arc::new(InstantEngine));
        let response = api_events(State(state)).await.into_response();
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/event-stream"
        );

        let mut body = Body::into_data_stream(response.into_body());
        let chunk = tokio::time::timeout(Duration::from_secs(1), body.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        let text = String::from_utf8(chunk.to_vec()).unwrap();
        assert!(text.starts_with("data: {"));
        assert!(text.contains("\"phase\":\"idle\""));
    }

    #[tokio::test]
    async fn index_serves_html() {
        let response = index_page().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let response = icon().await.into_response();
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/svg+xml");
    }

    #[test]
    fn router_builds() {
        let (state, _dir) = app_state(Arc::new(InstantEngine));
        let _router = router(state.orchestrator);
    }
}
