//! Runfolder endpoints.
//!
//! Every handler recomputes its answer from the file system; the blocking
//! scans run on tokio's blocking pool.

use std::path::PathBuf;

use arteria_core::{RunMetadata, Runfolder, RunfolderError, State as RunfolderState};
use axum::{
    Form, Json, Router,
    extract::{FromRequest, Path, Query, Request, State},
    http::{
        HeaderMap, StatusCode,
        header::{CONTENT_TYPE, HOST},
    },
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::task;
use url::Url;

use crate::{app::AppState, http::error::ApiError};

const API_PREFIX: &str = "/api/1.0";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/version", get(get_version))
        .route("/runfolders", get(list_runfolders))
        .route("/runfolders/next", get(next_runfolder))
        .route("/runfolders/pickup", get(pickup_runfolder))
        .route(
            "/runfolders/path/{*runfolder}",
            get(get_runfolder).post(set_runfolder_state),
        )
}

/// Scheme and host the client used to reach us, for building links.
#[derive(Debug, Clone)]
struct Origin {
    scheme: String,
    host: String,
}

impl Origin {
    fn from_headers(headers: &HeaderMap, fallback_host: &str) -> Self {
        Self {
            scheme: header_str(headers, "x-forwarded-proto")
                .unwrap_or("http")
                .to_string(),
            host: header_str(headers, HOST.as_str())
                .unwrap_or(fallback_host)
                .to_string(),
        }
    }
}

fn header_str<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// JSON representation of a runfolder.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunfolderView {
    /// `file://` URI of the runfolder.
    pub path: String,
    pub host: String,
    /// URL of this runfolder's `path` endpoint.
    pub link: String,
    pub state: RunfolderState,
    pub metadata: RunMetadata,
    pub service_version: String,
}

impl RunfolderView {
    fn build(runfolder: &Runfolder, origin: &Origin) -> Result<Self, RunfolderError> {
        Ok(Self::with_state(runfolder, runfolder.state()?, origin))
    }

    fn with_state(runfolder: &Runfolder, state: RunfolderState, origin: &Origin) -> Self {
        let path = runfolder.path();
        Self {
            path: Url::from_file_path(path)
                .map_or_else(|()| format!("file://{}", path.display()), String::from),
            host: origin.host.clone(),
            link: format!(
                "{}://{}{API_PREFIX}/runfolders/path{}",
                origin.scheme,
                origin.host,
                path.display()
            ),
            state,
            metadata: runfolder.metadata(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RunfolderList {
    pub runfolders: Vec<RunfolderView>,
}

/// Returns the service version.
#[axum::debug_handler]
pub async fn get_version() -> impl IntoResponse {
    Json(json!({ "version": env!("CARGO_PKG_VERSION") }))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    state: Option<String>,
}

/// Lists all runfolders, or those in the state given by `?state=`.
///
/// Runfolders with an unreadable state are left out rather than failing the
/// whole listing.
#[axum::debug_handler]
async fn list_runfolders(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Json<RunfolderList>, ApiError> {
    let filter = query
        .state
        .as_deref()
        .map(str::parse::<RunfolderState>)
        .transpose()?;
    let origin = Origin::from_headers(&headers, &state.hostname);
    let monitor = state.monitor.clone();

    let runfolders = task::spawn_blocking(move || {
        let listed = monitor.list_with_state(filter)?;
        Ok::<_, RunfolderError>(
            listed
                .iter()
                .map(|&(ref runfolder, current)| {
                    RunfolderView::with_state(runfolder, current, &origin)
                })
                .collect::<Vec<_>>(),
        )
    })
    .await??;

    Ok(Json(RunfolderList { runfolders }))
}

/// Returns the first ready runfolder without changing its state, or 204.
#[axum::debug_handler]
async fn next_runfolder(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let origin = Origin::from_headers(&headers, &state.hostname);
    let monitor = state.monitor.clone();

    let view = task::spawn_blocking(move || {
        monitor
            .next_ready()?
            .map(|runfolder| RunfolderView::build(&runfolder, &origin))
            .transpose()
    })
    .await??;

    Ok(view_or_no_content(view))
}

/// Claims the first ready runfolder by setting it to pending, or 204.
///
/// Concurrent pickups are not serialized and may return the same runfolder.
#[axum::debug_handler]
async fn pickup_runfolder(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let origin = Origin::from_headers(&headers, &state.hostname);
    let monitor = state.monitor.clone();

    let view = task::spawn_blocking(move || {
        monitor
            .pickup()?
            .map(|runfolder| RunfolderView::build(&runfolder, &origin))
            .transpose()
    })
    .await??;

    Ok(view_or_no_content(view))
}

fn view_or_no_content(view: Option<RunfolderView>) -> Response {
    match view {
        Some(view) => Json(view).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

/// Returns one runfolder by its absolute path.
#[axum::debug_handler]
async fn get_runfolder(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(runfolder): Path<String>,
) -> Result<Json<RunfolderView>, ApiError> {
    let origin = Origin::from_headers(&headers, &state.hostname);
    let monitor = state.monitor.clone();
    let path = runfolder_path(&runfolder);

    let view = task::spawn_blocking(move || {
        let runfolder = monitor.lookup(&path)?;
        RunfolderView::build(&runfolder, &origin)
    })
    .await??;

    Ok(Json(view))
}

/// Body of a state change, accepted as form data or JSON.
#[derive(Debug, Deserialize)]
pub struct StateUpdate {
    pub state: String,
}

impl<S: Send + Sync> FromRequest<S> for StateUpdate {
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"));
        if is_json {
            let Json(update) = Json::<Self>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(update)
        } else {
            let Form(update) = Form::<Self>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(update)
        }
    }
}

/// Sets the state of one runfolder, e.g. `state=started`.
#[axum::debug_handler]
async fn set_runfolder_state(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(runfolder): Path<String>,
    update: StateUpdate,
) -> Result<Json<RunfolderView>, ApiError> {
    let origin = Origin::from_headers(&headers, &state.hostname);
    let monitor = state.monitor.clone();
    let path = runfolder_path(&runfolder);

    let view = task::spawn_blocking(move || {
        let runfolder = monitor.lookup(&path)?;
        runfolder.set_state_token(&update.state)?;
        RunfolderView::build(&runfolder, &origin)
    })
    .await??;

    Ok(Json(view))
}

/// The captured tail of `/runfolders/path/...` as an absolute path.
fn runfolder_path(capture: &str) -> PathBuf {
    PathBuf::from("/").join(capture.trim_start_matches('/'))
}
