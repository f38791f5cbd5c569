//! HTTP surface
//!
//! WebSocket upgrades for the three namespaces plus the static viewer pages:
//!
//! - `GET /ws/{status,display,accept}` upgrade to the relay
//! - `GET /` serves `index.html`
//!
//! Room names may contain `/`, so a plain `GET /ws/...` without an upgrade
//! is still a room page.
//! - `GET /<name>.json` serves a per-tree configuration document
//! - any other `GET` serves `tree.html`, the room viewer

use std::net::SocketAddr;
use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{ConnectInfo, Path, State};
use axum::http::{header, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio::sync::Semaphore;
use tower_http::trace::TraceLayer;

use crate::protocol::Namespace;
use crate::session::SessionContext;

use super::config::ServerConfig;
use super::connection::run_connection;
use super::hub::HubHandle;

/// Shared router state
#[derive(Clone)]
pub(crate) struct AppState {
    hub: HubHandle,
    public_dir: Arc<PathBuf>,
    outbox_capacity: usize,
    connection_semaphore: Option<Arc<Semaphore>>,
}

impl AppState {
    pub(crate) fn new(hub: HubHandle, config: &ServerConfig) -> Self {
        let connection_semaphore = if config.max_connections > 0 {
            Some(Arc::new(Semaphore::new(config.max_connections)))
        } else {
            None
        };

        Self {
            hub,
            public_dir: Arc::new(config.public_dir.clone()),
            outbox_capacity: config.outbox_capacity,
            connection_semaphore,
        }
    }
}

/// Build the application router
pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/ws/:namespace", get(ws_upgrade))
        .fallback(static_page)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn ws_upgrade(
    State(state): State<AppState>,
    Path(namespace): Path<String>,
    ConnectInfo(peer_addr): ConnectInfo<SocketAddr>,
    method: Method,
    uri: Uri,
    ws: Option<WebSocketUpgrade>,
) -> Response {
    let Some(ws) = ws else {
        return serve_static(&state, &method, uri.path()).await;
    };

    let Ok(namespace) = namespace.parse::<Namespace>() else {
        return StatusCode::NOT_FOUND.into_response();
    };

    // Check connection limit
    let permit = match &state.connection_semaphore {
        Some(sem) => match sem.clone().try_acquire_owned() {
            Ok(permit) => Some(permit),
            Err(_) => {
                tracing::warn!(peer = %peer_addr, "Connection rejected: limit reached");
                return StatusCode::SERVICE_UNAVAILABLE.into_response();
            }
        },
        None => None,
    };

    let context = SessionContext::new(state.hub.next_connection_id(), peer_addr, namespace);
    let hub = state.hub.clone();
    let outbox_capacity = state.outbox_capacity;

    ws.on_upgrade(move |socket| async move {
        let _permit = permit;
        run_connection(socket, context, hub, outbox_capacity).await;
    })
}

async fn static_page(State(state): State<AppState>, method: Method, uri: Uri) -> Response {
    serve_static(&state, &method, uri.path()).await
}

async fn serve_static(state: &AppState, method: &Method, path: &str) -> Response {
    if *method != Method::GET && *method != Method::HEAD {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    match static_file_for(path) {
        Some((file, content_type)) => serve_file(&state.public_dir.join(file), content_type).await,
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Map a request path to a file under the public directory
///
/// Returns `None` for JSON paths that could escape the directory.
pub(crate) fn static_file_for(path: &str) -> Option<(String, &'static str)> {
    let trimmed = path.trim_start_matches('/');

    if trimmed.is_empty() {
        return Some(("index.html".into(), "text/html; charset=utf-8"));
    }

    if let Some(name) = trimmed.strip_suffix(".json") {
        if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
            return None;
        }
        return Some((format!("{}.json", name), "application/json"));
    }

    Some(("tree.html".into(), "text/html; charset=utf-8"))
}

async fn serve_file(path: &FsPath, content_type: &'static str) -> Response {
    match tokio::fs::read(path).await {
        Ok(body) => ([(header::CONTENT_TYPE, content_type)], body).into_response(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read static file");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_serves_index() {
        assert_eq!(
            static_file_for("/"),
            Some(("index.html".to_string(), "text/html; charset=utf-8"))
        );
    }

    #[test]
    fn test_json_documents() {
        assert_eq!(
            static_file_for("/robot.json"),
            Some(("robot.json".to_string(), "application/json"))
        );
        assert_eq!(static_file_for("/../secret.json"), None);
        assert_eq!(static_file_for("/a/b.json"), None);
        assert_eq!(static_file_for("/.json"), None);
    }

    #[test]
    fn test_everything_else_is_the_room_page() {
        for path in ["/treeA", "/host-bin/agent", "/favicon.ico", "/ws/status"] {
            assert_eq!(
                static_file_for(path),
                Some(("tree.html".to_string(), "text/html; charset=utf-8"))
            );
        }
    }
}
