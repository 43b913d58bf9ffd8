//! Read-only static file server rooted at a downloaded artifact.

use axum::extract::{Path as UrlPath, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::Router;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info};

use gh_serve_core::{Result, ServeError};

#[derive(Clone)]
struct SiteState {
    root: Arc<PathBuf>,
}

/// Router serving every path below `root`.
pub fn router(root: PathBuf) -> Router {
    let state = SiteState {
        root: Arc::new(root),
    };
    Router::new()
        .route("/", get(serve_root))
        .route("/{*path}", get(serve_path))
        .with_state(state)
}

/// A bound preview server, ready to run.
pub struct PreviewServer {
    listener: TcpListener,
    root: PathBuf,
}

impl PreviewServer {
    /// Bind `addr` (e.g. `0.0.0.0:8080`) for serving `root`.
    pub async fn bind(addr: &str, root: impl Into<PathBuf>) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServeError::Server(format!("cannot listen on {addr}: {e}")))?;
        Ok(PreviewServer {
            listener,
            root: root.into(),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .map_err(|e| ServeError::Server(e.to_string()))
    }

    /// Serve until Ctrl-C.
    pub async fn run(self) -> Result<()> {
        info!(root = %self.root.display(), addr = ?self.listener.local_addr().ok(), "serving artifact");
        axum::serve(self.listener, router(self.root))
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServeError::Server(e.to_string()))
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down preview server");
    }
}

async fn serve_root(State(state): State<SiteState>) -> Response {
    serve(&state.root, "").await
}

async fn serve_path(State(state): State<SiteState>, UrlPath(path): UrlPath<String>) -> Response {
    serve(&state.root, &path).await
}

/// Map a decoded request path onto `root`; `None` if it would escape it.
pub(crate) fn resolve_request_path(root: &Path, request: &str) -> Option<PathBuf> {
    let mut resolved = root.to_path_buf();
    for component in Path::new(request.trim_start_matches('/')).components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(resolved)
}

async fn serve(root: &Path, request: &str) -> Response {
    debug!(path = %request, "request");
    let Some(path) = resolve_request_path(root, request) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let Ok(metadata) = tokio::fs::metadata(&path).await else {
        return StatusCode::NOT_FOUND.into_response();
    };

    if metadata.is_dir() {
        if !request.is_empty() && !request.ends_with('/') {
            let name = request.rsplit('/').next().unwrap_or(request);
            return Redirect::permanent(&format!("{}/", href_escape(name))).into_response();
        }
        let index = path.join("index.html");
        if tokio::fs::metadata(&index).await.map(|m| m.is_file()).unwrap_or(false) {
            return serve_file(&index).await;
        }
        return directory_listing(&path, request).await;
    }

    // A file addressed like a directory would break relative links.
    if request.ends_with('/') {
        return StatusCode::NOT_FOUND.into_response();
    }

    serve_file(&path).await
}

async fn serve_file(path: &Path) -> Response {
    match tokio::fs::read(path).await {
        Ok(body) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            ([(header::CONTENT_TYPE, mime.to_string())], body).into_response()
        }
        Err(_) => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn directory_listing(dir: &Path, request: &str) -> Response {
    let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let mut names = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        let mut name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false) {
            name.push('/');
        }
        names.push(name);
    }
    names.sort();

    let mut body = format!(
        "<!doctype html>\n<title>/{0}</title>\n<h1>/{0}</h1>\n<pre>\n",
        html_escape(request)
    );
    for name in &names {
        body.push_str(&format!(
            "<a href=\"{}\">{}</a>\n",
            href_escape(name),
            html_escape(name)
        ));
    }
    body.push_str("</pre>\n");
    Html(body).into_response()
}

fn html_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Everything but unreserved characters and `/` is encoded in links.
const HREF_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

fn href_escape(text: &str) -> String {
    utf8_percent_encode(text, HREF_SET).to_string()
}
