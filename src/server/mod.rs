//! Development server with live reload

use anyhow::Result;
use axum::{
    body::Body,
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    http::{Request, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use notify_debouncer_mini::new_debouncer;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::commands::build::watch_targets;
use crate::Site;

const LIVE_RELOAD_PATH: &str = "/__livereload";

/// Appended to every served HTML page when live reload is on
const LIVE_RELOAD_SCRIPT: &str = r#"
<script>
(function() {
    var ws = new WebSocket('ws://' + location.host + '/__livereload');
    ws.onmessage = function(msg) {
        if (msg.data === 'reload') {
            location.reload();
        }
    };
    ws.onclose = function() {
        setTimeout(function() { location.reload(); }, 1000);
    };
})();
</script>
</body>
"#;

/// How the development server runs
#[derive(Debug, Clone)]
pub struct ServeOptions {
    pub ip: String,
    pub port: u16,
    /// Rebuild on change and push reloads to the browser
    pub live_reload: bool,
    pub open: bool,
}

impl Default for ServeOptions {
    fn default() -> Self {
        Self {
            ip: "localhost".to_string(),
            port: 8000,
            live_reload: true,
            open: false,
        }
    }
}

struct ServerState {
    public_dir: PathBuf,
    reload_tx: broadcast::Sender<()>,
    live_reload: bool,
}

/// Serve the public directory until the process is stopped
pub async fn start(site: &Site, options: &ServeOptions) -> Result<()> {
    let (reload_tx, _) = broadcast::channel::<()>(16);

    let state = Arc::new(ServerState {
        public_dir: site.public_dir.clone(),
        reload_tx: reload_tx.clone(),
        live_reload: options.live_reload,
    });

    let app = Router::new()
        .route(LIVE_RELOAD_PATH, get(livereload_handler))
        .fallback(fallback_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let bind_ip = if options.ip == "localhost" {
        "127.0.0.1"
    } else {
        options.ip.as_str()
    };
    let addr: SocketAddr = format!("{}:{}", bind_ip, options.port).parse()?;
    let url = format!("http://{}:{}", options.ip, options.port);

    if options.live_reload {
        let site = site.clone();
        tokio::task::spawn_blocking(move || {
            if let Err(e) = watch_and_reload(&site, reload_tx) {
                tracing::error!("File watcher error: {:#}", e);
            }
        });
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server running at {}. Press Ctrl+C to stop.", url);

    if options.open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    axum::serve(listener, app).await?;

    Ok(())
}

/// Rebuild on every settled batch of changes, then tell the browsers to reload
fn watch_and_reload(site: &Site, reload_tx: broadcast::Sender<()>) -> Result<()> {
    let (tx, rx) = std::sync::mpsc::channel();
    let mut debouncer = new_debouncer(Duration::from_millis(500), tx)?;

    for (path, mode) in watch_targets(site) {
        debouncer.watcher().watch(&path, mode)?;
        tracing::debug!("Watching: {:?}", path);
    }

    for result in rx {
        let events = match result {
            Ok(events) => events,
            Err(e) => {
                tracing::error!("Watch error: {:?}", e);
                continue;
            }
        };

        let changed: Vec<&Path> = events
            .iter()
            .map(|e| e.path.as_path())
            .filter(|p| is_relevant_change(p, &site.public_dir))
            .collect();
        if changed.is_empty() {
            continue;
        }

        for path in &changed {
            tracing::info!("File changed: {}", path.display());
        }

        match Site::new(&site.base_dir).and_then(|site| site.build()) {
            Ok(_) => {
                let _ = reload_tx.send(());
            }
            Err(e) => tracing::error!("Build failed: {:#}", e),
        }
    }

    Ok(())
}

/// Editor droppings and our own output never trigger a rebuild
fn is_relevant_change(path: &Path, public_dir: &Path) -> bool {
    if path.starts_with(public_dir) {
        return false;
    }
    let path_str = path.to_string_lossy();
    !path_str.contains(".git")
        && !path_str.contains(".DS_Store")
        && !path_str.contains("node_modules")
        && !path_str.ends_with('~')
}

async fn livereload_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
) -> impl IntoResponse {
    let reload_rx = state.reload_tx.subscribe();
    ws.on_upgrade(move |socket| handle_livereload_socket(socket, reload_rx))
}

async fn handle_livereload_socket(mut socket: WebSocket, mut reload_rx: broadcast::Receiver<()>) {
    tracing::debug!("Live reload client connected");

    loop {
        tokio::select! {
            result = reload_rx.recv() => {
                match result {
                    Ok(_) => {
                        if socket.send(Message::Text("reload".to_string())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
        }
    }

    tracing::debug!("Live reload client disconnected");
}

/// Serve HTML with the reload script injected, everything else straight from disk
async fn fallback_handler(
    State(state): State<Arc<ServerState>>,
    request: Request<Body>,
) -> Response {
    let file_path = resolve_path(&state.public_dir, request.uri().path());
    let is_html = file_path
        .extension()
        .map(|ext| ext == "html" || ext == "htm")
        .unwrap_or(false);

    if is_html && state.live_reload {
        return match tokio::fs::read_to_string(&file_path).await {
            Ok(content) => Html(inject_live_reload(&content)).into_response(),
            Err(_) => not_found(&state.public_dir).await,
        };
    }

    let mut service = ServeDir::new(&state.public_dir).append_index_html_on_directories(true);
    match service.try_call(request).await {
        Ok(response) if response.status() == StatusCode::NOT_FOUND => {
            not_found(&state.public_dir).await
        }
        Ok(response) => response.into_response(),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response(),
    }
}

async fn not_found(public_dir: &Path) -> Response {
    match tokio::fs::read_to_string(public_dir.join("404.html")).await {
        Ok(content) => (StatusCode::NOT_FOUND, Html(content)).into_response(),
        Err(_) => (StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}

/// Map a request path onto the public dir; routes resolve to their `index.html`
fn resolve_path(public_dir: &Path, path: &str) -> PathBuf {
    let decoded = percent_encoding::percent_decode_str(path).decode_utf8_lossy();
    let candidate = decoded
        .split('/')
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .fold(public_dir.to_path_buf(), |acc, segment| acc.join(segment));

    if candidate.is_dir() {
        candidate.join("index.html")
    } else if candidate.exists() || candidate == public_dir {
        candidate
    } else {
        // `/intro` for a page written to `/intro/index.html`
        let index = candidate.join("index.html");
        if index.exists() {
            index
        } else {
            candidate
        }
    }
}

fn inject_live_reload(html: &str) -> String {
    if html.contains("</body>") {
        html.replacen("</body>", LIVE_RELOAD_SCRIPT, 1)
    } else {
        format!("{}{}", html, LIVE_RELOAD_SCRIPT)
    }
}

/// Open a URL in the default browser
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/c", "start", url])
            .spawn()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_resolve_path() {
        let dir = tempfile::tempdir().unwrap();
        let public = dir.path();
        fs::create_dir_all(public.join("intro")).unwrap();
        fs::write(public.join("intro/index.html"), "").unwrap();
        fs::write(public.join("routes.json"), "[]").unwrap();

        assert_eq!(resolve_path(public, "/"), public.join("index.html"));
        assert_eq!(
            resolve_path(public, "/intro/"),
            public.join("intro/index.html")
        );
        assert_eq!(
            resolve_path(public, "/intro"),
            public.join("intro/index.html")
        );
        assert_eq!(resolve_path(public, "/routes.json"), public.join("routes.json"));
        assert_eq!(
            resolve_path(public, "/../../etc/passwd"),
            public.join("etc/passwd")
        );
    }

    #[test]
    fn test_inject_live_reload() {
        let html = inject_live_reload("<html><body><p>Hi</p></body></html>");
        assert!(html.contains(LIVE_RELOAD_PATH));
        assert!(html.ends_with("</body>\n</html>"));

        let bare = inject_live_reload("<p>Hi</p>");
        assert!(bare.starts_with("<p>Hi</p>"));
        assert!(bare.contains("new WebSocket"));
    }

    fn state(public_dir: &Path, live_reload: bool) -> Arc<ServerState> {
        let (reload_tx, _) = broadcast::channel(1);
        Arc::new(ServerState {
            public_dir: public_dir.to_path_buf(),
            reload_tx,
            live_reload,
        })
    }

    async fn get_path(state: Arc<ServerState>, path: &str) -> (StatusCode, String) {
        let request = Request::builder().uri(path).body(Body::empty()).unwrap();
        let response = fallback_handler(State(state), request).await;
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_unknown_path_serves_404_page() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("404.html"), "<p>Lost</p>").unwrap();

        for live_reload in [true, false] {
            let (status, body) = get_path(state(dir.path(), live_reload), "/missing/").await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(body, "<p>Lost</p>");
        }

        let (status, body) = get_path(state(dir.path(), true), "/gone.html").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "<p>Lost</p>");
    }

    #[tokio::test]
    async fn test_unknown_path_without_404_page() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = get_path(state(dir.path(), false), "/missing/").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "Not found");
    }

    #[tokio::test]
    async fn test_pages_are_served_with_reload_script() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("intro")).unwrap();
        fs::write(
            dir.path().join("intro/index.html"),
            "<html><body>Intro</body></html>",
        )
        .unwrap();

        let (status, body) = get_path(state(dir.path(), true), "/intro/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Intro"));
        assert!(body.contains(LIVE_RELOAD_PATH));
    }

    #[test]
    fn test_public_dir_changes_are_ignored() {
        let public = Path::new("/site/public");
        assert!(!is_relevant_change(Path::new("/site/public/a/index.html"), public));
        assert!(!is_relevant_change(Path::new("/site/src/.git/HEAD"), public));
        assert!(!is_relevant_change(Path::new("/site/src/a.mdx~"), public));
        assert!(is_relevant_change(Path::new("/site/src/content/a.mdx"), public));
    }
}
