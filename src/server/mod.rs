//! Development server with live reload, on-demand post rendering and
//! periodic regeneration

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
use notify_debouncer_mini::{new_debouncer, notify::RecursiveMode};
use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::cms::{ContentApi, FetchError};
use crate::commands::generate::run_serving;
use crate::content::PostDetail;
use crate::generator::Generator;
use crate::Blog;

/// Live reload script injected into HTML pages
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
        console.log('Live reload disconnected. Attempting to reconnect...');
        setTimeout(function() { location.reload(); }, 1000);
    };
})();
</script>
</body>
"#;

/// Content source shared with blocking render tasks
type SharedApi = Arc<dyn ContentApi + Send + Sync>;

/// Server state
struct ServerState {
    blog: Blog,
    api: SharedApi,
    reload_tx: broadcast::Sender<()>,
    live_reload: bool,
}

/// Start the development server
pub async fn start(blog: &Blog, ip: &str, port: u16, watch: bool, open: bool) -> Result<()> {
    let api: SharedApi = Arc::new(blog.client());

    tracing::info!("Generating static files...");
    run_serving(blog, api.as_ref())?;

    // Create broadcast channel for live reload notifications
    let (reload_tx, _) = broadcast::channel::<()>(16);

    let state = Arc::new(ServerState {
        blog: blog.clone(),
        api,
        reload_tx: reload_tx.clone(),
        live_reload: watch,
    });

    let app = Router::new()
        .route("/__livereload", get(livereload_handler))
        .fallback(fallback_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let url = format!("http://{}:{}", ip, port);
    println!("Server running at {}", url);
    if watch {
        println!("Live reload enabled. Watching for changes...");
    }
    println!("Press Ctrl+C to stop.");

    if open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    if watch {
        let blog = blog.clone();
        let reload_tx = reload_tx.clone();
        tokio::task::spawn_blocking(move || {
            if let Err(e) = watch_and_reload(blog, reload_tx) {
                tracing::error!("File watcher error: {}", e);
            }
        });
    }

    if blog.config.revalidate > 0 {
        let every = Duration::from_secs(blog.config.revalidate);
        tokio::spawn(revalidate_periodically(
            blog.base_dir.clone(),
            every,
            reload_tx,
        ));
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Regenerate the whole site every `every`, picking up new posts
async fn revalidate_periodically(
    base_dir: PathBuf,
    every: Duration,
    reload_tx: broadcast::Sender<()>,
) {
    tracing::info!("Regenerating every {}s", every.as_secs());
    let mut interval = tokio::time::interval(every);
    // The first tick completes immediately; the site was just generated
    interval.tick().await;

    loop {
        interval.tick().await;
        let base_dir = base_dir.clone();
        let result = tokio::task::spawn_blocking(move || {
            let blog = Blog::new(&base_dir)?;
            run_serving(&blog, &blog.client())
        })
        .await;

        match result {
            Ok(Ok(report)) => {
                tracing::info!("Revalidated: {} posts", report.posts);
                let _ = reload_tx.send(());
            }
            Ok(Err(e)) => tracing::warn!("Revalidation failed, keeping previous output: {:#}", e),
            Err(e) => tracing::error!("Revalidation task panicked: {}", e),
        }
    }
}

/// Watch static assets and the config file and regenerate on change
fn watch_and_reload(blog: Blog, reload_tx: broadcast::Sender<()>) -> Result<()> {
    let (tx, rx) = std::sync::mpsc::channel();

    // Create debouncer to avoid multiple rapid rebuilds
    let mut debouncer = new_debouncer(Duration::from_millis(500), tx)?;

    if blog.source_dir.exists() {
        debouncer
            .watcher()
            .watch(&blog.source_dir, RecursiveMode::Recursive)?;
        tracing::debug!("Watching: {:?}", blog.source_dir);
    }

    let config_path = blog.config_path();
    if config_path.exists() {
        debouncer
            .watcher()
            .watch(&config_path, RecursiveMode::NonRecursive)?;
        tracing::debug!("Watching: {:?}", config_path);
    }

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                // Filter out irrelevant events (like .git, .DS_Store, etc.)
                let relevant_events: Vec<_> = events
                    .iter()
                    .filter(|e| {
                        let path_str = e.path.to_string_lossy();
                        !path_str.contains(".git")
                            && !path_str.contains(".DS_Store")
                            && !path_str.ends_with('~')
                    })
                    .collect();

                if relevant_events.is_empty() {
                    continue;
                }

                for event in &relevant_events {
                    tracing::info!("File changed: {}", event.path.display());
                }

                tracing::info!("Regenerating...");
                let result = Blog::new(&blog.base_dir)
                    .and_then(|fresh| run_serving(&fresh, &fresh.client()));
                match result {
                    Ok(_) => {
                        tracing::info!("Regenerated successfully");
                        let _ = reload_tx.send(());
                    }
                    Err(e) => tracing::error!("Generation failed: {:#}", e),
                }
            }
            Ok(Err(e)) => {
                tracing::error!("Watch error: {:?}", e);
            }
            Err(e) => {
                tracing::error!("Channel error: {:?}", e);
                break;
            }
        }
    }

    Ok(())
}

/// WebSocket handler for live reload
async fn livereload_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
) -> impl IntoResponse {
    let reload_rx = state.reload_tx.subscribe();
    ws.on_upgrade(move |socket| handle_livereload_socket(socket, reload_rx))
}

/// Handle WebSocket connection for live reload
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

/// Serve generated files, rendering pages that were not generated yet
async fn fallback_handler(
    State(state): State<Arc<ServerState>>,
    request: Request<Body>,
) -> Response {
    let path = request.uri().path().to_string();
    let public_dir = &state.blog.public_dir;

    let Some(file_path) = resolve_public_path(public_dir, &path) else {
        return (StatusCode::NOT_FOUND, "Not found").into_response();
    };

    if !file_path.exists() {
        if let Some(uid) = post_uid(&path) {
            return render_post_on_demand(&state, uid).await;
        }
        if let Some(step) = listing_step(&path) {
            return render_step_on_demand(&state, step).await;
        }
    }

    let is_html = file_path
        .extension()
        .map(|ext| ext == "html" || ext == "htm")
        .unwrap_or(false);

    if is_html && state.live_reload {
        match tokio::fs::read_to_string(&file_path).await {
            Ok(content) => Html(inject_live_reload(&content)).into_response(),
            Err(_) => (StatusCode::NOT_FOUND, "Not found").into_response(),
        }
    } else {
        let mut service = ServeDir::new(public_dir).append_index_html_on_directories(true);
        match service.try_call(request).await {
            Ok(response) => response.into_response(),
            Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response(),
        }
    }
}

/// Map a request path to a file under `public_dir`; `None` when any segment
/// would step outside it
fn resolve_public_path(public_dir: &Path, path: &str) -> Option<PathBuf> {
    let relative = Path::new(path.trim_start_matches('/'));
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return None;
    }

    let candidate = public_dir.join(relative);
    if candidate.is_dir() {
        Some(candidate.join("index.html"))
    } else {
        Some(candidate)
    }
}

/// Fetch, render and cache a post that is not in the public directory yet
async fn render_post_on_demand(state: &ServerState, uid: String) -> Response {
    let blog = state.blog.clone();
    let api = state.api.clone();
    tracing::info!("Rendering post {:?} on demand", uid);

    let result = tokio::task::spawn_blocking(move || -> Result<Option<String>> {
        match api.get_by_uid(&blog.config.document_type, &uid) {
            Ok(doc) => {
                let generator = Generator::new(&blog, api.as_ref())?;
                Ok(Some(generator.write_post(&PostDetail::from(doc))?))
            }
            Err(FetchError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    })
    .await;

    render_response(state, result)
}

/// Follow the listing up to `step`, retrying a "load more" that failed before
async fn render_step_on_demand(state: &ServerState, step: usize) -> Response {
    let blog = state.blog.clone();
    let api = state.api.clone();
    tracing::info!("Rendering listing step {} on demand", step);

    let result = tokio::task::spawn_blocking(move || -> Result<Option<String>> {
        Generator::new(&blog, api.as_ref())?
            .skip_failed_steps()
            .render_listing_step(step)
    })
    .await;

    render_response(state, result)
}

fn render_response(
    state: &ServerState,
    result: Result<Result<Option<String>>, tokio::task::JoinError>,
) -> Response {
    match result {
        Ok(Ok(Some(html))) if state.live_reload => Html(inject_live_reload(&html)).into_response(),
        Ok(Ok(Some(html))) => Html(html).into_response(),
        Ok(Ok(None)) => (StatusCode::NOT_FOUND, "Not found").into_response(),
        Ok(Err(e)) => {
            tracing::warn!("On-demand render failed: {:#}", e);
            (StatusCode::BAD_GATEWAY, "Content API unavailable").into_response()
        }
        Err(e) => {
            tracing::error!("On-demand render panicked: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
        }
    }
}

/// Listing step from `/page/<n>/` paths; step 1 is the home page
fn listing_step(path: &str) -> Option<usize> {
    let rest = path.strip_prefix("/page/")?;
    let rest = rest.strip_suffix("index.html").unwrap_or(rest);
    rest.trim_end_matches('/')
        .parse::<usize>()
        .ok()
        .filter(|step| *step >= 2)
}

/// Extract the uid from `/post/<uid>/` style paths
fn post_uid(path: &str) -> Option<String> {
    let rest = path.strip_prefix("/post/")?;
    let rest = rest.strip_suffix("index.html").unwrap_or(rest);
    let segment = rest.trim_end_matches('/');
    if segment.is_empty() || segment.contains('/') {
        return None;
    }
    percent_encoding::percent_decode_str(segment)
        .decode_utf8()
        .ok()
        .map(|uid| uid.into_owned())
}

/// Inject live reload script into HTML content
fn inject_live_reload(html: &str) -> String {
    if html.contains("</body>") {
        html.replace("</body>", LIVE_RELOAD_SCRIPT)
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
