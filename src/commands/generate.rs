//! Generate static files

use anyhow::Result;
use notify::Watcher;
use std::sync::mpsc::channel;
use std::time::Duration;

use crate::cms::ContentApi;
use crate::generator::{GenerateReport, Generator};
use crate::Blog;

/// Generate the static site from the configured content API
pub fn run(blog: &Blog) -> Result<GenerateReport> {
    let client = blog.client();
    run_with_api(blog, &client)
}

/// Generate the static site from any content source
pub fn run_with_api(blog: &Blog, api: &dyn ContentApi) -> Result<GenerateReport> {
    report_run(blog, Generator::new(blog, api)?)
}

/// Generate for the dev server. Listing steps whose "load more" failed are
/// not written, so the server fetches them again when they are requested.
pub fn run_serving(blog: &Blog, api: &dyn ContentApi) -> Result<GenerateReport> {
    report_run(blog, Generator::new(blog, api)?.skip_failed_steps())
}

fn report_run(blog: &Blog, generator: Generator<'_>) -> Result<GenerateReport> {
    let start = std::time::Instant::now();

    tracing::info!(
        "Fetching {} documents from {}",
        blog.config.document_type,
        blog.config.api_endpoint
    );

    let report = generator.generate()?;

    if report.load_failed {
        tracing::warn!("Listing is incomplete: loading more posts failed");
    }
    if report.failed_posts > 0 {
        tracing::warn!("{} post pages could not be generated", report.failed_posts);
    }

    let duration = start.elapsed();
    tracing::info!(
        "Generated {} posts in {:.2}s",
        report.posts,
        duration.as_secs_f64()
    );

    Ok(report)
}

/// Watch the config file and static assets and regenerate on change
pub async fn watch(blog: &Blog) -> Result<()> {
    let (tx, rx) = channel();

    let mut watcher = notify::recommended_watcher(move |res| {
        if let Ok(event) = res {
            let _ = tx.send(event);
        }
    })?;

    if blog.source_dir.exists() {
        watcher.watch(&blog.source_dir, notify::RecursiveMode::Recursive)?;
    }

    let config_path = blog.config_path();
    if config_path.exists() {
        watcher.watch(&config_path, notify::RecursiveMode::NonRecursive)?;
    }

    tracing::info!("Watching for changes. Press Ctrl+C to stop.");

    let mut last_rebuild = std::time::Instant::now();

    loop {
        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(_event) => {
                // Debounce: only rebuild if more than 500ms since last rebuild
                if last_rebuild.elapsed() > Duration::from_millis(500) {
                    tracing::info!("File changed, regenerating...");
                    match Blog::new(&blog.base_dir) {
                        Ok(fresh) => {
                            if let Err(e) = run(&fresh) {
                                tracing::error!("Generation failed: {:#}", e);
                            }
                        }
                        Err(e) => tracing::error!("Failed to reload config: {:#}", e),
                    }
                    last_rebuild = std::time::Instant::now();
                }
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => {}
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => {
                break;
            }
        }
    }

    Ok(())
}
