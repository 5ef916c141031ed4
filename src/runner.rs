//! Per-page capture pipeline and the batch loop around it

use anyhow::{Context, Result};
use chrono::Utc;
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

use crate::clock::Clock;
use crate::config::RunConfig;
use crate::scroll::{ScrollError, ScrollOptions, ScrollablePage, scroll_to_bottom, scroll_to_top};
use crate::settle::{MutationCounter, wait_for_dom_to_settle};
use crate::types::{BatchReport, CaptureRequest, ShotFailure, ShotRecord};
use crate::urls::OutputNamer;

/// Pause between reaching the bottom and heading back up
pub const PAUSE_BEFORE_TOP: Duration = Duration::from_millis(250);

/// Pause after returning to the top, lets fixed headers settle
pub const PAUSE_BEFORE_CAPTURE: Duration = Duration::from_millis(500);

/// A browser page the pipeline can drive
#[allow(async_fn_in_trait)]
pub trait ShotPage: ScrollablePage + MutationCounter {
    /// Navigate and wait until the DOM content is loaded
    async fn goto(&self, url: &Url) -> Result<()>;

    /// Press and release Escape, closing most cookie banners and modals
    async fn press_escape(&self) -> Result<()>;

    /// Save a screenshot, returning the number of bytes written
    async fn capture(&self, request: &CaptureRequest) -> Result<usize>;

    async fn close(self) -> Result<()>;
}

/// Opens a fresh page for each URL
#[allow(async_fn_in_trait)]
pub trait PageFactory {
    type Page: ShotPage;

    async fn open_page(&self) -> Result<Self::Page>;
}

/// Scroll to the bottom and back to the top, returning where the downward
/// pass stopped.
pub async fn scroll_both_ways<P, C>(
    page: &P,
    options: &ScrollOptions,
    clock: &C,
) -> Result<i64, ScrollError>
where
    P: ScrollablePage,
    C: Clock,
{
    let bottom = scroll_to_bottom(page, options, clock).await?;
    clock.sleep(PAUSE_BEFORE_TOP).await;
    scroll_to_top(page, options, clock).await?;
    clock.sleep(PAUSE_BEFORE_CAPTURE).await;
    Ok(bottom)
}

/// Capture one URL into `path` on an already open page.
pub async fn take_screenshot<P, C>(
    page: &P,
    url: &Url,
    path: &Path,
    config: &RunConfig,
    clock: &C,
) -> Result<ShotRecord>
where
    P: ShotPage,
    C: Clock,
{
    let started = Instant::now();

    page.goto(url)
        .await
        .with_context(|| format!("Failed to navigate to {}", url))?;

    clock.sleep(config.dismiss_delay).await;
    page.press_escape().await?;

    if let Some(settle) = &config.settle {
        wait_for_dom_to_settle(page, settle, clock)
            .await
            .with_context(|| format!("Page {} did not settle", url))?;
    }

    let bottom_position = if config.single {
        None
    } else {
        let bottom = scroll_both_ways(page, &config.scroll, clock)
            .await
            .with_context(|| format!("Failed to scroll {}", url))?;
        Some(bottom)
    };

    let request = CaptureRequest {
        path: path.to_path_buf(),
        full_page: !config.single,
        format: config.format,
        quality: config.quality,
    };
    let bytes = page
        .capture(&request)
        .await
        .with_context(|| format!("Failed to save screenshot to {}", path.display()))?;

    debug!("Saved {} ({} bytes)", path.display(), bytes);

    Ok(ShotRecord {
        url: url.to_string(),
        path: request.path,
        bytes,
        full_page: request.full_page,
        bottom_position,
        elapsed_ms: started.elapsed().as_millis() as u64,
        captured_at: Utc::now(),
    })
}

async fn capture_in_new_page<F, C>(
    factory: &F,
    url: &Url,
    path: &Path,
    config: &RunConfig,
    clock: &C,
) -> Result<ShotRecord>
where
    F: PageFactory,
    C: Clock,
{
    let page = factory.open_page().await?;
    let result = take_screenshot(&page, url, path, config, clock).await;

    if let Err(e) = page.close().await {
        debug!("Failed to close page for {}: {}", url, e);
    }

    result
}

/// Capture every URL in order, one page at a time.
///
/// Without `continue_on_error` the first failing URL aborts the batch.
pub async fn run_batch<F, C>(
    factory: &F,
    urls: &[Url],
    config: &RunConfig,
    clock: &C,
) -> Result<BatchReport>
where
    F: PageFactory,
    C: Clock,
{
    fs::create_dir_all(&config.output_dir).with_context(|| {
        format!(
            "Failed to create output directory {}",
            config.output_dir.display()
        )
    })?;

    let total = urls.len();
    let mut namer = OutputNamer::new(&config.output_dir, config.format);
    let mut report = BatchReport::new(config.output_dir.clone(), total);

    for (i, url) in urls.iter().enumerate() {
        info!("[{}/{}] {}", i + 1, total, url);
        let path = namer.path_for(url);

        match capture_in_new_page(factory, url, &path, config, clock).await {
            Ok(shot) => report.shots.push(shot),
            Err(e) if config.continue_on_error => {
                warn!("Skipping {}: {:#}", url, e);
                report.failures.push(ShotFailure {
                    url: url.to_string(),
                    message: format!("{:#}", e),
                });
            }
            Err(e) => return Err(e),
        }
    }

    info!(
        "Done! Saved {} screenshots to {}",
        report.shots.len(),
        config.output_dir.display()
    );

    Ok(report)
}

#[cfg(test)]
#[path = "runner_test.rs"]
mod runner_test;
