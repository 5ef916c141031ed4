//! # pageshot
#![allow(clippy::uninlined_format_args)]
//!
//! Bulk screenshots of web pages, with lazy-loaded content forced to render.
//!
//! Each page is scrolled to the bottom and back to the top in fixed-size
//! steps before it is captured, so images and lists that only load when
//! scrolled into view show up in the screenshot.
//!
//! ## Installation
//!
//! ```bash
//! cargo install pageshot
//! ```
//!
//! ## CLI Usage
//!
//! ```bash
//! # Capture every URL listed in ./urls.txt into ./screenshots
//! pageshot
//!
//! # Capture a comma separated list, https:// is added when missing
//! pageshot --urls google.com,yahoo.com --output shots
//!
//! # Only the first viewport, no scrolling
//! pageshot -u example.com --single
//!
//! # Mobile emulation (iPhone 12) as lossy webp
//! pageshot -u example.com --mobile --ext webp --quality 80
//!
//! # Slow infinite-scroll page: smaller steps, longer delay, bounded
//! pageshot -u news.ycombinator.com --step-size 400 --delay 300 --steps-limit 25
//!
//! # Wait for the DOM to go quiet before scrolling
//! pageshot -u example.com --settle --settle-debounce 500
//!
//! # Human readable report instead of JSON, keep going past failures
//! pageshot --format simple --continue-on-error
//! ```
//!
//! Logs go to stderr (`RUST_LOG=pageshot=debug` shows every scroll session),
//! the report goes to stdout.
//!
//! ## Library Usage
//!
//! The scroller only needs something implementing [`ScrollablePage`]:
//!
//! ```no_run
//! use pageshot::{ChromeSession, PageFactory, RunConfig, ScrollOptions, ShotPage, TokioClock};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = RunConfig::default();
//! let session = ChromeSession::launch(&config).await?;
//! let page = session.open_page().await?;
//!
//! page.goto(&url::Url::parse("https://example.com")?).await?;
//! let options = ScrollOptions {
//!     steps_limit: Some(10),
//!     ..ScrollOptions::default()
//! };
//! pageshot::scroll_to_bottom(&page, &options, &TokioClock).await?;
//! pageshot::scroll_to_top(&page, &options, &TokioClock).await?;
//!
//! page.close().await?;
//! session.close().await?;
//! # Ok(())
//! # }
//! ```

/// Chrome page and session over the DevTools Protocol
pub mod browser;

/// Time source for the scroll and settle loops
pub mod clock;

/// Command line options and resolved configuration
pub mod config;

/// Exit code mapping
pub mod errors;

/// Capture pipeline and batch loop
pub mod runner;

/// Incremental scroller
pub mod scroll;

/// DOM settle wait
pub mod settle;

/// Type definitions shared across modules
pub mod types;

/// URL list loading and output naming
pub mod urls;

#[cfg(test)]
mod test_support;

pub use browser::{ChromePage, ChromeSession, LaunchError};
pub use clock::{Clock, TokioClock};
pub use config::{ConfigError, RunConfig, ShotArgs};
pub use errors::PageshotError;
pub use runner::{PageFactory, ShotPage, run_batch, take_screenshot};
pub use scroll::{
    ScrollDirection, ScrollError, ScrollOptions, ScrollSession, ScrollablePage, scroll_page,
    scroll_to_bottom, scroll_to_top,
};
pub use settle::{SettleError, SettleOptions, MutationCounter, wait_for_dom_to_settle};
pub use types::{
    BatchReport, CaptureRequest, DeviceProfile, ImageFormat, OutputFormat, ShotFailure,
    ShotRecord, ViewportSize,
};
