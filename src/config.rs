//! Command line options and the resolved run configuration

use clap::Args;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

use crate::scroll::{DEFAULT_STEP_DELAY, ScrollError, ScrollOptions};
use crate::settle::SettleOptions;
use crate::types::{DeviceProfile, ImageFormat, OutputFormat, ViewportSize};
use crate::urls::DEFAULT_URLS_FILE;

/// Wait before pressing Escape to dismiss overlays
pub const DEFAULT_DISMISS_DELAY: Duration = Duration::from_millis(2_000);

#[derive(Args, Debug, Clone)]
pub struct ShotArgs {
    /// Comma separated list of URLs, e.g. google.com,yahoo.com (overrides the URL file)
    #[arg(short, long)]
    pub urls: Option<String>,

    /// File with one URL per line
    #[arg(short = 'f', long, default_value = DEFAULT_URLS_FILE)]
    pub urls_file: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = "screenshots")]
    pub output: PathBuf,

    /// Screenshot only the first viewport (no scrolling)
    #[arg(short, long)]
    pub single: bool,

    /// Viewport width in pixels
    #[arg(short = 'x', long, default_value_t = 1400)]
    pub width: u32,

    /// Viewport height in pixels
    #[arg(short = 'y', long, default_value_t = 800)]
    pub height: u32,

    /// Viewport size as WIDTHxHEIGHT, e.g. 1920x1080 (overrides --width/--height)
    #[arg(long)]
    pub viewport: Option<String>,

    /// Delay between scroll steps in milliseconds
    #[arg(short, long, default_value_t = DEFAULT_STEP_DELAY.as_millis() as u64)]
    pub delay: u64,

    /// Pixels per scroll step (defaults to the viewport height)
    #[arg(long, allow_negative_numbers = true)]
    pub step_size: Option<i64>,

    /// Maximum number of scroll steps in each direction
    #[arg(long)]
    pub steps_limit: Option<u32>,

    /// Emulate an iPhone 12 (ignores the viewport options)
    #[arg(short, long)]
    pub mobile: bool,

    /// Show the browser window instead of running headless (long form only, -h is help)
    #[arg(long)]
    pub headed: bool,

    /// Image format of the screenshots
    #[arg(short, long, value_enum, default_value = "png")]
    pub ext: ImageFormat,

    /// Image quality 1-100 (ignored for png)
    #[arg(short, long)]
    pub quality: Option<u8>,

    /// Wait for the DOM to stop changing before scrolling
    #[arg(long)]
    pub settle: bool,

    /// Give up waiting for the DOM to settle after this many milliseconds
    #[arg(long, default_value_t = 10_000)]
    pub settle_timeout: u64,

    /// Milliseconds without DOM changes that count as settled
    #[arg(long, default_value_t = 1_000)]
    pub settle_debounce: u64,

    /// Milliseconds to wait after load before pressing Escape
    #[arg(long, default_value_t = DEFAULT_DISMISS_DELAY.as_millis() as u64)]
    pub dismiss_delay: u64,

    /// Keep going when a URL fails instead of aborting the batch
    #[arg(long)]
    pub continue_on_error: bool,

    /// Report format
    #[arg(long, value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Path to a Chrome or Chromium executable
    #[arg(long)]
    pub chrome: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid viewport '{value}': {reason}")]
    Viewport { value: String, reason: String },

    #[error("Invalid quality {0}: must be between 1 and 100")]
    Quality(u8),

    #[error(transparent)]
    Scroll(#[from] ScrollError),
}

/// Everything a batch run needs, with defaults resolved
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub output_dir: PathBuf,
    /// Capture the first viewport only and skip scrolling
    pub single: bool,
    pub device: DeviceProfile,
    pub headless: bool,
    pub format: ImageFormat,
    pub quality: Option<u8>,
    pub scroll: ScrollOptions,
    pub settle: Option<SettleOptions>,
    pub dismiss_delay: Duration,
    pub continue_on_error: bool,
    pub report_format: OutputFormat,
    pub chrome_executable: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        let device = DeviceProfile::desktop(ViewportSize::default());
        RunConfig {
            output_dir: PathBuf::from("screenshots"),
            single: false,
            scroll: ScrollOptions {
                step_size: i64::from(device.viewport.height),
                ..ScrollOptions::default()
            },
            device,
            headless: true,
            format: ImageFormat::Png,
            quality: None,
            settle: None,
            dismiss_delay: DEFAULT_DISMISS_DELAY,
            continue_on_error: false,
            report_format: OutputFormat::Json,
            chrome_executable: None,
        }
    }
}

impl RunConfig {
    pub fn from_args(args: &ShotArgs) -> Result<Self, ConfigError> {
        let viewport = match &args.viewport {
            Some(value) => ViewportSize::parse(value).map_err(|e| ConfigError::Viewport {
                value: value.clone(),
                reason: e.to_string(),
            })?,
            None => ViewportSize {
                width: args.width,
                height: args.height,
            },
        };
        if viewport.width == 0 || viewport.height == 0 {
            return Err(ConfigError::Viewport {
                value: format!("{}x{}", viewport.width, viewport.height),
                reason: "width and height must be greater than zero".to_string(),
            });
        }

        let device = if args.mobile {
            DeviceProfile::iphone_12()
        } else {
            DeviceProfile::desktop(viewport)
        };

        let quality = match args.quality {
            Some(q) if !(1..=100).contains(&q) => return Err(ConfigError::Quality(q)),
            Some(q) if !args.ext.supports_quality() => {
                warn!("Ignoring quality {} for png screenshots", q);
                None
            }
            other => other,
        };

        // One viewport per step unless told otherwise
        let scroll = ScrollOptions {
            step_size: args
                .step_size
                .unwrap_or_else(|| i64::from(device.viewport.height)),
            step_delay: Duration::from_millis(args.delay),
            steps_limit: args.steps_limit,
        };
        scroll.validate()?;

        let settle = args.settle.then(|| SettleOptions {
            timeout: Duration::from_millis(args.settle_timeout),
            debounce: Duration::from_millis(args.settle_debounce),
            ..SettleOptions::default()
        });

        Ok(RunConfig {
            output_dir: args.output.clone(),
            single: args.single,
            device,
            headless: !args.headed,
            format: args.ext,
            quality,
            scroll,
            settle,
            dismiss_delay: Duration::from_millis(args.dismiss_delay),
            continue_on_error: args.continue_on_error,
            report_format: args.format,
            chrome_executable: args.chrome.clone(),
        })
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
