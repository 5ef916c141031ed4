//! Chrome automation over the DevTools Protocol

use anyhow::{Context, Result};
use chromiumoxide::Page;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::{
    SetDeviceMetricsOverrideParams, SetTouchEmulationEnabledParams, SetUserAgentOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::input::{DispatchKeyEventParams, DispatchKeyEventType};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::ScreenshotParams;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use url::Url;

use crate::config::RunConfig;
use crate::runner::{PageFactory, ShotPage};
use crate::scroll::ScrollablePage;
use crate::settle::MutationCounter;
use crate::types::{CaptureRequest, DeviceProfile, ImageFormat};

const CHROME_ARGS: [&str; 4] = [
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--disable-dev-shm-usage",
    "--lang=en-US,en;q=0.9",
];

const CONTENT_EXTENT_SCRIPT: &str = r#"
    (() => {
        const body = document.body;
        if (!body) return 0;
        return Math.max(body.scrollHeight, body.offsetHeight, body.clientHeight);
    })()
"#;

const MUTATION_COUNTER_SCRIPT: &str = r#"
    (() => {
        if (window.__pageshot_mutations !== undefined) return;
        window.__pageshot_mutations = 0;
        const target = document.body || document.documentElement;
        new MutationObserver(() => { window.__pageshot_mutations += 1; })
            .observe(target, { attributes: true, childList: true, subtree: true });
    })()
"#;

/// Chrome could not be started
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("Failed to build browser config: {0}")]
    Config(String),
    #[error("Failed to launch Chrome")]
    Launch(#[source] CdpError),
}

/// A launched Chrome instance that hands out pages
pub struct ChromeSession {
    browser: Browser,
    handler: JoinHandle<()>,
    device: DeviceProfile,
}

impl ChromeSession {
    /// Launch Chrome according to `config`
    pub async fn launch(config: &RunConfig) -> Result<Self> {
        info!(
            "Launching Chrome ({}, {})",
            config.device.name,
            if config.headless { "headless" } else { "headed" }
        );

        let viewport = config.device.viewport;
        let mut builder = BrowserConfig::builder()
            .window_size(viewport.width, viewport.height)
            .args(CHROME_ARGS.to_vec());

        if !config.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &config.chrome_executable {
            builder = builder.chrome_executable(path);
        }

        let browser_config = builder
            .build()
            .map_err(LaunchError::Config)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(LaunchError::Launch)?;

        // Events are processed by chromiumoxide internally
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("CDP handler error: {}", e);
                }
            }
        });

        Ok(ChromeSession {
            browser,
            handler,
            device: config.device.clone(),
        })
    }

    pub async fn close(mut self) -> Result<()> {
        let result = self.browser.close().await;
        if let Err(e) = self.browser.wait().await {
            debug!("Chrome did not exit cleanly: {}", e);
        }
        self.handler.abort();
        result.context("Failed to close Chrome")?;
        Ok(())
    }
}

impl PageFactory for ChromeSession {
    type Page = ChromePage;

    async fn open_page(&self) -> Result<ChromePage> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .context("Failed to create new page")?;

        let page = ChromePage { page };
        page.emulate(&self.device).await?;
        Ok(page)
    }
}

/// One browser tab
pub struct ChromePage {
    page: Page,
}

impl ChromePage {
    /// Apply device metrics, touch support and user agent
    pub async fn emulate(&self, device: &DeviceProfile) -> Result<()> {
        debug!(
            "Emulating {} at {}x{}",
            device.name, device.viewport.width, device.viewport.height
        );

        self.page
            .execute(SetDeviceMetricsOverrideParams::new(
                i64::from(device.viewport.width),
                i64::from(device.viewport.height),
                device.device_scale_factor,
                device.mobile,
            ))
            .await
            .context("Failed to set viewport dimensions")?;

        if device.has_touch {
            self.page
                .execute(SetTouchEmulationEnabledParams::new(true))
                .await
                .context("Failed to enable touch emulation")?;
        }

        if let Some(user_agent) = &device.user_agent {
            self.page
                .execute(SetUserAgentOverrideParams::new(user_agent.clone()))
                .await
                .context("Failed to override user agent")?;
        }

        Ok(())
    }

    async fn eval<T: DeserializeOwned>(&self, script: &str) -> Result<T> {
        self.page
            .evaluate(script)
            .await
            .context("Failed to execute script")?
            .into_value::<T>()
            .context("Unexpected script result")
    }

    async fn ready_state(&self) -> Option<String> {
        self.eval::<String>("document.readyState").await.ok()
    }

    async fn key_event(&self, kind: DispatchKeyEventType) -> Result<()> {
        let params = DispatchKeyEventParams::builder()
            .r#type(kind)
            .key("Escape")
            .code("Escape")
            .windows_virtual_key_code(27)
            .native_virtual_key_code(27)
            .build()
            .map_err(anyhow::Error::msg)?;
        self.page.execute(params).await?;
        Ok(())
    }
}

impl ScrollablePage for ChromePage {
    async fn scroll_offset(&self) -> Result<i64> {
        let offset: f64 = self.eval("window.pageYOffset").await?;
        Ok(offset.round() as i64)
    }

    async fn content_extent(&self) -> Result<i64> {
        let extent: f64 = self.eval(CONTENT_EXTENT_SCRIPT).await?;
        Ok(extent.round() as i64)
    }

    async fn scroll_by(&self, delta: i64) -> Result<()> {
        self.page
            .evaluate(format!("window.scrollBy(0, {})", delta))
            .await
            .context("Failed to scroll")?;
        Ok(())
    }
}

impl MutationCounter for ChromePage {
    async fn install_mutation_counter(&self) -> Result<()> {
        self.page
            .evaluate(MUTATION_COUNTER_SCRIPT)
            .await
            .context("Failed to install mutation observer")?;
        Ok(())
    }

    async fn mutation_count(&self) -> Result<u64> {
        self.eval("window.__pageshot_mutations || 0").await
    }
}

impl ShotPage for ChromePage {
    async fn goto(&self, url: &Url) -> Result<()> {
        info!("Navigating to {}", url);
        self.page.goto(url.as_str()).await?;

        // Max 2 seconds
        for _ in 0..20 {
            if matches!(
                self.ready_state().await.as_deref(),
                Some("interactive") | Some("complete")
            ) {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
        }

        Ok(())
    }

    async fn press_escape(&self) -> Result<()> {
        self.key_event(DispatchKeyEventType::KeyDown).await?;
        self.key_event(DispatchKeyEventType::KeyUp).await
    }

    async fn capture(&self, request: &CaptureRequest) -> Result<usize> {
        let format = match request.format {
            ImageFormat::Png => CaptureScreenshotFormat::Png,
            ImageFormat::Jpg | ImageFormat::Jpeg => CaptureScreenshotFormat::Jpeg,
            ImageFormat::Webp => CaptureScreenshotFormat::Webp,
        };

        let mut params = ScreenshotParams::builder()
            .format(format)
            .full_page(request.full_page);
        if let Some(quality) = request.quality {
            params = params.quality(i64::from(quality));
        }

        let bytes = self
            .page
            .save_screenshot(params.build(), &request.path)
            .await?;
        Ok(bytes.len())
    }

    async fn close(self) -> Result<()> {
        self.page.close().await?;
        Ok(())
    }
}
