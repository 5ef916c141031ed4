use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Output format for the batch report
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON format for programmatic consumption
    Json,
    /// Human-readable simple format
    Simple,
}

/// Image encoding of the saved screenshots
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpg,
    Jpeg,
    Webp,
}

impl ImageFormat {
    /// File extension, without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpg => "jpg",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Webp => "webp",
        }
    }

    /// PNG is lossless, so a quality setting has no meaning for it
    pub fn supports_quality(&self) -> bool {
        !matches!(self, ImageFormat::Png)
    }
}

/// Browser viewport dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewportSize {
    /// Viewport width in pixels
    pub width: u32,
    /// Viewport height in pixels
    pub height: u32,
}

impl Default for ViewportSize {
    fn default() -> Self {
        ViewportSize {
            width: 1400,
            height: 800,
        }
    }
}

impl ViewportSize {
    /// Parse viewport size from "WIDTHxHEIGHT" format (e.g., "1920x1080")
    pub fn parse(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('x').collect();
        if parts.len() != 2 {
            anyhow::bail!("Invalid viewport format. Use WIDTHxHEIGHT (e.g., 1920x1080)");
        }

        let width = parts[0]
            .parse::<u32>()
            .map_err(|_| anyhow::anyhow!("Invalid width in viewport size"))?;
        let height = parts[1]
            .parse::<u32>()
            .map_err(|_| anyhow::anyhow!("Invalid height in viewport size"))?;

        Ok(ViewportSize { width, height })
    }
}

/// Emulated device metrics applied to every page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceProfile {
    pub name: String,
    pub viewport: ViewportSize,
    pub device_scale_factor: f64,
    pub mobile: bool,
    pub has_touch: bool,
    /// User agent override, if any
    pub user_agent: Option<String>,
}

impl DeviceProfile {
    /// Plain desktop window of the given size
    pub fn desktop(viewport: ViewportSize) -> Self {
        DeviceProfile {
            name: "Desktop".to_string(),
            viewport,
            device_scale_factor: 1.0,
            mobile: false,
            has_touch: false,
            user_agent: None,
        }
    }

    pub fn iphone_12() -> Self {
        DeviceProfile {
            name: "iPhone 12".to_string(),
            viewport: ViewportSize {
                width: 390,
                height: 844,
            },
            device_scale_factor: 3.0,
            mobile: true,
            has_touch: true,
            user_agent: Some(
                "Mozilla/5.0 (iPhone; CPU iPhone OS 14_2 like Mac OS X) AppleWebKit/605.1.15 \
                 (KHTML, like Gecko) Version/14.0.3 Mobile/15E148 Safari/604.1"
                    .to_string(),
            ),
        }
    }
}

/// What the capture step should produce
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureRequest {
    /// Target file
    pub path: PathBuf,
    /// Whole scrollable page instead of the first viewport
    pub full_page: bool,
    pub format: ImageFormat,
    /// 1-100, only for lossy formats
    pub quality: Option<u8>,
}

/// One saved screenshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShotRecord {
    pub url: String,
    pub path: PathBuf,
    pub bytes: usize,
    pub full_page: bool,
    /// Position the downward scroll stopped at, if the page was scrolled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bottom_position: Option<i64>,
    pub elapsed_ms: u64,
    pub captured_at: DateTime<Utc>,
}

/// A URL that could not be captured
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShotFailure {
    pub url: String,
    pub message: String,
}

/// Summary of a batch run, printed on stdout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub output_dir: PathBuf,
    pub total: usize,
    pub shots: Vec<ShotRecord>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub failures: Vec<ShotFailure>,
}

impl BatchReport {
    pub fn new(output_dir: PathBuf, total: usize) -> Self {
        BatchReport {
            output_dir,
            total,
            shots: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Plain text rendering for `--format simple`
    pub fn to_simple(&self) -> String {
        let mut out = String::new();
        for shot in &self.shots {
            out.push_str(&format!(
                "{} -> {} ({} bytes)\n",
                shot.url,
                shot.path.display(),
                shot.bytes
            ));
        }
        for failure in &self.failures {
            out.push_str(&format!("FAILED {}: {}\n", failure.url, failure.message));
        }
        out.push_str(&format!(
            "Done! Saved {} of {} screenshots to {}",
            self.shots.len(),
            self.total,
            self.output_dir.display()
        ));
        out
    }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
