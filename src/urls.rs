//! URL list loading and screenshot file naming

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

use crate::types::ImageFormat;

/// Default URL list file, one URL per line
pub const DEFAULT_URLS_FILE: &str = "urls.txt";

#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to read URL list from {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No URLs to capture: pass --urls or list them in {}", .0.display())]
    Empty(PathBuf),

    #[error("Invalid URL '{url}': {source}")]
    Invalid {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// Split a comma separated `--urls` value
pub fn parse_url_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(str::to_string)
        .collect()
}

/// Lines of a URL file, skipping blanks and `#` comments
pub fn parse_url_file(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

pub fn read_url_file(path: &Path) -> Result<Vec<String>, UrlError> {
    let contents = fs::read_to_string(path).map_err(|source| UrlError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_url_file(&contents))
}

fn has_scheme(raw: &str) -> bool {
    match raw.find("://") {
        Some(idx) if idx > 0 => raw[..idx].chars().all(|c| c.is_ascii_alphabetic()),
        _ => false,
    }
}

/// Parse a URL, assuming `https://` when no scheme is given
pub fn normalize_url(raw: &str) -> Result<Url, UrlError> {
    let with_scheme = if has_scheme(raw) {
        raw.to_string()
    } else {
        format!("https://{raw}")
    };

    Url::parse(&with_scheme).map_err(|source| UrlError::Invalid {
        url: raw.to_string(),
        source,
    })
}

/// Resolve the URLs to capture: `--urls` wins over the URL file.
pub fn load_urls(cli_list: Option<&str>, urls_file: &Path) -> Result<Vec<Url>, UrlError> {
    let raw = match cli_list.map(parse_url_list) {
        Some(list) if !list.is_empty() => list,
        _ => read_url_file(urls_file)?,
    };

    if raw.is_empty() {
        return Err(UrlError::Empty(urls_file.to_path_buf()));
    }

    raw.iter().map(|u| normalize_url(u)).collect()
}

/// File stem for a screenshot of `url`.
///
/// The host name with every non-alphanumeric character replaced by `_`.
/// URLs without a host (`file://`) fall back to the last path segment.
pub fn screenshot_stem(url: &Url) -> String {
    let source = match url.host_str() {
        Some(host) if !host.is_empty() => host.to_string(),
        _ => url
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).next_back())
            .unwrap_or("page")
            .to_string(),
    };

    source
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Hands out screenshot paths inside one output directory.
///
/// A host seen twice in the same batch gets `_2`, `_3`, ... appended so
/// later captures do not overwrite earlier ones. A suffixed name is never
/// reused, even when another host's stem happens to produce it.
#[derive(Debug)]
pub struct OutputNamer {
    dir: PathBuf,
    format: ImageFormat,
    seen: HashMap<String, usize>,
    issued: HashSet<String>,
}

impl OutputNamer {
    pub fn new(dir: impl Into<PathBuf>, format: ImageFormat) -> Self {
        OutputNamer {
            dir: dir.into(),
            format,
            seen: HashMap::new(),
            issued: HashSet::new(),
        }
    }

    pub fn path_for(&mut self, url: &Url) -> PathBuf {
        let stem = screenshot_stem(url);
        let count = self.seen.entry(stem.clone()).or_insert(0);

        let file_name = loop {
            *count += 1;
            let candidate = if *count == 1 {
                format!("{}.{}", stem, self.format.extension())
            } else {
                format!("{}_{}.{}", stem, count, self.format.extension())
            };
            if !self.issued.contains(&candidate) {
                break candidate;
            }
        };

        self.issued.insert(file_name.clone());
        self.dir.join(file_name)
    }
}

#[cfg(test)]
#[path = "urls_test.rs"]
mod urls_test;
