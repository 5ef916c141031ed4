use std::fmt;

use crate::browser::LaunchError;
use crate::config::ConfigError;
use crate::scroll::ScrollError;
use crate::settle::SettleError;
use crate::urls::UrlError;

/// Top-level error that carries the process exit code
#[derive(Debug)]
pub enum PageshotError {
    /// Invalid options (exit code 2)
    InvalidConfig(String),
    /// URL list missing, empty or unparsable (exit code 3)
    UrlList(String),
    /// Chrome could not be launched or reached (exit code 4)
    BrowserFailed(String),
    /// Operation timeout (exit code 5)
    Timeout(String),
    /// Generic error (exit code 1)
    Other(anyhow::Error),
}

impl PageshotError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            PageshotError::InvalidConfig(_) => 2,
            PageshotError::UrlList(_) => 3,
            PageshotError::BrowserFailed(_) => 4,
            PageshotError::Timeout(_) => 5,
            PageshotError::Other(_) => 1,
        }
    }
}

impl fmt::Display for PageshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageshotError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            PageshotError::UrlList(msg) => write!(f, "{}", msg),
            PageshotError::BrowserFailed(msg) => write!(f, "Browser failed: {}", msg),
            PageshotError::Timeout(msg) => write!(f, "Operation timed out: {}", msg),
            PageshotError::Other(err) => write!(f, "{:#}", err),
        }
    }
}

impl std::error::Error for PageshotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PageshotError::Other(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for PageshotError {
    fn from(err: anyhow::Error) -> Self {
        let msg = format!("{:#}", err);

        if err.downcast_ref::<ConfigError>().is_some()
            || matches!(
                err.downcast_ref::<ScrollError>(),
                Some(ScrollError::InvalidStepSize(_) | ScrollError::InvalidStepsLimit)
            )
            || matches!(
                err.downcast_ref::<SettleError>(),
                Some(SettleError::InvalidPollInterval)
            )
        {
            return PageshotError::InvalidConfig(msg);
        }

        if err.downcast_ref::<UrlError>().is_some() {
            return PageshotError::UrlList(msg);
        }

        if matches!(
            err.downcast_ref::<SettleError>(),
            Some(SettleError::Timeout(_))
        ) {
            return PageshotError::Timeout(msg);
        }

        if err.downcast_ref::<LaunchError>().is_some() {
            return PageshotError::BrowserFailed(msg);
        }

        // Fall back to the root cause for untyped errors from chromiumoxide.
        // Context lines carry URLs and paths, so they are never matched.
        let cause = err.root_cause().to_string().to_lowercase();
        if cause.contains("could not auto detect a chrome executable") {
            PageshotError::BrowserFailed(msg)
        } else if cause.contains("timeout") || cause.contains("timed out") {
            PageshotError::Timeout(msg)
        } else {
            PageshotError::Other(err)
        }
    }
}

#[cfg(test)]
#[path = "errors_test.rs"]
mod errors_test;
