//! Incremental scrolling used to force lazy-loaded content to render.
//!
//! A scroll session moves the page toward one boundary in fixed-size steps,
//! waiting between steps so images and infinite lists get a chance to load.
//! Both directions run through [`scroll_page`]; they differ only in the sign
//! of the step and in the stop predicate.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::clock::Clock;

/// Pixels moved per step when nothing else is configured.
pub const DEFAULT_STEP_SIZE: i64 = 250;

/// Delay between two steps when nothing else is configured.
pub const DEFAULT_STEP_DELAY: Duration = Duration::from_millis(100);

/// Which boundary a scroll session heads for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollDirection {
    /// Toward the end of the content
    Bottom,
    /// Back toward offset zero
    Top,
}

impl ScrollDirection {
    fn sign(self) -> i64 {
        match self {
            ScrollDirection::Bottom => 1,
            ScrollDirection::Top => -1,
        }
    }
}

/// Tuning for a scroll session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollOptions {
    /// Pixels per step, must be positive
    pub step_size: i64,
    /// Time between steps
    pub step_delay: Duration,
    /// Optional cap on the number of steps
    pub steps_limit: Option<u32>,
}

impl Default for ScrollOptions {
    fn default() -> Self {
        Self {
            step_size: DEFAULT_STEP_SIZE,
            step_delay: DEFAULT_STEP_DELAY,
            steps_limit: None,
        }
    }
}

impl ScrollOptions {
    /// Reject settings that would make the loop spin forever.
    pub fn validate(&self) -> Result<(), ScrollError> {
        if self.step_size <= 0 {
            return Err(ScrollError::InvalidStepSize(self.step_size));
        }
        if self.steps_limit == Some(0) {
            return Err(ScrollError::InvalidStepsLimit);
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ScrollError {
    #[error("Invalid scroll step size {0}: must be a positive number of pixels")]
    InvalidStepSize(i64),

    #[error("Invalid steps limit 0: must be at least 1 when set")]
    InvalidStepsLimit,

    /// A read or scroll primitive of the page failed
    #[error(transparent)]
    Page(#[from] anyhow::Error),
}

/// Page operations the scroller needs.
///
/// Offsets and extents are CSS pixels measured from the top of the document.
#[allow(async_fn_in_trait)]
pub trait ScrollablePage {
    /// Current vertical scroll offset
    async fn scroll_offset(&self) -> anyhow::Result<i64>;

    /// Max of scrollHeight, offsetHeight and clientHeight of the scrollable root
    async fn content_extent(&self) -> anyhow::Result<i64>;

    /// Scroll vertically by a signed delta
    async fn scroll_by(&self, delta: i64) -> anyhow::Result<()>;
}

/// Result of advancing a session by one step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Continue,
    Finished,
}

/// State of one scroll run.
///
/// For [`ScrollDirection::Bottom`] the position is the displacement from the
/// starting offset; for [`ScrollDirection::Top`] it is the absolute offset.
#[derive(Debug, Clone)]
pub struct ScrollSession {
    direction: ScrollDirection,
    step_size: i64,
    steps_limit: Option<u32>,
    initial_offset: i64,
    content_extent: i64,
    current_position: i64,
    steps: u32,
}

impl ScrollSession {
    pub fn start(
        direction: ScrollDirection,
        options: &ScrollOptions,
        initial_offset: i64,
        content_extent: i64,
    ) -> Result<Self, ScrollError> {
        options.validate()?;

        let current_position = match direction {
            ScrollDirection::Bottom => 0,
            ScrollDirection::Top => initial_offset,
        };

        Ok(Self {
            direction,
            step_size: options.step_size,
            steps_limit: options.steps_limit,
            initial_offset,
            content_extent,
            current_position,
            steps: 0,
        })
    }

    /// Signed scroll delta of the next step
    pub fn delta(&self) -> i64 {
        self.direction.sign() * self.step_size
    }

    /// Record that one step of [`Self::delta`] pixels has been issued.
    pub fn advance(&mut self) -> StepOutcome {
        self.current_position += self.delta();
        self.steps += 1;

        if self.reached_boundary() || self.reached_limit() {
            StepOutcome::Finished
        } else {
            StepOutcome::Continue
        }
    }

    fn reached_boundary(&self) -> bool {
        match self.direction {
            ScrollDirection::Bottom => self.current_position >= self.content_extent,
            ScrollDirection::Top => self.current_position <= 0,
        }
    }

    fn reached_limit(&self) -> bool {
        let Some(limit) = self.steps_limit else {
            return false;
        };
        let span = self.step_size.saturating_mul(i64::from(limit));

        match self.direction {
            ScrollDirection::Bottom => self.current_position >= span,
            ScrollDirection::Top => self.current_position <= self.initial_offset.saturating_sub(span),
        }
    }

    pub fn direction(&self) -> ScrollDirection {
        self.direction
    }

    pub fn position(&self) -> i64 {
        self.current_position
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn initial_offset(&self) -> i64 {
        self.initial_offset
    }

    pub fn content_extent(&self) -> i64 {
        self.content_extent
    }
}

/// Scroll `page` toward `direction` until the content boundary or the steps
/// limit is reached, returning the final session position.
///
/// There is no timeout: a page whose content keeps growing and no steps
/// limit will keep this running. Wrap the call in `tokio::time::timeout` if
/// that matters.
pub async fn scroll_page<P, C>(
    page: &P,
    direction: ScrollDirection,
    options: &ScrollOptions,
    clock: &C,
) -> Result<i64, ScrollError>
where
    P: ScrollablePage,
    C: Clock,
{
    options.validate()?;

    let initial_offset = page.scroll_offset().await?;
    let content_extent = page.content_extent().await?;
    let mut session = ScrollSession::start(direction, options, initial_offset, content_extent)?;

    debug!(
        "Scrolling to {:?} from offset {} (extent {}px, step {}px every {}ms)",
        direction,
        initial_offset,
        content_extent,
        options.step_size,
        options.step_delay.as_millis()
    );

    loop {
        clock.sleep(options.step_delay).await;
        page.scroll_by(session.delta()).await?;

        if session.advance() == StepOutcome::Finished {
            break;
        }
    }

    debug!(
        "Scroll to {:?} finished after {} steps at {}",
        direction,
        session.steps(),
        session.position()
    );

    Ok(session.position())
}

pub async fn scroll_to_bottom<P, C>(
    page: &P,
    options: &ScrollOptions,
    clock: &C,
) -> Result<i64, ScrollError>
where
    P: ScrollablePage,
    C: Clock,
{
    scroll_page(page, ScrollDirection::Bottom, options, clock).await
}

pub async fn scroll_to_top<P, C>(
    page: &P,
    options: &ScrollOptions,
    clock: &C,
) -> Result<i64, ScrollError>
where
    P: ScrollablePage,
    C: Clock,
{
    scroll_page(page, ScrollDirection::Top, options, clock).await
}

#[cfg(test)]
#[path = "scroll_test.rs"]
mod scroll_test;
