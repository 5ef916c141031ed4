// Fakes shared by the unit tests: a virtual clock and a scriptable page.

use anyhow::{Result, anyhow};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

use crate::clock::Clock;
use crate::runner::{PageFactory, ShotPage};
use crate::scroll::ScrollablePage;
use crate::settle::MutationCounter;
use crate::types::CaptureRequest;

/// Clock that records requested sleeps and returns immediately
#[derive(Debug, Default)]
pub struct VirtualClock {
    sleeps: Mutex<Vec<Duration>>,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }

    pub fn elapsed(&self) -> Duration {
        self.sleeps().iter().sum()
    }
}

impl Clock for VirtualClock {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

/// Everything a fake page was asked to do, in order
#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    Goto(String),
    Escape,
    ScrollBy(i64),
    InstallCounter,
    Capture(CaptureRequest),
    Closed,
}

#[derive(Debug, Clone)]
pub struct PageState {
    pub offset: i64,
    pub extent: i64,
    pub viewport_height: i64,
    /// Successive values returned by `mutation_count`, the last one repeats
    pub mutation_script: Vec<u64>,
    pub mutation_polls: usize,
    /// Fail the n-th (1-based) scroll_by call
    pub fail_scroll_at: Option<usize>,
    pub fail_reads: bool,
    /// Hosts whose navigation fails
    pub fail_hosts: Vec<String>,
    pub scroll_calls: usize,
    pub events: Vec<PageEvent>,
}

impl PageState {
    pub fn new(extent: i64, viewport_height: i64) -> Self {
        PageState {
            offset: 0,
            extent,
            viewport_height,
            mutation_script: vec![0],
            mutation_polls: 0,
            fail_scroll_at: None,
            fail_reads: false,
            fail_hosts: Vec::new(),
            scroll_calls: 0,
            events: Vec::new(),
        }
    }

    fn max_offset(&self) -> i64 {
        (self.extent - self.viewport_height).max(0)
    }
}

/// Page with a document of fixed height that clamps scrolling like a browser
#[derive(Debug, Clone)]
pub struct FakePage {
    state: Arc<Mutex<PageState>>,
}

impl FakePage {
    pub fn new(extent: i64, viewport_height: i64) -> Self {
        Self::from_state(PageState::new(extent, viewport_height))
    }

    pub fn from_state(state: PageState) -> Self {
        FakePage {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn with_state<T>(&self, f: impl FnOnce(&mut PageState) -> T) -> T {
        f(&mut self.state.lock().unwrap())
    }

    pub fn offset(&self) -> i64 {
        self.with_state(|s| s.offset)
    }

    pub fn events(&self) -> Vec<PageEvent> {
        self.with_state(|s| s.events.clone())
    }

    pub fn scroll_deltas(&self) -> Vec<i64> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                PageEvent::ScrollBy(delta) => Some(delta),
                _ => None,
            })
            .collect()
    }
}

impl ScrollablePage for FakePage {
    async fn scroll_offset(&self) -> Result<i64> {
        self.with_state(|s| {
            if s.fail_reads {
                Err(anyhow!("Runtime.evaluate failed: target closed"))
            } else {
                Ok(s.offset)
            }
        })
    }

    async fn content_extent(&self) -> Result<i64> {
        self.with_state(|s| Ok(s.extent))
    }

    async fn scroll_by(&self, delta: i64) -> Result<()> {
        self.with_state(|s| {
            s.scroll_calls += 1;
            if s.fail_scroll_at == Some(s.scroll_calls) {
                return Err(anyhow!("scrollBy failed on call {}", s.scroll_calls));
            }
            s.events.push(PageEvent::ScrollBy(delta));
            s.offset = (s.offset + delta).clamp(0, s.max_offset());
            Ok(())
        })
    }
}

impl MutationCounter for FakePage {
    async fn install_mutation_counter(&self) -> Result<()> {
        self.with_state(|s| s.events.push(PageEvent::InstallCounter));
        Ok(())
    }

    async fn mutation_count(&self) -> Result<u64> {
        self.with_state(|s| {
            let idx = s.mutation_polls.min(s.mutation_script.len().saturating_sub(1));
            s.mutation_polls += 1;
            Ok(s.mutation_script.get(idx).copied().unwrap_or(0))
        })
    }
}

impl ShotPage for FakePage {
    async fn goto(&self, url: &Url) -> Result<()> {
        self.with_state(|s| {
            s.events.push(PageEvent::Goto(url.to_string()));
            let host = url.host_str().unwrap_or_default();
            if s.fail_hosts.iter().any(|h| h == host) {
                Err(anyhow!("net::ERR_NAME_NOT_RESOLVED"))
            } else {
                s.offset = 0;
                Ok(())
            }
        })
    }

    async fn press_escape(&self) -> Result<()> {
        self.with_state(|s| s.events.push(PageEvent::Escape));
        Ok(())
    }

    async fn capture(&self, request: &CaptureRequest) -> Result<usize> {
        std::fs::write(&request.path, b"\x89PNG fake")?;
        self.with_state(|s| s.events.push(PageEvent::Capture(request.clone())));
        Ok(9)
    }

    async fn close(self) -> Result<()> {
        self.with_state(|s| s.events.push(PageEvent::Closed));
        Ok(())
    }
}

/// Hands out fake pages built from one template and keeps them for inspection
#[derive(Debug)]
pub struct FakeFactory {
    template: PageState,
    pages: Mutex<Vec<FakePage>>,
}

impl FakeFactory {
    pub fn new(template: PageState) -> Self {
        FakeFactory {
            template,
            pages: Mutex::new(Vec::new()),
        }
    }

    pub fn pages(&self) -> Vec<FakePage> {
        self.pages.lock().unwrap().clone()
    }
}

impl PageFactory for FakeFactory {
    type Page = FakePage;

    async fn open_page(&self) -> Result<FakePage> {
        let page = FakePage::from_state(self.template.clone());
        self.pages.lock().unwrap().push(page.clone());
        Ok(page)
    }
}
