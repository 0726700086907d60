#![allow(dead_code)]

use async_trait::async_trait;
use harvest_engine::delay::Pacing;
use harvest_engine::config::TimingConfig;
use harvest_engine::model::{RawBusiness, RawProfile, RawReview, Target};
use harvest_engine::session::{LaunchOptions, Launcher, PageSession};
use harvest_engine::{DriverError, PageCounter, PageExtractor};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Default)]
pub struct MockPage {
    pub blocked: bool,
    pub removed: bool,
    pub counter: Option<PageCounter>,
    pub reviews: Option<Vec<RawReview>>,
    /// The review container is missing on this many loads before it shows up.
    pub missing_container_loads: u32,
    pub profile: RawProfile,
    pub business: RawBusiness,
}

#[derive(Debug, Default)]
pub struct SiteState {
    pub pages: HashMap<String, MockPage>,
    /// Navigations to these URLs never finish.
    pub hanging: HashSet<String>,
    /// Every navigation started, in order.
    pub visits: Vec<String>,
    pub loads: HashMap<String, u32>,
    pub current: Option<String>,
    pub launches: u32,
    pub closes: u32,
}

/// In-memory stand-in for the crawled site, shared by the launcher,
/// every session and the extractor.
#[derive(Debug, Clone, Default)]
pub struct MockSite {
    state: Arc<Mutex<SiteState>>,
}

impl MockSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(&self, url: &str, page: MockPage) {
        self.state.lock().unwrap().pages.insert(url.to_string(), page);
    }

    pub fn hang(&self, url: &str) {
        self.state.lock().unwrap().hanging.insert(url.to_string());
    }

    pub fn visits(&self) -> Vec<String> {
        self.state.lock().unwrap().visits.clone()
    }

    pub fn visits_to(&self, url: &str) -> usize {
        self.visits().iter().filter(|v| v.as_str() == url).count()
    }

    pub fn launches(&self) -> u32 {
        self.state.lock().unwrap().launches
    }

    pub fn closes(&self) -> u32 {
        self.state.lock().unwrap().closes
    }

    fn current_page(&self) -> (MockPage, u32) {
        let state = self.state.lock().unwrap();
        let url = state.current.clone().unwrap_or_default();
        let page = state.pages.get(&url).cloned().unwrap_or_default();
        let loads = state.loads.get(&url).copied().unwrap_or(0);
        (page, loads)
    }

    pub fn launcher(&self) -> MockLauncher {
        MockLauncher { site: self.clone() }
    }
}

#[derive(Debug, Clone)]
pub struct MockSession {
    site: MockSite,
}

#[async_trait]
impl PageSession for MockSession {
    async fn goto(&self, url: &str) -> Result<(), DriverError> {
        let hangs = {
            let mut state = self.site.state.lock().unwrap();
            state.visits.push(url.to_string());
            if state.hanging.contains(url) {
                true
            } else {
                *state.loads.entry(url.to_string()).or_insert(0) += 1;
                state.current = Some(url.to_string());
                false
            }
        };
        if hangs {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn close(&self) -> Result<(), DriverError> {
        let mut state = self.site.state.lock().unwrap();
        state.closes += 1;
        state.current = None;
        Ok(())
    }
}

pub struct MockLauncher {
    site: MockSite,
}

#[async_trait]
impl Launcher for MockLauncher {
    type Session = MockSession;

    async fn launch(&self, _options: &LaunchOptions) -> Result<MockSession, DriverError> {
        self.site.state.lock().unwrap().launches += 1;
        Ok(MockSession {
            site: self.site.clone(),
        })
    }
}

/// A launcher for a machine without a browser.
pub struct FailingLauncher;

#[async_trait]
impl Launcher for FailingLauncher {
    type Session = MockSession;

    async fn launch(&self, _options: &LaunchOptions) -> Result<MockSession, DriverError> {
        Err(DriverError::Launch("no chrome".to_string()))
    }
}

pub struct MockExtractor;

#[async_trait]
impl PageExtractor<MockSession> for MockExtractor {
    async fn is_blocked(&self, session: &MockSession) -> Result<bool, DriverError> {
        Ok(session.site.current_page().0.blocked)
    }

    async fn is_removed(&self, session: &MockSession) -> Result<bool, DriverError> {
        Ok(session.site.current_page().0.removed)
    }

    async fn page_counter(&self, session: &MockSession) -> Result<Option<PageCounter>, DriverError> {
        Ok(session.site.current_page().0.counter)
    }

    async fn review_items(
        &self,
        session: &MockSession,
    ) -> Result<Option<Vec<RawReview>>, DriverError> {
        let (page, loads) = session.site.current_page();
        if loads <= page.missing_container_loads {
            return Ok(None);
        }
        Ok(page.reviews)
    }

    async fn profile(&self, session: &MockSession) -> Result<RawProfile, DriverError> {
        Ok(session.site.current_page().0.profile)
    }

    async fn business(&self, session: &MockSession) -> Result<RawBusiness, DriverError> {
        Ok(session.site.current_page().0.business)
    }
}

pub fn pacing() -> Pacing {
    Pacing::seeded(&TimingConfig::default(), 11)
}

pub fn target(index: usize, locator: &str) -> Target {
    Target {
        index,
        identifier: format!("id-{index}"),
        name: format!("Name {index}"),
        locator: locator.to_string(),
    }
}

pub fn reviews(count: usize, author: &str) -> Vec<RawReview> {
    (0..count)
        .map(|i| RawReview {
            user_name: Some(format!("{author}-{i}")),
            rating: Some(5),
            ..Default::default()
        })
        .collect()
}

pub fn review_page(count: usize, author: &str, current: u32, total: u32) -> MockPage {
    MockPage {
        counter: Some(PageCounter { current, total }),
        reviews: Some(reviews(count, author)),
        ..Default::default()
    }
}
