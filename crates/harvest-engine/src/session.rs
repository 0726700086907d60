//! Browser session ownership.
//!
//! A [`Launcher`] produces [`PageSession`] handles. The [`SessionManager`]
//! keeps at most one live handle, applies the page-load timeout to every
//! navigation and replaces the handle wholesale when a visit asks for a reset.

use crate::error::{DriverError, VisitError};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Fingerprint a launched browser presents to pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StealthProfile {
    pub languages: Vec<String>,
    pub vendor: String,
    pub platform: String,
    pub webgl_vendor: String,
    pub renderer: String,
    pub fix_hairline: bool,
}

impl Default for StealthProfile {
    fn default() -> Self {
        Self {
            languages: vec!["en-US".to_string(), "en".to_string()],
            vendor: "Google Inc.".to_string(),
            platform: "Win32".to_string(),
            webgl_vendor: "Intel Inc.".to_string(),
            renderer: "Intel Iris OpenGL Engine".to_string(),
            fix_hairline: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub headless: bool,
    pub page_load_timeout: Duration,
    pub stealth: StealthProfile,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            headless: true,
            page_load_timeout: Duration::from_secs(10),
            stealth: StealthProfile::default(),
        }
    }
}

/// One live page in a browser.
///
/// Handles are cheap to clone and all clones refer to the same page.
#[async_trait]
pub trait PageSession: Clone + Send + Sync + 'static {
    /// Load `url` and wait for the page to finish loading.
    async fn goto(&self, url: &str) -> Result<(), DriverError>;

    /// Tear the browser down. Further calls on any clone fail.
    async fn close(&self) -> Result<(), DriverError>;
}

#[async_trait]
pub trait Launcher: Send + Sync {
    type Session: PageSession;

    async fn launch(&self, options: &LaunchOptions) -> Result<Self::Session, DriverError>;
}

pub struct SessionManager<L: Launcher> {
    launcher: L,
    options: LaunchOptions,
    session: Option<L::Session>,
    launches: u32,
    resets: u32,
}

impl<L: Launcher> SessionManager<L> {
    pub fn new(launcher: L, options: LaunchOptions) -> Self {
        Self {
            launcher,
            options,
            session: None,
            launches: 0,
            resets: 0,
        }
    }

    pub fn options(&self) -> &LaunchOptions {
        &self.options
    }

    /// Returns the live session, launching one if none exists.
    pub async fn acquire(&mut self) -> Result<L::Session, DriverError> {
        if let Some(session) = &self.session {
            return Ok(session.clone());
        }
        let session = self.launcher.launch(&self.options).await?;
        self.launches += 1;
        debug!("Launched session #{}", self.launches);
        self.session = Some(session.clone());
        Ok(session)
    }

    /// Closes the current session and launches a fresh one.
    pub async fn reset(&mut self) -> Result<L::Session, DriverError> {
        info!("Reconfiguring session");
        self.close_current().await;
        self.resets += 1;
        self.acquire().await
    }

    /// Loads `url` within the page-load timeout and returns the handle used.
    pub async fn navigate(&mut self, url: &str) -> Result<L::Session, VisitError> {
        let session = self.acquire().await?;
        match tokio::time::timeout(self.options.page_load_timeout, session.goto(url)).await {
            Ok(Ok(())) => Ok(session),
            Ok(Err(DriverError::Timeout(_))) | Err(_) => Err(VisitError::NavigationTimeout {
                url: url.to_string(),
            }),
            Ok(Err(e)) => Err(e.into()),
        }
    }

    pub async fn shutdown(&mut self) {
        self.close_current().await;
    }

    async fn close_current(&mut self) {
        if let Some(session) = self.session.take() {
            if let Err(e) = session.close().await {
                warn!("Failed to close session: {}", e);
            }
        }
    }

    pub fn launches(&self) -> u32 {
        self.launches
    }

    pub fn resets(&self) -> u32 {
        self.resets
    }

    pub fn is_live(&self) -> bool {
        self.session.is_some()
    }
}
