//! Single-target visit routines shared by every object kind.

use crate::delay::Pacing;
use crate::error::VisitError;
use crate::extract::PageExtractor;
use crate::model::{Record, Target};
use crate::session::{Launcher, SessionManager};
use tracing::{error, info, warn};

/// Navigation attempts per page before a target is given up.
pub const MAX_NAVIGATION_ATTEMPTS: u32 = 10;

/// Loads `url`, resetting the session after every timeout.
///
/// Gives up with [`VisitError::RetriesExhausted`] once
/// [`MAX_NAVIGATION_ATTEMPTS`] navigations have timed out. Other failures are
/// returned as they are.
pub async fn navigate_with_retry<L: Launcher>(
    sessions: &mut SessionManager<L>,
    url: &str,
) -> Result<L::Session, VisitError> {
    let mut attempts = 0;
    loop {
        match sessions.navigate(url).await {
            Ok(session) => return Ok(session),
            Err(VisitError::NavigationTimeout { .. }) => {
                attempts += 1;
                if attempts >= MAX_NAVIGATION_ATTEMPTS {
                    error!("Exceeded max attempts loading {}", url);
                    return Err(VisitError::RetriesExhausted {
                        url: url.to_string(),
                        attempts,
                    });
                }
                warn!(
                    "Timed out loading {}. Attempt {}/{}",
                    url, attempts, MAX_NAVIGATION_ATTEMPTS
                );
                sessions.reset().await?;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Everything a visit routine borrows from the orchestrator.
pub struct Visit<'a, L: Launcher, E> {
    pub sessions: &'a mut SessionManager<L>,
    pub extractor: &'a E,
    pub pacing: &'a mut Pacing,
}

impl<'a, L, E> Visit<'a, L, E>
where
    L: Launcher,
    E: PageExtractor<L::Session>,
{
    pub fn new(
        sessions: &'a mut SessionManager<L>,
        extractor: &'a E,
        pacing: &'a mut Pacing,
    ) -> Self {
        Self {
            sessions,
            extractor,
            pacing,
        }
    }

    pub async fn load(&mut self, url: &str) -> Result<L::Session, VisitError> {
        navigate_with_retry(self.sessions, url).await
    }

    pub async fn ensure_not_blocked(
        &self,
        session: &L::Session,
        url: &str,
    ) -> Result<(), VisitError> {
        if self.extractor.is_blocked(session).await? {
            error!("Blocking banner at {}", url);
            return Err(VisitError::Blocked {
                url: url.to_string(),
            });
        }
        Ok(())
    }

    pub async fn ensure_present(
        &self,
        session: &L::Session,
        target: &Target,
    ) -> Result<(), VisitError> {
        if self.extractor.is_removed(session).await? {
            warn!("Index {}: this page has been removed", target.index);
            return Err(VisitError::TargetRemoved {
                identifier: target.identifier.clone(),
            });
        }
        Ok(())
    }

    pub async fn profile(&mut self, target: &Target) -> Result<Record, VisitError> {
        info!(
            "Current working index: {}, user ID: {}",
            target.index, target.identifier
        );
        let session = self.load(&target.locator).await?;
        self.ensure_not_blocked(&session, &target.locator).await?;
        self.pacing.profile.pause().await;
        self.ensure_present(&session, target).await?;

        let mut row = self.extractor.profile(&session).await?.fill();
        row.userid = target.identifier.clone();
        Ok(Record::Profile(row))
    }

    pub async fn business(&mut self, target: &Target) -> Result<Record, VisitError> {
        info!(
            "Current working index: {}, business ID: {}",
            target.index, target.identifier
        );
        let session = self.load(&target.locator).await?;
        self.ensure_not_blocked(&session, &target.locator).await?;
        self.pacing.settle.pause().await;
        self.ensure_present(&session, target).await?;

        let mut row = self.extractor.business(&session).await?.fill();
        row.yelpid = target.identifier.clone();
        if row.name.is_empty() {
            row.name = target.name.clone();
        }
        Ok(Record::Business(row))
    }
}
