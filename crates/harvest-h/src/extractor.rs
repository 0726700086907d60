//! Field extraction for review-site pages.
//!
//! Every query is a script from `scripts/` wrapped together with the shared
//! XPath helpers and evaluated in the page. Scripts return plain JSON shaped
//! like the engine's raw record types, with `null` for anything absent.

use crate::cdp::ChromiumSession;
use crate::eval::evaluate_json;
use async_trait::async_trait;
use harvest_engine::model::{RawBusiness, RawProfile, RawReview};
use harvest_engine::{DriverError, PageCounter, PageExtractor};
use serde::de::DeserializeOwned;
use std::time::Duration;

const HELPERS_JS: &str = include_str!("scripts/helpers.js");
const BLOCKED_JS: &str = include_str!("scripts/blocked.js");
const REMOVED_JS: &str = include_str!("scripts/removed.js");
const PAGE_COUNTER_JS: &str = include_str!("scripts/page_counter.js");
const REVIEWS_JS: &str = include_str!("scripts/reviews.js");
const PROFILE_JS: &str = include_str!("scripts/profile.js");
const BUSINESS_JS: &str = include_str!("scripts/business.js");

fn compose(body: &str) -> String {
    format!("(() => {{\n{}\n{}\n}})()", HELPERS_JS, body)
}

pub struct YelpExtractor {
    eval_timeout: Duration,
}

impl YelpExtractor {
    pub fn new(eval_timeout: Duration) -> Self {
        Self { eval_timeout }
    }

    async fn run<T: DeserializeOwned>(
        &self,
        session: &ChromiumSession,
        body: &str,
    ) -> Result<T, DriverError> {
        evaluate_json(session.page(), &compose(body), self.eval_timeout).await
    }
}

impl Default for YelpExtractor {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

#[async_trait]
impl PageExtractor<ChromiumSession> for YelpExtractor {
    async fn is_blocked(&self, session: &ChromiumSession) -> Result<bool, DriverError> {
        self.run(session, BLOCKED_JS).await
    }

    async fn is_removed(&self, session: &ChromiumSession) -> Result<bool, DriverError> {
        self.run(session, REMOVED_JS).await
    }

    async fn page_counter(
        &self,
        session: &ChromiumSession,
    ) -> Result<Option<PageCounter>, DriverError> {
        self.run(session, PAGE_COUNTER_JS).await
    }

    async fn review_items(
        &self,
        session: &ChromiumSession,
    ) -> Result<Option<Vec<RawReview>>, DriverError> {
        self.run(session, REVIEWS_JS).await
    }

    async fn profile(&self, session: &ChromiumSession) -> Result<RawProfile, DriverError> {
        self.run(session, PROFILE_JS).await
    }

    async fn business(&self, session: &ChromiumSession) -> Result<RawBusiness, DriverError> {
        self.run(session, BUSINESS_JS).await
    }
}
