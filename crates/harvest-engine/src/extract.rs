use crate::error::DriverError;
use crate::model::{RawBusiness, RawProfile, RawReview};
use crate::session::PageSession;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// "k of n" as shown by a listing's pagination control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCounter {
    pub current: u32,
    pub total: u32,
}

/// Reads structured data out of the page a session currently shows.
///
/// Implementations never navigate; the caller decides what is loaded.
#[async_trait]
pub trait PageExtractor<S: PageSession>: Send + Sync {
    /// The site is challenging the crawler.
    async fn is_blocked(&self, session: &S) -> Result<bool, DriverError>;

    /// The page reports that its subject no longer exists.
    async fn is_removed(&self, session: &S) -> Result<bool, DriverError>;

    /// `None` when the page has no pagination control.
    async fn page_counter(&self, session: &S) -> Result<Option<PageCounter>, DriverError>;

    /// Reviews on the current page; `None` when the review container is missing.
    async fn review_items(&self, session: &S) -> Result<Option<Vec<RawReview>>, DriverError>;

    async fn profile(&self, session: &S) -> Result<RawProfile, DriverError>;

    async fn business(&self, session: &S) -> Result<RawBusiness, DriverError>;
}
