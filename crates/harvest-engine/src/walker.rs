//! Walks every page of one paginated target.
//!
//! The walk is a small state machine:
//! `Home -> Navigating(k) -> Extracting(k) -> ... -> Done`.
//! Any error leaves the machine early and discards the target; reaching
//! `Done` hands back everything collected so far.

use crate::error::VisitError;
use crate::extract::PageExtractor;
use crate::model::{Record, ReviewRow, Target};
use crate::session::Launcher;
use crate::visit::Visit;
use tracing::{debug, info, warn};

/// Where the page tokens of a walk come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PagePlan {
    /// Read the page count from the first page and visit the rest in random order.
    Discover,
    /// Visit exactly these tokens in order.
    Fixed {
        tokens: Vec<String>,
        /// Use the first token as the entry page instead of the base locator.
        skip_home: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum WalkState {
    Home,
    Navigating(usize),
    Extracting(usize),
    Done,
}

pub struct PaginationWalker<'v, 'a, L: Launcher, E> {
    visit: &'v mut Visit<'a, L, E>,
    plan: PagePlan,
}

impl<'v, 'a, L, E> PaginationWalker<'v, 'a, L, E>
where
    L: Launcher,
    E: PageExtractor<L::Session>,
{
    pub fn new(visit: &'v mut Visit<'a, L, E>, plan: PagePlan) -> Self {
        Self { visit, plan }
    }

    pub async fn walk(self, target: &Target) -> Result<Record, VisitError> {
        let Self { visit, plan } = self;
        let (entry_token, mut queue, discover) = match plan {
            PagePlan::Discover => (None, Vec::new(), true),
            PagePlan::Fixed { tokens, skip_home } if skip_home && !tokens.is_empty() => {
                let mut tokens = tokens.into_iter();
                let first = tokens.next();
                (first, tokens.collect(), false)
            }
            PagePlan::Fixed { tokens, .. } => (None, tokens, false),
        };

        info!(
            "Index: {}. Yelp ID: {}",
            target.index, target.identifier
        );

        let mut rows: Vec<ReviewRow> = Vec::new();
        let mut loaded_pages = queue.len() + 1;
        let mut current_url = String::new();
        let mut session = None;
        let mut state = WalkState::Home;

        loop {
            state = match state {
                WalkState::Home => {
                    let url = match &entry_token {
                        Some(token) => target.page_url(token),
                        None => target.locator.clone(),
                    };
                    let loaded = visit.load(&url).await?;
                    visit.ensure_not_blocked(&loaded, &url).await?;
                    visit.pacing.settle.pause().await;
                    visit.ensure_present(&loaded, target).await?;

                    if discover {
                        let total = visit
                            .extractor
                            .page_counter(&loaded)
                            .await?
                            .map(|counter| counter.total)
                            .unwrap_or(1);
                        queue = (1..total).map(|i| format!("?start={}", i * 10)).collect();
                        visit.pacing.page.shuffle(&mut queue);
                        loaded_pages = queue.len() + 1;
                    }

                    info!(
                        "Current index: {}, page: 1 / {}, actual page: {}",
                        target.index,
                        loaded_pages,
                        entry_token.as_deref().unwrap_or("Home")
                    );
                    current_url = url;
                    session = Some(loaded);
                    WalkState::Extracting(1)
                }

                WalkState::Navigating(page) => {
                    let token = queue.remove(0);
                    info!(
                        "Current index: {}, page: {} / {}, actual page: {}",
                        target.index, page, loaded_pages, token
                    );
                    let url = target.page_url(&token);
                    let loaded = visit.load(&url).await?;
                    visit.pacing.page.pause().await;
                    visit.ensure_not_blocked(&loaded, &url).await?;

                    let counter = visit.extractor.page_counter(&loaded).await?;
                    current_url = url;
                    session = Some(loaded);
                    match counter {
                        Some(counter) if counter.current > counter.total => {
                            info!(
                                "Page number {} is larger than the total page number {}. Continuing to next page",
                                counter.current, counter.total
                            );
                            Self::advance(page, &queue)
                        }
                        _ => WalkState::Extracting(page),
                    }
                }

                WalkState::Extracting(page) => {
                    let Some(loaded) = session.clone() else {
                        break;
                    };
                    let items = match visit.extractor.review_items(&loaded).await? {
                        Some(items) => Some(items),
                        None => {
                            warn!("Review section missing. Reloading the page");
                            let reloaded = visit.load(&current_url).await?;
                            visit.pacing.page.pause().await;
                            visit.ensure_not_blocked(&reloaded, &current_url).await?;
                            let items = visit.extractor.review_items(&reloaded).await?;
                            session = Some(reloaded);
                            items
                        }
                    };

                    match items {
                        None => {
                            info!("Review section still missing. Moving to next target");
                            WalkState::Done
                        }
                        Some(items) if items.is_empty() => {
                            info!("No reviews on page {}. Moving to next target", page);
                            WalkState::Done
                        }
                        Some(items) => {
                            debug!("Collected {} reviews from page {}", items.len(), page);
                            rows.extend(items.into_iter().map(|raw| {
                                let mut row = raw.fill();
                                row.yelpid = target.identifier.clone();
                                row.name = target.name.clone();
                                row
                            }));
                            Self::advance(page, &queue)
                        }
                    }
                }

                WalkState::Done => break,
            };
        }

        info!(
            "Index {}: collected {} reviews",
            target.index,
            rows.len()
        );
        Ok(Record::Reviews(rows))
    }

    fn advance(page: usize, queue: &[String]) -> WalkState {
        if queue.is_empty() {
            WalkState::Done
        } else {
            WalkState::Navigating(page + 1)
        }
    }
}
