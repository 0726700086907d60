//! Randomised pacing between page loads.

use crate::config::TimingConfig;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tracing::debug;

/// Uniform whole-second delay in `[lower, upper]` that never repeats the
/// previous draw unless the interval has a single value.
#[derive(Debug)]
pub struct Jitter {
    lower: u64,
    upper: u64,
    previous: Option<u64>,
    rng: StdRng,
}

impl Jitter {
    pub fn new(lower: u64, upper: u64) -> Self {
        Self::with_rng(lower, upper, StdRng::from_entropy())
    }

    pub fn seeded(lower: u64, upper: u64, seed: u64) -> Self {
        Self::with_rng(lower, upper, StdRng::seed_from_u64(seed))
    }

    fn with_rng(lower: u64, upper: u64, rng: StdRng) -> Self {
        let (lower, upper) = if lower <= upper {
            (lower, upper)
        } else {
            (upper, lower)
        };
        Self {
            lower,
            upper,
            previous: None,
            rng,
        }
    }

    pub fn bounds(&self) -> (u64, u64) {
        (self.lower, self.upper)
    }

    pub fn next_secs(&mut self) -> u64 {
        let mut secs = self.rng.gen_range(self.lower..=self.upper);
        if self.lower != self.upper {
            while Some(secs) == self.previous {
                secs = self.rng.gen_range(self.lower..=self.upper);
            }
        }
        self.previous = Some(secs);
        secs
    }

    pub fn next_delay(&mut self) -> Duration {
        Duration::from_secs(self.next_secs())
    }

    /// Sleeps for the next drawn delay and returns it.
    pub async fn pause(&mut self) -> Duration {
        let delay = self.next_delay();
        debug!("Waiting {}s", delay.as_secs());
        tokio::time::sleep(delay).await;
        delay
    }

    /// Shuffles with the same RNG the delays are drawn from.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.rng);
    }
}

/// Every delay a run applies.
#[derive(Debug)]
pub struct Pacing {
    /// After landing on a target's first page.
    pub settle: Jitter,
    /// Between pages of one target.
    pub page: Jitter,
    /// After landing on a profile page.
    pub profile: Jitter,
}

/// `[1, additional]` when an additional wait is set, otherwise exactly the
/// new-index wait.
fn profile_bounds(timing: &TimingConfig) -> (u64, u64) {
    match timing.additional_wait_time {
        0 => (timing.wait_time_for_new_index, timing.wait_time_for_new_index),
        additional => (1, additional),
    }
}

impl Pacing {
    pub fn from_config(timing: &TimingConfig) -> Self {
        let settle_upper = timing.wait_time_for_new_index;
        let (profile_lower, profile_upper) = profile_bounds(timing);
        Self {
            settle: Jitter::new(settle_upper.min(3), settle_upper),
            page: Jitter::new(
                timing.wait_time_for_next_page_lb,
                timing.wait_time_for_next_page_ub,
            ),
            profile: Jitter::new(profile_lower, profile_upper),
        }
    }

    /// Deterministic pacing for reproducible runs.
    pub fn seeded(timing: &TimingConfig, seed: u64) -> Self {
        let settle_upper = timing.wait_time_for_new_index;
        let (profile_lower, profile_upper) = profile_bounds(timing);
        Self {
            settle: Jitter::seeded(settle_upper.min(3), settle_upper, seed),
            page: Jitter::seeded(
                timing.wait_time_for_next_page_lb,
                timing.wait_time_for_next_page_ub,
                seed.wrapping_add(1),
            ),
            profile: Jitter::seeded(profile_lower, profile_upper, seed.wrapping_add(2)),
        }
    }
}
