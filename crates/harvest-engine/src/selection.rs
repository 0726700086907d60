//! Resolves which targets a run visits.
//!
//! Three modes exist and exactly one is active per run:
//! a contiguous index range, an explicit index list read from a checkpoint
//! file, or one slice of one target's page-token list.

use crate::config::schema::PAGE_PARTS;
use crate::config::{SelectionConfig, SelectionModeKind};
use crate::error::ConfigError;
use regex::Regex;
use std::collections::BTreeSet;
use std::ops::Range;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{info, warn};

/// Whether `token` has the pagination-marker shape `?start=<digits>`.
pub fn is_page_token(token: &str) -> bool {
    static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\?start=\d+$").unwrap());
    TOKEN_RE.is_match(token)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionMode {
    Range { min: usize, max: usize },
    Explicit,
    PartialPage {
        index: usize,
        part: u8,
        /// Slice of the full token list, as a half-open range.
        window: Range<usize>,
        total_tokens: usize,
    },
}

/// Ordered, de-duplicated target indices for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionSet {
    pub indices: Vec<usize>,
    /// Page tokens of the selected part, partial-page mode only.
    pub tokens: Option<Vec<String>>,
    pub mode: SelectionMode,
}

impl SelectionSet {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Part > 1 starts from its first token instead of the base locator.
    pub fn skips_home(&self) -> bool {
        matches!(self.mode, SelectionMode::PartialPage { part, .. } if part > 1)
    }
}

/// Slice of `len` page tokens that part `part` (1..=10) covers.
///
/// The slice starts at `floor((p-1)*L/10)`, plus one for every part after the
/// first, and ends inclusively at `floor(p*L/10)`, or at `L-1` for the last part.
/// Returned as a half-open range that is empty when the end precedes the start.
pub fn page_window(len: usize, part: u8) -> Range<usize> {
    let p = part as usize;
    let parts = PAGE_PARTS as usize;
    let start = (p - 1) * len / parts + usize::from(p > 1);
    let end = if p == parts {
        len
    } else {
        (p * len / parts + 1).min(len)
    };
    start.min(end)..end
}

/// Resolves the selection for a target list of `target_count` rows.
pub async fn resolve(
    config: &SelectionConfig,
    target_count: usize,
) -> Result<SelectionSet, ConfigError> {
    if target_count == 0 {
        return Err(ConfigError::EmptyTargetList);
    }
    let last = target_count as i64 - 1;

    match config.mode {
        SelectionModeKind::Range => resolve_range(config.min_index, config.max_index, last),
        SelectionModeKind::IndexSpecified => {
            let path = config.index_file_path();
            let indices = read_index_file(&path).await?;
            let outside: Vec<i64> = indices
                .iter()
                .copied()
                .filter(|i| *i < 0 || *i > last)
                .collect();
            if !outside.is_empty() {
                return Err(ConfigError::IndexOutOfRange {
                    path,
                    indices: outside,
                    max: last,
                });
            }
            let indices = indices.into_iter().map(|i| i as usize).collect::<Vec<_>>();
            info!("Loaded {} indices from {}", indices.len(), path.display());
            Ok(SelectionSet {
                indices,
                tokens: None,
                mode: SelectionMode::Explicit,
            })
        }
        SelectionModeKind::PageSpecific => {
            let part = config.part_for_ps_mode;
            if !(1..=PAGE_PARTS).contains(&part) {
                return Err(ConfigError::PartOutOfRange(part));
            }
            let index = config.index_for_ps_mode;
            if index < 0 || index > last {
                return Err(ConfigError::TargetOutOfRange { index, max: last });
            }

            let all_tokens = read_page_tokens(&config.page_file_path()).await?;
            let window = page_window(all_tokens.len(), part);
            let tokens = all_tokens[window.clone()].to_vec();
            info!(
                "Part {} of target {} covers {} of {} pages",
                part,
                index,
                tokens.len(),
                all_tokens.len()
            );
            Ok(SelectionSet {
                indices: vec![index as usize],
                tokens: Some(tokens),
                mode: SelectionMode::PartialPage {
                    index: index as usize,
                    part,
                    window,
                    total_tokens: all_tokens.len(),
                },
            })
        }
    }
}

fn resolve_range(min: i64, max: i64, last: i64) -> Result<SelectionSet, ConfigError> {
    if min < 0 {
        return Err(ConfigError::NegativeMinIndex(min));
    }
    if max < -1 {
        return Err(ConfigError::InvalidMaxIndex(max));
    }
    if max != -1 && min > max {
        return Err(ConfigError::InvertedRange { min, max });
    }

    let max = if max == -1 {
        last
    } else if max > last {
        warn!(
            "Max index {} is beyond the last target; capping it at {}",
            max, last
        );
        last
    } else {
        max
    };
    if min > max {
        warn!("Min index {} is beyond the last target ({}); nothing to visit", min, last);
    }

    let indices = (min..=max).map(|i| i as usize).collect();
    Ok(SelectionSet {
        indices,
        tokens: None,
        mode: SelectionMode::Range {
            min: min as usize,
            max: max.max(0) as usize,
        },
    })
}

async fn read_checkpoint(path: &Path) -> Result<Vec<String>, ConfigError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConfigError::MissingCheckpoint {
                path: path.to_path_buf(),
            });
        }
        Err(e) => return Err(e.into()),
    };

    Ok(content
        .lines()
        .flat_map(|line| line.split(','))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect())
}

/// Reads comma separated indices spread over any number of lines.
///
/// The result is sorted and de-duplicated. Range checks against the target
/// list happen in [`resolve`].
pub async fn read_index_file(path: &Path) -> Result<Vec<i64>, ConfigError> {
    let tokens = read_checkpoint(path).await?;
    if tokens.is_empty() {
        return Err(ConfigError::EmptyCheckpoint {
            path: path.to_path_buf(),
        });
    }

    let mut indices = BTreeSet::new();
    for token in tokens {
        let index = token
            .parse::<i64>()
            .map_err(|_| ConfigError::MalformedCheckpoint {
                path: path.to_path_buf(),
                token: token.clone(),
            })?;
        indices.insert(index);
    }
    Ok(indices.into_iter().collect())
}

/// Reads a target's page-token list in file order.
pub async fn read_page_tokens(path: &Path) -> Result<Vec<String>, ConfigError> {
    let tokens = read_checkpoint(path).await?;
    if let Some(bad) = tokens.iter().find(|t| !is_page_token(t)) {
        return Err(ConfigError::InvalidPageToken {
            path: path.to_path_buf(),
            token: bad.clone(),
        });
    }
    if tokens.is_empty() {
        warn!("{} lists no pages", path.display());
    }
    Ok(tokens)
}

/// Renders indices in the format [`read_index_file`] accepts.
pub fn format_index_list(indices: &[usize]) -> String {
    let mut sorted = indices.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    sorted
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(",")
}
