use std::path::PathBuf;
use thiserror::Error;

/// Invalid run configuration, target list or checkpoint file.
///
/// Always raised before the first browser launch.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Min index cannot be negative (got {0})")]
    NegativeMinIndex(i64),
    #[error("Max index must be -1 or non-negative (got {0})")]
    InvalidMaxIndex(i64),
    #[error("Min index {min} cannot be larger than max index {max}")]
    InvertedRange { min: i64, max: i64 },
    #[error("Wait time for next page: lower bound {lower} exceeds upper bound {upper}")]
    InvertedWait { lower: u64, upper: u64 },
    #[error("Page load timeout must be at least one second")]
    ZeroPageLoadTimeout,
    #[error("Part argument is out of range. It must be between 1 and 10, inclusive (got {0})")]
    PartOutOfRange(u8),
    #[error("Target index {index} is outside the target list (0..={max})")]
    TargetOutOfRange { index: i64, max: i64 },

    #[error("{} cannot be found", path.display())]
    MissingCheckpoint { path: PathBuf },
    #[error("{} is empty", path.display())]
    EmptyCheckpoint { path: PathBuf },
    #[error("{} contains an entry that is not an index: '{token}'", path.display())]
    MalformedCheckpoint { path: PathBuf, token: String },
    #[error("{} contains indices outside 0..={max}: {indices:?}", path.display())]
    IndexOutOfRange {
        path: PathBuf,
        indices: Vec<i64>,
        max: i64,
    },
    #[error("{} contains '{token}', which is not a pagination marker", path.display())]
    InvalidPageToken { path: PathBuf, token: String },

    #[error("Cannot find {expected} column in the target list")]
    MissingColumn { expected: String },
    #[error("Failed to read target list: {0}")]
    TargetList(#[from] csv::Error),
    #[error("Target list {0} cannot be found")]
    MissingTargetList(String),
    #[error("Target list is empty")]
    EmptyTargetList,
    #[error("A bucket name is required when remote storage is enabled")]
    MissingBucket,
}

/// Failure reported by a browser driver or page extractor.
#[derive(Debug, Clone, Error)]
pub enum DriverError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),
    #[error("Navigation failed: {0}")]
    Navigation(String),
    #[error("Navigation timed out: {0}")]
    Timeout(String),
    #[error("Script evaluation failed: {0}")]
    Script(String),
    #[error("Unexpected page structure: {0}")]
    Structure(String),
    #[error("Session is closed")]
    Closed,
}

/// Classified failure of a single target visit.
#[derive(Debug, Error)]
pub enum VisitError {
    #[error("Navigation to {url} timed out")]
    NavigationTimeout { url: String },
    #[error("Exceeded {attempts} navigation attempts for {url}")]
    RetriesExhausted { url: String, attempts: u32 },
    #[error("Target {identifier} has been removed")]
    TargetRemoved { identifier: String },
    #[error("Blocking banner detected at {url}")]
    Blocked { url: String },
    #[error("Target index {0} is not in the target list")]
    UnknownTarget(usize),
    #[error(transparent)]
    Driver(#[from] DriverError),
}

/// Run-level failure. Records aggregated before it stay exportable.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("The site has detected the crawler at index {index} ({url}). Cannot continue")]
    Blocked { index: usize, url: String },
    #[error("Failed to start the browser: {0}")]
    Launch(#[from] DriverError),
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to render table: {0}")]
    Csv(#[from] csv::Error),
    #[error("Remote storage error: {0}")]
    Remote(String),
}
