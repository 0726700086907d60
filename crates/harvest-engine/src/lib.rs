//! Crawl orchestration core.
//!
//! Resolves which targets a run visits, walks paginated targets with jittered
//! pacing, isolates per-target failures and aggregates the collected records
//! into a single result table.

pub mod aggregate;
pub mod config;
pub mod delay;
pub mod error;
pub mod extract;
pub mod model;
pub mod orchestrator;
pub mod selection;
pub mod session;
pub mod sink;
pub mod targets;
pub mod visit;
pub mod walker;

pub use aggregate::{Aggregator, ResultTable};
pub use config::{ConfigLoader, RunConfig};
pub use delay::{Jitter, Pacing};
pub use error::{ConfigError, CrawlError, DriverError, SinkError, VisitError};
pub use extract::{PageCounter, PageExtractor};
pub use model::{ObjectKind, Record, Target};
pub use orchestrator::{Orchestrator, RunState};
pub use selection::SelectionSet;
pub use session::{LaunchOptions, Launcher, PageSession, StealthProfile};
pub use sink::{LocalSink, ResultSink};
