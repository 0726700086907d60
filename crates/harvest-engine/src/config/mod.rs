pub mod loader;
pub mod schema;

pub use loader::ConfigLoader;
pub use schema::{
    BrowserConfig, LoggingConfig, RunConfig, SelectionConfig, SelectionModeKind, StorageConfig,
    TimingConfig,
};
