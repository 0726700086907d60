pub mod cdp;
pub mod eval;
pub mod extractor;
pub mod stealth;

pub use cdp::{ChromiumLauncher, ChromiumSession};
pub use extractor::YelpExtractor;
