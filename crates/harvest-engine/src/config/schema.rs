use crate::error::ConfigError;
use crate::model::ObjectKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Number of parts a target's page-token list is split into in page-specific mode.
pub const PAGE_PARTS: u8 = 10;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub collected_object: ObjectKind,
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionModeKind {
    #[default]
    Range,
    IndexSpecified,
    PageSpecific,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    #[serde(default)]
    pub mode: SelectionModeKind,
    #[serde(default)]
    pub min_index: i64,
    /// `-1` selects up to the last target.
    #[serde(default = "default_max_index")]
    pub max_index: i64,
    #[serde(default = "default_max_index")]
    pub index_for_ps_mode: i64,
    #[serde(default)]
    pub part_for_ps_mode: u8,
    /// Directory holding `index_list.txt` and `<index>_page_list.txt`.
    #[serde(default = "default_checkpoint_dir")]
    pub checkpoint_dir: PathBuf,
    #[serde(default = "default_index_file")]
    pub index_file: String,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            mode: SelectionModeKind::default(),
            min_index: 0,
            max_index: default_max_index(),
            index_for_ps_mode: default_max_index(),
            part_for_ps_mode: 0,
            checkpoint_dir: default_checkpoint_dir(),
            index_file: default_index_file(),
        }
    }
}

impl SelectionConfig {
    pub fn index_file_path(&self) -> PathBuf {
        self.checkpoint_dir.join(&self.index_file)
    }

    pub fn page_file_path(&self) -> PathBuf {
        self.checkpoint_dir
            .join(format!("{}_page_list.txt", self.index_for_ps_mode))
    }
}

fn default_max_index() -> i64 {
    -1
}

fn default_checkpoint_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_index_file() -> String {
    "index_list.txt".to_string()
}

/// Waits are whole seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "default_wait_time_for_new_index")]
    pub wait_time_for_new_index: u64,
    /// When non-zero, profile pages settle for a random `1..=n` seconds instead.
    #[serde(default)]
    pub additional_wait_time: u64,
    #[serde(default = "default_wait_time_for_next_page_lb")]
    pub wait_time_for_next_page_lb: u64,
    #[serde(default = "default_wait_time_for_next_page_ub")]
    pub wait_time_for_next_page_ub: u64,
    #[serde(default = "default_page_load_timeout_secs")]
    pub page_load_timeout_secs: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            wait_time_for_new_index: default_wait_time_for_new_index(),
            additional_wait_time: 0,
            wait_time_for_next_page_lb: default_wait_time_for_next_page_lb(),
            wait_time_for_next_page_ub: default_wait_time_for_next_page_ub(),
            page_load_timeout_secs: default_page_load_timeout_secs(),
        }
    }
}

impl TimingConfig {
    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_secs(self.page_load_timeout_secs)
    }
}

fn default_wait_time_for_new_index() -> u64 {
    3
}

fn default_wait_time_for_next_page_lb() -> u64 {
    10
}

fn default_wait_time_for_next_page_ub() -> u64 {
    15
}

fn default_page_load_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Target list file name without the `.csv` extension.
    #[serde(default = "default_target_list_name")]
    pub target_list_name: String,
    #[serde(default)]
    pub remote_storage: bool,
    #[serde(default)]
    pub bucket_name: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_output_prefix")]
    pub output_prefix: String,
    /// Encode the selection and outcome in the result file name.
    #[serde(default = "default_true")]
    pub index_suffix: bool,
    /// Write failed and unvisited indices to a checkpoint file for the next run.
    #[serde(default = "default_true")]
    pub write_retry_checkpoint: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            target_list_name: default_target_list_name(),
            remote_storage: false,
            bucket_name: String::new(),
            output_dir: default_output_dir(),
            output_prefix: default_output_prefix(),
            index_suffix: true,
            write_retry_checkpoint: true,
        }
    }
}

impl StorageConfig {
    pub fn target_list_file(&self) -> String {
        format!("{}.csv", self.target_list_name)
    }
}

fn default_target_list_name() -> String {
    "User_List".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_output_prefix() -> String {
    "yelp".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    #[serde(default = "default_true")]
    pub headless: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self { headless: true }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub verbose: bool,
    #[serde(default)]
    pub save_log: bool,
    /// Directory for log files when `save_log` is set.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

impl RunConfig {
    /// Checks everything that can be checked without the target list.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let selection = &self.selection;
        match selection.mode {
            SelectionModeKind::Range => {
                if selection.min_index < 0 {
                    return Err(ConfigError::NegativeMinIndex(selection.min_index));
                }
                if selection.max_index < -1 {
                    return Err(ConfigError::InvalidMaxIndex(selection.max_index));
                }
                if selection.max_index != -1 && selection.min_index > selection.max_index {
                    return Err(ConfigError::InvertedRange {
                        min: selection.min_index,
                        max: selection.max_index,
                    });
                }
            }
            SelectionModeKind::PageSpecific => {
                if !(1..=PAGE_PARTS).contains(&selection.part_for_ps_mode) {
                    return Err(ConfigError::PartOutOfRange(selection.part_for_ps_mode));
                }
                if selection.index_for_ps_mode < 0 {
                    return Err(ConfigError::TargetOutOfRange {
                        index: selection.index_for_ps_mode,
                        max: -1,
                    });
                }
            }
            SelectionModeKind::IndexSpecified => {}
        }

        let timing = &self.timing;
        if timing.wait_time_for_next_page_lb > timing.wait_time_for_next_page_ub {
            return Err(ConfigError::InvertedWait {
                lower: timing.wait_time_for_next_page_lb,
                upper: timing.wait_time_for_next_page_ub,
            });
        }
        if timing.page_load_timeout_secs == 0 {
            return Err(ConfigError::ZeroPageLoadTimeout);
        }

        if self.storage.remote_storage && self.storage.bucket_name.trim().is_empty() {
            return Err(ConfigError::MissingBucket);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = RunConfig::default();
        assert_eq!(config.selection.max_index, -1);
        assert_eq!(config.timing.wait_time_for_new_index, 3);
        assert_eq!(config.timing.wait_time_for_next_page_lb, 10);
        assert_eq!(config.timing.wait_time_for_next_page_ub, 15);
        assert_eq!(config.timing.page_load_timeout(), Duration::from_secs(10));
        assert!(config.browser.headless);
        assert!(config.storage.index_suffix);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config: RunConfig = serde_yaml::from_str(
            "collected_object: review\nselection:\n  min_index: 4\n  max_index: 9\n",
        )
        .expect("parse");
        assert_eq!(config.collected_object, ObjectKind::Review);
        assert_eq!(config.selection.min_index, 4);
        assert_eq!(config.selection.index_file, "index_list.txt");
        assert_eq!(config.storage.target_list_name, "User_List");
    }

    #[test]
    fn range_errors_are_rejected() {
        let mut config = RunConfig::default();
        config.selection.min_index = -2;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NegativeMinIndex(-2))
        ));

        config.selection.min_index = 0;
        config.selection.max_index = -3;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidMaxIndex(-3))
        ));

        config.selection.min_index = 5;
        config.selection.max_index = 4;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvertedRange { min: 5, max: 4 })
        ));

        config.selection.max_index = -1;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn page_specific_requires_part_in_range() {
        let mut config = RunConfig::default();
        config.selection.mode = SelectionModeKind::PageSpecific;
        config.selection.index_for_ps_mode = 2;
        config.selection.part_for_ps_mode = 11;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::PartOutOfRange(11))
        ));
        config.selection.part_for_ps_mode = 10;
        assert!(config.validate().is_ok());
        assert_eq!(
            config.selection.page_file_path(),
            PathBuf::from("./2_page_list.txt")
        );
    }

    #[test]
    fn inverted_wait_bounds_are_rejected() {
        let mut config = RunConfig::default();
        config.timing.wait_time_for_next_page_lb = 20;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvertedWait {
                lower: 20,
                upper: 15
            })
        ));
    }

    #[test]
    fn zero_page_load_timeout_is_rejected() {
        let config: RunConfig =
            serde_yaml::from_str("timing:\n  page_load_timeout_secs: 0\n").expect("parse");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroPageLoadTimeout)
        ));
    }

    #[test]
    fn remote_storage_needs_bucket() {
        let mut config = RunConfig::default();
        config.storage.remote_storage = true;
        assert!(matches!(config.validate(), Err(ConfigError::MissingBucket)));
        config.storage.bucket_name = "crawl-results".into();
        assert!(config.validate().is_ok());
    }
}
