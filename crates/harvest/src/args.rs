use clap::{Parser, ValueEnum};
use harvest_engine::ObjectKind;
use harvest_engine::RunConfig;
use harvest_engine::config::SelectionModeKind;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ObjectArg {
    Profile,
    Review,
    Business,
}

impl From<ObjectArg> for ObjectKind {
    fn from(value: ObjectArg) -> Self {
        match value {
            ObjectArg::Profile => ObjectKind::Profile,
            ObjectArg::Review => ObjectKind::Review,
            ObjectArg::Business => ObjectKind::Business,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModeArg {
    Range,
    IndexSpecified,
    PageSpecific,
}

impl From<ModeArg> for SelectionModeKind {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Range => SelectionModeKind::Range,
            ModeArg::IndexSpecified => SelectionModeKind::IndexSpecified,
            ModeArg::PageSpecific => SelectionModeKind::PageSpecific,
        }
    }
}

/// Flags override values from the configuration file.
#[derive(Parser, Debug)]
#[command(name = "harvest", version, about = "Resumable review-site crawler")]
pub struct Args {
    /// Configuration file (default: ./harvest.yaml, then ~/.harvest/config.yaml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// What to collect
    #[arg(long, value_enum)]
    pub object: Option<ObjectArg>,

    /// How targets are selected
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    #[arg(long, allow_negative_numbers = true)]
    pub min_index: Option<i64>,

    /// Last index to visit, -1 for the end of the list
    #[arg(long, allow_negative_numbers = true)]
    pub max_index: Option<i64>,

    /// Target whose pages are split in page-specific mode
    #[arg(long, allow_negative_numbers = true)]
    pub index_for_ps_mode: Option<i64>,

    /// Which tenth of the target's pages to walk (1-10)
    #[arg(long)]
    pub part_for_ps_mode: Option<u8>,

    /// Directory holding index_list.txt and <index>_page_list.txt
    #[arg(long)]
    pub checkpoint_dir: Option<PathBuf>,

    /// Explicit index file name inside the checkpoint directory
    #[arg(long)]
    pub index_file: Option<String>,

    /// Target list name without the .csv extension
    #[arg(long)]
    pub target_list: Option<String>,

    #[arg(long)]
    pub wait_time_for_new_index: Option<u64>,

    #[arg(long)]
    pub additional_wait_time: Option<u64>,

    #[arg(long)]
    pub wait_time_for_next_page_lb: Option<u64>,

    #[arg(long)]
    pub wait_time_for_next_page_ub: Option<u64>,

    #[arg(long)]
    pub page_load_timeout: Option<u64>,

    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    #[arg(long)]
    pub output_prefix: Option<String>,

    /// Name result files without the selection suffix
    #[arg(long)]
    pub no_index_suffix: bool,

    /// Read the target list from and write results to this bucket
    #[arg(long)]
    pub bucket: Option<String>,

    /// Launch a visible browser window
    #[arg(long)]
    pub visible: bool,

    #[arg(short, long)]
    pub verbose: bool,

    /// Also write the log to logs/harvest-<timestamp>.log
    #[arg(long)]
    pub save_log: bool,
}

impl Args {
    pub fn apply(&self, config: &mut RunConfig) {
        if let Some(object) = self.object {
            config.collected_object = object.into();
        }

        let selection = &mut config.selection;
        if let Some(mode) = self.mode {
            selection.mode = mode.into();
        }
        if let Some(min) = self.min_index {
            selection.min_index = min;
        }
        if let Some(max) = self.max_index {
            selection.max_index = max;
        }
        if let Some(index) = self.index_for_ps_mode {
            selection.index_for_ps_mode = index;
        }
        if let Some(part) = self.part_for_ps_mode {
            selection.part_for_ps_mode = part;
        }
        if let Some(dir) = &self.checkpoint_dir {
            selection.checkpoint_dir = dir.clone();
        }
        if let Some(file) = &self.index_file {
            selection.index_file = file.clone();
        }

        let timing = &mut config.timing;
        if let Some(secs) = self.wait_time_for_new_index {
            timing.wait_time_for_new_index = secs;
        }
        if let Some(secs) = self.additional_wait_time {
            timing.additional_wait_time = secs;
        }
        if let Some(secs) = self.wait_time_for_next_page_lb {
            timing.wait_time_for_next_page_lb = secs;
        }
        if let Some(secs) = self.wait_time_for_next_page_ub {
            timing.wait_time_for_next_page_ub = secs;
        }
        if let Some(secs) = self.page_load_timeout {
            timing.page_load_timeout_secs = secs;
        }

        let storage = &mut config.storage;
        if let Some(name) = &self.target_list {
            storage.target_list_name = name.clone();
        }
        if let Some(dir) = &self.output_dir {
            storage.output_dir = dir.clone();
        }
        if let Some(prefix) = &self.output_prefix {
            storage.output_prefix = prefix.clone();
        }
        if self.no_index_suffix {
            storage.index_suffix = false;
        }
        if let Some(bucket) = &self.bucket {
            storage.remote_storage = true;
            storage.bucket_name = bucket.clone();
        }

        if self.visible {
            config.browser.headless = false;
        }
        if self.verbose {
            config.logging.verbose = true;
        }
        if self.save_log {
            config.logging.save_log = true;
        }
    }
}
