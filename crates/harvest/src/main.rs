mod args;
mod logging;

use anyhow::Context;
use args::Args;
use clap::Parser;
use harvest_engine::aggregate::output_file_name;
use harvest_engine::selection;
use harvest_engine::sink::{export, write_retry_checkpoint};
use harvest_engine::{
    ConfigLoader, CrawlError, LaunchOptions, LocalSink, Orchestrator, Pacing, ResultSink,
    ResultTable, RunConfig, RunState, SelectionSet, StealthProfile, Target, targets,
};
use harvest_h::{ChromiumLauncher, YelpExtractor};
use std::path::Path;
use std::process::ExitCode;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let (mut config, source) = match &args.config {
        Some(path) => {
            let config = ConfigLoader::load_from(path)
                .await
                .with_context(|| format!("Failed to load {}", path.display()))?;
            (config, Some(path.clone()))
        }
        None => ConfigLoader::load_default().await?,
    };
    args.apply(&mut config);
    config.validate()?;
    let _log_guard = logging::init(&config.logging)?;
    match source {
        Some(path) => info!("Using configuration from {}", path.display()),
        None => info!("No configuration file found; using defaults"),
    }

    let kind = config.collected_object;
    let targets = load_targets(&config).await?;
    let sink = result_sink(&config).await?;
    let selection = selection::resolve(&config.selection, targets.len()).await?;
    info!(
        "Collecting {} data for {} of {} targets",
        kind,
        selection.len(),
        targets.len()
    );

    let options = LaunchOptions {
        headless: config.browser.headless,
        page_load_timeout: config.timing.page_load_timeout(),
        stealth: StealthProfile::default(),
    };
    let mut orchestrator = Orchestrator::new(
        kind,
        targets,
        selection,
        ChromiumLauncher,
        options,
        YelpExtractor::new(config.timing.page_load_timeout()),
        Pacing::from_config(&config.timing),
    );

    let outcome = orchestrator.run().await;
    orchestrator.shutdown().await;
    orchestrator.state().log_report(kind);
    if orchestrator.session_resets() > 0 {
        info!(
            "The browser was reconfigured {} times",
            orchestrator.session_resets()
        );
    }

    finish(
        &config,
        outcome,
        orchestrator.selection(),
        orchestrator.state(),
        orchestrator.table(),
        &*sink,
    )
    .await
}

/// Saves the retry checkpoint, then the result file.
///
/// Neither step stops the other. Every error, including the crawl's own,
/// ends up in the returned error.
async fn finish(
    config: &RunConfig,
    outcome: Result<(), CrawlError>,
    selection: &SelectionSet,
    state: &RunState,
    table: Option<ResultTable>,
    sink: &dyn ResultSink,
) -> anyhow::Result<()> {
    let mut errors: Vec<anyhow::Error> = Vec::new();
    if let Err(e) = outcome {
        errors.push(e.into());
    }

    if config.storage.write_retry_checkpoint {
        let retry = state.retry_indices();
        if let Err(e) = write_retry_checkpoint(&config.selection.checkpoint_dir, &retry).await {
            error!("Failed to write the retry checkpoint: {}", e);
            errors.push(anyhow::Error::new(e).context("Failed to write the retry checkpoint"));
        }
    }

    match table {
        Some(table) if !table.is_empty() => {
            let name = output_file_name(
                &config.storage.output_prefix,
                config.collected_object,
                selection,
                state,
                config.storage.index_suffix,
            );
            if let Err(e) = export(&table, &name, sink).await {
                error!("Failed to save {}: {}", name, e);
                errors.push(anyhow::Error::new(e).context(format!("Failed to save {name}")));
            }
        }
        _ => warn!("Nothing collected; no result file written"),
    }

    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => {
            let message = errors
                .iter()
                .map(|e| format!("{:#}", e))
                .collect::<Vec<_>>()
                .join("; ");
            Err(anyhow::anyhow!(message))
        }
    }
}

async fn load_targets(config: &RunConfig) -> anyhow::Result<Vec<Target>> {
    let file = config.storage.target_list_file();
    if config.storage.remote_storage {
        return load_remote_targets(config, &file).await;
    }
    Ok(targets::load_target_list(Path::new(&file), config.collected_object).await?)
}

#[cfg(feature = "s3")]
async fn load_remote_targets(config: &RunConfig, file: &str) -> anyhow::Result<Vec<Target>> {
    let sink = harvest_engine::sink::S3Sink::from_env(config.storage.bucket_name.clone()).await;
    let bytes = sink.fetch_object(file).await?;
    let targets = targets::parse_target_list(bytes.as_slice(), config.collected_object)?;
    info!(
        "Loaded {} targets from s3://{}/{}",
        targets.len(),
        config.storage.bucket_name,
        file
    );
    Ok(targets)
}

#[cfg(not(feature = "s3"))]
async fn load_remote_targets(_config: &RunConfig, _file: &str) -> anyhow::Result<Vec<Target>> {
    anyhow::bail!("remote storage requires building with the `s3` feature")
}

#[cfg(feature = "s3")]
async fn result_sink(config: &RunConfig) -> anyhow::Result<Box<dyn ResultSink>> {
    if config.storage.remote_storage {
        let sink =
            harvest_engine::sink::S3Sink::from_env(config.storage.bucket_name.clone()).await;
        return Ok(Box::new(sink));
    }
    Ok(Box::new(LocalSink::new(config.storage.output_dir.clone())))
}

#[cfg(not(feature = "s3"))]
async fn result_sink(config: &RunConfig) -> anyhow::Result<Box<dyn ResultSink>> {
    if config.storage.remote_storage {
        anyhow::bail!("remote storage requires building with the `s3` feature");
    }
    Ok(Box::new(LocalSink::new(config.storage.output_dir.clone())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use harvest_engine::model::{RawProfile, Record};
    use harvest_engine::selection::SelectionMode;
    use harvest_engine::sink::RETRY_INDEX_FILE;
    use harvest_engine::{Aggregator, ObjectKind, SinkError};

    struct UnreachableBucket;

    #[async_trait]
    impl ResultSink for UnreachableBucket {
        async fn put(&self, _name: &str, _bytes: Vec<u8>) -> Result<String, SinkError> {
            Err(SinkError::Remote("put_object failed: connection refused".to_string()))
        }
    }

    fn config_in(dir: &Path) -> RunConfig {
        let mut config = RunConfig::default();
        config.collected_object = ObjectKind::Profile;
        config.selection.checkpoint_dir = dir.join("checkpoints");
        config.storage.output_dir = dir.join("out");
        config
    }

    fn range(min: usize, max: usize) -> SelectionSet {
        SelectionSet {
            indices: (min..=max).collect(),
            tokens: None,
            mode: SelectionMode::Range { min, max },
        }
    }

    fn two_profiles() -> ResultTable {
        let mut aggregator = Aggregator::new();
        for index in 0..2 {
            aggregator.insert(index, Record::Profile(RawProfile::default().fill()));
        }
        aggregator.table(ObjectKind::Profile).unwrap()
    }

    #[tokio::test]
    async fn failed_export_keeps_checkpoint_and_crawl_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let state = RunState {
            total: 5,
            attempted: 3,
            success: 2,
            failure: 1,
            failed: vec![2],
            remaining: vec![3, 4],
            ..Default::default()
        };
        let blocked = Err(CrawlError::Blocked {
            index: 2,
            url: "https://site.test/biz/b2".to_string(),
        });

        let err = finish(
            &config,
            blocked,
            &range(0, 4),
            &state,
            Some(two_profiles()),
            &UnreachableBucket,
        )
        .await
        .unwrap_err();

        let message = format!("{:#}", err);
        assert!(message.contains("detected the crawler at index 2"), "{message}");
        assert!(message.contains("put_object failed"), "{message}");

        let checkpoint = config.selection.checkpoint_dir.join(RETRY_INDEX_FILE);
        assert_eq!(std::fs::read_to_string(checkpoint).unwrap(), "2,3,4");
    }

    #[tokio::test]
    async fn clean_run_writes_results_and_no_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let state = RunState {
            total: 2,
            attempted: 2,
            success: 2,
            ..Default::default()
        };
        let sink = LocalSink::new(config.storage.output_dir.clone());

        finish(&config, Ok(()), &range(0, 1), &state, Some(two_profiles()), &sink)
            .await
            .unwrap();

        let result = dir.path().join("out").join("yelp_profile_from_0_to_1.csv");
        let csv = std::fs::read_to_string(result).unwrap();
        assert_eq!(csv.lines().count(), 3);
        assert!(!config.selection.checkpoint_dir.join(RETRY_INDEX_FILE).exists());
    }
}
