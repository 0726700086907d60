//! Where result tables and retry checkpoints end up.

use crate::aggregate::ResultTable;
use crate::error::SinkError;
use crate::selection::format_index_list;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

/// Written next to `index_list.txt` so a later run can resume from it.
pub const RETRY_INDEX_FILE: &str = "retry_index_list.txt";

#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Stores `bytes` under `name` and returns where they went.
    async fn put(&self, name: &str, bytes: Vec<u8>) -> Result<String, SinkError>;
}

/// Writes into a local directory, creating it when needed.
#[derive(Debug, Clone)]
pub struct LocalSink {
    dir: PathBuf,
}

impl LocalSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl ResultSink for LocalSink {
    async fn put(&self, name: &str, bytes: Vec<u8>) -> Result<String, SinkError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(name);
        tokio::fs::write(&path, bytes).await?;
        Ok(path.display().to_string())
    }
}

/// Renders `table` as CSV and hands it to `sink`.
pub async fn export(
    table: &ResultTable,
    name: &str,
    sink: &dyn ResultSink,
) -> Result<String, SinkError> {
    info!("Saving {} rows", table.len());
    let bytes = table.to_csv()?;
    let location = sink.put(name, bytes).await?;
    info!("Saved the result to {}", location);
    Ok(location)
}

/// Writes `indices` to `dir/retry_index_list.txt` in the index-file format.
/// An empty list writes nothing.
pub async fn write_retry_checkpoint(
    dir: &Path,
    indices: &[usize],
) -> Result<Option<PathBuf>, SinkError> {
    if indices.is_empty() {
        return Ok(None);
    }
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(RETRY_INDEX_FILE);
    tokio::fs::write(&path, format_index_list(indices)).await?;
    info!("Wrote {} indices to retry to {}", indices.len(), path.display());
    Ok(Some(path))
}

#[cfg(feature = "s3")]
pub use s3::S3Sink;

#[cfg(feature = "s3")]
mod s3 {
    use super::ResultSink;
    use crate::error::SinkError;
    use async_trait::async_trait;
    use aws_sdk_s3::Client;
    use aws_sdk_s3::primitives::ByteStream;

    /// Puts objects into one bucket using credentials from the environment.
    #[derive(Debug, Clone)]
    pub struct S3Sink {
        client: Client,
        bucket: String,
    }

    impl S3Sink {
        pub fn new(client: Client, bucket: impl Into<String>) -> Self {
            Self {
                client,
                bucket: bucket.into(),
            }
        }

        pub async fn from_env(bucket: impl Into<String>) -> Self {
            let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
            Self::new(Client::new(&config), bucket)
        }

        /// Downloads one object, e.g. the target list.
        pub async fn fetch_object(&self, key: &str) -> Result<Vec<u8>, SinkError> {
            let response = self
                .client
                .get_object()
                .bucket(&self.bucket)
                .key(key)
                .send()
                .await
                .map_err(|err| SinkError::Remote(format!("get_object failed: {err}")))?;
            let collected = response
                .body
                .collect()
                .await
                .map_err(|err| SinkError::Remote(format!("reading {key} failed: {err}")))?;
            Ok(collected.into_bytes().to_vec())
        }
    }

    #[async_trait]
    impl ResultSink for S3Sink {
        async fn put(&self, name: &str, bytes: Vec<u8>) -> Result<String, SinkError> {
            self.client
                .put_object()
                .bucket(&self.bucket)
                .key(name)
                .content_type("text/csv")
                .body(ByteStream::from(bytes))
                .send()
                .await
                .map_err(|err| SinkError::Remote(format!("put_object failed: {err}")))?;
            Ok(format!("s3://{}/{}", self.bucket, name))
        }
    }
}
