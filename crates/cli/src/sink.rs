//! Batch sink writing one JSON array per flushed batch

use anyhow::Context;
use async_trait::async_trait;
use easybulk::BulkOperation;
use std::path::Path;
use tokio::fs::OpenOptions;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::debug;

type Writer = Box<dyn AsyncWrite + Send + Unpin>;

/// Writes every batch as a JSON-lines record
pub struct JsonLinesSink {
    writer: Mutex<Writer>,
}

impl JsonLinesSink {
    /// Sink writing to standard output
    pub fn stdout() -> Self {
        Self::from_writer(Box::new(tokio::io::stdout()))
    }

    /// Sink appending to `path`, created if missing
    pub async fn append_to(path: &Path) -> anyhow::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .with_context(|| format!("Failed to open output file {}", path.display()))?;
        debug!("Appending batches to {:?}", path);
        Ok(Self::from_writer(Box::new(file)))
    }

    fn from_writer(writer: Writer) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }
}

#[async_trait]
impl BulkOperation<String> for JsonLinesSink {
    async fn execute(&self, batch: &[String]) -> anyhow::Result<()> {
        let mut line = serde_json::to_string(batch).context("Failed to encode batch")?;
        line.push('\n');

        let mut writer = self.writer.lock().await;
        writer
            .write_all(line.as_bytes())
            .await
            .context("Failed to write batch")?;
        writer.flush().await.context("Failed to flush batch")?;
        Ok(())
    }
}
