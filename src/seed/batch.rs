use anyhow::{Context, Result};
use tracing::info;

use crate::models::NewClick;
use crate::storage::SeedTransaction;

/// Rows per multi-row insert
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Buffers clicks and writes them as one multi-row insert per full batch.
///
/// All flushes go through the same transaction; nothing is durable until
/// the caller commits it.
pub struct ClickBatch {
    pending: Vec<NewClick>,
    threshold: usize,
    inserted: u64,
    flushes: usize,
}

impl ClickBatch {
    pub fn new(threshold: usize) -> Self {
        let threshold = threshold.max(1);
        Self {
            pending: Vec::with_capacity(threshold),
            threshold,
            inserted: 0,
            flushes: 0,
        }
    }

    /// Buffer `click`, flushing once the threshold is reached
    pub async fn push(&mut self, tx: &mut dyn SeedTransaction, click: NewClick) -> Result<()> {
        self.pending.push(click);
        if self.pending.len() >= self.threshold {
            self.flush(tx).await?;
        }
        Ok(())
    }

    /// Write whatever is buffered
    pub async fn flush(&mut self, tx: &mut dyn SeedTransaction) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let rows = tx
            .insert_clicks(&self.pending)
            .await
            .with_context(|| format!("batch insert #{} failed", self.flushes + 1))?;

        self.inserted += rows;
        self.flushes += 1;
        self.pending.clear();

        info!(
            batch = self.flushes,
            rows,
            total = self.inserted,
            "inserted click batch"
        );
        Ok(())
    }

    pub fn inserted(&self) -> u64 {
        self.inserted
    }

    pub fn flushes(&self) -> usize {
        self.flushes
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}
