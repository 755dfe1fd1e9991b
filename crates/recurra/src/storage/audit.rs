use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use recurra_core::storage::{AuditRecord, AuditSink, Result};

/// Audit sink that emits each record as a structured log line.
#[derive(Debug, Clone, Default)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, entry: &AuditRecord) -> Result<()> {
        tracing::info!(
            target: "recurra::audit",
            action = ?entry.action,
            event_id = %entry.event_id,
            user_id = %entry.user_id,
            recorded_at = %entry.recorded_at,
            "Event mutation"
        );
        Ok(())
    }
}

/// Audit sink that keeps every record in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAuditLog {
    records: Arc<RwLock<Vec<AuditRecord>>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every record so far, oldest first.
    pub async fn records(&self) -> Vec<AuditRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl AuditSink for InMemoryAuditLog {
    async fn record(&self, entry: &AuditRecord) -> Result<()> {
        self.records.write().await.push(entry.clone());
        Ok(())
    }
}
