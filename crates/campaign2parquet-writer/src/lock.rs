//! Single-writer run lock.
//!
//! The lock is an object at `<base>/_campaign2parquet.lock` holding the run id
//! of its owner. Acquisition is check-then-write: backends without conditional
//! writes cannot make it atomic, it only guards against overlapping scheduled
//! runs. A crashed run leaves the lock behind and must be cleared by hand.

use opendal::Operator;

use crate::error::{Result, WriterError};
use crate::tree;

#[derive(Debug)]
pub(crate) struct RunLock {
    path: String,
    run_id: String,
}

impl RunLock {
    pub(crate) async fn acquire(op: &Operator, path: String, run_id: &str) -> Result<Self> {
        let held = op.exists(&path).await.map_err(|e| {
            WriterError::write_failure(format!("Failed to check lock '{}': {}", path, e))
        })?;

        if held {
            let holder = match op.read(&path).await {
                Ok(data) => String::from_utf8_lossy(&data.to_vec()).trim().to_string(),
                Err(_) => "unknown".to_string(),
            };
            return Err(WriterError::concurrent_run(path, holder));
        }

        op.write(&path, run_id.as_bytes().to_vec())
            .await
            .map_err(|e| {
                WriterError::write_failure(format!("Failed to write lock '{}': {}", path, e))
            })?;

        tracing::debug!(lock = %path, run_id, "Acquired run lock");
        Ok(Self {
            path,
            run_id: run_id.to_string(),
        })
    }

    pub(crate) async fn release(self, op: &Operator) {
        match tree::delete_file(op, &self.path).await {
            Ok(()) => tracing::debug!(lock = %self.path, run_id = %self.run_id, "Released run lock"),
            Err(e) => tracing::warn!(
                lock = %self.path,
                run_id = %self.run_id,
                error = %e,
                "Failed to release run lock; remove it before the next run"
            ),
        }
    }
}
