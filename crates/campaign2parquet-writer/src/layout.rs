//! Object layout under the output base path.
//!
//! ```text
//! <base>/_campaign2parquet.lock
//! <base>/partitioned/_SUCCESS
//! <base>/partitioned/createdat_date=<date>/part-<hash16>.parquet
//! <base>/_staging/<run_id>/createdat_date=<date>/part-<hash16>.parquet
//! <base>/_backup/<run_id>/...
//! ```

use campaign2parquet_core::PARTITION_COLUMN;

pub(crate) const COMMITTED_DIR: &str = "partitioned";
pub(crate) const STAGING_DIR: &str = "_staging";
pub(crate) const BACKUP_DIR: &str = "_backup";
pub(crate) const LOCK_FILE: &str = "_campaign2parquet.lock";
pub(crate) const SUCCESS_MARKER: &str = "_SUCCESS";

/// Hex characters of the content hash used in file names
const FILE_HASH_LEN: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Layout {
    root: String,
}

impl Layout {
    pub(crate) fn new(base_path: &str) -> Self {
        Self {
            root: base_path.trim_matches('/').to_string(),
        }
    }

    pub(crate) fn lock_path(&self) -> String {
        format!("{}/{}", self.root, LOCK_FILE)
    }

    pub(crate) fn committed_dir(&self) -> String {
        format!("{}/{}/", self.root, COMMITTED_DIR)
    }

    pub(crate) fn success_marker(&self) -> String {
        format!("{}{}", self.committed_dir(), SUCCESS_MARKER)
    }

    pub(crate) fn staging_root(&self) -> String {
        format!("{}/{}/", self.root, STAGING_DIR)
    }

    pub(crate) fn staging_dir(&self, run_id: &str) -> String {
        format!("{}{}/", self.staging_root(), run_id)
    }

    pub(crate) fn backup_root(&self) -> String {
        format!("{}/{}/", self.root, BACKUP_DIR)
    }

    pub(crate) fn backup_dir(&self, run_id: &str) -> String {
        format!("{}{}/", self.backup_root(), run_id)
    }

    /// Path of a partition file relative to the committed or staging directory
    pub(crate) fn partition_file(value: &str, content_hash: &str) -> String {
        let short = content_hash.get(..FILE_HASH_LEN).unwrap_or(content_hash);
        format!("{}={}/part-{}.parquet", PARTITION_COLUMN, value, short)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_rooted_at_trimmed_base() {
        let layout = Layout::new("/data/");
        assert_eq!(layout.committed_dir(), "data/partitioned/");
        assert_eq!(layout.success_marker(), "data/partitioned/_SUCCESS");
        assert_eq!(layout.lock_path(), "data/_campaign2parquet.lock");
        assert_eq!(layout.staging_dir("r1"), "data/_staging/r1/");
        assert_eq!(layout.backup_dir("r1"), "data/_backup/r1/");
    }

    #[test]
    fn partition_file_uses_short_hash() {
        let hash = "0123456789abcdef0123456789abcdef";
        assert_eq!(
            Layout::partition_file("2024-05-01", hash),
            "createdat_date=2024-05-01/part-0123456789abcdef.parquet"
        );
    }
}
