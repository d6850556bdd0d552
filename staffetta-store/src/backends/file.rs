use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use serde::Deserialize;
use staffetta_common::DeliveryStatus;
use tokio::fs;
use tracing::warn;

use crate::{
    StoreError, ValidationError,
    error::SerializationError,
    store::QueueStore,
    types::{QueueItem, QueueItemId, StatusCounts},
};

/// File-based queue store implementation
///
/// Each queue item is stored as a single file named `{id}.bin`, where the id
/// is a 26-character ULID and the content is the bincode-encoded item. ULIDs
/// encode creation time and are lexicographically sortable, so directory
/// listings come out in rough creation order for free.
///
/// # Security
/// - Uses atomic writes (write to temp file, then rename) so a partial write
///   never leaves a corrupt row visible
/// - Validates all filename components to prevent path traversal
/// - Only reads files matching the expected naming pattern (valid ULIDs)
///
/// # Atomicity
/// Every mutation is a whole-file rewrite finished by a rename, which is
/// atomic on POSIX filesystems. Readers see either the old row or the new
/// row, never a mix — the per-row atomicity the processor relies on.
#[derive(Debug, Clone)]
pub struct FileQueueStore {
    path: PathBuf,
}

impl Default for FileQueueStore {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/var/lib/staffetta/queue"),
        }
    }
}

// Custom Deserialize implementation with path validation
impl<'de> Deserialize<'de> for FileQueueStore {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct FileQueueStoreHelper {
            path: PathBuf,
        }

        let helper = FileQueueStoreHelper::deserialize(deserializer)?;
        Self::validate_path(&helper.path).map_err(serde::de::Error::custom)?;

        Ok(Self { path: helper.path })
    }
}

impl FileQueueStore {
    /// Create a store rooted at `path`. Call [`init`](Self::init) before use.
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// The directory this store keeps its rows in.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Validate a store path for security
    ///
    /// # Errors
    /// Returns an error if the path is relative, contains `..` components,
    /// or points into a sensitive system directory.
    pub fn validate_path(path: &Path) -> Result<(), ValidationError> {
        for component in path.components() {
            if component == std::path::Component::ParentDir {
                return Err(ValidationError::ParentComponent(
                    path.display().to_string(),
                ));
            }
        }

        if !path.is_absolute() {
            return Err(ValidationError::RelativePath(path.display().to_string()));
        }

        let sensitive_prefixes = [
            "/etc", "/bin", "/sbin", "/usr/bin", "/usr/sbin", "/boot", "/sys", "/proc", "/dev",
        ];

        for prefix in &sensitive_prefixes {
            if path.starts_with(prefix) {
                return Err(ValidationError::SystemDirectory {
                    prefix: (*prefix).to_string(),
                    path: path.display().to_string(),
                });
            }
        }

        Ok(())
    }

    /// Initialize the file-backed store
    ///
    /// Creates the store directory if it doesn't exist and validates that
    /// the path is actually a directory. Also cleans up any orphaned `.tmp`
    /// and `.deleted` files left behind by a previous crash.
    ///
    /// # Errors
    /// - If the store path fails validation
    /// - If the directory cannot be created
    /// - If the path exists but is not a directory
    pub fn init(&self) -> crate::Result<()> {
        staffetta_common::internal!("Initialising queue store ...");

        Self::validate_path(&self.path)?;

        if !self.path.try_exists()? {
            std::fs::create_dir_all(&self.path)?;
        } else if !self.path.is_dir() {
            return Err(ValidationError::NotDirectory(self.path.display().to_string()).into());
        }

        self.cleanup_stale_files()?;

        Ok(())
    }

    /// Remove files left by interrupted writes and deletes.
    fn cleanup_stale_files(&self) -> crate::Result<()> {
        let mut cleaned = 0;

        for entry in std::fs::read_dir(&self.path)? {
            let entry = entry?;
            let filename = entry.file_name();
            let filename = filename.to_string_lossy();

            if filename.ends_with(".tmp") || filename.ends_with(".deleted") {
                std::fs::remove_file(entry.path())?;
                cleaned += 1;
            }
        }

        if cleaned > 0 {
            warn!(cleaned, "Removed stale files from queue store directory");
        }

        Ok(())
    }

    fn row_path(&self, id: &QueueItemId) -> PathBuf {
        self.path.join(format!("{id}.bin"))
    }

    fn encode(item: &QueueItem) -> crate::Result<Vec<u8>> {
        bincode::serde::encode_to_vec(item, bincode::config::standard())
            .map_err(|e| SerializationError::from(e).into())
    }

    fn decode(bytes: &[u8]) -> crate::Result<QueueItem> {
        let (item, _) = bincode::serde::decode_from_slice(bytes, bincode::config::standard())
            .map_err(SerializationError::from)?;
        Ok(item)
    }

    /// Write a row atomically: temp file first, then rename into place.
    async fn write_row(&self, item: &QueueItem) -> crate::Result<()> {
        let bytes = Self::encode(item)?;
        let path = self.row_path(&item.id);
        let tmp = self.path.join(format!("{}.bin.tmp", item.id));

        fs::write(&tmp, &bytes).await?;
        fs::rename(&tmp, &path).await?;

        Ok(())
    }

    /// Read a row, mapping a missing file to `None`.
    async fn read_row(&self, id: &QueueItemId) -> crate::Result<Option<QueueItem>> {
        match fs::read(self.row_path(id)).await {
            Ok(bytes) => Ok(Some(Self::decode(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Load every row in the store.
    ///
    /// Files that disappear between listing and reading (a concurrent
    /// delete) are skipped.
    async fn load_all(&self) -> crate::Result<Vec<QueueItem>> {
        let mut items = Vec::new();
        let mut entries = fs::read_dir(&self.path).await?;

        while let Some(entry) = entries.next_entry().await? {
            let filename = entry.file_name();
            let Some(id) = QueueItemId::from_filename(&filename.to_string_lossy()) else {
                continue;
            };

            if let Some(item) = self.read_row(&id).await? {
                items.push(item);
            }
        }

        Ok(items)
    }
}

#[async_trait]
impl QueueStore for FileQueueStore {
    async fn insert(&self, item: &QueueItem) -> crate::Result<()> {
        if fs::try_exists(self.row_path(&item.id)).await? {
            return Err(StoreError::AlreadyExists(item.id.clone()));
        }

        self.write_row(item).await
    }

    async fn get(&self, id: &QueueItemId) -> crate::Result<Option<QueueItem>> {
        self.read_row(id).await
    }

    async fn most_recent_for_lead(&self, lead_id: &str) -> crate::Result<Option<QueueItem>> {
        Ok(self
            .load_all()
            .await?
            .into_iter()
            .filter(|item| item.lead_id == lead_id)
            .max_by_key(|item| (item.created_at, item.id.clone())))
    }

    async fn exists_for_lead(&self, lead_id: &str) -> crate::Result<bool> {
        Ok(self
            .load_all()
            .await?
            .iter()
            .any(|item| item.lead_id == lead_id))
    }

    async fn select_due_pending(&self, now: u64, limit: usize) -> crate::Result<Vec<QueueItem>> {
        let mut due: Vec<_> = self
            .load_all()
            .await?
            .into_iter()
            .filter(|item| item.is_due(now))
            .collect();

        due.sort_by(|a, b| a.fifo_key().cmp(&b.fifo_key()));
        due.truncate(limit);

        Ok(due)
    }

    async fn mark_sent(&self, id: &QueueItemId, sent_at: u64) -> crate::Result<()> {
        let mut item = self
            .read_row(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        if item.status == DeliveryStatus::Sent {
            return Ok(());
        }

        item.status = DeliveryStatus::Sent;
        item.sent_at = Some(sent_at);

        self.write_row(&item).await
    }

    async fn mark_failed(
        &self,
        id: &QueueItemId,
        error: &str,
        retry_count: u32,
        next_retry_at: Option<u64>,
    ) -> crate::Result<()> {
        let mut item = self
            .read_row(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        item.last_error = Some(error.to_string());
        item.retry_count = retry_count;
        item.next_retry_at = next_retry_at;
        item.status = if next_retry_at.is_some() {
            DeliveryStatus::Pending
        } else {
            DeliveryStatus::Failed
        };

        self.write_row(&item).await
    }

    async fn delete(&self, id: &QueueItemId) -> crate::Result<()> {
        let path = self.row_path(id);
        let tombstone = self.path.join(format!("{id}.bin.deleted"));

        // Rename first so a crash mid-delete leaves a file init() will sweep
        match fs::rename(&path, &tombstone).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound(id.clone()));
            }
            Err(e) => return Err(e.into()),
        }

        fs::remove_file(&tombstone).await?;

        Ok(())
    }

    async fn count_by_status(&self) -> crate::Result<StatusCounts> {
        Ok(StatusCounts::tally(
            self.load_all().await?.into_iter().map(|item| item.status),
        ))
    }
}
