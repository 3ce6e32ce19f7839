use std::sync::Arc;

use bytes::Bytes;
use chrono::{Local, NaiveDateTime};
use maritime_bucket::{BucketPresence, BucketStore};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::error::StorageError;
use crate::snapshot::VesselSnapshot;

pub const KEY_PREFIX: &str = "maritime";
pub const CONTENT_TYPE: &str = "application/json";
const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerStatus {
    Existing,
    Created,
    /// Creation failed; writes will likely fail too but the run goes on.
    Unavailable,
}

pub fn format_timestamp(captured_at: NaiveDateTime) -> String {
    captured_at.format(TIMESTAMP_FORMAT).to_string()
}

pub fn object_key(name: &str, timestamp: &str) -> String {
    format!("{KEY_PREFIX}/{name}-{timestamp}")
}

/// Writes timestamped snapshots into the configured bucket.
#[derive(Clone)]
pub struct SnapshotPersister {
    store: Arc<dyn BucketStore>,
}

impl SnapshotPersister {
    pub fn new(store: Arc<dyn BucketStore>) -> Self {
        Self { store }
    }

    /// Creates the bucket unless the store reports it as present.
    ///
    /// A probe failure other than "not found" is logged and treated as
    /// missing. Creation failure is logged and reported as `Unavailable`.
    pub async fn ensure_container(&self) -> ContainerStatus {
        let bucket = self.store.bucket();
        match self.store.head_bucket().await {
            Ok(BucketPresence::Present) => {
                info!(bucket = %bucket, "bucket exists");
                return ContainerStatus::Existing;
            }
            Ok(BucketPresence::Missing) => info!(bucket = %bucket, "creating bucket"),
            Err(err) => warn!(
                bucket = %bucket,
                error = %err,
                "bucket existence check failed; attempting creation"
            ),
        }

        match self.store.create_bucket().await {
            Ok(()) => {
                info!(bucket = %bucket, "created bucket");
                ContainerStatus::Created
            }
            Err(source) => {
                let err = StorageError::CreateBucket {
                    bucket: bucket.to_string(),
                    source,
                };
                error!(error = %err, "error creating bucket");
                ContainerStatus::Unavailable
            }
        }
    }

    /// Stores the snapshot stamped with the local time; returns its key.
    pub async fn save(
        &self,
        snapshot: Option<VesselSnapshot>,
        name: &str,
    ) -> Result<String, StorageError> {
        self.save_at(snapshot, name, Local::now().naive_local()).await
    }

    pub async fn save_at(
        &self,
        snapshot: Option<VesselSnapshot>,
        name: &str,
        captured_at: NaiveDateTime,
    ) -> Result<String, StorageError> {
        let mut snapshot = match snapshot {
            Some(snapshot) if !snapshot.is_empty() => snapshot,
            _ => return Err(StorageError::EmptySnapshot),
        };

        let timestamp = format_timestamp(captured_at);
        snapshot.stamp(&timestamp);
        let key = object_key(name, &timestamp);
        let body = serde_json::to_vec(&snapshot)?;

        if let Err(err) = self
            .store
            .put_object(&key, Bytes::from(body), CONTENT_TYPE)
            .await
        {
            error!(vessel = name, key = %key, error = %err, "error saving snapshot");
            return Err(err.into());
        }

        info!(vessel = name, key = %key, "saved snapshot");
        Ok(key)
    }

    /// Reads a stored snapshot back.
    pub async fn load(&self, key: &str) -> Result<VesselSnapshot, StorageError> {
        let bytes = self.store.get_object(key).await?;
        match serde_json::from_slice::<Value>(&bytes)? {
            Value::Object(fields) => Ok(VesselSnapshot::from(fields)),
            _ => Err(StorageError::NotAnObject(key.to_string())),
        }
    }
}
