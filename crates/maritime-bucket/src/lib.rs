//! Abstractions over S3-compatible storage backends used for vessel snapshots.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_credential_types::provider::SharedCredentialsProvider;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use bytes::Bytes;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Mutex;
use thiserror::Error;

const DEFAULT_REGION: &str = "us-east-1";

#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    pub endpoint: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub force_path_style: bool,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            bucket: "maritime-snapshots".to_string(),
            region: DEFAULT_REGION.to_string(),
            endpoint: None,
            access_key_id: None,
            secret_access_key: None,
            force_path_style: false,
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BucketError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("sdk error: {0}")]
    Sdk(String),
    #[error("object not found: {0}")]
    NotFound(String),
}

impl BucketError {
    fn from_sdk(err: impl fmt::Display) -> Self {
        Self::Sdk(err.to_string())
    }
}

/// Result of probing the target bucket.
///
/// `Missing` is only reported when the backend says the bucket does not
/// exist; any other probe failure comes back as `Err`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketPresence {
    Present,
    Missing,
}

#[async_trait]
pub trait BucketStore: Send + Sync {
    fn bucket(&self) -> &str;
    async fn head_bucket(&self) -> Result<BucketPresence, BucketError>;
    async fn create_bucket(&self) -> Result<(), BucketError>;
    async fn put_object(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<(), BucketError>;
    async fn get_object(&self, key: &str) -> Result<Bytes, BucketError>;
}

#[derive(Clone)]
pub struct S3BucketStore {
    client: Client,
    bucket: String,
    region: String,
}

impl S3BucketStore {
    pub async fn new(config: S3Config) -> Result<Self, BucketError> {
        if config.bucket.is_empty() {
            return Err(BucketError::Configuration(
                "bucket name cannot be empty".into(),
            ));
        }

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));

        if let (Some(access_key), Some(secret_key)) =
            (&config.access_key_id, &config.secret_access_key)
        {
            let credentials = Credentials::new(access_key, secret_key, None, None, "static");
            loader = loader.credentials_provider(SharedCredentialsProvider::new(credentials));
        }

        let shared_config = loader.load().await;
        let mut builder = aws_sdk_s3::config::Builder::from(&shared_config);

        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        if config.force_path_style {
            builder = builder.force_path_style(true);
        }

        let client = Client::from_conf(builder.build());
        Ok(Self {
            client,
            bucket: config.bucket,
            region: config.region,
        })
    }
}

#[async_trait]
impl BucketStore for S3BucketStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn head_bucket(&self) -> Result<BucketPresence, BucketError> {
        match self.client.head_bucket().bucket(&self.bucket).send().await {
            Ok(_) => Ok(BucketPresence::Present),
            // HeadBucket has no body, so some backends only signal a bare 404.
            Err(SdkError::ServiceError(service_err))
                if service_err.err().is_not_found()
                    || service_err.raw().status().as_u16() == 404 =>
            {
                Ok(BucketPresence::Missing)
            }
            Err(other) => Err(BucketError::from_sdk(other)),
        }
    }

    async fn create_bucket(&self) -> Result<(), BucketError> {
        let mut request = self.client.create_bucket().bucket(&self.bucket);

        // us-east-1 rejects an explicit location constraint.
        if self.region != DEFAULT_REGION {
            let configuration = CreateBucketConfiguration::builder()
                .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                .build();
            request = request.create_bucket_configuration(configuration);
        }

        match request.send().await {
            Ok(_) => Ok(()),
            Err(SdkError::ServiceError(service_err))
                if service_err.err().is_bucket_already_owned_by_you() =>
            {
                Ok(())
            }
            Err(other) => Err(BucketError::from_sdk(other)),
        }
    }

    async fn put_object(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<(), BucketError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes.to_vec()))
            .content_type(content_type)
            .send()
            .await
            .map_err(BucketError::from_sdk)?;
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<Bytes, BucketError> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| match err.into_service_error() {
                GetObjectError::NoSuchKey(_) => BucketError::NotFound(key.to_string()),
                other => BucketError::from_sdk(other),
            })?;

        let data = output.body.collect().await.map_err(BucketError::from_sdk)?;
        Ok(Bytes::from(data.into_bytes()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Bytes,
    pub content_type: String,
}

#[derive(Debug, Default)]
struct MemoryState {
    exists: bool,
    objects: BTreeMap<String, StoredObject>,
    head_error: Option<BucketError>,
    create_error: Option<BucketError>,
    failing_prefixes: HashSet<String>,
    create_calls: usize,
}

/// In-process bucket used by tests and dry runs.
///
/// Failures can be injected per operation so callers can exercise their
/// error paths without a live backend.
#[derive(Debug)]
pub struct InMemoryBucketStore {
    bucket: String,
    state: Mutex<MemoryState>,
}

impl InMemoryBucketStore {
    /// A bucket that does not exist yet.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            state: Mutex::new(MemoryState::default()),
        }
    }

    /// A bucket that already exists.
    pub fn existing(bucket: impl Into<String>) -> Self {
        let store = Self::new(bucket);
        store.lock().exists = true;
        store
    }

    pub fn with_head_error(self, error: BucketError) -> Self {
        self.lock().head_error = Some(error);
        self
    }

    pub fn with_create_error(self, error: BucketError) -> Self {
        self.lock().create_error = Some(error);
        self
    }

    /// Reject every `put_object` whose key starts with `prefix`.
    pub fn failing_puts_under(self, prefix: impl Into<String>) -> Self {
        self.lock().failing_prefixes.insert(prefix.into());
        self
    }

    pub fn exists(&self) -> bool {
        self.lock().exists
    }

    pub fn create_calls(&self) -> usize {
        self.lock().create_calls
    }

    pub fn keys(&self) -> Vec<String> {
        self.lock().objects.keys().cloned().collect()
    }

    pub fn object(&self, key: &str) -> Option<StoredObject> {
        self.lock().objects.get(key).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        // A poisoned lock only means a test panicked mid-operation.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl BucketStore for InMemoryBucketStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn head_bucket(&self) -> Result<BucketPresence, BucketError> {
        let state = self.lock();
        if let Some(error) = &state.head_error {
            return Err(error.clone());
        }
        Ok(if state.exists {
            BucketPresence::Present
        } else {
            BucketPresence::Missing
        })
    }

    async fn create_bucket(&self) -> Result<(), BucketError> {
        let mut state = self.lock();
        state.create_calls += 1;
        if let Some(error) = &state.create_error {
            return Err(error.clone());
        }
        state.exists = true;
        Ok(())
    }

    async fn put_object(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<(), BucketError> {
        let mut state = self.lock();
        if !state.exists {
            return Err(BucketError::Sdk(format!(
                "NoSuchBucket: {} does not exist",
                self.bucket
            )));
        }
        if state
            .failing_prefixes
            .iter()
            .any(|prefix| key.starts_with(prefix.as_str()))
        {
            return Err(BucketError::Sdk(format!("injected put failure for {key}")));
        }
        state.objects.insert(
            key.to_string(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<Bytes, BucketError> {
        self.lock()
            .objects
            .get(key)
            .map(|object| object.bytes.clone())
            .ok_or_else(|| BucketError::NotFound(key.to_string()))
    }
}
