// crates/maritime-core/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request to tracking API failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("tracking API response could not be decoded: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("tracking API returned status {status}")]
    Status { status: u16 },

    #[error("tracking API response was not a JSON object")]
    NotAnObject,

    #[error("tracking API returned no vessel data")]
    Empty,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("field `{field}` should be an object")]
    ExpectedObject { field: &'static str },

    #[error("field `{field}` should be an array")]
    ExpectedArray { field: &'static str },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("no snapshot data to store")]
    EmptySnapshot,

    #[error("bucket {bucket} could not be created: {source}")]
    CreateBucket {
        bucket: String,
        #[source]
        source: maritime_bucket::BucketError,
    },

    #[error("bucket operation failed: {0}")]
    Bucket(#[from] maritime_bucket::BucketError),

    #[error("snapshot JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("stored object {0} is not a JSON object")]
    NotAnObject(String),
}

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("publishing to {topic} failed: {message}")]
    Publish { topic: String, message: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("environment variable {0} must be set")]
    Missing(&'static str),

    #[error("environment variable {var} is invalid: {message}")]
    Invalid { var: &'static str, message: String },

    #[error("vessel roster could not be read: {0}")]
    Io(#[from] std::io::Error),

    #[error("vessel roster is not valid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("vessel roster is invalid: {0}")]
    Roster(String),
}
