use std::fmt;

use maritime_bucket::S3Config;

use crate::error::ConfigError;

pub const DEFAULT_API_URL: &str = "https://api.datalastic.com/api/v0/vessel_pro";
pub const DEFAULT_REGION: &str = "us-east-1";

#[derive(Clone)]
pub struct TrackingApiConfig {
    pub base_url: String,
    pub api_key: String,
}

impl fmt::Debug for TrackingApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackingApiConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub tracking: TrackingApiConfig,
    pub bucket: S3Config,
    pub topic_arn: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds the configuration from any variable source; empty values count
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|value| !value.trim().is_empty());
        let require = |var: &'static str| get(var).ok_or(ConfigError::Missing(var));

        let tracking = TrackingApiConfig {
            base_url: get("MARITIME_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            api_key: require("MARITIME_API_KEY")?,
        };

        let force_path_style = match get("S3_FORCE_PATH_STYLE") {
            None => false,
            Some(value) => parse_flag("S3_FORCE_PATH_STYLE", &value)?,
        };

        let bucket = S3Config {
            bucket: require("AWS_BUCKET_NAME")?,
            region: get("AWS_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string()),
            endpoint: get("S3_ENDPOINT_URL"),
            access_key_id: get("S3_ACCESS_KEY_ID"),
            secret_access_key: get("S3_SECRET_ACCESS_KEY"),
            force_path_style,
        };

        Ok(Self {
            tracking,
            bucket,
            topic_arn: get("SNS_TOPIC_ARN"),
        })
    }

    pub fn region(&self) -> &str {
        &self.bucket.region
    }

    /// The broadcast variant cannot run without a topic.
    pub fn require_topic(&self) -> Result<&str, ConfigError> {
        self.topic_arn
            .as_deref()
            .ok_or(ConfigError::Missing("SNS_TOPIC_ARN"))
    }
}

fn parse_flag(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        other => Err(ConfigError::Invalid {
            var,
            message: format!("expected a boolean, got {other:?}"),
        }),
    }
}
