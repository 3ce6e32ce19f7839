use serde::{Deserialize, Serialize};

use crate::error::NotificationError;
use crate::pipeline::BroadcastReport;

pub const SUCCESS_BODY: &str = "Maritime data processed and notification sent!";

/// Status object returned by the event-triggered entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResponse {
    pub status_code: u16,
    pub body: String,
}

impl InvocationResponse {
    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }
}

impl From<&Result<BroadcastReport, NotificationError>> for InvocationResponse {
    fn from(result: &Result<BroadcastReport, NotificationError>) -> Self {
        match result {
            Ok(_) => Self {
                status_code: 200,
                body: SUCCESS_BODY.to_string(),
            },
            Err(err) => Self {
                status_code: 500,
                body: format!("Error sending notification: {err}"),
            },
        }
    }
}
