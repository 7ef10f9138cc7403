use std::fmt::Debug;
use std::future::Future;

use serde::{Deserialize, Serialize};

use super::payload::SubmissionPayload;

/// Status and body returned by the readable delivery mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkReply {
    pub status: u16,
    pub body: String,
}

impl SinkReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the body as the script's `{success, message, pptUrl}` envelope.
    pub fn remote(&self) -> Option<RemoteReply> {
        serde_json::from_str(&self.body).ok()
    }
}

/// JSON envelope the registration script answers with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteReply {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ppt_url: String,
}

impl RemoteReply {
    pub fn succeeded(message: impl Into<String>, ppt_url: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            ppt_url: ppt_url.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            ppt_url: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SinkError {
    #[error("network failure: {0}")]
    Network(String),
    #[error("request timed out")]
    Timeout,
}

/// Record-keeping collaborator that accepts encoded registrations.
///
/// Two delivery modes exist because some deployments only let the caller read the
/// response in one of them.
pub trait SubmissionSink: Debug + Send + Sync {
    /// Send the payload and return whatever the collaborator answered.
    fn deliver(
        &self,
        payload: &SubmissionPayload,
    ) -> impl Future<Output = Result<SinkReply, SinkError>> + Send;

    /// Send the payload without reading the answer.
    fn dispatch(
        &self,
        payload: &SubmissionPayload,
    ) -> impl Future<Output = Result<(), SinkError>> + Send;
}
