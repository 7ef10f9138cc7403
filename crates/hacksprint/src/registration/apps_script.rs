use std::time::Duration;

use reqwest::multipart::Form;
use reqwest::Url;
use tracing::{debug, warn};

use super::payload::SubmissionPayload;
use super::sink::{SinkError, SinkReply, SubmissionSink};

#[derive(Debug, thiserror::Error)]
pub enum AppsScriptError {
    #[error("script url '{url}' is invalid: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("unable to build http client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Posts registrations to the spreadsheet-backed Apps Script web app.
#[derive(Debug, Clone)]
pub struct AppsScriptSink {
    http: reqwest::Client,
    endpoint: Url,
}

impl AppsScriptSink {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, AppsScriptError> {
        let endpoint = Url::parse(endpoint).map_err(|source| AppsScriptError::InvalidUrl {
            url: endpoint.to_string(),
            source,
        })?;
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(http, endpoint))
    }

    pub fn with_client(http: reqwest::Client, endpoint: Url) -> Self {
        Self { http, endpoint }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn form(payload: &SubmissionPayload) -> Form {
        payload
            .form_fields()
            .into_iter()
            .fold(Form::new(), |form, (name, value)| {
                form.text(name, value.to_string())
            })
    }

    fn map_error(err: reqwest::Error) -> SinkError {
        if err.is_timeout() {
            SinkError::Timeout
        } else {
            SinkError::Network(err.to_string())
        }
    }
}

impl SubmissionSink for AppsScriptSink {
    async fn deliver(&self, payload: &SubmissionPayload) -> Result<SinkReply, SinkError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .multipart(Self::form(payload))
            .send()
            .await
            .map_err(Self::map_error)?;

        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => {
                warn!(request_id = %payload.request_id, status, error = %err, "script response body unreadable");
                String::new()
            }
        };

        debug!(request_id = %payload.request_id, status, "script answered");
        Ok(SinkReply { status, body })
    }

    async fn dispatch(&self, payload: &SubmissionPayload) -> Result<(), SinkError> {
        self.http
            .post(self.endpoint.clone())
            .multipart(Self::form(payload))
            .send()
            .await
            .map(|_| ())
            .map_err(Self::map_error)
    }
}
