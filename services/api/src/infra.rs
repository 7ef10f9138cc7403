use hacksprint::config::RegistrationSettings;
use hacksprint::error::AppError;
use hacksprint::registration::{
    AppsScriptSink, InMemoryCollaborator, SinkError, SinkReply, SubmissionPayload,
    SubmissionSink,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Collaborator picked at startup from configuration.
#[derive(Debug)]
pub(crate) enum ConfiguredSink {
    AppsScript(AppsScriptSink),
    InMemory(InMemoryCollaborator),
}

impl ConfiguredSink {
    pub(crate) fn label(&self) -> &'static str {
        match self {
            ConfiguredSink::AppsScript(_) => "apps-script",
            ConfiguredSink::InMemory(_) => "in-memory",
        }
    }
}

impl SubmissionSink for ConfiguredSink {
    async fn deliver(&self, payload: &SubmissionPayload) -> Result<SinkReply, SinkError> {
        match self {
            ConfiguredSink::AppsScript(sink) => sink.deliver(payload).await,
            ConfiguredSink::InMemory(sink) => sink.deliver(payload).await,
        }
    }

    async fn dispatch(&self, payload: &SubmissionPayload) -> Result<(), SinkError> {
        match self {
            ConfiguredSink::AppsScript(sink) => sink.dispatch(payload).await,
            ConfiguredSink::InMemory(sink) => sink.dispatch(payload).await,
        }
    }
}

pub(crate) fn configured_sink(settings: &RegistrationSettings) -> Result<ConfiguredSink, AppError> {
    match settings.script_url.as_deref() {
        Some(url) => {
            let sink = AppsScriptSink::new(url, settings.http_timeout)?;
            info!(endpoint = %sink.endpoint(), "registrations go to the Apps Script endpoint");
            Ok(ConfiguredSink::AppsScript(sink))
        }
        None => {
            warn!("HACKSPRINT_SCRIPT_URL not set; registrations are kept in memory");
            Ok(ConfiguredSink::InMemory(InMemoryCollaborator::new()))
        }
    }
}
